use std::sync::Arc;

use tracing::info;
use tracing_subscriber::prelude::*;

use wabot::bot::{BotEngine, BridgeClient};
use wabot::config::Config;
use wabot::server::{self, AppState};

#[tokio::main]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "wabot.json".to_string());
    let config = match Config::load(&config_path) {
        Ok(config) => Arc::new(config),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    // Setup logging: stdout plus a file under data_dir/logs
    let log_dir = config.data_dir.join("logs");
    std::fs::create_dir_all(&log_dir).ok();
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("wabot.log"))
        .expect("Failed to open log file");
    let (non_blocking, _guard) = tracing_appender::non_blocking(log_file);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .init();

    info!("🚀 Starting wabot...");
    info!("Loaded config from {config_path}");
    info!("🤖 {}", config.bot_name);
    info!("👤 {} (+{})", config.owner_name, config.owner_number);
    info!("🧠 AI auto-reply: {}", if config.ai_auto_reply { "on" } else { "off" });
    info!("🌉 Bridge: {}", config.bridge_url);

    let gateway = Arc::new(BridgeClient::new(config.bridge_url.clone()));
    let engine = Arc::new(BotEngine::new(Arc::clone(&config), gateway));
    engine.start_sweeper();

    let state = AppState { config: Arc::clone(&config), engine };
    if let Err(e) = server::serve(state, config.port).await {
        eprintln!("server error: {e}");
        std::process::exit(1);
    }
}
