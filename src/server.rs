//! HTTP surface: health/status endpoints for uptime monitors plus the
//! webhook the bridge delivers inbound events to.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tracing::info;

use crate::bot::util::format_uptime;
use crate::bot::{BotEngine, BridgeEvent, Gateway};
use crate::config::Config;

pub struct AppState<G: Gateway> {
    pub config: Arc<Config>,
    pub engine: Arc<BotEngine<G>>,
}

impl<G: Gateway> Clone for AppState<G> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            engine: Arc::clone(&self.engine),
        }
    }
}

pub fn router<G: Gateway + 'static>(state: AppState<G>) -> Router {
    Router::new()
        .route("/", get(index::<G>))
        .route("/status", get(status::<G>))
        .route("/ping", get(ping))
        .route("/webhook", post(webhook::<G>))
        .with_state(state)
}

pub async fn serve<G: Gateway + 'static>(state: AppState<G>, port: u16) -> std::io::Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🌐 Server listening on {addr}");
    axum::serve(listener, router(state)).await
}

async fn index<G: Gateway + 'static>(State(state): State<AppState<G>>) -> Html<String> {
    let config = &state.config;
    let ai_state = if config.ai_auto_reply { "Active ✅" } else { "Inactive ❌" };
    let page = format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <head><title>{bot}</title><meta charset=\"UTF-8\"></head>\n\
         <body>\n\
         <h1>{bot}</h1>\n\
         <p>✅ ONLINE 24/7</p>\n\
         <ul>\n\
         <li><strong>🤖 Bot Name:</strong> {bot}</li>\n\
         <li><strong>👤 Owner:</strong> {owner}</li>\n\
         <li><strong>🧠 AI Mode:</strong> {ai_state}</li>\n\
         <li><strong>📱 Platform:</strong> WhatsApp</li>\n\
         <li><strong>🕐 Uptime:</strong> {uptime}</li>\n\
         </ul>\n\
         <p><a href=\"{channel}\">📢 Join Our Channel</a></p>\n\
         <footer>{footer}</footer>\n\
         </body>\n\
         </html>",
        bot = config.bot_name,
        owner = config.owner_name,
        ai_state = ai_state,
        uptime = format_uptime(state.engine.uptime()),
        channel = config.channel_link,
        footer = config.footer,
    );
    Html(page)
}

#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
    bot: String,
    owner: String,
    /// Uptime in whole seconds.
    uptime: u64,
    /// ISO-8601 timestamp of this response.
    timestamp: String,
}

async fn status<G: Gateway + 'static>(State(state): State<AppState<G>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "online",
        bot: state.config.bot_name.clone(),
        owner: state.config.owner_name.clone(),
        uptime: state.engine.uptime().as_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

async fn ping() -> &'static str {
    "pong"
}

/// Inbound event from the bridge. Handling is spawned so the bridge gets
/// its acknowledgment immediately and slow providers can't back it up.
async fn webhook<G: Gateway + 'static>(
    State(state): State<AppState<G>>,
    Json(event): Json<BridgeEvent>,
) -> StatusCode {
    if let Some(msg) = event.into_inbound() {
        let engine = Arc::clone(&state.engine);
        tokio::spawn(async move {
            engine.handle_event(msg).await;
        });
    }
    StatusCode::NO_CONTENT
}
