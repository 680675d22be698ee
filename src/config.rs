use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::bot::providers::ProviderSpec;

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the config file.
    ReadFile { path: PathBuf, source: std::io::Error },
    /// Failed to parse JSON.
    ParseJson { path: PathBuf, source: serde_json::Error },
    /// Validation error.
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFile { path, source } => {
                write!(f, "failed to read config file '{}': {}", path.display(), source)
            }
            Self::ParseJson { path, source } => {
                write!(f, "failed to parse config file '{}': {}", path.display(), source)
            }
            Self::Validation(msg) => write!(f, "config validation error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadFile { source, .. } => Some(source),
            Self::ParseJson { source, .. } => Some(source),
            Self::Validation(_) => None,
        }
    }
}

#[derive(Deserialize)]
struct ConfigFile {
    /// Display name prepended to every outbound reply.
    #[serde(default = "default_bot_name")]
    bot_name: String,
    owner_name: String,
    /// Owner phone number in international format, digits only.
    owner_number: String,
    /// Leading token marking a message as a command.
    #[serde(default = "default_prefix")]
    prefix: String,
    /// Base URL of the WhatsApp bridge (e.g. "http://localhost:8066").
    bridge_url: String,
    #[serde(default = "default_true")]
    ai_enabled: bool,
    #[serde(default = "default_true")]
    ai_auto_reply: bool,
    #[serde(default)]
    channel_link: String,
    #[serde(default)]
    profile_pic_url: String,
    /// Footer appended to every outbound reply.
    #[serde(default)]
    footer: String,
    /// Anti-ban throttling: per-sender rate limiting plus a delay before
    /// handling each message.
    #[serde(default = "default_true")]
    anti_ban: bool,
    #[serde(default = "default_msg_delay_ms")]
    msg_delay_ms: u64,
    #[serde(default = "default_max_msgs_per_minute")]
    max_msgs_per_minute: u32,
    #[serde(default = "default_typing_delay_ms")]
    typing_delay_ms: u64,
    #[serde(default = "default_true")]
    auto_read: bool,
    #[serde(default = "default_true")]
    auto_typing: bool,
    #[serde(default = "default_true")]
    always_online: bool,
    /// Port for the health/webhook HTTP server.
    #[serde(default = "default_port")]
    port: u16,
    /// Directory for state files (logs, user registry). Defaults to current directory.
    data_dir: Option<String>,
    /// Ordered AI completion endpoints; order is the failover priority.
    #[serde(default)]
    providers: Vec<ProviderSpec>,
}

fn default_bot_name() -> String {
    "Wabot".to_string()
}

fn default_prefix() -> String {
    ".".to_string()
}

fn default_true() -> bool {
    true
}

fn default_msg_delay_ms() -> u64 {
    1500
}

fn default_max_msgs_per_minute() -> u32 {
    15
}

fn default_typing_delay_ms() -> u64 {
    2000
}

fn default_port() -> u16 {
    3000
}

pub struct Config {
    pub bot_name: String,
    pub owner_name: String,
    pub owner_number: String,
    pub prefix: String,
    pub bridge_url: String,
    pub ai_enabled: bool,
    pub ai_auto_reply: bool,
    pub channel_link: String,
    pub profile_pic_url: String,
    pub footer: String,
    pub anti_ban: bool,
    pub msg_delay_ms: u64,
    pub max_msgs_per_minute: u32,
    pub typing_delay_ms: u64,
    pub auto_read: bool,
    pub auto_typing: bool,
    pub always_online: bool,
    pub port: u16,
    pub data_dir: PathBuf,
    pub providers: Vec<ProviderSpec>,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config_path = path.as_ref().to_path_buf();
        let content = std::fs::read_to_string(&config_path)
            .map_err(|e| ConfigError::ReadFile { path: config_path.clone(), source: e })?;
        let file: ConfigFile = serde_json::from_str(&content)
            .map_err(|e| ConfigError::ParseJson { path: config_path.clone(), source: e })?;

        if file.owner_name.is_empty() {
            return Err(ConfigError::Validation("owner_name is required".into()));
        }
        if file.owner_number.is_empty() || !file.owner_number.chars().all(|c| c.is_ascii_digit()) {
            return Err(ConfigError::Validation(
                "owner_number is required and must be digits only (e.g. 94726962984)".into(),
            ));
        }
        if file.prefix.is_empty() {
            return Err(ConfigError::Validation("prefix must not be empty".into()));
        }
        if file.bridge_url.is_empty() {
            return Err(ConfigError::Validation("bridge_url is required".into()));
        }
        if file.max_msgs_per_minute == 0 {
            return Err(ConfigError::Validation("max_msgs_per_minute must be at least 1".into()));
        }

        let providers = if file.providers.is_empty() {
            default_providers()
        } else {
            file.providers
        };

        let data_dir = file
            .data_dir
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Self {
            bot_name: file.bot_name,
            owner_name: file.owner_name,
            owner_number: file.owner_number,
            prefix: file.prefix,
            bridge_url: file.bridge_url.trim_end_matches('/').to_string(),
            ai_enabled: file.ai_enabled,
            ai_auto_reply: file.ai_auto_reply,
            channel_link: file.channel_link,
            profile_pic_url: file.profile_pic_url,
            footer: file.footer,
            anti_ban: file.anti_ban,
            msg_delay_ms: file.msg_delay_ms,
            max_msgs_per_minute: file.max_msgs_per_minute,
            typing_delay_ms: file.typing_delay_ms,
            auto_read: file.auto_read,
            auto_typing: file.auto_typing,
            always_online: file.always_online,
            port: file.port,
            data_dir,
            providers,
        })
    }

    pub fn is_owner(&self, sender_number: &str) -> bool {
        sender_number == self.owner_number
    }
}

/// The stock completion endpoints, tried top to bottom.
fn default_providers() -> Vec<ProviderSpec> {
    vec![
        ProviderSpec::get("GPT-4", "https://api.yanzbotz.my.id/api/ai/gpt4", "query"),
        ProviderSpec::get("Gemini", "https://api.ryzendesu.vip/api/ai/gemini", "text"),
        ProviderSpec::get("ChatGPT", "https://api.betabotz.eu.org/api/search/openai-chat", "text"),
        ProviderSpec::get("Hercai", "https://hercai.onrender.com/v3/hercai", "question"),
        ProviderSpec::post("SimSimi", "https://api.simsimi.vn/v2/simtalk", "text", &[("lc", "en")]),
    ]
}
