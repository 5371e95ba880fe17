use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::warn;

/// Environment variable holding the bot token. Read once at startup and
/// takes precedence over `[telegram] bot_token`.
pub const BOT_TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";

const SEND_MESSAGE_PATH: &str = "/sendMessage";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub imdb: ImdbConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    /// Everything before the token, e.g. `https://api.telegram.org/bot`
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_webhook_path")]
    pub webhook_path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ImdbConfig {
    /// Keyword search endpoint; keywords are appended verbatim.
    #[serde(default = "default_search_url")]
    pub search_url: String,
    #[serde(default = "default_title_selector")]
    pub title_selector: String,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            api_base_url: default_api_base_url(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            webhook_path: default_webhook_path(),
        }
    }
}

impl Default for ImdbConfig {
    fn default() -> Self {
        Self {
            search_url: default_search_url(),
            title_selector: default_title_selector(),
            user_agent: None,
        }
    }
}

fn default_api_base_url() -> String {
    "https://api.telegram.org/bot".to_string()
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_webhook_path() -> String {
    "/api/handler".to_string()
}

fn default_search_url() -> String {
    "https://www.imdb.com/search/keyword/?keywords=".to_string()
}

fn default_title_selector() -> String {
    r#"h3[class="lister-item-header"]"#.to_string()
}

impl Config {
    /// Load the config file at `path`, or defaults if it does not exist,
    /// then apply the bot token from the environment.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::parse(&content)?
        } else {
            warn!(
                "Config file {} not found, using defaults",
                path.display()
            );
            Config::default()
        };

        if let Ok(token) = std::env::var(BOT_TOKEN_ENV) {
            config.telegram.bot_token = token;
        }

        if config.telegram.bot_token.is_empty() {
            warn!(
                "No bot token configured; set {} or [telegram] bot_token",
                BOT_TOKEN_ENV
            );
        }

        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    /// Full `sendMessage` endpoint: base URL, token, fixed method path.
    pub fn send_message_url(&self) -> String {
        format!(
            "{}{}{}",
            self.telegram.api_base_url, self.telegram.bot_token, SEND_MESSAGE_PATH
        )
    }
}
