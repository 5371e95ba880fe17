use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::BotError;
use crate::keywords::{extract_keywords, has_search_terms};
use crate::movies::MovieLookup;
use crate::platform::telegram::{decode_update, split_message, TelegramClient, MAX_MESSAGE_LEN};

pub const GREETING: &str =
    "Hey dude!\nGive me some keywords (comma delimited) to recommend you movies :D";

pub const ASK_AGAIN: &str =
    "I need at least one keyword to search for, e.g. \"drama, heist\"";

/// What the bot decided to answer with.
#[derive(Debug)]
pub enum Reply {
    Greeting,
    AskAgain,
    /// Newline-terminated titles; empty when nothing matched.
    Titles(String),
    /// The scrape failed. The user still gets an (empty) reply.
    LookupFailed(BotError),
}

impl Reply {
    pub fn text(&self) -> &str {
        match self {
            Reply::Greeting => GREETING,
            Reply::AskAgain => ASK_AGAIN,
            Reply::Titles(titles) => titles.as_str(),
            Reply::LookupFailed(_) => "",
        }
    }
}

/// Result of one fully handled webhook call.
#[derive(Debug)]
pub struct Outcome {
    pub chat_id: i64,
    pub reply: Reply,
    /// Raw `sendMessage` response bodies, one per chunk sent.
    pub responses: Vec<String>,
}

/// Shared application state
pub struct AppState {
    config: Config,
    telegram: TelegramClient,
    movies: MovieLookup,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, BotError> {
        let telegram = TelegramClient::new(config.send_message_url());
        let movies = MovieLookup::new(&config.imdb)?;
        Ok(Self {
            config,
            telegram,
            movies,
        })
    }

    /// Decode, answer and dispatch a single webhook body.
    pub async fn handle_update(&self, body: &[u8]) -> Result<Outcome, BotError> {
        let update = decode_update(body)?;
        debug!("Received update {}", update);

        let chat_id = update.message.chat.id;
        let reply = self.compose_reply(&update.message.text).await;

        let mut responses = Vec::new();
        for chunk in split_message(reply.text(), MAX_MESSAGE_LEN) {
            responses.push(self.telegram.send_message(chat_id, &chunk).await?);
        }

        info!("Successfully distributed to chat id {}", chat_id);

        Ok(Outcome {
            chat_id,
            reply,
            responses,
        })
    }

    pub async fn compose_reply(&self, text: &str) -> Reply {
        let text = text.to_lowercase();

        if is_start_command(&text) {
            return Reply::Greeting;
        }

        let keywords = extract_keywords(&text);
        if !has_search_terms(&keywords) {
            return Reply::AskAgain;
        }

        match self.movies.lookup(&keywords).await {
            Ok(titles) => Reply::Titles(titles),
            Err(e) => {
                error!("Movie lookup failed for {:?}: {}", keywords, e);
                Reply::LookupFailed(e)
            }
        }
    }
}

/// `start` or `/start`, any case.
pub fn is_start_command(text: &str) -> bool {
    text.strip_prefix('/')
        .unwrap_or(text)
        .eq_ignore_ascii_case("start")
}

/// Webhook endpoint. Always answers 200 so Telegram does not redeliver;
/// failures are only logged.
async fn webhook(State(state): State<Arc<AppState>>, body: Bytes) -> StatusCode {
    match state.handle_update(&body).await {
        Ok(outcome) => {
            if let Reply::LookupFailed(e) = &outcome.reply {
                warn!("Chat {} got an empty reply: {}", outcome.chat_id, e);
            }
            debug!(
                "Chat {} answered in {} message(s)",
                outcome.chat_id,
                outcome.responses.len()
            );
        }
        Err(e @ (BotError::Decode(_) | BotError::InvalidIdentifier)) => {
            error!("Error parsing incoming update: {}", e);
        }
        Err(e) => {
            error!("Failed to deliver reply: {}", e);
        }
    }

    StatusCode::OK
}

async fn health() -> &'static str {
    "ok"
}

pub fn router(state: Arc<AppState>) -> Router {
    let webhook_path = state.config.server.webhook_path.clone();
    Router::new()
        .route(&webhook_path, post(webhook))
        .route("/health", get(health))
        .with_state(state)
}

/// Serve the webhook until Ctrl-C.
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let addr = state.config.server.bind_address.clone();
    let webhook_path = state.config.server.webhook_path.clone();

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    info!("Listening for updates on http://{}{}", addr, webhook_path);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
        .context("Server error")?;

    Ok(())
}
