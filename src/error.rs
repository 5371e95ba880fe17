use thiserror::Error;

/// Everything that can go wrong while handling a single webhook call.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("could not decode incoming update: {0}")]
    Decode(#[from] serde_json::Error),

    /// Telegram never sends update id 0; it marks a payload that did not decode into an update.
    #[error("invalid update id, got update id = 0")]
    InvalidIdentifier,

    #[error("no keywords to search for")]
    NoKeywords,

    #[error("{context}: {source}")]
    Network {
        context: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("could not parse response from {url}: {reason}")]
    Parse { url: String, reason: String },

    #[error("invalid CSS selector '{selector}': {reason}")]
    Selector { selector: String, reason: String },

    #[error("telegram rejected the message ({status}): {body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },
}

impl BotError {
    pub(crate) fn network(context: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            context: context.into(),
            source,
        }
    }
}
