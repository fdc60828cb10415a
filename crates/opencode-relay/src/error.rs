//! Error types for the relay.

use thiserror::Error;

/// Relay error type.
#[derive(Error, Debug)]
pub enum RelayError {
    /// Missing or invalid startup configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Telegram answered with `ok: false` or a non-JSON error page
    #[error("Telegram API error {code}: {description}")]
    Telegram { code: i64, description: String },

    /// Transport-level HTTP failure. The request URL (which embeds the bot
    /// token) is stripped before the error is stored.
    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    /// IO error (log files, audit log)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed Bot API payload
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for RelayError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.without_url())
    }
}

impl RelayError {
    /// Errors that no amount of retrying will fix: bad configuration or a
    /// token Telegram does not recognise.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Config(_) => true,
            Self::Telegram { code, .. } => matches!(code, 401 | 404),
            _ => false,
        }
    }
}

/// Result type for relay operations.
pub type RelayResult<T> = Result<T, RelayError>;
