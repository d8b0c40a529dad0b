//! Telegram client error types.

use rest_client::RestError;
use thiserror::Error;

/// Errors that can occur when calling the Bot API.
#[derive(Debug, Error)]
pub enum TelegramError {
    /// REST client error (network, timeout, decode, etc.).
    #[error("REST client error: {0}")]
    Rest(#[from] RestError),

    /// The Bot API answered `ok: false`.
    #[error("Bot API error {code}: {description}")]
    Api {
        /// Telegram error code (an HTTP-style status).
        code: i64,
        /// Human-readable description from the API.
        description: String,
    },

    /// The Bot API answered `ok: true` without a result payload.
    #[error("Bot API response missing result")]
    MissingResult,
}

impl TelegramError {
    /// Whether delivery is worth retrying: network trouble, rate
    /// limiting, or a server-side failure. Everything else (a bad chat
    /// id, a blocked bot, a malformed request) is permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Rest(rest) => rest.is_retryable(),
            Self::Api { code, .. } => *code == 429 || *code >= 500,
            Self::MissingResult => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_and_server_failures_are_transient() {
        assert!(TelegramError::Rest(RestError::Timeout).is_transient());
        assert!(TelegramError::Rest(RestError::Http {
            status: 502,
            body: String::new()
        })
        .is_transient());
        assert!(TelegramError::Api {
            code: 429,
            description: "Too Many Requests".to_string()
        }
        .is_transient());
        assert!(TelegramError::Api {
            code: 500,
            description: "Internal Server Error".to_string()
        }
        .is_transient());
    }

    #[test]
    fn client_side_rejections_are_permanent() {
        assert!(!TelegramError::Api {
            code: 400,
            description: "Bad Request: chat not found".to_string()
        }
        .is_transient());
        assert!(!TelegramError::Api {
            code: 403,
            description: "Forbidden: bot was blocked by the user".to_string()
        }
        .is_transient());
        assert!(!TelegramError::MissingResult.is_transient());
    }
}
