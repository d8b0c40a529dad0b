//! The external messaging transport seam.

use async_trait::async_trait;
use model::SessionId;
use thiserror::Error;

/// Failure of one transport send.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Recoverable: worth retrying after a delay.
    #[error("transient transport failure: {0}")]
    Transient(String),

    /// Unrecoverable: retrying cannot help.
    #[error("fatal transport failure: {0}")]
    Fatal(String),
}

impl TransportError {
    /// Whether a retry might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// One attempt at delivering a text message to a session's endpoint.
///
/// Implementations classify failures as transient or fatal and never
/// retry internally; retry policy belongs to the caller.
#[async_trait]
pub trait MessagingTransport: Send + Sync {
    async fn send(&self, id: SessionId, text: &str) -> Result<(), TransportError>;
}
