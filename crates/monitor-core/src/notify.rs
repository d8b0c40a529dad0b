//! The outbound notification seam.

use async_trait::async_trait;
use model::SessionId;

/// Delivery of a text message to a session's endpoint.
///
/// `notify` never surfaces an error to the caller: delivery problems are
/// retried or logged inside the implementation, and the caller blocks
/// only as long as the implementation's bounded policy allows.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, id: SessionId, text: &str);
}
