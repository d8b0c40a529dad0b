//! Bounded-retry notifier.

use crate::transport::{MessagingTransport, TransportError};
use async_trait::async_trait;
use model::SessionId;
use monitor_core::Notifier;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Degraded notice sent once when every retry failed.
pub const DELIVERY_FAILED_TEXT: &str = "Could not deliver notification.";

/// Delivery policy for one notification.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total send attempts for a transiently failing notification.
    pub max_attempts: u32,
    /// Fixed delay between attempts.
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay: Duration::from_secs(1),
        }
    }
}

/// [`Notifier`] that delivers through a [`MessagingTransport`].
///
/// Transient failures are retried up to `max_attempts` total attempts
/// with a fixed delay; when exhausted, one best-effort degraded notice is
/// sent and the notification is dropped. Fatal failures are logged and
/// dropped without retry. The caller is never blocked longer than the
/// bounded schedule.
pub struct RetryingNotifier {
    transport: Arc<dyn MessagingTransport>,
    policy: RetryPolicy,
}

impl RetryingNotifier {
    /// Create a notifier with the default policy.
    pub fn new(transport: Arc<dyn MessagingTransport>) -> Self {
        Self::with_policy(transport, RetryPolicy::default())
    }

    /// Create a notifier with an explicit policy.
    pub fn with_policy(transport: Arc<dyn MessagingTransport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }
}

#[async_trait]
impl Notifier for RetryingNotifier {
    async fn notify(&self, id: SessionId, text: &str) {
        for attempt in 1..=self.policy.max_attempts {
            match self.transport.send(id, text).await {
                Ok(()) => {
                    if attempt > 1 {
                        debug!(session = %id, attempt, "notification delivered after retry");
                    }
                    return;
                }
                Err(err) if err.is_transient() => {
                    warn!(
                        session = %id,
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        error = %err,
                        "notification send failed"
                    );
                    if attempt < self.policy.max_attempts {
                        tokio::time::sleep(self.policy.retry_delay).await;
                    }
                }
                Err(err) => {
                    error!(session = %id, error = %err, "notification dropped");
                    return;
                }
            }
        }

        error!(
            session = %id,
            attempts = self.policy.max_attempts,
            "notification undeliverable, sending degraded notice"
        );
        if let Err(err) = self.transport.send(id, DELIVERY_FAILED_TEXT).await {
            error!(session = %id, error = %err, "degraded notice also failed");
        }
    }
}
