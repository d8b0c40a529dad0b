//! Notification delivery with bounded retry.
//!
//! The engine talks to the narrow [`monitor_core::Notifier`] seam; this
//! crate provides the implementation: a [`RetryingNotifier`] that delivers
//! through a [`MessagingTransport`] and retries transient failures a
//! bounded number of times with a fixed delay. There is deliberately no
//! unbounded retry path anywhere.

mod retry;
mod transport;

pub use retry::{RetryPolicy, RetryingNotifier, DELIVERY_FAILED_TEXT};
pub use transport::{MessagingTransport, TransportError};
