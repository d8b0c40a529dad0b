//! The order-book query seam.

use async_trait::async_trait;
use model::{Filter, Order};
use thiserror::Error;

/// Failure of one order-book query.
///
/// Always treated as transient by callers: the polling loop reports it to
/// the user and keeps going.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Network-level failure reaching the provider.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The provider answered with something we could not decode.
    #[error("malformed provider response: {0}")]
    Parse(String),
}

/// One-shot search against the external order book.
///
/// Implementations issue exactly one request per call and never retry;
/// retry policy belongs to the caller. A successful response with zero
/// rows is `Ok(vec![])`, and rows are returned in provider rank order,
/// best price first.
#[async_trait]
pub trait OrderSource: Send + Sync {
    async fn search(&self, filter: &Filter) -> Result<Vec<Order>, QueryError>;
}
