//! P2P client error types.

use monitor_core::QueryError;
use rest_client::RestError;
use thiserror::Error;

/// Errors that can occur when querying the P2P order book.
#[derive(Debug, Error)]
pub enum P2pError {
    /// REST client error (network, timeout, decode, etc.).
    #[error("REST client error: {0}")]
    Rest(#[from] RestError),
}

impl From<P2pError> for QueryError {
    fn from(err: P2pError) -> Self {
        match err {
            P2pError::Rest(RestError::Decode(message)) => QueryError::Parse(message),
            P2pError::Rest(rest) => QueryError::Transport(rest.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_failures_map_to_parse() {
        let err: QueryError = P2pError::Rest(RestError::Decode("bad json".into())).into();
        assert!(matches!(err, QueryError::Parse(_)));
    }

    #[test]
    fn network_failures_map_to_transport() {
        let err: QueryError = P2pError::Rest(RestError::Timeout).into();
        assert!(matches!(err, QueryError::Transport(_)));
    }
}
