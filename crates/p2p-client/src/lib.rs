//! Binance P2P order-book search client.
//!
//! Issues one `adv/search` request per call and maps the ranked rows into
//! [`model::Order`] values, preserving provider order. No retry lives
//! here; every failure is transient to callers.

mod client;
mod error;
mod wire;

pub use client::{P2pClient, P2P_BASE_URL};
pub use error::P2pError;
