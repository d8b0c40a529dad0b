//! Core state and seams for the P2P monitor.
//!
//! This crate provides the building blocks the monitoring engine is wired
//! from:
//!
//! - **Session state**: [`Session`] and [`MonitorMode`], the unit of
//!   per-conversation isolation
//! - **SessionStore**: concurrency-safe, per-key synchronized map of
//!   sessions
//! - **OrderSource**: the one-shot order-book query seam
//! - **Notifier**: the outbound notification seam

mod notify;
mod session;
mod source;
mod store;

pub use notify::Notifier;
pub use session::{MonitorMode, Session};
pub use source::{OrderSource, QueryError};
pub use store::SessionStore;
