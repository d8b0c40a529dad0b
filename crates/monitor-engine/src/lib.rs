//! Session-scoped monitoring engine.
//!
//! One background polling task per session with an active monitor. The
//! engine owns start/stop with generation-tagged cooperative cancellation:
//! every spawned task captures the session's generation at start and
//! treats a mismatch as its sole stop signal, so a start racing an
//! in-flight poll can never leave two tasks believing they own the same
//! session.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐  start/stop   ┌───────────────┐  spawn   ┌────────────┐
//! │ Dispatcher │──────────────>│ MonitorEngine │─────────>│  PollTask  │
//! └────────────┘               └───────────────┘          │ (per       │
//!        │ mutate filter              │                   │  session)  │
//!        v                           v                    └────────────┘
//! ┌──────────────┐          ┌──────────────┐                 │      │
//! │ SessionStore │<─────────│  WatchRule   │<── evaluate ────┘      │
//! └──────────────┘          └──────────────┘          notify        v
//!                                                           ┌────────────┐
//!                                                           │  Notifier  │
//!                                                           └────────────┘
//! ```

mod engine;
mod poller;
mod rules;

pub use engine::{EngineConfig, MonitorEngine, MonitorStatus};
pub use rules::{CounterpartyRule, PriceRule, TickOutcome, WatchRule};
