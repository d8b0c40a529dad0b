//! Per-conversation monitoring state.

use model::{Filter, Order};
use rust_decimal::Decimal;

/// The monitoring mode of a session, target included.
///
/// Holding the target inside the variant makes "at most one active mode
/// with exactly one target" unrepresentable by construction.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum MonitorMode {
    /// No monitor is configured.
    #[default]
    Idle,
    /// Watch for a specific advertiser's order to appear or disappear.
    Counterparty(String),
    /// Watch for the best-ranked price to cross a threshold.
    Price(Decimal),
}

impl MonitorMode {
    /// Returns true when no monitor is configured.
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// The unit of per-conversation isolation.
///
/// `filter` is mutated by the dispatcher while configuring; once a monitor
/// starts, the polling task owns `running`, `matched_order` and the mode.
/// `generation` is bumped on every start and stop and is the sole stop
/// signal for a stale polling task.
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Current query filter.
    pub filter: Filter,
    /// Active monitoring mode.
    pub mode: MonitorMode,
    /// Last order confirmed to satisfy a counterparty match.
    pub matched_order: Option<Order>,
    /// Whether a polling task currently owns this session.
    pub running: bool,
    /// Monotonic counter invalidating stale polling tasks.
    pub generation: u64,
}

impl Session {
    /// Arm the session for a new monitor and return the fresh generation.
    ///
    /// Bumping the generation first invalidates any task still polling
    /// for the previous one.
    pub fn arm(&mut self, mode: MonitorMode) -> u64 {
        self.generation += 1;
        self.mode = mode;
        self.matched_order = None;
        self.running = true;
        self.generation
    }

    /// Signal the owning task, if any, to stop. Returns whether a running
    /// monitor was displaced. Idempotent.
    pub fn disarm(&mut self) -> bool {
        let was_running = self.running;
        self.generation += 1;
        self.running = false;
        self.mode = MonitorMode::Idle;
        was_running
    }

    /// Whether a task holding `generation` still owns this session.
    pub fn owned_by(&self, generation: u64) -> bool {
        self.running && self.generation == generation
    }
}
