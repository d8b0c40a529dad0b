//! The background polling task bound to one monitoring generation.

use crate::rules::{TickOutcome, WatchRule};
use metrics::SharedMetrics;
use model::SessionId;
use monitor_core::{MonitorMode, Notifier, OrderSource, SessionStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Message sent when one query against the provider fails.
pub(crate) const FETCH_ERROR_TEXT: &str = "Error fetching orders from Binance.";

/// One session's polling loop, valid for exactly one generation.
pub(crate) struct PollTask {
    id: SessionId,
    generation: u64,
    interval: Duration,
    store: SessionStore,
    source: Arc<dyn OrderSource>,
    notifier: Arc<dyn Notifier>,
    metrics: SharedMetrics,
}

impl PollTask {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: SessionId,
        generation: u64,
        interval: Duration,
        store: SessionStore,
        source: Arc<dyn OrderSource>,
        notifier: Arc<dyn Notifier>,
        metrics: SharedMetrics,
    ) -> Self {
        Self {
            id,
            generation,
            interval,
            store,
            source,
            notifier,
            metrics,
        }
    }

    /// Whether this task still owns its session. A generation mismatch or
    /// a cleared running flag is the stop signal; there is no other one.
    fn owns_session(&self) -> bool {
        self.store
            .read(self.id, |s| s.owned_by(self.generation))
            .unwrap_or(false)
    }

    /// Return the session to idle after a rule-driven stop, unless a
    /// newer generation has already taken over.
    fn release(&self) {
        self.store.mutate(self.id, |s| {
            if s.generation == self.generation {
                s.running = false;
                s.mode = MonitorMode::Idle;
            }
        });
        self.metrics.inc_monitors_stopped();
    }

    async fn send(&self, text: &str) {
        self.metrics.inc_notifications_sent();
        self.notifier.notify(self.id, text).await;
    }

    /// Run until stopped: displaced by a newer generation, disarmed, or
    /// finished by the rule itself.
    pub(crate) async fn run(self, mut rule: Box<dyn WatchRule>) {
        debug!(
            session = %self.id,
            generation = self.generation,
            "polling task started"
        );

        loop {
            if !self.owns_session() {
                break;
            }

            let filter = self.store.snapshot(self.id).filter;

            match self.source.search(&filter).await {
                Ok(orders) => {
                    self.metrics.inc_polls_completed();

                    // The query may outlast the interval; never act on a
                    // result for a session this task no longer owns.
                    if !self.owns_session() {
                        break;
                    }

                    match rule.evaluate(&orders) {
                        TickOutcome::Quiet => {}
                        TickOutcome::Notify { text, matched } => {
                            if let Some(order) = matched {
                                self.store
                                    .mutate(self.id, |s| s.matched_order = Some(order));
                            }
                            self.send(&text).await;
                        }
                        TickOutcome::Finish { text } => {
                            if let Some(text) = text {
                                self.send(&text).await;
                            }
                            self.release();
                            break;
                        }
                    }
                }
                Err(error) => {
                    // Transient by contract: report and keep polling.
                    self.metrics.inc_query_failures();
                    warn!(session = %self.id, %error, "order query failed");
                    self.send(FETCH_ERROR_TEXT).await;
                }
            }

            tokio::time::sleep(self.interval).await;
        }

        self.metrics.dec_active_monitors();
        debug!(
            session = %self.id,
            generation = self.generation,
            "polling task finished"
        );
    }
}
