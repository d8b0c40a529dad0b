//! Monitor engine: the dispatcher-facing surface.

use crate::poller::PollTask;
use crate::rules::{CounterpartyRule, PriceRule, WatchRule};
use metrics::SharedMetrics;
use model::{Filter, Order, SessionId};
use monitor_core::{MonitorMode, Notifier, OrderSource, QueryError, SessionStore};
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Configuration for the monitor engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Delay between consecutive polls of one session's monitor.
    pub poll_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(3),
        }
    }
}

/// Monitoring state of one session, as reported to the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorStatus {
    Idle,
    Counterparty(String),
    Price(Decimal),
}

impl fmt::Display for MonitorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Counterparty(nick) => write!(f, "monitoring user {}", nick),
            Self::Price(limit) => write!(f, "monitoring price {}", limit),
        }
    }
}

/// Starts and stops per-session polling tasks and answers the
/// dispatcher's queries.
///
/// Start and stop never block on a polling task's network call: they only
/// flip session state under the store's per-key lock. A displaced task
/// notices the generation mismatch at its next check point and exits
/// within one interval plus one in-flight request.
pub struct MonitorEngine {
    store: SessionStore,
    source: Arc<dyn OrderSource>,
    notifier: Arc<dyn Notifier>,
    metrics: SharedMetrics,
    config: EngineConfig,
}

impl MonitorEngine {
    /// Create an engine with an empty session store.
    pub fn new(
        source: Arc<dyn OrderSource>,
        notifier: Arc<dyn Notifier>,
        metrics: SharedMetrics,
        config: EngineConfig,
    ) -> Self {
        Self {
            store: SessionStore::new(),
            source,
            notifier,
            metrics,
            config,
        }
    }

    /// The session store. Configuration mutations go through here.
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Shared metrics handle.
    pub fn metrics(&self) -> &SharedMetrics {
        &self.metrics
    }

    /// Start watching for an advertiser's order to appear or disappear.
    ///
    /// Returns whether a running monitor was displaced. Must be called
    /// from within a tokio runtime.
    pub fn start_counterparty_monitor(&self, id: SessionId, nick: impl Into<String>) -> bool {
        let nick = nick.into();
        let rule = Box::new(CounterpartyRule::new(nick.clone()));
        self.start(id, MonitorMode::Counterparty(nick), rule)
    }

    /// Start watching for the best price to cross `limit`.
    ///
    /// The side of the comparison comes from the session's filter as it
    /// stands now; the filter is frozen for the monitor's lifetime.
    pub fn start_price_monitor(&self, id: SessionId, limit: Decimal) -> bool {
        let side = self.store.snapshot(id).filter.side;
        let rule = Box::new(PriceRule::new(side, limit));
        self.start(id, MonitorMode::Price(limit), rule)
    }

    /// Arm the session under its lock, then spawn a polling task bound to
    /// the fresh generation.
    fn start(&self, id: SessionId, mode: MonitorMode, rule: Box<dyn WatchRule>) -> bool {
        let (generation, displaced) = self.store.mutate(id, |s| {
            let displaced = s.running;
            (s.arm(mode), displaced)
        });

        self.metrics.inc_monitors_started();
        self.metrics.inc_active_monitors();

        let task = PollTask::new(
            id,
            generation,
            self.config.poll_interval,
            self.store.clone(),
            Arc::clone(&self.source),
            Arc::clone(&self.notifier),
            Arc::clone(&self.metrics),
        );
        tokio::spawn(task.run(rule));

        info!(session = %id, generation, displaced, "monitor started");
        displaced
    }

    /// Signal the session's polling task, if any, to stop.
    ///
    /// Idempotent: stopping an idle session is a no-op. Returns whether a
    /// running monitor was displaced.
    pub fn stop_monitor(&self, id: SessionId) -> bool {
        let displaced = self.store.mutate(id, |s| s.disarm());
        if displaced {
            self.metrics.inc_monitors_stopped();
            info!(session = %id, "monitor stopped");
        }
        displaced
    }

    /// Current monitoring state of the session.
    pub fn status(&self, id: SessionId) -> MonitorStatus {
        self.store
            .read(id, |s| {
                if !s.running {
                    return MonitorStatus::Idle;
                }
                match &s.mode {
                    MonitorMode::Idle => MonitorStatus::Idle,
                    MonitorMode::Counterparty(nick) => MonitorStatus::Counterparty(nick.clone()),
                    MonitorMode::Price(limit) => MonitorStatus::Price(*limit),
                }
            })
            .unwrap_or(MonitorStatus::Idle)
    }

    /// One-off search with an explicit filter, in provider rank order.
    pub async fn current_orders(&self, filter: &Filter) -> Result<Vec<Order>, QueryError> {
        self.source.search(filter).await
    }

    /// Payment-method identifiers offered on the session's current result
    /// page, first-seen order, deduplicated.
    pub async fn list_pay_methods(&self, id: SessionId) -> Result<Vec<String>, QueryError> {
        let filter = self.store.snapshot(id).filter;
        let orders = self.source.search(&filter).await?;

        let mut seen = HashSet::new();
        let mut methods = Vec::new();
        for order in &orders {
            for method in &order.pay_methods {
                if seen.insert(method.clone()) {
                    methods.push(method.clone());
                }
            }
        }
        Ok(methods)
    }

    /// Advertisers on the session's current result page with their
    /// prices, deduplicated, with an optional amount override.
    pub async fn list_advertisers(
        &self,
        id: SessionId,
        amount: Option<Decimal>,
    ) -> Result<Vec<(String, Decimal)>, QueryError> {
        let mut filter = self.store.snapshot(id).filter;
        if let Some(amount) = amount {
            filter.trans_amount = Some(amount);
        }
        let orders = self.source.search(&filter).await?;

        let mut seen = HashSet::new();
        let mut advertisers = Vec::new();
        for order in &orders {
            let entry = (order.advertiser.clone(), order.price);
            if seen.insert(entry.clone()) {
                advertisers.push(entry);
            }
        }
        Ok(advertisers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use metrics::create_metrics;
    use parking_lot::Mutex;
    use rust_decimal_macros::dec;
    use model::TradeSide;

    const SESSION: SessionId = SessionId(7);

    /// Poll interval short enough that a test can observe several ticks.
    const TICK: Duration = Duration::from_millis(10);

    /// Source that replays scripted pages, then repeats the last entry.
    struct ScriptedSource {
        pages: Mutex<Vec<Result<Vec<Order>, String>>>,
        calls: Mutex<u32>,
    }

    impl ScriptedSource {
        fn new(pages: Vec<Result<Vec<Order>, String>>) -> Arc<Self> {
            Arc::new(Self {
                pages: Mutex::new(pages),
                calls: Mutex::new(0),
            })
        }

        fn calls(&self) -> u32 {
            *self.calls.lock()
        }
    }

    #[async_trait]
    impl OrderSource for ScriptedSource {
        async fn search(&self, _filter: &Filter) -> Result<Vec<Order>, QueryError> {
            *self.calls.lock() += 1;
            let mut pages = self.pages.lock();
            let page = if pages.len() > 1 {
                pages.remove(0)
            } else {
                pages.first().cloned().unwrap_or_else(|| Ok(vec![]))
            };
            page.map_err(QueryError::Transport)
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        messages: Mutex<Vec<String>>,
    }

    impl RecordingNotifier {
        fn messages(&self) -> Vec<String> {
            self.messages.lock().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, _id: SessionId, text: &str) {
            self.messages.lock().push(text.to_string());
        }
    }

    fn order(advertiser: &str, price: Decimal) -> Order {
        Order {
            advertiser: advertiser.to_string(),
            price,
            pay_methods: vec![],
        }
    }

    fn engine(
        source: Arc<ScriptedSource>,
        notifier: Arc<RecordingNotifier>,
    ) -> MonitorEngine {
        MonitorEngine::new(
            source,
            notifier,
            create_metrics(),
            EngineConfig {
                poll_interval: TICK,
            },
        )
    }

    async fn settle() {
        tokio::time::sleep(TICK * 12).await;
    }

    #[tokio::test]
    async fn counterparty_appear_then_disappear_notifies_twice_and_goes_idle() {
        let source = ScriptedSource::new(vec![
            Ok(vec![order("trader1", dec!(41.23))]),
            Ok(vec![order("other", dec!(41.50))]),
            Ok(vec![order("trader1", dec!(41.23))]),
        ]);
        let notifier = Arc::new(RecordingNotifier::default());
        let engine = engine(source.clone(), notifier.clone());

        engine.start_counterparty_monitor(SESSION, "trader1");
        settle().await;

        assert_eq!(
            notifier.messages(),
            vec![
                "Found an order from user trader1: 41.23".to_string(),
                "The order from user trader1 has disappeared.".to_string(),
            ]
        );
        assert_eq!(engine.status(SESSION), MonitorStatus::Idle);
        // The watch ended on the disappearance tick; the third page was
        // never requested.
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn counterparty_match_is_recorded_on_the_session() {
        let source = ScriptedSource::new(vec![Ok(vec![order("trader1", dec!(41.23))])]);
        let notifier = Arc::new(RecordingNotifier::default());
        let engine = engine(source, notifier);

        engine.start_counterparty_monitor(SESSION, "trader1");
        settle().await;

        let matched = engine.store().snapshot(SESSION).matched_order;
        assert_eq!(matched.unwrap().advertiser, "trader1");

        engine.stop_monitor(SESSION);
    }

    #[tokio::test]
    async fn price_buy_matches_at_threshold() {
        let source = ScriptedSource::new(vec![
            Ok(vec![order("a", dec!(39.50))]),
            Ok(vec![order("a", dec!(40.00))]),
        ]);
        let notifier = Arc::new(RecordingNotifier::default());
        let engine = engine(source, notifier.clone());

        engine.start_price_monitor(SESSION, dec!(40.00));
        settle().await;

        assert_eq!(
            notifier.messages(),
            vec!["Monitoring stopped: Order matching the price 40.00 found: 40.00".to_string()]
        );
        assert_eq!(engine.status(SESSION), MonitorStatus::Idle);
    }

    #[tokio::test]
    async fn price_sell_matches_below_threshold() {
        let source = ScriptedSource::new(vec![
            Ok(vec![order("a", dec!(40.50))]),
            Ok(vec![order("a", dec!(39.90))]),
        ]);
        let notifier = Arc::new(RecordingNotifier::default());
        let engine = engine(source, notifier.clone());

        engine
            .store()
            .mutate(SESSION, |s| s.filter.side = TradeSide::Sell);
        engine.start_price_monitor(SESSION, dec!(40.00));
        settle().await;

        assert_eq!(
            notifier.messages(),
            vec!["Monitoring stopped: Order matching the price 40.00 found: 39.90".to_string()]
        );
        assert_eq!(engine.status(SESSION), MonitorStatus::Idle);
    }

    #[tokio::test]
    async fn query_failures_notify_and_keep_polling() {
        let source = ScriptedSource::new(vec![Err("connection refused".to_string())]);
        let notifier = Arc::new(RecordingNotifier::default());
        let engine = engine(source, notifier.clone());

        engine.start_counterparty_monitor(SESSION, "trader1");
        settle().await;

        let messages = notifier.messages();
        assert!(messages.len() >= 2, "got {:?}", messages);
        assert!(messages
            .iter()
            .all(|m| m == "Error fetching orders from Binance."));
        assert_eq!(
            engine.status(SESSION),
            MonitorStatus::Counterparty("trader1".to_string())
        );

        engine.stop_monitor(SESSION);
    }

    #[tokio::test]
    async fn restart_displaces_exactly_one_running_monitor() {
        let source = ScriptedSource::new(vec![Ok(vec![])]);
        let notifier = Arc::new(RecordingNotifier::default());
        let engine = engine(source, notifier);

        assert!(!engine.start_price_monitor(SESSION, dec!(40.00)));
        assert!(engine.start_price_monitor(SESSION, dec!(41.00)));
        assert_eq!(engine.status(SESSION), MonitorStatus::Price(dec!(41.00)));

        assert!(engine.stop_monitor(SESSION));
        assert!(!engine.stop_monitor(SESSION));
    }

    #[tokio::test]
    async fn stop_on_idle_session_is_a_noop() {
        let source = ScriptedSource::new(vec![Ok(vec![])]);
        let notifier = Arc::new(RecordingNotifier::default());
        let engine = engine(source, notifier);

        assert!(!engine.stop_monitor(SESSION));
        assert_eq!(engine.status(SESSION), MonitorStatus::Idle);
    }

    #[tokio::test]
    async fn churned_restarts_leave_exactly_one_live_task() {
        let source = ScriptedSource::new(vec![Ok(vec![])]);
        let notifier = Arc::new(RecordingNotifier::default());
        let engine = engine(source, notifier);

        for i in 0..20 {
            engine.start_price_monitor(SESSION, Decimal::from(40 + i));
        }
        settle().await;

        // Displaced tasks notice the generation mismatch within one
        // interval and exit; only the newest survives.
        assert_eq!(engine.metrics().active_monitors(), 1);

        engine.stop_monitor(SESSION);
        settle().await;
        assert_eq!(engine.metrics().active_monitors(), 0);
    }

    #[tokio::test]
    async fn list_helpers_deduplicate_in_first_seen_order() {
        let mut first = order("trader1", dec!(41.23));
        first.pay_methods = vec!["Monobank".to_string(), "PrivatBank".to_string()];
        let mut second = order("trader2", dec!(41.30));
        second.pay_methods = vec!["Monobank".to_string()];
        let third = order("trader1", dec!(41.23));

        let source = ScriptedSource::new(vec![Ok(vec![first, second, third])]);
        let notifier = Arc::new(RecordingNotifier::default());
        let engine = engine(source, notifier);

        let methods = engine.list_pay_methods(SESSION).await.unwrap();
        assert_eq!(methods, vec!["Monobank", "PrivatBank"]);

        let advertisers = engine.list_advertisers(SESSION, None).await.unwrap();
        assert_eq!(
            advertisers,
            vec![
                ("trader1".to_string(), dec!(41.23)),
                ("trader2".to_string(), dec!(41.30)),
            ]
        );
    }
}
