use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Thread-safe metrics collector for the monitoring engine.
#[derive(Debug)]
pub struct MonitorMetrics {
    // Counters
    polls_completed: AtomicU64,
    query_failures: AtomicU64,
    notifications_sent: AtomicU64,
    monitors_started: AtomicU64,
    monitors_stopped: AtomicU64,

    // Gauge: polling tasks currently alive
    active_monitors: AtomicU64,

    // Timestamps
    inner: RwLock<MetricsInner>,
}

#[derive(Debug)]
struct MetricsInner {
    start_time: Instant,
    last_poll_time: Option<Instant>,
    last_failure_time: Option<Instant>,
}

impl Default for MonitorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitorMetrics {
    pub fn new() -> Self {
        Self {
            polls_completed: AtomicU64::new(0),
            query_failures: AtomicU64::new(0),
            notifications_sent: AtomicU64::new(0),
            monitors_started: AtomicU64::new(0),
            monitors_stopped: AtomicU64::new(0),
            active_monitors: AtomicU64::new(0),
            inner: RwLock::new(MetricsInner {
                start_time: Instant::now(),
                last_poll_time: None,
                last_failure_time: None,
            }),
        }
    }

    // --- Increment methods ---

    pub fn inc_polls_completed(&self) {
        self.polls_completed.fetch_add(1, Ordering::Relaxed);
        self.inner.write().last_poll_time = Some(Instant::now());
    }

    pub fn inc_query_failures(&self) {
        self.query_failures.fetch_add(1, Ordering::Relaxed);
        self.inner.write().last_failure_time = Some(Instant::now());
    }

    pub fn inc_notifications_sent(&self) {
        self.notifications_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_monitors_started(&self) {
        self.monitors_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_monitors_stopped(&self) {
        self.monitors_stopped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_active_monitors(&self) {
        self.active_monitors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dec_active_monitors(&self) {
        let previous = self.active_monitors.fetch_sub(1, Ordering::Relaxed);
        debug_assert!(previous > 0, "active monitor gauge underflow");
    }

    // --- Getter methods ---

    pub fn polls_completed(&self) -> u64 {
        self.polls_completed.load(Ordering::Relaxed)
    }

    pub fn query_failures(&self) -> u64 {
        self.query_failures.load(Ordering::Relaxed)
    }

    pub fn notifications_sent(&self) -> u64 {
        self.notifications_sent.load(Ordering::Relaxed)
    }

    pub fn monitors_started(&self) -> u64 {
        self.monitors_started.load(Ordering::Relaxed)
    }

    pub fn monitors_stopped(&self) -> u64 {
        self.monitors_stopped.load(Ordering::Relaxed)
    }

    pub fn active_monitors(&self) -> u64 {
        self.active_monitors.load(Ordering::Relaxed)
    }

    pub fn uptime_secs(&self) -> f64 {
        self.inner.read().start_time.elapsed().as_secs_f64()
    }

    pub fn secs_since_last_poll(&self) -> Option<f64> {
        self.inner
            .read()
            .last_poll_time
            .map(|t| t.elapsed().as_secs_f64())
    }

    pub fn secs_since_last_failure(&self) -> Option<f64> {
        self.inner
            .read()
            .last_failure_time
            .map(|t| t.elapsed().as_secs_f64())
    }

    /// Generate a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            polls_completed: self.polls_completed(),
            query_failures: self.query_failures(),
            notifications_sent: self.notifications_sent(),
            monitors_started: self.monitors_started(),
            monitors_stopped: self.monitors_stopped(),
            active_monitors: self.active_monitors(),
            uptime_secs: self.uptime_secs(),
            secs_since_last_poll: self.secs_since_last_poll(),
            secs_since_last_failure: self.secs_since_last_failure(),
        }
    }
}

/// A point-in-time snapshot of metrics.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub polls_completed: u64,
    pub query_failures: u64,
    pub notifications_sent: u64,
    pub monitors_started: u64,
    pub monitors_stopped: u64,
    pub active_monitors: u64,
    pub uptime_secs: f64,
    pub secs_since_last_poll: Option<f64>,
    pub secs_since_last_failure: Option<f64>,
}

/// Health status of the monitoring engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    /// Monitors are polling (or none are active).
    Healthy,
    /// Active monitors exist but polls are getting stale.
    Degraded,
    /// Active monitors exist and no poll has completed for too long.
    Unhealthy,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "HEALTHY"),
            HealthStatus::Degraded => write!(f, "DEGRADED"),
            HealthStatus::Unhealthy => write!(f, "UNHEALTHY"),
        }
    }
}

impl MetricsSnapshot {
    /// Seconds without a completed poll before an active engine is degraded.
    const STALE_THRESHOLD_SECS: f64 = 30.0;
    /// Seconds without a completed poll before an active engine is unhealthy.
    const UNHEALTHY_THRESHOLD_SECS: f64 = 60.0;

    /// Determine the health status based on metrics.
    ///
    /// Staleness only matters while monitors are active; an idle engine
    /// is healthy by definition.
    pub fn health_status(&self) -> HealthStatus {
        if self.active_monitors == 0 {
            return HealthStatus::Healthy;
        }

        let secs_since_poll = match self.secs_since_last_poll {
            Some(secs) => secs,
            // Monitors active but nothing polled yet: judge by uptime.
            None => self.uptime_secs,
        };

        if secs_since_poll > Self::UNHEALTHY_THRESHOLD_SECS {
            HealthStatus::Unhealthy
        } else if secs_since_poll > Self::STALE_THRESHOLD_SECS {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        }
    }
}

impl std::fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Monitor Metrics ===")?;
        writeln!(f, "Uptime:              {:.1}s", self.uptime_secs)?;
        writeln!(f, "Active monitors:     {}", self.active_monitors)?;
        writeln!(f, "Monitors started:    {}", self.monitors_started)?;
        writeln!(f, "Monitors stopped:    {}", self.monitors_stopped)?;
        writeln!(f, "Polls completed:     {}", self.polls_completed)?;
        writeln!(f, "Query failures:      {}", self.query_failures)?;
        writeln!(f, "Notifications sent:  {}", self.notifications_sent)?;
        if let Some(secs) = self.secs_since_last_poll {
            writeln!(f, "Since last poll:     {:.1}s", secs)?;
        }
        if let Some(secs) = self.secs_since_last_failure {
            writeln!(f, "Since last failure:  {:.1}s", secs)?;
        }
        Ok(())
    }
}

/// Shared handle to metrics.
pub type SharedMetrics = Arc<MonitorMetrics>;

pub fn create_metrics() -> SharedMetrics {
    Arc::new(MonitorMetrics::new())
}
