use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::{Instant, MissedTickBehavior};
use uuid::Uuid;

use crate::config::{AppConfig, NotificationsConfig, SchedulerConfig};
use crate::core::{
    ChangeDetector, Decision, DiscardReason, ScanFailure, SnapshotBuilder, WatchState,
};
use crate::models::{RawContent, TrackedResource};
use crate::plugins::traits::{ContentFetcher, NotifierPlugin};
use crate::utils::error::{AppError, Result};

/// Identifies one poll cycle in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleId {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
}

impl CycleId {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
        }
    }
}

impl fmt::Display for CycleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.started_at.format("%Y-%m-%dT%H:%M:%SZ"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckOutcome {
    Baselined,
    Unchanged,
    Alerted,
    Failed(String),
    Discarded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceCheckResult {
    pub resource_id: String,
    pub outcome: CheckOutcome,
    /// False when the notifier rejected the alert or failure report.
    pub delivered: bool,
    pub response_time_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleReport {
    pub cycle: CycleId,
    pub results: Vec<ResourceCheckResult>,
    pub total_time_ms: u64,
}

impl CycleReport {
    fn count(&self, pred: impl Fn(&CheckOutcome) -> bool) -> usize {
        self.results.iter().filter(|r| pred(&r.outcome)).count()
    }

    pub fn checked(&self) -> usize {
        self.results.len()
    }

    pub fn baselined(&self) -> usize {
        self.count(|o| matches!(o, CheckOutcome::Baselined))
    }

    pub fn unchanged(&self) -> usize {
        self.count(|o| matches!(o, CheckOutcome::Unchanged))
    }

    pub fn alerts(&self) -> usize {
        self.count(|o| matches!(o, CheckOutcome::Alerted))
    }

    pub fn failures(&self) -> usize {
        self.count(|o| matches!(o, CheckOutcome::Failed(_)))
    }

    pub fn discarded(&self) -> usize {
        self.count(|o| matches!(o, CheckOutcome::Discarded))
    }

    pub fn delivery_failures(&self) -> usize {
        self.results.iter().filter(|r| !r.delivered).count()
    }

    pub fn result_for(&self, resource_id: &str) -> Option<&ResourceCheckResult> {
        self.results.iter().find(|r| r.resource_id == resource_id)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulerStats {
    pub cycles_run: u64,
    pub resources_checked: u64,
    pub baselines_set: u64,
    pub alerts_sent: u64,
    pub scan_failures: u64,
    pub discarded_results: u64,
    pub delivery_failures: u64,
    pub last_cycle: Option<CycleId>,
    pub uptime_seconds: u64,
}

/// Polls every tracked resource once per interval:
/// fetch → snapshot → decide → notify, with failures isolated per resource.
pub struct PollScheduler {
    state: Arc<WatchState>,
    detector: ChangeDetector,
    builder: SnapshotBuilder,
    fetcher: Arc<dyn ContentFetcher>,
    notifier: Arc<dyn NotifierPlugin>,
    config: SchedulerConfig,
    max_concurrent_checks: usize,
    delivery_timeout: Duration,
    stats: RwLock<SchedulerStats>,
    start_time: DateTime<Utc>,
}

impl PollScheduler {
    pub fn new(
        state: Arc<WatchState>,
        detector: ChangeDetector,
        builder: SnapshotBuilder,
        fetcher: Arc<dyn ContentFetcher>,
        notifier: Arc<dyn NotifierPlugin>,
        config: SchedulerConfig,
        max_concurrent_checks: usize,
    ) -> Self {
        Self {
            state,
            detector,
            builder,
            fetcher,
            notifier,
            config,
            max_concurrent_checks: max_concurrent_checks.max(1),
            delivery_timeout: NotificationsConfig::default().delivery_timeout(),
            stats: RwLock::new(SchedulerStats::default()),
            start_time: Utc::now(),
        }
    }

    pub fn from_config(
        config: &AppConfig,
        state: Arc<WatchState>,
        fetcher: Arc<dyn ContentFetcher>,
        notifier: Arc<dyn NotifierPlugin>,
    ) -> Result<Self> {
        Ok(Self::new(
            state,
            ChangeDetector::from_config(&config.detection)?,
            SnapshotBuilder::from_config(&config.detection)?,
            fetcher,
            notifier,
            config.scheduler.clone(),
            config.scraper.max_concurrent_checks,
        )
        .with_delivery_timeout(config.notifications.delivery_timeout()))
    }

    /// Caps how long one alert or failure report may hold up its resource's check.
    pub fn with_delivery_timeout(mut self, timeout: Duration) -> Self {
        self.delivery_timeout = timeout;
        self
    }

    pub fn state(&self) -> Arc<WatchState> {
        Arc::clone(&self.state)
    }

    /// Runs cycles on the configured interval until `shutdown` resolves.
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let first_tick = Instant::now() + self.config.initial_delay();
        let mut ticker = tokio::time::interval_at(first_tick, self.config.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            interval_secs = self.config.interval_secs,
            initial_delay_secs = self.config.initial_delay_secs,
            fetcher = self.fetcher.name(),
            "Poll scheduler started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = self.run_cycle().await;
                    log_cycle_report(&report);
                }
                _ = &mut shutdown => {
                    tracing::info!("Shutdown signal received");
                    break;
                }
            }
        }
    }

    /// Checks every currently tracked resource once.
    pub async fn run_cycle(&self) -> CycleReport {
        let cycle = CycleId::new();
        let start_time = Instant::now();
        let resources = self.state.current_resources().await;

        tracing::debug!(cycle = %cycle, resources = resources.len(), "Starting poll cycle");

        let results: Vec<ResourceCheckResult> = futures::stream::iter(resources)
            .map(|resource| self.check_resource(cycle, resource))
            .buffer_unordered(self.max_concurrent_checks)
            .collect()
            .await;

        let report = CycleReport {
            cycle,
            results,
            total_time_ms: start_time.elapsed().as_millis() as u64,
        };
        self.update_stats(&report).await;
        report
    }

    pub async fn get_stats(&self) -> SchedulerStats {
        let mut stats = self.stats.read().await.clone();
        stats.uptime_seconds = Utc::now()
            .signed_duration_since(self.start_time)
            .num_seconds()
            .max(0) as u64;
        stats
    }

    async fn check_resource(&self, cycle: CycleId, resource: TrackedResource) -> ResourceCheckResult {
        let start_time = Instant::now();
        let id = resource.id;

        let snapshot = match self.fetch_content(&id).await {
            Ok(content) => self.builder.build_blocking(content).await,
            Err(e) => Err(e),
        };

        let (outcome, delivered) = match snapshot {
            Err(e) => {
                if e.is_scan_failure() {
                    tracing::warn!(resource = %id, cycle = %cycle, error = %e, "Scan failed");
                } else {
                    tracing::error!(resource = %id, cycle = %cycle, error = %e, "Unexpected error during scan");
                }
                let delivered = self.report_failure(cycle, &id, &e).await;
                (CheckOutcome::Failed(e.to_string()), delivered)
            }
            Ok(snapshot) => {
                let fingerprint = snapshot.fingerprint().short().to_string();
                match self.detector.apply(&self.state, &id, snapshot).await {
                    Decision::Baselined => {
                        tracing::info!(resource = %id, cycle = %cycle, fingerprint = %fingerprint, "Baseline set");
                        (CheckOutcome::Baselined, true)
                    }
                    Decision::Unchanged => {
                        tracing::debug!(resource = %id, cycle = %cycle, "No significant change");
                        (CheckOutcome::Unchanged, true)
                    }
                    Decision::Changed(alert) => {
                        tracing::info!(
                            resource = %id,
                            cycle = %cycle,
                            fingerprint = %fingerprint,
                            previous = ?alert.previous_count,
                            current = ?alert.current_count,
                            delta = ?alert.delta,
                            "Change detected"
                        );
                        let delivered = self.deliver(cycle, &id, &alert.to_message()).await;
                        (CheckOutcome::Alerted, delivered)
                    }
                    Decision::Discarded(reason) => {
                        let reason = match reason {
                            DiscardReason::NotTracked => "resource no longer tracked",
                            DiscardReason::Stale => "stale snapshot",
                        };
                        tracing::info!(resource = %id, cycle = %cycle, reason, "Result discarded");
                        (CheckOutcome::Discarded, true)
                    }
                }
            }
        };

        ResourceCheckResult {
            resource_id: id,
            outcome,
            delivered,
            response_time_ms: start_time.elapsed().as_millis() as u64,
        }
    }

    /// Fetch bounded by the fetcher's own declared timeout.
    async fn fetch_content(&self, resource_id: &str) -> Result<RawContent> {
        let timeout = self.fetcher.timeout();
        match tokio::time::timeout(timeout, self.fetcher.fetch(resource_id)).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Timeout {
                resource: resource_id.to_string(),
                timeout_secs: timeout.as_secs(),
            }),
        }
    }

    async fn report_failure(&self, cycle: CycleId, resource_id: &str, error: &AppError) -> bool {
        // A resource removed mid-cycle gets no report.
        if !self.state.is_tracked(resource_id).await {
            return true;
        }

        let failure = ScanFailure {
            resource_id: resource_id.to_string(),
            error: error.to_string(),
            occurred_at: chrono::Local::now(),
        };
        self.deliver(cycle, resource_id, &failure.to_message()).await
    }

    /// Notifiers bound their own requests; the outer timeout is a backstop.
    async fn deliver(&self, cycle: CycleId, resource_id: &str, message: &str) -> bool {
        let result = match tokio::time::timeout(self.delivery_timeout, self.notifier.notify(message)).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Delivery {
                notifier: self.notifier.plugin_type().to_string(),
                message: format!("no response within {}s", self.delivery_timeout.as_secs()),
            }),
        };

        match result {
            Ok(result) => {
                tracing::debug!(resource = %resource_id, cycle = %cycle, delivered = result.delivered, "Notification sent");
                true
            }
            Err(e) => {
                tracing::error!(resource = %resource_id, cycle = %cycle, error = %e, "Notification delivery failed");
                false
            }
        }
    }

    async fn update_stats(&self, report: &CycleReport) {
        let mut stats = self.stats.write().await;
        stats.cycles_run += 1;
        stats.resources_checked += report.checked() as u64;
        stats.baselines_set += report.baselined() as u64;
        stats.alerts_sent += report.alerts() as u64;
        stats.scan_failures += report.failures() as u64;
        stats.discarded_results += report.discarded() as u64;
        stats.delivery_failures += report.delivery_failures() as u64;
        stats.last_cycle = Some(report.cycle);
    }
}

fn log_cycle_report(report: &CycleReport) {
    tracing::info!(
        cycle = %report.cycle,
        checked = report.checked(),
        baselined = report.baselined(),
        alerts = report.alerts(),
        failures = report.failures(),
        discarded = report.discarded(),
        elapsed_ms = report.total_time_ms,
        "Poll cycle complete"
    );
}
