//! Refresh coordination
//!
//! Runs one refresh cycle across all configured instances and publishes the
//! combined result as a single snapshot. At most one cycle runs at a time.

use crate::error::BuildError;
use crate::health::{components, HealthRegistry};
use crate::models::{FaultRecord, InstanceConfig};
use crate::observability::{InventoryMetrics, StructuredLogger};
use crate::scanner::{InstanceScan, InstanceScanner};
use crate::store::{Snapshot, SnapshotStore};
use futures::stream::{self, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{info, warn};

/// Default number of instance scans in flight
pub const DEFAULT_MAX_CONCURRENT_INSTANCES: usize = 4;

/// Answer to an on-demand refresh request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshAck {
    Started,
    AlreadyInProgress,
}

impl RefreshAck {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefreshAck::Started => "started",
            RefreshAck::AlreadyInProgress => "already_in_progress",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            RefreshAck::Started => "Data refresh started",
            RefreshAck::AlreadyInProgress => "Refresh already in progress",
        }
    }
}

/// Per-instance outcome of a refresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceSummary {
    pub instance: String,
    pub pods: usize,
    pub faults: usize,
    /// The instance contributed nothing because it could not be scanned
    pub failed: bool,
}

/// What one refresh cycle did
#[derive(Debug, Clone)]
pub struct RefreshReport {
    pub snapshot: Arc<Snapshot>,
    pub faults: Vec<FaultRecord>,
    pub instances: Vec<InstanceSummary>,
    pub duration: Duration,
}

impl RefreshReport {
    pub fn instances_failed(&self) -> usize {
        self.instances.iter().filter(|s| s.failed).count()
    }
}

/// Runs refresh cycles and publishes their snapshots
pub struct RefreshCoordinator {
    scanner: Arc<InstanceScanner>,
    store: SnapshotStore,
    instances: Vec<InstanceConfig>,
    max_concurrent_instances: usize,
    health: HealthRegistry,
    metrics: InventoryMetrics,
    logger: StructuredLogger,
    refresh_lock: Arc<Mutex<()>>,
    /// Set while a cycle holds `refresh_lock`
    refreshing: Arc<AtomicBool>,
}

impl RefreshCoordinator {
    pub fn builder() -> RefreshCoordinatorBuilder {
        RefreshCoordinatorBuilder::new()
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn instances(&self) -> &[InstanceConfig] {
        &self.instances
    }

    /// Whether a refresh is running right now
    pub fn is_refreshing(&self) -> bool {
        self.refreshing.load(Ordering::Acquire)
    }

    /// Refresh the configured instances, waiting behind a running cycle
    pub async fn refresh_all(&self) -> RefreshReport {
        self.refresh(&self.instances).await
    }

    /// Scan `instances` and publish the combined records. Never fails: every
    /// problem ends up as a fault in the report.
    pub async fn refresh(&self, instances: &[InstanceConfig]) -> RefreshReport {
        let _guard = self.refresh_lock.lock().await;
        self.refreshing.store(true, Ordering::Release);
        let report = self.run_cycle(instances).await;
        self.refreshing.store(false, Ordering::Release);
        report
    }

    /// Start a refresh of the configured instances in the background, unless
    /// one is already running
    pub fn trigger_refresh(self: &Arc<Self>) -> RefreshAck {
        let guard = match Arc::clone(&self.refresh_lock).try_lock_owned() {
            Ok(guard) => guard,
            Err(_) => {
                self.metrics.inc_refreshes_skipped();
                self.logger.log_refresh_skipped();
                return RefreshAck::AlreadyInProgress;
            }
        };

        self.refreshing.store(true, Ordering::Release);
        let coordinator = Arc::clone(self);
        tokio::spawn(async move {
            let _guard = guard;
            coordinator.run_cycle(&coordinator.instances).await;
            coordinator.refreshing.store(false, Ordering::Release);
        });

        RefreshAck::Started
    }

    async fn run_cycle(&self, instances: &[InstanceConfig]) -> RefreshReport {
        let start = Instant::now();
        self.logger.log_refresh_started(instances.len());

        if instances.is_empty() {
            warn!("No cluster instances configured, publishing empty snapshot");
        }

        let scans = self.scan_instances(instances).await;

        let mut records = Vec::new();
        let mut faults = Vec::new();
        let mut summaries = Vec::with_capacity(scans.len());
        for scan in scans {
            summaries.push(InstanceSummary {
                instance: scan.instance,
                pods: scan.records.len(),
                faults: scan.faults.len(),
                failed: !scan.connected,
            });
            records.extend(scan.records);
            faults.extend(scan.faults);
        }

        for fault in &faults {
            self.logger.log_fault(fault);
            self.metrics.inc_fault(fault);
        }

        let snapshot = self.store.publish(records);
        let duration = start.elapsed();

        let report = RefreshReport {
            snapshot,
            faults,
            instances: summaries,
            duration,
        };

        self.record_outcome(&report).await;
        report
    }

    /// Scan instances with bounded parallelism, keeping configured order
    async fn scan_instances(&self, instances: &[InstanceConfig]) -> Vec<InstanceScan> {
        stream::iter(instances.iter().cloned())
            .map(|instance| {
                let scanner = Arc::clone(&self.scanner);
                async move {
                    let name = instance.name.clone();
                    match tokio::spawn(async move { scanner.scan(&instance).await }).await {
                        Ok(scan) => scan,
                        Err(e) => InstanceScan::failed(
                            &name,
                            FaultRecord::instance(&name, format!("instance scan aborted: {e}")),
                        ),
                    }
                }
            })
            .buffered(self.max_concurrent_instances)
            .collect()
            .await
    }

    async fn record_outcome(&self, report: &RefreshReport) {
        let failed = report.instances_failed();
        let pods = report.snapshot.len();

        self.metrics.observe_refresh(report.duration, pods, failed);
        self.logger.log_refresh_completed(
            report.snapshot.generation,
            pods,
            report.faults.len(),
            failed,
            report.duration,
        );

        if !report.instances.is_empty() && failed == report.instances.len() {
            self.health
                .set_unhealthy(
                    components::REFRESH_COORDINATOR,
                    format!("all {} instances failed in last refresh", failed),
                )
                .await;
        } else if !report.faults.is_empty() {
            self.health
                .set_degraded(
                    components::REFRESH_COORDINATOR,
                    format!("{} faults in last refresh", report.faults.len()),
                )
                .await;
        } else {
            self.health
                .set_healthy(components::REFRESH_COORDINATOR)
                .await;
        }

        info!(
            generation = report.snapshot.generation,
            pods = pods,
            instances = report.instances.len(),
            "Snapshot published"
        );
    }
}

/// Builder for [`RefreshCoordinator`]
pub struct RefreshCoordinatorBuilder {
    scanner: Option<Arc<InstanceScanner>>,
    store: Option<SnapshotStore>,
    instances: Vec<InstanceConfig>,
    max_concurrent_instances: usize,
    health: Option<HealthRegistry>,
    logger: Option<StructuredLogger>,
}

impl RefreshCoordinatorBuilder {
    pub fn new() -> Self {
        Self {
            scanner: None,
            store: None,
            instances: Vec::new(),
            max_concurrent_instances: DEFAULT_MAX_CONCURRENT_INSTANCES,
            health: None,
            logger: None,
        }
    }

    pub fn scanner(mut self, scanner: Arc<InstanceScanner>) -> Self {
        self.scanner = Some(scanner);
        self
    }

    /// Store to publish into; a fresh one is created if unset
    pub fn store(mut self, store: SnapshotStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Instances used by `refresh_all` and `trigger_refresh`
    pub fn instances(mut self, instances: Vec<InstanceConfig>) -> Self {
        self.instances = instances;
        self
    }

    pub fn max_concurrent_instances(mut self, max: usize) -> Self {
        self.max_concurrent_instances = max;
        self
    }

    pub fn health(mut self, health: HealthRegistry) -> Self {
        self.health = Some(health);
        self
    }

    pub fn logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn build(self) -> Result<RefreshCoordinator, BuildError> {
        let scanner = self.scanner.ok_or(BuildError::Missing("scanner"))?;
        if self.max_concurrent_instances == 0 {
            return Err(BuildError::Zero("max_concurrent_instances"));
        }

        Ok(RefreshCoordinator {
            scanner,
            store: self.store.unwrap_or_default(),
            instances: self.instances,
            max_concurrent_instances: self.max_concurrent_instances,
            health: self.health.unwrap_or_default(),
            metrics: InventoryMetrics::new(),
            logger: self
                .logger
                .unwrap_or_else(|| StructuredLogger::new("pod-inventory")),
            refresh_lock: Arc::new(Mutex::new(())),
            refreshing: Arc::new(AtomicBool::new(false)),
        })
    }
}

impl Default for RefreshCoordinatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
