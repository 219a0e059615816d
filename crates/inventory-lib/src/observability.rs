//! Observability for the inventory service
//!
//! Provides:
//! - Prometheus metrics (refresh latency, snapshot size, faults by scope)
//! - Structured lifecycle events with tracing

use crate::models::FaultRecord;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{info, warn};

/// Histogram buckets for refresh durations (in seconds)
const REFRESH_BUCKETS: &[f64] = &[0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<InventoryMetricsInner> = OnceLock::new();

struct InventoryMetricsInner {
    refresh_duration_seconds: Histogram,
    refreshes: IntCounter,
    refreshes_skipped: IntCounter,
    snapshot_pods: IntGauge,
    faults: IntCounterVec,
    instances_failed: IntGauge,
    last_publish_timestamp: IntGauge,
}

impl InventoryMetricsInner {
    fn new() -> Self {
        Self {
            refresh_duration_seconds: register_histogram!(
                "pod_inventory_refresh_duration_seconds",
                "Time spent on one full refresh across all instances",
                REFRESH_BUCKETS.to_vec()
            )
            .expect("Failed to register refresh_duration_seconds"),

            refreshes: register_int_counter!(
                "pod_inventory_refreshes_total",
                "Total number of completed refresh cycles"
            )
            .expect("Failed to register refreshes_total"),

            refreshes_skipped: register_int_counter!(
                "pod_inventory_refreshes_skipped_total",
                "Refresh requests dropped because one was already running"
            )
            .expect("Failed to register refreshes_skipped_total"),

            snapshot_pods: register_int_gauge!(
                "pod_inventory_snapshot_pods",
                "Number of pod records in the current snapshot"
            )
            .expect("Failed to register snapshot_pods"),

            faults: register_int_counter_vec!(
                "pod_inventory_faults_total",
                "Faults recorded during scans, by scope",
                &["scope"]
            )
            .expect("Failed to register faults_total"),

            instances_failed: register_int_gauge!(
                "pod_inventory_instances_failed",
                "Instances that contributed nothing in the last refresh"
            )
            .expect("Failed to register instances_failed"),

            last_publish_timestamp: register_int_gauge!(
                "pod_inventory_last_publish_timestamp_seconds",
                "Unix time of the last snapshot publish"
            )
            .expect("Failed to register last_publish_timestamp_seconds"),
        }
    }
}

/// Handle to the process-wide inventory metrics
///
/// Clones share the same underlying metrics.
#[derive(Clone)]
pub struct InventoryMetrics {
    _private: (),
}

impl Default for InventoryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl InventoryMetrics {
    /// Create a handle, registering the metrics on first use
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(InventoryMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &InventoryMetricsInner {
        GLOBAL_METRICS.get_or_init(InventoryMetricsInner::new)
    }

    /// Record a finished refresh and the snapshot it published
    pub fn observe_refresh(&self, duration: Duration, pods: usize, instances_failed: usize) {
        let inner = self.inner();
        inner.refresh_duration_seconds.observe(duration.as_secs_f64());
        inner.refreshes.inc();
        inner.snapshot_pods.set(pods as i64);
        inner.instances_failed.set(instances_failed as i64);
        inner
            .last_publish_timestamp
            .set(chrono::Utc::now().timestamp());
    }

    pub fn inc_refreshes_skipped(&self) {
        self.inner().refreshes_skipped.inc();
    }

    pub fn inc_fault(&self, fault: &FaultRecord) {
        self.inner()
            .faults
            .with_label_values(&[fault.scope.as_str()])
            .inc();
    }
}

/// Structured logger for inventory lifecycle events
#[derive(Clone)]
pub struct StructuredLogger {
    service_name: String,
}

impl StructuredLogger {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    pub fn log_startup(&self, version: &str, instances: usize) {
        info!(
            event = "service_started",
            service = %self.service_name,
            version = %version,
            instances = instances,
            "Pod inventory service started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            service = %self.service_name,
            reason = %reason,
            "Pod inventory service shutting down"
        );
    }

    pub fn log_refresh_started(&self, instances: usize) {
        info!(
            event = "refresh_started",
            service = %self.service_name,
            instances = instances,
            "Refresh started"
        );
    }

    pub fn log_refresh_completed(
        &self,
        generation: u64,
        pods: usize,
        faults: usize,
        instances_failed: usize,
        duration: Duration,
    ) {
        info!(
            event = "refresh_completed",
            service = %self.service_name,
            generation = generation,
            pods = pods,
            faults = faults,
            instances_failed = instances_failed,
            duration_ms = duration.as_millis() as u64,
            "Refresh completed, snapshot published"
        );
    }

    pub fn log_refresh_skipped(&self) {
        info!(
            event = "refresh_skipped",
            service = %self.service_name,
            "Refresh already in progress, request dropped"
        );
    }

    /// Log one scan fault
    pub fn log_fault(&self, fault: &FaultRecord) {
        warn!(
            event = "scan_fault",
            service = %self.service_name,
            scope = %fault.scope,
            instance = %fault.instance,
            namespace = fault.namespace.as_deref().unwrap_or(""),
            pod = fault.pod.as_deref().unwrap_or(""),
            cause = %fault.cause,
            "Scan fault recorded"
        );
    }
}
