//! Best-effort usage metrics augmentation
//!
//! Fills `cpu_usage` / `memory_usage` on a record. A failed lookup degrades
//! the two usage fields to a sentinel; it never fails the record.

use crate::cluster::{ClusterConnector, UsageSample};
use crate::error::ConnectorError;
use crate::models::{Field, PodRecord};
use std::time::Duration;
use tracing::debug;

/// Default deadline for one usage lookup
pub const DEFAULT_METRICS_TIMEOUT: Duration = Duration::from_secs(5);

/// Which of the outcome categories a lookup fell into
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsageOutcome {
    /// A usage sample was found
    Sample,
    /// The backend answered without a sample for the pod
    NoSample,
    /// The metrics backend is absent or denied access
    Unavailable(String),
    /// The lookup failed for another reason (including timeout)
    Error(String),
}

impl UsageOutcome {
    /// Cause text for outcomes worth recording as a fault
    pub fn fault_cause(&self) -> Option<&str> {
        match self {
            UsageOutcome::Unavailable(cause) | UsageOutcome::Error(cause) => Some(cause),
            UsageOutcome::Sample | UsageOutcome::NoSample => None,
        }
    }
}

/// Looks up live usage for records through a connector
#[derive(Debug, Clone)]
pub struct MetricsAugmenter {
    timeout: Duration,
}

impl Default for MetricsAugmenter {
    fn default() -> Self {
        Self::new(DEFAULT_METRICS_TIMEOUT)
    }
}

impl MetricsAugmenter {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Return the record with its usage fields filled in, plus the outcome.
    /// No other field of the record is touched.
    pub async fn augment(
        &self,
        mut record: PodRecord,
        connector: &dyn ClusterConnector,
    ) -> (PodRecord, UsageOutcome) {
        let lookup = connector.fetch_usage(&record.namespace, &record.pod_name);
        let result = match tokio::time::timeout(self.timeout, lookup).await {
            Ok(result) => result,
            Err(_) => Err(ConnectorError::Timeout {
                operation: "metrics lookup",
                after: self.timeout,
            }),
        };

        let (cpu, memory, outcome) = match result {
            Ok(Some(sample)) => {
                let (cpu, memory) = usage_fields(sample);
                (cpu, memory, UsageOutcome::Sample)
            }
            Ok(None) => (Field::Absent, Field::Absent, UsageOutcome::NoSample),
            Err(ConnectorError::MetricsUnavailable(cause)) => (
                Field::MetricsUnavailable,
                Field::MetricsUnavailable,
                UsageOutcome::Unavailable(cause),
            ),
            Err(e) => (
                Field::FetchError,
                Field::FetchError,
                UsageOutcome::Error(e.to_string()),
            ),
        };

        debug!(
            namespace = %record.namespace,
            pod = %record.pod_name,
            outcome = ?outcome,
            "Usage lookup finished"
        );

        record.cpu_usage = cpu;
        record.memory_usage = memory;
        (record, outcome)
    }
}

fn usage_fields(sample: UsageSample) -> (Field, Field) {
    (
        Field::from_option(sample.cpu.map(|q| q.0)),
        Field::from_option(sample.memory.map(|q| q.0)),
    )
}
