//! Per-instance scanning
//!
//! Opens one connector for an instance, walks its namespaces and builds the
//! instance's records. Failures are caught at the smallest scope they affect
//! (pod, namespace, instance) and recorded as faults.

use crate::augment::{MetricsAugmenter, DEFAULT_METRICS_TIMEOUT};
use crate::cluster::{ClusterConnector, ConnectorFactory};
use crate::error::ConnectorError;
use crate::extract::map_pod;
use crate::models::{FaultRecord, InstanceConfig, PodRecord};
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Configuration for instance scans
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// Deadline for opening and verifying a connector
    pub connect_timeout: Duration,
    /// Deadline for listing one namespace
    pub list_timeout: Duration,
    /// Deadline for one usage lookup
    pub metrics_timeout: Duration,
    /// Usage lookups in flight per namespace
    pub metrics_concurrency: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            list_timeout: Duration::from_secs(30),
            metrics_timeout: DEFAULT_METRICS_TIMEOUT,
            metrics_concurrency: 8,
        }
    }
}

/// One instance's contribution to a refresh
#[derive(Debug, Clone, Default)]
pub struct InstanceScan {
    pub instance: String,
    pub records: Vec<PodRecord>,
    pub faults: Vec<FaultRecord>,
    /// Whether a connector was opened
    pub connected: bool,
}

impl InstanceScan {
    fn new(instance: &str) -> Self {
        Self {
            instance: instance.to_string(),
            ..Default::default()
        }
    }

    /// A scan that never got to talk to the cluster
    pub fn failed(instance: &str, fault: FaultRecord) -> Self {
        Self {
            instance: instance.to_string(),
            records: Vec::new(),
            faults: vec![fault],
            connected: false,
        }
    }
}

/// Scans a single cluster instance
pub struct InstanceScanner {
    factory: Arc<dyn ConnectorFactory>,
    augmenter: MetricsAugmenter,
    config: ScannerConfig,
}

impl InstanceScanner {
    pub fn new(factory: Arc<dyn ConnectorFactory>, config: ScannerConfig) -> Self {
        Self {
            factory,
            augmenter: MetricsAugmenter::new(config.metrics_timeout),
            config,
        }
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Scan every configured namespace of an instance
    pub async fn scan(&self, instance: &InstanceConfig) -> InstanceScan {
        if instance.namespaces.is_empty() {
            return InstanceScan::failed(
                &instance.name,
                FaultRecord::configuration(&instance.name, "no namespaces configured"),
            );
        }

        let opened = tokio::time::timeout(self.config.connect_timeout, self.factory.open(instance))
            .await
            .unwrap_or(Err(ConnectorError::Timeout {
                operation: "connect",
                after: self.config.connect_timeout,
            }));

        let connector = match opened {
            Ok(connector) => connector,
            Err(e) => {
                return InstanceScan::failed(
                    &instance.name,
                    FaultRecord::instance(&instance.name, e.to_string()),
                );
            }
        };

        let mut scan = InstanceScan::new(&instance.name);
        scan.connected = true;

        let mut seen = HashSet::new();
        for namespace in &instance.namespaces {
            let namespace = namespace.trim();
            if namespace.is_empty() {
                scan.faults.push(FaultRecord::configuration(
                    &instance.name,
                    "empty namespace name configured",
                ));
                continue;
            }
            if !seen.insert(namespace) {
                debug!(instance = %instance.name, namespace = %namespace, "Namespace listed twice, scanning once");
                continue;
            }

            self.scan_namespace(instance, namespace, connector.as_ref(), &mut scan)
                .await;
        }

        info!(
            instance = %instance.name,
            pods = scan.records.len(),
            faults = scan.faults.len(),
            "Instance scan complete"
        );

        // connector dropped here, releasing the session
        scan
    }

    async fn scan_namespace(
        &self,
        instance: &InstanceConfig,
        namespace: &str,
        connector: &dyn ClusterConnector,
        scan: &mut InstanceScan,
    ) {
        let listed = tokio::time::timeout(self.config.list_timeout, connector.list_pods(namespace))
            .await
            .unwrap_or(Err(ConnectorError::Timeout {
                operation: "pod listing",
                after: self.config.list_timeout,
            }));

        let pods = match listed {
            Ok(pods) => pods,
            Err(e) => {
                scan.faults
                    .push(FaultRecord::namespace(&instance.name, namespace, e.to_string()));
                return;
            }
        };

        info!(
            instance = %instance.name,
            namespace = %namespace,
            pods = pods.len(),
            "Listed pods"
        );

        let mut mapped = Vec::with_capacity(pods.len());
        for mut pod in pods {
            if pod.metadata.namespace.is_none() {
                pod.metadata.namespace = Some(namespace.to_string());
            }

            match map_pod(&pod, instance.data_center.as_deref()) {
                Ok(record) => mapped.push(record),
                Err(e) => scan.faults.push(FaultRecord::pod(
                    &instance.name,
                    namespace,
                    pod.name().map(str::to_string),
                    e.to_string(),
                )),
            }
        }

        let augmented: Vec<_> = stream::iter(mapped)
            .map(|record| self.augmenter.augment(record, connector))
            .buffered(self.config.metrics_concurrency.max(1))
            .collect()
            .await;

        for (record, outcome) in augmented {
            if let Some(cause) = outcome.fault_cause() {
                scan.faults.push(FaultRecord::metrics(
                    &instance.name,
                    namespace,
                    &record.pod_name,
                    cause,
                ));
            }
            scan.records.push(record);
        }
    }
}
