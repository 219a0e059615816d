//! Shared fixtures for server tests

#![allow(dead_code)]

use async_trait::async_trait;
use inventory_lib::{
    cluster::{RawPod, UsageSample},
    health::{components, HealthRegistry},
    ClusterConnector, ConnectorError, ConnectorFactory, Credentials, InstanceConfig,
    InstanceScanner, RefreshCoordinator, ScannerConfig, SnapshotStore,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Clusters served from memory, keyed by instance name
#[derive(Default)]
pub struct StaticFactory {
    clusters: HashMap<String, HashMap<String, Vec<RawPod>>>,
    open_delay: Option<Duration>,
}

impl StaticFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pods(mut self, instance: &str, namespace: &str, pods: Vec<RawPod>) -> Self {
        self.clusters
            .entry(instance.to_string())
            .or_default()
            .insert(namespace.to_string(), pods);
        self
    }

    pub fn with_open_delay(mut self, delay: Duration) -> Self {
        self.open_delay = Some(delay);
        self
    }
}

struct StaticConnector {
    namespaces: HashMap<String, Vec<RawPod>>,
}

#[async_trait]
impl ClusterConnector for StaticConnector {
    async fn list_pods(&self, namespace: &str) -> Result<Vec<RawPod>, ConnectorError> {
        Ok(self.namespaces.get(namespace).cloned().unwrap_or_default())
    }

    async fn fetch_usage(
        &self,
        _namespace: &str,
        _pod_name: &str,
    ) -> Result<Option<UsageSample>, ConnectorError> {
        Err(ConnectorError::MetricsUnavailable("not served".to_string()))
    }
}

#[async_trait]
impl ConnectorFactory for StaticFactory {
    async fn open(
        &self,
        instance: &InstanceConfig,
    ) -> Result<Box<dyn ClusterConnector>, ConnectorError> {
        if let Some(delay) = self.open_delay {
            tokio::time::sleep(delay).await;
        }
        match self.clusters.get(&instance.name) {
            Some(namespaces) => Ok(Box::new(StaticConnector {
                namespaces: namespaces.clone(),
            })),
            None => Err(ConnectorError::Connection("connection refused".to_string())),
        }
    }
}

pub fn pod(name: &str, namespace: &str, app: &str, phase: &str) -> RawPod {
    serde_json::from_value(serde_json::json!({
        "metadata": {
            "name": name,
            "namespace": namespace,
            "creationTimestamp": "2024-05-01T08:00:00Z",
            "labels": { "app": app }
        },
        "spec": { "containers": [{ "name": "main", "image": format!("registry/{}:1.0.0", app) }] },
        "status": { "phase": phase }
    }))
    .unwrap()
}

pub fn instance(name: &str, namespaces: &[&str]) -> InstanceConfig {
    InstanceConfig::new(name, format!("https://{}.example.com:6443", name))
        .with_namespaces(namespaces.iter().copied())
        .with_data_center(format!("dc-{}", name))
        .with_credentials(Credentials::Token("t".to_string()))
}

pub async fn coordinator(
    factory: StaticFactory,
    instances: Vec<InstanceConfig>,
) -> (Arc<RefreshCoordinator>, HealthRegistry) {
    let health = HealthRegistry::new();
    health.register(components::REFRESH_COORDINATOR).await;
    health.register(components::SCHEDULER).await;

    let scanner = InstanceScanner::new(Arc::new(factory), ScannerConfig::default());
    let coordinator = RefreshCoordinator::builder()
        .scanner(Arc::new(scanner))
        .store(SnapshotStore::new())
        .instances(instances)
        .health(health.clone())
        .build()
        .unwrap();

    (Arc::new(coordinator), health)
}
