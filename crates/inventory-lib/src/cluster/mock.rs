//! In-memory connectors for tests

use super::{ClusterConnector, ConnectorFactory, RawPod, UsageSample};
use crate::error::ConnectorError;
use crate::models::{Credentials, InstanceConfig};
use async_trait::async_trait;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// How a mock answers a usage lookup
#[derive(Debug, Clone)]
pub enum MockUsage {
    Sample(UsageSample),
    NoSample,
    Unavailable,
    Failure,
    Hang,
}

/// What a mock cluster looks like
#[derive(Debug, Clone, Default)]
pub struct MockCluster {
    pub pods: HashMap<String, Vec<RawPod>>,
    pub failing_namespaces: Vec<String>,
    pub usage: HashMap<String, MockUsage>,
    pub default_usage: Option<MockUsage>,
    pub list_delay: Option<Duration>,
}

impl MockCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pods(mut self, namespace: &str, pods: Vec<RawPod>) -> Self {
        self.pods.insert(namespace.to_string(), pods);
        self
    }

    pub fn with_failing_namespace(mut self, namespace: &str) -> Self {
        self.failing_namespaces.push(namespace.to_string());
        self
    }

    pub fn with_usage(mut self, pod_name: &str, usage: MockUsage) -> Self {
        self.usage.insert(pod_name.to_string(), usage);
        self
    }

    pub fn with_default_usage(mut self, usage: MockUsage) -> Self {
        self.default_usage = Some(usage);
        self
    }

    pub fn with_list_delay(mut self, delay: Duration) -> Self {
        self.list_delay = Some(delay);
        self
    }
}

pub struct MockConnector {
    cluster: MockCluster,
}

impl MockConnector {
    pub fn new(cluster: MockCluster) -> Self {
        Self { cluster }
    }
}

#[async_trait]
impl ClusterConnector for MockConnector {
    async fn list_pods(&self, namespace: &str) -> Result<Vec<RawPod>, ConnectorError> {
        if let Some(delay) = self.cluster.list_delay {
            tokio::time::sleep(delay).await;
        }
        if self.cluster.failing_namespaces.iter().any(|ns| ns == namespace) {
            return Err(ConnectorError::NamespaceQuery {
                namespace: namespace.to_string(),
                message: "Forbidden (403)".to_string(),
            });
        }
        Ok(self.cluster.pods.get(namespace).cloned().unwrap_or_default())
    }

    async fn fetch_usage(
        &self,
        _namespace: &str,
        pod_name: &str,
    ) -> Result<Option<UsageSample>, ConnectorError> {
        let usage = self
            .cluster
            .usage
            .get(pod_name)
            .or(self.cluster.default_usage.as_ref())
            .cloned()
            .unwrap_or(MockUsage::NoSample);

        match usage {
            MockUsage::Sample(sample) => Ok(Some(sample)),
            MockUsage::NoSample => Ok(None),
            MockUsage::Unavailable => Err(ConnectorError::MetricsUnavailable(
                "metrics.k8s.io not served".to_string(),
            )),
            MockUsage::Failure => Err(ConnectorError::Metrics("connection reset".to_string())),
            MockUsage::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(None)
            }
        }
    }
}

/// Factory handing out mock connectors by instance name
#[derive(Default)]
pub struct MockFactory {
    clusters: HashMap<String, MockCluster>,
    open_delay: HashMap<String, Duration>,
    opened: Mutex<Vec<(String, &'static str)>>,
    open_count: AtomicUsize,
}

impl MockFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cluster(mut self, instance: &str, cluster: MockCluster) -> Self {
        self.clusters.insert(instance.to_string(), cluster);
        self
    }

    pub fn with_open_delay(mut self, instance: &str, delay: Duration) -> Self {
        self.open_delay.insert(instance.to_string(), delay);
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Instances opened so far with the auth method used
    pub fn opened(&self) -> Vec<(String, &'static str)> {
        self.opened.lock().unwrap().clone()
    }

    pub fn open_count(&self) -> usize {
        self.open_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConnectorFactory for MockFactory {
    async fn open(
        &self,
        instance: &InstanceConfig,
    ) -> Result<Box<dyn ClusterConnector>, ConnectorError> {
        self.open_count.fetch_add(1, Ordering::SeqCst);
        self.opened
            .lock()
            .unwrap()
            .push((instance.name.clone(), instance.credentials.method()));

        if let Some(delay) = self.open_delay.get(&instance.name) {
            tokio::time::sleep(*delay).await;
        }

        match self.clusters.get(&instance.name) {
            Some(cluster) => Ok(Box::new(MockConnector::new(cluster.clone()))),
            None => Err(ConnectorError::Connection(format!(
                "{} unreachable",
                instance.api_url
            ))),
        }
    }
}

/// A pod as a Deployment would create it
pub fn deployment_pod(name: &str, namespace: &str) -> RawPod {
    serde_json::from_value(serde_json::json!({
        "metadata": {
            "name": name,
            "namespace": namespace,
            "uid": format!("uid-{}", name),
            "creationTimestamp": "2024-03-01T12:00:00Z",
            "labels": { "app": "web" }
        },
        "spec": {
            "nodeName": "node-a",
            "containers": [{ "name": "web", "image": "registry/web:2.4.1" }]
        },
        "status": { "phase": "Running", "podIP": "10.0.0.7" }
    }))
    .unwrap()
}

pub fn sample(cpu: &str, memory: &str) -> UsageSample {
    UsageSample {
        cpu: Some(Quantity(cpu.to_string())),
        memory: Some(Quantity(memory.to_string())),
    }
}

pub fn instance(name: &str, namespaces: &[&str]) -> InstanceConfig {
    InstanceConfig::new(name, format!("https://{}.example.com:6443", name))
        .with_namespaces(namespaces.iter().copied())
        .with_data_center(format!("dc-{}", name))
        .with_credentials(Credentials::Token("token".to_string()))
}
