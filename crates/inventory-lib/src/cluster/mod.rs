//! Cluster access
//!
//! A [`ConnectorFactory`] opens one authenticated session per cluster
//! instance. The resulting [`ClusterConnector`] lists pods and looks up
//! per-pod usage; it is dropped (and its session released) when the scan of
//! that instance ends.

mod kube_connector;
mod raw;

#[cfg(test)]
pub(crate) mod mock;

pub use kube_connector::{KubeConnector, KubeConnectorFactory};
pub use raw::{
    RawContainer, RawMetadata, RawOwnerReference, RawPod, RawPodSpec, RawPodStatus, RawResources,
};

use crate::error::ConnectorError;
use crate::models::InstanceConfig;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;

pub use async_trait::async_trait;

/// Live resource usage of a pod's primary container
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsageSample {
    pub cpu: Option<Quantity>,
    pub memory: Option<Quantity>,
}

/// An open session to one cluster instance
#[async_trait]
pub trait ClusterConnector: Send + Sync {
    /// List all pods in a namespace
    async fn list_pods(&self, namespace: &str) -> Result<Vec<RawPod>, ConnectorError>;

    /// Look up current usage for one pod. `Ok(None)` means the metrics
    /// backend answered but holds no sample for the pod.
    async fn fetch_usage(
        &self,
        namespace: &str,
        pod_name: &str,
    ) -> Result<Option<UsageSample>, ConnectorError>;
}

/// Opens connectors for configured instances
#[async_trait]
pub trait ConnectorFactory: Send + Sync {
    /// Open and verify a session. Fails with [`ConnectorError::Connection`]
    /// when the instance is unreachable or rejects the credentials.
    async fn open(
        &self,
        instance: &InstanceConfig,
    ) -> Result<Box<dyn ClusterConnector>, ConnectorError>;
}
