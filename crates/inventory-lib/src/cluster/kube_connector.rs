//! Connector backed by the Kubernetes API via `kube`

use super::{ClusterConnector, ConnectorFactory, RawPod, UsageSample};
use crate::error::ConnectorError;
use crate::models::{Credentials, InstanceConfig};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use kube::{
    api::{Api, ListParams},
    config::{KubeConfigOptions, Kubeconfig},
    core::{ApiResource, DynamicObject, GroupVersionKind},
    Client, Config,
};
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info, warn};

const CLUSTER_ENTRY: &str = "inventory-cluster";
const USER_ENTRY: &str = "inventory-user";
const CONTEXT_ENTRY: &str = "inventory";

/// Opens [`KubeConnector`]s with per-request timeouts applied to the client
#[derive(Debug, Clone)]
pub struct KubeConnectorFactory {
    connect_timeout: Duration,
    read_timeout: Duration,
}

impl Default for KubeConnectorFactory {
    fn default() -> Self {
        Self::new(Duration::from_secs(10), Duration::from_secs(30))
    }
}

impl KubeConnectorFactory {
    pub fn new(connect_timeout: Duration, read_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            read_timeout,
        }
    }

    /// Build a single-context kubeconfig for the instance. Exactly one
    /// authentication method ends up in the user entry.
    fn kubeconfig_for(instance: &InstanceConfig) -> Result<Kubeconfig, ConnectorError> {
        let user = match &instance.credentials {
            Credentials::Token(token) => json!({ "token": token }),
            Credentials::Basic { username, password } => {
                json!({ "username": username, "password": password })
            }
            Credentials::Anonymous => json!({}),
        };

        let document = json!({
            "apiVersion": "v1",
            "kind": "Config",
            "clusters": [{
                "name": CLUSTER_ENTRY,
                "cluster": {
                    "server": instance.api_url,
                    "insecure-skip-tls-verify": instance.insecure_skip_tls_verify,
                }
            }],
            "users": [{ "name": USER_ENTRY, "user": user }],
            "contexts": [{
                "name": CONTEXT_ENTRY,
                "context": { "cluster": CLUSTER_ENTRY, "user": USER_ENTRY }
            }],
            "current-context": CONTEXT_ENTRY,
        });

        serde_json::from_value(document).map_err(|e| {
            ConnectorError::Connection(format!("invalid connection settings: {}", e))
        })
    }

    async fn client_for(&self, instance: &InstanceConfig) -> Result<Client, ConnectorError> {
        let kubeconfig = Self::kubeconfig_for(instance)?;
        let mut config = Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
            .await
            .map_err(|e| ConnectorError::Connection(format!("invalid client config: {}", e)))?;

        config.connect_timeout = Some(self.connect_timeout);
        config.read_timeout = Some(self.read_timeout);

        Client::try_from(config).map_err(|e| ConnectorError::Connection(describe(&e)))
    }
}

#[async_trait]
impl ConnectorFactory for KubeConnectorFactory {
    async fn open(
        &self,
        instance: &InstanceConfig,
    ) -> Result<Box<dyn ClusterConnector>, ConnectorError> {
        match &instance.credentials {
            Credentials::Anonymous => warn!(
                instance = %instance.name,
                "No token or username/password configured, attempting anonymous connection"
            ),
            credentials => debug!(
                instance = %instance.name,
                auth = credentials.method(),
                "Using configured credentials"
            ),
        }
        if instance.insecure_skip_tls_verify {
            warn!(instance = %instance.name, "TLS certificate verification disabled");
        }

        let client = self.client_for(instance).await?;

        // Listing pods would surface a bad URL or rejected credentials too,
        // but only as a namespace fault; check the session up front.
        let version = client
            .apiserver_version()
            .await
            .map_err(|e| ConnectorError::Connection(describe(&e)))?;

        info!(
            instance = %instance.name,
            url = %instance.api_url,
            server_version = %version.git_version,
            "Connected to cluster instance"
        );

        Ok(Box::new(KubeConnector {
            client,
            instance: instance.name.clone(),
        }))
    }
}

/// Session to one cluster instance
pub struct KubeConnector {
    client: Client,
    instance: String,
}

#[async_trait]
impl ClusterConnector for KubeConnector {
    async fn list_pods(&self, namespace: &str) -> Result<Vec<RawPod>, ConnectorError> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);

        let list = pods
            .list(&ListParams::default())
            .await
            .map_err(|e| ConnectorError::NamespaceQuery {
                namespace: namespace.to_string(),
                message: describe(&e),
            })?;

        let decoded = list
            .items
            .into_iter()
            .filter_map(|pod| match decode_pod(&pod) {
                Ok(raw) => Some(raw),
                Err(e) => {
                    warn!(
                        instance = %self.instance,
                        namespace = %namespace,
                        pod = ?pod.metadata.name,
                        error = %e,
                        "Skipping pod that could not be decoded"
                    );
                    None
                }
            })
            .collect();

        Ok(decoded)
    }

    async fn fetch_usage(
        &self,
        namespace: &str,
        pod_name: &str,
    ) -> Result<Option<UsageSample>, ConnectorError> {
        let metrics: Api<DynamicObject> =
            Api::namespaced_with(self.client.clone(), namespace, &pod_metrics_resource());

        match metrics.get(pod_name).await {
            Ok(object) => Ok(usage_from_pod_metrics(&object.data)),
            Err(kube::Error::Api(response)) => {
                classify_metrics_status(response.code, &response.message, pod_name)
            }
            Err(e) => Err(ConnectorError::Metrics(e.to_string())),
        }
    }
}

fn decode_pod(pod: &Pod) -> Result<RawPod, serde_json::Error> {
    serde_json::to_value(pod).and_then(serde_json::from_value)
}

/// `metrics.k8s.io/v1beta1` PodMetrics, served under the `pods` plural
fn pod_metrics_resource() -> ApiResource {
    let gvk = GroupVersionKind::gvk("metrics.k8s.io", "v1beta1", "PodMetrics");
    ApiResource::from_gvk_with_plural(&gvk, "pods")
}

#[derive(Debug, Deserialize)]
struct PodMetricsBody {
    #[serde(default)]
    containers: Vec<ContainerUsage>,
}

#[derive(Debug, Deserialize)]
struct ContainerUsage {
    #[serde(default)]
    usage: BTreeMap<String, Quantity>,
}

/// Usage of the first container listed in a PodMetrics object, if any
fn usage_from_pod_metrics(data: &serde_json::Value) -> Option<UsageSample> {
    let body: PodMetricsBody = serde_json::from_value(data.clone()).ok()?;
    let mut containers = body.containers.into_iter();
    let mut first = containers.next()?;

    Some(UsageSample {
        cpu: first.usage.remove("cpu"),
        memory: first.usage.remove("memory"),
    })
}

/// Map an API error status from the metrics endpoint to an outcome.
///
/// A 404 naming the pod (quoted, as the API server does) means the backend answered without a sample. Any
/// other 404 (API group not served), auth failures and 503 (backend down)
/// mean metrics are unavailable on this instance.
fn classify_metrics_status(
    code: u16,
    message: &str,
    pod_name: &str,
) -> Result<Option<UsageSample>, ConnectorError> {
    match code {
        404 if message.contains(&format!("\"{}\"", pod_name)) => Ok(None),
        401 | 403 | 404 | 503 => Err(ConnectorError::MetricsUnavailable(format!(
            "{} ({})",
            message, code
        ))),
        _ => Err(ConnectorError::Metrics(format!("{} ({})", message, code))),
    }
}

fn describe(error: &kube::Error) -> String {
    match error {
        kube::Error::Api(response) => format!(
            "{} ({}): {}",
            response.reason, response.code, response.message
        ),
        other => other.to_string(),
    }
}
