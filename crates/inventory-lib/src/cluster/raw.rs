//! Lenient pod description as returned by a cluster
//!
//! Every field is optional and timestamps are kept as text, so one odd pod
//! never breaks decoding of the rest of a listing and malformed values reach
//! the extractor, which turns them into sentinels.

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPod {
    #[serde(default)]
    pub metadata: RawMetadata,
    pub spec: Option<RawPodSpec>,
    pub status: Option<RawPodStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMetadata {
    pub name: Option<String>,
    pub namespace: Option<String>,
    pub uid: Option<String>,
    pub creation_timestamp: Option<String>,
    pub labels: Option<BTreeMap<String, String>>,
    pub owner_references: Option<Vec<RawOwnerReference>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawOwnerReference {
    pub kind: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPodSpec {
    pub node_name: Option<String>,
    pub containers: Option<Vec<RawContainer>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawContainer {
    pub name: Option<String>,
    pub image: Option<String>,
    pub resources: Option<RawResources>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawResources {
    pub requests: Option<BTreeMap<String, Quantity>>,
    pub limits: Option<BTreeMap<String, Quantity>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPodStatus {
    pub phase: Option<String>,
    #[serde(rename = "podIP")]
    pub pod_ip: Option<String>,
}

impl RawPod {
    pub fn name(&self) -> Option<&str> {
        self.metadata.name.as_deref()
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.metadata
            .labels
            .as_ref()
            .and_then(|labels| labels.get(key))
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// The first container, which the inventory treats as the primary one
    pub fn primary_container(&self) -> Option<&RawContainer> {
        self.spec
            .as_ref()
            .and_then(|spec| spec.containers.as_ref())
            .and_then(|containers| containers.first())
    }
}

impl RawResources {
    pub fn request(&self, resource: &str) -> Option<&Quantity> {
        self.requests.as_ref().and_then(|r| r.get(resource))
    }

    pub fn limit(&self, resource: &str) -> Option<&Quantity> {
        self.limits.as_ref().and_then(|r| r.get(resource))
    }
}
