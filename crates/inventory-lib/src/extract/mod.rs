//! Pod metadata extraction
//!
//! Turns a [`RawPod`] into a [`PodRecord`] in one normalization pass. Every
//! optional source field is resolved to a value or a sentinel here, so code
//! downstream never checks for absence again. Usage fields start out
//! [`Field::Absent`] and are filled in by the metrics augmenter.

mod naming;

pub use naming::{strip_owner_suffix, version_from_image};

use crate::cluster::RawPod;
use crate::error::MappingError;
use crate::models::{DeploymentType, Field, PodRecord};
use chrono::{DateTime, Local, SecondsFormat};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use tracing::debug;

pub mod labels {
    pub const APP_NAME: &str = "app.kubernetes.io/name";
    pub const APP: &str = "app";
    pub const APP_VERSION: &str = "app.kubernetes.io/version";
    pub const VERSION: &str = "version";
    pub const MANAGED_BY: &str = "app.kubernetes.io/managed-by";
    pub const HELM_CHART: &str = "helm.sh/chart";
}

/// Map a pod to its normalized record.
///
/// Only fails when the pod's name or namespace is missing.
pub fn map_pod(pod: &RawPod, data_center: Option<&str>) -> Result<PodRecord, MappingError> {
    let pod_name = pod
        .name()
        .filter(|n| !n.is_empty())
        .ok_or(MappingError::MissingName)?
        .to_string();
    let namespace = pod
        .metadata
        .namespace
        .as_deref()
        .filter(|n| !n.is_empty())
        .ok_or_else(|| MappingError::MissingNamespace(pod_name.clone()))?
        .to_string();

    let container = pod.primary_container();
    let image = container.and_then(|c| c.image.as_deref()).filter(|i| !i.is_empty());
    let resources = container.and_then(|c| c.resources.as_ref());
    let (deployment_type, helm_chart_info) = deployment_type(pod);

    let status = pod.status.as_ref();
    let pod_status = status
        .and_then(|s| s.phase.as_deref())
        .filter(|p| !p.is_empty())
        .map(Field::value)
        .unwrap_or(Field::Unknown);

    Ok(PodRecord {
        data_center: Field::from_option(data_center),
        namespace,
        pod_name,
        uid: Field::from_option(pod.metadata.uid.as_deref()),
        application_name: application_name(pod),
        application_version: application_version(pod, image),
        deployment_type,
        helm_chart_info,
        primary_container_image: Field::from_option(image),
        cpu_request: quantity(resources.and_then(|r| r.request("cpu"))),
        memory_request: quantity(resources.and_then(|r| r.request("memory"))),
        cpu_limit: quantity(resources.and_then(|r| r.limit("cpu"))),
        memory_limit: quantity(resources.and_then(|r| r.limit("memory"))),
        cpu_usage: Field::Absent,
        memory_usage: Field::Absent,
        pod_status,
        pod_ip: Field::from_option(status.and_then(|s| s.pod_ip.as_deref())),
        node_name: Field::from_option(pod.spec.as_ref().and_then(|s| s.node_name.as_deref())),
        creation_timestamp: normalize_timestamp(pod.metadata.creation_timestamp.as_deref()),
    })
}

fn application_name(pod: &RawPod) -> Field {
    if let Some(name) = pod.label(labels::APP_NAME).or_else(|| pod.label(labels::APP)) {
        return Field::value(name);
    }

    pod.metadata
        .owner_references
        .as_ref()
        .and_then(|owners| owners.first())
        .and_then(|owner| owner.name.as_deref())
        .filter(|name| !name.is_empty())
        .map(|name| Field::value(strip_owner_suffix(name)))
        .unwrap_or(Field::Absent)
}

fn application_version(pod: &RawPod, image: Option<&str>) -> Field {
    pod.label(labels::APP_VERSION)
        .or_else(|| pod.label(labels::VERSION))
        .or_else(|| image.and_then(version_from_image))
        .map(Field::value)
        .unwrap_or(Field::Absent)
}

fn deployment_type(pod: &RawPod) -> (DeploymentType, Field) {
    let helm_managed = pod
        .label(labels::MANAGED_BY)
        .is_some_and(|manager| manager.eq_ignore_ascii_case("Helm"));

    if helm_managed {
        (
            DeploymentType::Helm,
            Field::from_option(pod.label(labels::HELM_CHART)),
        )
    } else {
        (DeploymentType::ManifestOther, Field::Absent)
    }
}

fn quantity(quantity: Option<&Quantity>) -> Field {
    Field::from_option(quantity.map(|q| q.0.as_str()))
}

/// Reformat an RFC 3339 timestamp as an offset date-time in the local zone
pub fn normalize_timestamp(raw: Option<&str>) -> Field {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Field::Absent;
    };

    match DateTime::parse_from_rfc3339(raw) {
        Ok(timestamp) => Field::Value(
            timestamp
                .with_timezone(&Local)
                .to_rfc3339_opts(SecondsFormat::AutoSi, true),
        ),
        Err(e) => {
            debug!(timestamp = %raw, error = %e, "Could not parse creation timestamp");
            Field::ParseError
        }
    }
}
