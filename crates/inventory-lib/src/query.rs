//! Dashboard filtering over a snapshot

use crate::models::PodRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Optional filters applied to snapshot records. Blank filters match all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PodFilter {
    pub data_center: Option<String>,
    pub namespace: Option<String>,
    pub app_name: Option<String>,
    pub pod_status: Option<String>,
}

impl PodFilter {
    /// Data center, namespace and status match case-insensitively; the
    /// application name matches as a case-insensitive substring.
    pub fn matches(&self, record: &PodRecord) -> bool {
        equals(&self.data_center, record.data_center.as_str())
            && equals(&self.namespace, &record.namespace)
            && equals(&self.pod_status, record.pod_status.as_str())
            && contains(&self.app_name, record.application_name.as_str())
    }

    pub fn apply<'a>(&self, records: &'a [PodRecord]) -> Vec<&'a PodRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }

    pub fn is_empty(&self) -> bool {
        [&self.data_center, &self.namespace, &self.app_name, &self.pod_status]
            .into_iter()
            .all(|f| active(f).is_none())
    }
}

fn active(filter: &Option<String>) -> Option<&str> {
    filter.as_deref().map(str::trim).filter(|f| !f.is_empty())
}

fn equals(filter: &Option<String>, value: &str) -> bool {
    active(filter).map_or(true, |f| f.eq_ignore_ascii_case(value))
}

fn contains(filter: &Option<String>, value: &str) -> bool {
    active(filter).map_or(true, |f| {
        value.to_lowercase().contains(&f.to_lowercase())
    })
}

/// Distinct values offered as filter choices, sorted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterChoices {
    pub data_centers: Vec<String>,
    pub namespaces: Vec<String>,
    pub pod_statuses: Vec<String>,
}

impl FilterChoices {
    pub fn from_records(records: &[PodRecord]) -> Self {
        let mut data_centers = BTreeSet::new();
        let mut namespaces = BTreeSet::new();
        let mut pod_statuses = BTreeSet::new();

        for record in records {
            data_centers.insert(record.data_center.as_str().to_string());
            namespaces.insert(record.namespace.clone());
            pod_statuses.insert(record.pod_status.as_str().to_string());
        }

        Self {
            data_centers: data_centers.into_iter().collect(),
            namespaces: namespaces.into_iter().collect(),
            pod_statuses: pod_statuses.into_iter().collect(),
        }
    }
}
