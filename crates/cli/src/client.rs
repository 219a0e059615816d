//! API client for the pod inventory service

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    /// Make a GET request with query parameters
    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .context("Failed to send request")?;

        Self::decode(response).await
    }

    /// Make a POST request without a body
    pub async fn post<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .post(url)
            .send()
            .await
            .context("Failed to send request")?;

        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API error ({}): {}", status, body);
        }

        response.json().await.context("Failed to parse response")
    }

    /// Fetch the current snapshot with optional filters
    pub async fn pods(&self, filters: &PodFilters) -> Result<PodsView> {
        self.get("api/pods", &filters.as_query()).await
    }

    pub async fn refresh(&self) -> Result<RefreshResponse> {
        self.post("api/refresh").await
    }
}

/// Filters passed to `/api/pods`
#[derive(Debug, Clone, Default)]
pub struct PodFilters {
    pub data_center: Option<String>,
    pub namespace: Option<String>,
    pub app_name: Option<String>,
    pub pod_status: Option<String>,
}

impl PodFilters {
    fn as_query(&self) -> Vec<(&str, &str)> {
        [
            ("dataCenter", &self.data_center),
            ("namespace", &self.namespace),
            ("appName", &self.app_name),
            ("podStatus", &self.pod_status),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.as_deref().map(|v| (key, v)))
        .collect()
    }
}

// API response types

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pod {
    pub data_center: String,
    pub namespace: String,
    pub pod_name: String,
    pub application_name: String,
    pub application_version: String,
    pub deployment_type: String,
    pub helm_chart_info: String,
    pub primary_container_image: String,
    pub cpu_request: String,
    pub memory_request: String,
    pub cpu_limit: String,
    pub memory_limit: String,
    pub cpu_usage: String,
    pub memory_usage: String,
    pub pod_status: String,
    #[serde(rename = "podIP")]
    pub pod_ip: String,
    pub node_name: String,
    pub creation_timestamp: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterChoices {
    pub data_centers: Vec<String>,
    pub namespaces: Vec<String>,
    pub pod_statuses: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodsView {
    pub generation: u64,
    pub published_at: Option<DateTime<Utc>>,
    pub total: usize,
    pub filter_choices: FilterChoices,
    pub pods: Vec<Pod>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub status: String,
    pub message: String,
}
