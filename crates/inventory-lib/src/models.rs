//! Core data models for the pod inventory

use serde::{Serialize, Serializer};
use std::fmt;

/// Rendered text of the sentinel values a [`Field`] can hold
pub mod sentinel {
    pub const NOT_AVAILABLE: &str = "N/A";
    pub const UNKNOWN: &str = "Unknown";
    pub const PARSE_ERROR: &str = "N/A (Parse Error)";
    pub const METRICS_UNAVAILABLE: &str = "N/A (Metrics unavailable)";
    pub const FETCH_ERROR: &str = "N/A (Error)";
}

/// A normalized pod attribute: either a real value or a sentinel saying why
/// the value is missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    /// A value read from the cluster
    Value(String),
    /// The source had no data for this field
    #[default]
    Absent,
    /// The pod status section (or its phase) was missing
    Unknown,
    /// The source value was present but malformed
    ParseError,
    /// The metrics backend is absent or denied access
    MetricsUnavailable,
    /// Fetching the value failed for any other reason
    FetchError,
}

impl Field {
    /// Wrap a value, treating the empty string as absent
    pub fn value(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_empty() {
            Field::Absent
        } else {
            Field::Value(text)
        }
    }

    /// Resolve an optional source value, defaulting to [`Field::Absent`]
    pub fn from_option(text: Option<impl Into<String>>) -> Self {
        text.map(Field::value).unwrap_or(Field::Absent)
    }

    /// The real value, if any
    pub fn as_value(&self) -> Option<&str> {
        match self {
            Field::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_value(&self) -> bool {
        matches!(self, Field::Value(_))
    }

    /// Text shown to consumers: the value itself or the sentinel text
    pub fn as_str(&self) -> &str {
        match self {
            Field::Value(v) => v,
            Field::Absent => sentinel::NOT_AVAILABLE,
            Field::Unknown => sentinel::UNKNOWN,
            Field::ParseError => sentinel::PARSE_ERROR,
            Field::MetricsUnavailable => sentinel::METRICS_UNAVAILABLE,
            Field::FetchError => sentinel::FETCH_ERROR,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PartialEq<str> for Field {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Field {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// How a workload was deployed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeploymentType {
    Helm,
    ManifestOther,
}

impl DeploymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentType::Helm => "Helm",
            DeploymentType::ManifestOther => "Manifest/Other",
        }
    }
}

impl fmt::Display for DeploymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DeploymentType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Normalized metadata for one pod, built once per refresh
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PodRecord {
    pub data_center: Field,
    pub namespace: String,
    pub pod_name: String,
    pub uid: Field,
    pub application_name: Field,
    pub application_version: Field,
    pub deployment_type: DeploymentType,
    pub helm_chart_info: Field,
    pub primary_container_image: Field,
    pub cpu_request: Field,
    pub memory_request: Field,
    pub cpu_limit: Field,
    pub memory_limit: Field,
    pub cpu_usage: Field,
    pub memory_usage: Field,
    pub pod_status: Field,
    #[serde(rename = "podIP")]
    pub pod_ip: Field,
    pub node_name: Field,
    pub creation_timestamp: Field,
}

/// Credentials used to open a session to one cluster instance
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Bearer token
    Token(String),
    /// Username and password
    Basic { username: String, password: String },
    /// No credentials configured
    Anonymous,
}

impl Credentials {
    /// Pick exactly one authentication method: token, else username and
    /// password when both are set, else anonymous. Blank strings count as
    /// absent.
    pub fn resolve(token: Option<&str>, username: Option<&str>, password: Option<&str>) -> Self {
        fn present(s: Option<&str>) -> Option<&str> {
            s.map(str::trim).filter(|s| !s.is_empty())
        }

        if let Some(token) = present(token) {
            return Credentials::Token(token.to_string());
        }

        // Passwords are used verbatim but a whitespace-only one is still absent
        let password = password.filter(|p| !p.trim().is_empty());

        match (present(username), password) {
            (Some(username), Some(password)) => Credentials::Basic {
                username: username.to_string(),
                password: password.to_string(),
            },
            _ => Credentials::Anonymous,
        }
    }

    /// Short name of the authentication method for logging
    pub fn method(&self) -> &'static str {
        match self {
            Credentials::Token(_) => "token",
            Credentials::Basic { .. } => "basic",
            Credentials::Anonymous => "anonymous",
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Token(_) => f.write_str("Token(<redacted>)"),
            Credentials::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Credentials::Anonymous => f.write_str("Anonymous"),
        }
    }
}

/// Connection settings for one cluster instance
#[derive(Debug, Clone)]
pub struct InstanceConfig {
    /// Display name used in logs and faults
    pub name: String,
    /// API server URL
    pub api_url: String,
    pub credentials: Credentials,
    /// Namespaces to scan, in order
    pub namespaces: Vec<String>,
    /// User-defined data center label stamped on every record
    pub data_center: Option<String>,
    /// Skip TLS verification (development clusters only)
    pub insecure_skip_tls_verify: bool,
}

impl InstanceConfig {
    pub fn new(name: impl Into<String>, api_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            api_url: api_url.into(),
            credentials: Credentials::Anonymous,
            namespaces: Vec::new(),
            data_center: None,
            insecure_skip_tls_verify: false,
        }
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_namespaces<I, S>(mut self, namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.namespaces = namespaces.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_data_center(mut self, data_center: impl Into<String>) -> Self {
        self.data_center = Some(data_center.into());
        self
    }
}

/// Where in a scan a fault happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FaultScope {
    Configuration,
    Instance,
    Namespace,
    Pod,
    Metrics,
}

impl FaultScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            FaultScope::Configuration => "configuration",
            FaultScope::Instance => "instance",
            FaultScope::Namespace => "namespace",
            FaultScope::Pod => "pod",
            FaultScope::Metrics => "metrics",
        }
    }
}

impl fmt::Display for FaultScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Non-fatal diagnostic collected during a scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FaultRecord {
    pub scope: FaultScope,
    pub instance: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pod: Option<String>,
    pub cause: String,
}

impl FaultRecord {
    pub fn configuration(instance: impl Into<String>, cause: impl Into<String>) -> Self {
        Self {
            scope: FaultScope::Configuration,
            instance: instance.into(),
            namespace: None,
            pod: None,
            cause: cause.into(),
        }
    }

    pub fn instance(instance: impl Into<String>, cause: impl Into<String>) -> Self {
        Self {
            scope: FaultScope::Instance,
            instance: instance.into(),
            namespace: None,
            pod: None,
            cause: cause.into(),
        }
    }

    pub fn namespace(
        instance: impl Into<String>,
        namespace: impl Into<String>,
        cause: impl Into<String>,
    ) -> Self {
        Self {
            scope: FaultScope::Namespace,
            instance: instance.into(),
            namespace: Some(namespace.into()),
            pod: None,
            cause: cause.into(),
        }
    }

    pub fn pod(
        instance: impl Into<String>,
        namespace: impl Into<String>,
        pod: Option<String>,
        cause: impl Into<String>,
    ) -> Self {
        Self {
            scope: FaultScope::Pod,
            instance: instance.into(),
            namespace: Some(namespace.into()),
            pod,
            cause: cause.into(),
        }
    }

    pub fn metrics(
        instance: impl Into<String>,
        namespace: impl Into<String>,
        pod: impl Into<String>,
        cause: impl Into<String>,
    ) -> Self {
        Self {
            scope: FaultScope::Metrics,
            instance: instance.into(),
            namespace: Some(namespace.into()),
            pod: Some(pod.into()),
            cause: cause.into(),
        }
    }
}
