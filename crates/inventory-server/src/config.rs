//! Service configuration
//!
//! Read from an optional YAML file overlaid by `INVENTORY_*` environment
//! variables (nested keys separated by `__`).

use anyhow::{bail, Context, Result};
use inventory_lib::{Credentials, InstanceConfig, ScannerConfig};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming the config file
pub const CONFIG_PATH_VAR: &str = "INVENTORY_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/inventory.yaml";

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Port for the dashboard API, health and metrics
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,

    /// Run a refresh as soon as the service starts
    #[serde(default = "default_true")]
    pub refresh_on_startup: bool,

    #[serde(default = "default_max_concurrent_instances")]
    pub max_concurrent_instances: usize,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_list_timeout")]
    pub list_timeout_secs: u64,

    #[serde(default = "default_metrics_timeout")]
    pub metrics_timeout_secs: u64,

    #[serde(default)]
    pub instances: Vec<InstanceSettings>,
}

/// One cluster instance as written in the config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InstanceSettings {
    /// Display name; the URL is used when unset
    pub name: Option<String>,
    pub url: String,
    pub token: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(default)]
    pub namespaces: Vec<String>,
    pub data_center: Option<String>,
    #[serde(default)]
    pub insecure_skip_tls_verify: bool,
}

fn default_listen_port() -> u16 {
    8080
}

fn default_refresh_interval() -> u64 {
    30 * 60
}

fn default_true() -> bool {
    true
}

fn default_max_concurrent_instances() -> usize {
    4
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_list_timeout() -> u64 {
    30
}

fn default_metrics_timeout() -> u64 {
    5
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_port: default_listen_port(),
            refresh_interval_secs: default_refresh_interval(),
            refresh_on_startup: true,
            max_concurrent_instances: default_max_concurrent_instances(),
            connect_timeout_secs: default_connect_timeout(),
            list_timeout_secs: default_list_timeout(),
            metrics_timeout_secs: default_metrics_timeout(),
            instances: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from the file named by `INVENTORY_CONFIG` (or the
    /// default path, if present) and the environment
    pub fn load() -> Result<Self> {
        match std::env::var_os(CONFIG_PATH_VAR) {
            Some(path) => Self::load_from(&PathBuf::from(path), true),
            None => Self::load_from(Path::new(DEFAULT_CONFIG_PATH), false),
        }
    }

    pub fn load_from(path: &Path, required: bool) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::from(path).required(required))
            .add_source(
                config::Environment::with_prefix("INVENTORY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("failed to read configuration from {}", path.display()))?;

        let config: ServerConfig = config
            .try_deserialize()
            .context("invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.refresh_interval_secs == 0 {
            bail!("refresh_interval_secs must be greater than zero");
        }
        if self.max_concurrent_instances == 0 {
            bail!("max_concurrent_instances must be greater than zero");
        }

        let mut names = HashSet::new();
        for (index, instance) in self.instances.iter().enumerate() {
            if instance.url.trim().is_empty() {
                bail!("instance #{} has no url", index + 1);
            }
            let name = instance.display_name();
            if !names.insert(name) {
                bail!("instance name {} is used more than once", name);
            }
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn scanner_config(&self) -> ScannerConfig {
        ScannerConfig {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            list_timeout: Duration::from_secs(self.list_timeout_secs),
            metrics_timeout: Duration::from_secs(self.metrics_timeout_secs),
            ..ScannerConfig::default()
        }
    }

    /// Instances in configured order, with credentials resolved
    pub fn instance_configs(&self) -> Vec<InstanceConfig> {
        self.instances.iter().map(InstanceSettings::to_instance).collect()
    }
}

impl InstanceSettings {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| self.url.trim())
    }

    pub fn to_instance(&self) -> InstanceConfig {
        let credentials = Credentials::resolve(
            self.token.as_deref(),
            self.username.as_deref(),
            self.password.as_deref(),
        );

        let mut instance = InstanceConfig::new(self.display_name(), self.url.trim())
            .with_credentials(credentials)
            .with_namespaces(self.namespaces.iter().map(String::as_str));
        if let Some(dc) = self.data_center.as_deref().filter(|dc| !dc.trim().is_empty()) {
            instance = instance.with_data_center(dc.trim());
        }
        instance.insecure_skip_tls_verify = self.insecure_skip_tls_verify;
        instance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.listen_port, 8080);
        assert_eq!(config.refresh_interval(), Duration::from_secs(1800));
        assert_eq!(config.max_concurrent_instances, 4);
        assert!(config.refresh_on_startup);
        assert!(config.instances.is_empty());

        let scanner = config.scanner_config();
        assert_eq!(scanner.connect_timeout, Duration::from_secs(10));
        assert_eq!(scanner.list_timeout, Duration::from_secs(30));
        assert_eq!(scanner.metrics_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_load_yaml_file() {
        let file = write_config(
            r#"
listen_port: 9000
refresh_interval_secs: 600
instances:
  - name: east
    url: https://east.example.com:6443
    token: abc
    username: admin
    password: secret
    namespaces: [payments, search]
    data_center: dc-east
  - url: https://lab.example.com:6443
    namespaces: [default]
    insecure_skip_tls_verify: true
"#,
        );

        let config = ServerConfig::load_from(file.path(), true).unwrap();
        assert_eq!(config.listen_port, 9000);
        assert_eq!(config.refresh_interval_secs, 600);
        assert_eq!(config.metrics_timeout_secs, 5);

        let instances = config.instance_configs();
        assert_eq!(instances.len(), 2);
        assert_eq!(instances[0].name, "east");
        assert_eq!(instances[0].credentials, Credentials::Token("abc".to_string()));
        assert_eq!(instances[0].namespaces, ["payments", "search"]);
        assert_eq!(instances[0].data_center.as_deref(), Some("dc-east"));

        assert_eq!(instances[1].name, "https://lab.example.com:6443");
        assert_eq!(instances[1].credentials, Credentials::Anonymous);
        assert!(instances[1].insecure_skip_tls_verify);
        assert!(instances[1].data_center.is_none());
    }

    #[test]
    fn test_missing_optional_file_uses_defaults() {
        let config =
            ServerConfig::load_from(Path::new("/nonexistent/inventory.yaml"), false).unwrap();
        assert!(config.instances.is_empty());
    }

    #[test]
    fn test_missing_required_file_fails() {
        let result = ServerConfig::load_from(Path::new("/nonexistent/inventory.yaml"), true);
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_errors() {
        let zero_interval = write_config("refresh_interval_secs: 0\n");
        let err = ServerConfig::load_from(zero_interval.path(), true).unwrap_err();
        assert!(err.to_string().contains("refresh_interval_secs"));

        let no_url = write_config("instances:\n  - name: east\n    url: \"\"\n");
        let err = ServerConfig::load_from(no_url.path(), true).unwrap_err();
        assert!(err.to_string().contains("no url"));

        let duplicate = write_config(
            "instances:\n  - name: a\n    url: https://a\n  - name: a\n    url: https://b\n",
        );
        assert!(ServerConfig::load_from(duplicate.path(), true).is_err());
    }

    #[test]
    fn test_basic_credentials_resolved() {
        let settings = InstanceSettings {
            name: Some("west".to_string()),
            url: "https://west:6443".to_string(),
            token: Some("   ".to_string()),
            username: Some("admin".to_string()),
            password: Some("pw".to_string()),
            ..Default::default()
        };

        let instance = settings.to_instance();
        assert_eq!(instance.credentials.method(), "basic");
    }
}
