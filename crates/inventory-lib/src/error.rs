//! Error taxonomy for cluster access and pod mapping

use std::time::Duration;

/// Errors raised by a cluster connector
#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    /// The instance is unreachable or rejected the credentials
    #[error("connection failed: {0}")]
    Connection(String),

    /// Listing one namespace failed
    #[error("failed to list pods in namespace {namespace}: {message}")]
    NamespaceQuery { namespace: String, message: String },

    /// The metrics backend is absent or access to it was denied
    #[error("metrics unavailable: {0}")]
    MetricsUnavailable(String),

    /// Any other failure while fetching usage metrics
    #[error("metrics request failed: {0}")]
    Metrics(String),

    /// An operation exceeded its deadline
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },
}

/// A pod could not be turned into a record
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MappingError {
    #[error("pod has no name")]
    MissingName,

    #[error("pod {0} has no namespace")]
    MissingNamespace(String),
}

/// A component builder was missing a required part
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}
