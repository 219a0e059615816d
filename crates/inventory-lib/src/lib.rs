//! Pod inventory library
//!
//! This crate provides the core functionality for:
//! - Connecting to many cluster instances with per-instance credentials
//! - Normalizing pod metadata into flat records
//! - Best-effort usage metrics augmentation
//! - Refresh coordination and atomic snapshot publishing
//! - Health checks and observability

pub mod augment;
pub mod cluster;
pub mod coordinator;
pub mod error;
pub mod extract;
pub mod health;
pub mod models;
pub mod observability;
pub mod query;
pub mod scanner;
pub mod store;

#[cfg(test)]
mod tests;

pub use augment::{MetricsAugmenter, UsageOutcome};
pub use cluster::{ClusterConnector, ConnectorFactory, KubeConnectorFactory};
pub use coordinator::{RefreshAck, RefreshCoordinator, RefreshCoordinatorBuilder, RefreshReport};
pub use error::{BuildError, ConnectorError, MappingError};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{InventoryMetrics, StructuredLogger};
pub use query::{FilterChoices, PodFilter};
pub use scanner::{InstanceScan, InstanceScanner, ScannerConfig};
pub use store::{Snapshot, SnapshotStore};
