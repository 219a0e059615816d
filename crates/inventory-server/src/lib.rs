//! Pod inventory service
//!
//! HTTP API, configuration and the periodic refresh scheduler around
//! `inventory-lib`.

pub mod api;
pub mod config;
pub mod scheduler;

pub const SERVICE_NAME: &str = "pod-inventory";
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");
