//! Host metrics exporter library
//!
//! This crate provides:
//! - A persistent application identity
//! - Host sampling (memory, CPU, disk, network) behind a probe trait
//! - The Prometheus registry holding the exported gauges
//! - The HTTP scrape endpoint and health probes

pub mod api;
pub mod health;
pub mod identity;
pub mod metrics;
pub mod models;
pub mod observability;
pub mod sampler;

pub use health::{ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse};
pub use identity::{AppIdentity, IdentityError, IdentityStore};
pub use metrics::HostMetrics;
pub use models::*;
pub use observability::StructuredLogger;
pub use sampler::{Sampler, SampleError, SystemProbe};
