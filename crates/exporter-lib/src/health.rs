//! Health tracking for the exporter
//!
//! Backs the `/healthz` and `/readyz` probes. Each component records the
//! outcome of its latest operation; the sampler follows the last scrape.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Health status of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    Unhealthy,
}

/// Latest known state of one component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Failures since the last success
    pub consecutive_failures: u32,
    pub last_check_timestamp: i64,
}

impl ComponentHealth {
    fn healthy() -> Self {
        Self {
            status: ComponentStatus::Healthy,
            message: None,
            consecutive_failures: 0,
            last_check_timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub components: HashMap<String, ComponentHealth>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

pub mod components {
    pub const SAMPLER: &str = "sampler";
    pub const REGISTRY: &str = "registry";
}

/// Shared component health, cheap to clone
#[derive(Debug, Clone, Default)]
pub struct HealthRegistry {
    components: Arc<RwLock<HashMap<String, ComponentHealth>>>,
    ready: Arc<RwLock<bool>>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a component as healthy
    pub async fn register(&self, name: &str) {
        self.components
            .write()
            .await
            .insert(name.to_string(), ComponentHealth::healthy());
    }

    pub async fn record_success(&self, name: &str) {
        self.components
            .write()
            .await
            .insert(name.to_string(), ComponentHealth::healthy());
    }

    /// Mark a component unhealthy, keeping count of repeated failures
    pub async fn record_failure(&self, name: &str, message: impl Into<String>) {
        let mut components = self.components.write().await;
        let previous_failures = components
            .get(name)
            .map(|c| c.consecutive_failures)
            .unwrap_or(0);

        components.insert(
            name.to_string(),
            ComponentHealth {
                status: ComponentStatus::Unhealthy,
                message: Some(message.into()),
                consecutive_failures: previous_failures.saturating_add(1),
                last_check_timestamp: chrono::Utc::now().timestamp(),
            },
        );
    }

    pub async fn set_ready(&self, ready: bool) {
        *self.ready.write().await = ready;
    }

    pub async fn health(&self) -> HealthResponse {
        let components = self.components.read().await.clone();
        let status = if components
            .values()
            .any(|c| c.status == ComponentStatus::Unhealthy)
        {
            ComponentStatus::Unhealthy
        } else {
            ComponentStatus::Healthy
        };

        HealthResponse { status, components }
    }

    pub async fn readiness(&self) -> ReadinessResponse {
        if !*self.ready.read().await {
            return ReadinessResponse {
                ready: false,
                reason: Some("Exporter not yet initialized".to_string()),
            };
        }

        match self.health().await.status {
            ComponentStatus::Healthy => ReadinessResponse {
                ready: true,
                reason: None,
            },
            ComponentStatus::Unhealthy => ReadinessResponse {
                ready: false,
                reason: Some("Component unhealthy".to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_registry_is_healthy() {
        let registry = HealthRegistry::new();
        let health = registry.health().await;

        assert_eq!(health.status, ComponentStatus::Healthy);
        assert!(health.components.is_empty());
    }

    #[tokio::test]
    async fn test_registered_component_starts_healthy() {
        let registry = HealthRegistry::new();
        registry.register(components::SAMPLER).await;

        let health = registry.health().await;
        let sampler = &health.components[components::SAMPLER];
        assert_eq!(sampler.status, ComponentStatus::Healthy);
        assert!(sampler.message.is_none());
        assert_eq!(sampler.consecutive_failures, 0);
    }

    #[tokio::test]
    async fn test_failures_accumulate_until_success() {
        let registry = HealthRegistry::new();
        registry.register(components::SAMPLER).await;
        registry.register(components::REGISTRY).await;

        registry
            .record_failure(components::SAMPLER, "disk query failed")
            .await;
        registry
            .record_failure(components::SAMPLER, "cpu query failed")
            .await;

        let health = registry.health().await;
        assert_eq!(health.status, ComponentStatus::Unhealthy);
        let sampler = &health.components[components::SAMPLER];
        assert_eq!(sampler.consecutive_failures, 2);
        assert_eq!(sampler.message.as_deref(), Some("cpu query failed"));

        registry.record_success(components::SAMPLER).await;

        let health = registry.health().await;
        assert_eq!(health.status, ComponentStatus::Healthy);
        assert_eq!(health.components[components::SAMPLER].consecutive_failures, 0);
    }

    #[tokio::test]
    async fn test_readiness_requires_startup_and_health() {
        let registry = HealthRegistry::new();
        registry.register(components::SAMPLER).await;

        let readiness = registry.readiness().await;
        assert!(!readiness.ready);
        assert_eq!(readiness.reason.as_deref(), Some("Exporter not yet initialized"));

        registry.set_ready(true).await;
        assert!(registry.readiness().await.ready);

        registry.record_failure(components::SAMPLER, "failed").await;
        let readiness = registry.readiness().await;
        assert!(!readiness.ready);
        assert_eq!(readiness.reason.as_deref(), Some("Component unhealthy"));
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&ComponentStatus::Unhealthy).unwrap();
        assert_eq!(json, r#""unhealthy""#);
    }
}
