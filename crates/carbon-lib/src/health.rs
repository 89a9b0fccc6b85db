//! Health check infrastructure
//!
//! Tracks the state of the session components so the service can report
//! liveness and readiness.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::session::Session;

/// Health status of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    /// Operational but unable to give useful answers for some queries
    Degraded,
    Unhealthy,
}

impl ComponentStatus {
    pub fn is_operational(&self) -> bool {
        matches!(self, ComponentStatus::Healthy | ComponentStatus::Degraded)
    }
}

/// Information about a component's health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub last_check_timestamp: i64,
}

impl ComponentHealth {
    pub fn healthy() -> Self {
        Self::with_status(ComponentStatus::Healthy, None)
    }

    pub fn degraded(message: impl Into<String>) -> Self {
        Self::with_status(ComponentStatus::Degraded, Some(message.into()))
    }

    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self::with_status(ComponentStatus::Unhealthy, Some(message.into()))
    }

    fn with_status(status: ComponentStatus, message: Option<String>) -> Self {
        Self {
            status,
            message,
            last_check_timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// Overall health response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub components: HashMap<String, ComponentHealth>,
}

impl HealthResponse {
    /// Worst status across components
    pub fn compute_status(components: &HashMap<String, ComponentHealth>) -> ComponentStatus {
        let mut has_degraded = false;

        for health in components.values() {
            match health.status {
                ComponentStatus::Unhealthy => return ComponentStatus::Unhealthy,
                ComponentStatus::Degraded => has_degraded = true,
                ComponentStatus::Healthy => {}
            }
        }

        if has_degraded {
            ComponentStatus::Degraded
        } else {
            ComponentStatus::Healthy
        }
    }
}

/// Readiness response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Component names for health tracking
pub mod components {
    pub const DATASET: &str = "dataset";
    pub const DISTANCE_INDEX: &str = "distance_index";
}

/// Registry of component health, shared between handlers
#[derive(Debug, Clone)]
pub struct HealthRegistry {
    components: Arc<RwLock<HashMap<String, ComponentHealth>>>,
    ready: Arc<RwLock<bool>>,
}

impl Default for HealthRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self {
            components: Arc::new(RwLock::new(HashMap::new())),
            ready: Arc::new(RwLock::new(false)),
        }
    }

    /// Register a component that has not been checked yet
    pub async fn register(&self, name: &str) {
        self.update(name, ComponentHealth::unhealthy("Not initialized"))
            .await;
    }

    pub async fn update(&self, name: &str, health: ComponentHealth) {
        let mut components = self.components.write().await;
        components.insert(name.to_string(), health);
    }

    /// Derive component health from a built session and mark the service ready
    pub async fn assess_session(&self, session: &Session) {
        let dataset = session.dataset();
        let dataset_health = if dataset.records().is_empty() {
            ComponentHealth::unhealthy("Dataset has no emission records")
        } else {
            ComponentHealth::healthy()
        };

        let index = session.index();
        let index_health = match index.len() {
            0 => ComponentHealth::unhealthy("Distance index is empty"),
            1 => ComponentHealth::degraded("Only one datacenter indexed, no alternatives possible"),
            _ => ComponentHealth::healthy(),
        };

        self.update(components::DATASET, dataset_health).await;
        self.update(components::DISTANCE_INDEX, index_health).await;
        self.set_ready(true).await;
    }

    pub async fn set_ready(&self, ready: bool) {
        let mut r = self.ready.write().await;
        *r = ready;
    }

    pub async fn health(&self) -> HealthResponse {
        let components = self.components.read().await.clone();
        let status = HealthResponse::compute_status(&components);
        HealthResponse { status, components }
    }

    pub async fn readiness(&self) -> ReadinessResponse {
        let ready = *self.ready.read().await;
        let health = self.health().await;

        if !ready {
            ReadinessResponse {
                ready: false,
                reason: Some("Session not yet built".to_string()),
            }
        } else if !health.status.is_operational() {
            ReadinessResponse {
                ready: false,
                reason: Some("Critical component unhealthy".to_string()),
            }
        } else {
            ReadinessResponse {
                ready: true,
                reason: None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use crate::distance::DistanceModel;
    use crate::models::{DatacenterLocation, EmissionsRecord};

    fn session(ids: &[&str]) -> Session {
        let locations = ids
            .iter()
            .enumerate()
            .map(|(i, id)| DatacenterLocation::new(*id, 0.0, i as f64))
            .collect();
        let records = ids
            .iter()
            .map(|id| EmissionsRecord {
                datacenter: id.to_string(),
                activity_type: "cpu".to_string(),
                activity_subtype: "std".to_string(),
                co2e: 1.0,
            })
            .collect();
        let dataset = Dataset::new(locations, records).unwrap();
        Session::build(dataset, DistanceModel::default(), "test")
    }

    #[tokio::test]
    async fn test_health_registry_initial_state() {
        let registry = HealthRegistry::new();
        let health = registry.health().await;

        assert_eq!(health.status, ComponentStatus::Healthy);
        assert!(health.components.is_empty());
    }

    #[tokio::test]
    async fn test_registered_components_start_unhealthy() {
        let registry = HealthRegistry::new();
        registry.register(components::DATASET).await;

        let health = registry.health().await;
        assert_eq!(health.status, ComponentStatus::Unhealthy);
        assert!(health.components.contains_key(components::DATASET));
    }

    #[tokio::test]
    async fn test_readiness_not_ready_initially() {
        let registry = HealthRegistry::new();
        let readiness = registry.readiness().await;

        assert!(!readiness.ready);
        assert!(readiness.reason.is_some());
    }

    #[tokio::test]
    async fn test_assess_healthy_session() {
        let registry = HealthRegistry::new();
        registry.register(components::DATASET).await;
        registry.register(components::DISTANCE_INDEX).await;

        registry.assess_session(&session(&["a", "b", "c"])).await;

        let health = registry.health().await;
        assert_eq!(health.status, ComponentStatus::Healthy);
        assert!(registry.readiness().await.ready);
    }

    #[tokio::test]
    async fn test_single_datacenter_is_degraded_but_ready() {
        let registry = HealthRegistry::new();
        registry.assess_session(&session(&["solo"])).await;

        let health = registry.health().await;
        assert_eq!(health.status, ComponentStatus::Degraded);
        assert_eq!(
            health.components[components::DISTANCE_INDEX].status,
            ComponentStatus::Degraded
        );
        assert!(registry.readiness().await.ready);
    }

    #[tokio::test]
    async fn test_readiness_not_ready_when_unhealthy() {
        let registry = HealthRegistry::new();
        registry.set_ready(true).await;
        registry
            .update(components::DATASET, ComponentHealth::unhealthy("Failed"))
            .await;

        let readiness = registry.readiness().await;
        assert!(!readiness.ready);
    }
}
