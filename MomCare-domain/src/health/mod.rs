//! Domain layer health check functionality
//! This module reports the status of the database and the optional outbound services

use std::collections::BTreeMap;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error};

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

use mom_care_data::database::DatabasePool;

/// System health status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum SystemStatus {
    /// All components are healthy
    Healthy,
    /// Some components are degraded but the system is functional
    Degraded,
    /// System is not functioning properly
    Unhealthy,
}

/// Component health status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    Degraded,
    Unhealthy,
    /// Not configured; does not affect the overall status
    Disabled,
}

/// Represents a health component with status and optional details
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct HealthComponent {
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl HealthComponent {
    pub fn healthy() -> Self {
        Self { status: ComponentStatus::Healthy, details: None }
    }

    pub fn with_status(status: ComponentStatus, details: impl Into<String>) -> Self {
        Self { status, details: Some(details.into()) }
    }

    fn enabled_or_disabled(enabled: bool, disabled_details: &str) -> Self {
        if enabled {
            Self::healthy()
        } else {
            Self::with_status(ComponentStatus::Disabled, disabled_details)
        }
    }
}

/// Represents the overall health of the system
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct SystemHealth {
    pub status: SystemStatus,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    /// Seconds since the service started
    pub uptime: u64,
    pub environment: String,
    pub components: BTreeMap<String, HealthComponent>,
}

impl SystemHealth {
    pub fn is_healthy(&self) -> bool {
        self.status == SystemStatus::Healthy
    }
}

/// Worst status across the components, ignoring disabled ones
pub fn overall_status<'a>(components: impl IntoIterator<Item = &'a HealthComponent>) -> SystemStatus {
    components
        .into_iter()
        .fold(SystemStatus::Healthy, |overall, component| match (overall, component.status) {
            (_, ComponentStatus::Unhealthy) | (SystemStatus::Unhealthy, _) => SystemStatus::Unhealthy,
            (_, ComponentStatus::Degraded) => SystemStatus::Degraded,
            (status, _) => status,
        })
}

/// Trait for health services
#[async_trait]
pub trait HealthServiceTrait: Send + Sync + std::fmt::Debug {
    /// Get the overall system health
    async fn get_system_health(&self) -> SystemHealth;

    /// Check the status of the database
    /// Returns an error if the check could not be performed
    async fn check_database_status(&self) -> Result<bool, String>;
}

/// Health checks against the live pool
#[derive(Debug, Clone)]
pub struct HealthService {
    pool: DatabasePool,
    environment: String,
    push_enabled: bool,
    assistant_configured: bool,
    started_at: Instant,
}

impl HealthService {
    pub fn new(pool: DatabasePool, environment: &str, push_enabled: bool, assistant_configured: bool) -> Self {
        Self {
            pool,
            environment: environment.to_string(),
            push_enabled,
            assistant_configured,
            started_at: Instant::now(),
        }
    }
}

#[async_trait]
impl HealthServiceTrait for HealthService {
    async fn get_system_health(&self) -> SystemHealth {
        let database = match self.check_database_status().await {
            Ok(true) => HealthComponent::with_status(ComponentStatus::Healthy, self.pool.connection_info()),
            Ok(false) => HealthComponent::with_status(ComponentStatus::Degraded, "Database answered unexpectedly"),
            Err(e) => HealthComponent::with_status(ComponentStatus::Unhealthy, e),
        };

        let mut components = BTreeMap::new();
        components.insert("database".to_string(), database);
        components.insert("api".to_string(), HealthComponent::healthy());
        components.insert(
            "push".to_string(),
            HealthComponent::enabled_or_disabled(self.push_enabled, "Push gateway not configured"),
        );
        components.insert(
            "assistant".to_string(),
            HealthComponent::enabled_or_disabled(self.assistant_configured, "Using rule-based replies"),
        );

        SystemHealth {
            status: overall_status(components.values()),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime: self.started_at.elapsed().as_secs(),
            environment: self.environment.clone(),
            components,
        }
    }

    async fn check_database_status(&self) -> Result<bool, String> {
        let pool = self.pool.clone();
        match tokio::task::spawn_blocking(move || pool.check()).await {
            Ok(Ok(())) => {
                debug!("Database health check passed");
                Ok(true)
            }
            Ok(Err(e)) => {
                error!("Database health check failed: {}", e);
                Err(format!("Database connection error: {}", e))
            }
            Err(e) => Err(format!("Database check did not complete: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_system_health() {
        let service = HealthService::new(DatabasePool::in_memory().unwrap(), "test", false, true);
        let health = service.get_system_health().await;

        assert_eq!(health.status, SystemStatus::Healthy);
        assert_eq!(health.environment, "test");
        assert_eq!(health.components["database"].status, ComponentStatus::Healthy);
        assert_eq!(health.components["push"].status, ComponentStatus::Disabled);
        assert_eq!(health.components["assistant"].status, ComponentStatus::Healthy);
        assert_eq!(health.components.len(), 4);
    }

    #[test]
    fn test_overall_status_takes_the_worst_component() {
        let healthy = HealthComponent::healthy();
        let disabled = HealthComponent::with_status(ComponentStatus::Disabled, "off");
        let degraded = HealthComponent::with_status(ComponentStatus::Degraded, "slow");
        let down = HealthComponent::with_status(ComponentStatus::Unhealthy, "down");

        assert_eq!(overall_status([&healthy, &disabled]), SystemStatus::Healthy);
        assert_eq!(overall_status([&healthy, &degraded]), SystemStatus::Degraded);
        assert_eq!(overall_status([&down, &degraded]), SystemStatus::Unhealthy);
        assert_eq!(overall_status([&degraded, &down, &healthy]), SystemStatus::Unhealthy);
    }

    #[test]
    fn test_health_serializes_lowercase_statuses() {
        let component = HealthComponent::with_status(ComponentStatus::Disabled, "off");
        let json = serde_json::to_value(&component).unwrap();
        assert_eq!(json["status"], "disabled");
        assert_eq!(json["details"], "off");
    }
}
