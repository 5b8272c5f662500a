// Testing utilities and mock implementations for the domain layer
// This module is only available in tests or when the "mock" feature is enabled

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

pub use crate::notify::push::MockPushNotifier;

use crate::assistant::{AssistantError, TextGenerator};
use crate::health::{overall_status, ComponentStatus, HealthComponent, HealthServiceTrait, SystemHealth};

/// Text generator with a fixed reply that records every prompt it receives
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    reply: Option<String>,
    prompts: Mutex<Vec<(String, String)>>,
}

impl ScriptedGenerator {
    /// Always answers with `reply`
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Always fails, as an unreachable assistant would
    pub fn failing() -> Self {
        Self::default()
    }

    /// `(system_prompt, user_message)` pairs seen so far
    pub fn prompts(&self) -> Vec<(String, String)> {
        self.prompts.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, system_prompt: &str, user_message: &str) -> Result<String, AssistantError> {
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((system_prompt.to_string(), user_message.to_string()));
        self.reply
            .clone()
            .ok_or_else(|| AssistantError::Transport("scripted failure".to_string()))
    }
}

/// Mock implementation of health services for testing system health
#[derive(Debug)]
pub struct MockHealthService {
    database_status: ComponentStatus,
    components: BTreeMap<String, HealthComponent>,
}

impl Default for MockHealthService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHealthService {
    /// Create a new mock health service with all components healthy
    pub fn new() -> Self {
        Self {
            database_status: ComponentStatus::Healthy,
            components: BTreeMap::new(),
        }
    }

    /// Configure the mock with a degraded database
    pub fn with_degraded_database(mut self) -> Self {
        self.database_status = ComponentStatus::Degraded;
        self
    }

    /// Configure the mock with an unhealthy database
    pub fn with_unhealthy_database(mut self) -> Self {
        self.database_status = ComponentStatus::Unhealthy;
        self
    }

    /// Add a custom component with a specific status
    pub fn with_component(mut self, name: &str, status: ComponentStatus, details: &str) -> Self {
        self.components
            .insert(name.to_string(), HealthComponent::with_status(status, details));
        self
    }
}

#[async_trait]
impl HealthServiceTrait for MockHealthService {
    async fn get_system_health(&self) -> SystemHealth {
        let mut components = BTreeMap::new();
        let database = match self.database_status {
            ComponentStatus::Degraded => {
                HealthComponent::with_status(ComponentStatus::Degraded, "Database is experiencing high load")
            }
            ComponentStatus::Unhealthy => {
                HealthComponent::with_status(ComponentStatus::Unhealthy, "Database connection failed")
            }
            status => HealthComponent { status, details: None },
        };
        components.insert("database".to_string(), database);
        components.insert("api".to_string(), HealthComponent::healthy());
        components.extend(self.components.clone());

        SystemHealth {
            status: overall_status(components.values()),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime: 0,
            environment: "test".to_string(),
            components,
        }
    }

    async fn check_database_status(&self) -> Result<bool, String> {
        match self.database_status {
            ComponentStatus::Unhealthy => Err("Database connection failed".to_string()),
            ComponentStatus::Degraded => Ok(false),
            _ => Ok(true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::SystemStatus;

    #[tokio::test]
    async fn test_scripted_generator_records_prompts() {
        let generator = ScriptedGenerator::replying("hello");
        assert_eq!(generator.generate("system", "hi").await.unwrap(), "hello");
        assert_eq!(generator.prompts(), vec![("system".to_string(), "hi".to_string())]);

        assert!(ScriptedGenerator::failing().generate("s", "m").await.is_err());
    }

    #[tokio::test]
    async fn test_mock_health_service_statuses() {
        assert!(MockHealthService::new().get_system_health().await.is_healthy());

        let degraded = MockHealthService::new().with_degraded_database().get_system_health().await;
        assert_eq!(degraded.status, SystemStatus::Degraded);

        let down = MockHealthService::new()
            .with_component("push", ComponentStatus::Unhealthy, "gateway down")
            .get_system_health()
            .await;
        assert_eq!(down.status, SystemStatus::Unhealthy);
        assert!(MockHealthService::new().with_unhealthy_database().check_database_status().await.is_err());
    }
}
