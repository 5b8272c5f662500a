//! Shared application state

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use mom_care_data::database::{DatabaseError, DatabasePool};
use mom_care_data::repository::Repositories;
use mom_care_domain::assistant::{HttpTextGenerator, TextGenerator};
use mom_care_domain::config::AppConfig;
use mom_care_domain::health::{HealthService, HealthServiceTrait};
use mom_care_domain::notify::{DisabledPushNotifier, HttpPushNotifier, PushNotifier, RealtimeHub};
use mom_care_domain::services::Services;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Database setup failed: {0}")]
    Database(#[from] DatabaseError),
}

/// Everything the handlers need, cloned into each request
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    pub health: Arc<dyn HealthServiceTrait>,
    pub hub: RealtimeHub,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Open the configured database and wire the services
    pub fn from_config(config: AppConfig) -> Result<Self, StartupError> {
        let pool = DatabasePool::initialize(&config.database)?;
        info!("Database ready: {}", pool.connection_info());
        Ok(Self::with_pool(config, pool))
    }

    /// Wire the services over an existing pool
    pub fn with_pool(config: AppConfig, pool: DatabasePool) -> Self {
        let push: Arc<dyn PushNotifier> = match &config.push {
            Some(push) => Arc::new(HttpPushNotifier::new(push)),
            None => {
                info!("PUSH_GATEWAY_URL not set; push notifications disabled");
                Arc::new(DisabledPushNotifier)
            }
        };
        let generator = config.assistant.as_ref().map(|assistant| {
            info!("Assistant replies via {} ({})", assistant.api_url, assistant.model);
            Arc::new(HttpTextGenerator::new(assistant)) as Arc<dyn TextGenerator>
        });
        Self::with_parts(config, pool, push, generator)
    }

    /// Wire the services with explicit outbound seams
    pub fn with_parts(
        config: AppConfig,
        pool: DatabasePool,
        push: Arc<dyn PushNotifier>,
        generator: Option<Arc<dyn TextGenerator>>,
    ) -> Self {
        let hub = RealtimeHub::default();
        let health = Arc::new(HealthService::new(
            pool.clone(),
            &config.app_env,
            push.is_enabled(),
            generator.is_some(),
        ));
        let services = Services::new(
            Repositories::sqlite(pool),
            config.auth.clone(),
            hub.clone(),
            push,
            generator,
            config.simulation_enabled,
        );

        Self {
            services,
            health,
            hub,
            config: Arc::new(config),
        }
    }

    /// Replace the health service, e.g. with a mock
    pub fn with_health(mut self, health: Arc<dyn HealthServiceTrait>) -> Self {
        self.health = health;
        self
    }
}
