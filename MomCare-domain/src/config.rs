//! Application configuration loaded from the environment

use std::env;
use std::str::FromStr;

use thiserror::Error;
use tracing::{info, warn};

use mom_care_data::database::{DatabaseConfig, DatabaseError};

const DEV_JWT_SECRET: &str = "momcare-development-secret-change-me";
const DEFAULT_ISSUER: &str = "mom-care-api";
const DEFAULT_TOKEN_DAYS: i64 = 30;
const DEFAULT_ASSISTANT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Token signing settings
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub issuer: String,
    pub token_ttl_days: i64,
}

/// Push gateway settings; absent when push is disabled
#[derive(Debug, Clone)]
pub struct PushConfig {
    pub gateway_url: String,
    pub server_key: Option<String>,
}

/// Text generation endpoint; absent when the assistant uses canned replies
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub app_env: String,
    pub auth: AuthConfig,
    pub database: DatabaseConfig,
    pub push: Option<PushConfig>,
    pub assistant: Option<AssistantConfig>,
    /// Empty means any origin
    pub cors_origins: Vec<String>,
    pub simulation_enabled: bool,
}

fn non_empty(name: &str) -> Option<String> {
    env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parsed<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match non_empty(name) {
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

fn parse_bool(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    match non_empty(name).map(|v| v.to_lowercase()) {
        None => Ok(default),
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => Ok(true),
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => Ok(false),
        Some(value) => Err(ConfigError::Invalid { name, value }),
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let app_env = non_empty("APP_ENV").unwrap_or_else(|| "development".to_string());
        let development = app_env == "development";

        let jwt_secret = match non_empty("JWT_SECRET") {
            Some(secret) => secret,
            None if development => {
                warn!("JWT_SECRET not set, using the development secret");
                DEV_JWT_SECRET.to_string()
            }
            None => return Err(ConfigError::Missing("JWT_SECRET")),
        };

        let token_ttl_days = parsed("TOKEN_EXPIRATION_DAYS", DEFAULT_TOKEN_DAYS)?;
        if token_ttl_days <= 0 {
            return Err(ConfigError::Invalid {
                name: "TOKEN_EXPIRATION_DAYS",
                value: token_ttl_days.to_string(),
            });
        }

        let push = non_empty("PUSH_GATEWAY_URL").map(|gateway_url| PushConfig {
            gateway_url,
            server_key: non_empty("PUSH_SERVER_KEY"),
        });
        if push.is_none() {
            info!("PUSH_GATEWAY_URL not set, push notifications disabled");
        }

        let assistant = non_empty("ASSISTANT_API_URL").map(|api_url| AssistantConfig {
            api_url,
            api_key: non_empty("ASSISTANT_API_KEY"),
            model: non_empty("ASSISTANT_MODEL").unwrap_or_else(|| DEFAULT_ASSISTANT_MODEL.to_string()),
        });
        if assistant.is_none() {
            info!("ASSISTANT_API_URL not set, chat uses rule-based replies");
        }

        let cors_origins = non_empty("CORS_ALLOWED_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            host: non_empty("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parsed("PORT", 5000)?,
            auth: AuthConfig {
                jwt_secret,
                issuer: non_empty("JWT_ISSUER").unwrap_or_else(|| DEFAULT_ISSUER.to_string()),
                token_ttl_days,
            },
            database: DatabaseConfig::from_env()?,
            push,
            assistant,
            cors_origins,
            simulation_enabled: parse_bool("ENABLE_SIMULATION", development)?,
            app_env,
        })
    }

    /// In-memory configuration for tests and local tooling
    pub fn for_testing() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            app_env: "test".to_string(),
            auth: AuthConfig {
                jwt_secret: "test_secret_key_for_testing_only".to_string(),
                issuer: DEFAULT_ISSUER.to_string(),
                token_ttl_days: DEFAULT_TOKEN_DAYS,
            },
            database: DatabaseConfig::in_memory(),
            push: None,
            assistant: None,
            cors_origins: Vec::new(),
            simulation_enabled: true,
        }
    }

    pub fn is_development(&self) -> bool {
        self.app_env == "development"
    }
}
