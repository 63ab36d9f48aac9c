//! # Ahjo Sync Configuration
//!
//! Layered configuration for the synchronization pipeline. Values come from
//! built-in defaults, then an optional TOML file, then `AHJO_SYNC__*`
//! environment variables (see [`ConfigManager`]).
//!
//! ```toml
//! environment = "production"
//!
//! [auth]
//! auth_url = "https://login.example.fi/oauth/authorize"
//! token_url = "https://login.example.fi/oauth/token"
//! callback_url = "https://paatokset.example.fi/ahjo-api/login"
//! client_id = "..."
//! client_secret = "..."
//! scope = "openid"
//!
//! [api]
//! base_url = "https://ahjo.example.fi/api/v1/"
//! ```

pub mod error;
pub mod loader;

use crate::auth::AuthSettings;
use crate::constants;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AhjoSyncConfig {
    /// Active environment; scopes token store keys and lock names
    pub environment: String,

    /// OAuth2 client settings
    pub auth: AuthSettings,

    /// Ahjo API access
    pub api: ApiConfig,

    /// Token refresh coordination
    pub token: TokenConfig,

    /// Queue retry windows and leases
    pub queues: QueueConfig,

    /// Paginated source iteration
    pub source: SourceConfig,

    /// Upstream health gating
    pub health: HealthConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    pub base_url: String,
    /// Path relative to `base_url` probed by the operational check
    pub health_check_path: Option<String>,
    /// Absent means the transport default applies
    pub request_timeout_seconds: Option<u64>,
    pub cache_ttl_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenConfig {
    pub lock_ttl_seconds: u64,
    pub store_path: String,
    pub lock_dir: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueueConfig {
    pub default_max_retry_hours: i64,
    pub subscriber_max_retry_hours: i64,
    pub lease_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    /// Incremental mode with the unchanged-row early stop
    pub partial: bool,
    pub unchanged_threshold: u32,
    pub limit_pages: Option<u64>,
    pub max_items: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HealthConfig {
    pub circuit_breaker_enabled: bool,
    pub failure_threshold: u32,
    pub cooldown_seconds: u64,
}

impl Default for AhjoSyncConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            auth: AuthSettings::default(),
            api: ApiConfig::default(),
            token: TokenConfig::default(),
            queues: QueueConfig::default(),
            source: SourceConfig::default(),
            health: HealthConfig::default(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/ahjo-proxy/".to_string(),
            health_check_path: None,
            request_timeout_seconds: None,
            cache_ttl_seconds: 300,
        }
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            lock_ttl_seconds: 30,
            store_path: "var/ahjo-sync/tokens.json".to_string(),
            lock_dir: "var/ahjo-sync/locks".to_string(),
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            default_max_retry_hours: constants::DEFAULT_MAX_RETRY_HOURS,
            subscriber_max_retry_hours: constants::SUBSCRIBER_MAX_RETRY_HOURS,
            lease_seconds: 300,
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            partial: false,
            unchanged_threshold: constants::DEFAULT_UNCHANGED_THRESHOLD,
            limit_pages: None,
            max_items: None,
        }
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            circuit_breaker_enabled: false,
            failure_threshold: 3,
            cooldown_seconds: 300,
        }
    }
}

impl AhjoSyncConfig {
    /// Reject values that would break the pipeline at runtime.
    ///
    /// Incomplete `auth` settings are allowed: the token manager reports
    /// itself as unconfigured instead.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.environment.trim().is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "environment",
                "root configuration",
            ));
        }

        Url::parse(&self.api.base_url).map_err(|e| {
            ConfigurationError::invalid_value("api.base_url", &self.api.base_url, e.to_string())
        })?;

        if self.api.request_timeout_seconds == Some(0) {
            return Err(ConfigurationError::invalid_value(
                "api.request_timeout_seconds",
                "0",
                "timeout must be positive when set",
            ));
        }

        if self.token.lock_ttl_seconds == 0 {
            return Err(ConfigurationError::invalid_value(
                "token.lock_ttl_seconds",
                "0",
                "lock TTL must be positive",
            ));
        }

        for (field, hours) in [
            ("queues.default_max_retry_hours", self.queues.default_max_retry_hours),
            ("queues.subscriber_max_retry_hours", self.queues.subscriber_max_retry_hours),
        ] {
            if hours <= 0 {
                return Err(ConfigurationError::invalid_value(
                    field,
                    hours.to_string(),
                    "retry window must be positive",
                ));
            }
        }

        if self.queues.lease_seconds == 0 {
            return Err(ConfigurationError::invalid_value(
                "queues.lease_seconds",
                "0",
                "lease must be positive",
            ));
        }

        if self.source.unchanged_threshold == 0 {
            return Err(ConfigurationError::invalid_value(
                "source.unchanged_threshold",
                "0",
                "threshold must be positive",
            ));
        }

        if self.source.limit_pages == Some(0) {
            return Err(ConfigurationError::invalid_value(
                "source.limit_pages",
                "0",
                "page cap must be positive when set",
            ));
        }

        if self.health.circuit_breaker_enabled && self.health.failure_threshold == 0 {
            return Err(ConfigurationError::invalid_value(
                "health.failure_threshold",
                "0",
                "threshold must be positive when the circuit breaker is enabled",
            ));
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.api.request_timeout_seconds.map(Duration::from_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.api.cache_ttl_seconds)
    }

    pub fn lock_ttl(&self) -> Duration {
        Duration::from_secs(self.token.lock_ttl_seconds)
    }

    pub fn lease(&self) -> Duration {
        Duration::from_secs(self.queues.lease_seconds)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.health.cooldown_seconds)
    }
}
