//! Configuration Loader
//!
//! Environment-aware configuration loading on top of the `config` crate.
//! Sources are layered: defaults, then a TOML file, then `AHJO_SYNC__*`
//! environment variables (`AHJO_SYNC__AUTH__CLIENT_ID` sets `auth.client_id`).

use super::error::{ConfigResult, ConfigurationError};
use super::AhjoSyncConfig;
use config::{Config, Environment, File, FileFormat};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const CONFIG_PATH_VAR: &str = "AHJO_SYNC_CONFIG_PATH";
const ENV_PREFIX: &str = "AHJO_SYNC";
const ENV_SEPARATOR: &str = "__";
const DEFAULT_CONFIG_PATH: &str = "config/ahjo-sync.toml";

pub struct ConfigManager {
    config: AhjoSyncConfig,
    source_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration from `AHJO_SYNC_CONFIG_PATH` (required when set)
    /// or `config/ahjo-sync.toml` (optional).
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        match env::var(CONFIG_PATH_VAR) {
            Ok(path) => Self::load_from_file(path),
            Err(_) => Self::load_layered(Some(Path::new(DEFAULT_CONFIG_PATH)), false, None),
        }
    }

    /// Load configuration from a file that must exist
    pub fn load_from_file(path: impl AsRef<Path>) -> ConfigResult<Arc<ConfigManager>> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ConfigurationError::config_file_not_found(path));
        }
        Self::load_layered(Some(path), true, None)
    }

    /// Load with an explicit environment-variable map instead of the process
    /// environment. Useful for tests.
    pub fn load_with_overrides(
        path: Option<&Path>,
        overrides: config::Map<String, String>,
    ) -> ConfigResult<Arc<ConfigManager>> {
        Self::load_layered(path, false, Some(overrides))
    }

    fn load_layered(
        path: Option<&Path>,
        required: bool,
        env_overrides: Option<config::Map<String, String>>,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let defaults = AhjoSyncConfig {
            environment: Self::detect_environment(),
            ..AhjoSyncConfig::default()
        };

        let mut builder = Config::builder().add_source(
            Config::try_from(&defaults)
                .map_err(|e| ConfigurationError::load_error("defaults", e))?,
        );

        let source_path = path.filter(|p| required || p.is_file()).map(Path::to_path_buf);
        if let Some(file) = &source_path {
            debug!("Loading configuration file: {}", file.display());
            builder = builder.add_source(
                File::from(file.as_path())
                    .format(FileFormat::Toml)
                    .required(required),
            );
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator(ENV_SEPARATOR)
                .separator(ENV_SEPARATOR)
                .try_parsing(true)
                .source(env_overrides),
        );

        let source_name = source_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "environment".to_string());

        let config: AhjoSyncConfig = builder
            .build()
            .and_then(Config::try_deserialize)
            .map_err(|e| ConfigurationError::load_error(source_name, e))?;

        config.validate()?;

        info!(
            environment = %config.environment,
            base_url = %config.api.base_url,
            auth_configured = config.auth.is_complete(),
            partial = config.source.partial,
            "🔧 Configuration loaded"
        );

        Ok(Arc::new(ConfigManager {
            config,
            source_path,
        }))
    }

    pub fn config(&self) -> &AhjoSyncConfig {
        &self.config
    }

    pub fn environment(&self) -> &str {
        &self.config.environment
    }

    /// File the configuration was read from, if any
    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    /// Detect the active environment from the process environment
    pub fn detect_environment() -> String {
        env::var("AHJO_SYNC_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
    }
}
