use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::analytics::AnalyticsConfig;
use crate::ledger::StoreConfig;
use crate::policy::PolicyTable;

/// Prefix of environment overrides, e.g. `STOCK_LEDGER__STORE__PATH`.
pub const ENV_PREFIX: &str = "STOCK_LEDGER";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Capacity of each actor's request channel.
    pub buffer_size: usize,
    /// How long a client waits for an actor's reply. Must exceed the store's
    /// lock and commit timeouts combined.
    pub request_timeout_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            buffer_size: 32,
            request_timeout_ms: 15_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Used when `RUST_LOG` is not set.
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub service: ServiceConfig,
    pub analytics: AnalyticsConfig,
    pub policy: PolicyTable,
    pub log: LogConfig,
}

impl AppConfig {
    /// Layers the TOML file at `path` (if given) under `STOCK_LEDGER__*`
    /// environment variables. Every missing key keeps its default.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        let settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service.buffer_size == 0 {
            return Err(ConfigError::Message("service.buffer_size must be positive".to_string()));
        }
        if self.service.request_timeout_ms == 0 {
            return Err(ConfigError::Message(
                "service.request_timeout_ms must be positive".to_string(),
            ));
        }
        if self.store.lock_timeout_ms == 0 || self.store.commit_timeout_ms == 0 {
            return Err(ConfigError::Message("store timeouts must be positive".to_string()));
        }
        let store_budget = self
            .store
            .lock_timeout_ms
            .saturating_add(self.store.commit_timeout_ms);
        if self.service.request_timeout_ms <= store_budget {
            return Err(ConfigError::Message(format!(
                "service.request_timeout_ms ({}) must exceed store lock + commit timeouts ({store_budget})",
                self.service.request_timeout_ms
            )));
        }
        if self.analytics.trend_window_days == 0 || self.analytics.prediction_window_days == 0 {
            return Err(ConfigError::Message(
                "analytics windows must be at least one day".to_string(),
            ));
        }
        Ok(())
    }
}
