use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub controller: ControllerSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        // Controller validations
        if self.controller.failure_threshold == 0 {
            return Err("controller.failure_threshold must be > 0".into());
        }
        if self.controller.retry_delay_ms == 0 {
            return Err("controller.retry_delay_ms must be > 0".into());
        }
        if self.controller.workers == 0 {
            return Err("controller.workers must be > 0".into());
        }
        // Logging validation
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        Ok(())
    }
}

/// Settings injected into the reconciler and the worker pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerSettings {
    /// Recorded account update failures after which a request is abandoned.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    /// Delay before retrying a failed account update.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Re-enqueue every request when the change feed drops events.
    #[serde(default = "default_true")]
    pub resync_on_lag: bool,
}

fn default_failure_threshold() -> u32 {
    2
}
fn default_retry_delay_ms() -> u64 {
    5_000
}
fn default_workers() -> usize {
    4
}
fn default_true() -> bool {
    true
}

impl ControllerSettings {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            retry_delay_ms: default_retry_delay_ms(),
            workers: default_workers(),
            resync_on_lag: default_true(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}
fn default_log_level() -> String {
    "info".into()
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::{Path, PathBuf};

    /// Default configuration file, looked up in the working directory.
    pub const DEFAULT_CONFIG_PATH: &str = "tiersync.toml";

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        let pathbuf = PathBuf::from(path.unwrap_or(DEFAULT_CONFIG_PATH));
        if pathbuf.exists() {
            builder = builder.add_source(File::from(pathbuf));
        }
        // Environment variable overrides, e.g., TIERSYNC__CONTROLLER__WORKERS=8
        builder = builder.add_source(
            Environment::with_prefix("TIERSYNC")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }

    pub fn load_config_with_default_path<P: AsRef<Path>>(
        path: Option<P>,
    ) -> Result<AppConfig, String> {
        let p = path
            .as_ref()
            .map(|p| p.as_ref().to_string_lossy().to_string());
        load_config(p.as_deref())
    }
}
