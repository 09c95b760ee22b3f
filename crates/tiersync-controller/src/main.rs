use std::{env, sync::Arc};

use anyhow::Context;
use tiersync_controller::config::loader::{DEFAULT_CONFIG_PATH, load_config};
use tiersync_controller::{Controller, Reconciler, observability};
use tiersync_core::events::EventBroadcaster;
use tiersync_db_memory::InMemoryStore;
use tiersync_storage::{DynStore, EventedStore};

/// How the configuration path was determined.
#[derive(Debug, Clone, Copy)]
enum ConfigSource {
    /// From --config CLI argument
    CliArgument,
    /// From TIERSYNC_CONFIG environment variable
    EnvironmentVariable,
    /// Default path (tiersync.toml)
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CliArgument => write!(f, "CLI argument (--config)"),
            Self::EnvironmentVariable => write!(f, "environment variable (TIERSYNC_CONFIG)"),
            Self::Default => write!(f, "default"),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound) {
            eprintln!("Warning: Failed to load .env file: {e}");
        }
    }

    observability::init_tracing();

    let (config_path, source) = resolve_config_path();
    let cfg = load_config(Some(&config_path))
        .map_err(anyhow::Error::msg)
        .context("configuration error")?;

    tracing::info!(
        path = %config_path,
        source = %source,
        failure_threshold = cfg.controller.failure_threshold,
        workers = cfg.controller.workers,
        "Configuration loaded"
    );
    observability::apply_logging_level(&cfg.logging.level);

    let broadcaster = EventBroadcaster::new_shared();
    let events = broadcaster.subscribe();
    let store: DynStore = Arc::new(EventedStore::new(InMemoryStore::new(), broadcaster));
    tracing::info!(backend = store.backend_name(), "Object store ready");

    let reconciler = Reconciler::new(store, &cfg.controller);
    let controller = Controller::new(reconciler, cfg.controller.clone());

    controller
        .run(events, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
        })
        .await
        .context("controller failed")?;

    Ok(())
}

fn resolve_config_path() -> (String, ConfigSource) {
    // 1. Check CLI: --config <path>
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            if let Some(path) = args.next() {
                return (path, ConfigSource::CliArgument);
            }
        }
    }

    // 2. Check environment variable
    if let Ok(path) = env::var("TIERSYNC_CONFIG") {
        if !path.is_empty() {
            return (path, ConfigSource::EnvironmentVariable);
        }
    }

    (DEFAULT_CONFIG_PATH.to_string(), ConfigSource::Default)
}
