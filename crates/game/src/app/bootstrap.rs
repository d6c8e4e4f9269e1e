use engine::{Engine, Resources, TileGridError};
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::config::{load_config_from_env, ConfigError, DemoConfig};
use super::gameplay::{build_level, LevelHandles};

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to build level: {0}")]
    Level(#[from] TileGridError),
    #[error("{failed} of {requested} resources failed to load")]
    Resources { failed: usize, requested: usize },
}

pub(crate) struct AppWiring {
    pub(crate) config: DemoConfig,
    pub(crate) engine: Engine,
    pub(crate) level: LevelHandles,
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== Scroller Startup ===");

    let config = load_config_from_env()?;
    wire(config)
}

/// Loads resources, binds input and spawns the level for `config`.
pub(crate) fn wire(config: DemoConfig) -> Result<AppWiring, BootstrapError> {
    let mut resources = Resources::new();
    if !config.assets.is_empty() {
        let errors = resources.load_manifest(&config.asset_root, &config.assets);
        if !errors.is_empty() {
            for error in &errors {
                warn!(resource = error.name(), "resource_missing");
            }
            return Err(BootstrapError::Resources {
                failed: errors.len(),
                requested: config.assets.len(),
            });
        }
    }

    let mut engine = Engine::new(config.loop_config.clone()).with_resources(resources);
    engine.input_mut().apply_bindings(&config.bindings);
    let level = build_level(engine.tree_mut())?;

    info!(
        nodes = engine.tree().len(),
        tick_budget = config.tick_budget,
        target_tps = config.loop_config.target_tps,
        "app_wired"
    );
    Ok(AppWiring {
        config,
        engine,
        level,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
