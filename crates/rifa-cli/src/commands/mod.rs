pub mod approve;
pub mod cancel;
pub mod close;
pub mod create;
pub mod draw;
pub mod init;
pub mod sell;
pub mod status;
pub mod watch;

use std::path::Path;

use anyhow::Context;
use chrono::Utc;
use rifa_core::{EngineConfig, RaffleId};
use rifa_engine::Engine;
use rifa_store::RaffleStore;
use tracing_subscriber::EnvFilter;

/// A loaded engine with its backing store.
pub struct Workspace {
    pub config: EngineConfig,
    pub store: RaffleStore,
    pub engine: Engine,
}

/// Read the configuration file.
pub fn load_config(config_path: &str) -> anyhow::Result<EngineConfig> {
    let raw = std::fs::read_to_string(config_path)
        .with_context(|| format!("could not read config at {config_path}; run `rifa init`"))?;
    let config: EngineConfig = toml::from_str(&raw).context("invalid configuration")?;
    Ok(config)
}

/// Initialize tracing from the configured log level. `RUST_LOG` wins when
/// set.
pub fn init_tracing(config: &EngineConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Load the engine from the store, sweeping any reservation that expired
/// since the last invocation.
pub fn open(config_path: &str) -> anyhow::Result<Workspace> {
    let config = load_config(config_path)?;
    init_tracing(&config);

    let store = RaffleStore::open(Path::new(&config.data_dir))?;
    let snapshot = store.load_snapshot()?;
    let engine = Engine::from_snapshot(&config, snapshot);

    let swept = engine.orchestrator.sweep_expired(Utc::now());
    if swept > 0 {
        tracing::info!(swept, "expired purchases swept on startup");
    }

    Ok(Workspace {
        config,
        store,
        engine,
    })
}

/// Persist the current engine state back to the store.
pub fn persist(workspace: &Workspace) -> anyhow::Result<()> {
    workspace
        .store
        .save_snapshot(&workspace.engine.snapshot())
        .context("could not persist engine state")?;
    Ok(())
}

/// Resolve a raffle from either a UUID or a slug.
pub fn resolve_raffle(workspace: &Workspace, reference: &str) -> anyhow::Result<RaffleId> {
    if let Ok(uuid) = uuid::Uuid::parse_str(reference) {
        let id = RaffleId::from_uuid(uuid);
        workspace.engine.catalog.get(id)?;
        return Ok(id);
    }
    workspace
        .engine
        .catalog
        .get_by_slug(reference)
        .map(|raffle| raffle.id)
        .with_context(|| format!("no raffle with id or slug '{reference}'"))
}
