use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use drive_sim::config::{Config, DataProvider};
use drive_sim::engine::DriveMachine;
use drive_sim::feed::backend::StrategyBackend;
use drive_sim::feed::snapshot::SnapshotStore;
use drive_sim::feed::supabase::SupabaseStore;
use drive_sim::feed::PlayData;
use drive_sim::server::{self, AppState};
use tracing_subscriber::EnvFilter;

fn build_store(config: &Config) -> Result<Arc<dyn PlayData>> {
    match config.data_store.provider {
        DataProvider::Supabase => {
            let url = config.supabase_url()?;
            let key = Config::supabase_key()?;
            let timeout = std::time::Duration::from_millis(config.data_store.request_timeout_ms);
            let store = SupabaseStore::new(&url, key, timeout).context("Failed to build Supabase client")?;
            tracing::info!(url = %url, "using Supabase play data");
            Ok(Arc::new(store))
        }
        DataProvider::Snapshot => {
            let path = config
                .data_store
                .snapshot_path
                .as_deref()
                .context("data_store.snapshot_path is required for the snapshot provider")?;
            Ok(Arc::new(SnapshotStore::load(path)?))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("drive_sim=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::load(Path::new("config.toml"))?;

    // Real env vars take precedence over .env
    Config::load_env_file();

    let data = build_store(&config)?;
    let backend = Arc::new(StrategyBackend::new(
        &config.backend_url(),
        config.backend.predict_timeout(),
        config.backend.simulate_timeout(),
    )?);
    let machine = Arc::new(DriveMachine::new(data.clone(), backend.clone(), config.rules.clone()));

    tracing::info!(
        provider = ?config.data_store.provider,
        backend = %config.backend_url(),
        field_goal_mode = ?config.rules.field_goal_mode,
        "starting drive simulator"
    );

    server::serve(&config.server.bind, AppState { machine, data, backend }).await
}
