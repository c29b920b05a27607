use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use backend_lib::{
    auth::init_superuser,
    clock::{Clock, SystemClock},
    config::{Settings, DEFAULT_CONFIG_FILE},
    router,
    storage::{FlatFileStore, Store},
    AppState,
};
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Authentication service for the lem API
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load_from(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_level.to_lowercase()));
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .init();

    tracing::info!(?settings, "configuration loaded");

    let store: Arc<dyn Store> = Arc::new(
        FlatFileStore::open(&settings.data_dir)
            .with_context(|| format!("opening store in {}", settings.data_dir.display()))?,
    );
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let outcome = init_superuser(store.as_ref(), settings.superuser.as_ref(), clock.as_ref()).await?;
    tracing::info!(?outcome, "superuser bootstrap finished");

    let bind_addr = settings.bind_addr;
    let state = Arc::new(AppState::new(settings, store, clock)?);
    let app = router::create_router(state);

    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;
    tracing::info!(%bind_addr, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
