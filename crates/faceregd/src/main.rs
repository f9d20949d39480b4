use anyhow::{Context, Result};
use facereg_core::Session;
use facereg_store::SqliteRegistry;
use tracing_subscriber::EnvFilter;

mod config;
mod dbus_interface;
mod engine;

use dbus_interface::{FaceRegService, BUS_NAME, OBJECT_PATH};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!("faceregd starting");

    let config = config::Config::load().context("loading configuration")?;
    let target = config.target_region();
    tracing::info!(
        viewport_width = config.viewport_width,
        viewport_height = config.viewport_height,
        tolerance = config.tolerance,
        db = %config.db_path.display(),
        ?target,
        "configuration loaded"
    );

    let registry = SqliteRegistry::open(&config.db_path)
        .with_context(|| format!("opening registry at {}", config.db_path.display()))?;
    let session = Session::new(target, registry).with_tolerance(config.tolerance);
    let engine = engine::spawn_engine(session)?;

    let service = FaceRegService::new(engine, target, config.tolerance);
    let _conn = zbus::connection::Builder::session()?
        .name(BUS_NAME)?
        .serve_at(OBJECT_PATH, service)?
        .build()
        .await
        .context("registering on the session bus")?;

    tracing::info!(bus = BUS_NAME, path = OBJECT_PATH, "faceregd ready");

    tokio::signal::ctrl_c().await?;
    tracing::info!("faceregd shutting down");

    Ok(())
}
