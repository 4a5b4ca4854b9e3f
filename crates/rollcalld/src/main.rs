use anyhow::{Context, Result};
use rollcall_core::{DetectionPipeline, Session};
use rollcall_store::SqliteGateway;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod config;
mod dbus_interface;
mod engine;
mod pipeline;

use config::Config;
use dbus_interface::{AttendanceService, BUS_NAME, OBJECT_PATH};
use pipeline::{CommandPipeline, PrecomputedPipeline};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!("rollcalld starting");

    let config = Config::from_env();
    tracing::info!(
        db = %config.db_path.display(),
        threshold = config.match_threshold,
        policy = config.match_policy.as_str(),
        pipeline = config.pipeline_command.as_deref().unwrap_or("precomputed"),
        "configuration loaded"
    );

    // Fail fast: an unreadable database or corrupt state stops startup.
    let gateway = SqliteGateway::open(&config.db_path)
        .with_context(|| format!("opening {}", config.db_path.display()))?;
    let session = Session::open(gateway, config.session())?;

    let pipeline: Arc<dyn DetectionPipeline> = match &config.pipeline_command {
        Some(command) => Arc::new(CommandPipeline::new(
            command.clone(),
            config.pipeline_timeout,
            tokio::runtime::Handle::current(),
        )),
        None => Arc::new(PrecomputedPipeline),
    };

    let engine = engine::spawn_engine(session, pipeline)?;

    let builder = if config.system_bus {
        zbus::connection::Builder::system()?
    } else {
        zbus::connection::Builder::session()?
    };
    let _connection = builder
        .name(BUS_NAME)?
        .serve_at(OBJECT_PATH, AttendanceService::new(engine, config))?
        .build()
        .await
        .context("registering D-Bus service")?;

    tracing::info!(bus_name = BUS_NAME, path = OBJECT_PATH, "rollcalld ready");

    // Keep running until signaled
    tokio::signal::ctrl_c().await?;
    tracing::info!("rollcalld shutting down");

    Ok(())
}
