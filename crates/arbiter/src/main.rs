//! Capacity arbiter - node-local controller for co-located offline work
//!
//! Runs next to the batch scheduler's node daemon, clamping and applying
//! the capacity it may advertise for offline workloads.

use anyhow::Result;
use arbiter_lib::adapter::standard_pipeline;
use arbiter_lib::health::components;
use arbiter_lib::{CapacityEngine, FileCheckpoint, HealthRegistry, LogAlarm};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;
mod control_http;
mod disks;

#[tokio::main]
async fn main() -> Result<()> {
    // JSON logs with env-filter overrides
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting capacity-arbiter");

    let config = config::ArbiterConfig::load()?;
    info!(control = %config.control_base_url, "Arbiter configured");

    let health = HealthRegistry::new();
    health.register(components::ENGINE).await;
    health.register(components::CONTROL_PLANE).await;
    health.register(components::ENFORCEMENT_PROCESS).await;
    health.register(components::CHECKPOINT).await;

    let control = Arc::new(control_http::HttpControlPlane::new(
        config.control_base_url.as_str(),
    )?);
    let checkpoint = Arc::new(FileCheckpoint::new(&config.checkpoint_path));
    let alarm = Arc::new(LogAlarm);
    let disk_provider = Arc::new(disks::MountedDisks::new(config.disk_paths()));

    let adapters = standard_pipeline(&config.adapter_config(), control.clone(), disk_provider);
    let engine = Arc::new(CapacityEngine::new(
        config.engine_config(),
        control,
        checkpoint,
        alarm,
        adapters,
        health.clone(),
    ));

    // The daemon must answer before the first cycle; retries forever.
    engine.wait_process_ready().await;

    // Replay the persisted schedule state so a crash never silently
    // re-enables scheduling that an operator turned off.
    engine.recover().await?;

    let (shutdown_tx, _) = broadcast::channel(1);
    engine.start(&shutdown_tx);

    health.set_ready(true).await;

    let state = Arc::new(api::AppState {
        health: health.clone(),
        engine: engine.clone(),
    });
    let api_handle = tokio::spawn(api::serve(config.api_port, state));

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    let _ = shutdown_tx.send(());
    api_handle.abort();

    Ok(())
}
