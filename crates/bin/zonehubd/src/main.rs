//! # zonehubd — zonehub daemon
//!
//! Composition root that wires the bus adapter, the controller task and the
//! refresh loop together.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars) and initialise logging
//! - Construct the bus client (adapter) and the [`System`] around it
//! - Spawn the [`Controller`] task that owns the `System`
//! - Connect, discover zones, register manual zones, optionally read engines
//! - Refresh global fields and every zone on a fixed period
//! - Handle graceful shutdown (Ctrl-C)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::time::Duration;

use chrono::TimeDelta;
use tracing_subscriber::EnvFilter;
use zonehub_adapter_virtual::VirtualBus;
use zonehub_app::controller::{Controller, ControllerHandle};
use zonehub_app::services::system::System;
use zonehub_domain::device::DeviceInfo;
use zonehub_domain::error::ZoneHubError;

use config::{Config, ControllerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    let device = DeviceInfo::new(&config.device.name, config.device_id());
    if config.device.identifier.is_none() {
        tracing::warn!(
            identifier = %device.identifier,
            "no device identifier configured, generated one for this run"
        );
    }
    tracing::info!(
        device = %device.name,
        serial = %config.serial,
        "starting against the virtual controller"
    );

    let bus = VirtualBus::new(&config.virtual_bus);
    let (handle, task) = Controller::spawn(
        System::new(bus, device),
        config.controller.command_queue,
    );

    start(&handle, &config.controller).await?;
    run(&handle, config.refresh_interval()).await?;

    handle.shutdown().await?;
    let system = task.await?;
    tracing::info!(zones = system.areas().len(), "controller stopped");

    Ok(())
}

/// Connect, then populate zones and units.
///
/// Only a failed connection is fatal; discovery problems are logged and the
/// daemon keeps running with whatever it could read.
async fn start(
    handle: &ControllerHandle,
    config: &ControllerConfig,
) -> Result<(), ZoneHubError> {
    handle.connect().await?;
    tracing::info!("connected");

    match handle.discover_zones().await {
        Ok(count) => tracing::info!(count, "zones discovered"),
        Err(ZoneHubError::ControllerStopped) => return Err(ZoneHubError::ControllerStopped),
        Err(err) => tracing::warn!(error = %err, "zone discovery failed"),
    }

    for manual in &config.manual_zones {
        match handle
            .add_manual_registered_zone(manual.name.clone(), manual.id)
            .await
        {
            Ok(zone) => tracing::info!(zone = %zone.id(), name = zone.name(), "zone registered"),
            Err(ZoneHubError::ZoneAlreadyRegistered(id)) => {
                tracing::debug!(zone = %id, "manual zone already discovered");
            }
            Err(ZoneHubError::ControllerStopped) => return Err(ZoneHubError::ControllerStopped),
            Err(err) => tracing::warn!(zone = %manual.id, error = %err, "manual zone rejected"),
        }
    }

    if config.discover_units {
        match handle.discover_units().await {
            Ok(count) => tracing::info!(count, "flow engines read"),
            Err(ZoneHubError::ControllerStopped) => return Err(ZoneHubError::ControllerStopped),
            Err(err) => tracing::warn!(error = %err, "flow engine sweep failed"),
        }
    }

    let report = handle.update().await?;
    if !report.is_complete() {
        tracing::warn!(failed = ?report.failed, "initial refresh incomplete");
    }

    let snapshot = handle.snapshot().await?;
    match serde_json::to_string(&snapshot) {
        Ok(json) => tracing::info!(snapshot = %json, "controller state"),
        Err(err) => tracing::warn!(error = %err, "failed to serialize controller state"),
    }
    Ok(())
}

/// Refresh on every tick until Ctrl-C.
async fn run(
    handle: &ControllerHandle,
    period: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    // Half the period, so timer jitter never makes a tick look fresh.
    let max_age = TimeDelta::from_std(period / 2)?;

    let mut ticker = tokio::time::interval(period);
    ticker.tick().await;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => refresh(handle, max_age).await?,
            res = &mut shutdown => {
                res?;
                tracing::info!("shutdown requested");
                return Ok(());
            }
        }
    }
}

async fn refresh(handle: &ControllerHandle, max_age: TimeDelta) -> Result<(), ZoneHubError> {
    if let Some(report) = handle.refresh_if_stale(max_age).await?
        && !report.is_complete()
    {
        tracing::warn!(failed = ?report.failed, "refresh incomplete");
    }

    let snapshot = handle.snapshot().await?;
    for zone in &snapshot.zones {
        match handle.update_area(zone.id()).await {
            Ok(zone) => tracing::debug!(
                zone = %zone.id(),
                real_temp = zone.real_temp(),
                order_temp = zone.order_temp(),
                "zone refreshed"
            ),
            Err(ZoneHubError::ControllerStopped) => return Err(ZoneHubError::ControllerStopped),
            Err(err) => tracing::warn!(zone = %zone.id(), error = %err, "zone refresh failed"),
        }
    }
    Ok(())
}
