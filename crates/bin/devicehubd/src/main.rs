//! # devicehubd
//!
//! Composition root that wires the device registry, the cache and the
//! integrations together.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Initialize logging
//! - Restore cached devices as placeholders
//! - Attach enabled integrations, merging live devices into their placeholders
//! - Persist the registry whenever a device asks for it, and on shutdown
//!   (SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

mod cache;
mod config;

use std::path::Path;

use anyhow::Context;
use devicehub_adapter_virtual::VirtualIntegration;
use devicehub_app::event_bus::InProcessEventBus;
use devicehub_app::ports::EventPublisher;
use devicehub_app::registry::DeviceRegistry;
use devicehub_domain::event::DeviceEvent;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    // Event bus
    let event_bus = InProcessEventBus::new(config.cache.event_capacity);
    let mut events = event_bus.subscribe();

    // Registry, cache first so live devices can take over their placeholders
    let registry = DeviceRegistry::new(event_bus);
    let records = cache::load(&config.cache.path)
        .await
        .context("failed to load device cache")?;
    registry.load_cached(records);

    // Integrations
    let mut integrations = Vec::new();
    if config.integrations.virtual_enabled {
        let virtual_integration = VirtualIntegration::default();
        registry.attach(&virtual_integration);
        integrations.push(virtual_integration);
    }
    tracing::info!(
        devices = registry.devices().len(),
        integrations = integrations.len(),
        "devicehubd started"
    );

    persist(&registry, &config.cache.path).await;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(DeviceEvent::SaveRequested) => persist(&registry, &config.cache.path).await,
                Ok(event) => tracing::info!(%event, "device event"),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event consumer lagged, saving");
                    persist(&registry, &config.cache.path).await;
                }
                Err(RecvError::Closed) => break,
            },
            result = &mut shutdown => {
                result.context("failed to listen for shutdown signal")?;
                tracing::info!("shutting down");
                break;
            }
        }
    }

    cache::save(&config.cache.path, &registry.snapshot())
        .await
        .context("failed to save device cache")?;
    Ok(())
}

async fn persist<P>(registry: &DeviceRegistry<P>, path: &Path)
where
    P: EventPublisher + Send + Sync + 'static,
{
    if let Err(error) = cache::save(path, &registry.snapshot()).await {
        tracing::error!(%error, path = %path.display(), "failed to save device cache");
    }
}
