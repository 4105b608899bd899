//! Host exporter - host resource metrics for Prometheus
//!
//! Samples memory, CPU, disk and network usage on every scrape of
//! `/metrics` and exposes them with a constant `app_id` label.

use exporter_lib::{
    api,
    health::{components, HealthRegistry},
    observability::{install_panic_hook, StructuredLogger},
    sampler::{Sampler, SysinfoProbe},
    HostMetrics, IdentityStore,
};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;

use config::{ExporterConfig, LogFormat};

const EXPORTER_VERSION: &str = env!("CARGO_PKG_VERSION");

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = ExporterConfig::load()?;

    init_tracing(config.log_format);
    install_panic_hook();

    info!("Starting host-exporter");

    // An unreadable identity file is fatal; it is never regenerated
    let identity_store = IdentityStore::new(&config.identity_file);
    let identity = identity_store
        .load_or_create()
        .await
        .context("Failed to load application identity")?;
    info!(app_id = %identity, identity_file = %identity_store.path().display(), "Identity loaded");

    let health_registry = HealthRegistry::new();
    health_registry.register(components::SAMPLER).await;
    health_registry.register(components::REGISTRY).await;

    let metrics = HostMetrics::new(&identity).context("Failed to build metrics registry")?;
    let sampler = Sampler::new(Arc::new(SysinfoProbe::new(config.probe_config())));
    let logger = StructuredLogger::new(identity.as_str());

    let app_state = Arc::new(api::AppState::new(
        health_registry.clone(),
        metrics,
        sampler,
        logger.clone(),
    ));

    health_registry.set_ready(true).await;

    let addr = config.socket_addr();
    logger.log_startup(EXPORTER_VERSION, &addr.to_string());

    let api_handle = tokio::spawn(api::serve(addr, app_state));

    tokio::select! {
        result = api_handle => {
            match result {
                Ok(Ok(())) => info!("API server stopped"),
                Ok(Err(e)) => {
                    error!(error = %e, "API server failed");
                    return Err(e);
                }
                Err(e) => {
                    error!(error = %e, "API server task aborted");
                    return Err(e.into());
                }
            }
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            logger.log_shutdown("SIGINT received");
        }
    }

    info!("Shutting down");
    Ok(())
}
