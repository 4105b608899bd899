//! Exporter configuration
//!
//! Precedence, lowest first: built-in defaults, `EXPORTER_*` environment
//! variables, then the plain `SERVER_PORT` variable.

use anyhow::{Context, Result};
use exporter_lib::sampler::ProbeConfig;
use serde::Deserialize;
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

const ENV_PREFIX: &str = "EXPORTER";
const PORT_VAR: &str = "SERVER_PORT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Exporter configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ExporterConfig {
    /// HTTP port for /metrics and the health probes
    pub server_port: u16,

    pub bind_address: IpAddr,

    /// JSON file holding the application identity
    pub identity_file: PathBuf,

    /// CPU utilization measurement window, in milliseconds
    pub cpu_sample_window_ms: u64,

    /// Mount point reported by the drive gauges
    pub disk_mount_point: PathBuf,

    pub log_format: LogFormat,
}

impl ExporterConfig {
    /// Load configuration from the process environment
    pub fn load() -> Result<Self> {
        Self::from_env(None)
    }

    /// Load from an explicit variable map instead of the process environment
    pub fn from_env(vars: Option<HashMap<String, String>>) -> Result<Self> {
        let server_port = match &vars {
            Some(vars) => vars.get(PORT_VAR).cloned(),
            None => std::env::var(PORT_VAR).ok(),
        };

        let config = config::Config::builder()
            .set_default("server_port", 61300)?
            .set_default("bind_address", "0.0.0.0")?
            .set_default("identity_file", "data.json")?
            .set_default("cpu_sample_window_ms", 1000)?
            .set_default("disk_mount_point", "/")?
            .set_default("log_format", "json")?
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .source(vars),
            )
            .set_override_option("server_port", server_port)?
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Invalid exporter configuration")
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.server_port)
    }

    pub fn probe_config(&self) -> ProbeConfig {
        ProbeConfig {
            cpu_window: Duration::from_millis(self.cpu_sample_window_ms),
            disk_mount_point: self.disk_mount_point.clone(),
        }
    }
}
