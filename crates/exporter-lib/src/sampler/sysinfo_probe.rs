//! [`SystemProbe`] backed by the `sysinfo` crate
//!
//! Each query builds its own `sysinfo` handle so concurrent scrapes never
//! share refresh state. Blocking refreshes run on the blocking thread pool.

use super::{async_trait, SampleError, SystemProbe};
use crate::models::{CpuReading, DiskReading, MemoryReading, NetworkReading};
use std::path::{Path, PathBuf};
use std::time::Duration;
use sysinfo::{Disks, Networks, System};
use tokio::task;

/// Tuning for the sysinfo probe
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// How long to measure CPU utilization for
    pub cpu_window: Duration,
    /// Mount point of the filesystem reported as the drive
    pub disk_mount_point: PathBuf,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            cpu_window: Duration::from_millis(1000),
            disk_mount_point: PathBuf::from("/"),
        }
    }
}

pub struct SysinfoProbe {
    config: ProbeConfig,
}

impl SysinfoProbe {
    pub fn new(config: ProbeConfig) -> Self {
        Self { config }
    }

    /// CPU usage is a diff between two refreshes, which sysinfo can't resolve
    /// below its minimum update interval.
    pub fn cpu_window(&self) -> Duration {
        self.config.cpu_window.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL)
    }

    /// Find the filesystem mounted exactly at `mount_point`
    /// Yields (mount_point, total_bytes, available_bytes)
    pub fn select_disk<'a>(
        disks: impl IntoIterator<Item = (&'a Path, u64, u64)>,
        mount_point: &Path,
    ) -> Option<DiskReading> {
        disks
            .into_iter()
            .find(|(mount, _, _)| *mount == mount_point)
            .map(|(_, total_bytes, available_bytes)| DiskReading {
                total_bytes,
                available_bytes,
            })
    }

    /// Sum cumulative traffic over all interfaces except loopback
    pub fn sum_traffic<'a>(
        interfaces: impl IntoIterator<Item = (&'a str, u64, u64)>,
    ) -> NetworkReading {
        interfaces
            .into_iter()
            .filter(|(name, _, _)| !is_loopback(name))
            .fold(
                NetworkReading {
                    received_bytes: 0,
                    transmitted_bytes: 0,
                },
                |acc, (_, rx, tx)| NetworkReading {
                    received_bytes: acc.received_bytes.saturating_add(rx),
                    transmitted_bytes: acc.transmitted_bytes.saturating_add(tx),
                },
            )
    }
}

fn is_loopback(name: &str) -> bool {
    name == "lo" || name.starts_with("lo0")
}

#[async_trait]
impl SystemProbe for SysinfoProbe {
    async fn memory(&self) -> Result<MemoryReading, SampleError> {
        task::spawn_blocking(|| {
            let mut system = System::new();
            system.refresh_memory();

            let total_bytes = system.total_memory();
            Ok(MemoryReading {
                total_bytes,
                used_bytes: total_bytes.saturating_sub(system.available_memory()),
            })
        })
        .await?
    }

    async fn cpu(&self) -> Result<CpuReading, SampleError> {
        let mut system = task::spawn_blocking(|| {
            let mut system = System::new();
            system.refresh_cpu_usage();
            system
        })
        .await?;

        tokio::time::sleep(self.cpu_window()).await;

        task::spawn_blocking(move || {
            system.refresh_cpu_usage();

            let logical_cores = system.cpus().len();
            if logical_cores == 0 {
                return Err(SampleError::Cpu("no CPUs reported".into()));
            }

            Ok(CpuReading {
                usage_percent: f64::from(system.global_cpu_usage()),
                logical_cores,
            })
        })
        .await?
    }

    async fn disk(&self) -> Result<DiskReading, SampleError> {
        let mount_point = self.config.disk_mount_point.clone();

        task::spawn_blocking(move || {
            let disks = Disks::new_with_refreshed_list();
            let entries = disks
                .list()
                .iter()
                .map(|d| (d.mount_point(), d.total_space(), d.available_space()));

            Self::select_disk(entries, &mount_point).ok_or_else(|| {
                SampleError::Disk(format!("no filesystem mounted at {}", mount_point.display()))
            })
        })
        .await?
    }

    async fn network(&self) -> Result<NetworkReading, SampleError> {
        task::spawn_blocking(|| {
            let networks = Networks::new_with_refreshed_list();
            let interfaces = networks.list().iter().map(|(name, data)| {
                (name.as_str(), data.total_received(), data.total_transmitted())
            });

            Ok(Self::sum_traffic(interfaces))
        })
        .await?
    }
}
