//! Host statistics sampling
//!
//! A [`SystemProbe`] answers four independent questions about the host
//! (memory, CPU, disk, network). The [`Sampler`] asks all four at once and
//! turns the readings into a [`Sample`]. Either every query succeeds or the
//! whole sample fails; there are no partial samples.

mod sysinfo_probe;

pub use sysinfo_probe::{ProbeConfig, SysinfoProbe};

use crate::models::{
    CpuReading, CpuSample, DiskReading, DiskSample, MemoryReading, MemorySample, NetworkReading,
    NetworkSample, Sample,
};
use std::sync::Arc;
use thiserror::Error;

pub use async_trait::async_trait;

#[derive(Debug, Error)]
pub enum SampleError {
    #[error("memory query failed: {0}")]
    Memory(String),

    #[error("cpu query failed: {0}")]
    Cpu(String),

    #[error("disk query failed: {0}")]
    Disk(String),

    #[error("network query failed: {0}")]
    Network(String),

    #[error("probe task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Source of raw host readings
#[async_trait]
pub trait SystemProbe: Send + Sync {
    async fn memory(&self) -> Result<MemoryReading, SampleError>;

    /// May block for a measurement window before returning
    async fn cpu(&self) -> Result<CpuReading, SampleError>;

    async fn disk(&self) -> Result<DiskReading, SampleError>;

    async fn network(&self) -> Result<NetworkReading, SampleError>;
}

/// Produces a fresh [`Sample`] on every call
#[derive(Clone)]
pub struct Sampler {
    probe: Arc<dyn SystemProbe>,
}

impl Sampler {
    pub fn new(probe: Arc<dyn SystemProbe>) -> Self {
        Self { probe }
    }

    /// Query the probe and derive a sample. Nothing is cached between calls.
    pub async fn sample(&self) -> Result<Sample, SampleError> {
        let (memory, cpu, disk, network) = tokio::try_join!(
            self.probe.memory(),
            self.probe.cpu(),
            self.probe.disk(),
            self.probe.network(),
        )?;

        if memory.total_bytes == 0 {
            return Err(SampleError::Memory("total memory reported as zero".into()));
        }
        if disk.total_bytes == 0 {
            return Err(SampleError::Disk("filesystem reports zero capacity".into()));
        }

        Ok(Sample {
            memory: MemorySample::from_reading(memory),
            cpu: CpuSample::from_reading(cpu),
            disk: DiskSample::from_reading(disk),
            network: NetworkSample::from_reading(network),
        })
    }
}
