//! Core data models for the host exporter
//!
//! Readings are the raw values reported by a [`SystemProbe`](crate::sampler::SystemProbe),
//! in bytes. A [`Sample`] is the derived, rounded view written into the gauges.

use serde::{Deserialize, Serialize};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;
const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `part / whole * 100`, rounded to two decimals
pub fn percentage(part: f64, whole: f64) -> f64 {
    round2(part / whole * 100.0)
}

pub fn bytes_to_mb(bytes: u64) -> f64 {
    round2(bytes as f64 / BYTES_PER_MB)
}

pub fn bytes_to_gb(bytes: u64) -> f64 {
    round2(bytes as f64 / BYTES_PER_GB)
}

/// System memory as reported by the OS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryReading {
    pub total_bytes: u64,
    pub used_bytes: u64,
}

/// CPU utilization measured over a sampling window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CpuReading {
    pub usage_percent: f64,
    pub logical_cores: usize,
}

/// Capacity of the monitored filesystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskReading {
    pub total_bytes: u64,
    pub available_bytes: u64,
}

/// Cumulative traffic across all non-loopback interfaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkReading {
    pub received_bytes: u64,
    pub transmitted_bytes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemorySample {
    pub used_mb: f64,
    pub used_percentage: f64,
    pub total_mb: f64,
}

impl MemorySample {
    /// Derive from a reading. The percentage is always recomputed from the
    /// rounded MB values; the caller guarantees `total_bytes > 0`.
    pub fn from_reading(reading: MemoryReading) -> Self {
        let used_mb = bytes_to_mb(reading.used_bytes);
        let total_mb = bytes_to_mb(reading.total_bytes);
        Self {
            used_mb,
            used_percentage: percentage(used_mb, total_mb),
            total_mb,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CpuSample {
    pub usage_percentage: f64,
    pub cores: usize,
}

impl CpuSample {
    pub fn from_reading(reading: CpuReading) -> Self {
        Self {
            usage_percentage: round2(reading.usage_percent),
            cores: reading.logical_cores,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiskSample {
    pub used_gb: f64,
    pub used_percentage: f64,
    pub total_gb: f64,
}

impl DiskSample {
    /// Used space is `total - available`; the caller guarantees `total_bytes > 0`.
    pub fn from_reading(reading: DiskReading) -> Self {
        let used_bytes = reading.total_bytes.saturating_sub(reading.available_bytes);
        Self {
            used_gb: bytes_to_gb(used_bytes),
            used_percentage: percentage(used_bytes as f64, reading.total_bytes as f64),
            total_gb: bytes_to_gb(reading.total_bytes),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetworkSample {
    pub input_mb: f64,
    pub output_mb: f64,
}

impl NetworkSample {
    pub fn from_reading(reading: NetworkReading) -> Self {
        Self {
            input_mb: bytes_to_mb(reading.received_bytes),
            output_mb: bytes_to_mb(reading.transmitted_bytes),
        }
    }
}

/// One scrape's worth of host statistics. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub memory: MemorySample,
    pub cpu: CpuSample,
    pub disk: DiskSample,
    pub network: NetworkSample,
}

#[cfg(test)]
mod tests {
    use super::*;

    const MB: u64 = 1024 * 1024;
    const GB: u64 = 1024 * MB;

    #[test]
    fn test_round2() {
        assert_eq!(round2(12.344), 12.34);
        assert_eq!(round2(12.345_1), 12.35);
        assert_eq!(round2(0.0), 0.0);
        assert_eq!(round2(100.0), 100.0);
    }

    #[test]
    fn test_byte_conversions() {
        assert_eq!(bytes_to_mb(512 * MB), 512.0);
        assert_eq!(bytes_to_mb(MB + MB / 2), 1.5);
        assert_eq!(bytes_to_gb(3 * GB), 3.0);
        assert_eq!(bytes_to_gb(GB / 4), 0.25);
    }

    #[test]
    fn test_memory_percentage_is_recomputed_from_mb_values() {
        let pairs = [
            (1_000 * MB, 4_000 * MB),
            (3 * MB, 7 * MB),
            (16_123 * MB + 17, 32_042 * MB),
            (0, 512 * MB),
            (8 * GB, 8 * GB),
        ];

        for (used, total) in pairs {
            let sample = MemorySample::from_reading(MemoryReading {
                total_bytes: total,
                used_bytes: used,
            });
            let expected = round2(sample.used_mb / sample.total_mb * 100.0);
            assert_eq!(sample.used_percentage, expected, "used={used} total={total}");
            assert!((0.0..=100.0).contains(&sample.used_percentage));
        }
    }

    #[test]
    fn test_memory_sample_values() {
        let sample = MemorySample::from_reading(MemoryReading {
            total_bytes: 8 * GB,
            used_bytes: 2 * GB,
        });

        assert_eq!(sample.total_mb, 8192.0);
        assert_eq!(sample.used_mb, 2048.0);
        assert_eq!(sample.used_percentage, 25.0);
    }

    #[test]
    fn test_disk_sample_uses_available_space() {
        let sample = DiskSample::from_reading(DiskReading {
            total_bytes: 100 * GB,
            available_bytes: 60 * GB,
        });

        assert_eq!(sample.total_gb, 100.0);
        assert_eq!(sample.used_gb, 40.0);
        assert_eq!(sample.used_percentage, 40.0);
    }

    #[test]
    fn test_disk_sample_saturates_when_available_exceeds_total() {
        let sample = DiskSample::from_reading(DiskReading {
            total_bytes: 10 * GB,
            available_bytes: 11 * GB,
        });

        assert_eq!(sample.used_gb, 0.0);
        assert_eq!(sample.used_percentage, 0.0);
    }

    #[test]
    fn test_cpu_and_network_samples() {
        let cpu = CpuSample::from_reading(CpuReading {
            usage_percent: 37.456,
            logical_cores: 8,
        });
        assert_eq!(cpu.usage_percentage, 37.46);
        assert_eq!(cpu.cores, 8);

        let network = NetworkSample::from_reading(NetworkReading {
            received_bytes: 10 * MB,
            transmitted_bytes: MB / 4,
        });
        assert_eq!(network.input_mb, 10.0);
        assert_eq!(network.output_mb, 0.25);
    }
}
