//! Prometheus registry for the exported host gauges
//!
//! Unlike the global default registry, [`HostMetrics`] owns its own
//! [`Registry`]. It is built once at startup, carries the constant `app_id`
//! label, and is handed to the HTTP layer.

use crate::identity::AppIdentity;
use crate::models::Sample;
use prometheus::{Encoder, Gauge, Registry, TextEncoder};
use std::collections::HashMap;

/// Label attached to every exported series
pub const APP_ID_LABEL: &str = "app_id";

/// Content type of the text exposition format
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Names of the application gauges, in registration order
pub const GAUGE_NAMES: [&str; 10] = [
    "memory_usage_mb",
    "memory_usage_percentage",
    "memory_total_mb",
    "cpu_usage_percentage",
    "cpu_cores",
    "drive_usage_gb",
    "drive_usage_percentage",
    "drive_total",
    "network_input_mb",
    "network_output_mb",
];

/// Host gauges plus default process metrics
///
/// Clones share the same underlying gauges.
#[derive(Clone)]
pub struct HostMetrics {
    registry: Registry,
    memory_usage_mb: Gauge,
    memory_usage_percentage: Gauge,
    memory_total_mb: Gauge,
    cpu_usage_percentage: Gauge,
    cpu_cores: Gauge,
    drive_usage_gb: Gauge,
    drive_usage_percentage: Gauge,
    drive_total: Gauge,
    network_input_mb: Gauge,
    network_output_mb: Gauge,
}

impl HostMetrics {
    /// Build the registry and register every gauge
    pub fn new(identity: &AppIdentity) -> prometheus::Result<Self> {
        let labels = HashMap::from([(APP_ID_LABEL.to_string(), identity.to_string())]);
        let registry = Registry::new_custom(None, Some(labels))?;

        let gauge = |name: &str, help: &str| -> prometheus::Result<Gauge> {
            let gauge = Gauge::new(name, help)?;
            registry.register(Box::new(gauge.clone()))?;
            Ok(gauge)
        };

        let metrics = Self {
            memory_usage_mb: gauge("memory_usage_mb", "Memory in use, in MB")?,
            memory_usage_percentage: gauge(
                "memory_usage_percentage",
                "Memory in use, as a percentage of total memory",
            )?,
            memory_total_mb: gauge("memory_total_mb", "Total memory, in MB")?,
            cpu_usage_percentage: gauge("cpu_usage_percentage", "CPU utilization, in percent")?,
            cpu_cores: gauge("cpu_cores", "Number of logical CPU cores")?,
            drive_usage_gb: gauge("drive_usage_gb", "Disk space in use, in GB")?,
            drive_usage_percentage: gauge(
                "drive_usage_percentage",
                "Disk space in use, as a percentage of total disk space",
            )?,
            drive_total: gauge("drive_total", "Total disk space, in GB")?,
            network_input_mb: gauge("network_input_mb", "Cumulative inbound network traffic, in MB")?,
            network_output_mb: gauge(
                "network_output_mb",
                "Cumulative outbound network traffic, in MB",
            )?,
            registry: registry.clone(),
        };

        #[cfg(target_os = "linux")]
        metrics.registry.register(Box::new(
            prometheus::process_collector::ProcessCollector::for_self(),
        ))?;

        Ok(metrics)
    }

    /// Write every value of the sample into its gauge
    pub fn apply(&self, sample: &Sample) {
        self.memory_usage_mb.set(sample.memory.used_mb);
        self.memory_usage_percentage.set(sample.memory.used_percentage);
        self.memory_total_mb.set(sample.memory.total_mb);
        self.cpu_usage_percentage.set(sample.cpu.usage_percentage);
        self.cpu_cores.set(sample.cpu.cores as f64);
        self.drive_usage_gb.set(sample.disk.used_gb);
        self.drive_usage_percentage.set(sample.disk.used_percentage);
        self.drive_total.set(sample.disk.total_gb);
        self.network_input_mb.set(sample.network.input_mb);
        self.network_output_mb.set(sample.network.output_mb);
    }

    /// Serialize the whole registry in the text exposition format
    pub fn encode(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    /// Current value of an application gauge, by exported name
    pub fn gauge_value(&self, name: &str) -> Option<f64> {
        let gauge = match name {
            "memory_usage_mb" => &self.memory_usage_mb,
            "memory_usage_percentage" => &self.memory_usage_percentage,
            "memory_total_mb" => &self.memory_total_mb,
            "cpu_usage_percentage" => &self.cpu_usage_percentage,
            "cpu_cores" => &self.cpu_cores,
            "drive_usage_gb" => &self.drive_usage_gb,
            "drive_usage_percentage" => &self.drive_usage_percentage,
            "drive_total" => &self.drive_total,
            "network_input_mb" => &self.network_input_mb,
            "network_output_mb" => &self.network_output_mb,
            _ => return None,
        };
        Some(gauge.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CpuSample, DiskSample, MemorySample, NetworkSample};

    fn sample() -> Sample {
        Sample {
            memory: MemorySample {
                used_mb: 2048.0,
                used_percentage: 25.0,
                total_mb: 8192.0,
            },
            cpu: CpuSample {
                usage_percentage: 42.17,
                cores: 16,
            },
            disk: DiskSample {
                used_gb: 120.5,
                used_percentage: 50.21,
                total_gb: 240.0,
            },
            network: NetworkSample {
                input_mb: 1234.56,
                output_mb: 78.9,
            },
        }
    }

    #[test]
    fn test_apply_sets_every_gauge() {
        let metrics = HostMetrics::new(&AppIdentity::new("test-app")).unwrap();

        metrics.apply(&sample());

        assert_eq!(metrics.gauge_value("memory_usage_mb"), Some(2048.0));
        assert_eq!(metrics.gauge_value("memory_usage_percentage"), Some(25.0));
        assert_eq!(metrics.gauge_value("memory_total_mb"), Some(8192.0));
        assert_eq!(metrics.gauge_value("cpu_usage_percentage"), Some(42.17));
        assert_eq!(metrics.gauge_value("cpu_cores"), Some(16.0));
        assert_eq!(metrics.gauge_value("drive_usage_gb"), Some(120.5));
        assert_eq!(metrics.gauge_value("drive_usage_percentage"), Some(50.21));
        assert_eq!(metrics.gauge_value("drive_total"), Some(240.0));
        assert_eq!(metrics.gauge_value("network_input_mb"), Some(1234.56));
        assert_eq!(metrics.gauge_value("network_output_mb"), Some(78.9));
        assert_eq!(metrics.gauge_value("unknown_metric"), None);
    }

    #[test]
    fn test_encode_carries_app_id_label() {
        let metrics = HostMetrics::new(&AppIdentity::new("abc-123")).unwrap();
        metrics.apply(&sample());

        let text = metrics.encode().unwrap();

        for name in GAUGE_NAMES {
            assert!(text.contains(&format!("# TYPE {name} gauge")), "missing TYPE for {name}");
        }
        assert!(text.contains(r#"memory_usage_mb{app_id="abc-123"} 2048"#));
        assert!(text.contains(r#"cpu_cores{app_id="abc-123"} 16"#));
    }

    #[test]
    fn test_separate_registries_do_not_collide() {
        let first = HostMetrics::new(&AppIdentity::new("first")).unwrap();
        let second = HostMetrics::new(&AppIdentity::new("second")).unwrap();

        first.apply(&sample());

        assert_eq!(first.gauge_value("cpu_cores"), Some(16.0));
        assert_eq!(second.gauge_value("cpu_cores"), Some(0.0));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_process_metrics_are_merged_in() {
        let metrics = HostMetrics::new(&AppIdentity::new("proc")).unwrap();

        let text = metrics.encode().unwrap();

        assert!(text.contains("process_resident_memory_bytes"));
        assert!(text.contains(r#"process_resident_memory_bytes{app_id="proc"}"#));
    }
}
