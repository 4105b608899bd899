//! Structured logging for exporter events
//!
//! Records are JSON when the subscriber is configured that way; every
//! record carries an `event` tag and the `app_id` of this installation.

use crate::models::Sample;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Log panics through tracing instead of the default stderr hook.
///
/// A panicking request is turned into a 500 by the router; this hook makes
/// sure it is still recorded, and the process keeps serving.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        let location = panic_info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "unknown".to_string());

        let payload = panic_info.payload();
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());

        error!(
            event = "panic",
            location = %location,
            message = %message,
            "Unhandled panic"
        );
    }));
}

/// Structured logger for exporter lifecycle and scrape events
#[derive(Clone)]
pub struct StructuredLogger {
    app_id: String,
}

impl StructuredLogger {
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
        }
    }

    pub fn log_startup(&self, version: &str, addr: &str) {
        info!(
            event = "exporter_started",
            app_id = %self.app_id,
            version = %version,
            addr = %addr,
            "Host exporter started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "exporter_shutdown",
            app_id = %self.app_id,
            reason = %reason,
            "Host exporter shutting down"
        );
    }

    pub fn log_scrape(&self, duration: Duration, sample: &Sample) {
        debug!(
            event = "scrape_completed",
            app_id = %self.app_id,
            duration_ms = duration.as_millis() as u64,
            memory_usage_mb = sample.memory.used_mb,
            memory_usage_percentage = sample.memory.used_percentage,
            cpu_usage_percentage = sample.cpu.usage_percentage,
            cpu_cores = sample.cpu.cores,
            drive_usage_percentage = sample.disk.used_percentage,
            network_input_mb = sample.network.input_mb,
            network_output_mb = sample.network.output_mb,
            "Scrape completed"
        );
    }

    pub fn log_scrape_failure(&self, duration: Duration, error: &dyn std::error::Error) {
        warn!(
            event = "scrape_failed",
            app_id = %self.app_id,
            duration_ms = duration.as_millis() as u64,
            error = %error,
            "Scrape failed"
        );
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("test-app");
        assert_eq!(logger.app_id(), "test-app");
    }
}
