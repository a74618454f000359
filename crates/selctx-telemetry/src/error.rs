//! Telemetry failures.

use std::path::PathBuf;

use prometheus::Error as PrometheusError;
use thiserror::Error;

/// Result alias for telemetry operations.
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Errors raised while installing logging or exporting metrics.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// A global subscriber was already installed or could not be set.
    #[error("failed to install tracing subscriber")]
    SubscriberInstall {
        /// Underlying tracing subscriber error.
        source: tracing_subscriber::util::TryInitError,
    },
    /// A counter could not be built from its options.
    #[error("failed to build metrics collector")]
    MetricsCollector {
        /// Metric name.
        name: &'static str,
        /// Underlying Prometheus error.
        source: PrometheusError,
    },
    /// A counter could not be added to the registry.
    #[error("failed to register metrics collector")]
    MetricsRegister {
        /// Metric name.
        name: &'static str,
        /// Underlying Prometheus error.
        source: PrometheusError,
    },
    /// The text exposition could not be rendered.
    #[error("failed to render metrics")]
    MetricsRender {
        /// Underlying Prometheus error.
        source: PrometheusError,
    },
    /// The rendered exposition was not UTF-8.
    #[error("metrics output was not valid utf-8")]
    MetricsUtf8 {
        /// Underlying conversion error.
        source: std::string::FromUtf8Error,
    },
    /// The metrics text file could not be written.
    #[error("failed to write metrics file")]
    MetricsWrite {
        /// Destination file.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
}
