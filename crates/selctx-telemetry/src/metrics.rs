//! Prometheus-backed metrics registry and snapshot helpers.
//!
//! # Design
//! - Encapsulates collector registration to keep the public API small.
//! - Exposes only the counters convergence runs produce.
//! - Renders the text exposition format so runs can feed a node-exporter textfile directory.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use serde::Serialize;

use crate::error::{Result, TelemetryError};

const FIELD_OUTCOMES: &str = "selctx_field_outcomes_total";
const PARSE_FAILURES: &str = "selctx_label_parse_failures_total";
const RESOURCES_CHANGED: &str = "selctx_resources_changed_total";
const RESOURCES_FAILED: &str = "selctx_resources_failed_total";

/// Prometheus-backed metrics registry shared by convergence runs.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    field_outcomes_total: IntCounterVec,
    label_parse_failures_total: IntCounter,
    resources_changed_total: IntCounter,
    resources_failed_total: IntCounter,
}

/// Snapshot of the resource-level counters.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Labels the platform returned in an unparseable shape.
    pub label_parse_failures_total: u64,
    /// Resources with at least one field changed.
    pub resources_changed_total: u64,
    /// Resources with at least one failed field.
    pub resources_failed_total: u64,
}

impl Metrics {
    /// Construct a new metrics registry with the standard collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the Prometheus collectors cannot be built or registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let field_outcomes_total = IntCounterVec::new(
            Opts::new(FIELD_OUTCOMES, "Label field convergence outcomes"),
            &["field", "outcome"],
        )
        .map_err(|source| TelemetryError::MetricsCollector {
            name: FIELD_OUTCOMES,
            source,
        })?;
        let label_parse_failures_total = counter(
            PARSE_FAILURES,
            "Labels returned by the platform that could not be parsed",
        )?;
        let resources_changed_total =
            counter(RESOURCES_CHANGED, "Resources whose label was changed")?;
        let resources_failed_total = counter(
            RESOURCES_FAILED,
            "Resources with at least one failed label field",
        )?;

        register(&registry, FIELD_OUTCOMES, field_outcomes_total.clone())?;
        register(&registry, PARSE_FAILURES, label_parse_failures_total.clone())?;
        register(&registry, RESOURCES_CHANGED, resources_changed_total.clone())?;
        register(&registry, RESOURCES_FAILED, resources_failed_total.clone())?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                field_outcomes_total,
                label_parse_failures_total,
                resources_changed_total,
                resources_failed_total,
            }),
        })
    }

    /// Increment the outcome counter for one field.
    pub fn inc_field_outcome(&self, field: &str, outcome: &str) {
        self.inner
            .field_outcomes_total
            .with_label_values(&[field, outcome])
            .inc();
    }

    /// Count a platform label that failed to parse.
    pub fn inc_parse_failure(&self) {
        self.inner.label_parse_failures_total.inc();
    }

    /// Count a resource whose label changed.
    pub fn inc_resource_changed(&self) {
        self.inner.resources_changed_total.inc();
    }

    /// Count a resource with at least one failed field.
    pub fn inc_resource_failed(&self) {
        self.inner.resources_failed_total.inc();
    }

    /// Current value of the outcome counter for one field.
    #[must_use]
    pub fn field_outcome(&self, field: &str, outcome: &str) -> u64 {
        self.inner
            .field_outcomes_total
            .with_label_values(&[field, outcome])
            .get()
    }

    /// Capture the resource-level counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            label_parse_failures_total: self.inner.label_parse_failures_total.get(),
            resources_changed_total: self.inner.resources_changed_total.get(),
            resources_failed_total: self.inner.resources_failed_total.get(),
        }
    }

    /// Render all metrics in the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails or the output is not UTF-8.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|source| TelemetryError::MetricsRender { source })?;
        String::from_utf8(buffer).map_err(|source| TelemetryError::MetricsUtf8 { source })
    }

    /// Write the rendered metrics to `path`, replacing any previous content.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or writing fails.
    pub fn write_textfile(&self, path: &Path) -> Result<()> {
        let rendered = self.render()?;
        fs::write(path, rendered).map_err(|source| TelemetryError::MetricsWrite {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn counter(name: &'static str, help: &str) -> Result<IntCounter> {
    IntCounter::with_opts(Opts::new(name, help))
        .map_err(|source| TelemetryError::MetricsCollector { name, source })
}

fn register<C>(registry: &Registry, name: &'static str, collector: C) -> Result<()>
where
    C: prometheus::core::Collector + 'static,
{
    registry
        .register(Box::new(collector))
        .map_err(|source| TelemetryError::MetricsRegister { name, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn counters_accumulate_and_render() -> std::result::Result<(), Box<dyn Error>> {
        let metrics = Metrics::new()?;
        metrics.inc_field_outcome("type", "synced");
        metrics.inc_field_outcome("type", "synced");
        metrics.inc_field_outcome("user", "in_sync");
        metrics.inc_parse_failure();
        metrics.inc_resource_changed();

        assert_eq!(metrics.field_outcome("type", "synced"), 2);
        assert_eq!(metrics.field_outcome("role", "synced"), 0);
        assert_eq!(
            metrics.snapshot(),
            MetricsSnapshot {
                label_parse_failures_total: 1,
                resources_changed_total: 1,
                resources_failed_total: 0,
            }
        );

        let rendered = metrics.render()?;
        assert!(rendered.contains("selctx_field_outcomes_total{field=\"type\",outcome=\"synced\"} 2"));
        assert!(rendered.contains("selctx_resources_changed_total 1"));
        Ok(())
    }

    #[test]
    fn clones_share_the_registry() -> std::result::Result<(), Box<dyn Error>> {
        let metrics = Metrics::new()?;
        let clone = metrics.clone();
        clone.inc_resource_failed();
        assert_eq!(metrics.snapshot().resources_failed_total, 1);
        Ok(())
    }

    #[test]
    fn write_textfile_persists_exposition() -> std::result::Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("selctx.prom");
        let metrics = Metrics::new()?;
        metrics.inc_resource_changed();
        metrics.write_textfile(&path)?;
        let written = fs::read_to_string(&path)?;
        assert!(written.contains("selctx_resources_changed_total 1"));

        let missing = dir.path().join("missing").join("selctx.prom");
        assert!(matches!(
            metrics.write_textfile(&missing),
            Err(TelemetryError::MetricsWrite { .. })
        ));
        Ok(())
    }
}
