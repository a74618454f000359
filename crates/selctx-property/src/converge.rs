//! Retrieve, compare and sync for every field of one resource.
//!
//! # Design
//! - Fields are independent: a failure on one is recorded and the next field still runs.
//! - No retries; each field ends the pass in exactly one outcome.
//! - Check mode never calls `sync`; divergent fields are reported as drift.

use std::path::{Path, PathBuf};

use selctx_label::{FieldKind, LabelAccessor};
use selctx_telemetry::Metrics;
use tracing::{info, info_span, warn};

use crate::error::PropertyError;
use crate::field::{FieldProperty, FieldState};
use crate::resource::ManagedResource;

/// Whether divergent fields are changed or only reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConvergeMode {
    /// Sync divergent fields.
    #[default]
    Apply,
    /// Report divergent fields without changing them.
    Check,
}

/// Terminal state of one field after a convergence pass.
#[derive(Debug)]
pub enum FieldOutcome {
    /// Nothing declared and no platform default; the field was skipped.
    Unconstrained,
    /// The field already carries the desired value.
    InSync {
        /// Current (and desired) value.
        value: String,
    },
    /// Check mode: the field differs from the desired value.
    Drifted {
        /// Value currently on the resource.
        current: String,
        /// Value the field should carry.
        desired: String,
    },
    /// Check mode: the resource is missing and must be created before it can converge.
    Deferred {
        /// Value the field should carry once the resource exists.
        desired: String,
    },
    /// The field was changed.
    Synced {
        /// State before the change.
        previous: FieldState,
        /// Value written.
        value: String,
    },
    /// Retrieval or sync failed.
    Failed {
        /// Value the field should have carried.
        desired: String,
        /// Failure reported by the property.
        error: PropertyError,
    },
}

impl FieldOutcome {
    /// Stable outcome name used in metrics and reports.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Unconstrained => "unconstrained",
            Self::InSync { .. } => "in_sync",
            Self::Drifted { .. } => "drifted",
            Self::Deferred { .. } => "deferred",
            Self::Synced { .. } => "synced",
            Self::Failed { .. } => "failed",
        }
    }

    /// Desired value the outcome was evaluated against.
    #[must_use]
    pub fn desired(&self) -> Option<&str> {
        match self {
            Self::Unconstrained => None,
            Self::InSync { value } | Self::Synced { value, .. } => Some(value),
            Self::Drifted { desired, .. }
            | Self::Deferred { desired }
            | Self::Failed { desired, .. } => Some(desired),
        }
    }
}

/// Outcome for one field.
#[derive(Debug)]
pub struct FieldReport {
    /// Field the report covers.
    pub kind: FieldKind,
    /// Terminal state reached.
    pub outcome: FieldOutcome,
}

/// Outcomes for every field of one resource.
#[derive(Debug)]
pub struct ConvergenceReport {
    /// Path of the resource.
    pub path: PathBuf,
    /// One report per field, in label order.
    pub fields: Vec<FieldReport>,
}

impl ConvergenceReport {
    /// `true` when any field was changed.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.fields
            .iter()
            .any(|report| matches!(report.outcome, FieldOutcome::Synced { .. }))
    }

    /// `true` when any field failed.
    #[must_use]
    pub fn failed(&self) -> bool {
        self.fields
            .iter()
            .any(|report| matches!(report.outcome, FieldOutcome::Failed { .. }))
    }

    /// `true` when check mode found any divergent or deferred field.
    #[must_use]
    pub fn drifted(&self) -> bool {
        self.fields.iter().any(|report| {
            matches!(
                report.outcome,
                FieldOutcome::Drifted { .. } | FieldOutcome::Deferred { .. }
            )
        })
    }

    /// Report for one field.
    #[must_use]
    pub fn field(&self, kind: FieldKind) -> Option<&FieldReport> {
        self.fields.iter().find(|report| report.kind == kind)
    }
}

/// Convergence driver bound to one label accessor.
pub struct Convergence<'a, A: LabelAccessor + ?Sized> {
    accessor: &'a A,
    mode: ConvergeMode,
    metrics: Option<Metrics>,
}

impl<'a, A: LabelAccessor + ?Sized> Convergence<'a, A> {
    /// Driver that applies changes through `accessor`.
    #[must_use]
    pub const fn new(accessor: &'a A) -> Self {
        Self {
            accessor,
            mode: ConvergeMode::Apply,
            metrics: None,
        }
    }

    /// Switch between applying and checking.
    #[must_use]
    pub const fn with_mode(mut self, mode: ConvergeMode) -> Self {
        self.mode = mode;
        self
    }

    /// Record outcomes into `metrics`.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Mode the driver runs in.
    #[must_use]
    pub const fn mode(&self) -> ConvergeMode {
        self.mode
    }

    /// Converge every property against `resource`.
    #[must_use]
    pub fn converge<R>(&self, resource: &R, properties: &[FieldProperty]) -> ConvergenceReport
    where
        R: ManagedResource + ?Sized,
    {
        let path = resource.path();
        let span = info_span!("converge", path = %path.display(), mode = ?self.mode);
        let _entered = span.enter();

        let fields: Vec<FieldReport> = properties
            .iter()
            .map(|property| self.converge_field(property, resource))
            .collect();
        let report = ConvergenceReport {
            path: path.to_path_buf(),
            fields,
        };

        if let Some(metrics) = &self.metrics {
            if report.changed() {
                metrics.inc_resource_changed();
            }
            if report.failed() {
                metrics.inc_resource_failed();
            }
        }
        report
    }

    /// Run the retrieve/compare/sync cycle for one field.
    #[must_use]
    pub fn converge_field<R>(&self, property: &FieldProperty, resource: &R) -> FieldReport
    where
        R: ManagedResource + ?Sized,
    {
        let outcome = self.evaluate(property, resource);
        if let Some(metrics) = &self.metrics {
            metrics.inc_field_outcome(property.kind().as_str(), outcome.label());
            if let FieldOutcome::Failed { error, .. } = &outcome
                && error.is_parse_failure()
            {
                metrics.inc_parse_failure();
            }
        }
        FieldReport {
            kind: property.kind(),
            outcome,
        }
    }

    fn evaluate<R>(&self, property: &FieldProperty, resource: &R) -> FieldOutcome
    where
        R: ManagedResource + ?Sized,
    {
        let Some(desired) = property.resolve_desired(self.accessor, resource) else {
            return FieldOutcome::Unconstrained;
        };

        let current = match property.retrieve(self.accessor, resource) {
            Ok(current) => current,
            Err(error) => {
                log_failure(property, resource.path(), &error);
                return FieldOutcome::Failed { desired, error };
            }
        };

        if current.value() == Some(desired.as_str()) {
            return FieldOutcome::InSync { value: desired };
        }

        if self.mode == ConvergeMode::Check {
            return match current {
                FieldState::Value(current) => FieldOutcome::Drifted { current, desired },
                FieldState::Absent => FieldOutcome::Deferred { desired },
            };
        }

        match property.sync(self.accessor, resource, &desired) {
            Ok(event) => {
                info!(
                    property = property.name(),
                    event = event.as_str(),
                    previous = current.value().unwrap_or("absent"),
                    value = desired.as_str(),
                    "label field changed"
                );
                FieldOutcome::Synced {
                    previous: current,
                    value: desired,
                }
            }
            Err(error) => {
                log_failure(property, resource.path(), &error);
                FieldOutcome::Failed { desired, error }
            }
        }
    }
}

fn log_failure(property: &FieldProperty, path: &Path, error: &PropertyError) {
    warn!(
        property = property.name(),
        path = %path.display(),
        error = %error,
        "label field failed to converge"
    );
}
