//! Output renderers and formatting helpers for CLI commands.

use std::error::Error;
use std::fmt::Write as _;

use anyhow::anyhow;
use selctx_label::{LabelError, LabelFormat};
use selctx_property::{ConvergenceReport, FieldOutcome, FieldReport, PropertyError};
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::context::{CliError, CliResult};

const ABSENT: &str = "absent";
const NONE: &str = "-";

/// Current and default label of one path.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct LabelView {
    pub(crate) path: String,
    pub(crate) current: Option<String>,
    pub(crate) default: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) error: Option<String>,
}

/// Serializable form of a convergence report.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ReportView {
    pub(crate) path: String,
    pub(crate) changed: bool,
    pub(crate) failed: bool,
    pub(crate) fields: Vec<FieldView>,
}

/// Serializable form of one field outcome.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct FieldView {
    pub(crate) field: &'static str,
    pub(crate) outcome: &'static str,
    pub(crate) current: Option<String>,
    pub(crate) desired: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) error: Option<String>,
}

impl From<&ConvergenceReport> for ReportView {
    fn from(report: &ConvergenceReport) -> Self {
        Self {
            path: report.path.display().to_string(),
            changed: report.changed(),
            failed: report.failed(),
            fields: report.fields.iter().map(FieldView::from).collect(),
        }
    }
}

impl From<&FieldReport> for FieldView {
    fn from(report: &FieldReport) -> Self {
        let current = match &report.outcome {
            FieldOutcome::InSync { value } => Some(value.clone()),
            FieldOutcome::Drifted { current, .. } => Some(current.clone()),
            FieldOutcome::Synced { previous, .. } => previous.value().map(str::to_string),
            FieldOutcome::Unconstrained
            | FieldOutcome::Deferred { .. }
            | FieldOutcome::Failed { .. } => None,
        };
        let error = match &report.outcome {
            FieldOutcome::Failed { error, .. } => Some(describe_property_error(error)),
            _ => None,
        };
        Self {
            field: report.kind.as_str(),
            outcome: report.outcome.label(),
            current,
            desired: report.outcome.desired().map(str::to_string),
            error,
        }
    }
}

pub(crate) fn render_labels(views: &[LabelView], format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => to_json(views),
        OutputFormat::Table => {
            let mut text = String::new();
            let _ = writeln!(text, "{:<40} {:<40} DEFAULT", "PATH", "CURRENT");
            for view in views {
                let current = view.current.as_deref().unwrap_or(ABSENT);
                let default = view.default.as_deref().unwrap_or(NONE);
                let _ = writeln!(text, "{:<40} {:<40} {default}", view.path, current);
                if let Some(error) = &view.error {
                    let _ = writeln!(text, "  error: {error}");
                }
            }
            Ok(text)
        }
    }
}

pub(crate) fn render_reports(views: &[ReportView], format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => to_json(views),
        OutputFormat::Table => {
            let mut text = String::new();
            let _ = writeln!(
                text,
                "{:<40} {:<5} {:<13} {:<28} DESIRED",
                "PATH", "FIELD", "OUTCOME", "CURRENT"
            );
            for view in views {
                for field in &view.fields {
                    let current = field.current.as_deref().unwrap_or(match field.outcome {
                        "deferred" => ABSENT,
                        _ => NONE,
                    });
                    let desired = field.desired.as_deref().unwrap_or(NONE);
                    let _ = writeln!(
                        text,
                        "{:<40} {:<5} {:<13} {:<28} {desired}",
                        view.path, field.field, field.outcome, current
                    );
                    if let Some(error) = &field.error {
                        let _ = writeln!(text, "  error: {error}");
                    }
                }
            }
            let changed = views.iter().filter(|view| view.changed).count();
            let failed = views.iter().filter(|view| view.failed).count();
            let _ = writeln!(
                text,
                "{} resource(s), {changed} changed, {failed} failed",
                views.len()
            );
            Ok(text)
        }
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> CliResult<String> {
    serde_json::to_string_pretty(value)
        .map(|text| text + "\n")
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))
}

pub(crate) fn describe_property_error(error: &PropertyError) -> String {
    match error.label_error() {
        Some(label) => describe_label_error(label),
        None => error_chain(error),
    }
}

pub(crate) fn describe_label_error(error: &LabelError) -> String {
    let message = error_chain(error);
    match error {
        LabelError::Parse {
            raw,
            expected,
            found,
        } if *expected == LabelFormat::Triple.field_count() && *found > *expected => format!(
            "{message}: expected {expected} components, found {found} in '{raw}' \
             (labels with a range need --label-format mls)"
        ),
        LabelError::Parse {
            raw,
            expected,
            found,
        } => format!("{message}: expected {expected} components, found {found} in '{raw}'"),
        LabelError::InvalidField { field, value, reason } => {
            format!("{message}: {field} '{value}' {reason}")
        }
        LabelError::CommandFailed {
            operation, stderr, ..
        } if !stderr.is_empty() => format!("{message}: {operation}: {stderr}"),
        LabelError::Io {
            operation, path, ..
        }
        | LabelError::CommandFailed {
            operation, path, ..
        }
        | LabelError::OutputEncoding {
            operation, path, ..
        }
        | LabelError::Simulated { operation, path } => {
            format!("{message} ({operation} {})", path.display())
        }
        LabelError::Spawn {
            operation, program, ..
        } => format!("{message} ({operation} via {program})"),
        LabelError::EmptyCommand { operation } => format!("{message} ({operation})"),
    }
}

fn error_chain(error: &dyn Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(inner) = source {
        let _ = write!(message, ": {inner}");
        source = inner.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use selctx_label::FieldKind;
    use selctx_property::{FieldState, ResourceError};
    use std::error::Error as StdError;
    use std::path::PathBuf;

    fn report() -> ConvergenceReport {
        ConvergenceReport {
            path: PathBuf::from("/var/www/html/index.html"),
            fields: vec![
                FieldReport {
                    kind: FieldKind::User,
                    outcome: FieldOutcome::Unconstrained,
                },
                FieldReport {
                    kind: FieldKind::Role,
                    outcome: FieldOutcome::InSync {
                        value: "object_r".into(),
                    },
                },
                FieldReport {
                    kind: FieldKind::Type,
                    outcome: FieldOutcome::Synced {
                        previous: FieldState::Value("root_t".into()),
                        value: "httpd_sys_content_t".into(),
                    },
                },
            ],
        }
    }

    #[test]
    fn report_view_projects_outcomes() {
        let view = ReportView::from(&report());
        assert!(view.changed);
        assert!(!view.failed);
        let outcomes: Vec<&str> = view.fields.iter().map(|field| field.outcome).collect();
        assert_eq!(outcomes, vec!["unconstrained", "in_sync", "synced"]);
        assert_eq!(view.fields[2].current.as_deref(), Some("root_t"));
        assert_eq!(view.fields[2].desired.as_deref(), Some("httpd_sys_content_t"));
        assert!(view.fields[0].desired.is_none());
    }

    #[test]
    fn table_lists_every_field_and_a_summary() -> Result<(), Box<dyn StdError>> {
        let text = render_reports(&[ReportView::from(&report())], OutputFormat::Table)
            .map_err(|err| err.display_message())?;
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("PATH"));
        assert!(lines[3].contains("synced"));
        assert!(lines[3].contains("root_t"));
        assert!(lines[3].ends_with("httpd_sys_content_t"));
        assert_eq!(lines[4], "1 resource(s), 1 changed, 0 failed");
        Ok(())
    }

    #[test]
    fn json_output_is_structured() -> Result<(), Box<dyn StdError>> {
        let text = render_reports(&[ReportView::from(&report())], OutputFormat::Json)
            .map_err(|err| err.display_message())?;
        let value: serde_json::Value = serde_json::from_str(&text)?;
        assert_eq!(value[0]["path"], "/var/www/html/index.html");
        assert_eq!(value[0]["fields"][2]["outcome"], "synced");
        assert!(value[0]["fields"][2].get("error").is_none());
        Ok(())
    }

    #[test]
    fn label_table_marks_absent_paths() -> Result<(), Box<dyn StdError>> {
        let views = [LabelView {
            path: "/srv/missing".into(),
            current: None,
            default: Some("system_u:object_r:var_t".into()),
            error: None,
        }];
        let text = render_labels(&views, OutputFormat::Table).map_err(|err| err.display_message())?;
        let row = text.lines().nth(1).ok_or("row missing")?;
        assert!(row.contains("absent"));
        assert!(row.ends_with("system_u:object_r:var_t"));
        Ok(())
    }

    #[test]
    fn parse_failures_show_the_raw_label() {
        let error = PropertyError::from(LabelError::Parse {
            raw: "system_u:object_r".into(),
            expected: 3,
            found: 2,
        });
        assert_eq!(
            describe_property_error(&error),
            "label parse failure: expected 3 components, found 2 in 'system_u:object_r'"
        );
    }

    #[test]
    fn ranged_labels_under_triple_suggest_mls() {
        let error = LabelError::Parse {
            raw: "system_u:object_r:root_t:s0".into(),
            expected: 3,
            found: 4,
        };
        let message = describe_label_error(&error);
        assert!(message.contains("found 4 in 'system_u:object_r:root_t:s0'"));
        assert!(message.ends_with("(labels with a range need --label-format mls)"));
    }

    #[test]
    fn creation_failures_include_the_cause() {
        let error = PropertyError::Create {
            path: PathBuf::from("/srv/missing"),
            source: ResourceError::Missing {
                path: PathBuf::from("/srv/missing"),
            },
        };
        assert_eq!(
            describe_property_error(&error),
            "resource creation failed: resource missing"
        );
    }

    #[test]
    fn tool_failures_include_stderr() {
        let error = LabelError::CommandFailed {
            operation: "set_label_field",
            path: PathBuf::from("/srv/www"),
            status: Some(1),
            stderr: "chcon: Operation not permitted".into(),
        };
        assert_eq!(
            describe_label_error(&error),
            "label tool failed: set_label_field: chcon: Operation not permitted"
        );
    }
}
