//! # Design
//!
//! - Provide structured, constant-message errors for label access.
//! - Keep parse failures distinct from platform (system) failures so callers never confuse them.
//! - Carry the raw platform output on parse failures for diagnostics.

use std::io;
use std::path::PathBuf;
use std::string::FromUtf8Error;

use thiserror::Error;

/// Result type for label operations.
pub type LabelResult<T> = Result<T, LabelError>;

/// Errors produced while reading or changing security labels.
#[derive(Debug, Error)]
pub enum LabelError {
    /// The platform returned a label with the wrong number of components.
    #[error("label parse failure")]
    Parse {
        /// Raw label string as returned by the platform.
        raw: String,
        /// Component count required by the active label format.
        expected: usize,
        /// Component count found in the raw string.
        found: usize,
    },
    /// A field value was rejected before reaching the platform.
    #[error("invalid label field")]
    InvalidField {
        /// Field that failed validation.
        field: &'static str,
        /// Offending value.
        value: String,
        /// Static reason for the failure.
        reason: &'static str,
    },
    /// IO failures while inspecting the resource path.
    #[error("label io failure")]
    Io {
        /// Operation that triggered the IO failure.
        operation: &'static str,
        /// Path involved in the IO failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// A label tool could not be started.
    #[error("label tool spawn failure")]
    Spawn {
        /// Operation that required the tool.
        operation: &'static str,
        /// Program that failed to start.
        program: String,
        /// Underlying IO error.
        source: io::Error,
    },
    /// A label tool exited unsuccessfully.
    #[error("label tool failed")]
    CommandFailed {
        /// Operation that required the tool.
        operation: &'static str,
        /// Path the tool was invoked for.
        path: PathBuf,
        /// Exit status when the tool was not killed by a signal.
        status: Option<i32>,
        /// Trimmed standard error output.
        stderr: String,
    },
    /// A label tool produced output that was not UTF-8.
    #[error("label tool output was not valid utf-8")]
    OutputEncoding {
        /// Operation that required the tool.
        operation: &'static str,
        /// Path the tool was invoked for.
        path: PathBuf,
        /// Underlying conversion error.
        source: FromUtf8Error,
    },
    /// No program was configured for a tool.
    #[error("label tool not configured")]
    EmptyCommand {
        /// Operation whose tool is missing.
        operation: &'static str,
    },
    /// Failure injected by the in-memory accessor.
    #[error("simulated label failure")]
    Simulated {
        /// Operation that was configured to fail.
        operation: &'static str,
        /// Path the operation targeted.
        path: PathBuf,
    },
}

impl LabelError {
    /// `true` when the platform answered but the label could not be decomposed.
    #[must_use]
    pub const fn is_parse_failure(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }

    /// `true` when the underlying query or mutation call itself failed.
    #[must_use]
    pub const fn is_system_failure(&self) -> bool {
        !matches!(self, Self::Parse { .. } | Self::InvalidField { .. })
    }

    pub(crate) fn parse(raw: &str, expected: usize, found: usize) -> Self {
        Self::Parse {
            raw: raw.to_string(),
            expected,
            found,
        }
    }

    pub(crate) fn invalid_field(field: &'static str, value: &str, reason: &'static str) -> Self {
        Self::InvalidField {
            field,
            value: value.to_string(),
            reason,
        }
    }

    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn simulated(operation: &'static str, path: impl Into<PathBuf>) -> Self {
        Self::Simulated {
            operation,
            path: path.into(),
        }
    }
}
