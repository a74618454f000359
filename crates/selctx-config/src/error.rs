//! Error types for configuration loading.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Field contained an invalid value.
    #[error("invalid configuration field")]
    InvalidField {
        /// Section that failed validation.
        section: String,
        /// Field that failed validation.
        field: String,
        /// Offending value when available.
        value: Option<String>,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// Environment override carried an unusable value.
    #[error("invalid environment override")]
    InvalidEnv {
        /// Variable that was read.
        variable: &'static str,
        /// Value found in the environment.
        value: String,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// Manifest document could not be decoded.
    #[error("manifest decode failed")]
    Json {
        /// Manifest path.
        path: PathBuf,
        /// Source decode error.
        source: serde_json::Error,
    },
    /// File system operation failed.
    #[error("filesystem operation failed")]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Source IO error.
        source: io::Error,
    },
}

impl ConfigError {
    #[allow(clippy::redundant_pub_crate)]
    pub(crate) fn invalid_field(
        section: impl Into<String>,
        field: impl Into<String>,
        value: Option<&str>,
        reason: &'static str,
    ) -> Self {
        Self::InvalidField {
            section: section.into(),
            field: field.into(),
            value: value.map(str::to_string),
            reason,
        }
    }
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn invalid_field_keeps_context() {
        let err = ConfigError::invalid_field("resources[0]", "path", Some("srv"), "must be absolute");
        assert_eq!(err.to_string(), "invalid configuration field");
        match err {
            ConfigError::InvalidField {
                section,
                field,
                value,
                reason,
            } => {
                assert_eq!(section, "resources[0]");
                assert_eq!(field, "path");
                assert_eq!(value.as_deref(), Some("srv"));
                assert_eq!(reason, "must be absolute");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn io_errors_expose_source() {
        let err = ConfigError::Io {
            operation: "read_manifest",
            path: PathBuf::from("/etc/selctx/manifest.json"),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert!(err.source().is_some());
    }
}
