//! # Design
//!
//! - Label accessor failures pass through unchanged inside `PropertyError::Label`.
//! - Resource creation failures are a separate variant so callers can tell them apart.

use std::io;
use std::path::PathBuf;

use selctx_label::LabelError;
use thiserror::Error;

/// Result type for resource operations.
pub type ResourceResult<T> = Result<T, ResourceError>;

/// Result type for property operations.
pub type PropertyResult<T> = Result<T, PropertyError>;

/// Errors raised while materialising a managed resource.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// The resource is missing and is not allowed to be created.
    #[error("resource missing")]
    Missing {
        /// Path of the missing resource.
        path: PathBuf,
    },
    /// IO failures while creating the resource.
    #[error("resource io failure")]
    Io {
        /// Operation that triggered the IO failure.
        operation: &'static str,
        /// Path involved in the IO failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
}

impl ResourceError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}

/// Errors raised by field properties.
#[derive(Debug, Error)]
pub enum PropertyError {
    /// The label accessor failed; the original error is preserved.
    #[error(transparent)]
    Label(#[from] LabelError),
    /// The resource did not exist and could not be created.
    #[error("resource creation failed")]
    Create {
        /// Path of the resource.
        path: PathBuf,
        /// Underlying resource error.
        source: ResourceError,
    },
}

impl PropertyError {
    /// Accessor error carried by this failure, if any.
    #[must_use]
    pub const fn label_error(&self) -> Option<&LabelError> {
        match self {
            Self::Label(err) => Some(err),
            Self::Create { .. } => None,
        }
    }

    /// `true` when the platform returned an unparseable label.
    #[must_use]
    pub const fn is_parse_failure(&self) -> bool {
        matches!(self, Self::Label(err) if err.is_parse_failure())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn property_error_preserves_label_error() {
        let err = PropertyError::from(LabelError::Parse {
            raw: "system_u:object_r".to_string(),
            expected: 3,
            found: 2,
        });
        assert!(err.is_parse_failure());
        assert_eq!(err.to_string(), "label parse failure");
        assert!(err.label_error().is_some());
    }

    #[test]
    fn create_error_exposes_source() {
        let err = PropertyError::Create {
            path: PathBuf::from("/srv/www"),
            source: ResourceError::io("create_file", "/srv/www", io::Error::other("io")),
        };
        assert!(!err.is_parse_failure());
        assert!(err.label_error().is_none());
        assert!(err.source().is_some());
    }
}
