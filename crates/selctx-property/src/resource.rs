//! Resource handles consumed by the field properties.
//!
//! # Design
//! - Existence and creation belong to the resource; properties only ask for them.
//! - `ensure_exists` is the single materialisation hook a sync may invoke.

use std::fmt::{self, Display, Formatter};
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ResourceError, ResourceResult};

/// A file-like object whose label is being converged.
pub trait ManagedResource {
    /// Path the platform associates the label with.
    fn path(&self) -> &Path;

    /// `true` when the resource currently exists.
    fn exists(&self) -> bool;

    /// Make sure the resource exists, creating it if the handle allows that.
    ///
    /// # Errors
    ///
    /// Returns an error if the resource is missing and cannot be created.
    fn ensure_exists(&self) -> ResourceResult<()>;
}

/// What a missing resource should be created as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnsureKind {
    /// Never create; a missing resource is an error.
    #[default]
    Present,
    /// Create an empty regular file.
    File,
    /// Create a directory, including parents.
    Directory,
}

impl EnsureKind {
    /// Lowercase name used in declarations.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::File => "file",
            Self::Directory => "directory",
        }
    }
}

impl Display for EnsureKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for EnsureKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "present" => Ok(Self::Present),
            "file" => Ok(Self::File),
            "directory" => Ok(Self::Directory),
            other => Err(format!("unknown ensure kind '{other}'")),
        }
    }
}

/// Filesystem-backed resource handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileResource {
    path: PathBuf,
    ensure: EnsureKind,
}

impl FileResource {
    /// Handle for `path` that may be created as `ensure`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, ensure: EnsureKind) -> Self {
        Self {
            path: path.into(),
            ensure,
        }
    }

    /// Creation policy of the handle.
    #[must_use]
    pub const fn ensure(&self) -> EnsureKind {
        self.ensure
    }
}

impl ManagedResource for FileResource {
    fn path(&self) -> &Path {
        &self.path
    }

    fn exists(&self) -> bool {
        fs::symlink_metadata(&self.path).is_ok()
    }

    fn ensure_exists(&self) -> ResourceResult<()> {
        if self.exists() {
            return Ok(());
        }
        match self.ensure {
            EnsureKind::Present => {
                return Err(ResourceError::Missing {
                    path: self.path.clone(),
                });
            }
            EnsureKind::File => {
                match OpenOptions::new()
                    .write(true)
                    .create_new(true)
                    .open(&self.path)
                {
                    Ok(_) => {}
                    Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {}
                    Err(source) => {
                        return Err(ResourceError::io("create_file", &self.path, source));
                    }
                }
            }
            EnsureKind::Directory => {
                fs::create_dir_all(&self.path)
                    .map_err(|source| ResourceError::io("create_dir", &self.path, source))?;
            }
        }
        info!(
            path = %self.path.display(),
            ensure = self.ensure.as_str(),
            "created managed resource"
        );
        Ok(())
    }
}
