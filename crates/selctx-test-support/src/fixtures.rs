//! Test fixtures and environment helpers.

use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};
use tempfile::TempDir;

/// Kernel interface that exists whenever SELinux is mounted.
const SELINUXFS_ENFORCE: &str = "/sys/fs/selinux/enforce";

/// Returns `true` if the host exposes a usable SELinux label store.
#[must_use]
pub fn selinux_available() -> bool {
    selinux_available_at(Path::new(SELINUXFS_ENFORCE))
}

fn selinux_available_at(enforce: &Path) -> bool {
    if !enforce.exists() {
        return false;
    }
    Command::new("selinuxenabled")
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Create a scratch directory with a recognisable prefix.
///
/// # Errors
///
/// Returns an error when the temporary directory cannot be created.
pub fn temp_dir() -> Result<TempDir> {
    tempfile::Builder::new()
        .prefix("selctx-")
        .tempdir()
        .context("failed to create selctx scratch directory")
}
