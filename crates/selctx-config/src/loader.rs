//! Manifest loading and environment overrides.
//!
//! # Design
//! - Manifests are plain JSON files; decoding and validation happen in one call.
//! - Environment lookups are injected so overrides can be tested without touching the process
//!   environment.

use std::env;
use std::fs;
use std::path::Path;

use selctx_label::LabelFormat;
use selctx_telemetry::LogFormat;
use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult};
use crate::model::{Manifest, Settings};
use crate::validate::validate_manifest;

/// Overrides `settings.label_format`.
pub const ENV_LABEL_FORMAT: &str = "SELCTX_LABEL_FORMAT";
/// Overrides `settings.logging.level`.
pub const ENV_LOG_LEVEL: &str = "SELCTX_LOG_LEVEL";
/// Overrides `settings.logging.format`.
pub const ENV_LOG_FORMAT: &str = "SELCTX_LOG_FORMAT";

/// Read, decode and validate the manifest at `path`.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read, [`ConfigError::Json`] if it is not a
/// valid manifest document and [`ConfigError::InvalidField`] if validation fails.
pub fn load_manifest(path: &Path) -> ConfigResult<Manifest> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        operation: "read_manifest",
        path: path.to_path_buf(),
        source,
    })?;
    let manifest: Manifest = serde_json::from_str(&raw).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    validate_manifest(&manifest)?;
    info!(
        path = %path.display(),
        resources = manifest.resources.len(),
        "loaded manifest"
    );
    Ok(manifest)
}

/// Apply `SELCTX_*` overrides using `lookup` to read variables.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnv`] when a variable holds an unusable value; `settings` is
/// left partially updated in that case.
pub fn apply_env_overrides<F>(settings: &mut Settings, lookup: F) -> ConfigResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup(ENV_LABEL_FORMAT) {
        settings.label_format =
            value
                .trim()
                .parse::<LabelFormat>()
                .map_err(|_| ConfigError::InvalidEnv {
                    variable: ENV_LABEL_FORMAT,
                    value: value.clone(),
                    reason: "expected 'triple' or 'mls'",
                })?;
        debug!(variable = ENV_LABEL_FORMAT, value = %value, "applied environment override");
    }
    if let Some(value) = lookup(ENV_LOG_LEVEL) {
        let level = value.trim();
        if level.is_empty() {
            return Err(ConfigError::InvalidEnv {
                variable: ENV_LOG_LEVEL,
                value,
                reason: "must not be empty",
            });
        }
        settings.logging.level = level.to_string();
    }
    if let Some(value) = lookup(ENV_LOG_FORMAT) {
        settings.logging.format =
            value
                .trim()
                .parse::<LogFormat>()
                .map_err(|_| ConfigError::InvalidEnv {
                    variable: ENV_LOG_FORMAT,
                    value: value.clone(),
                    reason: "expected 'json' or 'pretty'",
                })?;
    }
    Ok(())
}

/// Apply `SELCTX_*` overrides from the process environment.
///
/// # Errors
///
/// See [`apply_env_overrides`].
pub fn apply_process_env(settings: &mut Settings) -> ConfigResult<()> {
    apply_env_overrides(settings, |name| env::var(name).ok())
}
