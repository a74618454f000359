//! Validation helpers for settings and declarations.

use std::collections::BTreeSet;

use selctx_label::label::validate_field_value;
use selctx_label::{FieldKind, LabelError, ToolCommand};
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::model::{LabelDeclaration, Manifest, Settings};

/// Validate settings and every declaration of a manifest.
///
/// # Errors
///
/// Returns the first [`ConfigError::InvalidField`] encountered.
pub fn validate_manifest(manifest: &Manifest) -> ConfigResult<()> {
    validate_settings(&manifest.settings)?;
    let mut seen = BTreeSet::new();
    for (index, declaration) in manifest.resources.iter().enumerate() {
        let section = format!("resources[{index}]");
        validate_declaration(&section, declaration)?;
        if !seen.insert(declaration.path.as_path()) {
            return Err(ConfigError::invalid_field(
                section,
                "path",
                Some(&declaration.path.display().to_string()),
                "duplicate path",
            ));
        }
    }
    debug!(resources = manifest.resources.len(), "manifest validated");
    Ok(())
}

/// Validate the settings section.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] for empty tool commands or an empty log level.
pub fn validate_settings(settings: &Settings) -> ConfigResult<()> {
    validate_tool("query", &settings.tools.query)?;
    validate_tool("default", &settings.tools.default)?;
    validate_tool("apply", &settings.tools.apply)?;
    if settings.logging.level.trim().is_empty() {
        return Err(ConfigError::invalid_field(
            "logging",
            "level",
            Some(&settings.logging.level),
            "must not be empty",
        ));
    }
    Ok(())
}

#[allow(clippy::redundant_pub_crate)]
pub(crate) fn validate_declaration(
    section: &str,
    declaration: &LabelDeclaration,
) -> ConfigResult<()> {
    if !declaration.path.is_absolute() {
        return Err(ConfigError::invalid_field(
            section,
            "path",
            Some(&declaration.path.display().to_string()),
            "must be absolute",
        ));
    }
    for kind in FieldKind::ALL {
        if let Some(value) = declaration.declared(kind) {
            validate_field_value(kind, value).map_err(|err| {
                ConfigError::invalid_field(section, kind.property_name(), Some(value), reason(&err))
            })?;
        }
    }
    Ok(())
}

fn validate_tool(field: &str, tool: &ToolCommand) -> ConfigResult<()> {
    if tool.is_empty() {
        return Err(ConfigError::invalid_field(
            "tools",
            field,
            None,
            "must name a program",
        ));
    }
    Ok(())
}

const fn reason(err: &LabelError) -> &'static str {
    match err {
        LabelError::InvalidField { reason, .. } => *reason,
        _ => "invalid label field",
    }
}
