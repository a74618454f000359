//! Typed settings and label declarations.
//!
//! # Design
//! - Every section has serde defaults so an empty document is a valid manifest.
//! - Declarations mirror the property names administrators write (`seluser`, `selrole`,
//!   `seltype`) and convert into field properties plus a resource handle.

use std::path::PathBuf;

use selctx_label::{FieldKind, LabelFormat, ToolSet};
use selctx_property::{EnsureKind, FieldProperty, FileResource};
use selctx_telemetry::{DEFAULT_LOG_LEVEL, LogFormat};
use serde::{Deserialize, Serialize};

/// Logging section of the settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSettings {
    /// Level directive used when `RUST_LOG` is unset.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            format: LogFormat::infer(),
        }
    }
}

/// Process-wide settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Shape of labels reported by the platform.
    pub label_format: LabelFormat,
    /// Tools used to query and change labels.
    pub tools: ToolSet,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

/// Desired label fields for one path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LabelDeclaration {
    /// Absolute path of the managed resource.
    pub path: PathBuf,
    /// Declared user field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seluser: Option<String>,
    /// Declared role field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selrole: Option<String>,
    /// Declared type field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seltype: Option<String>,
    /// What a missing resource is created as.
    #[serde(default)]
    pub ensure: EnsureKind,
}

impl LabelDeclaration {
    /// Declaration for `path` with every field left to the platform default.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            seluser: None,
            selrole: None,
            seltype: None,
            ensure: EnsureKind::default(),
        }
    }

    /// Declare `value` for `kind`.
    #[must_use]
    pub fn with_field(mut self, kind: FieldKind, value: Option<String>) -> Self {
        *self.slot(kind) = value;
        self
    }

    /// Set the creation policy.
    #[must_use]
    pub const fn with_ensure(mut self, ensure: EnsureKind) -> Self {
        self.ensure = ensure;
        self
    }

    /// Declared value for `kind`.
    #[must_use]
    pub fn declared(&self, kind: FieldKind) -> Option<&str> {
        match kind {
            FieldKind::User => self.seluser.as_deref(),
            FieldKind::Role => self.selrole.as_deref(),
            FieldKind::Type => self.seltype.as_deref(),
        }
    }

    /// Field properties for this declaration, in label order.
    #[must_use]
    pub fn properties(&self) -> [FieldProperty; 3] {
        FieldProperty::for_label(
            self.seluser.clone(),
            self.selrole.clone(),
            self.seltype.clone(),
        )
    }

    /// Filesystem handle for the declared path.
    #[must_use]
    pub fn resource(&self) -> FileResource {
        FileResource::new(self.path.clone(), self.ensure)
    }

    const fn slot(&mut self, kind: FieldKind) -> &mut Option<String> {
        match kind {
            FieldKind::User => &mut self.seluser,
            FieldKind::Role => &mut self.selrole,
            FieldKind::Type => &mut self.seltype,
        }
    }
}

/// Settings plus the declarations to converge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Manifest {
    /// Process-wide settings.
    pub settings: Settings,
    /// Declared resources, converged in order.
    pub resources: Vec<LabelDeclaration>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use selctx_property::ManagedResource;
    use std::error::Error;
    use std::path::Path;

    #[test]
    fn empty_document_uses_defaults() -> Result<(), Box<dyn Error>> {
        let manifest: Manifest = serde_json::from_str("{}")?;
        assert_eq!(manifest.settings.label_format, LabelFormat::Triple);
        assert_eq!(manifest.settings.tools, ToolSet::default());
        assert_eq!(manifest.settings.logging.level, "info");
        assert!(manifest.resources.is_empty());
        Ok(())
    }

    #[test]
    fn declarations_decode_property_names() -> Result<(), Box<dyn Error>> {
        let declaration: LabelDeclaration = serde_json::from_str(
            r#"{"path": "/var/www/html", "seltype": "httpd_sys_content_t", "ensure": "directory"}"#,
        )?;
        assert_eq!(declaration.declared(FieldKind::Type), Some("httpd_sys_content_t"));
        assert_eq!(declaration.declared(FieldKind::User), None);
        assert_eq!(declaration.ensure, EnsureKind::Directory);

        let resource = declaration.resource();
        assert_eq!(resource.path(), Path::new("/var/www/html"));
        assert_eq!(resource.ensure(), EnsureKind::Directory);
        Ok(())
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let decoded = serde_json::from_str::<LabelDeclaration>(
            r#"{"path": "/srv", "selrange": "s0"}"#,
        );
        assert!(decoded.is_err());
    }

    #[test]
    fn builder_sets_fields_and_properties() {
        let declaration = LabelDeclaration::new("/srv/www")
            .with_field(FieldKind::Role, Some("object_r".into()))
            .with_field(FieldKind::Type, Some("httpd_sys_content_t".into()))
            .with_ensure(EnsureKind::File);
        let properties = declaration.properties();
        let declared: Vec<Option<&str>> = properties
            .iter()
            .map(FieldProperty::desired)
            .collect();
        assert_eq!(
            declared,
            vec![None, Some("object_r"), Some("httpd_sys_content_t")]
        );
        assert_eq!(declaration.ensure, EnsureKind::File);
    }
}
