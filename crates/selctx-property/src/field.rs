//! One generic property per label field.
//!
//! # Design
//! - A single type parameterised by `FieldKind`; the field table in `selctx-label` supplies
//!   names, flags and projections.
//! - The declared value is fixed at construction. The platform default is only consulted on
//!   the "nothing declared" branch of `resolve_desired`.
//! - `sync` touches exactly one field through the accessor.

use selctx_label::{FieldKind, LabelAccessor, LabelQuery};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{PropertyError, PropertyResult};
use crate::resource::ManagedResource;

/// Current value of a field on a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "value")]
pub enum FieldState {
    /// The resource exists and the field carries this value.
    Value(String),
    /// The resource does not exist yet.
    Absent,
}

impl FieldState {
    /// Field value, when the resource exists.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        match self {
            Self::Value(value) => Some(value),
            Self::Absent => None,
        }
    }
}

/// Change event reported by a successful sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncEvent {
    /// The resource's label was changed.
    FileChanged,
}

impl SyncEvent {
    /// Event name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FileChanged => "file_changed",
        }
    }
}

/// Desired-state property for one label field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldProperty {
    kind: FieldKind,
    desired: Option<String>,
}

impl FieldProperty {
    /// Property for `kind` with an optional declared value.
    #[must_use]
    pub const fn new(kind: FieldKind, desired: Option<String>) -> Self {
        Self { kind, desired }
    }

    /// The three properties of a label declaration, in label order.
    #[must_use]
    pub fn for_label(
        user: Option<String>,
        role: Option<String>,
        type_: Option<String>,
    ) -> [Self; 3] {
        [
            Self::new(FieldKind::User, user),
            Self::new(FieldKind::Role, role),
            Self::new(FieldKind::Type, type_),
        ]
    }

    /// Field this property governs.
    #[must_use]
    pub const fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Declared value, if the administrator set one.
    #[must_use]
    pub fn desired(&self) -> Option<&str> {
        self.desired.as_deref()
    }

    /// Declaration key of the property (`seluser`, `selrole`, `seltype`).
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.kind.property_name()
    }

    /// Read the field's current value from the resource.
    ///
    /// # Errors
    ///
    /// Propagates accessor parse and system failures unchanged.
    pub fn retrieve<A, R>(&self, accessor: &A, resource: &R) -> PropertyResult<FieldState>
    where
        A: LabelAccessor + ?Sized,
        R: ManagedResource + ?Sized,
    {
        match accessor.current_label(resource.path())? {
            LabelQuery::Absent => Ok(FieldState::Absent),
            LabelQuery::Present(label) => Ok(FieldState::Value(label.field(self.kind).to_string())),
        }
    }

    /// Ask the platform policy what this field should be.
    ///
    /// Lookup failures and missing defaults both yield `None`.
    #[must_use]
    pub fn compute_default<A, R>(&self, accessor: &A, resource: &R) -> Option<String>
    where
        A: LabelAccessor + ?Sized,
        R: ManagedResource + ?Sized,
    {
        let path = resource.path();
        match accessor.default_label(path) {
            Ok(Some(label)) => {
                let value = label.field(self.kind).to_string();
                debug!(
                    property = self.name(),
                    path = %path.display(),
                    "found {} default '{value}' for {}",
                    self.name(),
                    path.display()
                );
                Some(value)
            }
            Ok(None) => None,
            Err(err) => {
                warn!(
                    property = self.name(),
                    path = %path.display(),
                    error = %err,
                    "default label lookup failed"
                );
                None
            }
        }
    }

    /// Declared value, or the platform default when nothing was declared.
    #[must_use]
    pub fn resolve_desired<A, R>(&self, accessor: &A, resource: &R) -> Option<String>
    where
        A: LabelAccessor + ?Sized,
        R: ManagedResource + ?Sized,
    {
        match &self.desired {
            Some(value) => Some(value.clone()),
            None => self.compute_default(accessor, resource),
        }
    }

    /// Push `desired` into this field, creating the resource first if it is missing.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::Create`] if the resource cannot be materialised (no label
    /// change is attempted) and [`PropertyError::Label`] if the platform rejects the change.
    pub fn sync<A, R>(&self, accessor: &A, resource: &R, desired: &str) -> PropertyResult<SyncEvent>
    where
        A: LabelAccessor + ?Sized,
        R: ManagedResource + ?Sized,
    {
        if !resource.exists() {
            resource
                .ensure_exists()
                .map_err(|source| PropertyError::Create {
                    path: resource.path().to_path_buf(),
                    source,
                })?;
        }
        accessor.apply_field(resource.path(), self.kind, desired)?;
        Ok(SyncEvent::FileChanged)
    }
}
