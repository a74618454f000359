//! In-process label store that behaves like the platform accessor.
//!
//! # Design
//! - Stores raw label strings so malformed platform output can be simulated verbatim.
//! - Records every successful field change for before/after assertions.
//! - Failures can be injected per field and for default lookups.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::accessor::{LabelAccessor, LabelQuery};
use crate::error::{LabelError, LabelResult};
use crate::label::{FieldKind, LabelFormat, SecurityLabel, validate_field_value};

/// A field change accepted by the in-memory store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedField {
    /// Path whose label was changed.
    pub path: PathBuf,
    /// Field that was changed.
    pub field: FieldKind,
    /// Value written into the field.
    pub value: String,
}

#[derive(Debug, Default)]
struct MemoryState {
    labels: BTreeMap<PathBuf, String>,
    defaults: BTreeMap<PathBuf, String>,
    applied: Vec<AppliedField>,
    failing_fields: BTreeSet<FieldKind>,
    failing_defaults: bool,
}

/// Label accessor backed by process memory.
#[derive(Debug, Default)]
pub struct InMemoryAccessor {
    format: LabelFormat,
    state: Mutex<MemoryState>,
}

impl InMemoryAccessor {
    /// Create an empty store using `format` to decompose labels.
    #[must_use]
    pub fn new(format: LabelFormat) -> Self {
        Self {
            format,
            state: Mutex::new(MemoryState::default()),
        }
    }

    /// Record `raw` as the current label of `path`; the path now exists.
    pub fn insert_label(&self, path: impl Into<PathBuf>, raw: impl Into<String>) {
        self.state().labels.insert(path.into(), raw.into());
    }

    /// Record `raw` as the policy default for `path`.
    pub fn insert_default(&self, path: impl Into<PathBuf>, raw: impl Into<String>) {
        self.state().defaults.insert(path.into(), raw.into());
    }

    /// Forget `path`; it no longer exists.
    pub fn remove(&self, path: &Path) {
        self.state().labels.remove(path);
    }

    /// Raw label currently stored for `path`.
    #[must_use]
    pub fn raw_label(&self, path: &Path) -> Option<String> {
        self.state().labels.get(path).cloned()
    }

    /// Field changes accepted so far, oldest first.
    #[must_use]
    pub fn applied(&self) -> Vec<AppliedField> {
        self.state().applied.clone()
    }

    /// Make every subsequent change of `field` fail.
    pub fn fail_field(&self, field: FieldKind) {
        self.state().failing_fields.insert(field);
    }

    /// Make every subsequent default lookup fail.
    pub fn fail_defaults(&self) {
        self.state().failing_defaults = true;
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LabelAccessor for InMemoryAccessor {
    fn current_label(&self, path: &Path) -> LabelResult<LabelQuery> {
        let raw = self.state().labels.get(path).cloned();
        match raw {
            Some(raw) => self.format.parse(&raw).map(LabelQuery::Present),
            None => Ok(LabelQuery::Absent),
        }
    }

    fn default_label(&self, path: &Path) -> LabelResult<Option<SecurityLabel>> {
        let state = self.state();
        if state.failing_defaults {
            return Err(LabelError::simulated("query_default_label", path));
        }
        let raw = state.defaults.get(path).cloned();
        drop(state);
        raw.map(|raw| self.format.parse(&raw)).transpose()
    }

    fn apply_field(&self, path: &Path, field: FieldKind, value: &str) -> LabelResult<()> {
        validate_field_value(field, value)?;
        let mut state = self.state();
        if state.failing_fields.contains(&field) {
            return Err(LabelError::simulated("set_label_field", path));
        }
        let Some(raw) = state.labels.get(path) else {
            return Err(LabelError::io(
                "set_label_field",
                path,
                io::Error::from(io::ErrorKind::NotFound),
            ));
        };
        let updated = self.format.parse(raw)?.with_field(field, value)?;
        state.labels.insert(path.to_path_buf(), updated.to_string());
        state.applied.push(AppliedField {
            path: path.to_path_buf(),
            field,
            value: value.to_string(),
        });
        Ok(())
    }
}
