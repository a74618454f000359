//! The boundary between label convergence and the platform label store.

use std::path::Path;

use crate::error::LabelResult;
use crate::label::{FieldKind, SecurityLabel};

/// Outcome of asking the platform for a path's current label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelQuery {
    /// The path exists and carries this label.
    Present(SecurityLabel),
    /// The path does not exist.
    Absent,
}

impl LabelQuery {
    /// Label carried by the path, if it exists.
    #[must_use]
    pub const fn label(&self) -> Option<&SecurityLabel> {
        match self {
            Self::Present(label) => Some(label),
            Self::Absent => None,
        }
    }

    /// `true` when the path does not exist.
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

/// Capability to read and change the security label of paths.
///
/// Implementations must change exactly one field per [`LabelAccessor::apply_field`] call and
/// leave the remaining components of the label untouched.
pub trait LabelAccessor {
    /// Fetch and decompose the current label of `path`.
    ///
    /// # Errors
    ///
    /// Returns a parse failure when the label has the wrong shape and a system failure when
    /// the platform query itself fails. A missing path is [`LabelQuery::Absent`], not an error.
    fn current_label(&self, path: &Path) -> LabelResult<LabelQuery>;

    /// Ask the policy what label `path` should carry.
    ///
    /// # Errors
    ///
    /// Returns an error when the policy lookup fails; `Ok(None)` means no applicable default.
    fn default_label(&self, path: &Path) -> LabelResult<Option<SecurityLabel>>;

    /// Change one field of the label on `path` to `value`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is invalid or the platform rejects the change.
    fn apply_field(&self, path: &Path, field: FieldKind, value: &str) -> LabelResult<()>;
}
