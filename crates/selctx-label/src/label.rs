//! Label values, the per-field table, and the positional label format.
//!
//! # Design
//! - All positional knowledge lives in `LabelFormat::parse` and the `Display` impl of
//!   `SecurityLabel`; nothing else splits or joins label strings.
//! - Field metadata is one static table indexed by `FieldKind`.
//! - The optional range component is carried through untouched and never managed.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{LabelError, LabelResult};

/// Separator between label components.
pub const FIELD_SEPARATOR: char = ':';

/// Field of a security label governed by one property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// SELinux user context (position 0).
    User,
    /// SELinux role context (position 1).
    Role,
    /// SELinux type context (position 2).
    Type,
}

/// Static metadata describing how a field is named, addressed and projected.
#[derive(Debug)]
pub struct FieldSpec {
    /// Field the entry describes.
    pub kind: FieldKind,
    /// Short field name used in logs and metrics.
    pub name: &'static str,
    /// Declaration key administrators use for the field.
    pub property: &'static str,
    /// `chcon` flag that changes only this field.
    pub flag: &'static str,
    /// Projection of the field out of a full label.
    pub project: fn(&SecurityLabel) -> &str,
}

static FIELD_TABLE: [FieldSpec; 3] = [
    FieldSpec {
        kind: FieldKind::User,
        name: "user",
        property: "seluser",
        flag: "-u",
        project: SecurityLabel::user,
    },
    FieldSpec {
        kind: FieldKind::Role,
        name: "role",
        property: "selrole",
        flag: "-r",
        project: SecurityLabel::role,
    },
    FieldSpec {
        kind: FieldKind::Type,
        name: "type",
        property: "seltype",
        flag: "-t",
        project: SecurityLabel::type_,
    },
];

impl FieldKind {
    /// Every field, in label order.
    pub const ALL: [Self; 3] = [Self::User, Self::Role, Self::Type];

    /// Position of the field inside a serialised label.
    #[must_use]
    pub const fn position(self) -> usize {
        match self {
            Self::User => 0,
            Self::Role => 1,
            Self::Type => 2,
        }
    }

    /// Table entry for the field.
    #[must_use]
    pub fn spec(self) -> &'static FieldSpec {
        &FIELD_TABLE[self.position()]
    }

    /// Short field name (`user`, `role`, `type`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.spec().name
    }

    /// Declaration key (`seluser`, `selrole`, `seltype`).
    #[must_use]
    pub fn property_name(self) -> &'static str {
        self.spec().property
    }

    /// Flag passed to the label-change tool.
    #[must_use]
    pub fn flag(self) -> &'static str {
        self.spec().flag
    }

    /// Project this field out of `label`.
    #[must_use]
    pub fn project(self, label: &SecurityLabel) -> &str {
        (self.spec().project)(label)
    }
}

impl Display for FieldKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for FieldKind {
    type Err = LabelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        FIELD_TABLE
            .iter()
            .find(|spec| spec.name == value || spec.property == value)
            .map(|spec| spec.kind)
            .ok_or_else(|| LabelError::invalid_field("field", value, "unknown field name"))
    }
}

/// A resource's security label: user, role and type plus an optional preserved range.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SecurityLabel {
    user: String,
    role: String,
    #[serde(rename = "type")]
    type_: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    range: Option<String>,
}

impl SecurityLabel {
    /// Build a label from validated components.
    ///
    /// # Errors
    ///
    /// Returns [`LabelError::InvalidField`] if any component is empty or contains a
    /// separator or whitespace.
    pub fn new(
        user: impl Into<String>,
        role: impl Into<String>,
        type_: impl Into<String>,
    ) -> LabelResult<Self> {
        let label = Self {
            user: user.into(),
            role: role.into(),
            type_: type_.into(),
            range: None,
        };
        for kind in FieldKind::ALL {
            validate_field_value(kind, kind.project(&label))?;
        }
        Ok(label)
    }

    /// Attach a range/level component.
    ///
    /// # Errors
    ///
    /// Returns [`LabelError::InvalidField`] if the range is empty or contains whitespace.
    pub fn with_range(mut self, range: impl Into<String>) -> LabelResult<Self> {
        let range = range.into();
        if range.is_empty() {
            return Err(LabelError::invalid_field("range", &range, "must not be empty"));
        }
        if range.chars().any(char::is_whitespace) {
            return Err(LabelError::invalid_field(
                "range",
                &range,
                "must not contain whitespace",
            ));
        }
        self.range = Some(range);
        Ok(self)
    }

    /// User component.
    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Role component.
    #[must_use]
    pub fn role(&self) -> &str {
        &self.role
    }

    /// Type component.
    #[must_use]
    pub fn type_(&self) -> &str {
        &self.type_
    }

    /// Range component, when the platform format carries one.
    #[must_use]
    pub fn range(&self) -> Option<&str> {
        self.range.as_deref()
    }

    /// Value of one field.
    #[must_use]
    pub fn field(&self, kind: FieldKind) -> &str {
        kind.project(self)
    }

    /// Copy of the label with exactly one field replaced.
    ///
    /// # Errors
    ///
    /// Returns [`LabelError::InvalidField`] if `value` is not a valid field value.
    pub fn with_field(&self, kind: FieldKind, value: &str) -> LabelResult<Self> {
        validate_field_value(kind, value)?;
        let mut next = self.clone();
        let slot = match kind {
            FieldKind::User => &mut next.user,
            FieldKind::Role => &mut next.role,
            FieldKind::Type => &mut next.type_,
        };
        value.clone_into(slot);
        Ok(next)
    }
}

impl Display for SecurityLabel {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "{}{FIELD_SEPARATOR}{}{FIELD_SEPARATOR}{}",
            self.user, self.role, self.type_
        )?;
        if let Some(range) = &self.range {
            write!(formatter, "{FIELD_SEPARATOR}{range}")?;
        }
        Ok(())
    }
}

/// Shape of the label strings a platform reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelFormat {
    /// Exactly `user:role:type`.
    #[default]
    Triple,
    /// `user:role:type:range`, where the range keeps any further colons.
    Mls,
}

impl LabelFormat {
    /// Number of components a label must decompose into.
    #[must_use]
    pub const fn field_count(self) -> usize {
        match self {
            Self::Triple => 3,
            Self::Mls => 4,
        }
    }

    /// Lowercase name used in configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Triple => "triple",
            Self::Mls => "mls",
        }
    }

    /// Decompose a raw platform label.
    ///
    /// Trailing line breaks are ignored. A label with any other component count, or with a
    /// component [`SecurityLabel::new`] would refuse, is rejected whole.
    ///
    /// # Errors
    ///
    /// Returns [`LabelError::Parse`] carrying the raw string when decomposition fails.
    pub fn parse(self, raw: &str) -> LabelResult<SecurityLabel> {
        let trimmed = raw.trim_end_matches(['\n', '\r']);
        let components: Vec<&str> = match self {
            Self::Triple => trimmed.split(FIELD_SEPARATOR).collect(),
            Self::Mls => trimmed.splitn(4, FIELD_SEPARATOR).collect(),
        };
        let expected = self.field_count();
        if components.len() != expected || components.iter().any(|part| part.is_empty()) {
            return Err(LabelError::parse(raw, expected, components.len()));
        }
        let label = SecurityLabel::new(components[0], components[1], components[2])
            .map_err(|_| LabelError::parse(raw, expected, components.len()))?;
        match components.get(3) {
            Some(range) => label
                .with_range(*range)
                .map_err(|_| LabelError::parse(raw, expected, components.len())),
            None => Ok(label),
        }
    }
}

impl Display for LabelFormat {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for LabelFormat {
    type Err = LabelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "triple" => Ok(Self::Triple),
            "mls" => Ok(Self::Mls),
            other => Err(LabelError::invalid_field(
                "label_format",
                other,
                "expected 'triple' or 'mls'",
            )),
        }
    }
}

/// Check a value before it is pushed into a single field.
///
/// # Errors
///
/// Returns [`LabelError::InvalidField`] if the value is empty, contains the separator or
/// contains whitespace.
pub fn validate_field_value(kind: FieldKind, value: &str) -> LabelResult<()> {
    if value.is_empty() {
        return Err(LabelError::invalid_field(
            kind.as_str(),
            value,
            "must not be empty",
        ));
    }
    if value.contains(FIELD_SEPARATOR) {
        return Err(LabelError::invalid_field(
            kind.as_str(),
            value,
            "must not contain ':'",
        ));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(LabelError::invalid_field(
            kind.as_str(),
            value,
            "must not contain whitespace",
        ));
    }
    Ok(())
}
