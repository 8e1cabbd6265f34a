use thiserror::Error;

use super::item::ValueKind;

/// A body item that could not be applied to its field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("field `{field}`: cannot read {value:?} as {kind}: {reason}")]
pub struct BindError {
    pub field: String,
    pub value: String,
    pub kind: ValueKind,
    pub reason: String,
}

/// All failures of one bind pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{count} body item(s) failed to bind", count = .errors.len())]
pub struct BindErrors {
    errors: Vec<BindError>,
}

impl BindErrors {
    pub(super) fn push(&mut self, error: BindError) {
        self.errors.push(error);
    }

    pub(super) fn into_result(self) -> Result<(), Self> {
        if self.errors.is_empty() { Ok(()) } else { Err(self) }
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Last failure recorded for `name`.
    pub fn field(&self, name: &str) -> Option<&BindError> {
        self.errors.iter().rev().find(|e| e.field == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BindError> {
        self.errors.iter()
    }

    pub(crate) fn extend(&mut self, other: Self) {
        self.errors.extend(other.errors);
    }
}

impl<'a> IntoIterator for &'a BindErrors {
    type Item = &'a BindError;
    type IntoIter = std::slice::Iter<'a, BindError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}
