use std::collections::BTreeMap;

use super::values::FieldKey;

/// User-facing reason a field failed validation.
#[derive(Clone, Debug, Eq, PartialEq, Hash, thiserror::Error)]
#[error("{0}")]
pub struct FieldError(String);

impl FieldError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }

    pub fn into_message(self) -> String {
        self.0
    }
}

impl PartialEq<&str> for FieldError {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Field name to message. A key is present iff the field's most recent
/// validation failed; absence does not mean the field passed.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FieldErrorStore {
    errors: BTreeMap<FieldKey, String>,
}

impl FieldErrorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_error(&mut self, field: FieldKey, message: impl Into<String>) {
        self.errors.insert(field, message.into());
    }

    pub fn clear_error(&mut self, field: FieldKey) -> Option<String> {
        self.errors.remove(&field)
    }

    pub fn clear_all(&mut self) {
        self.errors.clear();
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn get(&self, field: FieldKey) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: FieldKey) -> bool {
        self.errors.contains_key(&field)
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldKey, &str)> {
        self.errors
            .iter()
            .map(|(field, message)| (*field, message.as_str()))
    }
}
