use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use rust_decimal::Decimal;

use super::controller::{FormError, FormResult};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FieldKey(&'static str);

impl FieldKey {
    pub const fn new(value: &'static str) -> Self {
        Self(value)
    }

    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl Display for FieldKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ValueKind {
    Text,
    Number,
    Bool,
    Files,
}

impl Display for ValueKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ValueKind::Text => "text",
            ValueKind::Number => "number",
            ValueKind::Bool => "boolean",
            ValueKind::Files => "file list",
        })
    }
}

/// Declared metadata of a picked file. Content never reaches the form core.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct FileInfo {
    pub name: String,
    pub mime_type: String,
    pub size_bytes: u64,
}

impl FileInfo {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size_bytes,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(Decimal),
    Bool(bool),
    Files(Vec<FileInfo>),
}

impl FieldValue {
    /// Value a field of `kind` starts with when no default was supplied.
    pub fn default_for(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Text => FieldValue::Text(String::new()),
            ValueKind::Number => FieldValue::Number(Decimal::ZERO),
            ValueKind::Bool => FieldValue::Bool(false),
            ValueKind::Files => FieldValue::Files(Vec::new()),
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            FieldValue::Text(_) => ValueKind::Text,
            FieldValue::Number(_) => ValueKind::Number,
            FieldValue::Bool(_) => ValueKind::Bool,
            FieldValue::Files(_) => ValueKind::Files,
        }
    }

    /// Only whitespace-only text and empty file lists are empty. `0` and
    /// `false` are real answers.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(text) => text.trim().is_empty(),
            FieldValue::Files(files) => files.is_empty(),
            FieldValue::Number(_) | FieldValue::Bool(_) => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            FieldValue::Number(number) => Some(*number),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    pub fn as_files(&self) -> Option<&[FileInfo]> {
        match self {
            FieldValue::Files(files) => Some(files),
            _ => None,
        }
    }

    /// Textual form used by string validators.
    pub fn to_text(&self) -> Cow<'_, str> {
        match self {
            FieldValue::Text(text) => Cow::Borrowed(text),
            FieldValue::Number(number) => Cow::Owned(number.to_string()),
            FieldValue::Bool(flag) => Cow::Borrowed(if *flag { "true" } else { "false" }),
            FieldValue::Files(files) => Cow::Owned(
                files
                    .iter()
                    .map(|file| file.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
        }
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_owned())
    }
}

impl From<Decimal> for FieldValue {
    fn from(value: Decimal) -> Self {
        FieldValue::Number(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<Vec<FileInfo>> for FieldValue {
    fn from(value: Vec<FileInfo>) -> Self {
        FieldValue::Files(value)
    }
}

impl From<FileInfo> for FieldValue {
    fn from(value: FileInfo) -> Self {
        FieldValue::Files(vec![value])
    }
}

pub type FormValues = BTreeMap<FieldKey, FieldValue>;

/// Rust types that map onto exactly one [`ValueKind`]. Used by the
/// `FormModel` derive to move typed models in and out of [`FormValues`].
pub trait FieldType: Sized {
    const KIND: ValueKind;

    fn from_field_value(value: &FieldValue) -> Option<Self>;
    fn into_field_value(self) -> FieldValue;
}

impl FieldType for String {
    const KIND: ValueKind = ValueKind::Text;

    fn from_field_value(value: &FieldValue) -> Option<Self> {
        value.as_text().map(str::to_owned)
    }

    fn into_field_value(self) -> FieldValue {
        FieldValue::Text(self)
    }
}

impl FieldType for Decimal {
    const KIND: ValueKind = ValueKind::Number;

    fn from_field_value(value: &FieldValue) -> Option<Self> {
        value.as_number()
    }

    fn into_field_value(self) -> FieldValue {
        FieldValue::Number(self)
    }
}

impl FieldType for bool {
    const KIND: ValueKind = ValueKind::Bool;

    fn from_field_value(value: &FieldValue) -> Option<Self> {
        value.as_bool()
    }

    fn into_field_value(self) -> FieldValue {
        FieldValue::Bool(self)
    }
}

impl FieldType for Vec<FileInfo> {
    const KIND: ValueKind = ValueKind::Files;

    fn from_field_value(value: &FieldValue) -> Option<Self> {
        value.as_files().map(<[FileInfo]>::to_vec)
    }

    fn into_field_value(self) -> FieldValue {
        FieldValue::Files(self)
    }
}

pub fn read_field<V>(values: &FormValues, key: FieldKey) -> FormResult<V>
where
    V: FieldType,
{
    let value = values.get(&key).ok_or(FormError::UnknownField(key))?;
    V::from_field_value(value).ok_or(FormError::KindMismatch {
        field: key,
        expected: V::KIND,
        found: value.kind(),
    })
}
