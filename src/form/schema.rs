use std::collections::BTreeMap;

use super::controller::{FormError, FormResult};
use super::validation::{FormModel, Rule};
use super::values::{FieldKey, FieldType, ValueKind};

#[derive(Clone, Debug)]
pub struct FieldSpec {
    key: FieldKey,
    kind: ValueKind,
    label: String,
    description: Option<String>,
    required: bool,
    rules: Vec<Rule>,
}

impl FieldSpec {
    pub fn new(key: FieldKey, kind: ValueKind) -> Self {
        Self {
            key,
            kind,
            label: humanize(key.as_str()),
            description: None,
            required: false,
            rules: Vec::new(),
        }
    }

    pub fn text(key: FieldKey) -> Self {
        Self::new(key, ValueKind::Text)
    }

    pub fn number(key: FieldKey) -> Self {
        Self::new(key, ValueKind::Number)
    }

    pub fn boolean(key: FieldKey) -> Self {
        Self::new(key, ValueKind::Bool)
    }

    pub fn files(key: FieldKey) -> Self {
        Self::new(key, ValueKind::Files)
    }

    pub fn typed<V>(key: FieldKey) -> Self
    where
        V: FieldType,
    {
        Self::new(key, V::KIND)
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Empty values fail with `"<label> is required"` before any rule runs.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn key(&self) -> FieldKey {
        self.key
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn label_text(&self) -> &str {
        &self.label
    }

    pub fn description_text(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}

/// Ordered field registry fixed at controller construction.
#[derive(Clone, Debug, Default)]
pub struct FormSchema {
    fields: Vec<FieldSpec>,
    index: BTreeMap<FieldKey, usize>,
}

impl FormSchema {
    pub fn builder() -> FormSchemaBuilder {
        FormSchemaBuilder::default()
    }

    pub fn field(&self, key: FieldKey) -> Option<&FieldSpec> {
        self.index.get(&key).map(|position| &self.fields[*position])
    }

    pub fn require(&self, key: FieldKey) -> FormResult<&FieldSpec> {
        self.field(key).ok_or(FormError::UnknownField(key))
    }

    pub fn contains(&self, key: FieldKey) -> bool {
        self.index.contains_key(&key)
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn keys(&self) -> impl Iterator<Item = FieldKey> + '_ {
        self.fields.iter().map(FieldSpec::key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[derive(Default)]
pub struct FormSchemaBuilder {
    fields: Vec<FieldSpec>,
    unknown: Vec<FieldKey>,
}

impl FormSchemaBuilder {
    /// Starts from the fields a derived [`FormModel`] declares.
    pub fn from_model<M>() -> Self
    where
        M: FormModel,
    {
        Self {
            fields: M::field_specs(),
            unknown: Vec::new(),
        }
    }

    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    pub fn configure(mut self, key: FieldKey, f: impl FnOnce(FieldSpec) -> FieldSpec) -> Self {
        match self.fields.iter().position(|spec| spec.key == key) {
            Some(position) => {
                let spec = self.fields.remove(position);
                self.fields.insert(position, f(spec));
            }
            None => self.unknown.push(key),
        }
        self
    }

    pub fn build(self) -> FormResult<FormSchema> {
        if let Some(key) = self.unknown.first() {
            return Err(FormError::UnknownField(*key));
        }
        let mut index = BTreeMap::new();
        for (position, spec) in self.fields.iter().enumerate() {
            if index.insert(spec.key, position).is_some() {
                return Err(FormError::DuplicateField(spec.key));
            }
        }
        Ok(FormSchema {
            fields: self.fields,
            index,
        })
    }
}

fn humanize(key: &str) -> String {
    let words = key.replace(['_', '-'], " ");
    let mut chars = words.trim().chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
