use super::controller::{FormController, FormResult, read_lock};
use super::values::{FieldKey, FieldValue};

/// Everything a renderer needs to draw one field.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldView {
    pub key: FieldKey,
    pub label: String,
    pub description: Option<String>,
    pub required: bool,
    pub value: FieldValue,
    pub touched: bool,
    pub dirty: bool,
    pub error: Option<String>,
}

impl FormController {
    pub fn field_view(&self, field: FieldKey) -> FormResult<FieldView> {
        let spec = self.schema.require(field)?;
        let state = read_lock(&self.state, "building field view")?;
        let touched = state.touched.contains(&field);
        let error = display_error(
            touched,
            state.submission.attempts,
            state.errors.get(field),
        );
        Ok(FieldView {
            key: field,
            label: spec.label_text().to_owned(),
            description: spec.description_text().map(str::to_owned),
            required: spec.is_required(),
            value: state
                .values
                .get(&field)
                .cloned()
                .unwrap_or_else(|| FieldValue::default_for(spec.kind())),
            touched,
            dirty: state.dirty.contains(&field),
            error,
        })
    }

    /// The field's error, held back until the field was touched or a submit
    /// was attempted.
    pub fn field_error_for_display(&self, field: FieldKey) -> FormResult<Option<String>> {
        self.schema.require(field)?;
        let state = read_lock(&self.state, "reading display error message")?;
        Ok(display_error(
            state.touched.contains(&field),
            state.submission.attempts,
            state.errors.get(field),
        ))
    }
}

fn display_error(touched: bool, attempts: u32, error: Option<&str>) -> Option<String> {
    if !touched && attempts == 0 {
        return None;
    }
    error.map(str::to_owned)
}
