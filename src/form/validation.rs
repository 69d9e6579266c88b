use std::any::Any;
use std::fmt::{Debug, Formatter};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use chrono::NaiveDate;

use super::controller::FormResult;
use super::errors::FieldError;
use super::schema::FieldSpec;
use super::values::{FieldKey, FieldValue, FormValues};
use crate::diagnostics::DiagnosticSink;
use crate::validators::{
    self, Clock, DateOptions, NumberOptions, validate_credit_card, validate_date,
    validate_date_range, validate_email, validate_file_size, validate_file_type, validate_lei,
    validate_password, validate_phone,
};

/// Read-only view of the form a rule runs against.
#[derive(Clone, Copy)]
pub struct RuleContext<'a> {
    values: &'a FormValues,
    clock: &'a dyn Clock,
}

impl<'a> RuleContext<'a> {
    pub fn new(values: &'a FormValues, clock: &'a dyn Clock) -> Self {
        Self { values, clock }
    }

    pub fn values(&self) -> &'a FormValues {
        self.values
    }

    pub fn value(&self, key: FieldKey) -> Option<&'a FieldValue> {
        self.values.get(&key)
    }

    pub fn clock(&self) -> &'a dyn Clock {
        self.clock
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }
}

pub trait FieldValidator: Send + Sync {
    fn validate(&self, value: &FieldValue, cx: &RuleContext<'_>) -> Result<(), FieldError>;
}

impl<F> FieldValidator for F
where
    F: Fn(&FieldValue, &RuleContext<'_>) -> Result<(), FieldError> + Send + Sync,
{
    fn validate(&self, value: &FieldValue, cx: &RuleContext<'_>) -> Result<(), FieldError> {
        (self)(value, cx)
    }
}

pub trait FormModel: Clone + Send + Sync + 'static {
    type Fields;

    fn fields() -> Self::Fields;
    fn field_specs() -> Vec<FieldSpec>;
    fn into_values(self) -> FormValues;
    fn from_values(values: &FormValues) -> FormResult<Self>;
}

#[derive(Clone)]
pub struct Rule {
    validator: Arc<dyn FieldValidator>,
}

impl Debug for Rule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("Rule(..)")
    }
}

impl Rule {
    pub fn new<V>(validator: V) -> Self
    where
        V: FieldValidator + 'static,
    {
        Self {
            validator: Arc::new(validator),
        }
    }

    pub fn from_fn<F>(check: F) -> Self
    where
        F: Fn(&FieldValue, &RuleContext<'_>) -> Result<(), FieldError> + Send + Sync + 'static,
    {
        Self::new(check)
    }

    pub fn check(&self, value: &FieldValue, cx: &RuleContext<'_>) -> Result<(), FieldError> {
        self.validator.validate(value, cx)
    }

    pub fn required(label: impl Into<String>) -> Self {
        let label = label.into();
        Self::from_fn(move |value, _| {
            if value.is_empty() {
                Err(FieldError::new(format!("{label} is required")))
            } else {
                Ok(())
            }
        })
    }

    /// Format rules pass empty values; `FieldSpec::required` decides whether
    /// a blank field is allowed.
    pub fn email() -> Self {
        Self::unless_empty(validate_email)
    }

    pub fn phone() -> Self {
        Self::unless_empty(validate_phone)
    }

    pub fn password() -> Self {
        Self::unless_empty(validate_password)
    }

    fn unless_empty(check: fn(&str) -> Result<(), FieldError>) -> Self {
        Self::from_fn(move |value, _| {
            if value.is_empty() {
                return Ok(());
            }
            check(&value.to_text())
        })
    }

    pub fn number(options: NumberOptions) -> Self {
        Self::from_fn(move |value, _| match value {
            FieldValue::Number(number) => validators::check_number(*number, &options),
            other => validators::validate_number(&other.to_text(), &options),
        })
    }

    pub fn date(options: DateOptions) -> Self {
        Self::from_fn(move |value, cx| validate_date(&value.to_text(), &options, cx.clock()))
    }

    /// End-of-range rule: the field holding this rule must not precede `start`.
    pub fn ends_after(start: FieldKey) -> Self {
        Self::from_fn(move |value, cx| {
            let start = cx.value(start).map(FieldValue::to_text).unwrap_or_default();
            validate_date_range(&start, &value.to_text())
        })
    }

    pub fn credit_card() -> Self {
        Self::from_fn(|value, _| validate_credit_card(&value.to_text()))
    }

    pub fn lei() -> Self {
        Self::from_fn(|value, _| validate_lei(&value.to_text()))
    }

    pub fn file_size(max_size_mb: f64) -> Self {
        debug_assert!(
            max_size_mb.is_finite() && max_size_mb >= 0.0,
            "max_size_mb must be finite and non-negative, got {max_size_mb}"
        );
        Self::from_fn(move |value, _| {
            value
                .as_files()
                .unwrap_or_default()
                .iter()
                .try_for_each(|file| validate_file_size(file, max_size_mb))
        })
    }

    pub fn file_type<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let allowed = allowed.into_iter().map(Into::into).collect::<Vec<String>>();
        Self::from_fn(move |value, _| {
            value
                .as_files()
                .unwrap_or_default()
                .iter()
                .try_for_each(|file| validate_file_type(file, allowed.as_slice()))
        })
    }

    pub fn matches(other: FieldKey, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::from_fn(move |value, cx| {
            if cx.value(other) == Some(value) {
                Ok(())
            } else {
                Err(FieldError::new(message.clone()))
            }
        })
    }
}

/// Runs `rule`, turning a panic inside it into `"<label> validation failed"`
/// and reporting the panic to `diagnostics`.
pub fn run_guarded(
    field: FieldKey,
    label: &str,
    rule: &Rule,
    value: &FieldValue,
    cx: &RuleContext<'_>,
    diagnostics: &dyn DiagnosticSink,
) -> Result<(), FieldError> {
    panic::catch_unwind(AssertUnwindSafe(|| rule.check(value, cx))).unwrap_or_else(|payload| {
        diagnostics.validator_fault(field, &panic_detail(payload.as_ref()));
        Err(FieldError::new(format!("{label} validation failed")))
    })
}

fn panic_detail(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "validator panicked".to_owned()
    }
}
