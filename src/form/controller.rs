use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::errors::{FieldError, FieldErrorStore};
use super::schema::{FieldSpec, FormSchema};
use super::validation::{FormModel, RuleContext, run_guarded};
use super::values::{FieldKey, FieldValue, FormValues, ValueKind};
use crate::diagnostics::{DiagnosticSink, TracingDiagnostics};
use crate::validators::{Clock, SystemClock};

static FORM_ID_ALLOCATOR: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FormId(pub u64);

impl FormId {
    pub fn next() -> Self {
        Self(FORM_ID_ALLOCATOR.fetch_add(1, Ordering::SeqCst))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SubmitStatus {
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ValidationMode {
    OnBlur,
    #[default]
    OnSubmit,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct FormOptions {
    pub validation_mode: ValidationMode,
    pub reset_after_submit: bool,
}

pub type SubmitError = Arc<dyn Error + Send + Sync>;

#[derive(Clone, Debug)]
pub enum SubmitFailure {
    Invalid { error_count: usize },
    Rejected(SubmitError),
    /// The submit future was dropped, or failed internally, before settling.
    Abandoned,
}

impl Display for SubmitFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmitFailure::Invalid { error_count } => {
                write!(f, "form has {error_count} invalid field(s)")
            }
            SubmitFailure::Rejected(error) => write!(f, "submit rejected: {error}"),
            SubmitFailure::Abandoned => f.write_str("submit abandoned before it settled"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct SubmissionState {
    pub status: SubmitStatus,
    pub last_error: Option<SubmitFailure>,
    pub attempts: u32,
}

impl Default for SubmissionState {
    fn default() -> Self {
        Self {
            status: SubmitStatus::Idle,
            last_error: None,
            attempts: 0,
        }
    }
}

#[derive(Clone, Debug)]
pub enum SubmitOutcome {
    Submitted,
    Invalid,
    Rejected(SubmitError),
    /// Another submit was still outstanding; the callback was not invoked.
    Ignored,
    /// The form was disposed while the callback was outstanding.
    Discarded,
}

impl SubmitOutcome {
    pub fn is_submitted(&self) -> bool {
        matches!(self, SubmitOutcome::Submitted)
    }
}

#[derive(Clone, Debug)]
pub struct FormSnapshot {
    pub values: FormValues,
    pub errors: FieldErrorStore,
    pub touched: BTreeSet<FieldKey>,
    pub dirty: BTreeSet<FieldKey>,
    pub submission: SubmissionState,
    pub is_dirty: bool,
    pub is_valid: bool,
}

#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum FormError {
    #[error("field `{0}` is not registered in the form schema")]
    UnknownField(FieldKey),
    #[error("field `{field}` holds {expected} values, got {found}")]
    KindMismatch {
        field: FieldKey,
        expected: ValueKind,
        found: ValueKind,
    },
    #[error("field `{0}` is registered more than once")]
    DuplicateField(FieldKey),
    #[error("invalid submit state transition: {from:?} -> {to:?}")]
    InvalidStateTransition { from: SubmitStatus, to: SubmitStatus },
    #[error("form state lock poisoned while {0}")]
    StatePoisoned(&'static str),
    #[error("form has been disposed")]
    Disposed,
    #[error("failed to load draft: {0}")]
    DraftLoadFailed(String),
    #[error("failed to save draft: {0}")]
    DraftSaveFailed(String),
    #[error("failed to clear draft: {0}")]
    DraftClearFailed(String),
}

pub type FormResult<T> = Result<T, FormError>;

type SuccessHook = Arc<dyn Fn(&FormValues) + Send + Sync>;
type ErrorHook = Arc<dyn Fn(&(dyn Error + Send + Sync)) + Send + Sync>;

pub(super) struct FormState {
    pub(super) defaults: FormValues,
    pub(super) values: FormValues,
    pub(super) errors: FieldErrorStore,
    pub(super) touched: BTreeSet<FieldKey>,
    pub(super) dirty: BTreeSet<FieldKey>,
    pub(super) submission: SubmissionState,
}

impl FormState {
    pub(super) fn refresh_dirty(&mut self, key: FieldKey) -> bool {
        let is_dirty = self.values.get(&key) != self.defaults.get(&key);
        if is_dirty {
            self.dirty.insert(key);
        } else {
            self.dirty.remove(&key);
        }
        is_dirty
    }
}

#[derive(Clone)]
pub struct FormController {
    pub(super) id: FormId,
    pub(super) options: FormOptions,
    pub(super) schema: Arc<FormSchema>,
    pub(super) state: Arc<RwLock<FormState>>,
    alive: Arc<AtomicBool>,
    dependencies: Arc<RwLock<BTreeMap<FieldKey, BTreeSet<FieldKey>>>>,
    success_hooks: Arc<RwLock<Vec<SuccessHook>>>,
    error_hooks: Arc<RwLock<Vec<ErrorHook>>>,
    diagnostics: Arc<dyn DiagnosticSink>,
    clock: Arc<dyn Clock>,
}

impl FormController {
    /// Fields missing from `defaults` start at their kind's empty value.
    pub fn new(schema: FormSchema, defaults: FormValues, options: FormOptions) -> FormResult<Self> {
        for (key, value) in &defaults {
            check_kind(schema.require(*key)?, value)?;
        }
        let defaults = schema
            .fields()
            .iter()
            .map(|spec| {
                let value = defaults
                    .get(&spec.key())
                    .cloned()
                    .unwrap_or_else(|| FieldValue::default_for(spec.kind()));
                (spec.key(), value)
            })
            .collect::<FormValues>();

        Ok(Self {
            id: FormId::next(),
            options,
            schema: Arc::new(schema),
            state: Arc::new(RwLock::new(FormState {
                values: defaults.clone(),
                defaults,
                errors: FieldErrorStore::new(),
                touched: BTreeSet::new(),
                dirty: BTreeSet::new(),
                submission: SubmissionState::default(),
            })),
            alive: Arc::new(AtomicBool::new(true)),
            dependencies: Arc::new(RwLock::new(BTreeMap::new())),
            success_hooks: Arc::new(RwLock::new(Vec::new())),
            error_hooks: Arc::new(RwLock::new(Vec::new())),
            diagnostics: Arc::new(TracingDiagnostics),
            clock: Arc::new(SystemClock),
        })
    }

    pub fn for_model<M>(schema: FormSchema, model: M, options: FormOptions) -> FormResult<Self>
    where
        M: FormModel,
    {
        Self::new(schema, model.into_values(), options)
    }

    pub fn with_diagnostics(mut self, diagnostics: impl DiagnosticSink + 'static) -> Self {
        self.diagnostics = Arc::new(diagnostics);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Reuses a known id so drafts saved by an earlier mount can be found.
    pub fn with_form_id(mut self, id: FormId) -> Self {
        self.id = id;
        self
    }

    pub fn form_id(&self) -> FormId {
        self.id
    }

    pub fn options(&self) -> FormOptions {
        self.options
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn dispose(&self) {
        if self.alive.swap(false, Ordering::SeqCst) {
            tracing::debug!(form_id = self.id.0, "form disposed");
        }
    }

    pub fn is_disposed(&self) -> bool {
        !self.alive.load(Ordering::SeqCst)
    }

    pub fn register_dependency(&self, source: FieldKey, dependent: FieldKey) -> FormResult<()> {
        self.ensure_alive()?;
        self.schema.require(source)?;
        self.schema.require(dependent)?;
        let mut dependencies = write_lock(&self.dependencies, "registering dependency")?;
        dependencies.entry(source).or_default().insert(dependent);
        Ok(())
    }

    pub fn on_submit_success(
        &self,
        hook: impl Fn(&FormValues) + Send + Sync + 'static,
    ) -> FormResult<()> {
        write_lock(&self.success_hooks, "registering success hook")?.push(Arc::new(hook));
        Ok(())
    }

    pub fn on_submit_error(
        &self,
        hook: impl Fn(&(dyn Error + Send + Sync)) + Send + Sync + 'static,
    ) -> FormResult<()> {
        write_lock(&self.error_hooks, "registering error hook")?.push(Arc::new(hook));
        Ok(())
    }

    pub fn set_field_value(&self, field: FieldKey, value: impl Into<FieldValue>) -> FormResult<()> {
        self.ensure_alive()?;
        let value = value.into();
        check_kind(self.schema.require(field)?, &value)?;

        let mut state = write_lock(&self.state, "setting field value")?;
        state.values.insert(field, value);
        state.refresh_dirty(field);
        state.errors.clear_error(field);
        if self.options.reset_after_submit
            && matches!(
                state.submission.status,
                SubmitStatus::Succeeded | SubmitStatus::Failed
            )
        {
            transition_submit_status(&mut state, SubmitStatus::Idle)?;
            state.submission.last_error = None;
        }
        Ok(())
    }

    /// Marks the field as interacted with. Under [`ValidationMode::OnBlur`]
    /// the field and its dependents are validated.
    pub fn touch(&self, field: FieldKey) -> FormResult<()> {
        self.ensure_alive()?;
        self.schema.require(field)?;
        write_lock(&self.state, "touching field")?.touched.insert(field);

        if self.options.validation_mode == ValidationMode::OnBlur {
            self.validate_field(field)?;
            self.revalidate_dependents(field)?;
        }
        Ok(())
    }

    pub fn validate_field(&self, field: FieldKey) -> FormResult<bool> {
        self.ensure_alive()?;
        let spec = self.schema.require(field)?;
        let values = read_lock(&self.state, "reading values for field validation")?
            .values
            .clone();
        let outcome = self.evaluate(spec, &values);

        let mut state = write_lock(&self.state, "writing field validation result")?;
        Ok(apply_outcome(&mut state.errors, field, outcome))
    }

    /// Sole authority on whether the form may be submitted.
    pub fn validate_all(&self) -> FormResult<bool> {
        self.ensure_alive()?;
        let values = read_lock(&self.state, "reading values for form validation")?
            .values
            .clone();
        let outcomes = self
            .schema
            .fields()
            .iter()
            .map(|spec| (spec.key(), self.evaluate(spec, &values)))
            .collect::<Vec<_>>();

        let mut state = write_lock(&self.state, "applying form validation result")?;
        for (field, outcome) in outcomes {
            apply_outcome(&mut state.errors, field, outcome);
        }
        Ok(!state.errors.has_errors())
    }

    /// Runs `callback` at most once per call, and never while an earlier
    /// callback is still outstanding. A rejected callback is reported through
    /// the returned outcome and the error hooks, never as `Err`.
    pub async fn submit<F, Fut, E>(&self, callback: F) -> FormResult<SubmitOutcome>
    where
        F: FnOnce(FormValues) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: Error + Send + Sync + 'static,
    {
        self.ensure_alive()?;
        {
            let mut state = write_lock(&self.state, "preparing submit")?;
            if state.submission.status == SubmitStatus::Submitting {
                tracing::debug!(form_id = self.id.0, "submit ignored, previous submit pending");
                return Ok(SubmitOutcome::Ignored);
            }
            transition_submit_status(&mut state, SubmitStatus::Submitting)?;
            state.submission.attempts = state.submission.attempts.saturating_add(1);
        }
        let mut guard = SubmitGuard::new(self);

        if !self.validate_all()? {
            let mut state = write_lock(&self.state, "handling submit validation failure")?;
            transition_submit_status(&mut state, SubmitStatus::Failed)?;
            guard.settle();
            let error_count = state.errors.len();
            state.submission.last_error = Some(SubmitFailure::Invalid { error_count });
            tracing::debug!(form_id = self.id.0, error_count, "submit blocked by validation");
            return Ok(SubmitOutcome::Invalid);
        }

        let values = read_lock(&self.state, "reading values for submit")?
            .values
            .clone();
        tracing::debug!(form_id = self.id.0, status = "submitting", "form submit started");
        let result = callback(values.clone()).await;

        if self.is_disposed() {
            guard.settle();
            if let Err(error) = &result {
                self.diagnostics.submit_rejected(self.id, error);
            }
            tracing::debug!(form_id = self.id.0, "submit settled after dispose");
            return Ok(SubmitOutcome::Discarded);
        }

        match result {
            Ok(()) => {
                {
                    let mut state = write_lock(&self.state, "completing submit")?;
                    transition_submit_status(&mut state, SubmitStatus::Succeeded)?;
                    guard.settle();
                    state.submission.last_error = None;
                    if self.options.reset_after_submit {
                        state.values = state.defaults.clone();
                        state.dirty.clear();
                        state.touched.clear();
                        state.errors.clear_all();
                    }
                }
                tracing::debug!(form_id = self.id.0, status = "succeeded", "form submit settled");
                let hooks = read_lock(&self.success_hooks, "reading success hooks")?.clone();
                for hook in hooks {
                    hook(&values);
                }
                Ok(SubmitOutcome::Submitted)
            }
            Err(error) => {
                let error: SubmitError = Arc::new(error);
                self.diagnostics.submit_rejected(self.id, error.as_ref());
                {
                    let mut state = write_lock(&self.state, "recording submit failure")?;
                    transition_submit_status(&mut state, SubmitStatus::Failed)?;
                    guard.settle();
                    state.submission.last_error = Some(SubmitFailure::Rejected(error.clone()));
                }
                let hooks = read_lock(&self.error_hooks, "reading error hooks")?.clone();
                for hook in hooks {
                    hook(error.as_ref());
                }
                Ok(SubmitOutcome::Rejected(error))
            }
        }
    }

    /// Restores defaults and clears errors, touched and dirty state. An
    /// outstanding submit keeps its status.
    pub fn reset(&self) -> FormResult<()> {
        self.ensure_alive()?;
        let mut state = write_lock(&self.state, "resetting form")?;
        state.values = state.defaults.clone();
        state.errors.clear_all();
        state.touched.clear();
        state.dirty.clear();
        if state.submission.status != SubmitStatus::Submitting {
            transition_submit_status(&mut state, SubmitStatus::Idle)?;
            state.submission.last_error = None;
            state.submission.attempts = 0;
        }
        Ok(())
    }

    pub fn reset_field(&self, field: FieldKey) -> FormResult<()> {
        self.ensure_alive()?;
        self.schema.require(field)?;
        let mut state = write_lock(&self.state, "resetting field")?;
        if let Some(default) = state.defaults.get(&field).cloned() {
            state.values.insert(field, default);
        }
        state.dirty.remove(&field);
        state.touched.remove(&field);
        state.errors.clear_error(field);
        Ok(())
    }

    /// Records an error that came from outside the rule set, e.g. a server
    /// response naming a field.
    pub fn set_field_error(&self, field: FieldKey, message: impl Into<String>) -> FormResult<()> {
        self.ensure_alive()?;
        self.schema.require(field)?;
        write_lock(&self.state, "setting field error")?
            .errors
            .set_error(field, message);
        Ok(())
    }

    pub fn clear_field_error(&self, field: FieldKey) -> FormResult<()> {
        self.ensure_alive()?;
        self.schema.require(field)?;
        write_lock(&self.state, "clearing field error")?
            .errors
            .clear_error(field);
        Ok(())
    }

    pub fn clear_errors(&self) -> FormResult<()> {
        self.ensure_alive()?;
        write_lock(&self.state, "clearing all field errors")?
            .errors
            .clear_all();
        Ok(())
    }

    pub fn value(&self, field: FieldKey) -> FormResult<FieldValue> {
        self.schema.require(field)?;
        let state = read_lock(&self.state, "reading field value")?;
        Ok(state
            .values
            .get(&field)
            .cloned()
            .unwrap_or_else(|| FieldValue::default_for(self.schema_kind(field))))
    }

    pub fn values(&self) -> FormResult<FormValues> {
        Ok(read_lock(&self.state, "reading values")?.values.clone())
    }

    pub fn error(&self, field: FieldKey) -> FormResult<Option<String>> {
        self.schema.require(field)?;
        Ok(read_lock(&self.state, "reading field error")?
            .errors
            .get(field)
            .map(str::to_owned))
    }

    pub fn errors(&self) -> FormResult<FieldErrorStore> {
        Ok(read_lock(&self.state, "reading errors")?.errors.clone())
    }

    pub fn is_touched(&self, field: FieldKey) -> FormResult<bool> {
        self.schema.require(field)?;
        Ok(read_lock(&self.state, "reading touched fields")?
            .touched
            .contains(&field))
    }

    pub fn is_dirty(&self) -> FormResult<bool> {
        Ok(!read_lock(&self.state, "reading dirty fields")?.dirty.is_empty())
    }

    pub fn submission(&self) -> FormResult<SubmissionState> {
        Ok(read_lock(&self.state, "reading submission state")?
            .submission
            .clone())
    }

    pub fn snapshot(&self) -> FormResult<FormSnapshot> {
        let state = read_lock(&self.state, "creating form snapshot")?;
        Ok(FormSnapshot {
            values: state.values.clone(),
            errors: state.errors.clone(),
            touched: state.touched.clone(),
            dirty: state.dirty.clone(),
            submission: state.submission.clone(),
            is_dirty: !state.dirty.is_empty(),
            is_valid: !state.errors.has_errors(),
        })
    }

    pub(super) fn ensure_alive(&self) -> FormResult<()> {
        if self.is_disposed() {
            return Err(FormError::Disposed);
        }
        Ok(())
    }

    fn schema_kind(&self, field: FieldKey) -> ValueKind {
        self.schema
            .field(field)
            .map_or(ValueKind::Text, FieldSpec::kind)
    }

    fn evaluate(&self, spec: &FieldSpec, values: &FormValues) -> Result<(), FieldError> {
        let fallback;
        let value = match values.get(&spec.key()) {
            Some(value) => value,
            None => {
                fallback = FieldValue::default_for(spec.kind());
                &fallback
            }
        };
        if spec.is_required() && value.is_empty() {
            return Err(FieldError::new(format!("{} is required", spec.label_text())));
        }

        let cx = RuleContext::new(values, self.clock.as_ref());
        for rule in spec.rules() {
            run_guarded(
                spec.key(),
                spec.label_text(),
                rule,
                value,
                &cx,
                self.diagnostics.as_ref(),
            )?;
        }
        Ok(())
    }

    fn revalidate_dependents(&self, source: FieldKey) -> FormResult<()> {
        let dependents = read_lock(&self.dependencies, "reading field dependencies")?
            .get(&source)
            .cloned()
            .unwrap_or_default();
        for dependent in dependents {
            self.validate_field(dependent)?;
        }
        Ok(())
    }
}

/// Moves a claimed submit to `Failed` when `submit` exits without settling,
/// either because its future was dropped mid-callback or because an internal
/// error returned early.
struct SubmitGuard<'a> {
    controller: &'a FormController,
    armed: bool,
}

impl<'a> SubmitGuard<'a> {
    fn new(controller: &'a FormController) -> Self {
        Self {
            controller,
            armed: true,
        }
    }

    fn settle(&mut self) {
        self.armed = false;
    }
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        if !self.armed || self.controller.is_disposed() {
            return;
        }
        let mut state = self
            .controller
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if state.submission.status != SubmitStatus::Submitting {
            return;
        }
        state.submission.status = SubmitStatus::Failed;
        state.submission.last_error = Some(SubmitFailure::Abandoned);
        tracing::debug!(form_id = self.controller.id.0, "submit abandoned before settling");
    }
}

fn check_kind(spec: &FieldSpec, value: &FieldValue) -> FormResult<()> {
    if spec.kind() != value.kind() {
        return Err(FormError::KindMismatch {
            field: spec.key(),
            expected: spec.kind(),
            found: value.kind(),
        });
    }
    Ok(())
}

fn apply_outcome(
    errors: &mut FieldErrorStore,
    field: FieldKey,
    outcome: Result<(), FieldError>,
) -> bool {
    match outcome {
        Ok(()) => {
            errors.clear_error(field);
            true
        }
        Err(error) => {
            errors.set_error(field, error.into_message());
            false
        }
    }
}

pub(super) fn transition_submit_status(
    state: &mut FormState,
    next: SubmitStatus,
) -> FormResult<()> {
    let current = state.submission.status;
    if current == next {
        return Ok(());
    }

    let allowed = matches!(
        (current, next),
        (
            SubmitStatus::Idle | SubmitStatus::Succeeded | SubmitStatus::Failed,
            SubmitStatus::Submitting
        ) | (
            SubmitStatus::Submitting,
            SubmitStatus::Succeeded | SubmitStatus::Failed
        ) | (
            SubmitStatus::Succeeded | SubmitStatus::Failed,
            SubmitStatus::Idle
        )
    );
    if !allowed {
        return Err(FormError::InvalidStateTransition {
            from: current,
            to: next,
        });
    }
    state.submission.status = next;
    Ok(())
}

pub(super) fn read_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockReadGuard<'a, T>> {
    lock.read().map_err(|_| FormError::StatePoisoned(context))
}

pub(super) fn write_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockWriteGuard<'a, T>> {
    lock.write().map_err(|_| FormError::StatePoisoned(context))
}
