pub use crate::diagnostics::{DiagnosticSink, NoopDiagnostics, TracingDiagnostics};
pub use crate::form::{
    FieldError, FieldErrorStore, FieldKey, FieldSpec, FieldValue, FileInfo, FormController,
    FormError, FormModel, FormOptions, FormResult, FormSchema, FormValues, Rule, SubmitOutcome,
    SubmitStatus, ValidationMode, ValueKind,
};
pub use crate::validators::{Clock, DateOptions, FixedClock, NumberOptions, SystemClock};
