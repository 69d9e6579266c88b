mod controller;
mod draft;
mod errors;
mod schema;
mod validation;
mod values;
mod view;


pub use controller::{
    FormController, FormError, FormId, FormOptions, FormResult, FormSnapshot, SubmissionState,
    SubmitError, SubmitFailure, SubmitOutcome, SubmitStatus, ValidationMode,
};
pub use draft::{FormDraftStore, InMemoryDraftStore};
pub use errors::{FieldError, FieldErrorStore};
pub use schema::{FieldSpec, FormSchema, FormSchemaBuilder};
pub use validation::{FieldValidator, FormModel, Rule, RuleContext, run_guarded};
pub use values::{FieldKey, FieldType, FieldValue, FileInfo, FormValues, ValueKind, read_field};
pub use wealthform_derive::FormModel;
