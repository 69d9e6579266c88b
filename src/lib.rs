pub mod diagnostics;
pub mod form;
pub mod prelude;
pub mod validators;

pub use form::{FormController, FormOptions, FormSchema};
