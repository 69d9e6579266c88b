mod date;
mod file;
mod number;
mod text;

use crate::form::FieldError;

pub use date::{
    Clock, DateOptions, FixedClock, SystemClock, parse_date, validate_date, validate_date_range,
};
pub use file::{validate_file_size, validate_file_type};
pub use number::{
    NumberOptions, check_number, luhn_checksum_valid, validate_credit_card, validate_lei,
    validate_number,
};
pub use text::{validate_email, validate_password, validate_phone, validate_required};

pub type Validation = Result<(), FieldError>;

fn fail(message: impl Into<String>) -> Validation {
    Err(FieldError::new(message))
}

fn required_message(label: &str) -> String {
    format!("{label} is required")
}
