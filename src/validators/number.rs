use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

use super::{Validation, fail, required_message};

static LEI_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9]{18}[0-9]{2}$").expect("lei pattern compiles"));

const CARD_DIGITS: std::ops::RangeInclusive<usize> = 13..=19;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NumberOptions {
    pub label: String,
    pub min: Option<Decimal>,
    pub max: Option<Decimal>,
    pub integer: bool,
}

impl Default for NumberOptions {
    fn default() -> Self {
        Self {
            label: "Value".to_owned(),
            min: None,
            max: None,
            integer: false,
        }
    }
}

impl NumberOptions {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn min(mut self, min: impl Into<Decimal>) -> Self {
        self.min = Some(min.into());
        self
    }

    pub fn max(mut self, max: impl Into<Decimal>) -> Self {
        self.max = Some(max.into());
        self
    }

    pub fn integer(mut self) -> Self {
        self.integer = true;
        self
    }
}

pub fn validate_number(value: &str, options: &NumberOptions) -> Validation {
    let value = value.trim();
    if value.is_empty() {
        return fail(required_message(&options.label));
    }
    let Some(number) = parse_decimal(value) else {
        return fail(format!("{} is not a valid number", options.label));
    };
    check_number(number, options)
}

/// Integer and range checks for an already-parsed amount.
pub fn check_number(number: Decimal, options: &NumberOptions) -> Validation {
    if options.integer && !number.fract().is_zero() {
        return fail(format!("{} must be a whole number", options.label));
    }
    if let Some(min) = options.min.filter(|min| number < *min) {
        return fail(format!("{} must be at least {min}", options.label));
    }
    if let Some(max) = options.max.filter(|max| number > *max) {
        return fail(format!("{} must be at most {max}", options.label));
    }
    Ok(())
}

fn parse_decimal(value: &str) -> Option<Decimal> {
    if value.contains('_') {
        return None;
    }
    Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .ok()
}

pub fn validate_credit_card(value: &str) -> Validation {
    let digits = value
        .chars()
        .filter(|c| *c != ' ' && *c != '-')
        .collect::<String>();
    if digits.is_empty() {
        return fail("Credit card number is required");
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) || !CARD_DIGITS.contains(&digits.len()) {
        return fail("Credit card number must be 13-19 digits");
    }
    if !luhn_checksum_valid(&digits) {
        return fail("Invalid credit card number");
    }
    Ok(())
}

/// Mod-10 check: from the rightmost digit, every second digit is doubled
/// (minus 9 when above 9) and the digit sum must be divisible by 10.
pub fn luhn_checksum_valid(digits: &str) -> bool {
    if digits.is_empty() {
        return false;
    }
    let mut sum = 0u32;
    for (index, byte) in digits.bytes().rev().enumerate() {
        if !byte.is_ascii_digit() {
            return false;
        }
        let mut digit = u32::from(byte - b'0');
        if index % 2 == 1 {
            digit *= 2;
            if digit > 9 {
                digit -= 9;
            }
        }
        sum += digit;
    }
    sum % 10 == 0
}

/// Legal Entity Identifier. The field is optional, so empty input passes.
pub fn validate_lei(value: &str) -> Validation {
    let value = value.trim();
    if value.is_empty() {
        return Ok(());
    }
    if !LEI_PATTERN.is_match(value) {
        return fail("LEI must be 20 characters: 18 uppercase letters or digits followed by 2 digits");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn number_rejects_non_numeric_and_non_finite_input() {
        let options = NumberOptions::new("Amount");
        assert_eq!(
            validate_number("abc", &options).unwrap_err(),
            "Amount is not a valid number"
        );
        assert!(validate_number("NaN", &options).is_err());
        assert!(validate_number("inf", &options).is_err());
        assert_eq!(validate_number("  ", &options).unwrap_err(), "Amount is required");
        assert!(validate_number("1250.75", &options).is_ok());
        assert!(validate_number("1e3", &options).is_ok());
        assert!(validate_number("0", &options).is_ok());
    }

    #[test]
    fn number_bounds_are_inclusive() {
        let options = NumberOptions::new("Allocation").min(0).max(100);
        assert!(validate_number("0", &options).is_ok());
        assert!(validate_number("100", &options).is_ok());
        assert_eq!(
            validate_number("-0.01", &options).unwrap_err(),
            "Allocation must be at least 0"
        );
        assert_eq!(
            validate_number("100.5", &options).unwrap_err(),
            "Allocation must be at most 100"
        );
    }

    #[test]
    fn integer_constraint_rejects_fractions() {
        let options = NumberOptions::new("Shares").integer();
        assert!(validate_number("12", &options).is_ok());
        assert!(validate_number("12.0", &options).is_ok());
        assert_eq!(
            validate_number("12.5", &options).unwrap_err(),
            "Shares must be a whole number"
        );
    }

    #[test]
    fn credit_card_known_pair() {
        assert!(validate_credit_card("4532015112830366").is_ok());
        assert!(validate_credit_card("4532 0151 1283 0366").is_ok());
        assert!(validate_credit_card("4532-0151-1283-0366").is_ok());
        assert_eq!(
            validate_credit_card("4532015112830367").unwrap_err(),
            "Invalid credit card number"
        );
    }

    #[test]
    fn credit_card_format_errors() {
        assert_eq!(
            validate_credit_card("4532a15112830366").unwrap_err(),
            "Credit card number must be 13-19 digits"
        );
        assert_eq!(
            validate_credit_card("411111111111").unwrap_err(),
            "Credit card number must be 13-19 digits"
        );
        assert_eq!(
            validate_credit_card(" - ").unwrap_err(),
            "Credit card number is required"
        );
    }

    #[test]
    fn lei_shape() {
        assert!(validate_lei("").is_ok());
        assert!(validate_lei("5493001KJTIIGC8Y1R12").is_ok());
        assert!(validate_lei("5493001kjtiigc8y1r12").is_err());
        assert!(validate_lei("5493001KJTIIGC8Y1R1").is_err());
        assert!(validate_lei("5493001KJTIIGC8Y1RAB").is_err());
    }

    fn luhn_check_digit(payload: &[u8]) -> u8 {
        let mut sum = 0u32;
        for (index, digit) in payload.iter().rev().enumerate() {
            let mut digit = u32::from(*digit);
            if index % 2 == 0 {
                digit *= 2;
                if digit > 9 {
                    digit -= 9;
                }
            }
            sum += digit;
        }
        ((10 - sum % 10) % 10) as u8
    }

    proptest! {
        #[test]
        fn checksummed_numbers_are_accepted(payload in prop::collection::vec(0u8..10, 12..19)) {
            let check = luhn_check_digit(&payload);
            let number = payload
                .iter()
                .chain(std::iter::once(&check))
                .map(|digit| char::from(b'0' + digit))
                .collect::<String>();
            prop_assert!(validate_credit_card(&number).is_ok());
        }
    }
}
