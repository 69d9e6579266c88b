use std::sync::LazyLock;

use regex::Regex;

use super::{Validation, fail, required_message};

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
        .expect("email pattern compiles")
});

static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9().\-\s]+$").expect("phone pattern compiles"));

const PHONE_DIGITS: std::ops::RangeInclusive<usize> = 7..=15;
const PASSWORD_MIN_CHARS: usize = 8;

pub fn validate_required(value: &str, label: &str) -> Validation {
    if value.trim().is_empty() {
        return fail(required_message(label));
    }
    Ok(())
}

pub fn validate_email(value: &str) -> Validation {
    let value = value.trim();
    if value.is_empty() {
        return fail("Email is required");
    }
    if !EMAIL_PATTERN.is_match(value) {
        return fail("Please enter a valid email address");
    }
    Ok(())
}

pub fn validate_phone(value: &str) -> Validation {
    let value = value.trim();
    if value.is_empty() {
        return fail("Phone number is required");
    }
    let digits = value.chars().filter(char::is_ascii_digit).count();
    if !PHONE_PATTERN.is_match(value) || !PHONE_DIGITS.contains(&digits) {
        return fail("Please enter a valid phone number");
    }
    Ok(())
}

/// Eight characters, both letter cases, and a digit or a special character.
/// Digits and specials are alternatives, not both required.
pub fn validate_password(value: &str) -> Validation {
    if value.is_empty() {
        return fail("Password is required");
    }
    if value.chars().count() < PASSWORD_MIN_CHARS {
        return fail("Password must be at least 8 characters long");
    }

    let has_upper = value.chars().any(char::is_uppercase);
    let has_lower = value.chars().any(char::is_lowercase);
    let has_digit = value.chars().any(|c| c.is_ascii_digit());
    let has_special = value
        .chars()
        .any(|c| !c.is_alphanumeric() && !c.is_whitespace());
    if !(has_upper && has_lower && (has_digit || has_special)) {
        return fail(
            "Password must contain uppercase and lowercase letters, and numbers or special characters",
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_trims_whitespace() {
        assert_eq!(
            validate_required("   ", "Full name").unwrap_err(),
            "Full name is required"
        );
        assert!(validate_required(" Ada ", "Full name").is_ok());
    }

    #[test]
    fn email_accepts_plain_addresses_only() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("first.last+wealth@mail.example.co.uk").is_ok());
        assert_eq!(
            validate_email("not-an-email").unwrap_err(),
            "Please enter a valid email address"
        );
        assert!(validate_email("user@localhost").is_err());
        assert!(validate_email("user@example.c").is_err());
        assert_eq!(validate_email("").unwrap_err(), "Email is required");
    }

    #[test]
    fn phone_allows_international_separators() {
        assert!(validate_phone("+44 20 7946 0958").is_ok());
        assert!(validate_phone("(555) 123-4567").is_ok());
        assert!(validate_phone("555.123.4567").is_ok());
        assert_eq!(
            validate_phone("12345").unwrap_err(),
            "Please enter a valid phone number"
        );
        assert!(validate_phone("555-CALL-NOW").is_err());
        assert!(validate_phone("12+345678").is_err());
        assert_eq!(validate_phone(" ").unwrap_err(), "Phone number is required");
    }

    #[test]
    fn password_needs_digit_or_special_not_both() {
        assert!(validate_password("Sunrise2025").is_ok());
        assert!(validate_password("Sunrise!day").is_ok());
        assert!(validate_password("sunrise2025").is_err());
        assert!(validate_password("SUNRISE2025").is_err());
        assert!(validate_password("Sunriseday").is_err());
        assert_eq!(
            validate_password("Ab1!").unwrap_err(),
            "Password must be at least 8 characters long"
        );
        assert_eq!(validate_password("").unwrap_err(), "Password is required");
    }
}
