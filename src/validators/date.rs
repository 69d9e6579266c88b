use chrono::{DateTime, Local, NaiveDate};

use super::{Validation, fail, required_message};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Source of "today" for relative date rules.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DateOptions {
    pub label: String,
    pub min: Option<NaiveDate>,
    pub max: Option<NaiveDate>,
    pub not_in_future: bool,
    pub not_in_past: bool,
}

impl Default for DateOptions {
    fn default() -> Self {
        Self {
            label: "Date".to_owned(),
            min: None,
            max: None,
            not_in_future: false,
            not_in_past: false,
        }
    }
}

impl DateOptions {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn min(mut self, min: NaiveDate) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: NaiveDate) -> Self {
        self.max = Some(max);
        self
    }

    pub fn not_in_future(mut self) -> Self {
        self.not_in_future = true;
        self
    }

    pub fn not_in_past(mut self) -> Self {
        self.not_in_past = true;
        self
    }
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp, whose time of day is dropped.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|timestamp| timestamp.date_naive())
        })
}

pub fn validate_date(value: &str, options: &DateOptions, clock: &dyn Clock) -> Validation {
    if value.trim().is_empty() {
        return fail(required_message(&options.label));
    }
    let Some(date) = parse_date(value) else {
        return fail("Invalid date format");
    };

    if let Some(min) = options.min.filter(|min| date < *min) {
        return fail(format!(
            "{} must be on or after {}",
            options.label,
            min.format(DATE_FORMAT)
        ));
    }
    if let Some(max) = options.max.filter(|max| date > *max) {
        return fail(format!(
            "{} must be on or before {}",
            options.label,
            max.format(DATE_FORMAT)
        ));
    }

    let today = clock.today();
    if options.not_in_future && date > today {
        return fail(format!("{} cannot be in the future", options.label));
    }
    if options.not_in_past && date < today {
        return fail(format!("{} cannot be in the past", options.label));
    }
    Ok(())
}

/// Only checked once both ends are filled in.
pub fn validate_date_range(start: &str, end: &str) -> Validation {
    if start.trim().is_empty() || end.trim().is_empty() {
        return Ok(());
    }
    let (Some(start), Some(end)) = (parse_date(start), parse_date(end)) else {
        return fail("Invalid date format");
    };
    if start > end {
        return fail("End date must be after start date");
    }
    Ok(())
}
