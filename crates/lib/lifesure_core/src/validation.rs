//! Field validation helpers shared by registration, policy and claim input.
//!
//! Each helper returns the normalised value or a human-readable message;
//! callers collect messages and report them together.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate};
use regex::Regex;

/// Minimum password length for every account kind.
pub const MIN_PASSWORD_LEN: usize = 8;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\w-]+(\.[\w-]+)*@([\w-]+\.)+[a-zA-Z]{2,7}$").expect("valid email regex")
});

/// Collects validation messages across several fields.
#[derive(Debug, Default)]
pub struct Problems(Vec<String>);

impl Problems {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.0.push(message.into());
    }

    /// Record the error side of `result`, returning the success value if any.
    pub fn check<T>(&mut self, result: Result<T, String>) -> Option<T> {
        match result {
            Ok(v) => Some(v),
            Err(e) => {
                self.0.push(e);
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `Ok(())` when nothing was recorded, otherwise all messages joined.
    pub fn finish(self) -> Result<(), String> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self.0.join("; "))
        }
    }
}

/// Require a non-blank value, returning it trimmed.
pub fn required(field: &str, value: Option<&str>) -> Result<String, String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(format!("{field} is required")),
    }
}

/// Trim an optional value, treating blank as absent.
pub fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Lower-case, trim and pattern-check an email address.
pub fn email(value: Option<&str>) -> Result<String, String> {
    let email = required("email", value)?.to_lowercase();
    if EMAIL_RE.is_match(&email) {
        Ok(email)
    } else {
        Err("email must be a valid email address".into())
    }
}

/// Require exactly `digits` ASCII digits.
pub fn digits(field: &str, value: Option<&str>, digits: usize) -> Result<String, String> {
    let v = required(field, value)?;
    if v.len() == digits && v.bytes().all(|b| b.is_ascii_digit()) {
        Ok(v)
    } else {
        Err(format!("{field} must be exactly {digits} digits"))
    }
}

/// Enforce the minimum password length. Passwords are not trimmed.
pub fn password(value: Option<&str>) -> Result<String, String> {
    match value {
        Some(p) if p.chars().count() >= MIN_PASSWORD_LEN => Ok(p.to_string()),
        Some(p) if !p.is_empty() => Err(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )),
        _ => Err("password is required".into()),
    }
}

/// Parse `YYYY-MM-DD` or an RFC 3339 timestamp into a calendar date.
pub fn date(field: &str, value: Option<&str>) -> Result<NaiveDate, String> {
    let raw = required(field, value)?;
    if let Ok(d) = NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
        return Ok(d);
    }
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.date_naive())
        .map_err(|_| format!("{field} must be a date (YYYY-MM-DD)"))
}

/// Parse a strictly positive, finite amount. Non-numeric input is an error.
pub fn amount(field: &str, value: Option<&str>) -> Result<f64, String> {
    let raw = required(field, value)?;
    match raw.parse::<f64>() {
        Ok(n) if n.is_finite() && n > 0.0 => Ok(n),
        Ok(_) => Err(format!("{field} must be greater than zero")),
        Err(_) => Err(format!("{field} must be a number")),
    }
}
