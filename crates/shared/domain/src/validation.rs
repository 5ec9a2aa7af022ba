//! Field-level input validation.
//!
//! Each request type implements [`Validate`] by hand, calling the rule
//! helpers below for every field. Violations are collected rather than
//! returned on the first failure so a client sees everything wrong with a
//! request at once.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

static PHONE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9\s\-+()]*$").expect("phone pattern is a valid regex"));

/// One failed rule on one input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FieldViolation {
    /// Field name as it appears in the request body
    pub field: String,
    /// Human-readable description of the failure
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Input types that can report their own field violations.
pub trait Validate {
    /// Every rule this value breaks; empty when the value is acceptable.
    fn violations(&self) -> Vec<FieldViolation>;
}

/// Accumulates violations across the fields of one input.
#[derive(Debug, Default)]
pub struct Violations {
    inner: Vec<FieldViolation>,
}

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Present and non-empty. `label` is the human-readable field name.
    pub fn required(&mut self, field: &str, label: &str, value: Option<&str>) -> &mut Self {
        if value.map_or(true, str::is_empty) {
            self.push(field, format!("{} is required", label));
        }
        self
    }

    /// Required, well-formed email address.
    pub fn required_email(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        match value {
            None => self.push(field, "Email is required"),
            Some(v) if v.trim().is_empty() => self.push(field, "Email is required"),
            Some(v) => self.email(field, Some(v)),
        }
    }

    /// Optional email address; checked only when present.
    pub fn email(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        if let Some(v) = value {
            if !v.validate_email() {
                self.push(field, "Email must be a valid email address");
            }
        }
        self
    }

    /// Required password of at least `min` characters.
    pub fn required_password(&mut self, field: &str, value: Option<&str>, min: usize) -> &mut Self {
        match value {
            None => self.push(field, "Password is required"),
            Some("") => self.push(field, "Password is required"),
            Some(v) => self.password(field, Some(v), min),
        }
    }

    /// Optional password; length checked only when present.
    pub fn password(&mut self, field: &str, value: Option<&str>, min: usize) -> &mut Self {
        if let Some(v) = value {
            if v.chars().count() < min {
                self.push(
                    field,
                    format!("Password must be at least {} characters long", min),
                );
            }
        }
        self
    }

    /// Optional string of at most `max` characters. `label` is the
    /// human-readable field name used in the message.
    pub fn max_chars(
        &mut self,
        field: &str,
        label: &str,
        value: Option<&str>,
        max: usize,
    ) -> &mut Self {
        if let Some(v) = value {
            if v.chars().count() > max {
                self.push(field, format!("{} must not exceed {} characters", label, max));
            }
        }
        self
    }

    /// Optional phone number restricted to ASCII digits, spaces and `-+()`.
    pub fn phone(&mut self, field: &str, value: Option<&str>, max: usize) -> &mut Self {
        if let Some(v) = value {
            self.max_chars(field, "Phone", Some(v), max);
            if !PHONE_CHARS.is_match(v) {
                self.push(field, "Phone must contain only valid phone characters");
            }
        }
        self
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) -> &mut Self {
        self.inner.push(FieldViolation::new(field, message));
        self
    }

    pub fn finish(&mut self) -> Vec<FieldViolation> {
        std::mem::take(&mut self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_email_missing_and_malformed() {
        let missing = Violations::new().required_email("email", None).finish();
        assert_eq!(missing, vec![FieldViolation::new("email", "Email is required")]);

        let malformed = Violations::new()
            .required_email("email", Some("not-an-email"))
            .finish();
        assert_eq!(
            malformed,
            vec![FieldViolation::new(
                "email",
                "Email must be a valid email address"
            )]
        );

        let ok = Violations::new()
            .required_email("email", Some("jane@example.com"))
            .finish();
        assert!(ok.is_empty());
    }

    #[test]
    fn test_required() {
        let err = Violations::new()
            .required("password", "Password", Some(""))
            .required("token", "Token", None)
            .finish();
        assert_eq!(err[0].message, "Password is required");
        assert_eq!(err[1].message, "Token is required");

        assert!(Violations::new()
            .required("password", "Password", Some("x"))
            .finish()
            .is_empty());
    }

    #[test]
    fn test_max_chars_counts_characters_not_bytes() {
        let exactly = "é".repeat(100);
        let ok = Violations::new()
            .max_chars("firstName", "First name", Some(&exactly), 100)
            .finish();
        assert!(ok.is_empty());

        let too_long = "a".repeat(101);
        let err = Violations::new()
            .max_chars("firstName", "First name", Some(&too_long), 100)
            .finish();
        assert_eq!(err[0].message, "First name must not exceed 100 characters");
    }

    #[test]
    fn test_phone_characters() {
        let ok = Violations::new()
            .phone("phone", Some("+1 (555) 123-4567"), 20)
            .finish();
        assert!(ok.is_empty());

        let err = Violations::new().phone("phone", Some("555-CALL"), 20).finish();
        assert_eq!(
            err,
            vec![FieldViolation::new(
                "phone",
                "Phone must contain only valid phone characters"
            )]
        );
    }

    #[test]
    fn test_phone_digits_are_ascii_only() {
        for phone in ["١٢٣٤٥", "１２３", "555-१२३"] {
            let err = Violations::new().phone("phone", Some(phone), 20).finish();
            assert_eq!(err.len(), 1, "{} should be rejected", phone);
        }
    }

    #[test]
    fn test_phone_reports_length_and_characters_together() {
        let err = Violations::new()
            .phone("phone", Some("x".repeat(21).as_str()), 20)
            .finish();
        assert_eq!(err.len(), 2);
    }

    #[test]
    fn test_violations_are_collected() {
        let all = Violations::new()
            .required_email("email", Some("bad"))
            .required_password("password", Some("short"), 8)
            .phone("phone", Some("abc"), 20)
            .finish();

        let fields: Vec<_> = all.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["email", "password", "phone"]);
    }
}
