//! Declarative request checks shared by the write services.
//!
//! Each check appends to a violation list so that one response can report
//! every problem with a body at once.

use url::Url;

use crate::error::{ApiError, FieldViolation};

/// Width of the `VARCHAR(255)` columns that titles, names and URLs land in
pub const MAX_TEXT_LENGTH: usize = 255;

#[derive(Debug, Default)]
pub struct Checks {
    violations: Vec<FieldViolation>,
}

impl Checks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.violations.push(FieldViolation::new(field, message));
    }

    pub fn extend(&mut self, violations: Vec<FieldViolation>) {
        self.violations.extend(violations);
    }

    /// Value must contain something other than whitespace
    pub fn not_blank(&mut self, field: &str, value: &str, message: &str) {
        if value.trim().is_empty() {
            self.push(field, message);
        }
    }

    /// Length in characters, which is how Postgres measures `VARCHAR(n)`
    pub fn max_len(&mut self, field: &str, value: &str, max: usize) {
        if value.chars().count() > max {
            self.push(field, format!("{} must be at most {} characters", field, max));
        }
    }

    /// Optional on absence; when present must be an absolute http(s) URL
    /// that fits its column
    pub fn image_url(&mut self, field: &str, value: Option<&str>) {
        let Some(value) = value else { return };
        let valid = Url::parse(value)
            .map(|url| matches!(url.scheme(), "http" | "https") && url.host().is_some())
            .unwrap_or(false);
        if !valid {
            self.push(field, "ImageURL must be a valid URL");
        } else {
            self.max_len(field, value, MAX_TEXT_LENGTH);
        }
    }

    pub fn email(&mut self, field: &str, value: &str) {
        let valid = match value.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
                    && domain.contains('.')
                    && !value.chars().any(char::is_whitespace)
            }
            None => false,
        };
        if !valid {
            self.push(field, "Email must be valid");
        }
    }

    pub fn finish(self, message: &str) -> Result<(), ApiError> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation_error(message, self.violations))
        }
    }
}
