//! Field format validation

use crate::sanitize::Sanitizer;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const REQUIRED_MESSAGE: &str = "This field is required";
pub const EMAIL_MESSAGE: &str = "Please enter a valid email address";
pub const PHONE_MESSAGE: &str = "Please enter a valid phone number (at least 10 digits)";
pub const NAME_MESSAGE: &str =
    "Please enter a valid name (2-50 letters, spaces, hyphens or apostrophes)";
pub const NUMBER_MESSAGE: &str = "Please enter a whole number greater than zero";

const MIN_PHONE_DIGITS: usize = 10;
const MIN_NAME_LENGTH: usize = 2;
const MAX_NAME_LENGTH: usize = 50;

/// Input type tag of a form field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Email,
    Tel,
    /// Person name
    Name,
    Number,
    Text,
    TextArea,
    Select,
}

/// Outcome of validating one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub error: Option<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(message.into()),
        }
    }
}

struct Patterns {
    email: Regex,
    phone_chars: Regex,
    name: Regex,
}

impl Patterns {
    fn new() -> Self {
        Self {
            email: Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"),
            phone_chars: Regex::new(r"^[0-9\s\-()+]+$").expect("valid regex"),
            name: Regex::new(r"^[A-Za-z\s\-']+$").expect("valid regex"),
        }
    }
}

/// Format validators. Every check sanitizes its input first.
pub struct Validators {
    sanitizer: Sanitizer,
    patterns: Patterns,
}

impl Validators {
    pub fn new(sanitizer: Sanitizer) -> Self {
        Self {
            sanitizer,
            patterns: Patterns::new(),
        }
    }

    /// The sanitizer these validators run first
    pub fn sanitizer(&self) -> &Sanitizer {
        &self.sanitizer
    }

    pub fn email(&self, raw: &str) -> bool {
        let value = self.sanitizer.sanitize(raw);
        self.patterns.email.is_match(&value)
    }

    pub fn phone(&self, raw: &str) -> bool {
        let value = self.sanitizer.sanitize(raw);
        if !self.patterns.phone_chars.is_match(&value) {
            return false;
        }
        value.chars().filter(|c| c.is_ascii_digit()).count() >= MIN_PHONE_DIGITS
    }

    pub fn name(&self, raw: &str) -> bool {
        let value = self.sanitizer.sanitize(raw);
        let len = value.chars().count();
        self.patterns.name.is_match(&value) && (MIN_NAME_LENGTH..=MAX_NAME_LENGTH).contains(&len)
    }

    pub fn number(&self, raw: &str) -> bool {
        let value = self.sanitizer.sanitize(raw);
        matches!(value.parse::<u32>(), Ok(n) if n > 0)
    }

    /// Validate a single field value against its kind and required flag.
    ///
    /// Empty after sanitizing is reported as "required" for required fields
    /// and is valid for optional ones; format rules only apply to non-empty
    /// values.
    pub fn check_field(&self, kind: FieldKind, required: bool, raw: &str) -> ValidationResult {
        if self.sanitizer.sanitize(raw).is_empty() {
            return if required {
                ValidationResult::invalid(REQUIRED_MESSAGE)
            } else {
                ValidationResult::ok()
            };
        }

        let (valid, message) = match kind {
            FieldKind::Email => (self.email(raw), EMAIL_MESSAGE),
            FieldKind::Tel => (self.phone(raw), PHONE_MESSAGE),
            FieldKind::Name => (self.name(raw), NAME_MESSAGE),
            FieldKind::Number => (self.number(raw), NUMBER_MESSAGE),
            FieldKind::Text | FieldKind::TextArea | FieldKind::Select => (true, ""),
        };

        if valid {
            ValidationResult::ok()
        } else {
            ValidationResult::invalid(message)
        }
    }
}

impl Default for Validators {
    fn default() -> Self {
        Self::new(Sanitizer::default())
    }
}
