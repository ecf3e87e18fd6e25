//! Error types for FoodLink form submission

use thiserror::Error;

/// Result type alias for form operations
pub type Result<T> = std::result::Result<T, FormError>;

/// Shown for every validation failure; field-level messages travel separately.
pub const VALIDATION_MESSAGE: &str = "Please correct the highlighted fields and try again.";
/// Shown when the identifier has used up its submissions for the window.
pub const RATE_LIMIT_MESSAGE: &str =
    "Too many submissions. Please wait a few minutes before trying again.";
/// Shown for suspicious payloads. Deliberately says nothing about what matched.
pub const ANOMALY_MESSAGE: &str =
    "Invalid submission detected. Please check your input and try again.";
/// Shown for any transport or server failure.
pub const SUBMISSION_FAILED_MESSAGE: &str =
    "There was an error submitting your form. Please try again later.";

/// A single field that failed validation
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FieldError {
    /// Field name as sent on the wire
    pub field: String,
    /// Human-readable message for the field
    pub message: String,
}

/// Form pipeline error types
#[derive(Debug, Error)]
pub enum FormError {
    /// One or more fields failed validation
    #[error("Validation failed for {} field(s)", .errors.len())]
    Validation { errors: Vec<FieldError> },

    /// Too many submissions for this identifier within the window
    #[error("Rate limit exceeded for {identifier}")]
    RateLimitExceeded { identifier: String },

    /// Payload matched a suspicious pattern
    #[error("Submission rejected by anomaly screening")]
    AnomalyRejected,

    /// Transport error or non-success response
    #[error("Submission failed: {0}")]
    SubmissionFailed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// HTTP error from the outbound transport
    #[cfg(feature = "http-transport")]
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
}

impl FormError {
    /// The one message the presentation layer may show for this error.
    ///
    /// Internal causes (transport errors, matched patterns, the identifier)
    /// never leak through here.
    pub fn user_message(&self) -> &'static str {
        match self {
            FormError::Validation { .. } => VALIDATION_MESSAGE,
            FormError::RateLimitExceeded { .. } => RATE_LIMIT_MESSAGE,
            FormError::AnomalyRejected => ANOMALY_MESSAGE,
            _ => SUBMISSION_FAILED_MESSAGE,
        }
    }

    /// Per-field errors, empty for anything but a validation failure
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            FormError::Validation { errors } => errors,
            _ => &[],
        }
    }

    /// Whether the user can fix this by editing the form
    pub fn is_user_correctable(&self) -> bool {
        matches!(self, FormError::Validation { .. })
    }
}
