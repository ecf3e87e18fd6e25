//! Core types for the submission pipeline

use crate::anomaly::AnomalyCategory;
use crate::error::FormError;
use crate::form::{Form, FormKind};
use crate::validate::{FieldKind, ValidationResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Pipeline states, in the order a successful submission visits them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PipelineState {
    Idle,
    Validating,
    RateLimiting,
    AnomalyChecking,
    Submitting,
    Success,
    Failure,
}

impl PipelineState {
    /// `Success` or `Failure`
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Success | PipelineState::Failure)
    }
}

/// Commands the presentation layer sends to the pipeline
#[derive(Debug, Clone)]
pub enum FormCommand {
    /// Check one field as the user edits it
    ValidateField {
        name: String,
        kind: FieldKind,
        required: bool,
        value: String,
    },
    /// Run the whole pipeline for a form
    Submit(Form),
}

/// Events the pipeline hands back
#[derive(Debug)]
pub enum FormEvent {
    FieldChecked(FieldReport),
    Completed(SubmissionReport),
}

/// Validation outcome for one named field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldReport {
    pub field: String,
    pub result: ValidationResult,
}

/// What the endpoint acknowledged
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub submission_id: Uuid,
    pub status: u16,
    pub response: Option<serde_json::Value>,
}

/// Everything that happened to one submission attempt
#[derive(Debug)]
pub struct SubmissionReport {
    pub submission_id: Uuid,
    pub form_kind: FormKind,
    /// States visited, starting at `Idle` and ending at a terminal state
    pub states: Vec<PipelineState>,
    pub fields: Vec<FieldReport>,
    pub outcome: std::result::Result<SubmissionReceipt, FormError>,
}

impl SubmissionReport {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn final_state(&self) -> PipelineState {
        self.states.last().copied().unwrap_or(PipelineState::Idle)
    }

    /// Message for the presentation layer
    pub fn message(&self) -> &'static str {
        match &self.outcome {
            Ok(_) => self.form_kind.success_message(),
            Err(e) => e.user_message(),
        }
    }

    pub fn error(&self) -> Option<&FormError> {
        self.outcome.as_ref().err()
    }

    /// Fields that failed validation
    pub fn invalid_fields(&self) -> impl Iterator<Item = &FieldReport> {
        self.fields.iter().filter(|f| !f.result.valid)
    }
}

/// Audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub submission_id: Uuid,
    pub session_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub form_kind: FormKind,
    /// Rate-limit identifier, absent when validation failed first
    pub identifier: Option<String>,
    pub result: AuditResult,
    /// Hash of the sanitized payload
    pub content_hash: String,
    /// Full sanitized payload, only kept for anomaly rejections
    pub payload: Option<serde_json::Value>,
    pub processing_time_ms: u64,
}

/// Result for audit logging (simplified)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditResult {
    Submitted { status: u16 },
    Invalid { fields: usize },
    RateLimited,
    Suspicious { category: AnomalyCategory },
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(PipelineState::Success.is_terminal());
        assert!(PipelineState::Failure.is_terminal());
        assert!(!PipelineState::Submitting.is_terminal());
    }

    #[test]
    fn test_report_message() {
        let report = SubmissionReport {
            submission_id: Uuid::new_v4(),
            form_kind: FormKind::Volunteer,
            states: vec![PipelineState::Idle, PipelineState::Validating, PipelineState::Failure],
            fields: vec![FieldReport {
                field: "email".to_string(),
                result: ValidationResult::invalid("bad"),
            }],
            outcome: Err(FormError::AnomalyRejected),
        };
        assert_eq!(report.final_state(), PipelineState::Failure);
        assert_eq!(report.message(), crate::error::ANOMALY_MESSAGE);
        assert_eq!(report.invalid_fields().count(), 1);
    }
}
