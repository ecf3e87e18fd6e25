//! Submission pipeline
//!
//! ```text
//! Idle ─► Validating ─► RateLimiting ─► AnomalyChecking ─► Submitting ─► Success
//!              │              │                │                │
//!              └──────────────┴────────────────┴────────────────┴─────► Failure
//! ```
//!
//! Every failure is terminal for that attempt. The user resubmits; nothing
//! carries over except the rate-limit history kept by the `Session`.

use crate::anomaly::AnomalyDetector;
use crate::audit::{hash_content, AuditLogger};
use crate::config::FormsConfig;
use crate::error::{FieldError, FormError, Result};
use crate::form::{FieldSpec, Form, FormKind, FormSubmission};
use crate::sanitize::Sanitizer;
use crate::session::Session;
use crate::transport::{OutboundRequest, Transport, CONTENT_TYPE_JSON, CSRF_HEADER};
use crate::types::{
    AuditEntry, AuditResult, FieldReport, FormCommand, FormEvent, PipelineState,
    SubmissionReceipt, SubmissionReport,
};
use crate::validate::{FieldKind, Validators};
use chrono::{SecondsFormat, Utc};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

/// Runs form submissions through validation, rate limiting, anomaly
/// screening and the outbound transport.
pub struct SubmissionPipeline {
    session: Arc<Session>,
    transport: Arc<dyn Transport>,
    validators: Validators,
    anomaly_detector: AnomalyDetector,
    audit_logger: AuditLogger,
    escalate_anomalies: bool,
    user_agent: String,
}

/// Bookkeeping for one attempt
struct Attempt {
    id: Uuid,
    kind: FormKind,
    started: Instant,
    states: Vec<PipelineState>,
    fields: Vec<FieldReport>,
}

impl Attempt {
    fn new(kind: FormKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            started: Instant::now(),
            states: vec![PipelineState::Idle],
            fields: vec![],
        }
    }

    fn enter(&mut self, state: PipelineState) {
        let from = self.states.last().copied().unwrap_or(PipelineState::Idle);
        debug!(submission_id = %self.id, ?from, to = ?state, "Pipeline transition");
        self.states.push(state);
    }
}

impl SubmissionPipeline {
    /// Create a pipeline around an existing session and transport
    pub fn new(
        config: &FormsConfig,
        session: Arc<Session>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let sanitizer = Sanitizer::new(session.config().max_input_length);
        Self {
            validators: Validators::new(sanitizer),
            anomaly_detector: AnomalyDetector::new(config.anomaly.clone()),
            audit_logger: AuditLogger::new(config.audit.clone()),
            escalate_anomalies: config.anomaly.escalate_to_rate_limit,
            user_agent: config.transport.user_agent.clone(),
            session,
            transport,
        }
    }

    /// Create a builder for SubmissionPipeline
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Dispatch a command from the presentation layer
    pub async fn handle(&self, command: FormCommand) -> FormEvent {
        match command {
            FormCommand::ValidateField {
                name,
                kind,
                required,
                value,
            } => FormEvent::FieldChecked(self.validate_field(&name, kind, required, &value)),
            FormCommand::Submit(form) => FormEvent::Completed(self.submit(&form).await),
        }
    }

    /// Validate one field on its own, as the user edits it
    pub fn validate_field(
        &self,
        name: &str,
        kind: FieldKind,
        required: bool,
        value: &str,
    ) -> FieldReport {
        FieldReport {
            field: name.to_string(),
            result: self.validators.check_field(kind, required, value),
        }
    }

    /// Run a form through the whole pipeline
    pub async fn submit(&self, form: &Form) -> SubmissionReport {
        let mut attempt = Attempt::new(form.kind());

        // Validating
        attempt.enter(PipelineState::Validating);
        let specs = form.fields();
        attempt.fields = specs
            .iter()
            .map(|spec| {
                let value = spec.value.unwrap_or("");
                self.validate_field(spec.name, spec.kind, spec.required, value)
            })
            .collect();

        let errors: Vec<FieldError> = attempt
            .fields
            .iter()
            .filter_map(|f| {
                f.result.error.as_ref().map(|message| FieldError {
                    field: f.field.clone(),
                    message: message.clone(),
                })
            })
            .collect();
        if !errors.is_empty() {
            let result = AuditResult::Invalid {
                fields: errors.len(),
            };
            return self.fail(attempt, None, FormError::Validation { errors }, result, None);
        }

        let submission = self.capture(form.kind(), &specs);
        let identifier = submission.identifier().to_string();

        // RateLimiting
        attempt.enter(PipelineState::RateLimiting);
        if !self.session.rate_limiter().check(&identifier).await {
            warn!(submission_id = %attempt.id, identifier = %identifier, "Submission rate limited");
            let error = FormError::RateLimitExceeded {
                identifier: identifier.clone(),
            };
            return self.fail(
                attempt,
                Some(&submission),
                error,
                AuditResult::RateLimited,
                Some(identifier),
            );
        }

        // AnomalyChecking
        attempt.enter(PipelineState::AnomalyChecking);
        if let Some(category) = self.anomaly_detector.scan(&submission) {
            if self.escalate_anomalies {
                self.session.rate_limiter().saturate(&identifier).await;
            }
            return self.fail(
                attempt,
                Some(&submission),
                FormError::AnomalyRejected,
                AuditResult::Suspicious { category },
                Some(identifier),
            );
        }

        // Submitting
        attempt.enter(PipelineState::Submitting);
        let request = self.build_request(&submission);
        let error = match self.transport.send(request).await {
            Ok(response) if response.is_success() => {
                let receipt = SubmissionReceipt {
                    submission_id: attempt.id,
                    status: response.status,
                    response: response.body,
                };
                return self.succeed(attempt, &submission, receipt, identifier);
            }
            Ok(response) => {
                FormError::SubmissionFailed(format!("endpoint returned status {}", response.status))
            }
            Err(e) => FormError::SubmissionFailed(e.to_string()),
        };

        warn!(submission_id = %attempt.id, error = %error, "Submission failed");
        self.fail(
            attempt,
            Some(&submission),
            error,
            AuditResult::Failed,
            Some(identifier),
        )
    }

    /// Sanitized values in field order
    fn capture(&self, kind: FormKind, specs: &[FieldSpec<'_>]) -> FormSubmission {
        let sanitizer = self.validators.sanitizer();
        let fields = specs
            .iter()
            .map(|spec| (spec.name.to_string(), sanitizer.sanitize_opt(spec.value)))
            .collect();
        FormSubmission::new(kind, fields)
    }

    fn build_request(&self, submission: &FormSubmission) -> OutboundRequest {
        let max_ua = self.session.config().max_user_agent_length;
        let user_agent: String = self.user_agent.chars().take(max_ua).collect();

        let mut body = match submission.fields_json() {
            serde_json::Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        body.insert("formType".into(), submission.kind().as_str().into());
        body.insert(
            "timestamp".into(),
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true).into(),
        );
        body.insert("userAgent".into(), user_agent.into());

        OutboundRequest {
            headers: vec![
                ("Content-Type".to_string(), CONTENT_TYPE_JSON.to_string()),
                (
                    CSRF_HEADER.to_string(),
                    self.session.csrf_token().as_str().to_string(),
                ),
            ],
            body: serde_json::Value::Object(body),
        }
    }

    fn succeed(
        &self,
        mut attempt: Attempt,
        submission: &FormSubmission,
        receipt: SubmissionReceipt,
        identifier: String,
    ) -> SubmissionReport {
        attempt.enter(PipelineState::Success);
        self.audit(
            &attempt,
            Some(submission),
            AuditResult::Submitted {
                status: receipt.status,
            },
            Some(identifier),
        );
        SubmissionReport {
            submission_id: attempt.id,
            form_kind: attempt.kind,
            states: attempt.states,
            fields: attempt.fields,
            outcome: Ok(receipt),
        }
    }

    fn fail(
        &self,
        mut attempt: Attempt,
        submission: Option<&FormSubmission>,
        error: FormError,
        result: AuditResult,
        identifier: Option<String>,
    ) -> SubmissionReport {
        attempt.enter(PipelineState::Failure);
        self.audit(&attempt, submission, result, identifier);
        SubmissionReport {
            submission_id: attempt.id,
            form_kind: attempt.kind,
            states: attempt.states,
            fields: attempt.fields,
            outcome: Err(error),
        }
    }

    fn audit(
        &self,
        attempt: &Attempt,
        submission: Option<&FormSubmission>,
        result: AuditResult,
        identifier: Option<String>,
    ) {
        let payload_json = submission.map(|s| s.fields_json());
        let content_hash = payload_json
            .as_ref()
            .map(|p| hash_content(&p.to_string()))
            .unwrap_or_default();

        // The full payload is only retained for suspicious rejections
        let payload = match result {
            AuditResult::Suspicious { .. } if self.audit_logger.keeps_rejected_payload() => {
                payload_json
            }
            _ => None,
        };

        self.audit_logger.record(&AuditEntry {
            submission_id: attempt.id,
            session_id: self.session.id(),
            timestamp: Utc::now(),
            form_kind: attempt.kind,
            identifier,
            result,
            content_hash,
            payload,
            processing_time_ms: attempt.started.elapsed().as_millis() as u64,
        });
    }
}

/// Builder for SubmissionPipeline
pub struct PipelineBuilder {
    config: FormsConfig,
    session: Option<Arc<Session>>,
    transport: Option<Arc<dyn Transport>>,
}

impl PipelineBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            config: FormsConfig::default(),
            session: None,
            transport: None,
        }
    }

    /// Use a full configuration
    pub fn with_config(mut self, config: FormsConfig) -> Self {
        self.config = config;
        self
    }

    /// Share an existing session (and its rate-limit history).
    ///
    /// The session's `SecurityConfig` wins over the `security` section passed
    /// to `with_config`.
    pub fn with_session(mut self, session: Arc<Session>) -> Self {
        self.session = Some(session);
        self
    }

    /// Use a specific transport instead of HTTP
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Point the HTTP transport at an endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.transport.endpoint = endpoint.into();
        self
    }

    /// Configure anomaly escalation into the rate limiter
    pub fn escalate_anomalies(mut self, enabled: bool) -> Self {
        self.config.anomaly.escalate_to_rate_limit = enabled;
        self
    }

    /// Build the pipeline
    pub fn build(self) -> Result<SubmissionPipeline> {
        self.config.validate()?;

        let session = match self.session {
            Some(session) => {
                session.config().validate()?;
                session
            }
            None => Arc::new(Session::new(self.config.security.clone())),
        };

        let transport = match self.transport {
            Some(transport) => transport,
            None => default_transport(&self.config)?,
        };

        Ok(SubmissionPipeline::new(&self.config, session, transport))
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "http-transport")]
fn default_transport(config: &FormsConfig) -> Result<Arc<dyn Transport>> {
    Ok(Arc::new(crate::transport::HttpTransport::new(&config.transport)?))
}

#[cfg(not(feature = "http-transport"))]
fn default_transport(_config: &FormsConfig) -> Result<Arc<dyn Transport>> {
    Err(FormError::ConfigError(
        "no transport supplied and the http-transport feature is disabled".to_string(),
    ))
}
