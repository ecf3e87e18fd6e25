//! Suspicious payload screening
//!
//! A coarse keyword filter over the lowercased payload. It trips on plenty of
//! honest text (a volunteer who writes "I can help with the script for the
//! phone tree" gets rejected) and catches nothing that is even lightly
//! encoded. It exists to turn away lazy probes, never as the only defense.

use crate::config::AnomalyConfig;
use crate::form::FormSubmission;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Pattern families, in the order they are tested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyCategory {
    /// `script`, `javascript`, `onload`, `onerror`
    ScriptMarker,
    /// `<iframe`, `<object`, `<embed`
    EmbeddedTag,
    /// `eval(`, `exec(`, `system(`
    CodeExecution,
    /// `${...}`
    TemplateInjection,
    /// `union ... select`, `drop ... table`, `insert ... into`
    SqlInjection,
}

impl std::fmt::Display for AnomalyCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnomalyCategory::ScriptMarker => write!(f, "Script Marker"),
            AnomalyCategory::EmbeddedTag => write!(f, "Embedded Tag"),
            AnomalyCategory::CodeExecution => write!(f, "Code Execution"),
            AnomalyCategory::TemplateInjection => write!(f, "Template Injection"),
            AnomalyCategory::SqlInjection => write!(f, "SQL Injection"),
        }
    }
}

struct AnomalyPattern {
    regex: Regex,
    category: AnomalyCategory,
}

/// Screens serialized form data against a fixed pattern list
pub struct AnomalyDetector {
    config: AnomalyConfig,
    patterns: Vec<AnomalyPattern>,
}

impl AnomalyDetector {
    /// Create a new anomaly detector
    pub fn new(config: AnomalyConfig) -> Self {
        let table = [
            (r"script|javascript|onload|onerror", AnomalyCategory::ScriptMarker),
            (r"<iframe|<object|<embed", AnomalyCategory::EmbeddedTag),
            (r"eval\(|exec\(|system\(", AnomalyCategory::CodeExecution),
            (r"\$\{.*\}", AnomalyCategory::TemplateInjection),
            (
                r"union.*select|drop.*table|insert.*into",
                AnomalyCategory::SqlInjection,
            ),
        ];

        let patterns = table
            .into_iter()
            .map(|(pattern, category)| AnomalyPattern {
                regex: Regex::new(pattern).expect("valid regex"),
                category,
            })
            .collect();

        Self { config, patterns }
    }

    /// First matching category for an already-serialized payload
    pub fn scan_text(&self, serialized: &str) -> Option<AnomalyCategory> {
        if !self.config.enabled {
            return None;
        }

        let lower = serialized.to_lowercase();
        self.patterns
            .iter()
            .find(|p| p.regex.is_match(&lower))
            .map(|p| p.category)
    }

    /// First matching category for a JSON payload
    pub fn scan_json(&self, payload: &serde_json::Value) -> Option<AnomalyCategory> {
        self.scan_text(&payload.to_string())
    }

    /// First matching category for a captured submission
    pub fn scan(&self, submission: &FormSubmission) -> Option<AnomalyCategory> {
        self.scan_json(&submission.fields_json())
    }

    /// Whether a captured submission looks suspicious
    pub fn is_suspicious(&self, submission: &FormSubmission) -> bool {
        self.scan(submission).is_some()
    }

    /// Whether a JSON payload looks suspicious
    pub fn is_suspicious_json(&self, payload: &serde_json::Value) -> bool {
        self.scan_json(payload).is_some()
    }
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self::new(AnomalyConfig::default())
    }
}
