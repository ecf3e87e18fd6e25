//! Audit logging for submissions

use crate::config::AuditConfig;
use crate::types::{AuditEntry, AuditResult};

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::io::Write;
use tracing::{info, warn};

/// Audit logger
pub struct AuditLogger {
    config: AuditConfig,
}

impl AuditLogger {
    /// Create a new audit logger
    pub fn new(config: AuditConfig) -> Self {
        Self { config }
    }

    /// Whether rejected-as-suspicious payloads should be kept in full
    pub fn keeps_rejected_payload(&self) -> bool {
        self.config.enabled && self.config.log_rejected_payload
    }

    /// Record a completed submission attempt
    pub fn record(&self, entry: &AuditEntry) {
        if !self.config.enabled {
            return;
        }

        match &entry.result {
            AuditResult::Suspicious { category } => {
                let payload = entry
                    .payload
                    .as_ref()
                    .map(|p| truncate(&p.to_string(), 4096));
                warn!(
                    submission_id = %entry.submission_id,
                    session_id = %entry.session_id,
                    form_kind = %entry.form_kind,
                    identifier = ?entry.identifier,
                    category = %category,
                    content_hash = %entry.content_hash,
                    payload = ?payload,
                    "Suspicious submission rejected"
                );
            }
            result => {
                info!(
                    submission_id = %entry.submission_id,
                    session_id = %entry.session_id,
                    form_kind = %entry.form_kind,
                    identifier = ?entry.identifier,
                    result = ?result,
                    content_hash = %entry.content_hash,
                    processing_time_ms = entry.processing_time_ms,
                    "Form submission audit"
                );
            }
        }

        if let Some(ref path) = self.config.log_file {
            if let Err(e) = append_json_line(path, entry) {
                warn!(path = %path, error = %e, "Failed to write audit entry");
            }
        }
    }
}

fn append_json_line(path: &str, entry: &AuditEntry) -> std::io::Result<()> {
    let json = serde_json::to_string(entry)?;
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    writeln!(file, "{json}")
}

/// Hash content for audit (privacy-preserving)
pub(crate) fn hash_content(content: &str) -> String {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    format!("{:x}", hasher.finish())
}

/// Truncate string for logging
fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::AnomalyCategory;
    use crate::form::FormKind;
    use chrono::Utc;
    use uuid::Uuid;

    fn entry(result: AuditResult, payload: Option<serde_json::Value>) -> AuditEntry {
        AuditEntry {
            submission_id: Uuid::new_v4(),
            session_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            form_kind: FormKind::Donation,
            identifier: Some("a@b.co".to_string()),
            result,
            content_hash: hash_content("payload"),
            payload,
            processing_time_ms: 3,
        }
    }

    #[test]
    fn test_hash_content() {
        assert_eq!(hash_content("test"), hash_content("test"));
        assert_ne!(hash_content("test"), hash_content("different"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("this is a longer string", 10), "this is a ...");
        assert_eq!(truncate("ééééé", 2), "éé...");
    }

    #[test]
    fn test_audit_disabled() {
        let logger = AuditLogger::new(AuditConfig {
            enabled: false,
            ..Default::default()
        });
        assert!(!logger.keeps_rejected_payload());
        logger.record(&entry(AuditResult::RateLimited, None));
    }

    #[test]
    fn test_writes_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let logger = AuditLogger::new(AuditConfig {
            log_file: Some(path.to_string_lossy().into_owned()),
            ..Default::default()
        });

        logger.record(&entry(AuditResult::Submitted { status: 200 }, None));
        logger.record(&entry(
            AuditResult::Suspicious {
                category: AnomalyCategory::ScriptMarker,
            },
            Some(serde_json::json!({"message": "script"})),
        ));

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let second: AuditEntry = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(
            second.payload,
            Some(serde_json::json!({"message": "script"}))
        );
    }
}
