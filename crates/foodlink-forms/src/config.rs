//! Configuration for FoodLink forms

use crate::error::{FormError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration for the submission pipeline
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FormsConfig {
    /// Session-wide limits
    pub security: SecurityConfig,
    /// Anomaly screening
    pub anomaly: AnomalyConfig,
    /// Audit logging
    pub audit: AuditConfig,
    /// Outbound transport
    pub transport: TransportConfig,
}

impl FormsConfig {
    /// Parse a TOML document. Missing sections fall back to defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(contents).map_err(|e| FormError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Serialize back to TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| FormError::ConfigError(e.to_string()))
    }

    /// Reject values that would make the pipeline meaningless
    pub fn validate(&self) -> Result<()> {
        self.security.validate()?;
        if self.transport.endpoint.trim().is_empty() {
            return Err(FormError::ConfigError(
                "transport.endpoint must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Process-wide limits shared by every form in a session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Submissions allowed per identifier inside one window
    pub max_submissions: usize,
    /// Sliding window length in seconds
    pub window_secs: u64,
    /// Max characters kept by the sanitizer
    pub max_input_length: usize,
    /// Max characters of the user agent sent with each submission
    pub max_user_agent_length: usize,
}

impl SecurityConfig {
    /// Window as a `Duration`
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    /// Reject zero limits
    pub fn validate(&self) -> Result<()> {
        if self.max_submissions == 0 {
            return Err(FormError::ConfigError(
                "security.max_submissions must be at least 1".to_string(),
            ));
        }
        if self.window_secs == 0 {
            return Err(FormError::ConfigError(
                "security.window_secs must be at least 1".to_string(),
            ));
        }
        if self.max_input_length == 0 {
            return Err(FormError::ConfigError(
                "security.max_input_length must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_submissions: 5,
            window_secs: 5 * 60,
            max_input_length: 500,
            max_user_agent_length: 200,
        }
    }
}

/// Anomaly screening configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    /// Enable anomaly screening
    pub enabled: bool,
    /// Fill the identifier's rate-limit window when a payload is rejected
    pub escalate_to_rate_limit: bool,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            escalate_to_rate_limit: false,
        }
    }
}

/// Audit logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Enable audit logging
    pub enabled: bool,
    /// Include the full payload of rejected-as-suspicious submissions
    pub log_rejected_payload: bool,
    /// JSON-lines file receiving audit entries
    pub log_file: Option<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_rejected_payload: true,
            log_file: None,
        }
    }
}

/// Outbound transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Submission endpoint
    pub endpoint: String,
    /// Request timeout. `None` leaves the client default in place.
    pub timeout_ms: Option<u64>,
    /// User agent reported in the payload and on the request
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080/api/submit".to_string(),
            timeout_ms: None,
            user_agent: concat!("foodlink-forms/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FormsConfig::default();
        assert_eq!(config.security.max_submissions, 5);
        assert_eq!(config.security.window(), Duration::from_secs(300));
        assert_eq!(config.security.max_input_length, 500);
        assert_eq!(config.security.max_user_agent_length, 200);
        assert!(config.anomaly.enabled);
        assert!(!config.anomaly.escalate_to_rate_limit);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config = FormsConfig::from_toml_str(
            r#"
            [security]
            max_submissions = 3

            [transport]
            endpoint = "https://example.org/submit"
            timeout_ms = 2500
            "#,
        )
        .unwrap();

        assert_eq!(config.security.max_submissions, 3);
        assert_eq!(config.security.window_secs, 300);
        assert_eq!(config.transport.endpoint, "https://example.org/submit");
        assert_eq!(config.transport.timeout_ms, Some(2500));
    }

    #[test]
    fn test_invalid_toml_rejected() {
        let err = FormsConfig::from_toml_str("[security]\nmax_submissions = 0\n").unwrap_err();
        assert!(matches!(err, FormError::ConfigError(_)));

        let err = FormsConfig::from_toml_str("not = [valid").unwrap_err();
        assert!(matches!(err, FormError::ConfigError(_)));
    }

    #[test]
    fn test_toml_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forms.toml");
        let mut config = FormsConfig::default();
        config.anomaly.escalate_to_rate_limit = true;
        std::fs::write(&path, config.to_toml_string().unwrap()).unwrap();

        let loaded = FormsConfig::load(&path).unwrap();
        assert!(loaded.anomaly.escalate_to_rate_limit);
    }
}
