//! Configuration validation for the Vani gateway.
//!
//! Provides validation logic for configuration fields to ensure
//! all required values are present and within valid ranges.

use thiserror::Error;

use crate::config::{
    Config, ConversationConfig, GatewayConfig, NetworkConfig, ObservabilityConfig, SarvamConfig,
};

/// Configuration validation error.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid port {port}: must be between 1 and 65535")]
    InvalidPort { port: u16, field: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Multiple validation errors: {0:?}")]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Trait for validatable configuration sections.
pub trait Validate {
    /// Validate this configuration section.
    fn validate(&self) -> ValidationResult<()>;
}

impl Config {
    /// Validate the entire configuration.
    pub fn validate(&self) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if let Err(e) = self.network.validate() {
            errors.push(e);
        }
        if let Err(e) = self.sarvam.validate() {
            errors.push(e);
        }
        if let Err(e) = self.conversation.validate() {
            errors.push(e);
        }
        if let Err(e) = self.gateway.validate() {
            errors.push(e);
        }
        if let Err(e) = self.observability.validate() {
            errors.push(e);
        }

        if errors.is_empty() {
            Ok(())
        } else if errors.len() == 1 {
            Err(errors.remove(0))
        } else {
            Err(ValidationError::Multiple(errors))
        }
    }

    /// Load, apply environment overrides, and validate configuration.
    pub fn load_and_validate() -> anyhow::Result<Self> {
        let config = Self::load_with_env()?;
        config.validate().map_err(|e| anyhow::anyhow!("{}", e))?;
        Ok(config)
    }
}

impl Validate for NetworkConfig {
    fn validate(&self) -> ValidationResult<()> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort {
                port: self.port,
                field: "network.port".into(),
            });
        }

        if self.bind.parse::<std::net::IpAddr>().is_err() {
            return Err(ValidationError::InvalidValue {
                field: "network.bind".into(),
                reason: format!("not an IP address: {}", self.bind),
            });
        }

        Ok(())
    }
}

impl Validate for SarvamConfig {
    fn validate(&self) -> ValidationResult<()> {
        let has_key = self
            .api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty());
        if !has_key {
            return Err(ValidationError::MissingField {
                field: "sarvam.api_key (or SARVAM_API_KEY)".into(),
            });
        }

        if let Err(e) = url::Url::parse(&self.base_url) {
            return Err(ValidationError::InvalidValue {
                field: "sarvam.base_url".into(),
                reason: e.to_string(),
            });
        }

        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidValue {
                field: "sarvam.timeout_secs".into(),
                reason: "must be greater than 0".into(),
            });
        }

        Ok(())
    }
}

impl Validate for ConversationConfig {
    fn validate(&self) -> ValidationResult<()> {
        if self.context_window == 0 {
            return Err(ValidationError::InvalidValue {
                field: "conversation.context_window".into(),
                reason: "must be at least 1".into(),
            });
        }

        if self.history_cap < self.context_window {
            return Err(ValidationError::InvalidValue {
                field: "conversation.history_cap".into(),
                reason: format!(
                    "must be at least context_window ({})",
                    self.context_window
                ),
            });
        }

        if self.max_sessions == 0 {
            return Err(ValidationError::InvalidValue {
                field: "conversation.max_sessions".into(),
                reason: "must be at least 1".into(),
            });
        }

        if self.default_session_id.is_empty() {
            return Err(ValidationError::MissingField {
                field: "conversation.default_session_id".into(),
            });
        }

        Ok(())
    }
}

impl Validate for GatewayConfig {
    fn validate(&self) -> ValidationResult<()> {
        if self.body_limit_bytes == 0 {
            return Err(ValidationError::InvalidValue {
                field: "gateway.body_limit_bytes".into(),
                reason: "must be greater than 0".into(),
            });
        }

        Ok(())
    }
}

impl Validate for ObservabilityConfig {
    fn validate(&self) -> ValidationResult<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ValidationError::InvalidValue {
                field: "observability.log_level".into(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            });
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.log_format.to_lowercase().as_str()) {
            return Err(ValidationError::InvalidValue {
                field: "observability.log_format".into(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            });
        }

        Ok(())
    }
}
