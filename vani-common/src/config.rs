//! Configuration management for the Vani gateway.
//!
//! Configuration lives at `~/.vani/config.json`. A missing file is not an
//! error; defaults are used and environment variables are layered on top.
//!
//! # Configuration Priority
//!
//! 1. Environment variables
//! 2. Explicit config file values
//! 3. Default values
//!
//! # Environment Variable Mapping
//!
//! - `SARVAM_API_KEY` → sarvam.api_key
//! - `SARVAM_BASE_URL` → sarvam.base_url
//! - `VANI_BIND_ADDRESS` → network.bind
//! - `VANI_PORT` → network.port
//! - `VANI_LOG_LEVEL` → observability.log_level
//! - `VANI_LOG_FORMAT` → observability.log_format
//!
//! The Sarvam API key has no default. [`Config::validate`](crate::validation)
//! rejects a configuration without one, so the gateway refuses to start.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".vani"),
        |dirs| dirs.home_dir().join(".vani"),
    )
}

/// Get the configuration file path.
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

// ============================================================================
// Network Configuration
// ============================================================================

/// Listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Bind address. Default: "0.0.0.0"
    #[serde(default = "default_bind_address")]
    pub bind: String,

    /// Listen port. Default: 5000
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind: default_bind_address(),
            port: default_port(),
        }
    }
}

// ============================================================================
// Sarvam Provider Configuration
// ============================================================================

/// Credentials and call options for the Sarvam cloud API.
#[derive(Clone, Serialize, Deserialize)]
pub struct SarvamConfig {
    /// API subscription key. Required.
    #[serde(default)]
    pub api_key: Option<String>,

    /// API base URL
    #[serde(default = "default_sarvam_base_url")]
    pub base_url: String,

    /// Model used for chat completions
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Model used for text translation
    #[serde(default = "default_translate_model")]
    pub translate_model: String,

    /// Speaker gender hint sent with translations
    #[serde(default = "default_speaker_gender")]
    pub speaker_gender: String,

    /// Translation mode
    #[serde(default = "default_translate_mode")]
    pub mode: String,

    /// Whole-request timeout for upstream calls
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// TCP connect timeout for upstream calls
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for SarvamConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_sarvam_base_url(),
            chat_model: default_chat_model(),
            translate_model: default_translate_model(),
            speaker_gender: default_speaker_gender(),
            mode: default_translate_mode(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for SarvamConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SarvamConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("base_url", &self.base_url)
            .field("chat_model", &self.chat_model)
            .field("translate_model", &self.translate_model)
            .field("speaker_gender", &self.speaker_gender)
            .field("mode", &self.mode)
            .field("timeout_secs", &self.timeout_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

// ============================================================================
// Conversation Configuration
// ============================================================================

/// Limits for the in-memory conversation store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Maximum exchanges retained per session
    #[serde(default = "default_history_cap")]
    pub history_cap: usize,

    /// Number of most recent exchanges replayed as prompt context
    #[serde(default = "default_context_window")]
    pub context_window: usize,

    /// Maximum number of distinct sessions before LRU eviction
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Session id used when a request does not carry one
    #[serde(default = "default_session_id")]
    pub default_session_id: String,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            history_cap: default_history_cap(),
            context_window: default_context_window(),
            max_sessions: default_max_sessions(),
            default_session_id: default_session_id(),
        }
    }
}

// ============================================================================
// Gateway Configuration
// ============================================================================

/// Response-level settings for the HTTP surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Operator label echoed back in the `user` field of responses
    #[serde(default = "default_user_label")]
    pub user_label: String,

    /// Maximum accepted request body size in bytes
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            user_label: default_user_label(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

// ============================================================================
// Observability Configuration
// ============================================================================

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level", alias = "level")]
    pub log_level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format", alias = "format")]
    pub log_format: String,

    /// Additional module targets pinned to `warn`.
    #[serde(default)]
    pub excluded_targets: Vec<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            excluded_targets: Vec::new(),
        }
    }
}

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration for the gateway.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub sarvam: SarvamConfig,

    #[serde(default)]
    pub conversation: ConversationConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from the default path, falling back to defaults.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            tracing::info!("Config file not found, using defaults");
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Load configuration with environment variable overrides.
    pub fn load_with_env() -> Result<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides using an arbitrary variable lookup.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("SARVAM_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.sarvam.api_key = Some(key);
        }
        if let Some(url) = lookup("SARVAM_BASE_URL") {
            self.sarvam.base_url = url;
        }

        if let Some(bind) = lookup("VANI_BIND_ADDRESS") {
            self.network.bind = bind;
        }
        if let Some(port) = lookup("VANI_PORT") {
            match port.parse() {
                Ok(p) => self.network.port = p,
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid VANI_PORT"),
            }
        }

        if let Some(level) = lookup("VANI_LOG_LEVEL") {
            self.observability.log_level = level;
        }
        if let Some(format) = lookup("VANI_LOG_FORMAT") {
            self.observability.log_format = format;
        }
    }

    /// Address the HTTP listener binds to, as `host:port`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.network.bind, self.network.port)
    }

    /// The configured Sarvam API key, if any non-empty key is set.
    pub fn api_key(&self) -> Option<&str> {
        self.sarvam
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
    }
}

// ============================================================================
// Defaults
// ============================================================================

fn default_bind_address() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    5000
}

fn default_sarvam_base_url() -> String {
    "https://api.sarvam.ai".into()
}

fn default_chat_model() -> String {
    "sarvam-m".into()
}

fn default_translate_model() -> String {
    "mayura:v1".into()
}

fn default_speaker_gender() -> String {
    "Male".into()
}

fn default_translate_mode() -> String {
    "classic-colloquial".into()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_history_cap() -> usize {
    20
}

fn default_context_window() -> usize {
    3
}

fn default_max_sessions() -> usize {
    10_000
}

fn default_session_id() -> String {
    "default".into()
}

fn default_user_label() -> String {
    "JPKrishna28".into()
}

fn default_body_limit() -> usize {
    1024 * 1024
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}
