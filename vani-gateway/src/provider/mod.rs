//! Speech/translation provider abstraction.
//!
//! The gateway talks to one upstream (Sarvam) through the [`SpeechProvider`]
//! trait so that routes can be exercised against a scripted provider.

mod sarvam;

pub use sarvam::SarvamProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// ============================================================================
// Provider Trait
// ============================================================================

/// Unified interface for the upstream speech/translation API.
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &str;

    /// Send an ordered message list and return the trimmed reply.
    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String, ProviderError>;

    /// Translate text between two language codes.
    async fn translate(&self, request: TranslateRequest) -> Result<String, ProviderError>;

    /// Synthesize speech. Returns base64 audio when the upstream sent any.
    async fn text_to_speech(
        &self,
        text: &str,
        language_code: &str,
    ) -> Result<Option<String>, ProviderError>;
}

// ============================================================================
// Errors
// ============================================================================

/// Which upstream call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Chat,
    Translate,
    TextToSpeech,
}

impl Operation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Translate => "translate",
            Self::TextToSpeech => "text-to-speech",
        }
    }
}

/// Error from a provider.
#[derive(Debug, Clone)]
pub struct ProviderError {
    pub provider: String,
    pub operation: Operation,
    pub message: String,
    /// Upstream HTTP status, when the upstream answered at all.
    pub status_code: Option<u16>,
    pub timed_out: bool,
}

impl ProviderError {
    pub fn new(provider: impl Into<String>, operation: Operation, message: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            operation,
            message: message.into(),
            status_code: None,
            timed_out: false,
        }
    }

    /// An error carrying the upstream's non-success status and body.
    pub fn http(
        provider: impl Into<String>,
        operation: Operation,
        status: u16,
        body: impl Into<String>,
    ) -> Self {
        Self {
            status_code: Some(status),
            ..Self::new(provider, operation, body)
        }
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status_code {
            Some(status) => write!(
                f,
                "[{}:{}] HTTP {}: {}",
                self.provider,
                self.operation.as_str(),
                status,
                self.message
            ),
            None => write!(
                f,
                "[{}:{}] {}",
                self.provider,
                self.operation.as_str(),
                self.message
            ),
        }
    }
}

impl std::error::Error for ProviderError {}

impl From<ProviderError> for vani_common::Error {
    fn from(err: ProviderError) -> Self {
        if err.timed_out {
            Self::Timeout
        } else {
            Self::External(err.to_string())
        }
    }
}

// ============================================================================
// Request Types
// ============================================================================

/// Speaker role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// A text translation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslateRequest {
    pub input: String,
    pub source_language_code: String,
    pub target_language_code: String,
    pub enable_preprocessing: bool,
}
