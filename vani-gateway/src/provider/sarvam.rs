//! Sarvam AI provider.
//!
//! Speaks three Sarvam REST endpoints:
//! - `POST /v1/chat/completions` (OpenAI-compatible chat)
//! - `POST /translate`
//! - `POST /text-to-speech`
//!
//! Every call authenticates with the `api-subscription-key` header.

use super::{ChatMessage, Operation, ProviderError, SpeechProvider, TranslateRequest};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::{Duration, Instant};
use vani_common::config::SarvamConfig;
use vani_common::util::{sanitize_for_log, truncate_with_ellipsis};

const PROVIDER_NAME: &str = "sarvam";
const AUTH_HEADER: &str = "api-subscription-key";

/// Client for the Sarvam cloud API.
pub struct SarvamProvider {
    base_url: String,
    api_key: String,
    chat_model: String,
    translate_model: String,
    speaker_gender: String,
    mode: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct SarvamChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct SarvamChatResponse {
    #[serde(default)]
    choices: Vec<SarvamChoice>,
}

#[derive(Debug, Deserialize)]
struct SarvamChoice {
    message: SarvamResponseMessage,
}

#[derive(Debug, Deserialize)]
struct SarvamResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct SarvamTranslateRequest<'a> {
    input: &'a str,
    source_language_code: &'a str,
    target_language_code: &'a str,
    speaker_gender: &'a str,
    mode: &'a str,
    model: &'a str,
    enable_preprocessing: bool,
}

#[derive(Debug, Deserialize)]
struct SarvamTranslateResponse {
    translated_text: String,
}

#[derive(Debug, Serialize)]
struct SarvamTtsRequest<'a> {
    text: &'a str,
    target_language_code: &'a str,
}

#[derive(Debug, Deserialize)]
struct SarvamTtsResponse {
    #[serde(default)]
    audio_content: Option<String>,
    #[serde(default)]
    audios: Vec<String>,
}

impl SarvamTtsResponse {
    fn into_audio(self) -> Option<String> {
        self.audio_content
            .or_else(|| self.audios.into_iter().next())
    }
}

impl SarvamProvider {
    /// Create a provider from config.
    ///
    /// Fails when no API key is configured or the HTTP client cannot be built.
    pub fn new(config: &SarvamConfig) -> vani_common::Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                vani_common::Error::Config(
                    "Sarvam API key not set. Set SARVAM_API_KEY or sarvam.api_key.".into(),
                )
            })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| vani_common::Error::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            chat_model: config.chat_model.clone(),
            translate_model: config.translate_model.clone(),
            speaker_gender: config.speaker_gender.clone(),
            mode: config.mode.clone(),
            client,
        })
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .header(AUTH_HEADER, self.api_key.as_str())
    }

    fn transport_error(operation: Operation, err: &reqwest::Error) -> ProviderError {
        let mut error = ProviderError::new(
            PROVIDER_NAME,
            operation,
            format!("Request failed: {}", err),
        );
        error.timed_out = err.is_timeout();
        error
    }

    /// Send a request and decode a successful JSON body.
    async fn send_json<T: DeserializeOwned>(
        &self,
        operation: Operation,
        request: RequestBuilder,
    ) -> Result<T, ProviderError> {
        let start = Instant::now();

        let response = request
            .send()
            .await
            .map_err(|e| Self::transport_error(operation, &e))?;

        let response = Self::check_status(operation, response).await?;

        let body = response.json::<T>().await.map_err(|e| {
            ProviderError::new(
                PROVIDER_NAME,
                operation,
                format!("Failed to parse response: {}", e),
            )
        })?;

        tracing::debug!(
            operation = operation.as_str(),
            latency_ms = start.elapsed().as_millis() as u64,
            "Sarvam call completed"
        );

        Ok(body)
    }

    async fn check_status(operation: Operation, response: Response) -> Result<Response, ProviderError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response.text().await.unwrap_or_default();
        tracing::warn!(
            operation = operation.as_str(),
            status = status.as_u16(),
            body = %truncate_with_ellipsis(&sanitize_for_log(&error_text), 200),
            "Sarvam returned an error status"
        );

        Err(ProviderError::http(
            PROVIDER_NAME,
            operation,
            status.as_u16(),
            error_text,
        ))
    }
}

#[async_trait]
impl SpeechProvider for SarvamProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String, ProviderError> {
        let body = SarvamChatRequest {
            model: &self.chat_model,
            messages: &messages,
        };

        let result: SarvamChatResponse = self
            .send_json(Operation::Chat, self.post("/v1/chat/completions").json(&body))
            .await?;

        let content = result
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                ProviderError::new(PROVIDER_NAME, Operation::Chat, "No response from sarvam")
            })?;

        Ok(content.trim().to_string())
    }

    async fn translate(&self, request: TranslateRequest) -> Result<String, ProviderError> {
        let body = SarvamTranslateRequest {
            input: &request.input,
            source_language_code: &request.source_language_code,
            target_language_code: &request.target_language_code,
            speaker_gender: &self.speaker_gender,
            mode: &self.mode,
            model: &self.translate_model,
            enable_preprocessing: request.enable_preprocessing,
        };

        let result: SarvamTranslateResponse = self
            .send_json(Operation::Translate, self.post("/translate").json(&body))
            .await?;

        Ok(result.translated_text)
    }

    async fn text_to_speech(
        &self,
        text: &str,
        language_code: &str,
    ) -> Result<Option<String>, ProviderError> {
        let body = SarvamTtsRequest {
            text,
            target_language_code: language_code,
        };

        let result: SarvamTtsResponse = self
            .send_json(Operation::TextToSpeech, self.post("/text-to-speech").json(&body))
            .await?;

        Ok(result.into_audio())
    }
}
