//! Route definitions for Vani Gateway.
//!
//! Provides the chat, legacy translation, text-to-speech, language listing,
//! session management, and health endpoints.

use crate::conversation::{ConversationStore, Exchange};
use crate::language::{code_for, language_names};
use crate::prompt::{build_messages, TELUGU_ASSISTANT_PROMPT};
use crate::provider::{ProviderError, SpeechProvider, TranslateRequest};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
    Router,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use vani_common::config::Config;
use vani_common::util::{format_timestamp, truncate_with_ellipsis, utc_timestamp};

/// Telugu apology returned when the chat upstream fails.
pub const CHAT_FALLBACK_MESSAGE: &str =
    "క్షమించండి, ఇప్పుడు సమాధానం ఇవ్వలేకపోతున్నాను. దయచేసి మళ్లీ ప్రయత్నించండి.";

/// Prefix that turns a plain English→Telugu translation into a conversational reply.
pub const CONVERSATIONAL_PREFIX: &str = "Please respond to this naturally in Telugu: ";

/// Per-deployment values the handlers need.
#[derive(Debug, Clone)]
pub struct RouteSettings {
    pub user_label: String,
    pub context_window: usize,
    pub default_session_id: String,
}

impl RouteSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            user_label: config.gateway.user_label.clone(),
            context_window: config.conversation.context_window,
            default_session_id: config.conversation.default_session_id.clone(),
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ConversationStore>,
    pub provider: Arc<dyn SpeechProvider>,
    pub settings: Arc<RouteSettings>,
}

impl AppState {
    pub fn new(
        store: Arc<ConversationStore>,
        provider: Arc<dyn SpeechProvider>,
        settings: RouteSettings,
    ) -> Self {
        Self {
            store,
            provider,
            settings: Arc::new(settings),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Request-scoped failure, rendered as `{success: false, message}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The caller sent something unusable.
    #[error("{0}")]
    BadRequest(String),

    /// The upstream call failed; reported as 500.
    #[error("Error: {0}")]
    Upstream(#[from] ProviderError),

    /// The upstream answered with an error status that is passed through.
    #[error("{message}")]
    UpstreamStatus { status: StatusCode, message: String },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::UpstreamStatus { status, .. } => *status,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            success: false,
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Map a JSON extraction result onto the gateway's 400 contract.
fn parse_body<T: DeserializeOwned>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(JsonRejection::MissingJsonContentType(_)) => {
            Err(ApiError::BadRequest("No data provided".into()))
        }
        Err(rejection) => Err(ApiError::BadRequest(format!(
            "Invalid request body: {}",
            rejection.body_text()
        ))),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// ─────────────────────────────────────────────────────────────────────────────
// Request / Response Types
// ─────────────────────────────────────────────────────────────────────────────

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

/// Languages listing.
#[derive(Debug, Serialize, Deserialize)]
pub struct LanguagesResponse {
    pub success: bool,
    pub languages: Vec<String>,
}

/// Chat request body.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Successful chat reply.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub success: bool,
    pub telugu_response: String,
    pub english_question: String,
    pub timestamp: String,
    pub session_id: String,
    pub user: String,
}

/// Chat reply when the upstream failed.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatFailureResponse {
    pub success: bool,
    pub telugu_response: String,
    pub english_question: String,
    pub timestamp: String,
    pub session_id: String,
    pub user: String,
    pub error: String,
}

/// Legacy translation request body.
#[derive(Debug, Deserialize)]
pub struct TranslateBody {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, rename = "sourceLang")]
    pub source_lang: Option<String>,
    #[serde(default, rename = "targetLang")]
    pub target_lang: Option<String>,
}

/// Legacy translation reply.
#[derive(Debug, Serialize, Deserialize)]
pub struct TranslateResponse {
    pub success: bool,
    pub translated_text: String,
    pub source_lang: String,
    pub target_lang: String,
    pub timestamp: String,
    pub user: String,
}

/// Text-to-speech request body.
#[derive(Debug, Deserialize)]
pub struct TextToSpeechBody {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, rename = "languageCode")]
    pub language_code: Option<String>,
}

/// Text-to-speech reply.
#[derive(Debug, Serialize, Deserialize)]
pub struct TextToSpeechResponse {
    pub success: bool,
    pub audio_data: Option<String>,
    pub message: String,
}

/// System information.
#[derive(Debug, Serialize, Deserialize)]
pub struct SystemInfoResponse {
    pub success: bool,
    pub timestamp: String,
    pub user: String,
}

/// Session clear result.
#[derive(Debug, Serialize, Deserialize)]
pub struct ClearSessionResponse {
    pub success: bool,
    pub session_id: String,
    pub cleared: bool,
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub service: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Routers
// ─────────────────────────────────────────────────────────────────────────────

/// Build the `/api` routes.
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/languages", get(languages_handler))
        .route("/api/chat", post(chat_handler))
        .route("/api/translate", post(translate_handler))
        .route("/api/text-to-speech", post(text_to_speech_handler))
        .route("/api/system-info", get(system_info_handler))
        .route("/api/sessions/:id", delete(clear_session_handler))
        .with_state(state)
}

/// Build health check routes.
pub fn health_routes() -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/health", get(health_handler))
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

async fn languages_handler() -> Json<LanguagesResponse> {
    Json(LanguagesResponse {
        success: true,
        languages: language_names().into_iter().map(String::from).collect(),
    })
}

/// Answer a question in Telugu using the session's recent exchanges as context.
async fn chat_handler(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, Response> {
    let request = parse_body(payload).map_err(IntoResponse::into_response)?;

    let question = non_blank(request.question).ok_or_else(|| {
        ApiError::BadRequest("Missing required field: question".into()).into_response()
    })?;
    let session_id = non_blank(request.session_id)
        .unwrap_or_else(|| state.settings.default_session_id.clone());

    let history = state
        .store
        .get_recent(&session_id, state.settings.context_window);

    tracing::info!(
        session_id = %session_id,
        history = history.len(),
        question_chars = question.chars().count(),
        "Processing chat question"
    );
    tracing::debug!(question = %truncate_with_ellipsis(&question, 80), "Chat question");

    let messages = build_messages(TELUGU_ASSISTANT_PROMPT, &history, &question);
    let start = Instant::now();

    match state.provider.chat(messages).await {
        Ok(reply) => {
            let exchange = Exchange::new(question.clone(), reply.clone());
            let timestamp = format_timestamp(exchange.timestamp);
            state.store.append(&session_id, exchange);

            tracing::info!(
                session_id = %session_id,
                latency_ms = start.elapsed().as_millis() as u64,
                reply_chars = reply.chars().count(),
                "Generated chat response"
            );

            Ok(Json(ChatResponse {
                success: true,
                telugu_response: reply,
                english_question: question,
                timestamp,
                session_id,
                user: state.settings.user_label.clone(),
            }))
        }
        Err(err) => {
            tracing::error!(session_id = %session_id, error = %err, "Chat completion failed");

            let body = ChatFailureResponse {
                success: false,
                telugu_response: CHAT_FALLBACK_MESSAGE.into(),
                english_question: question,
                timestamp: utc_timestamp(),
                session_id,
                user: state.settings.user_label.clone(),
                error: err.to_string(),
            };
            Err((StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response())
        }
    }
}

/// Translate text between two supported languages.
///
/// English→Telugu is answered conversationally rather than translated literally.
async fn translate_handler(
    State(state): State<AppState>,
    payload: Result<Json<TranslateBody>, JsonRejection>,
) -> Result<Json<TranslateResponse>, ApiError> {
    let body = parse_body(payload)?;

    let text = non_blank(body.text)
        .ok_or_else(|| ApiError::BadRequest("Missing required field: text".into()))?;
    let source_lang = body.source_lang.unwrap_or_else(|| "English".into());
    let target_lang = body.target_lang.unwrap_or_else(|| "Telugu".into());

    if source_lang == target_lang {
        return Err(ApiError::BadRequest(format!(
            "Source and target languages must differ (both are {source_lang})"
        )));
    }

    let unsupported = |name: &str| {
        ApiError::BadRequest(format!(
            "Unsupported language: {name}. See /api/languages for supported languages"
        ))
    };
    let source_code = code_for(&source_lang).ok_or_else(|| unsupported(&source_lang))?;
    let target_code = code_for(&target_lang).ok_or_else(|| unsupported(&target_lang))?;

    let conversational = source_lang == "English" && target_lang == "Telugu";
    let request = TranslateRequest {
        input: if conversational {
            format!("{CONVERSATIONAL_PREFIX}{text}")
        } else {
            text
        },
        source_language_code: source_code.into(),
        target_language_code: target_code.into(),
        enable_preprocessing: conversational,
    };

    tracing::info!(
        source = source_code,
        target = target_code,
        conversational,
        "Processing translation"
    );

    let translated_text = state.provider.translate(request).await.map_err(|err| {
        tracing::error!(error = %err, "Translation failed");
        ApiError::from(err)
    })?;

    Ok(Json(TranslateResponse {
        success: true,
        translated_text,
        source_lang,
        target_lang,
        timestamp: utc_timestamp(),
        user: state.settings.user_label.clone(),
    }))
}

/// Synthesize speech, passing upstream error statuses through.
async fn text_to_speech_handler(
    State(state): State<AppState>,
    payload: Result<Json<TextToSpeechBody>, JsonRejection>,
) -> Result<Json<TextToSpeechResponse>, ApiError> {
    let body = parse_body(payload)?;

    let (Some(text), Some(language_code)) = (non_blank(body.text), non_blank(body.language_code))
    else {
        return Err(ApiError::BadRequest(
            "Missing required fields: text, languageCode".into(),
        ));
    };

    tracing::info!(
        language_code = %language_code,
        text_chars = text.chars().count(),
        "Processing text-to-speech"
    );

    let audio_data = state
        .provider
        .text_to_speech(&text, &language_code)
        .await
        .map_err(|err| {
            tracing::error!(error = %err, "Text-to-speech failed");
            match err.status_code {
                Some(status) => ApiError::UpstreamStatus {
                    status: StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                    message: format!("Error from TTS API: {}", err.message),
                },
                None => ApiError::Upstream(err),
            }
        })?;

    Ok(Json(TextToSpeechResponse {
        success: true,
        audio_data,
        message: "Text-to-speech conversion successful".into(),
    }))
}

async fn system_info_handler(State(state): State<AppState>) -> Json<SystemInfoResponse> {
    Json(SystemInfoResponse {
        success: true,
        timestamp: utc_timestamp(),
        user: state.settings.user_label.clone(),
    })
}

/// Forget a session's history.
async fn clear_session_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Json<ClearSessionResponse> {
    let cleared = state.store.clear(&session_id);
    tracing::info!(session_id = %session_id, cleared, "Session cleared");

    Json(ClearSessionResponse {
        success: true,
        session_id,
        cleared,
    })
}

/// Health check handler.
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        service: "vani-gateway".into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Operation;

    #[test]
    fn api_error_statuses() {
        assert_eq!(
            ApiError::BadRequest("x".into()).status(),
            StatusCode::BAD_REQUEST
        );

        let upstream = ProviderError::new("sarvam", Operation::Translate, "down");
        let err = ApiError::from(upstream);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Error: [sarvam:translate] down");

        let err = ApiError::UpstreamStatus {
            status: StatusCode::UNAUTHORIZED,
            message: "Error from TTS API: bad key".into(),
        };
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn non_blank_filters_whitespace() {
        assert_eq!(non_blank(Some("  ".into())), None);
        assert_eq!(non_blank(None), None);
        assert_eq!(non_blank(Some("hi".into())), Some("hi".into()));
    }

    #[test]
    fn settings_from_config() {
        let settings = RouteSettings::from_config(&Config::default());
        assert_eq!(settings.context_window, 3);
        assert_eq!(settings.default_session_id, "default");
        assert_eq!(settings.user_label, "JPKrishna28");
    }
}
