//! Integration tests for Vani Gateway.
//!
//! Drives the full router against a scripted provider, covering chat
//! context handling, translation rules, and text-to-speech passthrough.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use serde_json::{json, Value};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use vani_gateway::provider::{
    ChatMessage, Operation, ProviderError, Role, SpeechProvider, TranslateRequest,
};
use vani_gateway::routes::{CHAT_FALLBACK_MESSAGE, CONVERSATIONAL_PREFIX};
use vani_gateway::{build_router, AppState, ConversationStore, RouteSettings, StoreLimits};

/// How the scripted provider answers text-to-speech calls.
#[derive(Clone)]
enum TtsOutcome {
    Audio(&'static str),
    Status(u16, &'static str),
    Transport,
}

/// Provider double that records calls and answers from a script.
struct ScriptedProvider {
    fail_chat: bool,
    fail_translate: bool,
    tts: TtsOutcome,
    chats: Mutex<Vec<Vec<ChatMessage>>>,
    translations: Mutex<Vec<TranslateRequest>>,
}

impl ScriptedProvider {
    fn new() -> Self {
        Self {
            fail_chat: false,
            fail_translate: false,
            tts: TtsOutcome::Audio("UklGRg=="),
            chats: Mutex::new(Vec::new()),
            translations: Mutex::new(Vec::new()),
        }
    }

    fn last_chat(&self) -> Vec<ChatMessage> {
        self.chats.lock().unwrap().last().cloned().unwrap_or_default()
    }

    fn last_translation(&self) -> TranslateRequest {
        self.translations.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl SpeechProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String, ProviderError> {
        let question = messages.last().map(|m| m.content.clone()).unwrap_or_default();
        self.chats.lock().unwrap().push(messages);

        if self.fail_chat {
            return Err(ProviderError::http("scripted", Operation::Chat, 503, "overloaded"));
        }
        Ok(format!("A:{question}"))
    }

    async fn translate(&self, request: TranslateRequest) -> Result<String, ProviderError> {
        let input = request.input.clone();
        self.translations.lock().unwrap().push(request);

        if self.fail_translate {
            return Err(ProviderError::new("scripted", Operation::Translate, "connection reset"));
        }
        Ok(format!("T:{input}"))
    }

    async fn text_to_speech(
        &self,
        _text: &str,
        _language_code: &str,
    ) -> Result<Option<String>, ProviderError> {
        match self.tts.clone() {
            TtsOutcome::Audio(audio) => Ok(Some(audio.to_string())),
            TtsOutcome::Status(status, body) => Err(ProviderError::http(
                "scripted",
                Operation::TextToSpeech,
                status,
                body,
            )),
            TtsOutcome::Transport => Err(ProviderError::new(
                "scripted",
                Operation::TextToSpeech,
                "Request failed: dns error",
            )),
        }
    }
}

struct TestApp {
    router: axum::Router,
    provider: Arc<ScriptedProvider>,
    store: Arc<ConversationStore>,
}

fn create_test_app(provider: ScriptedProvider) -> TestApp {
    let provider = Arc::new(provider);
    let store = Arc::new(ConversationStore::new(StoreLimits {
        history_cap: NonZeroUsize::new(20).unwrap(),
        max_sessions: NonZeroUsize::new(100).unwrap(),
    }));
    let settings = RouteSettings {
        user_label: "tester".into(),
        context_window: 3,
        default_session_id: "default".into(),
    };

    let state = AppState::new(store.clone(), provider.clone(), settings);
    TestApp {
        router: build_router(state, 64 * 1024),
        provider,
        store,
    }
}

/// Helper to make a request and get JSON response.
async fn request_json(
    app: &axum::Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);

    let request = if let Some(b) = body {
        request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_string(&b).unwrap()))
            .unwrap()
    } else {
        request.body(Body::empty()).unwrap()
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();

    (status, json)
}

async fn chat(app: &TestApp, question: &str, session_id: &str) -> (StatusCode, Value) {
    request_json(
        &app.router,
        Method::POST,
        "/api/chat",
        Some(json!({ "question": question, "session_id": session_id })),
    )
    .await
}

// ─────────────────────────────────────────────────────────────────────────────
// Static Endpoints
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app(ScriptedProvider::new());

    let (status, json) = request_json(&app.router, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["service"], "vani-gateway");

    let (status, _) = request_json(&app.router, Method::GET, "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_languages() {
    let app = create_test_app(ScriptedProvider::new());

    let (status, json) = request_json(&app.router, Method::GET, "/api/languages", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);

    let languages = json["languages"].as_array().unwrap();
    assert_eq!(languages.len(), 10);
    assert_eq!(languages[0], "English");
    assert!(languages.contains(&json!("Telugu")));
}

#[tokio::test]
async fn test_system_info() {
    let app = create_test_app(ScriptedProvider::new());

    let (status, json) = request_json(&app.router, Method::GET, "/api/system-info", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["user"], "tester");
    assert_eq!(json["timestamp"].as_str().unwrap().len(), 19);
}

#[tokio::test]
async fn test_cors_headers_present() {
    let app = create_test_app(ScriptedProvider::new());

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/languages")
        .header(header::ORIGIN, "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Chat
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_chat_success() {
    let app = create_test_app(ScriptedProvider::new());

    let (status, json) = chat(&app, "How are you?", "s1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["telugu_response"], "A:How are you?");
    assert_eq!(json["english_question"], "How are you?");
    assert_eq!(json["session_id"], "s1");
    assert_eq!(json["user"], "tester");
    assert!(json["timestamp"].is_string());

    assert_eq!(app.store.history_len("s1"), 1);
}

#[tokio::test]
async fn test_chat_defaults_session_id() {
    let app = create_test_app(ScriptedProvider::new());

    let (status, json) = request_json(
        &app.router,
        Method::POST,
        "/api/chat",
        Some(json!({ "question": "Hi" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["session_id"], "default");
    assert_eq!(app.store.history_len("default"), 1);
}

#[tokio::test]
async fn test_chat_prompt_uses_last_three_exchanges() {
    let app = create_test_app(ScriptedProvider::new());

    for n in 1..=4 {
        let (status, _) = chat(&app, &format!("Q{n}"), "ctx").await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, _) = chat(&app, "Q5", "ctx").await;
    assert_eq!(status, StatusCode::OK);

    let messages = app.provider.last_chat();
    let layout: Vec<(Role, String)> = messages
        .into_iter()
        .map(|m| (m.role, m.content))
        .collect();

    assert_eq!(layout.len(), 8);
    assert_eq!(layout[0].0, Role::System);
    assert_eq!(
        layout[1..].to_vec(),
        vec![
            (Role::User, "Q2".to_string()),
            (Role::Assistant, "A:Q2".to_string()),
            (Role::User, "Q3".to_string()),
            (Role::Assistant, "A:Q3".to_string()),
            (Role::User, "Q4".to_string()),
            (Role::Assistant, "A:Q4".to_string()),
            (Role::User, "Q5".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_chat_sessions_do_not_share_context() {
    let app = create_test_app(ScriptedProvider::new());

    chat(&app, "first", "alice").await;
    chat(&app, "second", "bob").await;

    let messages = app.provider.last_chat();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].content, "second");
}

#[tokio::test]
async fn test_chat_history_capped_at_twenty() {
    let app = create_test_app(ScriptedProvider::new());

    for n in 0..25 {
        chat(&app, &format!("Q{n}"), "busy").await;
    }

    assert_eq!(app.store.history_len("busy"), 20);
    let recent = app.store.get_recent("busy", 20);
    assert_eq!(recent[0].user_question, "Q5");
}

#[tokio::test]
async fn test_chat_missing_question() {
    let app = create_test_app(ScriptedProvider::new());

    let (status, json) = request_json(
        &app.router,
        Method::POST,
        "/api/chat",
        Some(json!({ "session_id": "s1" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "Missing required field: question");
    assert!(app.provider.chats.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_chat_blank_question() {
    let app = create_test_app(ScriptedProvider::new());

    let (status, json) = chat(&app, "   ", "s1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn test_chat_without_body() {
    let app = create_test_app(ScriptedProvider::new());

    let (status, json) = request_json(&app.router, Method::POST, "/api/chat", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "No data provided");
}

#[tokio::test]
async fn test_chat_malformed_json() {
    let app = create_test_app(ScriptedProvider::new());

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ question: "))
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["success"], false);
    assert!(json["message"].as_str().unwrap().starts_with("Invalid request body"));
}

#[tokio::test]
async fn test_chat_upstream_failure_returns_fallback() {
    let mut provider = ScriptedProvider::new();
    provider.fail_chat = true;
    let app = create_test_app(provider);

    let (status, json) = chat(&app, "Hello", "s1").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["success"], false);
    assert_eq!(json["telugu_response"], CHAT_FALLBACK_MESSAGE);
    assert_eq!(json["english_question"], "Hello");
    assert!(json["error"].as_str().unwrap().contains("overloaded"));

    // Failed exchanges are never recorded.
    assert_eq!(app.store.history_len("s1"), 0);
}

#[tokio::test]
async fn test_clear_session() {
    let app = create_test_app(ScriptedProvider::new());
    chat(&app, "Hello", "gone").await;

    let (status, json) =
        request_json(&app.router, Method::DELETE, "/api/sessions/gone", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["cleared"], true);
    assert_eq!(app.store.history_len("gone"), 0);

    let (_, json) = request_json(&app.router, Method::DELETE, "/api/sessions/gone", None).await;
    assert_eq!(json["cleared"], false);
}

// ─────────────────────────────────────────────────────────────────────────────
// Translate
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_translate_english_to_telugu_is_conversational() {
    let app = create_test_app(ScriptedProvider::new());

    let (status, json) = request_json(
        &app.router,
        Method::POST,
        "/api/translate",
        Some(json!({ "text": "Good morning" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["source_lang"], "English");
    assert_eq!(json["target_lang"], "Telugu");

    let sent = app.provider.last_translation();
    assert_eq!(sent.input, format!("{CONVERSATIONAL_PREFIX}Good morning"));
    assert_eq!(sent.source_language_code, "en-IN");
    assert_eq!(sent.target_language_code, "te-IN");
    assert!(sent.enable_preprocessing);
}

#[tokio::test]
async fn test_translate_other_pair_is_literal() {
    let app = create_test_app(ScriptedProvider::new());

    let (status, json) = request_json(
        &app.router,
        Method::POST,
        "/api/translate",
        Some(json!({ "text": "नमस्ते", "sourceLang": "Hindi", "targetLang": "Tamil" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["translated_text"], "T:नमस्ते");

    let sent = app.provider.last_translation();
    assert_eq!(sent.input, "नमस्ते");
    assert_eq!(sent.source_language_code, "hi-IN");
    assert_eq!(sent.target_language_code, "ta-IN");
    assert!(!sent.enable_preprocessing);
}

#[tokio::test]
async fn test_translate_same_language_rejected() {
    let app = create_test_app(ScriptedProvider::new());

    let (status, json) = request_json(
        &app.router,
        Method::POST,
        "/api/translate",
        Some(json!({ "text": "hello", "sourceLang": "Tamil", "targetLang": "Tamil" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert!(json["message"].as_str().unwrap().contains("must differ"));
    assert!(app.provider.translations.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_translate_unknown_language_rejected() {
    let app = create_test_app(ScriptedProvider::new());

    let (status, json) = request_json(
        &app.router,
        Method::POST,
        "/api/translate",
        Some(json!({ "text": "hello", "sourceLang": "English", "targetLang": "Klingon" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["message"]
        .as_str()
        .unwrap()
        .starts_with("Unsupported language: Klingon"));
    assert!(app.provider.translations.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_translate_missing_text() {
    let app = create_test_app(ScriptedProvider::new());

    let (status, json) = request_json(
        &app.router,
        Method::POST,
        "/api/translate",
        Some(json!({ "sourceLang": "English" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Missing required field: text");
}

#[tokio::test]
async fn test_translate_upstream_failure() {
    let mut provider = ScriptedProvider::new();
    provider.fail_translate = true;
    let app = create_test_app(provider);

    let (status, json) = request_json(
        &app.router,
        Method::POST,
        "/api/translate",
        Some(json!({ "text": "hello", "sourceLang": "English", "targetLang": "Hindi" })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["success"], false);
    assert!(json["message"].as_str().unwrap().starts_with("Error: "));
}

// ─────────────────────────────────────────────────────────────────────────────
// Text-to-Speech
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_tts_success() {
    let app = create_test_app(ScriptedProvider::new());

    let (status, json) = request_json(
        &app.router,
        Method::POST,
        "/api/text-to-speech",
        Some(json!({ "text": "నమస్తే", "languageCode": "te-IN" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["audio_data"], "UklGRg==");
}

#[tokio::test]
async fn test_tts_missing_fields() {
    let app = create_test_app(ScriptedProvider::new());

    let (status, json) = request_json(
        &app.router,
        Method::POST,
        "/api/text-to-speech",
        Some(json!({ "text": "hello" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Missing required fields: text, languageCode");
}

#[tokio::test]
async fn test_tts_passes_upstream_status_through() {
    let mut provider = ScriptedProvider::new();
    provider.tts = TtsOutcome::Status(403, "{\"error\":\"invalid key\"}");
    let app = create_test_app(provider);

    let (status, json) = request_json(
        &app.router,
        Method::POST,
        "/api/text-to-speech",
        Some(json!({ "text": "hello", "languageCode": "en-IN" })),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["success"], false);
    assert_eq!(
        json["message"],
        "Error from TTS API: {\"error\":\"invalid key\"}"
    );
}

#[tokio::test]
async fn test_tts_transport_failure() {
    let mut provider = ScriptedProvider::new();
    provider.tts = TtsOutcome::Transport;
    let app = create_test_app(provider);

    let (status, json) = request_json(
        &app.router,
        Method::POST,
        "/api/text-to-speech",
        Some(json!({ "text": "hello", "languageCode": "en-IN" })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["message"].as_str().unwrap().contains("dns error"));
}
