//! Vani Gateway - conversational Telugu chat, translation, and speech over Sarvam AI.
//!
//! This crate provides the HTTP gateway between browser clients and the
//! Sarvam cloud API:
//! - Multi-turn chat backed by a bounded per-session history
//! - Legacy text translation between ten Indian languages
//! - Text-to-speech proxying
//!
//! ## Architecture
//!
//! ```text
//! Client → Gateway (validate → recent history → prompt) → Sarvam
//!                         ↓
//!                  Append exchange
//! ```

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod conversation;
pub mod language;
pub mod prompt;
pub mod provider;
pub mod routes;

pub use conversation::{ConversationStore, Exchange, StoreLimits};
pub use provider::{
    ChatMessage, Operation, ProviderError, Role, SarvamProvider, SpeechProvider, TranslateRequest,
};
pub use routes::{AppState, ApiError, RouteSettings};

use axum::{body::Body, http::Request, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use vani_common::config::Config;
use vani_common::logging::generate_trace_id;

/// Build the gateway router with all routes and middleware.
pub fn build_router(state: AppState, body_limit_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
        tracing::info_span!(
            "http_request",
            method = %request.method(),
            path = %request.uri().path(),
            trace_id = %generate_trace_id(),
        )
    });

    Router::new()
        .merge(routes::api_routes(state))
        .merge(routes::health_routes())
        .layer(RequestBodyLimitLayer::new(body_limit_bytes))
        .layer(cors)
        .layer(trace)
}

/// Build application state backed by the real Sarvam provider.
pub fn build_state(config: &Config) -> vani_common::Result<AppState> {
    let provider = SarvamProvider::new(&config.sarvam)?;
    let store = ConversationStore::from_config(&config.conversation);

    Ok(AppState::new(
        Arc::new(store),
        Arc::new(provider),
        RouteSettings::from_config(config),
    ))
}

/// Start the gateway server and run until SIGINT/SIGTERM.
pub async fn start_server(config: &Config) -> anyhow::Result<()> {
    let state = build_state(config)?;
    let router = build_router(state, config.gateway.body_limit_bytes);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Starting Vani Gateway on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Vani Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => tracing::info!("Received SIGTERM, shutting down"),
                    _ = tokio::signal::ctrl_c() => tracing::info!("Received SIGINT, shutting down"),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Shutting down");
    }
}
