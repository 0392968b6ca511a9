//! Versioned REST API (v1).
//!
//! `POST /v1/chat` runs one message through the orchestrator and returns
//! `{session_id, response, source, save_data}`. The exchange is written to
//! memory (and `save_data` archived) after the response, in the background.

use axum::{Router, extract::State, http::StatusCode, response::Json, routing::post};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use vantage_core::cancel::CancellationToken;
use vantage_core::decision::ArchiveDirective;
use vantage_core::message::SessionKey;
use vantage_core::outcome::ResponseSource;

use crate::GatewayState;
use crate::persist::spawn_persist;

/// Upper bound on a single inbound message, in characters.
const MAX_MESSAGE_CHARS: usize = 16_000;

pub type SharedState = Arc<GatewayState>;

/// Build the v1 API router (mounted under `/v1`).
pub fn v1_router(state: SharedState) -> Router {
    Router::new()
        .route("/chat", post(chat_handler))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Existing session to continue; a new one is created when absent.
    #[serde(default)]
    pub session_id: Option<String>,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub session_id: String,
    pub response: String,
    pub source: ResponseSource,
    pub save_data: Option<ArchiveDirective>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Cancels the request's token when the handler future is dropped
/// (e.g. the client disconnected).
struct CancelOnDrop(CancellationToken);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<ErrorResponse>)> {
    let message = payload.message.trim();
    if message.is_empty() {
        return Err(bad_request("message must not be empty"));
    }
    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(bad_request("message is too long"));
    }

    let session = payload
        .session_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(SessionKey::from)
        .unwrap_or_else(SessionKey::new);

    info!(session = %session, "v1/chat request");

    let cancel = CancellationToken::new();
    let _guard = CancelOnDrop(cancel.clone());

    let outcome = state
        .orchestrator
        .handle_with_cancel(&session, message, &cancel)
        .await;

    spawn_persist(
        state.orchestrator.memory().clone(),
        state.archive.clone(),
        session.clone(),
        message.to_string(),
        outcome.clone(),
    );

    Ok(Json(ChatResponse {
        session_id: session.to_string(),
        response: outcome.response,
        source: outcome.source,
        save_data: outcome.save_data,
    }))
}

fn bad_request(message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedCompletion, decision_json, test_state};
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use std::time::Duration;
    use tower::ServiceExt;

    fn chat_request(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/chat")
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn read_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn chat_returns_outcome_with_new_session() {
        let completion = ScriptedCompletion::routed(
            &decision_json("RESPOND", "hello", None, "general"),
            "Hello! How can I help?",
        );
        let (state, _archive) = test_state(completion);
        let app = v1_router(state);

        let response = app
            .oneshot(chat_request(serde_json::json!({"message": "hello"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json: ChatResponse = read_json(response).await;
        assert_eq!(json.response, "Hello! How can I help?");
        assert_eq!(json.source, ResponseSource::InternalCore);
        assert!(json.save_data.is_none());
        assert!(!json.session_id.is_empty());
    }

    #[tokio::test]
    async fn source_serializes_as_plain_string() {
        let completion = ScriptedCompletion::routed(
            &decision_json("RESPOND", "hi", Some("likes tea"), "preference"),
            "Noted.",
        );
        let (state, _archive) = test_state(completion);
        let response = v1_router(state)
            .oneshot(chat_request(serde_json::json!({"session_id": "abc", "message": "hi"})))
            .await
            .unwrap();

        let json: serde_json::Value = read_json(response).await;
        assert_eq!(json["session_id"], "abc");
        assert_eq!(json["source"], "INTERNAL_CORE");
        assert_eq!(json["save_data"]["content"], "likes tea");
        assert_eq!(json["save_data"]["category"], "preference");
    }

    #[tokio::test]
    async fn empty_message_is_rejected() {
        let (state, _archive) = test_state(ScriptedCompletion::new(vec![]));
        let response = v1_router(state)
            .oneshot(chat_request(serde_json::json!({"message": "   "})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json: ErrorResponse = read_json(response).await;
        assert!(json.error.contains("empty"));
    }

    #[tokio::test]
    async fn exchange_is_persisted_after_response() {
        let completion = ScriptedCompletion::routed(
            &decision_json("RESPOND", "remember tea", Some("likes tea"), "preference"),
            "I'll remember that.",
        );
        let (state, archive) = test_state(completion);
        let memory = state.orchestrator.memory().clone();
        let app = v1_router(state);

        let response = app
            .oneshot(chat_request(
                serde_json::json!({"session_id": "persist", "message": "remember tea"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // Persistence is detached; give it a moment.
        let session = SessionKey::from("persist");
        let mut window = Vec::new();
        for _ in 0..50 {
            window = memory.read(&session).await.hot_window;
            if !window.is_empty() && !archive.records().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].content, "remember tea");
        assert_eq!(window[1].content, "I'll remember that.");
        assert_eq!(archive.records().len(), 1);
    }

    #[tokio::test]
    async fn degraded_outcome_is_still_200() {
        let completion = ScriptedCompletion::new(vec![Err(
            vantage_core::error::CompletionError::Network("down".into()),
        )]);
        let (state, _archive) = test_state(completion);
        let response = v1_router(state)
            .oneshot(chat_request(serde_json::json!({"message": "hi"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json: ChatResponse = read_json(response).await;
        assert_eq!(json.source, ResponseSource::Error);
    }

    #[test]
    fn guard_cancels_on_drop() {
        let token = CancellationToken::new();
        drop(CancelOnDrop(token.clone()));
        assert!(token.is_cancelled());
    }
}
