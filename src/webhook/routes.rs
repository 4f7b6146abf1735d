//! HTTP endpoints for the inbound webhook.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, warn};

use crate::flow::FlowRunner;
use crate::webhook::payload;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    flow: Arc<FlowRunner>,
    verify_token: Arc<SecretString>,
}

/// Build the Axum router with the webhook and health routes.
pub fn webhook_routes(flow: Arc<FlowRunner>, verify_token: SecretString) -> Router {
    let state = AppState {
        flow,
        verify_token: Arc::new(verify_token),
    };

    Router::new()
        .route("/webhook", get(verify_webhook).post(receive_webhook))
        .route("/health", get(health))
        .with_state(state)
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "leadflow"
    }))
}

// ── Subscription handshake ──────────────────────────────────────────────

/// `GET /webhook` — the platform's subscribe handshake. Echo the
/// challenge when the mode is `subscribe` and the token matches.
async fn verify_webhook(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let mode = params.get("hub.mode").map(String::as_str).unwrap_or("");
    let token = params
        .get("hub.verify_token")
        .map(String::as_str)
        .unwrap_or("");
    let challenge = params.get("hub.challenge").cloned().unwrap_or_default();

    if mode == "subscribe" && token == state.verify_token.expose_secret() {
        info!("Webhook verification succeeded");
        (StatusCode::OK, challenge).into_response()
    } else {
        warn!(mode, "Webhook verification rejected");
        (StatusCode::FORBIDDEN, "Forbidden").into_response()
    }
}

// ── Event delivery ──────────────────────────────────────────────────────

/// `POST /webhook` — one delivery, zero or more messages.
///
/// Always acknowledges with 200: the platform retries non-2xx responses,
/// and a malformed body or a failed conversation step is never worth a
/// redelivery storm.
async fn receive_webhook(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    let value: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "Webhook body is not valid JSON");
            serde_json::Value::Null
        }
    };

    let messages = payload::normalize(&value);
    debug!(count = messages.len(), "Webhook delivery normalized");

    for message in &messages {
        state
            .flow
            .handle_message(&message.sender_id, &message.text)
            .await;
    }

    Json(serde_json::json!({"status": "ok"}))
}
