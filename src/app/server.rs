//! HTTP interactions endpoint.

use crate::app::interactions::{Interaction, InteractionResponse};
use crate::app::router::InteractionRouter;
use crate::utils::error::{BotError, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use ed25519_dalek::{Signature, VerifyingKey};
use std::net::SocketAddr;
use std::sync::Arc;

pub const HEADER_SIGNATURE: &str = "x-signature-ed25519";
pub const HEADER_TIMESTAMP: &str = "x-signature-timestamp";

#[derive(Clone)]
pub struct AppState {
    router: InteractionRouter,
    key: Arc<VerifyingKey>,
}

impl AppState {
    pub fn new(router: InteractionRouter, public_key_hex: &str) -> Result<Self> {
        Ok(Self {
            router,
            key: Arc::new(parse_public_key(public_key_hex)?),
        })
    }
}

pub fn parse_public_key(public_key_hex: &str) -> Result<VerifyingKey> {
    let bytes = hex::decode(public_key_hex.trim()).map_err(|e| BotError::SignatureError {
        message: format!("public key is not hex: {}", e),
    })?;
    let bytes: [u8; 32] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| BotError::SignatureError {
            message: "public key must be 32 bytes".to_string(),
        })?;
    VerifyingKey::from_bytes(&bytes).map_err(|_| BotError::SignatureError {
        message: "invalid ed25519 public key".to_string(),
    })
}

/// Checks the signature Discord computes over `timestamp || body`.
pub fn verify_signature(
    key: &VerifyingKey,
    timestamp: &str,
    body: &[u8],
    signature_hex: &str,
) -> Result<()> {
    let raw = hex::decode(signature_hex).map_err(|_| BotError::SignatureError {
        message: "signature is not hex".to_string(),
    })?;
    let signature = Signature::from_slice(&raw).map_err(|_| BotError::SignatureError {
        message: "invalid signature bytes".to_string(),
    })?;

    let mut message = Vec::with_capacity(timestamp.len() + body.len());
    message.extend_from_slice(timestamp.as_bytes());
    message.extend_from_slice(body);

    key.verify_strict(&message, &signature)
        .map_err(|_| BotError::SignatureError {
            message: "signature verification failed".to_string(),
        })
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/interactions", post(handle_interaction))
        .route("/healthz", get(handle_health))
        .with_state(state)
}

async fn handle_health() -> &'static str {
    "ok"
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

async fn handle_interaction(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let (signature, timestamp) = match (
        header(&headers, HEADER_SIGNATURE),
        header(&headers, HEADER_TIMESTAMP),
    ) {
        (Some(signature), Some(timestamp)) => (signature, timestamp),
        _ => {
            tracing::warn!("⚠️ Interaction without signature headers");
            return (StatusCode::UNAUTHORIZED, "missing signature").into_response();
        }
    };

    if let Err(e) = verify_signature(&state.key, timestamp, &body, signature) {
        tracing::warn!("⚠️ Rejected interaction: {}", e);
        return (StatusCode::UNAUTHORIZED, "invalid request signature").into_response();
    }

    let interaction: Interaction = match serde_json::from_slice(&body) {
        Ok(interaction) => interaction,
        Err(e) => {
            tracing::warn!("⚠️ Malformed interaction payload: {}", e);
            return (StatusCode::BAD_REQUEST, "malformed interaction").into_response();
        }
    };

    match state.router.handle(&interaction).await {
        Ok(reply) => {
            if let Some(announcement) = reply.announcement {
                let router = state.router.clone();
                tokio::spawn(async move { router.deliver(announcement).await });
            }
            Json(reply.response).into_response()
        }
        Err(e) => {
            tracing::error!(
                "❌ Interaction failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            Json(InteractionResponse::ephemeral(format!(
                "❌ {}",
                e.user_friendly_message()
            )))
            .into_response()
        }
    }
}

pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("🌐 Listening for interactions on http://{}/interactions", addr);
    axum::serve(listener, app(state))
        .await
        .map_err(|e| BotError::ServerError {
            message: e.to_string(),
        })
}
