//! Inbound webhook endpoint.
//!
//! Twilio delivers WhatsApp events as `application/x-www-form-urlencoded`
//! POSTs; JSON bodies are accepted too for tooling and tests. The handler
//! validates the payload at the boundary (400 when neither `Body` nor
//! `MediaUrl0` is present) and always acknowledges processed events with a
//! plain 200 body regardless of the inner business outcome.

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, RequestExt, Router};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::application::ConversationEngine;
use crate::domain::conversation::InboundMessage;
use crate::domain::foundation::Identity;
use crate::domain::session::PendingMedia;

/// Consumer of validated inbound events.
///
/// Seam between the HTTP surface and the engine so handler tests don't need
/// the full collaborator graph.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn deliver(&self, msg: InboundMessage);
}

#[async_trait]
impl EventSink for ConversationEngine {
    async fn deliver(&self, msg: InboundMessage) {
        self.handle(msg).await;
    }
}

/// Shared state for the webhook routes.
#[derive(Clone)]
pub struct WebhookState {
    pub sink: Arc<dyn EventSink>,
}

/// Raw webhook payload, Twilio field names.
#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    #[serde(rename = "From")]
    pub from: String,
    #[serde(rename = "Body")]
    pub body: Option<String>,
    #[serde(rename = "MediaUrl0")]
    pub media_url: Option<String>,
    #[serde(rename = "MediaContentType0")]
    pub media_content_type: Option<String>,
}

impl WebhookPayload {
    /// Validates the payload into a domain event.
    fn into_inbound(self) -> Result<InboundMessage, &'static str> {
        let media = match self.media_url {
            Some(url) => Some(PendingMedia {
                remote_url: url,
                content_type: self
                    .media_content_type
                    .unwrap_or_else(|| "application/octet-stream".to_string()),
            }),
            None => None,
        };
        InboundMessage::new(Identity::new(&self.from), self.body, media)
            .map_err(|_| "Bad Request: Missing message or media URL")
    }
}

/// Builds the webhook router: `POST /webhook` plus the trivial health check.
pub fn webhook_router(state: WebhookState) -> Router {
    Router::new()
        .route("/webhook", post(webhook))
        .route("/", get(health))
        .with_state(state)
}

async fn health() -> &'static str {
    "Server is running!"
}

/// POST /webhook - process one inbound WhatsApp event.
///
/// Responses: 200 with a plain acknowledgment when the event was processed,
/// 400 when the body is unreadable or carries neither text nor media.
async fn webhook(State(state): State<WebhookState>, request: Request) -> Response {
    let payload = match parse_payload(request).await {
        Ok(payload) => payload,
        Err(response) => return response,
    };

    let msg = match payload.into_inbound() {
        Ok(msg) => msg,
        Err(reason) => {
            warn!(reason, "rejected malformed webhook payload");
            return (StatusCode::BAD_REQUEST, reason).into_response();
        }
    };

    info!(identity = %msg.from, has_media = msg.has_media(), "webhook event accepted");
    state.sink.deliver(msg).await;

    (StatusCode::OK, "Webhook processed").into_response()
}

/// Parses the body as form or JSON depending on the content type.
async fn parse_payload(request: Request<Body>) -> Result<WebhookPayload, Response> {
    let is_json = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("application/json"))
        .unwrap_or(false);

    if is_json {
        match request.extract::<Json<WebhookPayload>, _>().await {
            Ok(Json(payload)) => Ok(payload),
            Err(e) => {
                warn!(error = %e, "unreadable JSON webhook body");
                Err((StatusCode::BAD_REQUEST, "Bad Request: invalid payload").into_response())
            }
        }
    } else {
        match request.extract::<Form<WebhookPayload>, _>().await {
            Ok(Form(payload)) => Ok(payload),
            Err(e) => {
                warn!(error = %e, "unreadable form webhook body");
                Err((StatusCode::BAD_REQUEST, "Bad Request: invalid payload").into_response())
            }
        }
    }
}
