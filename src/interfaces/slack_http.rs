use axum::{
    Form, Json,
    body::{Body, Bytes},
    extract::{Request, State, rejection::FormRejection},
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, error, warn};

use crate::{
    application::{
        commands::{CommandContext, CommandRouter},
        state::SharedState,
    },
    security::signature::{SIGNATURE_HEADER, SlackSignatureVerifier, TIMESTAMP_HEADER},
};

/// Slash command payload as Slack posts it (`application/x-www-form-urlencoded`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlashCommandForm {
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub channel_name: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub team_id: String,
}

pub async fn events_handler(body: Bytes) -> Response {
    let envelope = match serde_json::from_slice::<Value>(&body) {
        Ok(envelope) => envelope,
        Err(error) => {
            warn!("rejecting unparseable slack event: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let event_type = envelope.get("type").and_then(Value::as_str).unwrap_or("");
    if event_type == "url_verification" {
        let challenge = envelope
            .get("challenge")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();
        debug!("answering slack url verification");
        return (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain")],
            challenge,
        )
            .into_response();
    }

    debug!("ignoring slack event type={event_type}");
    StatusCode::OK.into_response()
}

pub async fn command_handler(
    State(state): State<SharedState>,
    form: Result<Form<SlashCommandForm>, FormRejection>,
) -> Response {
    let Form(form) = match form {
        Ok(form) => form,
        Err(rejection) => {
            error!("failed to parse slash command: {rejection}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    if form.command != state.config().command_name {
        warn!("unexpected slash command {}", form.command);
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    let context = CommandContext {
        channel_id: form.channel_id,
        channel_name: form.channel_name,
        user_id: form.user_id,
    };
    let reply = CommandRouter::new(state).handle(&form.text, &context).await;
    (StatusCode::OK, Json(json!({ "text": reply.text }))).into_response()
}

/// Buffers the body, checks the Slack signature over it and hands the same bytes on.
pub async fn verify_signature(
    State((verifier, limit)): State<(SlackSignatureVerifier, usize)>,
    request: Request,
    next: Next,
) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = match axum::body::to_bytes(body, limit).await {
        Ok(bytes) => bytes,
        Err(error) => {
            warn!("failed to buffer slack request body: {error}");
            return StatusCode::PAYLOAD_TOO_LARGE.into_response();
        }
    };

    let timestamp = header_value(&parts.headers, TIMESTAMP_HEADER);
    let signature = header_value(&parts.headers, SIGNATURE_HEADER);
    if let Err(error) = verifier.verify(timestamp, signature, &bytes, Utc::now().timestamp()) {
        warn!("rejecting slack request on {}: {error}", parts.uri.path());
        return StatusCode::UNAUTHORIZED.into_response();
    }

    next.run(Request::from_parts(parts, Body::from(bytes)))
        .await
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}
