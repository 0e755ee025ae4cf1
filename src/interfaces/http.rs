use std::future::Future;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::{
    application::state::SharedState,
    domain::error::DomainError,
    interfaces::slack_http,
    security::signature::SlackSignatureVerifier,
};

pub fn build_router(state: SharedState) -> Router {
    let mut slack_routes = Router::new()
        .route("/slack/events", post(slack_http::events_handler))
        .route("/slack/command", post(slack_http::command_handler));

    match state.config().slack_signing_secret.as_deref() {
        Some(secret) => {
            let verifier = SlackSignatureVerifier::new(secret, state.config().signature_max_skew);
            let limit = state.config().max_body_bytes;
            slack_routes = slack_routes.route_layer(middleware::from_fn_with_state(
                (verifier, limit),
                slack_http::verify_signature,
            ));
        }
        None => warn!("slack signing secret not configured, request signatures are not verified"),
    }

    Router::new()
        .route("/healthz", get(healthz_handler))
        .merge(slack_routes)
        .layer(DefaultBodyLimit::max(state.config().max_body_bytes))
        .with_state(state)
}

pub async fn serve(
    listener: TcpListener,
    state: SharedState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), DomainError> {
    let local_addr = listener.local_addr().map_err(|error| {
        DomainError::Unavailable(format!("failed to read listener address: {error}"))
    })?;

    info!(
        "connect-manager listening on http://{}:{}, command={}, bot_user={}",
        local_addr.ip(),
        local_addr.port(),
        state.config().command_name,
        state.bot().user_id,
    );

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|error| DomainError::Unavailable(format!("server runtime error: {error}")))
}

async fn healthz_handler(State(state): State<SharedState>) -> impl IntoResponse {
    match state.health_payload().await {
        Ok(payload) => (StatusCode::OK, Json(payload)).into_response(),
        Err(error) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({
                "ok": false,
                "error": error.to_string(),
            })),
        )
            .into_response(),
    }
}
