use std::sync::Arc;

use {
    axum::{
        Router,
        body::Bytes,
        extract::{Query, State},
        http::{HeaderMap, StatusCode},
        response::{IntoResponse, Json},
        routing::get,
    },
    relay_config::RelayConfig,
    relay_messenger::{
        event::WebhookPayload,
        signature::{SIGNATURE_HEADER, verify_signature, verify_subscription},
    },
    secrecy::ExposeSecret,
    serde::Deserialize,
    tower_http::trace::TraceLayer,
    tracing::{debug, info, warn},
};

use crate::{state::GatewayState, webhook::dispatch_payload};

// ── Shared app state ─────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<GatewayState>,
}

// ── Server startup ───────────────────────────────────────────────────────────

/// Build the gateway router (shared between production startup and tests).
pub fn build_gateway_app(state: Arc<GatewayState>) -> Router {
    Router::new()
        .route("/", get(home_handler))
        .route("/health", get(health_handler))
        .route("/webhook", get(verify_handler).post(webhook_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { gateway: state })
}

/// Start the webhook server and run until the listener fails.
pub async fn start_gateway(config: RelayConfig) -> anyhow::Result<()> {
    let state = Arc::new(GatewayState::from_config(&config)?);
    info!(
        version = %state.version,
        actions = ?state.orchestrator.router().actions(),
        pace_ms = config.dispatch.pace_interval_ms,
        "relay gateway starting"
    );

    let app = build_gateway_app(state);
    let listener =
        tokio::net::TcpListener::bind((config.server.bind.as_str(), config.server.port)).await?;
    info!(addr = %listener.local_addr()?, "listening for webhooks");
    axum::serve(listener, app).await?;
    Ok(())
}

// ── Handlers ─────────────────────────────────────────────────────────────────

async fn home_handler() -> &'static str {
    "Chatbot home page"
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": state.gateway.version,
        "sessions": state.gateway.sessions.len(),
    }))
}

#[derive(Deserialize)]
struct VerifyParams {
    #[serde(rename = "hub.mode")]
    mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    challenge: Option<String>,
}

/// Subscription handshake: echo the challenge when the verify token matches.
async fn verify_handler(
    State(state): State<AppState>,
    Query(params): Query<VerifyParams>,
) -> impl IntoResponse {
    match verify_subscription(
        params.mode.as_deref(),
        params.verify_token.as_deref(),
        params.challenge.as_deref(),
        &state.gateway.verify_token,
    ) {
        Some(challenge) => {
            info!("webhook subscription verified");
            (StatusCode::OK, challenge)
        },
        None => {
            warn!("webhook verification rejected");
            (StatusCode::FORBIDDEN, "Invalid verify token".to_string())
        },
    }
}

/// Signed event batch. Events are processed after the 200 is returned.
async fn webhook_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());
    if let Err(e) = verify_signature(
        &body,
        signature,
        state.gateway.app_secret.expose_secret(),
    ) {
        warn!(error = %e, "rejecting webhook");
        return StatusCode::FORBIDDEN;
    }

    let payload: WebhookPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "malformed webhook body");
            return StatusCode::BAD_REQUEST;
        },
    };

    let tasks = dispatch_payload(Arc::clone(&state.gateway), payload);
    debug!(events = tasks.len(), "webhook accepted");
    StatusCode::OK
}
