//! Axum surface over the token store.
//!
//! Three routes mirror the external interface: read-only validation, the
//! one-time mark-downloaded write, and the order-intake webhook.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use anyhow::Context as _;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;

use crate::foundation::error::PosterResult;
use crate::token::mail::Mailer;
use crate::token::model::{
    MarkDownloadedRequest, MarkDownloadedResponse, OrderIntake, ValidationResponse,
    WebhookResponse,
};
use crate::token::service;
use crate::token::store::TokenStore;

/// Store handle shared across request handlers.
pub type SharedStore = Arc<Mutex<Box<dyn TokenStore>>>;

/// State injected into every route.
#[derive(Clone)]
pub struct TokenServerState {
    /// The authoritative store.
    pub store: SharedStore,
    /// Creation-link delivery.
    pub mailer: Arc<dyn Mailer>,
}

impl TokenServerState {
    /// Wrap a store and mailer for serving.
    pub fn new(store: Box<dyn TokenStore>, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            mailer,
        }
    }
}

/// Build the token-service router.
pub fn router(state: TokenServerState) -> Router {
    Router::new()
        .route("/api/tokens/{token}/validate", get(validate_token))
        .route("/api/tokens/mark-downloaded", post(mark_downloaded))
        .route("/api/webhooks/order", post(order_webhook))
        .with_state(state)
}

/// Bind `addr` and serve until the task is cancelled.
pub async fn serve(addr: SocketAddr, state: TokenServerState) -> PosterResult<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind token service on {addr}"))?;
    tracing::info!(%addr, "token service listening");
    axum::serve(listener, router(state))
        .await
        .context("token service terminated")?;
    Ok(())
}

fn status_for_validation(resp: &ValidationResponse) -> StatusCode {
    match resp.status.as_str() {
        "active" => StatusCode::OK,
        "used" | "expired" => StatusCode::FORBIDDEN,
        _ => StatusCode::NOT_FOUND,
    }
}

async fn validate_token(
    State(state): State<TokenServerState>,
    Path(token): Path<String>,
) -> (StatusCode, Json<ValidationResponse>) {
    let guard = match state.store.lock() {
        Ok(g) => g,
        Err(_) => return (StatusCode::INTERNAL_SERVER_ERROR, Json(store_down())),
    };
    match service::validate(&**guard, &token, Utc::now()) {
        Ok(resp) => {
            let code = status_for_validation(&resp);
            (code, Json(resp))
        }
        Err(err) => {
            tracing::error!(%err, "validate failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(store_down()))
        }
    }
}

async fn mark_downloaded(
    State(state): State<TokenServerState>,
    Json(request): Json<MarkDownloadedRequest>,
) -> (StatusCode, Json<MarkDownloadedResponse>) {
    let mut guard = match state.store.lock() {
        Ok(g) => g,
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(MarkDownloadedResponse {
                    success: false,
                    error: Some("store unavailable".into()),
                }),
            );
        }
    };
    match service::mark_downloaded(&mut **guard, &request, Utc::now()) {
        Ok(resp) => {
            let code = if resp.success {
                StatusCode::OK
            } else if resp.error.as_deref() == Some("Token not found") {
                StatusCode::NOT_FOUND
            } else {
                StatusCode::CONFLICT
            };
            (code, Json(resp))
        }
        Err(err) => {
            tracing::error!(%err, "mark-downloaded failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(MarkDownloadedResponse {
                    success: false,
                    error: Some("store unavailable".into()),
                }),
            )
        }
    }
}

async fn order_webhook(
    State(state): State<TokenServerState>,
    Json(intake): Json<OrderIntake>,
) -> (StatusCode, Json<WebhookResponse>) {
    let mut guard = match state.store.lock() {
        Ok(g) => g,
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(WebhookResponse {
                    success: false,
                    message: "store unavailable".into(),
                    token: String::new(),
                }),
            );
        }
    };
    match service::process_order(&mut **guard, state.mailer.as_ref(), &intake, Utc::now()) {
        Ok(resp) => (StatusCode::OK, Json(resp)),
        Err(err) => {
            tracing::error!(%err, "order intake failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(WebhookResponse {
                    success: false,
                    message: "order intake failed".into(),
                    token: String::new(),
                }),
            )
        }
    }
}

fn store_down() -> ValidationResponse {
    ValidationResponse {
        valid: false,
        status: "invalid".into(),
        error: Some("store unavailable".into()),
        ..Default::default()
    }
}
