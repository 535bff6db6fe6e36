//! HTTP API server — payment-provider callbacks and health checks.
//!
//! Spawned as a background task in the gateway. The billing callback is the
//! only write path: an approved payment renews the client's subscription
//! through the license gate.

use crate::gateway::LicenseGate;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Instant;
use tracing::{error, info};
use vigia_core::config::ApiConfig;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    gate: LicenseGate,
    api_key: Option<String>,
    uptime: Instant,
}

/// Payment callback request body.
#[derive(Debug, Deserialize)]
struct BillingCallback {
    client_id: String,
    approved: bool,
    /// New expiry date, `YYYY-MM-DD`.
    new_expiry: String,
}

/// Constant-time string comparison to prevent timing attacks on API token
/// validation.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

/// Check bearer token auth. Returns `None` if authorized, `Some(response)` if rejected.
fn check_auth(headers: &HeaderMap, api_key: &Option<String>) -> Option<(StatusCode, Json<Value>)> {
    let key = match api_key {
        Some(k) => k,
        None => return None, // No auth configured — allow all.
    };

    let header = match headers.get("authorization") {
        Some(h) => h,
        None => {
            return Some((
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "missing Authorization header"})),
            ));
        }
    };

    let value = match header.to_str() {
        Ok(v) => v,
        Err(_) => {
            return Some((
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "invalid Authorization header"})),
            ));
        }
    };

    match value.strip_prefix("Bearer ") {
        Some(token) if constant_time_eq(token, key) => None, // Authorized.
        _ => Some((
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "invalid token"})),
        )),
    }
}

/// `GET /api/health` — health check with uptime.
async fn health(
    headers: HeaderMap,
    State(state): State<ApiState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    if let Some(err) = check_auth(&headers, &state.api_key) {
        return Err(err);
    }

    Ok(Json(json!({
        "status": "ok",
        "uptime_secs": state.uptime.elapsed().as_secs(),
    })))
}

/// `POST /api/billing/callback` — payment-provider notification.
///
/// Only an approved payment touches the subscription; everything else is
/// acknowledged and ignored.
async fn billing_callback(
    headers: HeaderMap,
    State(state): State<ApiState>,
    body: Result<Json<BillingCallback>, axum::extract::rejection::JsonRejection>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    if let Some(err) = check_auth(&headers, &state.api_key) {
        return Err(err);
    }

    let Json(request) = body.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": format!("invalid request: {e}")})),
        )
    })?;

    if request.client_id.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "client_id must not be empty"})),
        ));
    }

    if !request.approved {
        info!("billing: unapproved payment event for {}", request.client_id);
        return Ok((
            StatusCode::OK,
            Json(json!({"status": "ignored", "client_id": request.client_id})),
        ));
    }

    let new_expiry = NaiveDate::parse_from_str(&request.new_expiry, "%Y-%m-%d").map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": format!("invalid new_expiry '{}': {e}", request.new_expiry)})),
        )
    })?;

    state
        .gate
        .renew(&request.client_id, new_expiry)
        .await
        .map_err(|e| {
            error!("billing: renew failed for {}: {e}", request.client_id);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": format!("renew failed: {e}")})),
            )
        })?;

    info!(
        "billing: renewed {} until {new_expiry}",
        request.client_id
    );

    Ok((
        StatusCode::OK,
        Json(json!({
            "status": "renewed",
            "client_id": request.client_id,
            "expires_on": new_expiry.to_string(),
        })),
    ))
}

/// Build the axum router with shared state.
fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/billing/callback", post(billing_callback))
        .layer(axum::extract::DefaultBodyLimit::max(64 * 1024))
        .with_state(state)
}

/// Start the API server. Called from `Gateway::run()`.
pub async fn serve(config: ApiConfig, gate: LicenseGate, uptime: Instant) {
    let api_key = if config.api_key.is_empty() {
        None
    } else {
        Some(config.api_key.clone())
    };

    let state = ApiState {
        gate,
        api_key,
        uptime,
    };

    let app = build_router(state);
    let addr = format!("{}:{}", config.host, config.port);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("API server failed to bind to {addr}: {e}");
            return;
        }
    };

    info!("API server listening on {addr}");

    if let Err(e) = axum::serve(listener, app).await {
        error!("API server error: {e}");
    }
}
