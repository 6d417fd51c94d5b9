//! Health check endpoint
//!
//! Pings the session store on every call, independent of any user session.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "ok", or "degraded" when the session store does not answer
    pub status: String,
    pub module: String,
    pub version: String,
    pub uptime_seconds: u64,
    /// "ok" or "unavailable"
    pub store: String,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;

    let (status_code, status, store) = match state.store.ping().await {
        Ok(()) => (StatusCode::OK, "ok", "ok"),
        Err(e) => {
            tracing::warn!(error = %e, "Health check: session store ping failed");
            (StatusCode::SERVICE_UNAVAILABLE, "degraded", "unavailable")
        }
    };

    (
        status_code,
        Json(HealthResponse {
            status: status.to_string(),
            module: "showfav-server".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds,
            store: store.to_string(),
        }),
    )
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
