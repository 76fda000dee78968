//! HTTP status surface
//!
//! Read-only: serves the latest [`RateStatus`] published by the service loop.

use crate::refresh::RateStatus;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{DateTime, FixedOffset};
use std::net::{IpAddr, SocketAddr};
use tokio::sync::watch;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Clone)]
pub struct AppState {
    pub status_rx: watch::Receiver<RateStatus>,
    pub version: &'static str,
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "ok", "version": state.version })),
    )
}

fn unavailable(reason: &str, last_fetch: Option<DateTime<FixedOffset>>) -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(serde_json::json!({
            "status": "unavailable",
            "reason": reason,
            "last_fetch": last_fetch,
        })),
    )
        .into_response()
}

/// Latest snapshot, or 503 while no rate can be produced
pub async fn rate(State(state): State<AppState>) -> Response {
    let status = state.status_rx.borrow().clone();
    match status {
        RateStatus::Available(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        RateStatus::Starting => unavailable("starting", None),
        RateStatus::Unavailable { reason, last_fetch } => unavailable(&reason, last_fetch),
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/rate", get(rate))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(
    status_rx: watch::Receiver<RateStatus>,
    version: &'static str,
    host: &str,
    port: u16,
) -> anyhow::Result<()> {
    let router = build_router(AppState { status_rx, version });
    let logger = crate::logging::get_logger("web");

    let addr = match host.parse::<IpAddr>() {
        Ok(ip) => SocketAddr::new(ip, port),
        Err(_) => {
            logger.warn(&format!("Invalid host '{}'; falling back to 127.0.0.1", host));
            ([127, 0, 0, 1], port).into()
        }
    };

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    logger.info(&format!(
        "Web server listening at http://{}:{}",
        local_addr.ip(),
        local_addr.port()
    ));

    axum::serve(listener, router).await?;
    Ok(())
}
