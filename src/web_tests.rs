#![cfg(test)]

use super::refresh::{RateSnapshot, RateStatus};
use super::tariff::{Season, TierLabel};
use super::web::*;
use axum::http::{Request, StatusCode};
use tokio::sync::watch;
use tower::ServiceExt;

fn router_with(status: RateStatus) -> (axum::Router, watch::Sender<RateStatus>) {
    let (tx, rx) = watch::channel(status);
    let router = build_router(AppState {
        status_rx: rx,
        version: "test",
    });
    (router, tx)
}

async fn get_json(router: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = router
        .oneshot(
            Request::builder()
                .uri(uri)
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

fn snapshot() -> RateSnapshot {
    RateSnapshot {
        current_rate: 0.45,
        tier: TierLabel::Peak,
        season: Season::Winter,
        next_change: None,
        utility_name: "Example Utility".to_string(),
        rate_plan_name: "TOU-D".to_string(),
        last_api_fetch: None,
        gas_rate: None,
        gas_unit: None,
    }
}

#[tokio::test]
async fn health_reports_version() {
    let (router, _tx) = router_with(RateStatus::Starting);
    let (status, json) = get_json(router, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], "test");
}

#[tokio::test]
async fn rate_is_503_before_first_cycle() {
    let (router, _tx) = router_with(RateStatus::Starting);
    let (status, json) = get_json(router, "/api/rate").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["status"], "unavailable");
    assert_eq!(json["reason"], "starting");
    assert!(json["last_fetch"].is_null());
}

#[tokio::test]
async fn rate_returns_latest_snapshot() {
    let (router, tx) = router_with(RateStatus::Starting);
    tx.send_replace(RateStatus::Available(snapshot()));
    let (status, json) = get_json(router, "/api/rate").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["current_rate"], 0.45);
    assert_eq!(json["tier"], "peak");
    assert_eq!(json["rate_plan_name"], "TOU-D");
}

#[tokio::test]
async fn rate_reports_unavailable_reason() {
    let (router, _tx) = router_with(RateStatus::Unavailable {
        reason: "Rate unavailable: no schedule".to_string(),
        last_fetch: None,
    });
    let (status, json) = get_json(router, "/api/rate").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["reason"], "Rate unavailable: no schedule");
}
