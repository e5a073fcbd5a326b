//! Service description and health.

use crate::{AppState, SERVICE_NAME};
use axum::extract::State;
use axum::Json;
use medphase_image::{Phase, CODEC_VERSION_REQ};
use serde_json::{json, Value};

/// `GET /`
pub async fn root() -> Json<Value> {
    let phases: Vec<Value> = Phase::ALL
        .iter()
        .map(|p| json!({ "name": p.as_str(), "filter": p.describe() }))
        .collect();

    Json(json!({
        "status": "online",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "/process": "POST - Process medical images with arterial or venous phase filters",
            "/health": "GET - Service status and library versions",
        },
        "phases": phases,
    }))
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let metrics = medphase_telemetry::metrics().export_json();

    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "image_version_req": CODEC_VERSION_REQ,
        "uptime_secs": state.uptime_secs(),
        "metrics": {
            "counters": metrics["counters"],
            "histograms": metrics["histograms"],
        },
    }))
}
