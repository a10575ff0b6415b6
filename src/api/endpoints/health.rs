use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::types::ApiContext;
use crate::config;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub records_loaded: usize,
    pub last_refreshed: Option<DateTime<Utc>>,
}

/// `GET /api/health` — liveness plus a glance at the data state.
pub async fn check(State(ctx): State<ApiContext>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: config::APP_VERSION,
        records_loaded: ctx.state.record_count(),
        last_refreshed: ctx.state.last_refreshed(),
    })
}
