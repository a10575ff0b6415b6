//! Record listing, refresh, and the per-record edit flow.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::edit::{self, DraftPatch};
use crate::followup;
use crate::models::filters::RecordFilter;
use crate::models::patient::PatientRecord;
use crate::view::{self, PageView};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordsResponse {
    #[serde(flatten)]
    pub page: PageView,
    pub filter: RecordFilter,
    pub doctors: Vec<String>,
    pub call_outcomes: &'static [&'static str],
    pub last_refreshed: Option<DateTime<Utc>>,
}

/// `GET /api/records` — the current derived page view plus everything
/// the filter bar needs.
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<RecordsResponse>, ApiError> {
    let today = followup::today_local();
    let page = ctx.state.page_view(today)?;
    let filter = ctx.state.current_filter()?;
    let doctors = {
        let records = ctx.state.read_records()?;
        view::distinct_doctors(&records)
    };

    Ok(Json(RecordsResponse {
        page,
        filter,
        doctors,
        call_outcomes: followup::CALL_OUTCOMES,
        last_refreshed: ctx.state.last_refreshed(),
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub records_loaded: usize,
}

/// `POST /api/records/refresh` — bulk refetch from the backing sheet,
/// replacing the whole in-memory set.
pub async fn refresh(
    State(ctx): State<ApiContext>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let state = ctx.state.clone();
    let store = ctx.store.clone();
    let count = tokio::task::spawn_blocking(move || state.refresh_from_store(store.as_ref()))
        .await
        .map_err(|e| ApiError::Internal(format!("refresh task failed: {e}")))??;
    Ok(Json(RefreshResponse {
        records_loaded: count,
    }))
}

/// `POST /api/records/:id/edit` — begin an edit; returns the working
/// copy.
pub async fn begin_edit(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<PatientRecord>, ApiError> {
    let draft = edit::begin_edit(&ctx.state, &id)?;
    Ok(Json(draft))
}

/// `PATCH /api/records/:id/edit` — apply field edits to the working
/// copy; returns its new contents.
pub async fn update_draft(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    Json(patch): Json<DraftPatch>,
) -> Result<Json<PatientRecord>, ApiError> {
    let draft = edit::update_draft(&ctx.state, &id, &patch)?;
    Ok(Json(draft))
}

/// `DELETE /api/records/:id/edit` — cancel, discarding the working
/// copy. No remote call.
pub async fn cancel_edit(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    edit::cancel_edit(&ctx.state, &id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/records/:id/save` — persist the working copy.
pub async fn save(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<PatientRecord>, ApiError> {
    let state = ctx.state.clone();
    let store = ctx.store.clone();
    let saved = tokio::task::spawn_blocking(move || edit::save_edit(&state, store.as_ref(), &id))
        .await
        .map_err(|e| ApiError::Internal(format!("save task failed: {e}")))??;
    Ok(Json(saved))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeRequest {
    pub call_outcome: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeResponse {
    /// False when the no-op guard fired (same outcome reselected).
    pub updated: bool,
    pub record: Option<PatientRecord>,
}

/// `POST /api/records/:id/outcome` — the outcome fast path: persist a
/// new outcome straight from the table row.
pub async fn set_outcome(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    Json(request): Json<OutcomeRequest>,
) -> Result<Json<OutcomeResponse>, ApiError> {
    let state = ctx.state.clone();
    let store = ctx.store.clone();
    let today = followup::today_local();
    let record = tokio::task::spawn_blocking(move || {
        edit::record_outcome(&state, store.as_ref(), &id, &request.call_outcome, today)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("outcome task failed: {e}")))??;

    Ok(Json(OutcomeResponse {
        updated: record.is_some(),
        record,
    }))
}
