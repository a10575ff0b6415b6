//! View-state endpoints: the filter and page the dashboard shows.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::followup;
use crate::models::filters::RecordFilter;

/// `PUT /api/view/filter` — replace the active filter. Changing any
/// dimension resets the visible page to 1.
pub async fn set_filter(
    State(ctx): State<ApiContext>,
    Json(filter): Json<RecordFilter>,
) -> Result<StatusCode, ApiError> {
    ctx.state.set_filter(filter)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct PageRequest {
    pub page: usize,
}

/// `PUT /api/view/page` — request a page of the filtered view.
/// Out-of-range requests are rejected outright, never clamped.
pub async fn set_page(
    State(ctx): State<ApiContext>,
    Json(request): Json<PageRequest>,
) -> Result<StatusCode, ApiError> {
    let accepted = ctx.state.set_page(request.page, followup::today_local())?;
    if accepted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::BadRequest(format!(
            "Page {} is out of range",
            request.page
        )))
    }
}
