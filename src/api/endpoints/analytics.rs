use axum::extract::State;
use axum::Json;

use crate::analytics::{self, Summary};
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::followup;

/// `GET /api/analytics` — summary counts over the full record set.
pub async fn summary(State(ctx): State<ApiContext>) -> Result<Json<Summary>, ApiError> {
    let records = ctx.state.read_records()?;
    Ok(Json(analytics::summarize(&records, followup::today_local())))
}
