use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::import;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResponse {
    pub records_imported: usize,
}

/// `POST /api/import` — CSV text body. Parses, appends to the store
/// as one batch, then refetches the set and resets to page 1.
pub async fn upload(
    State(ctx): State<ApiContext>,
    body: String,
) -> Result<Json<ImportResponse>, ApiError> {
    let state = ctx.state.clone();
    let store = ctx.store.clone();
    let count =
        tokio::task::spawn_blocking(move || import::import_csv(&state, store.as_ref(), &body))
            .await
            .map_err(|e| ApiError::Internal(format!("import task failed: {e}")))??;
    Ok(Json(ImportResponse {
        records_imported: count,
    }))
}
