use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::state::Notification;

#[derive(Serialize)]
pub struct NotificationResponse {
    /// The current banner; absent once it expires or when nothing
    /// has happened.
    pub notification: Option<Notification>,
}

/// `GET /api/notification` — the single-slot transient banner.
pub async fn current(
    State(ctx): State<ApiContext>,
) -> Result<Json<NotificationResponse>, ApiError> {
    Ok(Json(NotificationResponse {
        notification: ctx.state.current_notification()?,
    }))
}
