//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::edit::EditError;
use crate::import::ImportError;
use crate::state::StateError;
use crate::store::StoreError;

/// Structured error response body for the dashboard UI.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The backing sheet is missing; the UI shows setup guidance
    /// instead of a generic failure.
    #[error("Record store is not configured: {0}")]
    SheetNotConfigured(String),
    #[error("Record store unavailable: {0}")]
    Upstream(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Edit conflict: {0}")]
    EditConflict(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Invalid CSV: {0}")]
    InvalidCsv(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::SheetNotConfigured(detail) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SHEET_NOT_CONFIGURED",
                detail.clone(),
            ),
            ApiError::Upstream(detail) => {
                (StatusCode::BAD_GATEWAY, "UPSTREAM", detail.clone())
            }
            ApiError::NotFound(detail) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", detail.clone())
            }
            ApiError::EditConflict(detail) => {
                (StatusCode::CONFLICT, "EDIT_CONFLICT", detail.clone())
            }
            ApiError::BadRequest(detail) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail.clone())
            }
            ApiError::InvalidCsv(detail) => {
                (StatusCode::BAD_REQUEST, "CSV_INVALID", detail.clone())
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail = %detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Configuration(detail) => ApiError::SheetNotConfigured(detail),
            StoreError::Network(detail)
            | StoreError::Remote(detail)
            | StoreError::ResponseParsing(detail) => ApiError::Upstream(detail),
        }
    }
}

impl From<StateError> for ApiError {
    fn from(err: StateError) -> Self {
        match err {
            StateError::LockPoisoned => ApiError::Internal("lock poisoned".into()),
        }
    }
}

impl From<EditError> for ApiError {
    fn from(err: EditError) -> Self {
        match err {
            EditError::UnknownRecord(_) => ApiError::NotFound(err.to_string()),
            EditError::NotEditing(_)
            | EditError::AlreadyEditing(_)
            | EditError::SaveInFlight(_) => ApiError::EditConflict(err.to_string()),
            EditError::InvalidCallDate(_) => ApiError::BadRequest(err.to_string()),
            EditError::LockPoisoned => ApiError::Internal("lock poisoned".into()),
            EditError::Store(store_err) => store_err.into(),
        }
    }
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::TooFewLines => ApiError::InvalidCsv(err.to_string()),
            ImportError::Store(store_err) => store_err.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn response_json(response: Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), 4096).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn sheet_not_configured_returns_503() {
        let err = ApiError::SheetNotConfigured("Sheet \"PatientData\" not found".into());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let json = response_json(response).await;
        assert_eq!(json["error"]["code"], "SHEET_NOT_CONFIGURED");
        assert!(json["error"]["message"].as_str().unwrap().contains("PatientData"));
    }

    #[tokio::test]
    async fn upstream_returns_502() {
        let response = ApiError::Upstream("connection refused".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let json = response_json(response).await;
        assert_eq!(json["error"]["code"], "UPSTREAM");
    }

    #[tokio::test]
    async fn edit_conflict_returns_409() {
        let response = ApiError::EditConflict("already saving".into()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn internal_hides_details() {
        let response = ApiError::Internal("lock poisoned".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = response_json(response).await;
        assert_eq!(json["error"]["message"], "An internal error occurred");
    }

    #[tokio::test]
    async fn invalid_csv_returns_400() {
        let err: ApiError = ImportError::TooFewLines.into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = response_json(response).await;
        assert_eq!(json["error"]["code"], "CSV_INVALID");
    }

    #[test]
    fn store_configuration_maps_to_setup_guidance() {
        let err: ApiError = StoreError::Configuration("Sheet not found".into()).into();
        assert!(matches!(err, ApiError::SheetNotConfigured(_)));

        let err: ApiError = StoreError::Network("timeout".into()).into();
        assert!(matches!(err, ApiError::Upstream(_)));
    }

    #[test]
    fn edit_errors_map_by_kind() {
        let err: ApiError = EditError::UnknownRecord("rec-9".into()).into();
        assert!(matches!(err, ApiError::NotFound(_)));

        let err: ApiError = EditError::SaveInFlight("rec-1".into()).into();
        assert!(matches!(err, ApiError::EditConflict(_)));

        let err: ApiError = EditError::InvalidCallDate("garbage".into()).into();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let err: ApiError =
            EditError::Store(StoreError::Configuration("Sheet missing".into())).into();
        assert!(matches!(err, ApiError::SheetNotConfigured(_)));
    }
}
