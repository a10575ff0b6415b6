//! Dashboard API router.
//!
//! Returns a composable `Router`: API routes under `/api/`, with
//! everything else falling through to the built UI assets. CORS is
//! permissive so a dev-server-hosted UI can talk to it during
//! development.

use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::api::endpoints;
use crate::api::types::ApiContext;
use crate::config;
use crate::state::DashboardState;
use crate::store::RecordStore;

/// Build the dashboard router.
pub fn dashboard_router(state: Arc<DashboardState>, store: Arc<dyn RecordStore>) -> Router {
    let ctx = ApiContext::new(state, store);

    let api = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/records", get(endpoints::records::list))
        .route("/records/refresh", post(endpoints::records::refresh))
        .route(
            "/records/:id/edit",
            post(endpoints::records::begin_edit)
                .patch(endpoints::records::update_draft)
                .delete(endpoints::records::cancel_edit),
        )
        .route("/records/:id/save", post(endpoints::records::save))
        .route("/records/:id/outcome", post(endpoints::records::set_outcome))
        .route("/view/filter", put(endpoints::view::set_filter))
        .route("/view/page", put(endpoints::view::set_page))
        .route("/analytics", get(endpoints::analytics::summary))
        .route("/import", post(endpoints::import::upload))
        .route("/notification", get(endpoints::notification::current))
        .with_state(ctx);

    Router::new()
        .nest("/api", api)
        .fallback_service(ServeDir::new(config::dashboard_dist_dir()))
        .layer(CorsLayer::permissive())
}
