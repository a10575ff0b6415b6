//! Dashboard API.
//!
//! Exposes the dashboard state as HTTP endpoints for the browser UI.
//! Routes are nested under `/api/`; everything else falls through to
//! the built UI assets. The router is composable:
//! `dashboard_router()` returns a `Router` that can be mounted on any
//! axum server instance.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod types;

pub use error::ApiError;
pub use router::dashboard_router;
pub use types::ApiContext;
