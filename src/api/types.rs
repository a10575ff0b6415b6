//! Shared types for the dashboard API layer.

use std::sync::Arc;

use crate::state::DashboardState;
use crate::store::RecordStore;

/// Shared context for all API routes: the dashboard state plus the
/// remote record store that refreshes and edits go through.
#[derive(Clone)]
pub struct ApiContext {
    pub state: Arc<DashboardState>,
    pub store: Arc<dyn RecordStore>,
}

impl ApiContext {
    pub fn new(state: Arc<DashboardState>, store: Arc<dyn RecordStore>) -> Self {
        Self { state, store }
    }
}
