//! Transport-agnostic dashboard state shared by every API handler.
//!
//! Holds the full in-memory record set (fetched wholesale from the
//! backing sheet), the current view (filter + page), per-record edit
//! sessions, and the single-slot notification banner.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock, RwLockReadGuard};
use std::time::{Duration, Instant};

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::edit::EditSession;
use crate::models::filters::RecordFilter;
use crate::models::patient::PatientRecord;
use crate::store::{RecordStore, StoreError};
use crate::view::{self, PageView, ViewState};

/// How long a notification banner stays up.
pub const NOTIFICATION_TTL: Duration = Duration::from_secs(5);

/// Errors from DashboardState operations.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Internal lock error")]
    LockPoisoned,
}

pub struct DashboardState {
    /// Full record set. Replaced wholesale by a refresh; individual
    /// entries replaced by id when a save lands.
    records: RwLock<Vec<PatientRecord>>,
    /// Filter + page the dashboard currently shows.
    view: RwLock<ViewState>,
    /// Per-record edit sessions; a record with no entry is Viewing.
    sessions: Mutex<HashMap<String, EditSession>>,
    /// Single-slot notification banner with explicit expiry.
    notification: Mutex<Option<Notification>>,
    /// When the set was last replaced from the store.
    last_refreshed: Mutex<Option<DateTime<Utc>>>,
}

impl DashboardState {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            view: RwLock::new(ViewState::new()),
            sessions: Mutex::new(HashMap::new()),
            notification: Mutex::new(None),
            last_refreshed: Mutex::new(None),
        }
    }

    // ── Record set ──────────────────────────────────────────

    /// Borrow the full record set without cloning.
    pub fn read_records(
        &self,
    ) -> Result<RwLockReadGuard<'_, Vec<PatientRecord>>, StateError> {
        self.records.read().map_err(|_| StateError::LockPoisoned)
    }

    pub fn record_count(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    /// Owned copy of one record, by id.
    pub fn record_by_id(&self, id: &str) -> Result<Option<PatientRecord>, StateError> {
        let records = self.read_records()?;
        Ok(records.iter().find(|r| r.id == id).cloned())
    }

    /// Replace the whole set (bulk fetch / post-import refetch).
    /// Any edit in flight reconciles afterwards by id; the later
    /// write wins.
    pub fn replace_records(&self, records: Vec<PatientRecord>) {
        if let Ok(mut guard) = self.records.write() {
            *guard = records;
        }
        if let Ok(mut stamp) = self.last_refreshed.lock() {
            *stamp = Some(Utc::now());
        }
    }

    /// Single-record replace, matched by id. A record that vanished
    /// in a concurrent refresh is left alone (the sheet already has
    /// the write; the next refetch shows it).
    pub fn apply_saved(&self, saved: &PatientRecord) {
        if let Ok(mut records) = self.records.write() {
            if let Some(existing) = records.iter_mut().find(|r| r.id == saved.id) {
                *existing = saved.clone();
            }
        }
    }

    pub fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        self.last_refreshed.lock().ok().and_then(|stamp| *stamp)
    }

    /// Pull the whole sheet and replace the in-memory set.
    pub fn refresh_from_store(&self, store: &dyn RecordStore) -> Result<usize, StoreError> {
        let page = store.fetch_all()?;
        let count = page.records.len();
        self.replace_records(page.records);
        tracing::info!(count, "Record set refreshed from store");
        Ok(count)
    }

    // ── View state ──────────────────────────────────────────

    pub fn current_filter(&self) -> Result<RecordFilter, StateError> {
        self.view
            .read()
            .map(|v| v.filter().clone())
            .map_err(|_| StateError::LockPoisoned)
    }

    /// Apply a new filter; changing any dimension resets the page.
    pub fn set_filter(&self, filter: RecordFilter) -> Result<(), StateError> {
        let mut view = self.view.write().map_err(|_| StateError::LockPoisoned)?;
        view.set_filter(filter);
        Ok(())
    }

    /// Request a page of the currently filtered view. Out-of-range
    /// requests are rejected (the view is left unchanged).
    pub fn set_page(&self, page: usize, today: NaiveDate) -> Result<bool, StateError> {
        let records = self.read_records()?;
        let mut view = self.view.write().map_err(|_| StateError::LockPoisoned)?;
        let filtered = view::filter_records(&records, view.filter(), today);
        let total = view::total_pages(filtered.len());
        Ok(view.set_page(page, total))
    }

    pub fn reset_page(&self) {
        if let Ok(mut view) = self.view.write() {
            view.reset_page();
        }
    }

    /// The visible page, derived fresh from the source set.
    pub fn page_view(&self, today: NaiveDate) -> Result<PageView, StateError> {
        let records = self.read_records()?;
        let view = self.view.read().map_err(|_| StateError::LockPoisoned)?;
        Ok(view.select(&records, today))
    }

    // ── Edit sessions ───────────────────────────────────────

    pub(crate) fn lock_sessions(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, EditSession>>, StateError> {
        self.sessions.lock().map_err(|_| StateError::LockPoisoned)
    }

    // ── Notification banner ─────────────────────────────────

    pub fn notify_success(&self, message: impl Into<String>) {
        self.set_notification(Notification::new(NotificationKind::Success, message));
    }

    pub fn notify_error(&self, message: impl Into<String>) {
        self.set_notification(Notification::new(NotificationKind::Error, message));
    }

    fn set_notification(&self, notification: Notification) {
        if let Ok(mut slot) = self.notification.lock() {
            *slot = Some(notification);
        }
    }

    /// The current banner, if any. An expired banner is cleared on
    /// read; the slot is a single owned value, not a log.
    pub fn current_notification(&self) -> Result<Option<Notification>, StateError> {
        let mut slot = self
            .notification
            .lock()
            .map_err(|_| StateError::LockPoisoned)?;
        if slot.as_ref().is_some_and(|n| n.is_expired()) {
            *slot = None;
        }
        Ok(slot.clone())
    }
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════
// Notification banner
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Error,
}

/// A transient banner. Auto-dismisses: reads after `expires_at` see
/// nothing.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    #[serde(skip)]
    expires_at: Instant,
}

impl Notification {
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            expires_at: Instant::now() + NOTIFICATION_TTL,
        }
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    #[cfg(test)]
    fn expired(kind: NotificationKind, message: &str) -> Self {
        Self {
            kind,
            message: message.into(),
            expires_at: Instant::now() - Duration::from_millis(1),
        }
    }
}
