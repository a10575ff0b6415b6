//! Per-record edit flow: an optimistic working copy, remote
//! persistence, and a notification on either outcome.
//!
//! Each record moves through an explicit state machine (Viewing,
//! i.e. no session, then Editing, then Saving) rather than ad hoc
//! booleans, so
//! impossible combinations (saving a cancelled edit, two writes for
//! one record) cannot be represented. Different records save
//! independently; the session lock is never held across the network
//! call.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::models::patient::PatientRecord;
use crate::state::{DashboardState, StateError};
use crate::store::{RecordStore, StoreError};

/// Agent name recorded when an outcome is set straight from the
/// table row, where nobody typed one in.
pub const SYSTEM_AGENT: &str = "System Update";

/// Where a record's edit flow currently is. A record with no session
/// at all is in the implicit Viewing state.
#[derive(Debug, Clone)]
pub enum EditSession {
    /// A working copy exists; edits land on it while the canonical
    /// record stays untouched.
    Editing { draft: PatientRecord },
    /// The working copy is on the wire. Saves, draft edits and
    /// cancels for this record are rejected until it resolves.
    Saving { draft: PatientRecord },
}

/// Fields an edit may change. Identity and visit fields are fixed by
/// the sheet. `call_date` comes as a string so an empty value can
/// clear it, matching the date input it is bound to.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DraftPatch {
    pub call_outcome: Option<String>,
    pub agent_name: Option<String>,
    pub call_date: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum EditError {
    #[error("No record with id {0}")]
    UnknownRecord(String),
    #[error("Record {0} is not being edited")]
    NotEditing(String),
    #[error("Record {0} already has an edit in progress")]
    AlreadyEditing(String),
    #[error("A save for record {0} is already in flight")]
    SaveInFlight(String),
    #[error("Invalid callDate value: {0}")]
    InvalidCallDate(String),
    #[error("Internal lock error")]
    LockPoisoned,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<StateError> for EditError {
    fn from(err: StateError) -> Self {
        match err {
            StateError::LockPoisoned => EditError::LockPoisoned,
        }
    }
}

/// Viewing → Editing: snapshot the canonical record as the working
/// copy. No side effects beyond the session entry.
pub fn begin_edit(state: &DashboardState, id: &str) -> Result<PatientRecord, EditError> {
    let canonical = state
        .record_by_id(id)?
        .ok_or_else(|| EditError::UnknownRecord(id.to_string()))?;

    let mut sessions = state.lock_sessions()?;
    match sessions.get(id) {
        Some(EditSession::Editing { .. }) => Err(EditError::AlreadyEditing(id.to_string())),
        Some(EditSession::Saving { .. }) => Err(EditError::SaveInFlight(id.to_string())),
        None => {
            sessions.insert(
                id.to_string(),
                EditSession::Editing {
                    draft: canonical.clone(),
                },
            );
            Ok(canonical)
        }
    }
}

/// Editing → Editing: apply field-level changes to the working copy
/// only.
pub fn update_draft(
    state: &DashboardState,
    id: &str,
    patch: &DraftPatch,
) -> Result<PatientRecord, EditError> {
    let call_date = parse_call_date(patch.call_date.as_deref())?;

    let mut sessions = state.lock_sessions()?;
    match sessions.get_mut(id) {
        Some(EditSession::Editing { draft }) => {
            if let Some(outcome) = &patch.call_outcome {
                draft.call_outcome = outcome.clone();
            }
            if let Some(agent) = &patch.agent_name {
                draft.agent_name = agent.clone();
            }
            if let Some(date) = call_date {
                draft.call_date = date;
            }
            if let Some(notes) = &patch.notes {
                draft.notes = notes.clone();
            }
            Ok(draft.clone())
        }
        Some(EditSession::Saving { .. }) => Err(EditError::SaveInFlight(id.to_string())),
        None => Err(EditError::NotEditing(id.to_string())),
    }
}

/// Editing → Viewing without a remote call; the working copy is
/// discarded.
pub fn cancel_edit(state: &DashboardState, id: &str) -> Result<(), EditError> {
    let mut sessions = state.lock_sessions()?;
    match sessions.get(id) {
        Some(EditSession::Editing { .. }) => {
            sessions.remove(id);
            Ok(())
        }
        Some(EditSession::Saving { .. }) => Err(EditError::SaveInFlight(id.to_string())),
        None => Err(EditError::NotEditing(id.to_string())),
    }
}

/// Editing → Saving → Viewing on success; back to Editing with the
/// working copy intact on failure, so the user can retry or cancel.
pub fn save_edit(
    state: &DashboardState,
    store: &dyn RecordStore,
    id: &str,
) -> Result<PatientRecord, EditError> {
    let draft = {
        let mut sessions = state.lock_sessions()?;
        match sessions.get(id) {
            Some(EditSession::Editing { draft }) => {
                let draft = draft.clone();
                sessions.insert(id.to_string(), EditSession::Saving { draft: draft.clone() });
                draft
            }
            Some(EditSession::Saving { .. }) => {
                return Err(EditError::SaveInFlight(id.to_string()))
            }
            None => return Err(EditError::NotEditing(id.to_string())),
        }
    };

    // Network call with no locks held: other records stay editable.
    let result = store.update(&draft);

    let mut sessions = state.lock_sessions()?;
    match result {
        Ok(()) => {
            sessions.remove(id);
            drop(sessions);
            state.apply_saved(&draft);
            state.notify_success("Patient record updated successfully.");
            Ok(draft)
        }
        Err(err) => {
            // Failure restores Editing with the draft unchanged.
            sessions.insert(id.to_string(), EditSession::Editing { draft });
            drop(sessions);
            state.notify_error(format!("Update failed: {err}"));
            Err(err.into())
        }
    }
}

/// Fast path: set an outcome straight from the table row, without
/// entering full edit mode. `call_date` defaults to today and
/// `agent_name` to the system sentinel when absent. Selecting the
/// outcome the record already has issues no request at all.
pub fn record_outcome(
    state: &DashboardState,
    store: &dyn RecordStore,
    id: &str,
    outcome: &str,
    today: NaiveDate,
) -> Result<Option<PatientRecord>, EditError> {
    let canonical = state
        .record_by_id(id)?
        .ok_or_else(|| EditError::UnknownRecord(id.to_string()))?;

    if canonical.call_outcome == outcome {
        return Ok(None);
    }

    let mut updated = canonical;
    updated.call_outcome = outcome.to_string();
    if updated.call_date.is_none() {
        updated.call_date = Some(today);
    }
    if updated.agent_name.is_empty() {
        updated.agent_name = SYSTEM_AGENT.to_string();
    }

    {
        let mut sessions = state.lock_sessions()?;
        match sessions.get(id) {
            Some(EditSession::Editing { .. }) => {
                return Err(EditError::AlreadyEditing(id.to_string()))
            }
            Some(EditSession::Saving { .. }) => {
                return Err(EditError::SaveInFlight(id.to_string()))
            }
            None => {
                sessions.insert(
                    id.to_string(),
                    EditSession::Saving { draft: updated.clone() },
                );
            }
        }
    }

    let result = store.update(&updated);

    let mut sessions = state.lock_sessions()?;
    sessions.remove(id);
    drop(sessions);

    match result {
        Ok(()) => {
            state.apply_saved(&updated);
            state.notify_success("Patient record updated successfully.");
            Ok(Some(updated))
        }
        Err(err) => {
            state.notify_error(format!("Update failed: {err}"));
            Err(err.into())
        }
    }
}

fn parse_call_date(raw: Option<&str>) -> Result<Option<Option<NaiveDate>>, EditError> {
    match raw {
        None => Ok(None),
        Some("") => Ok(Some(None)),
        Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(|date| Some(Some(date)))
            .map_err(|_| EditError::InvalidCallDate(value.to_string())),
    }
}
