//! Remote record store: the spreadsheet behind a deployed scripting
//! web app. The sheet is ground truth; this process never assumes
//! consistency beyond "last write wins".
//!
//! The boundary is a sync trait (callers on the async side go through
//! `tokio::task::spawn_blocking`) with an HTTP implementation and an
//! in-memory mock for tests.

use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::patient::PatientRecord;

/// A new row for a batch append, keyed by sheet column header.
/// Appended rows carry no id/rowNumber; the store assigns both.
pub type ImportRow = BTreeMap<String, String>;

/// Large enough to pull the whole sheet in one page; filtering and
/// pagination happen on our side.
pub const FETCH_ALL_LIMIT: u32 = 10_000;

/// One page of records from the backing sheet.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchPage {
    pub records: Vec<PatientRecord>,
    pub total_pages: u32,
    pub total_records: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing sheet the script expects does not exist. Needs
    /// operator action on the spreadsheet, not a retry.
    #[error("Record store is not configured: {0}")]
    Configuration(String),
    #[error("Network error: {0}")]
    Network(String),
    /// Application-level failure reported by the script, carrying
    /// its human-readable detail string.
    #[error("Record store error: {0}")]
    Remote(String),
    #[error("Unexpected response from record store: {0}")]
    ResponseParsing(String),
}

impl StoreError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

/// The spreadsheet boundary: fetch-all (paginated), update-one,
/// append-many.
pub trait RecordStore: Send + Sync {
    fn fetch_page(&self, page: u32, limit: u32) -> Result<FetchPage, StoreError>;

    fn update(&self, record: &PatientRecord) -> Result<(), StoreError>;

    fn append(&self, rows: &[ImportRow]) -> Result<(), StoreError>;

    /// Pull the whole sheet in one request.
    fn fetch_all(&self) -> Result<FetchPage, StoreError> {
        self.fetch_page(1, FETCH_ALL_LIMIT)
    }
}

// ═══════════════════════════════════════════════════════════
// SheetsClient — HTTP implementation
// ═══════════════════════════════════════════════════════════

/// HTTP client for the deployed scripting web app.
pub struct SheetsClient {
    script_url: String,
    client: reqwest::blocking::Client,
}

impl SheetsClient {
    /// No request timeout is configured: the script endpoint can be
    /// slow and the dashboard waits for it rather than abandoning a
    /// write midway.
    pub fn new(script_url: &str) -> Self {
        let client = reqwest::blocking::Client::builder()
            .build()
            .expect("Failed to create HTTP client");

        Self {
            script_url: script_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn script_url(&self) -> &str {
        &self.script_url
    }

    /// The script reports a missing backing sheet as a plain error
    /// string; that one needs setup guidance, not a retry.
    fn classify_remote(detail: String) -> StoreError {
        if detail.contains("Sheet") && detail.contains("not found") {
            StoreError::Configuration(detail)
        } else {
            StoreError::Remote(detail)
        }
    }

    fn post_action<T: Serialize>(&self, action: &str, data: T) -> Result<(), StoreError> {
        let payload = ScriptRequest { action, data };
        let body = serde_json::to_string(&payload)
            .map_err(|e| StoreError::ResponseParsing(e.to_string()))?;

        let response = self
            .client
            .post(&self.script_url)
            // text/plain keeps the POST "simple" (no CORS preflight)
            // and survives the script host's redirect.
            .header("Content-Type", "text/plain;charset=utf-8")
            .body(body)
            .send()
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Network(format!(
                "Network response was not ok. Status: {status}"
            )));
        }

        let result: ScriptResponse = response
            .json()
            .map_err(|e| StoreError::ResponseParsing(e.to_string()))?;
        result.into_result()
    }
}

#[derive(Serialize)]
struct ScriptRequest<'a, T> {
    action: &'a str,
    data: T,
}

/// Envelope for POST responses. A 2xx body can still carry an error.
#[derive(Deserialize)]
struct ScriptResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

impl ScriptResponse {
    fn into_result(self) -> Result<(), StoreError> {
        if let Some(error) = self.error {
            return Err(SheetsClient::classify_remote(
                self.details.unwrap_or(error),
            ));
        }
        if !self.success {
            return Err(StoreError::Remote(self.message.unwrap_or_else(|| {
                "The API indicated the operation failed.".to_string()
            })));
        }
        Ok(())
    }
}

/// Envelope for GET responses: either a page or an error pair.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FetchEnvelope {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    records: Option<Vec<PatientRecord>>,
    #[serde(default)]
    total_pages: Option<u32>,
    #[serde(default)]
    total_records: Option<u32>,
}

impl RecordStore for SheetsClient {
    fn fetch_page(&self, page: u32, limit: u32) -> Result<FetchPage, StoreError> {
        let response = self
            .client
            .get(&self.script_url)
            .query(&[("page", page.to_string()), ("limit", limit.to_string())])
            .send()
            .map_err(|e| StoreError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Network(format!(
                "Network response was not ok. Status: {status}"
            )));
        }

        let envelope: FetchEnvelope = response
            .json()
            .map_err(|e| StoreError::ResponseParsing(e.to_string()))?;

        if let Some(error) = envelope.error {
            return Err(Self::classify_remote(envelope.details.unwrap_or(error)));
        }

        match (envelope.records, envelope.total_pages, envelope.total_records) {
            (Some(records), Some(total_pages), Some(total_records)) => Ok(FetchPage {
                records,
                total_pages,
                total_records,
            }),
            _ => Err(StoreError::ResponseParsing(
                "response carried neither records nor an error".into(),
            )),
        }
    }

    fn update(&self, record: &PatientRecord) -> Result<(), StoreError> {
        self.post_action("update", record)
    }

    fn append(&self, rows: &[ImportRow]) -> Result<(), StoreError> {
        self.post_action("append", rows)
    }
}

// ═══════════════════════════════════════════════════════════
// MockRecordStore — in-memory store for tests
// ═══════════════════════════════════════════════════════════

/// In-memory store for tests: serves a canned sheet, records every
/// write for assertions, and can fail the next operation on demand.
pub struct MockRecordStore {
    records: Mutex<Vec<PatientRecord>>,
    updates: Mutex<Vec<PatientRecord>>,
    append_batches: Mutex<Vec<Vec<ImportRow>>>,
    fail_next: Mutex<Option<StoreError>>,
}

impl MockRecordStore {
    pub fn new(records: Vec<PatientRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            updates: Mutex::new(Vec::new()),
            append_batches: Mutex::new(Vec::new()),
            fail_next: Mutex::new(None),
        }
    }

    /// Make the next store operation fail with `err`.
    pub fn fail_next(&self, err: StoreError) {
        if let Ok(mut slot) = self.fail_next.lock() {
            *slot = Some(err);
        }
    }

    pub fn updates(&self) -> Vec<PatientRecord> {
        self.updates.lock().map(|u| u.clone()).unwrap_or_default()
    }

    pub fn append_batches(&self) -> Vec<Vec<ImportRow>> {
        self.append_batches
            .lock()
            .map(|b| b.clone())
            .unwrap_or_default()
    }

    fn take_failure(&self) -> Option<StoreError> {
        self.fail_next.lock().ok().and_then(|mut slot| slot.take())
    }

    /// Synthesize a sheet row from an import row the way the script
    /// does: id and rowNumber are assigned on append. Rows without a
    /// parseable visit date are skipped.
    fn row_to_record(row: &ImportRow, row_number: u32) -> Option<PatientRecord> {
        let field = |name: &str| row.get(name).cloned().unwrap_or_default();
        let visit = NaiveDate::parse_from_str(&field("lastVisitDate"), "%Y-%m-%d").ok()?;
        Some(PatientRecord {
            id: uuid::Uuid::new_v4().to_string(),
            row_number,
            patient_id: field("patientId"),
            patient_name: field("patientName"),
            doctor_name: field("doctorName"),
            last_visit_date: visit,
            department: field("department"),
            patient_type: field("patientType"),
            call_outcome: field("callOutcome"),
            agent_name: field("agentName"),
            call_date: NaiveDate::parse_from_str(&field("callDate"), "%Y-%m-%d").ok(),
            notes: field("notes"),
        })
    }
}

impl RecordStore for MockRecordStore {
    fn fetch_page(&self, page: u32, limit: u32) -> Result<FetchPage, StoreError> {
        if let Some(err) = self.take_failure() {
            return Err(err);
        }
        let all = self.records.lock().map_err(|_| {
            StoreError::Remote("mock store lock poisoned".into())
        })?;
        let total_records = all.len() as u32;
        let total_pages = total_records.div_ceil(limit.max(1));
        let start = ((page.max(1) - 1) * limit) as usize;
        let records = all.iter().skip(start).take(limit as usize).cloned().collect();
        Ok(FetchPage {
            records,
            total_pages,
            total_records,
        })
    }

    fn update(&self, record: &PatientRecord) -> Result<(), StoreError> {
        if let Some(err) = self.take_failure() {
            return Err(err);
        }
        if let Ok(mut all) = self.records.lock() {
            if let Some(existing) = all.iter_mut().find(|r| r.id == record.id) {
                *existing = record.clone();
            }
        }
        if let Ok(mut updates) = self.updates.lock() {
            updates.push(record.clone());
        }
        Ok(())
    }

    fn append(&self, rows: &[ImportRow]) -> Result<(), StoreError> {
        if let Some(err) = self.take_failure() {
            return Err(err);
        }
        if let Ok(mut all) = self.records.lock() {
            let mut next_row = all.len() as u32 + 2; // row 1 is the header
            for row in rows {
                if let Some(record) = Self::row_to_record(row, next_row) {
                    all.push(record);
                    next_row += 1;
                }
            }
        }
        if let Ok(mut batches) = self.append_batches.lock() {
            batches.push(rows.to_vec());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> PatientRecord {
        PatientRecord {
            id: id.into(),
            row_number: 2,
            patient_id: format!("P-{id}"),
            patient_name: format!("Patient {id}"),
            doctor_name: String::new(),
            last_visit_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            department: String::new(),
            patient_type: "OPD".into(),
            call_outcome: String::new(),
            agent_name: String::new(),
            call_date: None,
            notes: String::new(),
        }
    }

    #[test]
    fn classify_remote_detects_missing_sheet() {
        let err = SheetsClient::classify_remote("Sheet \"PatientData\" not found".into());
        assert!(err.is_configuration());

        let err = SheetsClient::classify_remote("Row 7 is out of range".into());
        assert!(matches!(err, StoreError::Remote(_)));
    }

    #[test]
    fn script_response_success() {
        let response: ScriptResponse =
            serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert!(response.into_result().is_ok());
    }

    #[test]
    fn script_response_error_prefers_details() {
        let response: ScriptResponse = serde_json::from_str(
            r#"{"error":"SheetError","details":"Sheet \"PatientData\" not found"}"#,
        )
        .unwrap();
        let err = response.into_result().unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("PatientData"));
    }

    #[test]
    fn script_response_unsuccessful_carries_message() {
        let response: ScriptResponse =
            serde_json::from_str(r#"{"success":false,"message":"Row not found"}"#).unwrap();
        match response.into_result().unwrap_err() {
            StoreError::Remote(detail) => assert_eq!(detail, "Row not found"),
            other => panic!("Expected Remote, got: {other}"),
        }
    }

    #[test]
    fn script_response_unsuccessful_without_message_gets_default() {
        let response: ScriptResponse = serde_json::from_str(r#"{}"#).unwrap();
        match response.into_result().unwrap_err() {
            StoreError::Remote(detail) => {
                assert_eq!(detail, "The API indicated the operation failed.")
            }
            other => panic!("Expected Remote, got: {other}"),
        }
    }

    #[test]
    fn fetch_envelope_parses_page() {
        let envelope: FetchEnvelope = serde_json::from_str(
            r#"{
                "records": [{
                    "id": "rec-1",
                    "rowNumber": 2,
                    "patientId": "P-1",
                    "patientName": "Asha Verma",
                    "lastVisitDate": "2024-01-01"
                }],
                "totalPages": 1,
                "totalRecords": 1
            }"#,
        )
        .unwrap();
        assert!(envelope.error.is_none());
        assert_eq!(envelope.records.unwrap().len(), 1);
    }

    #[test]
    fn sheets_client_trims_trailing_slash() {
        let client = SheetsClient::new("https://script.example.com/exec/");
        assert_eq!(client.script_url(), "https://script.example.com/exec");
    }

    #[test]
    fn mock_fetch_all_serves_everything() {
        let store = MockRecordStore::new(vec![record("1"), record("2")]);
        let page = store.fetch_all().unwrap();
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.total_records, 2);
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn mock_fail_next_fails_once() {
        let store = MockRecordStore::new(vec![record("1")]);
        store.fail_next(StoreError::Network("connection refused".into()));
        assert!(store.fetch_all().is_err());
        assert!(store.fetch_all().is_ok());
    }

    #[test]
    fn mock_update_replaces_and_records() {
        let store = MockRecordStore::new(vec![record("1")]);
        let mut updated = record("1");
        updated.call_outcome = "No Answer".into();
        store.update(&updated).unwrap();

        assert_eq!(store.updates().len(), 1);
        let page = store.fetch_all().unwrap();
        assert_eq!(page.records[0].call_outcome, "No Answer");
    }

    #[test]
    fn mock_append_assigns_identity() {
        let store = MockRecordStore::new(vec![record("1")]);
        let mut row = ImportRow::new();
        row.insert("patientId".into(), "P-55".into());
        row.insert("patientName".into(), "Lata Iyer".into());
        row.insert("lastVisitDate".into(), "2024-02-10".into());
        store.append(&[row]).unwrap();

        let page = store.fetch_all().unwrap();
        assert_eq!(page.records.len(), 2);
        let appended = &page.records[1];
        assert!(!appended.id.is_empty());
        assert_eq!(appended.row_number, 3);
        assert_eq!(appended.patient_name, "Lata Iyer");
        assert_eq!(store.append_batches().len(), 1);
    }

    #[test]
    fn mock_append_skips_rows_without_a_date() {
        let store = MockRecordStore::new(Vec::new());
        let mut row = ImportRow::new();
        row.insert("patientName".into(), "No Date".into());
        store.append(&[row]).unwrap();
        assert_eq!(store.fetch_all().unwrap().records.len(), 0);
        // The batch itself is still recorded
        assert_eq!(store.append_batches().len(), 1);
    }
}
