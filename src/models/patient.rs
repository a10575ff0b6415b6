use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::PatientType;

/// A follow-up call row as stored in the backing sheet.
///
/// `id` is the stable row identity (unique across the set);
/// `row_number` is the physical sheet position used for writes.
/// Derived values (call status, days since visit) are never stored
/// here; they are recomputed from these fields on every read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecord {
    pub id: String,
    pub row_number: u32,
    pub patient_id: String,
    pub patient_name: String,
    #[serde(default)]
    pub doctor_name: String,
    pub last_visit_date: NaiveDate,
    #[serde(default)]
    pub department: String,
    /// Raw cell value; only "OPD"/"IPD" are recognized.
    #[serde(default)]
    pub patient_type: String,
    /// Empty means the patient has not been called yet.
    #[serde(default)]
    pub call_outcome: String,
    #[serde(default)]
    pub agent_name: String,
    #[serde(default)]
    pub call_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: String,
}

impl PatientRecord {
    /// The visit type used for status calculation and filtering.
    ///
    /// Some sheets carry the type in the department column instead,
    /// so anything other than a recognized `patient_type` falls back
    /// to the raw `department` value (which may itself be ungrouped;
    /// status logic still runs on it).
    pub fn effective_visit_type(&self) -> &str {
        match self.patient_type.parse::<PatientType>() {
            Ok(_) => &self.patient_type,
            Err(_) => &self.department,
        }
    }
}
