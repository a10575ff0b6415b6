//! Summary counts for the analytics view: status buckets, patients
//! per doctor, calls handled per agent.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::followup;
use crate::models::enums::CallStatus;
use crate::models::patient::PatientRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountEntry {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_patients: usize,
    pub calls_completed: usize,
    pub calls_overdue: usize,
    pub calls_today: usize,
    pub calls_upcoming: usize,
    /// Records with a non-empty doctor name, grouped by doctor.
    pub patients_per_doctor: Vec<CountEntry>,
    /// An agent is credited only once an outcome exists for the call.
    pub calls_per_agent: Vec<CountEntry>,
}

/// Count by key preserving first-encounter order, then rank by count
/// descending. `sort_by` is stable, so ties keep encounter order.
fn ranked_counts<'a>(keys: impl Iterator<Item = &'a str>) -> Vec<CountEntry> {
    let mut entries: Vec<CountEntry> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for key in keys {
        match index.get(key) {
            Some(&i) => entries[i].count += 1,
            None => {
                index.insert(key.to_string(), entries.len());
                entries.push(CountEntry {
                    name: key.to_string(),
                    count: 1,
                });
            }
        }
    }
    entries.sort_by(|a, b| b.count.cmp(&a.count));
    entries
}

/// Compute the full analytics summary. Every record lands in exactly
/// one status bucket, so the four bucket counts sum to the total.
pub fn summarize(records: &[PatientRecord], today: NaiveDate) -> Summary {
    let mut calls_completed = 0;
    let mut calls_overdue = 0;
    let mut calls_today = 0;
    let mut calls_upcoming = 0;

    for record in records {
        match followup::status_of(record, today) {
            CallStatus::Completed => calls_completed += 1,
            CallStatus::Overdue => calls_overdue += 1,
            CallStatus::NeedActionToday => calls_today += 1,
            CallStatus::Upcoming => calls_upcoming += 1,
        }
    }

    let patients_per_doctor = ranked_counts(
        records
            .iter()
            .map(|r| r.doctor_name.as_str())
            .filter(|name| !name.is_empty()),
    );

    let calls_per_agent = ranked_counts(
        records
            .iter()
            .filter(|r| !r.agent_name.is_empty() && !r.call_outcome.is_empty())
            .map(|r| r.agent_name.as_str()),
    );

    Summary {
        total_patients: records.len(),
        calls_completed,
        calls_overdue,
        calls_today,
        calls_upcoming,
        patients_per_doctor,
        calls_per_agent,
    }
}
