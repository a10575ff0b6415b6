//! Derived view engine: filter, paginate, and decorate the in-memory
//! record set for the dashboard table.
//!
//! Filtering never mutates the source set and preserves its order.
//! Derived fields (status, days since visit, effective visit type)
//! are recomputed on every read so a stored outcome or date can never
//! drift from what is displayed.

use chrono::NaiveDate;
use serde::Serialize;

use crate::followup;
use crate::models::enums::CallStatus;
use crate::models::filters::RecordFilter;
use crate::models::patient::PatientRecord;

/// Rows per dashboard page.
pub const PAGE_SIZE: usize = 50;

/// One row of the dashboard table: the record plus its derived fields.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordView {
    #[serde(flatten)]
    pub record: PatientRecord,
    pub call_status: CallStatus,
    pub days_since_visit: i64,
    pub visit_type: String,
}

impl RecordView {
    pub fn derive(record: &PatientRecord, today: NaiveDate) -> Self {
        Self {
            call_status: followup::status_of(record, today),
            days_since_visit: followup::days_since(record.last_visit_date, today),
            visit_type: record.effective_visit_type().to_string(),
            record: record.clone(),
        }
    }
}

fn dimension_set(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// A record passes when every set dimension matches.
fn matches(record: &PatientRecord, filter: &RecordFilter, today: NaiveDate) -> bool {
    let search_ok = match dimension_set(filter.search_term.as_deref()) {
        None => true,
        Some(term) => {
            let term = term.to_lowercase();
            record.patient_name.to_lowercase().contains(&term)
                || record.patient_id.to_lowercase().contains(&term)
        }
    };

    let status_ok = filter
        .status
        .map_or(true, |wanted| followup::status_of(record, today) == wanted);

    let doctor_ok = match dimension_set(filter.doctor.as_deref()) {
        None => true,
        Some(doctor) => record.doctor_name == doctor,
    };

    let visit_ok = match dimension_set(filter.visit_type.as_deref()) {
        None => true,
        Some(visit_type) => record.effective_visit_type() == visit_type,
    };

    search_ok && status_ok && doctor_ok && visit_ok
}

/// Apply the filter, preserving the source order.
pub fn filter_records<'a>(
    records: &'a [PatientRecord],
    filter: &RecordFilter,
    today: NaiveDate,
) -> Vec<&'a PatientRecord> {
    records
        .iter()
        .filter(|record| matches(record, filter, today))
        .collect()
}

pub fn total_pages(filtered_count: usize) -> usize {
    filtered_count.div_ceil(PAGE_SIZE)
}

/// Doctor choices for the filter dropdown: trimmed, deduplicated,
/// sorted ascending, empties dropped. Case-sensitive.
pub fn distinct_doctors(records: &[PatientRecord]) -> Vec<String> {
    let mut doctors: Vec<String> = records
        .iter()
        .map(|record| record.doctor_name.trim())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();
    doctors.sort();
    doctors.dedup();
    doctors
}

/// What the dashboard table shows for one filter + page combination.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageView {
    pub records: Vec<RecordView>,
    pub page: usize,
    pub total_pages: usize,
    pub total_records: usize,
}

/// The filter and page the dashboard is currently looking at.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    filter: RecordFilter,
    page: usize,
}

impl ViewState {
    pub fn new() -> Self {
        Self {
            filter: RecordFilter::default(),
            page: 1,
        }
    }

    pub fn filter(&self) -> &RecordFilter {
        &self.filter
    }

    pub fn page(&self) -> usize {
        self.page
    }

    /// Changing any filter dimension jumps back to the first page.
    /// Re-applying an identical filter keeps the current page.
    pub fn set_filter(&mut self, filter: RecordFilter) {
        if self.filter != filter {
            self.page = 1;
        }
        self.filter = filter;
    }

    /// Page requests outside `[1, total_pages]` are rejected as a
    /// no-op, never silently clamped. Returns whether the request
    /// was accepted.
    pub fn set_page(&mut self, page: usize, total_pages: usize) -> bool {
        if page >= 1 && page <= total_pages {
            self.page = page;
            true
        } else {
            false
        }
    }

    /// Jump to the first page (after a bulk import).
    pub fn reset_page(&mut self) {
        self.page = 1;
    }

    /// Assemble the visible slice with derived fields.
    pub fn select(&self, records: &[PatientRecord], today: NaiveDate) -> PageView {
        let filtered = filter_records(records, &self.filter, today);
        let total_records = filtered.len();
        let start = (self.page - 1) * PAGE_SIZE;
        let rows = filtered
            .iter()
            .skip(start)
            .take(PAGE_SIZE)
            .map(|record| RecordView::derive(record, today))
            .collect();
        PageView {
            records: rows,
            page: self.page,
            total_pages: total_pages(total_records),
            total_records,
        }
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(id: &str, name: &str, doctor: &str, visit: NaiveDate) -> PatientRecord {
        PatientRecord {
            id: id.into(),
            row_number: 2,
            patient_id: format!("P-{id}"),
            patient_name: name.into(),
            doctor_name: doctor.into(),
            last_visit_date: visit,
            department: String::new(),
            patient_type: "OPD".into(),
            call_outcome: String::new(),
            agent_name: String::new(),
            call_date: None,
            notes: String::new(),
        }
    }

    fn sample_set() -> Vec<PatientRecord> {
        let visit = date(2024, 1, 1);
        vec![
            record("1", "Asha Verma", "Dr Rao", visit),
            record("2", "Vikram Shah", "Dr Mehta", visit),
            record("3", "Asha Nair", "Dr Rao", visit),
        ]
    }

    #[test]
    fn empty_filter_passes_everything_in_order() {
        let records = sample_set();
        let filtered = filter_records(&records, &RecordFilter::default(), date(2024, 1, 2));
        let ids: Vec<&str> = filtered.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["1", "2", "3"]);
    }

    #[test]
    fn search_matches_name_or_patient_id_case_insensitive() {
        let records = sample_set();
        let today = date(2024, 1, 2);

        let filter = RecordFilter {
            search_term: Some("asha".into()),
            ..Default::default()
        };
        assert_eq!(filter_records(&records, &filter, today).len(), 2);

        let filter = RecordFilter {
            search_term: Some("p-2".into()),
            ..Default::default()
        };
        let found = filter_records(&records, &filter, today);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "2");
    }

    #[test]
    fn doctor_filter_is_exact_and_case_sensitive() {
        let records = sample_set();
        let today = date(2024, 1, 2);

        let filter = RecordFilter {
            doctor: Some("Dr Rao".into()),
            ..Default::default()
        };
        assert_eq!(filter_records(&records, &filter, today).len(), 2);

        let filter = RecordFilter {
            doctor: Some("dr rao".into()),
            ..Default::default()
        };
        assert!(filter_records(&records, &filter, today).is_empty());
    }

    #[test]
    fn status_filter_uses_computed_status() {
        let mut records = sample_set();
        records[0].call_outcome = "Feedback Positive".into();
        let today = date(2024, 1, 2); // OPD due date → others NeedActionToday

        let filter = RecordFilter {
            status: Some(CallStatus::Completed),
            ..Default::default()
        };
        let found = filter_records(&records, &filter, today);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "1");

        let filter = RecordFilter {
            status: Some(CallStatus::NeedActionToday),
            ..Default::default()
        };
        assert_eq!(filter_records(&records, &filter, today).len(), 2);
    }

    #[test]
    fn visit_type_filter_uses_effective_type() {
        let mut records = sample_set();
        records[1].patient_type = String::new();
        records[1].department = "IPD".into();
        let today = date(2024, 1, 2);

        let filter = RecordFilter {
            visit_type: Some("IPD".into()),
            ..Default::default()
        };
        let found = filter_records(&records, &filter, today);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "2");
    }

    #[test]
    fn filtering_is_idempotent() {
        let records = sample_set();
        let today = date(2024, 1, 2);
        let filter = RecordFilter {
            search_term: Some("asha".into()),
            doctor: Some("Dr Rao".into()),
            ..Default::default()
        };

        let once: Vec<PatientRecord> = filter_records(&records, &filter, today)
            .into_iter()
            .cloned()
            .collect();
        let twice: Vec<&PatientRecord> = filter_records(&once, &filter, today);
        assert_eq!(once.len(), twice.len());
        for (a, b) in once.iter().zip(twice) {
            assert_eq!(a, b);
        }
    }

    #[test]
    fn distinct_doctors_trims_dedups_and_sorts() {
        let visit = date(2024, 1, 1);
        let records = vec![
            record("1", "A", "Dr B", visit),
            record("2", "B", " Dr A", visit),
            record("3", "C", "Dr B", visit),
            record("4", "D", "", visit),
        ];
        assert_eq!(distinct_doctors(&records), ["Dr A", "Dr B"]);
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0), 0);
        assert_eq!(total_pages(1), 1);
        assert_eq!(total_pages(50), 1);
        assert_eq!(total_pages(51), 2);
        assert_eq!(total_pages(150), 3);
    }

    #[test]
    fn set_page_rejects_out_of_range() {
        let mut view = ViewState::new();
        assert!(!view.set_page(0, 3));
        assert!(!view.set_page(4, 3));
        assert_eq!(view.page(), 1);
        assert!(view.set_page(3, 3));
        assert_eq!(view.page(), 3);
        // No pages at all → every request is rejected
        assert!(!view.set_page(1, 0));
    }

    #[test]
    fn changing_filter_resets_page() {
        let mut view = ViewState::new();
        assert!(view.set_page(3, 5));

        view.set_filter(RecordFilter {
            status: Some(CallStatus::Overdue),
            ..Default::default()
        });
        assert_eq!(view.page(), 1);
    }

    #[test]
    fn reapplying_same_filter_keeps_page() {
        let mut view = ViewState::new();
        let filter = RecordFilter {
            doctor: Some("Dr Rao".into()),
            ..Default::default()
        };
        view.set_filter(filter.clone());
        assert!(view.set_page(2, 4));
        view.set_filter(filter);
        assert_eq!(view.page(), 2);
    }

    #[test]
    fn select_slices_the_requested_page() {
        let visit = date(2024, 1, 1);
        let records: Vec<PatientRecord> = (0..120)
            .map(|i| record(&i.to_string(), &format!("Patient {i}"), "Dr Rao", visit))
            .collect();

        let mut view = ViewState::new();
        let page = view.select(&records, date(2024, 1, 2));
        assert_eq!(page.records.len(), PAGE_SIZE);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total_records, 120);
        assert_eq!(page.records[0].record.id, "0");

        assert!(view.set_page(3, page.total_pages));
        let page = view.select(&records, date(2024, 1, 2));
        assert_eq!(page.records.len(), 20);
        assert_eq!(page.records[0].record.id, "100");
    }

    #[test]
    fn select_derives_fields_per_row() {
        let records = sample_set();
        let view = ViewState::new();
        let page = view.select(&records, date(2024, 1, 2));
        let row = &page.records[0];
        assert_eq!(row.call_status, CallStatus::NeedActionToday);
        assert_eq!(row.days_since_visit, 1);
        assert_eq!(row.visit_type, "OPD");
    }

    #[test]
    fn record_view_serializes_flat() {
        let records = sample_set();
        let row = RecordView::derive(&records[0], date(2024, 1, 2));
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["patientName"], "Asha Verma");
        assert_eq!(json["callStatus"], "Need Action Today");
        assert_eq!(json["daysSinceVisit"], 1);
        assert_eq!(json["visitType"], "OPD");
    }
}
