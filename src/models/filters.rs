use serde::{Deserialize, Serialize};

use super::enums::CallStatus;

/// Dashboard filter dimensions. An unset (or empty) dimension always
/// passes; all set dimensions must match for a record to show.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordFilter {
    /// Case-insensitive substring of patient name or patient id.
    pub search_term: Option<String>,
    /// Computed call status must equal this exactly.
    pub status: Option<CallStatus>,
    /// Exact, case-sensitive doctor name.
    pub doctor: Option<String>,
    /// Exact effective visit type ("OPD"/"IPD", or a raw department value).
    pub visit_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_no_dimensions() {
        let filter = RecordFilter::default();
        assert!(filter.search_term.is_none());
        assert!(filter.status.is_none());
        assert!(filter.doctor.is_none());
        assert!(filter.visit_type.is_none());
    }

    #[test]
    fn deserializes_partial_bodies() {
        let filter: RecordFilter =
            serde_json::from_str(r#"{"status":"Need Action Today"}"#).unwrap();
        assert_eq!(filter.status, Some(CallStatus::NeedActionToday));
        assert!(filter.doctor.is_none());
    }

    #[test]
    fn serializes_camel_case() {
        let filter = RecordFilter {
            search_term: Some("asha".into()),
            visit_type: Some("OPD".into()),
            ..Default::default()
        };
        let json = serde_json::to_string(&filter).unwrap();
        assert!(json.contains("\"searchTerm\":\"asha\""));
        assert!(json.contains("\"visitType\":\"OPD\""));
    }
}
