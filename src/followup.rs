//! Follow-up call policy: when a patient is due for a call and what
//! state the call task is in.
//!
//! Every function here is a pure function of its arguments: `today`
//! is always an explicit parameter, never read from the clock, so the
//! policy is testable at any fixed date. Production callers pass
//! [`today_local`].

use chrono::{Duration, Local, NaiveDate};

use crate::models::enums::{CallStatus, PatientType};
use crate::models::patient::PatientRecord;

/// Outcomes that close a call task. "No Answer" and "Call Later"
/// still require follow-up and are deliberately not in this set.
pub const TERMINAL_OUTCOMES: &[&str] =
    &["Feedback Positive", "Feedback Negative", "Wrong Number"];

/// The fixed outcome choices offered by the dashboard.
pub const CALL_OUTCOMES: &[&str] = &[
    "Feedback Positive",
    "Feedback Negative",
    "No Answer",
    "Call Later",
    "Wrong Number",
];

/// Today as a calendar date in the machine's local timezone.
///
/// Status math is local-date-only: using UTC here shifts every
/// comparison by a day around midnight for staff west of Greenwich.
pub fn today_local() -> NaiveDate {
    Local::now().date_naive()
}

/// Whole days elapsed since the visit: 0 for a visit today, positive
/// for past visits, negative for future-dated ones.
pub fn days_since(visit: NaiveDate, today: NaiveDate) -> i64 {
    (today - visit).num_days()
}

/// How many days after the visit the follow-up call is due.
/// Outpatients get called the next day; inpatients (and anything
/// unrecognized) get the three-day window.
pub fn follow_up_window(visit_type: &str) -> i64 {
    match visit_type.parse::<PatientType>() {
        Ok(PatientType::Opd) => 1,
        _ => 3,
    }
}

/// The date the follow-up call is due.
pub fn due_date(visit: NaiveDate, visit_type: &str) -> NaiveDate {
    visit + Duration::days(follow_up_window(visit_type))
}

/// Classify a call task.
///
/// A terminal outcome completes the task regardless of dates, even
/// for a visit dated in the future. Otherwise the task is positioned
/// against the due date: past it is overdue, on it needs action
/// today, before it is upcoming.
pub fn classify(
    visit: NaiveDate,
    visit_type: &str,
    call_outcome: &str,
    today: NaiveDate,
) -> CallStatus {
    if TERMINAL_OUTCOMES.contains(&call_outcome) {
        return CallStatus::Completed;
    }

    let due = due_date(visit, visit_type);
    match today.cmp(&due) {
        std::cmp::Ordering::Greater => CallStatus::Overdue,
        std::cmp::Ordering::Equal => CallStatus::NeedActionToday,
        std::cmp::Ordering::Less => CallStatus::Upcoming,
    }
}

/// Classify a record via its effective visit type.
pub fn status_of(record: &PatientRecord, today: NaiveDate) -> CallStatus {
    classify(
        record.last_visit_date,
        record.effective_visit_type(),
        &record.call_outcome,
        today,
    )
}
