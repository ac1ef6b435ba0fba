use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::model::leave_request::LeaveType;
use crate::utils::serde_helpers::empty_string_as_none;

/// Raw form input. Every field may be missing, `null` or `""`; validation
/// decides which one is reported.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct LeaveForm {
    #[serde(default)]
    #[schema(example = "Sick Leave")]
    pub leave_type: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[schema(example = "2026-01-01", format = "date", value_type = Option<String>)]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[schema(example = "2026-01-03", format = "date", value_type = Option<String>)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    #[schema(example = "Flu")]
    pub reason: Option<String>,
}

/// The first rule a form breaks, in checking order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FieldError {
    #[error("Please select a leave type")]
    MissingLeaveType,
    #[error("Please select a start date for your leave")]
    MissingStartDate,
    #[error("Please select an end date for your leave")]
    MissingEndDate,
    #[error("End date cannot be before start date. Please select a valid date range")]
    InvalidDateRange,
    #[error("Please provide a reason for your leave request")]
    MissingReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedLeave {
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration: i64,
    /// trimmed
    pub reason: String,
}

/// Inclusive day count, or 0 while the range is incomplete or reversed.
pub fn compute_duration(start: Option<NaiveDate>, end: Option<NaiveDate>) -> i64 {
    match (start, end) {
        (Some(start), Some(end)) if end >= start => (end - start).num_days() + 1,
        _ => 0,
    }
}

pub fn validate_and_compute_duration(form: &LeaveForm) -> Result<ValidatedLeave, FieldError> {
    let leave_type = form
        .leave_type
        .as_deref()
        .map(str::trim)
        .and_then(|t| t.parse::<LeaveType>().ok())
        .ok_or(FieldError::MissingLeaveType)?;
    let start_date = form.start_date.ok_or(FieldError::MissingStartDate)?;
    let end_date = form.end_date.ok_or(FieldError::MissingEndDate)?;
    if end_date < start_date {
        return Err(FieldError::InvalidDateRange);
    }
    let reason = form
        .reason
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .ok_or(FieldError::MissingReason)?;

    Ok(ValidatedLeave {
        leave_type,
        start_date,
        end_date,
        duration: compute_duration(Some(start_date), Some(end_date)),
        reason: reason.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    fn form() -> LeaveForm {
        LeaveForm {
            leave_type: Some("Casual Leave".to_string()),
            start_date: date(2024, 1, 1),
            end_date: date(2024, 1, 3),
            reason: Some("  family trip ".to_string()),
        }
    }

    #[test]
    fn duration_counts_both_endpoints() {
        assert_eq!(compute_duration(date(2024, 1, 1), date(2024, 1, 1)), 1);
        assert_eq!(compute_duration(date(2024, 1, 1), date(2024, 1, 3)), 3);
        // leap day included
        assert_eq!(compute_duration(date(2024, 2, 28), date(2024, 3, 1)), 3);
    }

    #[test]
    fn duration_is_zero_for_reversed_or_partial_ranges() {
        assert_eq!(compute_duration(date(2024, 1, 3), date(2024, 1, 1)), 0);
        assert_eq!(compute_duration(date(2024, 1, 3), None), 0);
        assert_eq!(compute_duration(None, None), 0);
    }

    #[test]
    fn valid_form_is_shaped_and_trimmed() {
        let v = validate_and_compute_duration(&form()).unwrap();
        assert_eq!(v.leave_type, LeaveType::Casual);
        assert_eq!(v.duration, 3);
        assert_eq!(v.reason, "family trip");
    }

    #[test]
    fn rules_apply_in_order() {
        let empty = LeaveForm::default();
        assert_eq!(validate_and_compute_duration(&empty), Err(FieldError::MissingLeaveType));

        let f = LeaveForm {
            leave_type: Some("Sabbatical".to_string()),
            ..form()
        };
        assert_eq!(validate_and_compute_duration(&f), Err(FieldError::MissingLeaveType));

        let f = LeaveForm {
            start_date: None,
            end_date: None,
            ..form()
        };
        assert_eq!(validate_and_compute_duration(&f), Err(FieldError::MissingStartDate));

        let f = LeaveForm {
            end_date: None,
            ..form()
        };
        assert_eq!(validate_and_compute_duration(&f), Err(FieldError::MissingEndDate));

        // reversed range reported before the blank reason
        let f = LeaveForm {
            start_date: date(2024, 1, 5),
            reason: Some(String::new()),
            ..form()
        };
        assert_eq!(validate_and_compute_duration(&f), Err(FieldError::InvalidDateRange));
    }

    #[test]
    fn whitespace_reason_is_rejected() {
        let f = LeaveForm {
            reason: Some(" \t\n".to_string()),
            ..form()
        };
        assert_eq!(validate_and_compute_duration(&f), Err(FieldError::MissingReason));
    }

    #[test]
    fn blank_form_body_reports_the_first_rule() {
        let blank: LeaveForm = serde_json::from_str(
            r#"{"leave_type": "", "start_date": "", "end_date": "", "reason": ""}"#,
        )
        .unwrap();
        assert_eq!(blank.start_date, None);
        assert_eq!(validate_and_compute_duration(&blank), Err(FieldError::MissingLeaveType));
    }

    #[test]
    fn null_reason_is_missing_reason() {
        let f: LeaveForm = serde_json::from_str(
            r#"{"leave_type": "Vacation", "start_date": "2024-01-01",
                "end_date": "2024-01-02", "reason": null}"#,
        )
        .unwrap();
        assert_eq!(validate_and_compute_duration(&f), Err(FieldError::MissingReason));
    }
}
