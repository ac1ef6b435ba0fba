use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum LeaveType {
    #[serde(rename = "Casual Leave")]
    #[strum(serialize = "Casual Leave")]
    Casual,
    #[serde(rename = "Sick Leave")]
    #[strum(serialize = "Sick Leave")]
    Sick,
    #[serde(rename = "Privilege Leave")]
    #[strum(serialize = "Privilege Leave")]
    Privilege,
    #[serde(rename = "Vacation")]
    #[strum(serialize = "Vacation")]
    Vacation,
    #[serde(rename = "Personal Leave")]
    #[strum(serialize = "Personal Leave")]
    Personal,
    #[serde(rename = "Emergency Leave")]
    #[strum(serialize = "Emergency Leave")]
    Emergency,
}

/// Review state. Transitions between any two states are allowed.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    Display,
    EnumString,
    EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "employee_id": 1000,
    "leave_type": "Sick Leave",
    "start_date": "2026-01-01",
    "end_date": "2026-01-03",
    "duration": 3,
    "reason": "Flu",
    "status": "Pending",
    "applied_on": "2026-01-01T00:00:00Z",
    "reviewed_by": null,
    "reviewed_at": null
}))]
pub struct LeaveRequest {
    #[schema(example = 1)]
    pub id: u64,
    /// employee the leave is filed against
    #[schema(example = 1000)]
    pub employee_id: u64,
    pub leave_type: LeaveType,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-03", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    /// inclusive day count
    #[schema(example = 3)]
    pub duration: i64,
    pub reason: String,
    pub status: LeaveStatus,
    #[schema(value_type = String, format = "date-time")]
    pub applied_on: DateTime<Utc>,
    /// identity of the last reviewer
    #[schema(nullable = true)]
    pub reviewed_by: Option<String>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub reviewed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewLeaveRequest {
    pub employee_id: u64,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration: i64,
    pub reason: String,
    pub status: LeaveStatus,
}

/// Review fields written by a status transition.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaveReview {
    pub status: LeaveStatus,
    pub reviewed_by: Option<String>,
    pub reviewed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct LeaveFilter {
    pub employee_id: Option<u64>,
    pub status: Option<LeaveStatus>,
}

impl LeaveFilter {
    pub fn pending() -> Self {
        Self {
            status: Some(LeaveStatus::Pending),
            ..Self::default()
        }
    }

    pub fn for_employee(employee_id: u64) -> Self {
        Self {
            employee_id: Some(employee_id),
            ..Self::default()
        }
    }

    pub fn matches(&self, leave: &LeaveRequest) -> bool {
        self.employee_id.is_none_or(|id| leave.employee_id == id)
            && self.status.is_none_or(|s| leave.status == s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn leave_type_round_trips_display_labels() {
        for t in LeaveType::iter() {
            assert_eq!(t.to_string().parse::<LeaveType>().ok(), Some(t));
        }
        assert_eq!("sick leave".parse::<LeaveType>().ok(), Some(LeaveType::Sick));
        assert!("Sabbatical".parse::<LeaveType>().is_err());
    }

    #[test]
    fn status_accepts_lowercase_input() {
        assert_eq!("approved".parse::<LeaveStatus>().ok(), Some(LeaveStatus::Approved));
        assert_eq!("REJECTED".parse::<LeaveStatus>().ok(), Some(LeaveStatus::Rejected));
        assert_eq!(serde_json::to_string(&LeaveStatus::Pending).unwrap(), "\"Pending\"");
    }
}
