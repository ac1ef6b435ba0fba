//! Record Store boundary.
//!
//! Three collections (employees, departments, leave_requests) behind one
//! async trait. Backends report failures as [`StoreError`] with a structured
//! [`StoreErrorKind`] so callers never inspect message text themselves.

pub mod memory;
pub mod mysql;

use async_trait::async_trait;
use serde::Serialize;
use strum_macros::Display;
use thiserror::Error;

use crate::model::{
    department::{Department, DepartmentPatch, NewDepartment},
    employee::{Employee, EmployeeFilter, EmployeePatch, NewEmployee},
    leave_request::{LeaveFilter, LeaveRequest, LeaveReview, NewLeaveRequest},
};

pub use memory::MemoryStore;
pub use mysql::MySqlStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StoreErrorKind {
    Permission,
    Network,
    Duplicate,
    NotFound,
    Other,
}

impl StoreErrorKind {
    /// Best-effort classification of a backend message, for failures the
    /// backend could not map structurally. Replaceable; never authoritative.
    pub fn classify(message: &str) -> Self {
        let message = message.to_lowercase();
        let any = |needles: &[&str]| needles.iter().any(|n| message.contains(n));

        if any(&["permission", "policy", "access denied", "command denied"]) {
            StoreErrorKind::Permission
        } else if any(&["network", "fetch", "connection", "timed out", "broken pipe"]) {
            StoreErrorKind::Network
        } else if any(&["duplicate", "unique"]) {
            StoreErrorKind::Duplicate
        } else if any(&["not found", "no rows"]) {
            StoreErrorKind::NotFound
        } else {
            StoreErrorKind::Other
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct StoreError {
    pub kind: StoreErrorKind,
    pub message: String,
}

impl StoreError {
    pub fn new(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(what: &str, id: u64) -> Self {
        Self::new(StoreErrorKind::NotFound, format!("{what} {id} not found"))
    }

    /// Kind taken from the message heuristic.
    pub fn classified(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            kind: StoreErrorKind::classify(&message),
            message,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait RecordStore: Send + Sync {
    // employees: listed newest first
    async fn insert_employee(&self, new: NewEmployee) -> StoreResult<Employee>;
    async fn update_employee(&self, id: u64, patch: EmployeePatch) -> StoreResult<Employee>;
    async fn delete_employee(&self, id: u64) -> StoreResult<()>;
    async fn get_employee(&self, id: u64) -> StoreResult<Employee>;
    async fn list_employees(&self, filter: &EmployeeFilter) -> StoreResult<Vec<Employee>>;
    async fn count_employees(&self, filter: &EmployeeFilter) -> StoreResult<i64>;

    // departments: listed by name
    async fn insert_department(&self, new: NewDepartment) -> StoreResult<Department>;
    async fn update_department(&self, id: u64, patch: DepartmentPatch)
    -> StoreResult<Department>;
    async fn delete_department(&self, id: u64) -> StoreResult<()>;
    async fn get_department(&self, id: u64) -> StoreResult<Department>;
    async fn list_departments(&self) -> StoreResult<Vec<Department>>;
    async fn count_departments(&self) -> StoreResult<i64>;

    // leave requests: listed by applied_on, newest first
    async fn insert_leave(&self, new: NewLeaveRequest) -> StoreResult<LeaveRequest>;
    async fn review_leave(&self, id: u64, review: LeaveReview) -> StoreResult<LeaveRequest>;
    async fn delete_leave(&self, id: u64) -> StoreResult<()>;
    async fn get_leave(&self, id: u64) -> StoreResult<LeaveRequest>;
    async fn list_leaves(&self, filter: &LeaveFilter) -> StoreResult<Vec<LeaveRequest>>;
    async fn count_leaves(&self, filter: &LeaveFilter) -> StoreResult<i64>;

    /// Exact-email lookup; `None` when no employee carries the address.
    async fn find_employee_by_email(&self, email: &str) -> StoreResult<Option<Employee>> {
        let filter = EmployeeFilter {
            email: Some(email.to_string()),
            limit: Some(1),
            ..EmployeeFilter::default()
        };
        Ok(self.list_employees(&filter).await?.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_recognises_known_phrases() {
        assert_eq!(
            StoreErrorKind::classify("new row violates row-level security policy"),
            StoreErrorKind::Permission
        );
        assert_eq!(
            StoreErrorKind::classify("TypeError: Failed to fetch"),
            StoreErrorKind::Network
        );
        assert_eq!(
            StoreErrorKind::classify("Duplicate entry 'a@b.c' for key 'email'"),
            StoreErrorKind::Duplicate
        );
        assert_eq!(
            StoreErrorKind::classify("something odd happened"),
            StoreErrorKind::Other
        );
    }

    #[test]
    fn permission_wins_over_later_matches() {
        // both phrases present: the first rule in order decides
        assert_eq!(
            StoreErrorKind::classify("permission denied on unique index"),
            StoreErrorKind::Permission
        );
    }
}
