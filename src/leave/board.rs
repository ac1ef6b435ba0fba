use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

use super::transition::transition_status;
use crate::error::AppError;
use crate::model::{
    employee::{EmployeeFilter, initials},
    leave_request::{LeaveFilter, LeaveRequest, LeaveStatus, LeaveType},
};
use crate::store::RecordStore;

/// One reviewer-list row: the request joined with its employee.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LeaveRow {
    pub id: u64,
    pub employee_id: u64,
    #[schema(example = "Jane Doe")]
    pub employee_name: String,
    #[schema(example = "JD")]
    pub employee_initials: String,
    #[schema(example = "Engineering")]
    pub department: String,
    pub email: String,
    pub leave_type: LeaveType,
    #[schema(format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(format = "date", value_type = String)]
    pub end_date: NaiveDate,
    pub duration: i64,
    pub reason: String,
    pub status: LeaveStatus,
    #[schema(value_type = String, format = "date-time")]
    pub applied_on: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct StatusCounts {
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
}

/// Reviewer-side view of all leave requests.
///
/// Status changes are two-phase: the local rows change first, then the store
/// is asked to persist. When the store refuses, the rows are replaced
/// wholesale from a fresh fetch; individual fields are never patched back.
#[derive(Debug, Clone, Default)]
pub struct LeaveBoard {
    rows: Vec<LeaveRow>,
}

impl LeaveBoard {
    pub async fn load(store: &dyn RecordStore) -> Result<Self, AppError> {
        let mut board = Self::default();
        board.refresh(store).await?;
        Ok(board)
    }

    /// Replace every row with the store's current view.
    pub async fn refresh(&mut self, store: &dyn RecordStore) -> Result<(), AppError> {
        let leaves = store.list_leaves(&LeaveFilter::default()).await?;
        let employees = store.list_employees(&EmployeeFilter::default()).await?;
        let by_id: HashMap<u64, _> = employees.iter().map(|e| (e.id, e)).collect();

        self.rows = leaves
            .into_iter()
            .map(|leave| {
                let employee = by_id.get(&leave.employee_id);
                let name = employee.map_or("Unknown", |e| e.name.as_str());
                LeaveRow {
                    employee_name: name.to_string(),
                    employee_initials: initials(name),
                    department: employee
                        .and_then(|e| e.department.clone())
                        .unwrap_or_else(|| "N/A".to_string()),
                    email: employee.map(|e| e.email.clone()).unwrap_or_default(),
                    ..row_from(leave)
                }
            })
            .collect();
        Ok(())
    }

    pub fn rows(&self) -> &[LeaveRow] {
        &self.rows
    }

    /// Phase one: local rows only.
    pub fn apply_optimistic(&mut self, leave_id: u64, status: LeaveStatus) {
        for row in self.rows.iter_mut().filter(|r| r.id == leave_id) {
            row.status = status;
        }
    }

    pub async fn change_status(
        &mut self,
        store: &dyn RecordStore,
        leave_id: u64,
        status: LeaveStatus,
        reviewer: Option<&str>,
    ) -> Result<LeaveRequest, AppError> {
        self.apply_optimistic(leave_id, status);

        match transition_status(store, leave_id, status, reviewer).await {
            Ok(updated) => Ok(updated),
            Err(err) => {
                warn!(leave_id, error = %err, "Status change failed, reloading leave list");
                if let Err(reload) = self.refresh(store).await {
                    warn!(error = %reload, "Reload after failed status change also failed");
                }
                Err(err)
            }
        }
    }

    /// Rows matching `status` (all when `None`) whose employee name,
    /// department or leave type contains `search`, case-insensitively.
    pub fn filtered(&self, status: Option<LeaveStatus>, search: &str) -> Vec<LeaveRow> {
        let term = search.trim().to_lowercase();
        self.rows
            .iter()
            .filter(|r| status.is_none_or(|s| r.status == s))
            .filter(|r| {
                term.is_empty()
                    || r.employee_name.to_lowercase().contains(&term)
                    || r.department.to_lowercase().contains(&term)
                    || r.leave_type.to_string().to_lowercase().contains(&term)
            })
            .cloned()
            .collect()
    }

    pub fn counts(&self) -> StatusCounts {
        self.rows
            .iter()
            .fold(StatusCounts::default(), |mut c, r| {
                match r.status {
                    LeaveStatus::Pending => c.pending += 1,
                    LeaveStatus::Approved => c.approved += 1,
                    LeaveStatus::Rejected => c.rejected += 1,
                }
                c
            })
    }
}

fn row_from(leave: LeaveRequest) -> LeaveRow {
    LeaveRow {
        id: leave.id,
        employee_id: leave.employee_id,
        employee_name: String::new(),
        employee_initials: String::new(),
        department: String::new(),
        email: String::new(),
        leave_type: leave.leave_type,
        start_date: leave.start_date,
        end_date: leave.end_date,
        duration: leave.duration,
        reason: leave.reason,
        status: leave.status,
        applied_on: leave.applied_on,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::employee::{EmployeeStatus, NewEmployee};
    use crate::model::leave_request::NewLeaveRequest;
    use crate::store::{MemoryStore, StoreError, StoreErrorKind};

    async fn seeded() -> (MemoryStore, u64) {
        let store = MemoryStore::new();
        let employee = store
            .insert_employee(NewEmployee {
                employee_code: "EMP001".to_string(),
                name: "Jane Doe".to_string(),
                email: "jane@corp.io".to_string(),
                phone: None,
                department: Some("Engineering".to_string()),
                designation: None,
                date_of_joining: None,
                status: EmployeeStatus::Active,
                profile_id: None,
            })
            .await
            .unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        let leave = store
            .insert_leave(NewLeaveRequest {
                employee_id: employee.id,
                leave_type: LeaveType::Sick,
                start_date: day,
                end_date: day,
                duration: 1,
                reason: "flu".to_string(),
                status: LeaveStatus::Pending,
            })
            .await
            .unwrap();
        (store, leave.id)
    }

    #[actix_web::test]
    async fn rows_join_employee_details() {
        let (store, leave_id) = seeded().await;
        let board = LeaveBoard::load(&store).await.unwrap();

        let row = &board.rows()[0];
        assert_eq!(row.id, leave_id);
        assert_eq!(row.employee_name, "Jane Doe");
        assert_eq!(row.employee_initials, "JD");
        assert_eq!(row.department, "Engineering");
    }

    #[actix_web::test]
    async fn optimistic_change_sticks_until_refresh_after_failure() {
        let (store, leave_id) = seeded().await;
        let mut board = LeaveBoard::load(&store).await.unwrap();

        board.apply_optimistic(leave_id, LeaveStatus::Approved);
        store.fail_next_write(StoreError::new(StoreErrorKind::Network, "connection reset"));
        let err = transition_status(&store, leave_id, LeaveStatus::Approved, Some("hr-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Persist(_)));

        // local view still shows the optimistic value
        assert_eq!(board.rows()[0].status, LeaveStatus::Approved);

        board.refresh(&store).await.unwrap();
        assert_eq!(board.rows()[0].status, LeaveStatus::Pending);
    }

    #[actix_web::test]
    async fn change_status_reloads_on_failure() {
        let (store, leave_id) = seeded().await;
        let mut board = LeaveBoard::load(&store).await.unwrap();

        store.fail_next_write(StoreError::new(StoreErrorKind::Network, "connection reset"));
        let err = board
            .change_status(&store, leave_id, LeaveStatus::Rejected, Some("hr-1"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Persist(_)));
        assert_eq!(board.rows()[0].status, LeaveStatus::Pending);
        assert_eq!(board.counts().pending, 1);
    }

    #[actix_web::test]
    async fn change_status_keeps_optimistic_row_on_success() {
        let (store, leave_id) = seeded().await;
        let mut board = LeaveBoard::load(&store).await.unwrap();

        let updated = board
            .change_status(&store, leave_id, LeaveStatus::Approved, Some("hr-1"))
            .await
            .unwrap();

        assert_eq!(updated.status, LeaveStatus::Approved);
        assert_eq!(
            board.counts(),
            StatusCounts {
                pending: 0,
                approved: 1,
                rejected: 0
            }
        );
    }

    #[actix_web::test]
    async fn filter_by_status_and_search() {
        let (store, _) = seeded().await;
        let board = LeaveBoard::load(&store).await.unwrap();

        assert_eq!(board.filtered(Some(LeaveStatus::Pending), "").len(), 1);
        assert_eq!(board.filtered(Some(LeaveStatus::Approved), "").len(), 0);
        assert_eq!(board.filtered(None, "engin").len(), 1);
        assert_eq!(board.filtered(None, "sick").len(), 1);
        assert_eq!(board.filtered(None, "payroll").len(), 0);
    }
}
