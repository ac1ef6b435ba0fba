use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use super::{RecordStore, StoreError, StoreErrorKind, StoreResult};
use crate::model::{
    department::{Department, DepartmentPatch, NewDepartment},
    employee::{Employee, EmployeeFilter, EmployeePatch, NewEmployee},
    leave_request::{LeaveFilter, LeaveRequest, LeaveReview, NewLeaveRequest},
};

#[derive(Default)]
struct Tables {
    employees: Vec<Employee>,
    departments: Vec<Department>,
    leaves: Vec<LeaveRequest>,
    next_id: u64,
}

impl Tables {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Process-local store. Emulates the unique keys of the MySQL schema
/// (employee email, department name) and their case-insensitive collation,
/// so both backends fail the same way.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    injected: Mutex<Option<StoreError>>,
    injected_read: Mutex<Option<StoreError>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next write (insert, update, review or delete) fails with `err`
    /// instead of touching the tables. Reads are unaffected.
    pub fn fail_next_write(&self, err: StoreError) {
        if let Ok(mut slot) = self.injected.lock() {
            *slot = Some(err);
        }
    }

    /// The next read (get, list or count) fails with `err`.
    pub fn fail_next_read(&self, err: StoreError) {
        if let Ok(mut slot) = self.injected_read.lock() {
            *slot = Some(err);
        }
    }

    fn tables(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| StoreError::new(StoreErrorKind::Other, "memory store lock poisoned"))
    }

    fn take_injected(&self) -> StoreResult<()> {
        Self::take(&self.injected)
    }

    /// Table guard for read paths, honouring an injected read failure.
    fn read_tables(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        Self::take(&self.injected_read)?;
        self.tables()
    }

    fn take(slot: &Mutex<Option<StoreError>>) -> StoreResult<()> {
        let injected = slot
            .lock()
            .map_err(|_| StoreError::new(StoreErrorKind::Other, "memory store lock poisoned"))?
            .take();
        match injected {
            Some(err) => {
                debug!(error = %err, "Injected failure");
                Err(err)
            }
            None => Ok(()),
        }
    }
}

fn duplicate(what: &str, value: &str) -> StoreError {
    StoreError::new(
        StoreErrorKind::Duplicate,
        format!("Duplicate entry '{value}' for key '{what}'"),
    )
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert_employee(&self, new: NewEmployee) -> StoreResult<Employee> {
        self.take_injected()?;
        let mut t = self.tables()?;
        if t.employees.iter().any(|e| e.email.eq_ignore_ascii_case(&new.email)) {
            return Err(duplicate("email", &new.email));
        }

        let employee = Employee {
            id: t.next_id(),
            employee_code: new.employee_code,
            name: new.name,
            email: new.email,
            phone: new.phone,
            department: new.department,
            designation: new.designation,
            date_of_joining: new.date_of_joining,
            status: new.status,
            profile_id: new.profile_id,
            created_at: Utc::now(),
            updated_at: None,
        };
        t.employees.push(employee.clone());
        Ok(employee)
    }

    async fn update_employee(&self, id: u64, patch: EmployeePatch) -> StoreResult<Employee> {
        self.take_injected()?;
        let mut t = self.tables()?;
        if let Some(email) = patch.email.as_deref() {
            if t.employees
                .iter()
                .any(|e| e.id != id && e.email.eq_ignore_ascii_case(email))
            {
                return Err(duplicate("email", email));
            }
        }

        let employee = t
            .employees
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| StoreError::not_found("employee", id))?;
        patch.apply(employee);
        employee.updated_at = Some(Utc::now());
        Ok(employee.clone())
    }

    async fn delete_employee(&self, id: u64) -> StoreResult<()> {
        self.take_injected()?;
        let mut t = self.tables()?;
        let before = t.employees.len();
        t.employees.retain(|e| e.id != id);
        if t.employees.len() == before {
            return Err(StoreError::not_found("employee", id));
        }
        // same effect as the schema's ON DELETE rules
        t.leaves.retain(|l| l.employee_id != id);
        for d in t.departments.iter_mut().filter(|d| d.head_id == Some(id)) {
            d.head_id = None;
        }
        Ok(())
    }

    async fn get_employee(&self, id: u64) -> StoreResult<Employee> {
        self.read_tables()?
            .employees
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("employee", id))
    }

    async fn list_employees(&self, filter: &EmployeeFilter) -> StoreResult<Vec<Employee>> {
        let t = self.read_tables()?;
        let mut rows: Vec<Employee> = t
            .employees
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        if let Some(limit) = filter.limit {
            rows.truncate(limit as usize);
        }
        Ok(rows)
    }

    async fn count_employees(&self, filter: &EmployeeFilter) -> StoreResult<i64> {
        let t = self.read_tables()?;
        Ok(t.employees.iter().filter(|e| filter.matches(e)).count() as i64)
    }

    async fn insert_department(&self, new: NewDepartment) -> StoreResult<Department> {
        self.take_injected()?;
        let mut t = self.tables()?;
        if t.departments.iter().any(|d| d.name.eq_ignore_ascii_case(&new.name)) {
            return Err(duplicate("name", &new.name));
        }

        let department = Department {
            id: t.next_id(),
            name: new.name,
            location: new.location,
            head_id: new.head_id,
            created_at: Utc::now(),
        };
        t.departments.push(department.clone());
        Ok(department)
    }

    async fn update_department(
        &self,
        id: u64,
        patch: DepartmentPatch,
    ) -> StoreResult<Department> {
        self.take_injected()?;
        let mut t = self.tables()?;
        if let Some(name) = patch.name.as_deref() {
            if t.departments
                .iter()
                .any(|d| d.id != id && d.name.eq_ignore_ascii_case(name))
            {
                return Err(duplicate("name", name));
            }
        }

        let department = t
            .departments
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| StoreError::not_found("department", id))?;
        patch.apply(department);
        Ok(department.clone())
    }

    async fn delete_department(&self, id: u64) -> StoreResult<()> {
        self.take_injected()?;
        let mut t = self.tables()?;
        let before = t.departments.len();
        t.departments.retain(|d| d.id != id);
        if t.departments.len() == before {
            return Err(StoreError::not_found("department", id));
        }
        Ok(())
    }

    async fn get_department(&self, id: u64) -> StoreResult<Department> {
        self.read_tables()?
            .departments
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("department", id))
    }

    async fn list_departments(&self) -> StoreResult<Vec<Department>> {
        let mut rows = self.read_tables()?.departments.clone();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn count_departments(&self) -> StoreResult<i64> {
        Ok(self.read_tables()?.departments.len() as i64)
    }

    async fn insert_leave(&self, new: NewLeaveRequest) -> StoreResult<LeaveRequest> {
        self.take_injected()?;
        let mut t = self.tables()?;
        if !t.employees.iter().any(|e| e.id == new.employee_id) {
            return Err(StoreError::new(
                StoreErrorKind::Other,
                format!(
                    "foreign key constraint fails: employee {} does not exist",
                    new.employee_id
                ),
            ));
        }

        let leave = LeaveRequest {
            id: t.next_id(),
            employee_id: new.employee_id,
            leave_type: new.leave_type,
            start_date: new.start_date,
            end_date: new.end_date,
            duration: new.duration,
            reason: new.reason,
            status: new.status,
            applied_on: Utc::now(),
            reviewed_by: None,
            reviewed_at: None,
        };
        t.leaves.push(leave.clone());
        Ok(leave)
    }

    async fn review_leave(&self, id: u64, review: LeaveReview) -> StoreResult<LeaveRequest> {
        self.take_injected()?;
        let mut t = self.tables()?;
        let leave = t
            .leaves
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| StoreError::not_found("leave request", id))?;
        leave.status = review.status;
        leave.reviewed_by = review.reviewed_by;
        leave.reviewed_at = Some(review.reviewed_at);
        Ok(leave.clone())
    }

    async fn delete_leave(&self, id: u64) -> StoreResult<()> {
        self.take_injected()?;
        let mut t = self.tables()?;
        let before = t.leaves.len();
        t.leaves.retain(|l| l.id != id);
        if t.leaves.len() == before {
            return Err(StoreError::not_found("leave request", id));
        }
        Ok(())
    }

    async fn get_leave(&self, id: u64) -> StoreResult<LeaveRequest> {
        self.read_tables()?
            .leaves
            .iter()
            .find(|l| l.id == id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("leave request", id))
    }

    async fn list_leaves(&self, filter: &LeaveFilter) -> StoreResult<Vec<LeaveRequest>> {
        let t = self.read_tables()?;
        let mut rows: Vec<LeaveRequest> = t
            .leaves
            .iter()
            .filter(|l| filter.matches(l))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.applied_on.cmp(&a.applied_on).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn count_leaves(&self, filter: &LeaveFilter) -> StoreResult<i64> {
        let t = self.read_tables()?;
        Ok(t.leaves.iter().filter(|l| filter.matches(l)).count() as i64)
    }
}
