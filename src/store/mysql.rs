use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, MySqlPool, mysql::MySqlArguments, query::QueryAs, query::QueryScalar};
use tracing::{debug, error};

use super::{RecordStore, StoreError, StoreErrorKind, StoreResult};
use crate::model::{
    department::{Department, DepartmentPatch, NewDepartment},
    employee::{Employee, EmployeeFilter, EmployeePatch, NewEmployee},
    leave_request::{LeaveFilter, LeaveRequest, LeaveReview, NewLeaveRequest},
};
use crate::utils::db_utils::{Assignments, build_update_sql, execute_update};

const EMPLOYEE_COLUMNS: &str = "id, employee_code, name, email, phone, department, designation, \
     date_of_joining, status, profile_id, created_at, updated_at";
const DEPARTMENT_COLUMNS: &str = "id, name, location, head_id, created_at";
const LEAVE_COLUMNS: &str = "id, employee_id, leave_type, start_date, end_date, duration, reason, \
     status, applied_on, reviewed_by, reviewed_at";

pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

/// Structural mapping first; message heuristic only for the remainder.
impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::RowNotFound => StoreError::new(StoreErrorKind::NotFound, e.to_string()),
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23000") => {
                if db_err.message().contains("foreign key") {
                    StoreError::new(StoreErrorKind::Other, e.to_string())
                } else {
                    StoreError::new(StoreErrorKind::Duplicate, e.to_string())
                }
            }
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed => StoreError::new(StoreErrorKind::Network, e.to_string()),
            _ => StoreError::classified(e.to_string()),
        }
    }
}

fn decode_error(column: &str, value: &str) -> StoreError {
    StoreError::new(
        StoreErrorKind::Other,
        format!("unexpected value '{value}' in column {column}"),
    )
}

#[derive(FromRow)]
struct EmployeeRow {
    id: u64,
    employee_code: String,
    name: String,
    email: String,
    phone: Option<String>,
    department: Option<String>,
    designation: Option<String>,
    date_of_joining: Option<NaiveDate>,
    status: String,
    profile_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<EmployeeRow> for Employee {
    type Error = StoreError;

    fn try_from(row: EmployeeRow) -> Result<Self, Self::Error> {
        Ok(Employee {
            status: row
                .status
                .parse()
                .map_err(|_| decode_error("employees.status", &row.status))?,
            id: row.id,
            employee_code: row.employee_code,
            name: row.name,
            email: row.email,
            phone: row.phone,
            department: row.department,
            designation: row.designation,
            date_of_joining: row.date_of_joining,
            profile_id: row.profile_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct DepartmentRow {
    id: u64,
    name: String,
    location: Option<String>,
    head_id: Option<u64>,
    created_at: DateTime<Utc>,
}

impl From<DepartmentRow> for Department {
    fn from(row: DepartmentRow) -> Self {
        Department {
            id: row.id,
            name: row.name,
            location: row.location,
            head_id: row.head_id,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct LeaveRow {
    id: u64,
    employee_id: u64,
    leave_type: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    duration: i64,
    reason: String,
    status: String,
    applied_on: DateTime<Utc>,
    reviewed_by: Option<String>,
    reviewed_at: Option<DateTime<Utc>>,
}

impl TryFrom<LeaveRow> for LeaveRequest {
    type Error = StoreError;

    fn try_from(row: LeaveRow) -> Result<Self, Self::Error> {
        Ok(LeaveRequest {
            leave_type: row
                .leave_type
                .parse()
                .map_err(|_| decode_error("leave_requests.leave_type", &row.leave_type))?,
            status: row
                .status
                .parse()
                .map_err(|_| decode_error("leave_requests.status", &row.status))?,
            id: row.id,
            employee_id: row.employee_id,
            start_date: row.start_date,
            end_date: row.end_date,
            duration: row.duration,
            reason: row.reason,
            applied_on: row.applied_on,
            reviewed_by: row.reviewed_by,
            reviewed_at: row.reviewed_at,
        })
    }
}

// Helper enum for typed SQLx binding
enum FilterValue {
    U64(u64),
    Str(String),
    Date(NaiveDate),
}

struct WhereClause {
    sql: String,
    args: Vec<FilterValue>,
}

impl WhereClause {
    fn new() -> Self {
        Self {
            sql: String::from(" WHERE 1=1"),
            args: Vec::new(),
        }
    }

    fn push(&mut self, condition: &str, value: FilterValue) {
        self.sql.push_str(" AND ");
        self.sql.push_str(condition);
        self.args.push(value);
    }

    fn bind_as<'q, O>(
        &'q self,
        mut q: QueryAs<'q, sqlx::MySql, O, MySqlArguments>,
    ) -> QueryAs<'q, sqlx::MySql, O, MySqlArguments> {
        for arg in &self.args {
            q = match arg {
                FilterValue::U64(v) => q.bind(*v),
                FilterValue::Str(s) => q.bind(s.as_str()),
                FilterValue::Date(d) => q.bind(*d),
            };
        }
        q
    }

    fn bind_scalar<'q>(
        &'q self,
        mut q: QueryScalar<'q, sqlx::MySql, i64, MySqlArguments>,
    ) -> QueryScalar<'q, sqlx::MySql, i64, MySqlArguments> {
        for arg in &self.args {
            q = match arg {
                FilterValue::U64(v) => q.bind(*v),
                FilterValue::Str(s) => q.bind(s.as_str()),
                FilterValue::Date(d) => q.bind(*d),
            };
        }
        q
    }
}

fn employee_where(filter: &EmployeeFilter) -> WhereClause {
    let mut w = WhereClause::new();

    if let Some(search) = filter.search.as_deref() {
        // one placeholder per column
        let like = format!("%{}%", search);
        w.sql
            .push_str(" AND (name LIKE ? OR email LIKE ? OR employee_code LIKE ?)");
        w.args.push(FilterValue::Str(like.clone()));
        w.args.push(FilterValue::Str(like.clone()));
        w.args.push(FilterValue::Str(like));
    }
    if let Some(status) = filter.status {
        w.push("status = ?", FilterValue::Str(status.to_string()));
    }
    if let Some(department) = filter.department.as_deref() {
        w.push("department = ?", FilterValue::Str(department.to_string()));
    }
    if let Some(email) = filter.email.as_deref() {
        w.push("email = ?", FilterValue::Str(email.to_string()));
    }
    if let Some(since) = filter.joined_since {
        w.push("date_of_joining >= ?", FilterValue::Date(since));
    }
    w
}

fn leave_where(filter: &LeaveFilter) -> WhereClause {
    let mut w = WhereClause::new();
    if let Some(employee_id) = filter.employee_id {
        w.push("employee_id = ?", FilterValue::U64(employee_id));
    }
    if let Some(status) = filter.status {
        w.push("status = ?", FilterValue::Str(status.to_string()));
    }
    w
}

fn log_failure(e: sqlx::Error, op: &'static str) -> StoreError {
    error!(error = %e, op, "Record store call failed");
    StoreError::from(e)
}

#[async_trait]
impl RecordStore for MySqlStore {
    async fn insert_employee(&self, new: NewEmployee) -> StoreResult<Employee> {
        let result = sqlx::query(
            r#"
            INSERT INTO employees
                (employee_code, name, email, phone, department, designation, date_of_joining, status, profile_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&new.employee_code)
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.phone)
        .bind(&new.department)
        .bind(&new.designation)
        .bind(new.date_of_joining)
        .bind(new.status.to_string())
        .bind(&new.profile_id)
        .execute(&self.pool)
        .await
        .map_err(|e| log_failure(e, "insert_employee"))?;

        self.get_employee(result.last_insert_id()).await
    }

    async fn update_employee(&self, id: u64, patch: EmployeePatch) -> StoreResult<Employee> {
        let mut a = Assignments::default();
        a.set_opt("name", patch.name)
            .set_opt("email", patch.email)
            .set_nullable("phone", patch.phone)
            .set_nullable("department", patch.department)
            .set_nullable("designation", patch.designation)
            .set_nullable("date_of_joining", patch.date_of_joining)
            .set_opt("status", patch.status.map(|s| s.to_string()))
            .set_nullable("profile_id", patch.profile_id)
            .set("updated_at", Utc::now());

        let update = build_update_sql("employees", a, "id", id);
        debug!(sql = %update.sql, "Updating employee");
        let affected = execute_update(&self.pool, update)
            .await
            .map_err(|e| log_failure(e, "update_employee"))?;
        if affected == 0 {
            return Err(StoreError::not_found("employee", id));
        }
        self.get_employee(id).await
    }

    async fn delete_employee(&self, id: u64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM employees WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| log_failure(e, "delete_employee"))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("employee", id));
        }
        Ok(())
    }

    async fn get_employee(&self, id: u64) -> StoreResult<Employee> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?");
        sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| log_failure(e, "get_employee"))?
            .ok_or_else(|| StoreError::not_found("employee", id))?
            .try_into()
    }

    async fn list_employees(&self, filter: &EmployeeFilter) -> StoreResult<Vec<Employee>> {
        let w = employee_where(filter);
        let limit = filter
            .limit
            .map(|n| format!(" LIMIT {}", n))
            .unwrap_or_default();
        let sql = format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees{} ORDER BY created_at DESC, id DESC{}",
            w.sql, limit
        );
        debug!(sql = %sql, "Fetching employees");

        let rows = w
            .bind_as(sqlx::query_as::<_, EmployeeRow>(&sql))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| log_failure(e, "list_employees"))?;
        rows.into_iter().map(Employee::try_from).collect()
    }

    async fn count_employees(&self, filter: &EmployeeFilter) -> StoreResult<i64> {
        let w = employee_where(filter);
        let sql = format!("SELECT COUNT(*) FROM employees{}", w.sql);
        debug!(sql = %sql, "Counting employees");

        w.bind_scalar(sqlx::query_scalar::<_, i64>(&sql))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| log_failure(e, "count_employees"))
    }

    async fn insert_department(&self, new: NewDepartment) -> StoreResult<Department> {
        let result =
            sqlx::query("INSERT INTO departments (name, location, head_id) VALUES (?, ?, ?)")
                .bind(&new.name)
                .bind(&new.location)
                .bind(new.head_id)
                .execute(&self.pool)
                .await
                .map_err(|e| log_failure(e, "insert_department"))?;

        self.get_department(result.last_insert_id()).await
    }

    async fn update_department(
        &self,
        id: u64,
        patch: DepartmentPatch,
    ) -> StoreResult<Department> {
        if patch.is_empty() {
            return self.get_department(id).await;
        }

        let mut a = Assignments::default();
        a.set_opt("name", patch.name)
            .set_nullable("location", patch.location)
            .set_nullable("head_id", patch.head_id);

        let update = build_update_sql("departments", a, "id", id);
        debug!(sql = %update.sql, "Updating department");
        // MySQL reports 0 rows for a no-op update too, so existence is decided by the fetch
        execute_update(&self.pool, update)
            .await
            .map_err(|e| log_failure(e, "update_department"))?;
        self.get_department(id).await
    }

    async fn delete_department(&self, id: u64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM departments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| log_failure(e, "delete_department"))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("department", id));
        }
        Ok(())
    }

    async fn get_department(&self, id: u64) -> StoreResult<Department> {
        let sql = format!("SELECT {DEPARTMENT_COLUMNS} FROM departments WHERE id = ?");
        sqlx::query_as::<_, DepartmentRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| log_failure(e, "get_department"))?
            .map(Department::from)
            .ok_or_else(|| StoreError::not_found("department", id))
    }

    async fn list_departments(&self) -> StoreResult<Vec<Department>> {
        let sql = format!("SELECT {DEPARTMENT_COLUMNS} FROM departments ORDER BY name ASC");
        let rows = sqlx::query_as::<_, DepartmentRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| log_failure(e, "list_departments"))?;
        Ok(rows.into_iter().map(Department::from).collect())
    }

    async fn count_departments(&self) -> StoreResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM departments")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| log_failure(e, "count_departments"))
    }

    async fn insert_leave(&self, new: NewLeaveRequest) -> StoreResult<LeaveRequest> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (employee_id, leave_type, start_date, end_date, duration, reason, status)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.employee_id)
        .bind(new.leave_type.to_string())
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(new.duration)
        .bind(&new.reason)
        .bind(new.status.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| log_failure(e, "insert_leave"))?;

        self.get_leave(result.last_insert_id()).await
    }

    async fn review_leave(&self, id: u64, review: LeaveReview) -> StoreResult<LeaveRequest> {
        let mut a = Assignments::default();
        a.set("status", review.status.to_string())
            .set("reviewed_by", review.reviewed_by)
            .set("reviewed_at", review.reviewed_at);

        let update = build_update_sql("leave_requests", a, "id", id);
        debug!(sql = %update.sql, "Reviewing leave request");
        execute_update(&self.pool, update)
            .await
            .map_err(|e| log_failure(e, "review_leave"))?;
        // reviewed_at always changes, so 0 rows would mean missing; the fetch reports it
        self.get_leave(id).await
    }

    async fn delete_leave(&self, id: u64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM leave_requests WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| log_failure(e, "delete_leave"))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("leave request", id));
        }
        Ok(())
    }

    async fn get_leave(&self, id: u64) -> StoreResult<LeaveRequest> {
        let sql = format!("SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ?");
        sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| log_failure(e, "get_leave"))?
            .ok_or_else(|| StoreError::not_found("leave request", id))?
            .try_into()
    }

    async fn list_leaves(&self, filter: &LeaveFilter) -> StoreResult<Vec<LeaveRequest>> {
        let w = leave_where(filter);
        let sql = format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_requests{} ORDER BY applied_on DESC, id DESC",
            w.sql
        );
        debug!(sql = %sql, "Fetching leave requests");

        let rows = w
            .bind_as(sqlx::query_as::<_, LeaveRow>(&sql))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| log_failure(e, "list_leaves"))?;
        rows.into_iter().map(LeaveRequest::try_from).collect()
    }

    async fn count_leaves(&self, filter: &LeaveFilter) -> StoreResult<i64> {
        let w = leave_where(filter);
        let sql = format!("SELECT COUNT(*) FROM leave_requests{}", w.sql);

        w.bind_scalar(sqlx::query_scalar::<_, i64>(&sql))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| log_failure(e, "count_leaves"))
    }
}
