use std::collections::BTreeSet;

use crate::{
    auth::auth::AuthUser,
    error::AppError,
    leave::resolve_target_employee,
    model::employee::{Employee, EmployeeFilter, EmployeePatch, EmployeeStatus, NewEmployee},
    store::RecordStore,
    utils::{
        employee_code::{fallback_employee_code, next_employee_code},
        snapshot_cache::SnapshotCache,
    },
};
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, instrument, warn};
use utoipa::{IntoParams, ToSchema};

const SNAPSHOT_KEY: &str = "employees";
const LOCAL_RESULTS_NOTICE: &str = "Search failed, showing local results";

#[derive(Deserialize, Serialize, ToSchema)]
pub struct CreateEmployee {
    #[schema(example = "John")]
    pub first_name: String,
    #[schema(example = "Doe")]
    pub last_name: String,
    #[schema(example = "john@email.com", format = "email", value_type = String)]
    pub email: String,
    #[schema(example = "+8801712345678")]
    pub phone_number: Option<String>,
    #[schema(example = "Engineering")]
    pub department: Option<String>,
    #[schema(example = "Backend Engineer")]
    pub designation: Option<String>,
    #[schema(example = "2026-01-01", format = "date", value_type = Option<String>)]
    pub date_of_joining: Option<NaiveDate>,
    /// Account status toggle: Active when true, Resigned when false
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct EmployeeQuery {
    /// Search by name, email or employee code
    pub search: Option<String>,
    /// `Active`, `Resigned` or `all`
    pub status: Option<String>,
    /// Department name or `all`
    pub department: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub data: Vec<Employee>,
    #[schema(example = 10)]
    pub total: usize,
    #[schema(example = 9)]
    pub active: usize,
    #[schema(example = 1)]
    pub resigned: usize,
    /// distinct department names in `data`
    pub departments: Vec<String>,
    /// set when the rows come from the local snapshot instead of the store
    #[schema(example = "Search failed, showing local results", nullable = true)]
    pub notice: Option<String>,
}

impl EmployeeListResponse {
    fn new(data: Vec<Employee>, notice: Option<String>) -> Self {
        let active = data
            .iter()
            .filter(|e| e.status == EmployeeStatus::Active)
            .count();
        let departments: BTreeSet<String> =
            data.iter().filter_map(|e| e.department.clone()).collect();
        Self {
            total: data.len(),
            resigned: data.len() - active,
            active,
            departments: departments.into_iter().collect(),
            data,
            notice,
        }
    }
}

/// `None` for a missing, blank or `all` filter value.
pub(crate) fn filter_value(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
}

fn non_blank(raw: Option<String>) -> Option<String> {
    raw.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl EmployeeQuery {
    fn to_filter(&self) -> Result<EmployeeFilter, AppError> {
        let status = filter_value(self.status.as_deref())
            .map(|s| {
                s.parse::<EmployeeStatus>()
                    .map_err(|_| AppError::Invalid(format!("Unknown employee status '{s}'")))
            })
            .transpose()?;

        Ok(EmployeeFilter {
            search: filter_value(self.search.as_deref()).map(str::to_string),
            status,
            department: filter_value(self.department.as_deref()).map(str::to_string),
            ..EmployeeFilter::default()
        })
    }
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/employee",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created successfully", body = Employee),
        (status = 400, description = "Missing name or email"),
        (status = 403, description = "HR/Admin only"),
        (status = 409, description = "Email already in use")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
#[instrument(name = "create_employee", skip_all)]
pub async fn create_employee(
    auth: AuthUser,
    store: web::Data<dyn RecordStore>,
    payload: web::Json<CreateEmployee>,
) -> Result<HttpResponse, AppError> {
    auth.require_hr_or_admin()?;
    let payload = payload.into_inner();

    let name = format!("{} {}", payload.first_name.trim(), payload.last_name.trim())
        .trim()
        .to_string();
    let email = payload.email.trim().to_string();
    if name.is_empty() || email.is_empty() {
        return Err(AppError::Invalid("Name and email are required".to_string()));
    }

    let employee_code = match store.list_employees(&EmployeeFilter::default()).await {
        Ok(existing) => next_employee_code(&existing),
        Err(e) => {
            warn!(error = %e, "Could not list employees for code generation, using fallback");
            fallback_employee_code()
        }
    };

    let created = store
        .insert_employee(NewEmployee {
            employee_code,
            name,
            email,
            phone: non_blank(payload.phone_number),
            department: non_blank(payload.department),
            designation: non_blank(payload.designation),
            date_of_joining: payload.date_of_joining,
            status: if payload.active {
                EmployeeStatus::Active
            } else {
                EmployeeStatus::Resigned
            },
            // linked later, once the employee has an account
            profile_id: None,
        })
        .await
        .inspect_err(|e| error!(error = %e, "Failed to Create Employee"))?;

    info!(employee_id = created.id, code = %created.employee_code, "Employee created");
    Ok(HttpResponse::Created().json(created))
}

#[utoipa::path(
    get,
    path = "/api/employee",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Employee list, newest first", body = EmployeeListResponse),
        (status = 403, description = "HR/Admin only")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_employees(
    auth: AuthUser,
    store: web::Data<dyn RecordStore>,
    snapshots: web::Data<SnapshotCache<Employee>>,
    query: web::Query<EmployeeQuery>,
) -> Result<HttpResponse, AppError> {
    auth.require_hr_or_admin()?;
    let filter = query.to_filter()?;

    match store.list_employees(&filter).await {
        Ok(rows) => {
            if filter.is_unfiltered() {
                snapshots.store(SNAPSHOT_KEY, rows.clone()).await;
            }
            Ok(HttpResponse::Ok().json(EmployeeListResponse::new(rows, None)))
        }
        Err(e) if !filter.is_unfiltered() => {
            let Some(snapshot) = snapshots.get(SNAPSHOT_KEY).await else {
                return Err(e.into());
            };
            warn!(error = %e, "Employee search failed, filtering local snapshot");
            let rows = snapshot
                .iter()
                .filter(|emp| filter.matches(emp))
                .cloned()
                .collect();
            Ok(HttpResponse::Ok().json(EmployeeListResponse::new(
                rows,
                Some(LOCAL_RESULTS_NOTICE.to_string()),
            )))
        }
        Err(e) => Err(e.into()),
    }
}

/// The caller's own employee record
#[utoipa::path(
    get,
    path = "/api/employee/me",
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 404, description = "No employee record for this account")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn my_employee(
    auth: AuthUser,
    store: web::Data<dyn RecordStore>,
) -> Result<HttpResponse, AppError> {
    let employee = resolve_target_employee(store.get_ref(), &auth).await?;
    Ok(HttpResponse::Ok().json(employee))
}

/// Get Employee by ID
#[utoipa::path(
    get,
    path = "/api/employee/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 403, description = "Neither HR nor the employee"),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "kind": "not_found",
            "message": "employee 1 not found"
        }))
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_employee(
    auth: AuthUser,
    store: web::Data<dyn RecordStore>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let employee_id = path.into_inner();
    if !auth.is_hr() && auth.employee_id != Some(employee_id) {
        return Err(AppError::Unauthorized("HR/Admin only".to_string()));
    }

    let employee = store.get_employee(employee_id).await?;
    Ok(HttpResponse::Ok().json(employee))
}

/// Update Employee
#[utoipa::path(
    put,
    path = "/api/employee/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee ID")
    ),
    request_body = EmployeePatch,
    responses(
        (status = 200, description = "Employee updated successfully", body = Employee),
        (status = 400, description = "No fields provided for update"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_employee(
    auth: AuthUser,
    store: web::Data<dyn RecordStore>,
    path: web::Path<u64>,
    body: web::Json<EmployeePatch>,
) -> Result<HttpResponse, AppError> {
    auth.require_hr_or_admin()?;
    let employee_id = path.into_inner();
    let patch = body.into_inner();
    if patch.is_empty() {
        return Err(AppError::Invalid("No fields provided for update".to_string()));
    }

    let updated = store.update_employee(employee_id, patch).await?;
    Ok(HttpResponse::Ok().json(updated))
}

/// Delete Employee
#[utoipa::path(
    delete,
    path = "/api/employee/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Successfully deleted", body = Object, example = json!({
            "message": "Successfully deleted"
        })),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_employee(
    auth: AuthUser,
    store: web::Data<dyn RecordStore>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    auth.require_hr_or_admin()?;
    let employee_id = path.into_inner();

    store
        .delete_employee(employee_id)
        .await
        .inspect_err(|e| error!(error = %e, employee_id, "Failed to delete employee"))?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Successfully deleted"
    })))
}
