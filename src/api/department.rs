use crate::{
    auth::auth::AuthUser,
    error::AppError,
    model::{
        department::{Department, DepartmentPatch, NewDepartment},
        employee::{EmployeeFilter, initials},
    },
    store::RecordStore,
};
use actix_web::{HttpResponse, web};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, warn};
use utoipa::{IntoParams, ToSchema};

const MEMBER_INITIALS: u32 = 3;

#[derive(Deserialize, ToSchema)]
pub struct CreateDepartment {
    #[schema(example = "Engineering")]
    pub name: String,
    #[schema(example = "Dhaka HQ")]
    pub location: Option<String>,
    /// Employee id of the department head
    #[schema(example = 12)]
    pub head_id: Option<u64>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct DepartmentQuery {
    /// Matches department name, head name or location
    pub search: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DepartmentHead {
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(example = "jane@corp.io")]
    pub email: String,
    #[schema(example = "JD")]
    pub initials: String,
}

impl DepartmentHead {
    fn unassigned() -> Self {
        Self {
            name: "Not assigned".to_string(),
            email: String::new(),
            initials: "NA".to_string(),
        }
    }
}

/// Department card: the record plus head and active headcount.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DepartmentSummary {
    pub id: u64,
    #[schema(example = "Engineering")]
    pub name: String,
    #[schema(example = "Not specified")]
    pub location: String,
    pub head: DepartmentHead,
    /// Active employees in this department
    #[schema(example = 8)]
    pub members: i64,
    #[schema(example = json!(["JD", "AK", "MR"]))]
    pub member_initials: Vec<String>,
}

impl DepartmentSummary {
    fn matches(&self, term: &str) -> bool {
        term.is_empty()
            || self.name.to_lowercase().contains(term)
            || self.head.name.to_lowercase().contains(term)
            || self.location.to_lowercase().contains(term)
    }
}

/// Lookups that fail degrade to an unassigned head and zero members.
async fn summarize(store: &dyn RecordStore, department: Department) -> DepartmentSummary {
    let head = match department.head_id {
        Some(head_id) => match store.get_employee(head_id).await {
            Ok(e) => DepartmentHead {
                initials: e.initials(),
                name: e.name,
                email: e.email,
            },
            Err(e) => {
                warn!(department_id = department.id, head_id, error = %e, "Head lookup failed");
                DepartmentHead::unassigned()
            }
        },
        None => DepartmentHead::unassigned(),
    };

    let active_members = EmployeeFilter {
        department: Some(department.name.clone()),
        ..EmployeeFilter::active()
    };
    let members = store
        .count_employees(&active_members)
        .await
        .unwrap_or_else(|e| {
            warn!(department_id = department.id, error = %e, "Member count failed");
            0
        });
    let member_initials = store
        .list_employees(&EmployeeFilter {
            limit: Some(MEMBER_INITIALS),
            ..active_members
        })
        .await
        .map(|rows| rows.iter().map(|e| initials(&e.name)).collect())
        .unwrap_or_else(|e| {
            warn!(department_id = department.id, error = %e, "Member lookup failed");
            Vec::new()
        });

    DepartmentSummary {
        id: department.id,
        name: department.name,
        location: department
            .location
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| "Not specified".to_string()),
        head,
        members,
        member_initials,
    }
}

fn trimmed(raw: Option<String>) -> Option<String> {
    raw.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[utoipa::path(
    post,
    path = "/api/department",
    request_body = CreateDepartment,
    responses(
        (status = 201, description = "Department created", body = Department),
        (status = 400, description = "Department name is required"),
        (status = 409, description = "Department name already exists")
    ),
    tag = "Department",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_department(
    auth: AuthUser,
    store: web::Data<dyn RecordStore>,
    payload: web::Json<CreateDepartment>,
) -> Result<HttpResponse, AppError> {
    auth.require_hr_or_admin()?;
    let payload = payload.into_inner();

    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::Invalid("Department name is required".to_string()));
    }

    let created = store
        .insert_department(NewDepartment {
            name,
            location: trimmed(payload.location),
            head_id: payload.head_id,
        })
        .await
        .inspect_err(|e| error!(error = %e, "Failed to create department"))?;

    info!(department_id = created.id, name = %created.name, "Department created");
    Ok(HttpResponse::Created().json(created))
}

#[utoipa::path(
    get,
    path = "/api/department",
    params(DepartmentQuery),
    responses(
        (status = 200, description = "Departments ordered by name", body = [DepartmentSummary])
    ),
    tag = "Department",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_departments(
    _auth: AuthUser,
    store: web::Data<dyn RecordStore>,
    query: web::Query<DepartmentQuery>,
) -> Result<HttpResponse, AppError> {
    let departments = store.list_departments().await?;
    let term = query
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .unwrap_or_default();

    let summaries = join_all(
        departments
            .into_iter()
            .map(|department| summarize(store.get_ref(), department)),
    )
    .await;

    Ok(HttpResponse::Ok().json(
        summaries
            .into_iter()
            .filter(|s| s.matches(&term))
            .collect::<Vec<_>>(),
    ))
}

#[utoipa::path(
    get,
    path = "/api/department/{department_id}",
    params(
        ("department_id" = u64, Path, description = "Department ID")
    ),
    responses(
        (status = 200, description = "Department found", body = DepartmentSummary),
        (status = 404, description = "Department not found")
    ),
    tag = "Department",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_department(
    _auth: AuthUser,
    store: web::Data<dyn RecordStore>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let department = store.get_department(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(summarize(store.get_ref(), department).await))
}

#[utoipa::path(
    put,
    path = "/api/department/{department_id}",
    params(
        ("department_id" = u64, Path, description = "Department ID")
    ),
    request_body = DepartmentPatch,
    responses(
        (status = 200, description = "Department updated", body = Department),
        (status = 400, description = "No fields provided for update"),
        (status = 404, description = "Department not found")
    ),
    tag = "Department",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_department(
    auth: AuthUser,
    store: web::Data<dyn RecordStore>,
    path: web::Path<u64>,
    body: web::Json<DepartmentPatch>,
) -> Result<HttpResponse, AppError> {
    auth.require_hr_or_admin()?;
    let mut patch = body.into_inner();
    patch.name = trimmed(patch.name);
    if patch.is_empty() {
        return Err(AppError::Invalid("No fields provided for update".to_string()));
    }

    let updated = store.update_department(path.into_inner(), patch).await?;
    Ok(HttpResponse::Ok().json(updated))
}

#[utoipa::path(
    delete,
    path = "/api/department/{department_id}",
    params(
        ("department_id" = u64, Path, description = "Department ID")
    ),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 404, description = "Department not found")
    ),
    tag = "Department",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_department(
    auth: AuthUser,
    store: web::Data<dyn RecordStore>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    auth.require_hr_or_admin()?;
    let department_id = path.into_inner();

    store
        .delete_department(department_id)
        .await
        .inspect_err(|e| error!(error = %e, department_id, "Failed to delete department"))?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Successfully deleted"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::employee::{EmployeeStatus, NewEmployee};
    use crate::store::MemoryStore;

    async fn hire(
        store: &MemoryStore,
        name: &str,
        department: &str,
        status: EmployeeStatus,
    ) -> u64 {
        store
            .insert_employee(NewEmployee {
                employee_code: format!("EMP-{name}"),
                name: name.to_string(),
                email: format!("{}@corp.io", name.to_lowercase().replace(' ', ".")),
                phone: None,
                department: Some(department.to_string()),
                designation: None,
                date_of_joining: None,
                status,
                profile_id: None,
            })
            .await
            .unwrap()
            .id
    }

    #[actix_web::test]
    async fn summary_counts_active_members_and_names_the_head() {
        let store = MemoryStore::new();
        let head = hire(&store, "Jane Doe", "Engineering", EmployeeStatus::Active).await;
        for name in ["Al Kay", "Mo Ray", "Ed Fox"] {
            hire(&store, name, "Engineering", EmployeeStatus::Active).await;
        }
        hire(&store, "Old Timer", "Engineering", EmployeeStatus::Resigned).await;

        let department = store
            .insert_department(NewDepartment {
                name: "Engineering".to_string(),
                location: None,
                head_id: Some(head),
            })
            .await
            .unwrap();

        let summary = summarize(&store, department).await;
        assert_eq!(summary.members, 4);
        assert_eq!(summary.member_initials.len(), 3);
        assert_eq!(summary.head.name, "Jane Doe");
        assert_eq!(summary.head.initials, "JD");
        assert_eq!(summary.location, "Not specified");
    }

    #[actix_web::test]
    async fn missing_head_degrades_to_not_assigned() {
        let store = MemoryStore::new();
        let department = store
            .insert_department(NewDepartment {
                name: "Sales".to_string(),
                location: Some("Chittagong".to_string()),
                head_id: Some(404),
            })
            .await
            .unwrap();

        let summary = summarize(&store, department).await;
        assert_eq!(summary.head, DepartmentHead::unassigned());
        assert_eq!(summary.members, 0);
        assert!(summary.member_initials.is_empty());
        assert!(summary.matches("chitt"));
        assert!(!summary.matches("finance"));
    }
}
