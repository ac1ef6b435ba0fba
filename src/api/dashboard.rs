use std::collections::HashMap;

use crate::{
    auth::auth::AuthUser,
    error::AppError,
    model::{employee::Employee, employee::EmployeeFilter, leave_request::LeaveFilter},
    store::RecordStore,
};
use actix_web::{HttpResponse, web};
use chrono::{Duration, Utc};
use serde::Serialize;
use utoipa::ToSchema;

const TOP_DEPARTMENTS: usize = 4;
const RECENT_HIRE_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DepartmentShare {
    #[schema(example = "Engineering")]
    pub name: String,
    #[schema(example = 12)]
    pub count: usize,
    #[schema(example = 40)]
    pub percent: u32,
}

#[derive(Serialize, ToSchema)]
pub struct Overview {
    /// Active employees
    #[schema(example = 30)]
    pub total_employees: i64,
    /// Active employees who joined in the last 30 days
    #[schema(example = 3)]
    pub new_joiners: i64,
    #[schema(example = 4)]
    pub pending_leaves: i64,
    #[schema(example = 5)]
    pub departments: i64,
    pub department_breakdown: Vec<DepartmentShare>,
}

/// Largest departments first (ties by name), at most four.
/// Employees without a department count as `Unassigned`.
pub fn department_breakdown(employees: &[Employee], total: i64) -> Vec<DepartmentShare> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for e in employees {
        let name = e
            .department
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or("Unassigned");
        *counts.entry(name).or_default() += 1;
    }

    let mut shares: Vec<DepartmentShare> = counts
        .into_iter()
        .map(|(name, count)| DepartmentShare {
            name: name.to_string(),
            count,
            percent: if total > 0 {
                (count as f64 / total as f64 * 100.0).round() as u32
            } else {
                0
            },
        })
        .collect();
    shares.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    shares.truncate(TOP_DEPARTMENTS);
    shares
}

#[utoipa::path(
    get,
    path = "/api/dashboard/overview",
    responses(
        (status = 200, description = "HR dashboard figures", body = Overview),
        (status = 403, description = "HR/Admin only")
    ),
    tag = "Dashboard",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn overview(
    auth: AuthUser,
    store: web::Data<dyn RecordStore>,
) -> Result<HttpResponse, AppError> {
    auth.require_hr_or_admin()?;

    let active = store.list_employees(&EmployeeFilter::active()).await?;
    let total_employees = active.len() as i64;

    let since = (Utc::now() - Duration::days(RECENT_HIRE_DAYS)).date_naive();
    let new_joiners = store
        .count_employees(&EmployeeFilter {
            joined_since: Some(since),
            ..EmployeeFilter::active()
        })
        .await?;
    let pending_leaves = store.count_leaves(&LeaveFilter::pending()).await?;
    let departments = store.count_departments().await?;

    Ok(HttpResponse::Ok().json(Overview {
        total_employees,
        new_joiners,
        pending_leaves,
        departments,
        department_breakdown: department_breakdown(&active, total_employees),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::employee::EmployeeStatus;

    fn in_department(id: u64, department: Option<&str>) -> Employee {
        Employee {
            id,
            employee_code: format!("EMP{id:03}"),
            name: format!("Person {id}"),
            email: format!("p{id}@corp.io"),
            phone: None,
            department: department.map(str::to_string),
            designation: None,
            date_of_joining: None,
            status: EmployeeStatus::Active,
            profile_id: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn top_four_by_count_with_unassigned_bucket() {
        let layout = [
            Some("Engineering"),
            Some("Engineering"),
            Some("Engineering"),
            Some("Sales"),
            Some("Sales"),
            None,
            None,
            Some("Finance"),
            Some("Admin"),
        ];
        let employees: Vec<Employee> = layout
            .iter()
            .enumerate()
            .map(|(i, d)| in_department(i as u64 + 1, *d))
            .collect();

        let shares = department_breakdown(&employees, employees.len() as i64);
        let names: Vec<&str> = shares.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Engineering", "Sales", "Unassigned", "Admin"]);
        assert_eq!(shares[0].percent, 33);
        assert_eq!(shares[1].percent, 22);
    }

    #[test]
    fn empty_workforce_has_no_breakdown() {
        assert!(department_breakdown(&[], 0).is_empty());
    }
}
