use crate::api::dashboard::{DepartmentShare, Overview};
use crate::api::department::{
    CreateDepartment, DepartmentHead, DepartmentQuery, DepartmentSummary,
};
use crate::api::employee::{CreateEmployee, EmployeeListResponse, EmployeeQuery};
use crate::api::leave_request::{
    DurationPreview, LeaveListResponse, LeaveQuery, LeaveSubmitted, StatusUpdate,
};
use crate::leave::{FieldError, LeaveForm, LeaveRow, StatusCounts};
use crate::model::department::{Department, DepartmentPatch};
use crate::model::employee::{Employee, EmployeePatch, EmployeeStatus};
use crate::model::leave_request::{LeaveRequest, LeaveStatus, LeaveType};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM System API",
        version = "1.0.0",
        description = r#"
## Human Resource Management (HRM) System

Backend for HR staff and employees.

### 🔹 Key Features
- **Employee Management**
  - Create, update, search and view employee records
- **Departments**
  - Department heads, locations and active headcounts
- **Leave Management**
  - Apply for leave, preview duration, approve/reject/reopen requests
- **Dashboard**
  - Headcount, new joiners, pending leave and department breakdown

### 🔐 Security
Every endpoint expects a **JWT Bearer** token issued by the identity provider.
Only **Admin** or **HR** can review leave or change employee records.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::leave_request::validate_leave,
        crate::api::leave_request::create_leave,
        crate::api::leave_request::leave_list,
        crate::api::leave_request::my_leaves,
        crate::api::leave_request::pending_count,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::update_status,
        crate::api::leave_request::delete_leave,

        crate::api::employee::create_employee,
        crate::api::employee::list_employees,
        crate::api::employee::my_employee,
        crate::api::employee::get_employee,
        crate::api::employee::update_employee,
        crate::api::employee::delete_employee,

        crate::api::department::create_department,
        crate::api::department::list_departments,
        crate::api::department::get_department,
        crate::api::department::update_department,
        crate::api::department::delete_department,

        crate::api::dashboard::overview
    ),
    components(
        schemas(
            LeaveForm,
            FieldError,
            LeaveType,
            LeaveStatus,
            LeaveRequest,
            LeaveRow,
            StatusCounts,
            DurationPreview,
            LeaveSubmitted,
            LeaveQuery,
            LeaveListResponse,
            StatusUpdate,
            Employee,
            EmployeeStatus,
            EmployeePatch,
            CreateEmployee,
            EmployeeQuery,
            EmployeeListResponse,
            Department,
            DepartmentPatch,
            CreateDepartment,
            DepartmentQuery,
            DepartmentHead,
            DepartmentSummary,
            DepartmentShare,
            Overview
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Leave", description = "Leave management APIs"),
        (name = "Employee", description = "Employee management APIs"),
        (name = "Department", description = "Department management APIs"),
        (name = "Dashboard", description = "HR dashboard APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
