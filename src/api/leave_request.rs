use crate::{
    auth::auth::AuthUser,
    error::AppError,
    leave::{
        LeaveBoard, LeaveForm, LeaveRow, StatusCounts, resolve_target_employee,
        submit_leave_request, transition_status, validate_and_compute_duration,
    },
    model::leave_request::{LeaveFilter, LeaveRequest, LeaveStatus},
    store::RecordStore,
};
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

use super::employee::filter_value;

const SUBMITTED: &str = "Leave application submitted successfully! HR will be notified.";

#[derive(Serialize, ToSchema)]
pub struct DurationPreview {
    /// Inclusive day count
    #[schema(example = 3)]
    pub duration: i64,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveSubmitted {
    #[schema(example = "Leave application submitted successfully! HR will be notified.")]
    pub message: String,
    pub data: LeaveRequest,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct LeaveQuery {
    /// `Pending`, `Approved`, `Rejected` or `all`
    #[schema(example = "Pending")]
    pub status: Option<String>,
    /// Matches employee name, department or leave type
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveRow>,
    /// Counts over every request, not only the filtered rows
    pub counts: StatusCounts,
}

#[derive(Deserialize, ToSchema)]
pub struct StatusUpdate {
    #[schema(example = "Approved")]
    pub status: String,
}

fn parse_status(raw: &str) -> Result<LeaveStatus, AppError> {
    raw.trim()
        .parse::<LeaveStatus>()
        .map_err(|_| AppError::Invalid(format!("Unknown leave status '{}'", raw.trim())))
}

/// Duration preview for the leave form
#[utoipa::path(
    post,
    path = "/api/leave/validate",
    request_body = LeaveForm,
    responses(
        (status = 200, description = "Form is valid", body = DurationPreview),
        (status = 400, description = "First failing field", body = Object, example = json!({
            "kind": "validation",
            "message": "Please select a leave type"
        }))
    ),
    tag = "Leave",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn validate_leave(
    _auth: AuthUser,
    form: web::Json<LeaveForm>,
) -> Result<HttpResponse, AppError> {
    let valid = validate_and_compute_duration(&form)?;
    Ok(HttpResponse::Ok().json(DurationPreview {
        duration: valid.duration,
    }))
}

/// Apply for leave
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body = LeaveForm,
    responses(
        (status = 201, description = "Leave request submitted", body = LeaveSubmitted),
        (status = 400, description = "Invalid leave form"),
        (status = 403, description = "Employee record does not match the account"),
        (status = 404, description = "No employee record for the account")
    ),
    tag = "Leave",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_leave(
    auth: AuthUser,
    store: web::Data<dyn RecordStore>,
    form: web::Json<LeaveForm>,
) -> Result<HttpResponse, AppError> {
    let target = resolve_target_employee(store.get_ref(), &auth).await?;
    let created = submit_leave_request(store.get_ref(), &form, &auth, &target)
        .await
        .inspect_err(|e| error!(error = %e, employee_id = target.id, "Leave submission failed"))?;

    Ok(HttpResponse::Created().json(LeaveSubmitted {
        message: SUBMITTED.to_string(),
        data: created,
    }))
}

/// List leave requests for review
#[utoipa::path(
    get,
    path = "/api/leave",
    params(LeaveQuery),
    responses(
        (status = 200, description = "Leave requests, newest first", body = LeaveListResponse),
        (status = 403, description = "HR/Admin only")
    ),
    tag = "Leave",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn leave_list(
    auth: AuthUser,
    store: web::Data<dyn RecordStore>,
    query: web::Query<LeaveQuery>,
) -> Result<HttpResponse, AppError> {
    auth.require_hr_or_admin()?;
    let status = filter_value(query.status.as_deref())
        .map(parse_status)
        .transpose()?;

    let board = LeaveBoard::load(store.get_ref()).await?;
    Ok(HttpResponse::Ok().json(LeaveListResponse {
        data: board.filtered(status, query.search.as_deref().unwrap_or_default()),
        counts: board.counts(),
    }))
}

/// The caller's own leave requests
#[utoipa::path(
    get,
    path = "/api/leave/mine",
    responses(
        (status = 200, description = "Own leave requests, newest first", body = [LeaveRequest]),
        (status = 404, description = "No employee record for the account")
    ),
    tag = "Leave",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn my_leaves(
    auth: AuthUser,
    store: web::Data<dyn RecordStore>,
) -> Result<HttpResponse, AppError> {
    let employee = resolve_target_employee(store.get_ref(), &auth).await?;
    let leaves = store
        .list_leaves(&LeaveFilter::for_employee(employee.id))
        .await?;
    Ok(HttpResponse::Ok().json(leaves))
}

#[utoipa::path(
    get,
    path = "/api/leave/pending-count",
    responses(
        (status = 200, description = "Pending request count", body = Object, example = json!({
            "pending": 4
        })),
        (status = 403, description = "HR/Admin only")
    ),
    tag = "Leave",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn pending_count(
    auth: AuthUser,
    store: web::Data<dyn RecordStore>,
) -> Result<HttpResponse, AppError> {
    auth.require_hr_or_admin()?;
    let pending = store.count_leaves(&LeaveFilter::pending()).await?;
    Ok(HttpResponse::Ok().json(json!({ "pending": pending })))
}

/// Get leave by ID
#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "Leave request ID")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveRequest),
        (status = 403, description = "Neither HR nor the requesting employee"),
        (status = 404, description = "Leave request not found")
    ),
    tag = "Leave",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_leave(
    auth: AuthUser,
    store: web::Data<dyn RecordStore>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let leave = store.get_leave(path.into_inner()).await?;
    if !auth.is_hr() && auth.employee_id != Some(leave.employee_id) {
        return Err(AppError::Unauthorized("HR/Admin only".to_string()));
    }
    Ok(HttpResponse::Ok().json(leave))
}

/// Approve, reject or reopen a leave request
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/status",
    params(
        ("leave_id" = u64, Path, description = "Leave request ID")
    ),
    request_body = StatusUpdate,
    responses(
        (status = 200, description = "Status changed", body = LeaveRequest),
        (status = 400, description = "Unknown status"),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "Leave request not found")
    ),
    tag = "Leave",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_status(
    auth: AuthUser,
    store: web::Data<dyn RecordStore>,
    path: web::Path<u64>,
    body: web::Json<StatusUpdate>,
) -> Result<HttpResponse, AppError> {
    auth.require_hr_or_admin()?;
    let leave_id = path.into_inner();
    let status = parse_status(&body.status)?;

    let updated = transition_status(
        store.get_ref(),
        leave_id,
        status,
        auth.identity_id.as_deref(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(updated))
}

#[utoipa::path(
    delete,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "Leave request ID")
    ),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "Leave request not found")
    ),
    tag = "Leave",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_leave(
    auth: AuthUser,
    store: web::Data<dyn RecordStore>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    auth.require_hr_or_admin()?;
    let leave_id = path.into_inner();

    store
        .delete_leave(leave_id)
        .await
        .inspect_err(|e| error!(error = %e, leave_id, "Failed to delete leave request"))?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Successfully deleted"
    })))
}
