use chrono::Utc;
use tracing::info;

use crate::error::AppError;
use crate::model::leave_request::{LeaveRequest, LeaveReview, LeaveStatus};
use crate::store::RecordStore;

/// Direct overwrite of status, reviewer and review time. Any status may
/// follow any other, including reopening a decided request as Pending.
pub async fn transition_status(
    store: &dyn RecordStore,
    leave_id: u64,
    status: LeaveStatus,
    reviewer: Option<&str>,
) -> Result<LeaveRequest, AppError> {
    let review = LeaveReview {
        status,
        reviewed_by: reviewer.map(str::to_string),
        reviewed_at: Utc::now(),
    };

    let updated = store.review_leave(leave_id, review).await?;
    info!(leave_id, status = %updated.status, reviewer, "Leave status changed");
    Ok(updated)
}
