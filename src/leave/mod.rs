//! Leave request lifecycle: validation and duration, identity-checked
//! submission, and the unguarded status transition.

pub mod board;
pub mod submission;
pub mod transition;
pub mod validation;

pub use board::{LeaveBoard, LeaveRow, StatusCounts};
pub use submission::{authorize_submission, resolve_target_employee, submit_leave_request};
pub use transition::transition_status;
pub use validation::{
    FieldError, LeaveForm, ValidatedLeave, compute_duration, validate_and_compute_duration,
};
