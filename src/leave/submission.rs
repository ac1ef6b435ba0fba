use tracing::{info, warn};

use super::validation::{LeaveForm, validate_and_compute_duration};
use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::model::{
    employee::Employee,
    leave_request::{LeaveRequest, LeaveStatus, NewLeaveRequest},
};
use crate::store::{RecordStore, StoreErrorKind};

const IDENTITY_MISMATCH: &str = "Employee record does not match your account. Please contact HR.";
const EMPLOYEE_NOT_FOUND: &str =
    "Employee record not found. Please contact HR to add your employee details.";

/// A target with no linked identity is "not yet linked" and allowed.
pub fn authorize_submission(acting: &AuthUser, target: &Employee) -> Result<(), AppError> {
    match (target.profile_id.as_deref(), acting.identity_id.as_deref()) {
        (Some(linked), Some(own)) if linked != own => {
            warn!(
                employee_id = target.id,
                linked, own, "Leave submission identity mismatch"
            );
            Err(AppError::Unauthorized(IDENTITY_MISMATCH.to_string()))
        }
        _ => Ok(()),
    }
}

/// The employee record a self-service request is filed against: the linked
/// employee id from the token, else the record carrying the acting email.
pub async fn resolve_target_employee(
    store: &dyn RecordStore,
    acting: &AuthUser,
) -> Result<Employee, AppError> {
    let found = match acting.employee_id {
        Some(id) => match store.get_employee(id).await {
            Ok(employee) => Some(employee),
            Err(e) if e.kind == StoreErrorKind::NotFound => None,
            Err(e) => return Err(AppError::Persist(e)),
        },
        None => store.find_employee_by_email(&acting.email).await?,
    };

    found.ok_or_else(|| AppError::NotFound(EMPLOYEE_NOT_FOUND.to_string()))
}

/// Validate, authorize, then insert exactly once with status Pending.
/// Nothing is written when any step fails.
pub async fn submit_leave_request(
    store: &dyn RecordStore,
    form: &LeaveForm,
    acting: &AuthUser,
    target: &Employee,
) -> Result<LeaveRequest, AppError> {
    let valid = validate_and_compute_duration(form)?;
    authorize_submission(acting, target)?;

    let record = NewLeaveRequest {
        employee_id: target.id,
        leave_type: valid.leave_type,
        start_date: valid.start_date,
        end_date: valid.end_date,
        duration: valid.duration,
        reason: valid.reason,
        status: LeaveStatus::Pending,
    };

    let created = store.insert_leave(record).await?;
    info!(
        leave_id = created.id,
        employee_id = created.employee_id,
        duration = created.duration,
        "Leave request submitted"
    );
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leave::validation::FieldError;
    use crate::model::employee::{EmployeeStatus, NewEmployee};
    use crate::model::leave_request::{LeaveFilter, LeaveType};
    use crate::model::role::Role;
    use crate::store::{MemoryStore, StoreError};
    use chrono::NaiveDate;

    fn acting(identity: Option<&str>) -> AuthUser {
        AuthUser {
            identity_id: identity.map(str::to_string),
            email: "jane@corp.io".to_string(),
            role: Role::Employee,
            employee_id: None,
        }
    }

    fn form() -> LeaveForm {
        LeaveForm {
            leave_type: Some("Sick Leave".to_string()),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 3),
            reason: Some(" flu ".to_string()),
        }
    }

    async fn seed(store: &MemoryStore, profile_id: Option<&str>) -> Employee {
        store
            .insert_employee(NewEmployee {
                employee_code: "EMP001".to_string(),
                name: "Jane Doe".to_string(),
                email: "jane@corp.io".to_string(),
                phone: None,
                department: None,
                designation: None,
                date_of_joining: None,
                status: EmployeeStatus::Active,
                profile_id: profile_id.map(str::to_string),
            })
            .await
            .unwrap()
    }

    async fn stored(store: &MemoryStore) -> i64 {
        store.count_leaves(&LeaveFilter::default()).await.unwrap()
    }

    #[actix_web::test]
    async fn unlinked_employee_may_submit_once_as_pending() {
        let store = MemoryStore::new();
        let target = seed(&store, None).await;

        let created = submit_leave_request(&store, &form(), &acting(Some("auth-9")), &target)
            .await
            .unwrap();

        assert_eq!(created.status, LeaveStatus::Pending);
        assert_eq!(created.leave_type, LeaveType::Sick);
        assert_eq!(created.duration, 3);
        assert_eq!(created.reason, "flu");
        assert_eq!(created.employee_id, target.id);
        assert_eq!(stored(&store).await, 1);
    }

    #[actix_web::test]
    async fn identity_mismatch_is_refused_without_insert() {
        let store = MemoryStore::new();
        let target = seed(&store, Some("auth-1")).await;

        let err = submit_leave_request(&store, &form(), &acting(Some("auth-2")), &target)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Unauthorized(_)));
        assert!(err.user_message().contains("contact HR"));
        assert_eq!(stored(&store).await, 0);
    }

    #[actix_web::test]
    async fn matching_or_unknown_identity_is_allowed() {
        let store = MemoryStore::new();
        let target = seed(&store, Some("auth-1")).await;

        assert!(authorize_submission(&acting(Some("auth-1")), &target).is_ok());
        assert!(authorize_submission(&acting(None), &target).is_ok());
    }

    #[actix_web::test]
    async fn validation_failure_skips_authorization_and_insert() {
        let store = MemoryStore::new();
        let target = seed(&store, Some("auth-1")).await;
        let bad = LeaveForm {
            reason: Some("   ".to_string()),
            ..form()
        };

        let err = submit_leave_request(&store, &bad, &acting(Some("auth-2")), &target)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(FieldError::MissingReason)));
        assert_eq!(stored(&store).await, 0);
    }

    #[actix_web::test]
    async fn store_failure_surfaces_as_persist_error() {
        let store = MemoryStore::new();
        let target = seed(&store, None).await;
        store.fail_next_write(StoreError::classified("permission denied for table leave_requests"));

        let err = submit_leave_request(&store, &form(), &acting(None), &target)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Persist(_)));
        assert!(err.user_message().starts_with("Permission denied"));
    }

    #[actix_web::test]
    async fn target_resolves_by_employee_id_then_email() {
        let store = MemoryStore::new();
        let jane = seed(&store, None).await;

        let by_email = resolve_target_employee(&store, &acting(None)).await.unwrap();
        assert_eq!(by_email.id, jane.id);

        let mut linked = acting(None);
        linked.employee_id = Some(jane.id);
        linked.email = "someone-else@corp.io".to_string();
        assert_eq!(resolve_target_employee(&store, &linked).await.unwrap().id, jane.id);

        let mut stranger = acting(None);
        stranger.email = "nobody@corp.io".to_string();
        let err = resolve_target_employee(&store, &stranger).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
