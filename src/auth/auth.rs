use crate::{error::AppError, model::role::Role, models::Claims};
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, error::ErrorUnauthorized};
use futures::future::{Ready, ready};

/// Acting identity for the current request, inserted by `auth_middleware`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Identity id; `None` when the provider sent an empty subject
    pub identity_id: Option<String>,
    pub email: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
}

impl AuthUser {
    pub fn from_claims(claims: Claims) -> Option<Self> {
        let role = Role::from_id(claims.role)?;
        Some(AuthUser {
            identity_id: Some(claims.sub).filter(|s| !s.is_empty()),
            email: claims.email,
            role,
            employee_id: claims.employee_id,
        })
    }

    pub fn is_hr(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Hr)
    }

    pub fn require_hr_or_admin(&self) -> Result<(), AppError> {
        if self.is_hr() {
            Ok(())
        } else {
            Err(AppError::Unauthorized("HR/Admin only".to_string()))
        }
    }
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthUser>() {
            Some(user) => ready(Ok(user.clone())),
            None => ready(Err(ErrorUnauthorized("Missing token"))),
        }
    }
}
