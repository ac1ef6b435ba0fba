use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

use crate::leave::validation::FieldError;
use crate::store::{StoreError, StoreErrorKind};

#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or invalid input; the user can fix it right away.
    #[error(transparent)]
    Validation(#[from] FieldError),

    /// Malformed request outside the leave form.
    #[error("{0}")]
    Invalid(String),

    /// Identity mismatch or missing role; only HR can resolve it.
    #[error("{0}")]
    Unauthorized(String),

    #[error("record store call failed: {0}")]
    Persist(StoreError),

    #[error("{0}")]
    NotFound(String),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e.kind {
            StoreErrorKind::NotFound => AppError::NotFound(e.message),
            _ => AppError::Persist(e),
        }
    }
}

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) | AppError::Invalid(_) => "validation",
            AppError::Unauthorized(_) => "authorization",
            AppError::Persist(_) => "persist",
            AppError::NotFound(_) => "not_found",
        }
    }

    /// Text shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(e) => e.to_string(),
            AppError::Invalid(msg) | AppError::Unauthorized(msg) | AppError::NotFound(msg) => {
                msg.clone()
            }
            AppError::Persist(e) => match e.kind {
                StoreErrorKind::Permission => {
                    "Permission denied. Please contact HR if you continue to see this error."
                        .to_string()
                }
                StoreErrorKind::Network => {
                    "Network error. Please check your connection and try again.".to_string()
                }
                StoreErrorKind::Duplicate => {
                    "A record with these details already exists.".to_string()
                }
                StoreErrorKind::NotFound | StoreErrorKind::Other => e.message.clone(),
            },
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Invalid(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Persist(e) => match e.kind {
                StoreErrorKind::Permission => StatusCode::FORBIDDEN,
                StoreErrorKind::Network => StatusCode::SERVICE_UNAVAILABLE,
                StoreErrorKind::Duplicate => StatusCode::CONFLICT,
                StoreErrorKind::NotFound => StatusCode::NOT_FOUND,
                StoreErrorKind::Other => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "kind": self.kind(),
            "message": self.user_message(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_not_found_becomes_not_found() {
        let err = AppError::from(StoreError::not_found("employee", 3));
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn persist_messages_follow_the_error_kind() {
        let err = AppError::from(StoreError::new(StoreErrorKind::Duplicate, "Duplicate entry"));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.user_message(), "A record with these details already exists.");

        let err = AppError::from(StoreError::new(StoreErrorKind::Other, "disk full"));
        assert_eq!(err.user_message(), "disk full");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
