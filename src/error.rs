use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::calc::CalcError;
use crate::store::StoreError;
use crate::utils::{error_codes, error_to_api_response};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Calc(#[from] CalcError),
    #[error("user {0} not found")]
    UserNotFound(i64),
    #[error("email already used")]
    EmailAlreadyUsed,
    #[error("wrong email or password")]
    InvalidCredentials,
    #[error("no calculation found")]
    NoCalculations,
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UserNotFound(id) => AppError::UserNotFound(id),
            StoreError::EmailAlreadyUsed => AppError::EmailAlreadyUsed,
            other => AppError::Store(other),
        }
    }
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, i32) {
        match self {
            AppError::Calc(_) => (StatusCode::BAD_REQUEST, error_codes::CALCULATION_ERROR),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, error_codes::VALIDATION_ERROR),
            AppError::UserNotFound(_) | AppError::NoCalculations => {
                (StatusCode::NOT_FOUND, error_codes::NOT_FOUND)
            }
            AppError::EmailAlreadyUsed => (StatusCode::CONFLICT, error_codes::EMAIL_EXISTS),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, error_codes::AUTH_FAILED),
            AppError::Store(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_codes::INTERNAL_ERROR,
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let msg = match &self {
            AppError::Store(e) => {
                tracing::error!("Store failure: {}", e);
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, error_to_api_response::<()>(code, msg)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_store_errors_to_domain_errors() {
        assert!(matches!(
            AppError::from(StoreError::UserNotFound(3)),
            AppError::UserNotFound(3)
        ));
        assert!(matches!(
            AppError::from(StoreError::EmailAlreadyUsed),
            AppError::EmailAlreadyUsed
        ));
    }

    #[test]
    fn statuses() {
        let status = |e: AppError| e.into_response().status();
        assert_eq!(status(CalcError::DivisionByZero.into()), StatusCode::BAD_REQUEST);
        assert_eq!(status(AppError::UserNotFound(1)), StatusCode::NOT_FOUND);
        assert_eq!(status(AppError::EmailAlreadyUsed), StatusCode::CONFLICT);
        assert_eq!(status(AppError::InvalidCredentials), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status(AppError::Store(StoreError::Database(sqlx::Error::PoolTimedOut))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
