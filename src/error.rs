use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use axum_valid::{ValidRejection, ValidationRejection};
use compute::{ComputeError, ErrorKind};
use std::fmt::Display;
use thiserror::Error;
use tracing::error;

use crate::schemas::ErrorResponse;

/// Error returned by every handler.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Compute(#[from] ComputeError),
}

impl From<sea_orm::DbErr> for ApiError {
    fn from(err: sea_orm::DbErr) -> Self {
        ApiError::Compute(ComputeError::Database(err))
    }
}

/// Undecodable or invalid request input from the `axum-valid` extractors.
impl<E: Display> From<ValidRejection<E>> for ApiError {
    fn from(rejection: ValidRejection<E>) -> Self {
        match rejection {
            ValidationRejection::Valid(errors) => ApiError::invalid_input(errors.to_string()),
            ValidationRejection::Inner(inner) => ApiError::invalid_input(inner.to_string()),
        }
    }
}

impl ApiError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        ApiError::Compute(ComputeError::InvalidInput(message.into()))
    }

    pub fn status(&self) -> StatusCode {
        let ApiError::Compute(err) = self;
        match err.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let ApiError::Compute(err) = &self;

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = %err, "Request failed with an internal error");
            "Internal server error".to_string()
        } else {
            err.to_string()
        };

        let body = ErrorResponse {
            error: message,
            code: err.code().to_string(),
            success: false,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ComputeError::AccountNotFound("1".into()), StatusCode::NOT_FOUND),
            (ComputeError::InvalidAmount, StatusCode::BAD_REQUEST),
            (
                ComputeError::InsufficientFunds {
                    balance: Decimal::ZERO,
                    requested: Decimal::ONE,
                },
                StatusCode::BAD_REQUEST,
            ),
            (ComputeError::InvalidCredentials, StatusCode::BAD_REQUEST),
            (ComputeError::AccountInactive("A".into()), StatusCode::CONFLICT),
            (ComputeError::DuplicateAccountNumber("A".into()), StatusCode::CONFLICT),
            (
                ComputeError::Database(sea_orm::DbErr::Custom("x".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn test_rejected_input_maps_to_invalid_input() {
        let rejection: ValidRejection<String> =
            ValidationRejection::Inner("missing field `accountId`".to_string());
        let err = ApiError::from(rejection);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        let ApiError::Compute(inner) = &err;
        assert_eq!(inner.code(), "INVALID_INPUT");
        assert!(inner.to_string().contains("accountId"));
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let response =
            ApiError::from(sea_orm::DbErr::Custom("secret table".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
