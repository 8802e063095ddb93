use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::ApiResponse;
use service::ServiceError;
use thiserror::Error;
use tracing::{error, warn};

use crate::auth::AuthError;
use crate::schemas::ErrorResponse;

/// Error returned by every handler, rendered as an [`ErrorResponse`].
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Result of a handler answering with the standard success envelope.
pub type ApiResult<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiError>;

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Auth(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::Service(ServiceError::Validation(_)) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::Service(ServiceError::Conflict(_)) => (StatusCode::BAD_REQUEST, "CONFLICT"),
            ApiError::Service(ServiceError::Forbidden(_)) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ApiError::Service(ServiceError::NotFound(_)) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Service(ServiceError::Database(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let detail = match &self {
            ApiError::Service(ServiceError::Database(db_error)) => {
                error!("Database error while handling request: {}", db_error);
                "Internal server error".to_string()
            }
            other => {
                warn!("Request failed with {}: {}", status, other);
                other.to_string()
            }
        };

        let body = ErrorResponse {
            detail,
            code: code.to_string(),
            success: false,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::DbErr;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::from(ServiceError::Validation("bad".into())), StatusCode::BAD_REQUEST),
            (ApiError::from(ServiceError::Conflict("dup".into())), StatusCode::BAD_REQUEST),
            (ApiError::from(ServiceError::Forbidden("no".into())), StatusCode::FORBIDDEN),
            (ApiError::from(ServiceError::NotFound("gone".into())), StatusCode::NOT_FOUND),
            (
                ApiError::from(ServiceError::Database(DbErr::Custom("boom".into()))),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (ApiError::from(AuthError::MissingToken), StatusCode::UNAUTHORIZED),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }
}
