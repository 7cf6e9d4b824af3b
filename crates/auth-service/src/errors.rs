use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Corrupted input payload")]
    InvalidInput,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("User already exists")]
    UserExists,

    #[error("User not found")]
    UserNotFound,

    #[error("Internal server error")]
    Internal,
}

/// Boundary error body. Always a flat `{"error": <message>}` so clients
/// never see store-internal detail.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AuthError::Database(_) | AuthError::Cache(_) | AuthError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".to_string(),
            ),
            AuthError::InvalidInput => (
                StatusCode::BAD_REQUEST,
                "corrupted input payload".to_string(),
            ),
            AuthError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "invalid credentials".to_string())
            }
            AuthError::InvalidToken(reason) => (StatusCode::UNAUTHORIZED, reason.clone()),
            AuthError::UserExists => (StatusCode::CONFLICT, "user already exists".to_string()),
            AuthError::UserNotFound => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "user not found".to_string(),
            ),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn status_of(err: AuthError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_of(AuthError::InvalidInput),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AuthError::InvalidCredentials),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(AuthError::InvalidToken("token expired".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(status_of(AuthError::UserExists), StatusCode::CONFLICT);
        assert_eq!(
            status_of(AuthError::UserNotFound),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(AuthError::Database("connection refused".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(status_of(AuthError::Internal), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_internal_detail_not_leaked() {
        // Database/cache detail stays in logs, never in the response body
        let err = AuthError::Database("password authentication failed for host".to_string());
        assert!(err.to_string().contains("password"));

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
