use axum::{
    http::StatusCode,
    response::{IntoResponse, Json as RespJson, Response},
};
use serde_json::json;

/// Error taxonomy for the REST surface. Every variant maps to one HTTP
/// status and a `{"message": ...}` body.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    TooManyRequests(String),

    /// Anything unexpected. The source is logged server-side; the client
    /// only ever sees a generic message.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        Self::Internal(err.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            ApiError::Internal(detail) => {
                tracing::error!("request failed: {detail}");
                "Internal server error has occured".to_string()
            }
            other => other.to_string(),
        };

        (self.status(), RespJson(json!({ "message": message }))).into_response()
    }
}

impl From<crate::repo::RepoError> for ApiError {
    fn from(err: crate::repo::RepoError) -> Self {
        match err {
            crate::repo::RepoError::Duplicate => {
                ApiError::Conflict("Account number or ID number already exists".into())
            }
            crate::repo::RepoError::Backend(detail) => ApiError::Internal(detail),
        }
    }
}

impl From<crate::security::cipher::CipherError> for ApiError {
    fn from(err: crate::security::cipher::CipherError) -> Self {
        // Cipher failures never leak their cause to the client.
        ApiError::Internal(err.to_string())
    }
}

impl From<bcrypt::BcryptError> for ApiError {
    fn from(err: bcrypt::BcryptError) -> Self {
        ApiError::Internal(err.to_string())
    }
}
