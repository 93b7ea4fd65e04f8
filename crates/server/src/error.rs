use axum::extract::rejection::{FormRejection, JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Wrong email/password entered")]
    BadCredentials,
    #[error("Password mismatch")]
    PasswordMismatch,
    #[error("only the owner can do that")]
    Forbidden,
    #[error("Too many attempts, try again later")]
    Throttled,
    #[error("{0}")]
    Malformed(String),
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("internal error: {0}")]
    Internal(String),
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

#[derive(Clone, Debug, Error)]
pub enum ValidationError {
    #[error("input value is invalid: `{value}`, reason: {reason}")]
    InvalidInput { value: String, reason: String },
    #[error("Email should be in the right format example@example.com")]
    InvalidEmail,
    #[error("Email already exists")]
    EmailTaken,
    #[error("limit exceeded for {subject}, allowed {limit} {unit}(s), got {attempted}")]
    LimitExceeded {
        subject: String,
        unit: String,
        attempted: usize,
        limit: usize,
    },
    #[error("requested object doesn't exist or the caller doesn't have access")]
    NotFound,
}

/// Body shape the browser scripts look for: `{ "err": "..." }`.
fn err_response(status: StatusCode, err: String) -> Response {
    (status, Json(json!({ "err": err }))).into_response()
}

impl RequestError {
    /// Status and user-facing message. Internal details are logged, not returned.
    pub fn status_and_message(self) -> (StatusCode, String) {
        match self {
            Self::Sqlx(e) => match e {
                sqlx::Error::RowNotFound => (StatusCode::NOT_FOUND, "not found".into()),
                e => {
                    error!("received internal error for user request: {e}");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Something went wrong".into(),
                    )
                }
            },
            Self::Internal(e) => {
                error!("received internal error for user request: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong".into(),
                )
            }
            Self::Validation(e) => {
                let status = match e {
                    ValidationError::EmailTaken => StatusCode::CONFLICT,
                    ValidationError::NotFound => StatusCode::NOT_FOUND,
                    _ => StatusCode::BAD_REQUEST,
                };
                (status, e.to_string())
            }
            e @ (Self::BadCredentials | Self::PasswordMismatch) => {
                (StatusCode::UNAUTHORIZED, e.to_string())
            }
            e @ Self::Forbidden => (StatusCode::FORBIDDEN, e.to_string()),
            e @ Self::Throttled => (StatusCode::TOO_MANY_REQUESTS, e.to_string()),
            Self::Malformed(e) => (StatusCode::BAD_REQUEST, e),
        }
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        let (status, err) = self.status_and_message();
        err_response(status, err)
    }
}

impl From<JsonRejection> for RequestError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Malformed(rejection.body_text())
    }
}

impl From<FormRejection> for RequestError {
    fn from(rejection: FormRejection) -> Self {
        Self::Malformed(rejection.body_text())
    }
}

impl From<QueryRejection> for RequestError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Malformed(rejection.body_text())
    }
}

impl From<PathRejection> for RequestError {
    fn from(rejection: PathRejection) -> Self {
        Self::Malformed(rejection.body_text())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionError {
    BadToken,
    TokenNotFound,
    TokenExpired,
    Internal,
}

impl From<sqlx::Error> for SessionError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => Self::TokenNotFound,
            e => {
                error!("failed to resolve session: {e}");
                Self::Internal
            }
        }
    }
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let (status, err) = match self {
            Self::BadToken => (StatusCode::UNAUTHORIZED, "Please log in first"),
            Self::TokenNotFound => (StatusCode::UNAUTHORIZED, "Session cannot be found"),
            Self::TokenExpired => (StatusCode::UNAUTHORIZED, "Session has expired"),
            Self::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong"),
        };
        err_response(status, err.to_string())
    }
}
