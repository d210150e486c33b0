use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::{guard, roster::RosterError, session::SessionError};

/// ValidationError
///
/// A form field that failed its client-side check. Never reaches the backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new<M: Into<String>>(field: &str, message: M) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// ApiError
///
/// Every way a call to the gym backend can fail, already classified the way the console
/// reacts to it.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Backend answered 401. The session it was issued under has been cleared.
    #[error("session expired or invalid")]
    Unauthorized,

    /// The login endpoint rejected the credentials.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// A protected call was attempted without a session.
    #[error("no active session")]
    NoSession,

    #[error("permission denied: {message}")]
    Forbidden { message: String },

    #[error("not found: {message}")]
    NotFound { message: String },

    #[error("backend returned {status}: {message}")]
    Failed { status: u16, message: String },

    #[error("cannot reach the backend: {0}")]
    Connectivity(String),

    #[error("unexpected backend payload: {0}")]
    Decode(String),

    /// The session changed while the request was in flight; the response was dropped.
    #[error("response discarded: session changed while the request was in flight")]
    Stale,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Roster(#[from] RosterError),

    #[error("session storage failure: {0}")]
    Session(#[from] SessionError),
}

impl ApiError {
    /// The message shown inline on the screen that triggered the call.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Unauthorized | ApiError::NoSession => {
                "Your session has expired. Please log in again.".to_string()
            }
            ApiError::InvalidCredentials => "Invalid username or password.".to_string(),
            ApiError::Forbidden { message } => {
                format!("You do not have permission to do this: {message}")
            }
            ApiError::NotFound { message } | ApiError::Failed { message, .. } => {
                format!("The operation failed: {message}")
            }
            ApiError::Connectivity(_) => {
                "Could not connect to the server. Check your connection and retry.".to_string()
            }
            ApiError::Decode(_) => "The server sent an unexpected response.".to_string(),
            ApiError::Stale => "The session changed; reload the screen.".to_string(),
            ApiError::Validation(err) => err.to_string(),
            ApiError::Roster(err) => err.to_string(),
            ApiError::Session(_) => "Could not update the stored session.".to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized | ApiError::NoSession => StatusCode::SEE_OTHER,
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Failed { .. } | ApiError::Decode(_) => StatusCode::BAD_GATEWAY,
            ApiError::Connectivity(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Stale | ApiError::Roster(_) => StatusCode::CONFLICT,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Authentication failures become a forced navigation to the login screen; everything
/// else is rendered as an inline, dismissible message.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized | ApiError::NoSession => {
                guard::redirect_response(guard::LOGIN_PATH, true)
            }
            other => {
                if let ApiError::Session(err) = &other {
                    tracing::error!(error = %err, "session storage failure");
                }
                let body = Json(json!({
                    "error": other.user_message(),
                    "detail": other.to_string(),
                }));
                (other.status_code(), body).into_response()
            }
        }
    }
}
