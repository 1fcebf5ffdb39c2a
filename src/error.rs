/// Error Handling Module
///
/// One error type for the whole service and its mapping onto HTTP responses.
/// Validation, duplicate and credential failures become `{ "message": ... }`
/// JSON bodies; token failures become short plain-text bodies; anything coming
/// from the stores or the crypto layer is logged and reported as an opaque 500.

use actix_web::{error::JsonPayloadError, http::StatusCode, HttpRequest, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

use crate::validators::ValidationErrors;

/// Message shared by every failed login, whatever the reason
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Email or password is wrong.";

/// Unique user attribute that collided on registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DuplicateField {
    #[error("Username taken.")]
    Username,
    #[error("Email already registered")]
    Email,
}

/// Token-related failures, split by what the client presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No credential presented at all
    #[error("Unauthorized")]
    Unauthenticated,
    /// Credential present but not (or no longer) accepted
    #[error("Forbidden token")]
    Forbidden,
    /// Signature, shape or expiry check failed
    #[error("Invalid token")]
    InvalidToken,
}

/// Failures reported by the persistence collaborators
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Duplicate(DuplicateField),
    #[error("store backend failure: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(#[from] ValidationErrors),
    #[error("{0}")]
    Duplicate(DuplicateField),
    #[error("{}", INVALID_CREDENTIALS_MESSAGE)]
    InvalidCredentials,
    #[error("{0}")]
    Auth(#[from] AuthError),
    #[error("Only the author of a status can change it.")]
    NotAuthor,
    #[error("No entry found")]
    NotFound,
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(field) => AppError::Duplicate(field),
            StoreError::Backend(msg) => AppError::Persistence(msg),
        }
    }
}

#[derive(Debug, Serialize)]
struct MessageBody<'a> {
    message: &'a str,
}

#[derive(Debug, Serialize)]
struct NotFoundBody<'a> {
    error: &'a str,
    message: &'a str,
}

impl AppError {
    fn log(&self, error_id: &str) {
        match self {
            AppError::Validation(_) | AppError::Duplicate(_) => {
                tracing::info!(error_id = error_id, error = %self, "Rejected input");
            }
            AppError::InvalidCredentials => {
                tracing::warn!(error_id = error_id, "Invalid credentials attempt");
            }
            AppError::Auth(e) => {
                tracing::warn!(error_id = error_id, error = %e, "Authentication error");
            }
            AppError::NotAuthor | AppError::NotFound => {
                tracing::info!(error_id = error_id, error = %self, "Status request rejected");
            }
            AppError::Persistence(_) | AppError::Config(_) | AppError::Internal(_) => {
                tracing::error!(error_id = error_id, error = %self, "Request failed");
            }
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidCredentials => StatusCode::BAD_REQUEST,
            AppError::Duplicate(_) => StatusCode::CONFLICT,
            AppError::Auth(AuthError::Unauthenticated) => StatusCode::UNAUTHORIZED,
            AppError::Auth(AuthError::Forbidden) | AppError::NotAuthor => StatusCode::FORBIDDEN,
            AppError::Auth(AuthError::InvalidToken) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Persistence(_) | AppError::Config(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error_id = uuid::Uuid::new_v4().to_string();
        self.log(&error_id);

        let mut response = HttpResponse::build(self.status_code());
        match self {
            AppError::Validation(errors) => response.json(MessageBody {
                message: errors.message(),
            }),
            AppError::Duplicate(_) | AppError::InvalidCredentials | AppError::NotAuthor => {
                let message = self.to_string();
                response.json(MessageBody { message: &message })
            }
            AppError::Auth(e) => response
                .content_type("text/plain; charset=utf-8")
                .body(e.to_string()),
            AppError::NotFound => response.json(NotFoundBody {
                error: "404 Not Found",
                message: "No entry found",
            }),
            AppError::Persistence(_) | AppError::Config(_) | AppError::Internal(_) => {
                response.json(MessageBody {
                    message: "Internal server error",
                })
            }
        }
    }
}

/// Turns body deserialization failures into the same `{ message }` shape the
/// validator produces.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let message = match &err {
        JsonPayloadError::ContentType => "Request body must be JSON.".to_string(),
        JsonPayloadError::Deserialize(e) => format!("Invalid request body: {}", e),
        other => format!("Invalid request body: {}", other),
    };
    AppError::Validation(ValidationErrors::single("body", message)).into()
}

/// Per-operation context attached to log events
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub request_id: String,
    pub user_id: Option<String>,
    pub operation: String,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            user_id: None,
            operation: operation.into(),
        }
    }

    pub fn with_user_id(mut self, user_id: String) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Logs a failed operation with its context and hands the error back.
    pub fn record(&self, error: AppError) -> AppError {
        tracing::debug!(
            request_id = %self.request_id,
            operation = %self.operation,
            user_id = ?self.user_id,
            error = %error,
            "Operation failed"
        );
        error
    }
}
