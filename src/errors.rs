// errors.rs
use astra::Response;
use thiserror::Error;

use crate::domain::validation::{describe, FieldError};

/// Errors originating from either the server logic
/// (routing, missing resources, auth, validation) or downstream layers (DB, xlsx, rate feed).
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{0}")]
    NotFound(String),
    #[error("Bad Request: {0}")]
    BadRequest(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Validation failed: {}", describe(.0))]
    Validation(Vec<FieldError>),
    #[error("Database Error: {0}")]
    DbError(String),
    #[error("Spreadsheet Error: {0}")]
    XlsxError(String),
    #[error("Upstream Error: {0}")]
    Upstream(String),
    #[error("Internal Server Error")]
    InternalError,
}

impl ServerError {
    pub fn not_found(what: &str) -> Self {
        ServerError::NotFound(format!("{what} not found"))
    }

    pub fn status(&self) -> u16 {
        match self {
            ServerError::NotFound(_) => 404,
            ServerError::BadRequest(_) => 400,
            ServerError::Unauthorized(_) => 401,
            ServerError::Forbidden(_) => 403,
            ServerError::Conflict(_) => 409,
            ServerError::Validation(_) => 422,
            ServerError::Upstream(_) => 502,
            ServerError::DbError(_) | ServerError::XlsxError(_) | ServerError::InternalError => 500,
        }
    }
}

impl From<Vec<FieldError>> for ServerError {
    fn from(errors: Vec<FieldError>) -> Self {
        ServerError::Validation(errors)
    }
}

// Type alias commonly used by route handlers.
pub type ResultResp = Result<Response, ServerError>;
