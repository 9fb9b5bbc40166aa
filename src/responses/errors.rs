use astra::{Body, Response, ResponseBuilder};
use serde_json::json;

use crate::errors::ServerError;

/// Convert a ServerError into a JSON error response.
///
/// Validation failures keep their field list under `detail`; every other
/// error carries a single message string.
pub fn error_to_response(err: ServerError) -> Response {
    let status = err.status();
    if status >= 500 {
        tracing::error!(status, error = %err, "request failed");
    } else {
        tracing::warn!(status, error = %err, "request rejected");
    }

    let body = match &err {
        ServerError::Validation(errors) => json!({ "detail": errors }),
        ServerError::NotFound(msg)
        | ServerError::BadRequest(msg)
        | ServerError::Unauthorized(msg)
        | ServerError::Forbidden(msg)
        | ServerError::Conflict(msg) => json!({ "detail": msg }),
        ServerError::Upstream(_) => json!({ "detail": "upstream service unavailable" }),
        ServerError::DbError(_) | ServerError::XlsxError(_) | ServerError::InternalError => {
            json!({ "detail": "Internal Server Error" })
        }
    };

    json_error_response(status, &body.to_string())
}

/// Build a raw JSON error response. Falls back to a bare 500 if the builder
/// rejects the status.
pub fn json_error_response(status: u16, body: &str) -> Response {
    ResponseBuilder::new()
        .status(status)
        .header("Content-Type", mime::APPLICATION_JSON.as_ref())
        .body(Body::from(body.to_string()))
        .unwrap_or_else(|_| {
            let mut resp = Response::new(Body::from("{\"detail\":\"Internal Server Error\"}"));
            *resp.status_mut() = http::StatusCode::INTERNAL_SERVER_ERROR;
            resp
        })
}
