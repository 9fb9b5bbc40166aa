// responses/json.rs
use astra::{Body, ResponseBuilder};
use serde::Serialize;

use crate::errors::ServerError;
use crate::responses::ResultResp;

pub fn json_response<T: Serialize + ?Sized>(status: u16, value: &T) -> ResultResp {
    let body = serde_json::to_vec(value).map_err(|e| {
        tracing::error!(error = %e, "response serialization failed");
        ServerError::InternalError
    })?;

    ResponseBuilder::new()
        .status(status)
        .header("Content-Type", mime::APPLICATION_JSON.as_ref())
        .body(Body::from(body))
        .map_err(|_| ServerError::InternalError)
}

pub fn ok_json<T: Serialize + ?Sized>(value: &T) -> ResultResp {
    json_response(200, value)
}

pub fn created_json<T: Serialize + ?Sized>(value: &T) -> ResultResp {
    json_response(201, value)
}

/// `{"message": ...}` acknowledgement.
pub fn message_json(message: &str) -> ResultResp {
    ok_json(&serde_json::json!({ "message": message }))
}
