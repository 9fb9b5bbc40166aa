// api/mod.rs
//
// JSON handlers behind the router. Each submodule owns one resource family;
// the helpers here read request bodies, query strings and path ids.
pub mod admin;
pub mod auth;
pub mod cari;
pub mod company;
pub mod dashboard;
pub mod notifications;
pub mod pricing;
pub mod reference;
pub mod reports;
pub mod reservations;
pub mod transactions;

use astra::Request;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::io::Read;
use std::str::FromStr;

use crate::domain::validation::FieldError;
use crate::errors::ServerError;

const MAX_BODY_BYTES: u64 = 1024 * 1024;

fn read_body(req: &mut Request) -> Result<Vec<u8>, ServerError> {
    let mut buf = Vec::new();
    req.body_mut()
        .reader()
        .take(MAX_BODY_BYTES)
        .read_to_end(&mut buf)
        .map_err(|e| ServerError::BadRequest(format!("unreadable request body: {e}")))?;
    Ok(buf)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ServerError> {
    serde_json::from_slice(bytes).map_err(|e| {
        if e.is_data() {
            ServerError::Validation(vec![FieldError {
                loc: vec!["body".to_string()],
                msg: e.to_string(),
                kind: "type_error".to_string(),
            }])
        } else {
            ServerError::BadRequest(format!("invalid JSON body: {e}"))
        }
    })
}

/// Decodes a required JSON body. Shape mismatches become 422 so clients see
/// them like any other validation failure.
pub fn read_json<T: DeserializeOwned>(req: &mut Request) -> Result<T, ServerError> {
    let bytes = read_body(req)?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(ServerError::BadRequest("request body required".into()));
    }
    decode(&bytes)
}

/// Like [`read_json`], but an empty body yields `T::default()`.
pub fn read_json_or_default<T: DeserializeOwned + Default>(
    req: &mut Request,
) -> Result<T, ServerError> {
    let bytes = read_body(req)?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    decode(&bytes)
}

/// Decoded query string.
#[derive(Debug, Default)]
pub struct Query(HashMap<String, String>);

impl Query {
    pub fn from_request(req: &Request) -> Self {
        let map = req
            .uri()
            .query()
            .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();
        Query(map)
    }

    /// Non-blank value for `key`.
    pub fn text(&self, key: &str) -> Option<String> {
        self.0
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    pub fn parse<T: FromStr>(&self, key: &str) -> Result<Option<T>, ServerError> {
        match self.text(key) {
            None => Ok(None),
            Some(raw) => raw.parse().map(Some).map_err(|_| {
                ServerError::Validation(vec![FieldError {
                    loc: vec!["query".to_string(), key.to_string()],
                    msg: format!("invalid value '{raw}'"),
                    kind: "value_error".to_string(),
                }])
            }),
        }
    }

    /// ISO date parameter, validated.
    pub fn date(&self, key: &str) -> Result<Option<String>, ServerError> {
        Ok(self.parse::<chrono::NaiveDate>(key)?.map(|d| d.format("%Y-%m-%d").to_string()))
    }

    pub fn flag(&self, key: &str) -> bool {
        matches!(self.text(key).as_deref(), Some("true" | "1" | "yes"))
    }
}

/// Numeric id from a path segment.
pub fn path_id(segment: &str) -> Result<i64, ServerError> {
    segment
        .parse()
        .map_err(|_| ServerError::NotFound(format!("no resource at id '{segment}'")))
}
