// client/http.rs
//
// Bearer-token JSON client for the back-office API. Requests go through a
// `Transport` so the same client can talk HTTP or stay in process.
use http::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::validation::{describe, FieldError};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// e.g. `http://127.0.0.1:3000/api`
    pub base_url: String,
    #[serde(with = "secs")]
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000/api".to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

mod secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    #[error("validation failed: {}", describe(.0))]
    Validation(Vec<FieldError>),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// No response at all: refused, unreachable or timed out.
    #[error("network error: {0}")]
    Network(String),
    #[error("server returned {status}: {detail}")]
    Server { status: u16, detail: String },
    #[error("unreadable response: {0}")]
    Decode(String),
    #[error("invalid client configuration: {0}")]
    Config(String),
}

#[derive(Deserialize)]
struct DetailList {
    detail: Vec<FieldError>,
}

#[derive(Deserialize)]
struct DetailText {
    detail: String,
}

impl ApiError {
    /// Classifies a non-2xx response by status and `detail` body.
    pub fn from_status(status: u16, body: &[u8]) -> Self {
        let text = || match serde_json::from_slice::<DetailText>(body) {
            Ok(d) => d.detail,
            Err(_) => String::from_utf8_lossy(body).trim().to_string(),
        };
        match status {
            401 => ApiError::Unauthorized(text()),
            403 => ApiError::Forbidden(text()),
            422 => match serde_json::from_slice::<DetailList>(body) {
                Ok(list) => ApiError::Validation(list.detail),
                Err(_) => ApiError::Server {
                    status,
                    detail: text(),
                },
            },
            _ => ApiError::Server {
                status,
                detail: text(),
            },
        }
    }

    /// Toast text for the user.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Validation(errors) => describe(errors),
            ApiError::Unauthorized(_) => "Oturum süreniz dolmuş. Lütfen tekrar giriş yapın".to_string(),
            ApiError::Forbidden(_) => "Bu işlem için yetkiniz yok".to_string(),
            ApiError::Network(_) => {
                "Backend bağlantısı yapılamadı! Backend'in çalıştığından emin olun.".to_string()
            }
            ApiError::Server { detail, .. } if !detail.is_empty() => detail.clone(),
            ApiError::Server { .. } | ApiError::Decode(_) | ApiError::Config(_) => {
                "Beklenmeyen bir hata oluştu".to_string()
            }
        }
    }

    /// The caller should be sent back to the login screen.
    pub fn needs_login(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

pub trait Transport: Send + Sync {
    fn send(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Vec<u8>>,
    ) -> Result<RawResponse, ApiError>;
}

/// Blocking HTTP transport. No retries.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let base = url::Url::parse(&config.base_url)
            .map_err(|e| ApiError::Config(format!("base url {}: {e}", config.base_url)))?;
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::Config(format!("http client: {e}")))?;
        Ok(Self {
            client,
            base_url: base.as_str().trim_end_matches('/').to_string(),
        })
    }
}

impl Transport for HttpTransport {
    fn send(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Vec<u8>>,
    ) -> Result<RawResponse, ApiError> {
        let method = reqwest::Method::from_bytes(method.as_str().as_bytes())
            .map_err(|e| ApiError::Config(format!("method: {e}")))?;
        let mut request = self
            .client
            .request(method, format!("{}{path}", self.base_url));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request
                .header("Content-Type", mime::APPLICATION_JSON.as_ref())
                .body(body);
        }

        let response = request
            .send()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .map_err(|e| ApiError::Network(e.to_string()))?
            .to_vec();
        Ok(RawResponse { status, body })
    }
}

pub struct ApiClient<T: Transport = HttpTransport> {
    transport: T,
    token: Option<String>,
}

impl ApiClient<HttpTransport> {
    pub fn connect(config: &ClientConfig) -> Result<Self, ApiError> {
        Ok(Self::new(HttpTransport::new(config)?))
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn exchange(&self, method: Method, path: &str, body: Option<Vec<u8>>) -> Result<Vec<u8>, ApiError> {
        tracing::debug!(method = %method, path, "api request");
        let response = self
            .transport
            .send(method, path, self.token.as_deref(), body)?;
        if (200..300).contains(&response.status) {
            Ok(response.body)
        } else {
            let err = ApiError::from_status(response.status, &response.body);
            tracing::warn!(path, status = response.status, error = %err, "api request failed");
            Err(err)
        }
    }

    pub fn request<B, R>(&self, method: Method, path: &str, body: Option<&B>) -> Result<R, ApiError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let payload = body
            .map(serde_json::to_vec)
            .transpose()
            .map_err(|e| ApiError::Decode(format!("encode request: {e}")))?;
        let bytes = self.exchange(method, path, payload)?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R, ApiError> {
        self.request::<(), R>(Method::GET, path, None)
    }

    /// For endpoints whose body the caller does not need.
    pub fn send_ignoring_body<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<(), ApiError> {
        let payload = body
            .map(serde_json::to_vec)
            .transpose()
            .map_err(|e| ApiError::Decode(format!("encode request: {e}")))?;
        self.exchange(method, path, payload).map(|_| ())
    }
}
