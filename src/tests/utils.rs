use astra::{Body, Response};
use chrono::NaiveDateTime;
use http::{Method, Request};
use serde_json::{json, Value};
use std::io::Read;
use std::sync::Arc;
use tempfile::TempDir;

use crate::client::http::{ApiError, RawResponse, Transport};
use crate::clock::Clock;
use crate::config::Config;
use crate::db::connection::{init_db, Database};
use crate::domain::ExchangeRates;
use crate::rates_feed::StaticRates;
use crate::responses::error_to_response;
use crate::router::{handle, AppState};

/// Local time every test app is frozen at.
pub const NOW: &str = "2025-06-01 09:45";
pub const TODAY: &str = "2025-06-01";

pub fn test_rates() -> ExchangeRates {
    ExchangeRates {
        eur: 1.0,
        usd: 1.1,
        r#try: 35.0,
    }
}

/// A fresh database in its own temp dir plus the state handlers see.
pub struct TestApp {
    pub state: AppState,
    _dir: TempDir,
}

/// An owner session on a freshly registered company.
pub struct Session {
    pub token: String,
    pub company_code: String,
    pub user_id: i64,
}

pub struct Reply {
    pub status: u16,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Reply {
    pub fn json(&self) -> Value {
        if self.bytes.is_empty() {
            return Value::Null;
        }
        serde_json::from_slice(&self.bytes).unwrap_or_else(|e| {
            panic!(
                "response is not JSON ({e}): {}",
                String::from_utf8_lossy(&self.bytes)
            )
        })
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).to_string()
    }
}

fn into_reply(resp: Response) -> Reply {
    let status = resp.status().as_u16();
    let content_type = resp
        .headers()
        .get("Content-Type")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let mut bytes = Vec::new();
    resp.into_body().reader().read_to_end(&mut bytes).unwrap();
    Reply {
        status,
        content_type,
        bytes,
    }
}

impl TestApp {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut config = Config::from_lookup(|_| None);
        config.database.path = dir.path().join("test.sqlite3").to_string_lossy().to_string();
        config.auth.bcrypt_cost = 4;
        config.rates.fallback = test_rates();

        let db = Database::new(config.database.path.clone());
        init_db(&db, &config.database.schema_path)
            .unwrap_or_else(|e| panic!("Database initialization failed: {e}"));

        let now = NaiveDateTime::parse_from_str(NOW, "%Y-%m-%d %H:%M").unwrap();
        let state = AppState::new(db, config, Arc::new(StaticRates(test_rates())))
            .with_clock(Clock::Fixed(now));
        Self { state, _dir: dir }
    }

    pub fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Vec<u8>>) -> Reply {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        let req = match body {
            Some(bytes) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(bytes))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let resp = handle(req, &self.state).unwrap_or_else(error_to_response);
        into_reply(resp)
    }

    pub fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Reply {
        self.send(method, uri, token, body.map(|b| b.to_string().into_bytes()))
    }

    pub fn get(&self, uri: &str, token: &str) -> Reply {
        self.call(Method::GET, uri, Some(token), None)
    }

    pub fn post(&self, uri: &str, token: &str, body: Value) -> Reply {
        self.call(Method::POST, uri, Some(token), Some(body))
    }

    pub fn put(&self, uri: &str, token: &str, body: Value) -> Reply {
        self.call(Method::PUT, uri, Some(token), Some(body))
    }

    pub fn delete(&self, uri: &str, token: &str) -> Reply {
        self.call(Method::DELETE, uri, Some(token), None)
    }

    pub fn register(&self, company: &str) -> Session {
        let reply = self.call(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "company_name": company,
                "username": "owner",
                "password": "correct-horse",
                "full_name": "Owner"
            })),
        );
        assert_eq!(reply.status, 201, "register failed: {}", reply.text());
        let body = reply.json();
        Session {
            token: body["access_token"].as_str().unwrap().to_string(),
            company_code: body["company"]["company_code"].as_str().unwrap().to_string(),
            user_id: body["user"]["id"].as_i64().unwrap(),
        }
    }

    /// Creates a user through `POST /users` and logs them in.
    pub fn user(&self, owner: &Session, username: &str, extra: Value) -> String {
        let mut body = json!({ "username": username, "password": "correct-horse" });
        if let (Some(target), Some(fields)) = (body.as_object_mut(), extra.as_object()) {
            for (k, v) in fields {
                target.insert(k.clone(), v.clone());
            }
        }
        let reply = self.post("/users", &owner.token, body);
        assert_eq!(reply.status, 201, "create user failed: {}", reply.text());

        let reply = self.call(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({
                "company_code": owner.company_code,
                "username": username,
                "password": "correct-horse"
            })),
        );
        assert_eq!(reply.status, 200, "login failed: {}", reply.text());
        reply.json()["access_token"].as_str().unwrap().to_string()
    }

    pub fn munferit_id(&self, token: &str) -> i64 {
        let caris = self.get("/cari-accounts", token).json();
        caris
            .as_array()
            .unwrap()
            .iter()
            .find(|c| c["is_munferit"] == true)
            .and_then(|c| c["id"].as_i64())
            .expect("every company has a Münferit account")
    }

    pub fn agency(&self, token: &str, name: &str) -> i64 {
        let reply = self.post(
            "/cari-accounts",
            token,
            json!({ "name": name, "pickup_location": "Side Harbour" }),
        );
        assert_eq!(reply.status, 201, "create cari failed: {}", reply.text());
        reply.json()["id"].as_i64().unwrap()
    }

    pub fn book(&self, token: &str, body: Value) -> Value {
        let reply = self.post("/reservations", token, body);
        assert_eq!(reply.status, 201, "create reservation failed: {}", reply.text());
        reply.json()
    }

    pub fn cari(&self, token: &str, id: i64) -> Value {
        let reply = self.get(&format!("/cari-accounts/{id}"), token);
        assert_eq!(reply.status, 200, "cari detail failed: {}", reply.text());
        reply.json()
    }
}

/// Client transport that calls the router directly.
pub struct InProcess<'a>(pub &'a TestApp);

impl Transport for InProcess<'_> {
    fn send(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Vec<u8>>,
    ) -> Result<RawResponse, ApiError> {
        let reply = self.0.send(method, &format!("/api{path}"), token, body);
        Ok(RawResponse {
            status: reply.status,
            body: reply.bytes,
        })
    }
}
