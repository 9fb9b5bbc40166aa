// src/db/demo_requests.rs
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use crate::domain::validation::{non_empty, FieldError, Validator};
use crate::errors::ServerError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemoRequest {
    pub id: i64,
    pub full_name: String,
    pub company_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DemoRequestInput {
    pub full_name: Option<String>,
    pub company_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub message: Option<String>,
}

impl DemoRequestInput {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut v = Validator::new();
        v.require_text("full_name", self.full_name.as_deref())
            .require_text("company_name", self.company_name.as_deref())
            .require_text("email", self.email.as_deref())
            .check(
                "email",
                self.email.as_deref().map_or(true, |e| e.contains('@')),
                "invalid email address",
            );
        v.finish()
    }
}

pub fn insert_demo_request(
    conn: &Connection,
    input: &DemoRequestInput,
    now: i64,
) -> Result<i64, ServerError> {
    conn.execute(
        "insert into demo_requests (full_name, company_name, email, phone, message, created_at)
         values (?, ?, ?, ?, ?, ?)",
        params![
            input.full_name.as_deref().unwrap_or("").trim(),
            input.company_name.as_deref().unwrap_or("").trim(),
            input.email.as_deref().unwrap_or("").trim().to_lowercase(),
            non_empty(input.phone.clone()),
            non_empty(input.message.clone()),
            now
        ],
    )
    .map_err(|e| ServerError::DbError(format!("insert demo request failed: {e}")))?;
    Ok(conn.last_insert_rowid())
}

pub fn list_demo_requests(conn: &Connection) -> Result<Vec<DemoRequest>, ServerError> {
    let mut stmt = conn
        .prepare(
            "select id, full_name, company_name, email, phone, message, created_at
             from demo_requests order by created_at desc, id desc",
        )
        .map_err(|e| ServerError::DbError(format!("prepare list demo requests failed: {e}")))?;
    let rows = stmt
        .query_map([], |r| {
            Ok(DemoRequest {
                id: r.get(0)?,
                full_name: r.get(1)?,
                company_name: r.get(2)?,
                email: r.get(3)?,
                phone: r.get(4)?,
                message: r.get(5)?,
                created_at: r.get(6)?,
            })
        })
        .map_err(|e| ServerError::DbError(format!("list demo requests failed: {e}")))?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| ServerError::DbError(format!("read demo request row failed: {e}")))
}
