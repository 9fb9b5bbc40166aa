// src/db/users.rs
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::auth::permissions::{PermissionSet, Role};
use crate::errors::ServerError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub company_id: i64,
    pub username: String,
    pub email: Option<String>,
    pub full_name: String,
    pub role: Role,
    pub cari_id: Option<i64>,
    pub permissions: PermissionSet,
    pub created_at: i64,
}

pub struct NewUser<'a> {
    pub company_id: i64,
    pub username: &'a str,
    pub email: Option<&'a str>,
    pub full_name: &'a str,
    pub password_hash: &'a str,
    pub role: Role,
    pub cari_id: Option<i64>,
    pub permissions: &'a PermissionSet,
}

const USER_COLUMNS: &str =
    "id, company_id, username, email, full_name, role, cari_id, permissions, created_at";

fn user_from_row(r: &Row<'_>) -> rusqlite::Result<User> {
    let role: String = r.get(5)?;
    let permissions: String = r.get(7)?;
    Ok(User {
        id: r.get(0)?,
        company_id: r.get(1)?,
        username: r.get(2)?,
        email: r.get(3)?,
        full_name: r.get(4)?,
        role: role.parse().unwrap_or_default(),
        cari_id: r.get(6)?,
        permissions: serde_json::from_str(&permissions).unwrap_or_default(),
        created_at: r.get(8)?,
    })
}

pub fn insert_user(conn: &Connection, user: &NewUser<'_>, now: i64) -> Result<User, ServerError> {
    let permissions = serde_json::to_string(user.permissions)
        .map_err(|e| ServerError::BadRequest(format!("invalid permissions: {e}")))?;

    conn.execute(
        r#"
        insert into users
          (company_id, username, email, full_name, password_hash, role, cari_id, permissions, created_at)
        values (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
        params![
            user.company_id,
            user.username.trim(),
            user.email,
            user.full_name,
            user.password_hash,
            user.role.as_str(),
            user.cari_id,
            permissions,
            now
        ],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(f, _)
            if f.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            ServerError::Conflict(format!("username '{}' already exists", user.username.trim()))
        }
        other => ServerError::DbError(format!("insert user failed: {other}")),
    })?;

    get_user(conn, conn.last_insert_rowid())?
        .ok_or_else(|| ServerError::DbError("user vanished after insert".into()))
}

pub fn get_user(conn: &Connection, id: i64) -> Result<Option<User>, ServerError> {
    conn.query_row(
        &format!("select {USER_COLUMNS} from users where id = ?"),
        params![id],
        user_from_row,
    )
    .optional()
    .map_err(|e| ServerError::DbError(format!("select user failed: {e}")))
}

/// User plus stored password hash for a login attempt.
pub fn find_login(
    conn: &Connection,
    company_id: i64,
    username: &str,
) -> Result<Option<(User, String)>, ServerError> {
    conn.query_row(
        &format!(
            "select {USER_COLUMNS}, password_hash from users where company_id = ? and username = ?"
        ),
        params![company_id, username.trim()],
        |r| Ok((user_from_row(r)?, r.get(9)?)),
    )
    .optional()
    .map_err(|e| ServerError::DbError(format!("select login failed: {e}")))
}

pub fn list_users(conn: &Connection, company_id: i64) -> Result<Vec<User>, ServerError> {
    let mut stmt = conn
        .prepare(&format!(
            "select {USER_COLUMNS} from users where company_id = ? order by username"
        ))
        .map_err(|e| ServerError::DbError(format!("prepare list users failed: {e}")))?;
    let rows = stmt
        .query_map(params![company_id], user_from_row)
        .map_err(|e| ServerError::DbError(format!("list users failed: {e}")))?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| ServerError::DbError(format!("read user row failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::permissions::{Action, Module};
    use crate::db::companies::insert_company;
    use crate::db::connection::test_conn;

    #[test]
    fn insert_find_and_reject_duplicates() {
        let conn = test_conn();
        let company = insert_company(&conn, "Acme", 0).unwrap();
        let mut perms = PermissionSet::default();
        perms.grant(Module::Reservations, Action::View);

        let new = NewUser {
            company_id: company.id,
            username: " mehmet ",
            email: None,
            full_name: "Mehmet Demir",
            password_hash: "hash",
            role: Role::Staff,
            cari_id: None,
            permissions: &perms,
        };
        let user = insert_user(&conn, &new, 10).unwrap();
        assert_eq!(user.username, "mehmet");
        assert!(user.permissions.allows(Module::Reservations, Action::View));

        let (found, hash) = find_login(&conn, company.id, "mehmet").unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(hash, "hash");

        let err = insert_user(&conn, &new, 11).unwrap_err();
        assert!(matches!(err, ServerError::Conflict(_)));
        assert_eq!(list_users(&conn, company.id).unwrap().len(), 1);
    }
}
