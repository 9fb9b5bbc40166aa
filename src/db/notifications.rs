// src/db/notifications.rs
use rusqlite::{params, params_from_iter, Connection, Row};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::errors::ServerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    PendingReservation,
    TourStart,
    Info,
    Warning,
    Error,
    Success,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::PendingReservation => "pending_reservation",
            NotificationKind::TourStart => "tour_start",
            NotificationKind::Info => "info",
            NotificationKind::Warning => "warning",
            NotificationKind::Error => "error",
            NotificationKind::Success => "success",
        }
    }
}

impl FromStr for NotificationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending_reservation" => Ok(NotificationKind::PendingReservation),
            "tour_start" => Ok(NotificationKind::TourStart),
            "info" => Ok(NotificationKind::Info),
            "warning" => Ok(NotificationKind::Warning),
            "error" => Ok(NotificationKind::Error),
            "success" => Ok(NotificationKind::Success),
            other => Err(format!("unknown notification kind: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub entity_type: Option<String>,
    pub entity_id: Option<i64>,
    pub is_read: bool,
    pub created_at: i64,
}

pub struct NewNotification<'a> {
    pub kind: NotificationKind,
    pub title: &'a str,
    pub message: &'a str,
    pub entity_type: Option<&'a str>,
    pub entity_id: Option<i64>,
}

fn notification_from_row(r: &Row<'_>) -> rusqlite::Result<Notification> {
    let kind: String = r.get(1)?;
    Ok(Notification {
        id: r.get(0)?,
        kind: kind.parse().unwrap_or(NotificationKind::Info),
        title: r.get(2)?,
        message: r.get(3)?,
        entity_type: r.get(4)?,
        entity_id: r.get(5)?,
        is_read: r.get(6)?,
        created_at: r.get(7)?,
    })
}

/// Inserts a notification. `tour_start` rows are unique per reservation, so a
/// repeat is ignored and reported as `false`.
pub fn insert_notification(
    conn: &Connection,
    company_id: i64,
    n: &NewNotification<'_>,
    now: i64,
) -> Result<bool, ServerError> {
    let inserted = conn
        .execute(
            r#"
            insert or ignore into notifications
              (company_id, kind, title, message, entity_type, entity_id, created_at)
            values (?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                company_id,
                n.kind.as_str(),
                n.title,
                n.message,
                n.entity_type,
                n.entity_id,
                now
            ],
        )
        .map_err(|e| ServerError::DbError(format!("insert notification failed: {e}")))?;
    Ok(inserted > 0)
}

pub fn list_notifications(
    conn: &Connection,
    company_id: i64,
    unread_only: bool,
) -> Result<Vec<Notification>, ServerError> {
    let mut stmt = conn
        .prepare(
            "select id, kind, title, message, entity_type, entity_id, is_read, created_at
             from notifications
             where company_id = ? and (? = 0 or is_read = 0)
             order by created_at desc, id desc
             limit 200",
        )
        .map_err(|e| ServerError::DbError(format!("prepare list notifications failed: {e}")))?;
    let rows = stmt
        .query_map(params![company_id, unread_only], notification_from_row)
        .map_err(|e| ServerError::DbError(format!("list notifications failed: {e}")))?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| ServerError::DbError(format!("read notification row failed: {e}")))
}

fn id_list(ids: &[i64]) -> String {
    vec!["?"; ids.len()].join(", ")
}

/// Marks the given ids read, or every notification when `ids` is `None`.
pub fn mark_read(conn: &Connection, company_id: i64, ids: Option<&[i64]>) -> Result<usize, ServerError> {
    let n = match ids {
        None => conn.execute(
            "update notifications set is_read = 1 where company_id = ? and is_read = 0",
            params![company_id],
        ),
        Some([]) => Ok(0),
        Some(ids) => {
            let sql = format!(
                "update notifications set is_read = 1 where company_id = ? and id in ({})",
                id_list(ids)
            );
            let values = std::iter::once(company_id).chain(ids.iter().copied());
            conn.execute(&sql, params_from_iter(values))
        }
    }
    .map_err(|e| ServerError::DbError(format!("mark notifications read failed: {e}")))?;
    Ok(n)
}

pub fn delete_notifications(conn: &Connection, company_id: i64, ids: &[i64]) -> Result<usize, ServerError> {
    if ids.is_empty() {
        return Ok(0);
    }
    let sql = format!(
        "delete from notifications where company_id = ? and id in ({})",
        id_list(ids)
    );
    let values = std::iter::once(company_id).chain(ids.iter().copied());
    conn.execute(&sql, params_from_iter(values))
        .map_err(|e| ServerError::DbError(format!("delete notifications failed: {e}")))
}
