// api/notifications.rs
use astra::Request;
use chrono::{NaiveDateTime, Timelike};
use serde::Deserialize;

use crate::api::{read_json, read_json_or_default, Query};
use crate::auth::Principal;
use crate::db::notifications::{
    delete_notifications, insert_notification, list_notifications, mark_read as db_mark_read,
    NewNotification, NotificationKind,
};
use crate::db::reservations::{list_reservations, ReservationFilter};
use crate::domain::reservation::{Reservation, ReservationStatus};
use crate::domain::validation::{minutes_of_day, Validator};
use crate::errors::ServerError;
use crate::responses::{ok_json, ResultResp};
use crate::router::AppState;

/// Confirmed tours on `now`'s date starting within the next `lead` minutes.
pub fn starting_soon(now: NaiveDateTime, reservations: &[Reservation], lead: u32) -> Vec<&Reservation> {
    let today = now.date().format("%Y-%m-%d").to_string();
    let current = now.hour() * 60 + now.minute();
    reservations
        .iter()
        .filter(|r| r.status == ReservationStatus::Confirmed && r.date == today)
        .filter(|r| {
            minutes_of_day(&r.time)
                .is_some_and(|start| start >= current && start - current <= lead)
        })
        .collect()
}

fn raise_tour_starts(app: &AppState, who: &Principal) -> Result<usize, ServerError> {
    let now = app.clock.now();
    let lead = app.config.dashboard.tour_start_lead_minutes;
    let company_id = who.company_id();
    let stamp = app.now();

    app.db.with_conn(|conn| {
        let today = list_reservations(
            conn,
            company_id,
            &ReservationFilter {
                date: Some(app.clock.today_iso()),
                status: Some(ReservationStatus::Confirmed),
                ..Default::default()
            },
        )?;
        let mut raised = 0;
        for r in starting_soon(now, &today, lead) {
            let message = format!(
                "{} - {} ({} ATV)",
                r.time,
                r.customer_name,
                r.atv_count
            );
            let fresh = insert_notification(
                conn,
                company_id,
                &NewNotification {
                    kind: NotificationKind::TourStart,
                    title: "Tur başlıyor",
                    message: &message,
                    entity_type: Some("reservation"),
                    entity_id: Some(r.id),
                },
                stamp,
            )?;
            if fresh {
                raised += 1;
            }
        }
        Ok(raised)
    })
}

/// `GET /notifications?unread_only=`
pub fn list(req: &mut Request, app: &AppState, who: &Principal) -> ResultResp {
    let unread_only = Query::from_request(req).flag("unread_only");
    let raised = raise_tour_starts(app, who)?;
    if raised > 0 {
        tracing::debug!(company_id = who.company_id(), raised, "tour start notifications raised");
    }
    let items = app
        .db
        .with_conn(|conn| list_notifications(conn, who.company_id(), unread_only))?;
    ok_json(&items)
}

#[derive(Debug, Default, Deserialize)]
pub struct MarkReadBody {
    pub ids: Option<Vec<i64>>,
}

/// `POST /notifications/mark-read`: the given ids, or everything.
pub fn mark_read(req: &mut Request, app: &AppState, who: &Principal) -> ResultResp {
    let body: MarkReadBody = read_json_or_default(req)?;
    let updated = app
        .db
        .with_conn(|conn| db_mark_read(conn, who.company_id(), body.ids.as_deref()))?;
    ok_json(&serde_json::json!({ "updated": updated }))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchAction {
    MarkRead,
    Delete,
}

#[derive(Debug, Deserialize)]
pub struct BatchBody {
    pub action: Option<BatchAction>,
    #[serde(default)]
    pub ids: Vec<i64>,
}

/// `POST /notifications/batch`
pub fn batch(req: &mut Request, app: &AppState, who: &Principal) -> ResultResp {
    let body: BatchBody = read_json(req)?;
    let mut v = Validator::new();
    v.require("action", body.action)
        .check("ids", !body.ids.is_empty(), "at least one id required");
    v.finish()?;

    let company_id = who.company_id();
    let affected = app.db.with_conn(|conn| match body.action {
        Some(BatchAction::Delete) => delete_notifications(conn, company_id, &body.ids),
        _ => db_mark_read(conn, company_id, Some(&body.ids)),
    })?;
    ok_json(&serde_json::json!({ "affected": affected }))
}
