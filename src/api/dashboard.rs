// api/dashboard.rs
//
// Single-day timeline and the calendar grid.
use astra::Request;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;

use crate::api::company::threshold_for;
use crate::api::reservations::{views, ReservationView};
use crate::api::Query;
use crate::auth::{Action, Module, Principal, Role};
use crate::db::reservations::{list_reservations, ReservationFilter};
use crate::db::tour_types::list_tour_types;
use crate::domain::calendar::{matches_search, range_for, summarize_range, DateRange, DaySummary, ViewMode};
use crate::domain::reservation::{Reservation, ReservationStatus};
use crate::domain::timeline::{
    busy_hours, derive_status, hour_buckets, layout_rows, partition_tours, row_count, tour_minutes,
    Bar, DerivedStatus, HourBucket, TourPartition, PX_PER_HOUR,
};
use crate::responses::{ok_json, ResultResp};
use crate::router::AppState;

#[derive(Debug, Serialize)]
pub struct DayTotals {
    pub departures: usize,
    pub atv_total: i64,
    pub person_total: i64,
}

#[derive(Debug, Serialize)]
pub struct StatusEntry {
    pub reservation_id: i64,
    pub status: DerivedStatus,
}

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub date: String,
    pub is_today: bool,
    pub totals: DayTotals,
    pub busy_hour_threshold: i64,
    pub hours: Vec<HourBucket>,
    pub busy_hours: Vec<u32>,
    pub px_per_hour: f64,
    pub bars: Vec<Bar>,
    pub row_count: usize,
    pub statuses: Vec<StatusEntry>,
    pub tours: TourPartition,
    pub pending_count: usize,
    pub reservations: Vec<ReservationView>,
}

#[derive(Debug, Serialize)]
pub struct Calendar {
    pub view: ViewMode,
    pub range: DateRange,
    pub days: Vec<DaySummary>,
    pub reservations: Vec<ReservationView>,
}

fn scoped(who: &Principal, mut filter: ReservationFilter) -> ReservationFilter {
    if who.role() == Role::Cari {
        filter.cari_id = who.user.cari_id.or(Some(-1));
    }
    filter
}

fn totals(reservations: &[Reservation]) -> DayTotals {
    let live: Vec<&Reservation> = reservations
        .iter()
        .filter(|r| r.status != ReservationStatus::Cancelled)
        .collect();
    DayTotals {
        departures: live.len(),
        atv_total: live.iter().map(|r| r.atv_count).sum(),
        person_total: live.iter().map(|r| r.person_count).sum(),
    }
}

/// `GET /dashboard?date=YYYY-MM-DD` (defaults to today).
pub fn dashboard(req: &mut Request, app: &AppState, who: &Principal) -> ResultResp {
    who.require(Module::Dashboard, Action::View)?;
    let q = Query::from_request(req);
    let date = q.date("date")?.unwrap_or_else(|| app.clock.today_iso());
    let now = app.clock.now();
    let company_id = who.company_id();
    let dashboard_config = &app.config.dashboard;

    let (reservations, pending, threshold, durations) = app.db.with_conn(|conn| {
        let day = list_reservations(
            conn,
            company_id,
            &scoped(
                who,
                ReservationFilter {
                    date: Some(date.clone()),
                    ..Default::default()
                },
            ),
        )?;
        let pending = list_reservations(
            conn,
            company_id,
            &scoped(
                who,
                ReservationFilter {
                    status: Some(ReservationStatus::Pending),
                    ..Default::default()
                },
            ),
        )?;
        let threshold = threshold_for(conn, company_id, dashboard_config.default_busy_hour_threshold)?;
        let durations: HashMap<i64, Option<f64>> = list_tour_types(conn, company_id)?
            .into_iter()
            .map(|t| (t.id, t.duration_hours))
            .collect();
        Ok((day, pending.len(), threshold, durations))
    })?;

    let fallback = dashboard_config.default_tour_minutes;
    let minutes_for = |r: &Reservation| {
        let hours = r.tour_type_id.and_then(|id| durations.get(&id).copied().flatten());
        tour_minutes(hours, fallback)
    };

    let hours = hour_buckets(&reservations, threshold);
    let bars = layout_rows(&reservations, minutes_for);
    let statuses = reservations
        .iter()
        .map(|r| StatusEntry {
            reservation_id: r.id,
            status: derive_status(now, r, minutes_for(r)),
        })
        .collect();

    let body = Dashboard {
        is_today: date == now.date().format("%Y-%m-%d").to_string(),
        totals: totals(&reservations),
        busy_hour_threshold: threshold,
        busy_hours: busy_hours(&hours),
        hours,
        px_per_hour: PX_PER_HOUR,
        row_count: row_count(&bars),
        bars,
        statuses,
        tours: partition_tours(now, &reservations, minutes_for),
        pending_count: pending,
        reservations: views(reservations),
        date,
    };
    ok_json(&body)
}

/// `GET /calendar?view=&anchor=&search=`
pub fn calendar(req: &mut Request, app: &AppState, who: &Principal) -> ResultResp {
    who.require(Module::Calendar, Action::View)?;
    let q = Query::from_request(req);
    let view: ViewMode = q.parse("view")?.unwrap_or_default();
    let anchor: NaiveDate = q.parse("anchor")?.unwrap_or_else(|| app.clock.today());
    let search = q.text("search");
    let range = range_for(view, anchor);

    let filter = scoped(
        who,
        ReservationFilter {
            date_from: Some(range.start.format("%Y-%m-%d").to_string()),
            date_to: Some(range.end.format("%Y-%m-%d").to_string()),
            ..Default::default()
        },
    );
    let mut reservations = app
        .db
        .with_conn(|conn| list_reservations(conn, who.company_id(), &filter))?;
    if let Some(search) = search.as_deref() {
        reservations.retain(|r| matches_search(r, search));
    }

    ok_json(&Calendar {
        view,
        range,
        days: summarize_range(range, &reservations),
        reservations: views(reservations),
    })
}
