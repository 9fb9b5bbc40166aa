// src/db/reservations.rs
use chrono::NaiveDate;
use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::auth::token::readable_code;
use crate::domain::calendar::matches_search;
use crate::domain::currency::Currency;
use crate::domain::ledger::REFERENCE_RESERVATION;
use crate::domain::reservation::{CustomerDetails, Reservation, ReservationStatus};
use crate::errors::ServerError;

const RESERVATION_SELECT: &str = r#"
    select r.id, r.cari_id, c.name, c.is_munferit, r.customer_name, r.customer_contact,
           r.customer_details, r.date, r.time, r.tour_type_id, r.tour_type_name,
           r.person_count, r.atv_count, r.pickup_location, r.pickup_maps_link, r.pickup_time,
           r.price, r.currency, r.exchange_rate, r.notes, r.status, r.voucher_code,
           exists (
             select 1 from transactions t
             where t.reference_type = 'reservation'
               and t.reference_id = r.id
               and t.transaction_type = 'payment'
           ),
           r.no_show_applied, r.no_show_amount, r.no_show_currency, r.cancel_reason,
           r.created_by, r.created_at, r.updated_at
    from reservations r
    join cari_accounts c on c.id = r.cari_id
"#;

fn reservation_from_row(r: &Row<'_>) -> rusqlite::Result<Reservation> {
    let details: Option<String> = r.get(6)?;
    Ok(Reservation {
        id: r.get(0)?,
        cari_id: r.get(1)?,
        cari_name: r.get(2)?,
        is_munferit: r.get(3)?,
        customer_name: r.get(4)?,
        customer_contact: r.get(5)?,
        customer_details: details.and_then(|d| serde_json::from_str(&d).ok()),
        date: r.get(7)?,
        time: r.get(8)?,
        tour_type_id: r.get(9)?,
        tour_type_name: r.get(10)?,
        person_count: r.get(11)?,
        atv_count: r.get(12)?,
        pickup_location: r.get(13)?,
        pickup_maps_link: r.get(14)?,
        pickup_time: r.get(15)?,
        price: r.get(16)?,
        currency: r.get(17)?,
        exchange_rate: r.get(18)?,
        notes: r.get(19)?,
        status: r.get(20)?,
        voucher_code: r.get(21)?,
        has_payment: r.get(22)?,
        no_show_applied: r.get(23)?,
        no_show_amount: r.get(24)?,
        no_show_currency: r.get(25)?,
        cancel_reason: r.get(26)?,
        created_by: r.get(27)?,
        created_at: r.get(28)?,
        updated_at: r.get(29)?,
    })
}

/// Column values written on insert and update.
#[derive(Debug, Clone, PartialEq)]
pub struct ReservationRecord {
    pub cari_id: i64,
    pub customer_name: String,
    pub customer_contact: Option<String>,
    pub customer_details: Option<CustomerDetails>,
    pub date: String,
    pub time: String,
    pub tour_type_id: Option<i64>,
    pub tour_type_name: Option<String>,
    pub person_count: i64,
    pub atv_count: i64,
    pub pickup_location: Option<String>,
    pub pickup_maps_link: Option<String>,
    pub price: f64,
    pub currency: Currency,
    pub exchange_rate: f64,
    pub notes: Option<String>,
    pub status: ReservationStatus,
}

impl ReservationRecord {
    fn details_json(&self) -> Option<String> {
        self.customer_details
            .as_ref()
            .filter(|d| !d.is_empty())
            .and_then(|d| serde_json::to_string(d).ok())
    }
}

#[derive(Debug, Default, Clone)]
pub struct ReservationFilter {
    pub status: Option<ReservationStatus>,
    pub date: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub cari_id: Option<i64>,
    pub search: Option<String>,
}

/// `VCHR-YYYYMMDD-XXXXXX`
pub fn new_voucher_code<R: Rng>(rng: &mut R, day: NaiveDate) -> String {
    format!("VCHR-{}-{}", day.format("%Y%m%d"), readable_code(rng, 6))
}

pub fn insert_reservation(
    conn: &Connection,
    company_id: i64,
    rec: &ReservationRecord,
    voucher_code: &str,
    created_by: Option<i64>,
    now: i64,
) -> Result<i64, ServerError> {
    conn.execute(
        r#"
        insert into reservations
          (company_id, cari_id, customer_name, customer_contact, customer_details, date, time,
           tour_type_id, tour_type_name, person_count, atv_count, pickup_location,
           pickup_maps_link, price, currency, exchange_rate, notes, status, voucher_code,
           created_by, created_at, updated_at)
        values (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
        params![
            company_id,
            rec.cari_id,
            rec.customer_name,
            rec.customer_contact,
            rec.details_json(),
            rec.date,
            rec.time,
            rec.tour_type_id,
            rec.tour_type_name,
            rec.person_count,
            rec.atv_count,
            rec.pickup_location,
            rec.pickup_maps_link,
            rec.price,
            rec.currency,
            rec.exchange_rate,
            rec.notes,
            rec.status,
            voucher_code,
            created_by,
            now,
            now
        ],
    )
    .map_err(|e| ServerError::DbError(format!("insert reservation failed: {e}")))?;
    Ok(conn.last_insert_rowid())
}

pub fn update_reservation(
    conn: &Connection,
    company_id: i64,
    id: i64,
    rec: &ReservationRecord,
    now: i64,
) -> Result<bool, ServerError> {
    let n = conn
        .execute(
            r#"
            update reservations set
              cari_id = ?, customer_name = ?, customer_contact = ?, customer_details = ?,
              date = ?, time = ?, tour_type_id = ?, tour_type_name = ?, person_count = ?,
              atv_count = ?, pickup_location = ?, pickup_maps_link = ?, price = ?,
              currency = ?, exchange_rate = ?, notes = ?, status = ?, updated_at = ?
            where company_id = ? and id = ?
            "#,
            params![
                rec.cari_id,
                rec.customer_name,
                rec.customer_contact,
                rec.details_json(),
                rec.date,
                rec.time,
                rec.tour_type_id,
                rec.tour_type_name,
                rec.person_count,
                rec.atv_count,
                rec.pickup_location,
                rec.pickup_maps_link,
                rec.price,
                rec.currency,
                rec.exchange_rate,
                rec.notes,
                rec.status,
                now,
                company_id,
                id
            ],
        )
        .map_err(|e| ServerError::DbError(format!("update reservation failed: {e}")))?;
    Ok(n > 0)
}

pub fn get_reservation(
    conn: &Connection,
    company_id: i64,
    id: i64,
) -> Result<Option<Reservation>, ServerError> {
    conn.query_row(
        &format!("{RESERVATION_SELECT} where r.company_id = ? and r.id = ?"),
        params![company_id, id],
        reservation_from_row,
    )
    .optional()
    .map_err(|e| ServerError::DbError(format!("select reservation failed: {e}")))
}

pub fn list_reservations(
    conn: &Connection,
    company_id: i64,
    filter: &ReservationFilter,
) -> Result<Vec<Reservation>, ServerError> {
    let mut stmt = conn
        .prepare(&format!(
            r#"{RESERVATION_SELECT}
            where r.company_id = ?1
              and (?2 is null or r.status = ?2)
              and (?3 is null or r.date = ?3)
              and (?4 is null or r.date >= ?4)
              and (?5 is null or r.date <= ?5)
              and (?6 is null or r.cari_id = ?6)
            order by r.date, r.time, r.id"#
        ))
        .map_err(|e| ServerError::DbError(format!("prepare list reservations failed: {e}")))?;
    let rows = stmt
        .query_map(
            params![
                company_id,
                filter.status,
                filter.date,
                filter.date_from,
                filter.date_to,
                filter.cari_id
            ],
            reservation_from_row,
        )
        .map_err(|e| ServerError::DbError(format!("list reservations failed: {e}")))?;
    let reservations = rows
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ServerError::DbError(format!("read reservation row failed: {e}")))?;

    // sqlite's lower() only folds ASCII, so search runs on the decoded rows
    Ok(match filter.search.as_deref() {
        Some(query) => reservations
            .into_iter()
            .filter(|r| matches_search(r, query))
            .collect(),
        None => reservations,
    })
}

pub fn set_status(
    conn: &Connection,
    company_id: i64,
    id: i64,
    status: ReservationStatus,
    now: i64,
) -> Result<(), ServerError> {
    conn.execute(
        "update reservations set status = ?, updated_at = ? where company_id = ? and id = ?",
        params![status, now, company_id, id],
    )
    .map_err(|e| ServerError::DbError(format!("update reservation status failed: {e}")))?;
    Ok(())
}

pub fn set_pickup_time(
    conn: &Connection,
    company_id: i64,
    id: i64,
    pickup_time: &str,
    now: i64,
) -> Result<(), ServerError> {
    conn.execute(
        "update reservations set pickup_time = ?, updated_at = ? where company_id = ? and id = ?",
        params![pickup_time, now, company_id, id],
    )
    .map_err(|e| ServerError::DbError(format!("update pickup time failed: {e}")))?;
    Ok(())
}

pub struct CancelRecord<'a> {
    pub reason: Option<&'a str>,
    pub no_show: Option<(f64, Currency)>,
}

pub fn mark_cancelled(
    conn: &Connection,
    company_id: i64,
    id: i64,
    cancel: &CancelRecord<'_>,
    now: i64,
) -> Result<(), ServerError> {
    conn.execute(
        r#"
        update reservations set
          status = 'cancelled', cancel_reason = ?, no_show_applied = ?,
          no_show_amount = ?, no_show_currency = ?, updated_at = ?
        where company_id = ? and id = ?
        "#,
        params![
            cancel.reason,
            cancel.no_show.is_some(),
            cancel.no_show.map(|(amount, _)| amount),
            cancel.no_show.map(|(_, currency)| currency),
            now,
            company_id,
            id
        ],
    )
    .map_err(|e| ServerError::DbError(format!("cancel reservation failed: {e}")))?;
    Ok(())
}

/// Deletes the reservation and unlinks any payments that referenced it.
pub fn delete_reservation(conn: &Connection, company_id: i64, id: i64) -> Result<bool, ServerError> {
    conn.execute(
        "update transactions set reference_id = null, reference_type = null
         where company_id = ? and reference_type = ? and reference_id = ?",
        params![company_id, REFERENCE_RESERVATION, id],
    )
    .map_err(|e| ServerError::DbError(format!("unlink reservation payments failed: {e}")))?;

    let n = conn
        .execute(
            "delete from reservations where company_id = ? and id = ?",
            params![company_id, id],
        )
        .map_err(|e| ServerError::DbError(format!("delete reservation failed: {e}")))?;
    Ok(n > 0)
}

#[cfg(test)]
pub(crate) fn record(cari_id: i64, date: &str, time: &str) -> ReservationRecord {
    ReservationRecord {
        cari_id,
        customer_name: "Ahmet Yılmaz".into(),
        customer_contact: None,
        customer_details: None,
        date: date.into(),
        time: time.into(),
        tour_type_id: None,
        tour_type_name: None,
        person_count: 2,
        atv_count: 1,
        pickup_location: None,
        pickup_maps_link: None,
        price: 100.0,
        currency: Currency::EUR,
        exchange_rate: 1.0,
        notes: None,
        status: ReservationStatus::Confirmed,
    }
}
