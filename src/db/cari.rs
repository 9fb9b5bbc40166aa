// src/db/cari.rs
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::domain::currency::{round2, Currency};
use crate::domain::reference::{CariAccount, CariInput, MUNFERIT_NAME};
use crate::domain::validation::non_empty;
use crate::errors::ServerError;

const CARI_COLUMNS: &str = "id, name, is_munferit, authorized_person, phone, email, address,
     tax_office, tax_number, pickup_location, pickup_maps_link, notes,
     balance_eur, balance_usd, balance_try, created_at";

fn cari_from_row(r: &Row<'_>) -> rusqlite::Result<CariAccount> {
    Ok(CariAccount {
        id: r.get(0)?,
        name: r.get(1)?,
        is_munferit: r.get(2)?,
        authorized_person: r.get(3)?,
        phone: r.get(4)?,
        email: r.get(5)?,
        address: r.get(6)?,
        tax_office: r.get(7)?,
        tax_number: r.get(8)?,
        pickup_location: r.get(9)?,
        pickup_maps_link: r.get(10)?,
        notes: r.get(11)?,
        balance_eur: r.get(12)?,
        balance_usd: r.get(13)?,
        balance_try: r.get(14)?,
        created_at: r.get(15)?,
    })
}

pub fn list_caris(
    conn: &Connection,
    company_id: i64,
    search: Option<&str>,
) -> Result<Vec<CariAccount>, ServerError> {
    let pattern = format!("%{}%", search.unwrap_or("").trim().to_lowercase());
    let mut stmt = conn
        .prepare(&format!(
            "select {CARI_COLUMNS} from cari_accounts
             where company_id = ? and lower(name) like ?
             order by is_munferit desc, name"
        ))
        .map_err(|e| ServerError::DbError(format!("prepare list caris failed: {e}")))?;
    let rows = stmt
        .query_map(params![company_id, pattern], cari_from_row)
        .map_err(|e| ServerError::DbError(format!("list caris failed: {e}")))?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| ServerError::DbError(format!("read cari row failed: {e}")))
}

pub fn get_cari(
    conn: &Connection,
    company_id: i64,
    id: i64,
) -> Result<Option<CariAccount>, ServerError> {
    conn.query_row(
        &format!("select {CARI_COLUMNS} from cari_accounts where company_id = ? and id = ?"),
        params![company_id, id],
        cari_from_row,
    )
    .optional()
    .map_err(|e| ServerError::DbError(format!("select cari failed: {e}")))
}

/// Id of the company's Münferit account, creating it on first use.
pub fn munferit_id(conn: &Connection, company_id: i64, now: i64) -> Result<i64, ServerError> {
    conn.execute(
        "insert or ignore into cari_accounts (company_id, name, is_munferit, created_at)
         values (?, ?, 1, ?)",
        params![company_id, MUNFERIT_NAME, now],
    )
    .map_err(|e| ServerError::DbError(format!("insert munferit failed: {e}")))?;

    conn.query_row(
        "select id from cari_accounts where company_id = ? and is_munferit = 1",
        params![company_id],
        |r| r.get(0),
    )
    .map_err(|e| ServerError::DbError(format!("select munferit failed: {e}")))
}

pub fn insert_cari(
    conn: &Connection,
    company_id: i64,
    input: &CariInput,
    now: i64,
) -> Result<CariAccount, ServerError> {
    conn.execute(
        r#"
        insert into cari_accounts
          (company_id, name, authorized_person, phone, email, address, tax_office,
           tax_number, pickup_location, pickup_maps_link, notes, created_at)
        values (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
        params![
            company_id,
            input.name.as_deref().unwrap_or("").trim(),
            non_empty(input.authorized_person.clone()),
            non_empty(input.phone.clone()),
            non_empty(input.email.clone()),
            non_empty(input.address.clone()),
            non_empty(input.tax_office.clone()),
            non_empty(input.tax_number.clone()),
            non_empty(input.pickup_location.clone()),
            non_empty(input.pickup_maps_link.clone()),
            non_empty(input.notes.clone()),
            now
        ],
    )
    .map_err(|e| ServerError::DbError(format!("insert cari failed: {e}")))?;

    get_cari(conn, company_id, conn.last_insert_rowid())?
        .ok_or_else(|| ServerError::DbError("cari vanished after insert".into()))
}

pub fn update_cari(
    conn: &Connection,
    company_id: i64,
    id: i64,
    input: &CariInput,
) -> Result<Option<CariAccount>, ServerError> {
    let n = conn
        .execute(
            r#"
            update cari_accounts set
              name = coalesce(?, name),
              authorized_person = coalesce(?, authorized_person),
              phone = coalesce(?, phone),
              email = coalesce(?, email),
              address = coalesce(?, address),
              tax_office = coalesce(?, tax_office),
              tax_number = coalesce(?, tax_number),
              pickup_location = coalesce(?, pickup_location),
              pickup_maps_link = coalesce(?, pickup_maps_link),
              notes = coalesce(?, notes)
            where company_id = ? and id = ? and is_munferit = 0
            "#,
            params![
                non_empty(input.name.clone()),
                input.authorized_person,
                input.phone,
                input.email,
                input.address,
                input.tax_office,
                input.tax_number,
                input.pickup_location,
                input.pickup_maps_link,
                input.notes,
                company_id,
                id
            ],
        )
        .map_err(|e| ServerError::DbError(format!("update cari failed: {e}")))?;
    if n == 0 {
        return Ok(None);
    }
    get_cari(conn, company_id, id)
}

/// Number of reservations booked against a cari.
pub fn reservation_count(conn: &Connection, cari_id: i64) -> Result<i64, ServerError> {
    conn.query_row(
        "select count(*) from reservations where cari_id = ?",
        params![cari_id],
        |r| r.get(0),
    )
    .map_err(|e| ServerError::DbError(format!("count cari reservations failed: {e}")))
}

pub fn delete_cari(conn: &Connection, company_id: i64, id: i64) -> Result<bool, ServerError> {
    let n = conn
        .execute(
            "delete from cari_accounts where company_id = ? and id = ? and is_munferit = 0",
            params![company_id, id],
        )
        .map_err(|e| ServerError::DbError(format!("delete cari failed: {e}")))?;
    Ok(n > 0)
}

/// Moves one currency balance of a cari by `delta`.
pub fn adjust_balance(
    conn: &Connection,
    cari_id: i64,
    currency: Currency,
    delta: f64,
) -> Result<(), ServerError> {
    let column = currency.balance_column();
    conn.execute(
        &format!("update cari_accounts set {column} = round({column} + ?, 2) where id = ?"),
        params![round2(delta), cari_id],
    )
    .map_err(|e| ServerError::DbError(format!("adjust {column} failed: {e}")))?;
    Ok(())
}
