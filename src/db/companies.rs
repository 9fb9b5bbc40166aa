// src/db/companies.rs
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::domain::currency::ExchangeRates;
use crate::errors::ServerError;

pub const FIRST_COMPANY_CODE: i64 = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: i64,
    pub company_code: String,
    pub company_name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub tax_office: Option<String>,
    pub tax_number: Option<String>,
    pub created_at: i64,
}

/// Body of `PUT /company/profile`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanyProfileInput {
    pub company_name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub tax_office: Option<String>,
    pub tax_number: Option<String>,
}

const COMPANY_COLUMNS: &str = "id, company_code, company_name, address, phone, email, website,
     tax_office, tax_number, created_at";

fn company_from_row(r: &Row<'_>) -> rusqlite::Result<Company> {
    Ok(Company {
        id: r.get(0)?,
        company_code: r.get(1)?,
        company_name: r.get(2)?,
        address: r.get(3)?,
        phone: r.get(4)?,
        email: r.get(5)?,
        website: r.get(6)?,
        tax_office: r.get(7)?,
        tax_number: r.get(8)?,
        created_at: r.get(9)?,
    })
}

/// Next free sequential code, starting at 1000.
pub fn next_company_code(conn: &Connection) -> Result<String, ServerError> {
    let max: Option<i64> = conn
        .query_row(
            "select max(cast(company_code as integer)) from companies",
            [],
            |r| r.get(0),
        )
        .map_err(|e| ServerError::DbError(format!("select max company code failed: {e}")))?;
    Ok(max
        .map_or(FIRST_COMPANY_CODE, |m| (m + 1).max(FIRST_COMPANY_CODE))
        .to_string())
}

pub fn insert_company(conn: &Connection, name: &str, now: i64) -> Result<Company, ServerError> {
    let code = next_company_code(conn)?;
    conn.execute(
        "insert into companies (company_code, company_name, created_at) values (?, ?, ?)",
        params![code, name, now],
    )
    .map_err(|e| ServerError::DbError(format!("insert company failed: {e}")))?;

    get_company(conn, conn.last_insert_rowid())?
        .ok_or_else(|| ServerError::DbError("company vanished after insert".into()))
}

pub fn get_company(conn: &Connection, id: i64) -> Result<Option<Company>, ServerError> {
    conn.query_row(
        &format!("select {COMPANY_COLUMNS} from companies where id = ?"),
        params![id],
        company_from_row,
    )
    .optional()
    .map_err(|e| ServerError::DbError(format!("select company failed: {e}")))
}

pub fn find_company_by_code(conn: &Connection, code: &str) -> Result<Option<Company>, ServerError> {
    conn.query_row(
        &format!("select {COMPANY_COLUMNS} from companies where company_code = ?"),
        params![code.trim()],
        company_from_row,
    )
    .optional()
    .map_err(|e| ServerError::DbError(format!("select company by code failed: {e}")))
}

pub fn update_profile(
    conn: &Connection,
    id: i64,
    input: &CompanyProfileInput,
) -> Result<Option<Company>, ServerError> {
    conn.execute(
        r#"
        update companies set
          company_name = coalesce(?, company_name),
          address = coalesce(?, address),
          phone = coalesce(?, phone),
          email = coalesce(?, email),
          website = coalesce(?, website),
          tax_office = coalesce(?, tax_office),
          tax_number = coalesce(?, tax_number)
        where id = ?
        "#,
        params![
            input.company_name,
            input.address,
            input.phone,
            input.email,
            input.website,
            input.tax_office,
            input.tax_number,
            id
        ],
    )
    .map_err(|e| ServerError::DbError(format!("update company failed: {e}")))?;
    get_company(conn, id)
}

pub fn busy_hour_threshold(conn: &Connection, id: i64) -> Result<Option<i64>, ServerError> {
    conn.query_row(
        "select busy_hour_threshold from companies where id = ?",
        params![id],
        |r| r.get::<_, Option<i64>>(0),
    )
    .optional()
    .map(Option::flatten)
    .map_err(|e| ServerError::DbError(format!("select busy hour threshold failed: {e}")))
}

pub fn set_busy_hour_threshold(conn: &Connection, id: i64, value: i64) -> Result<(), ServerError> {
    conn.execute(
        "update companies set busy_hour_threshold = ? where id = ?",
        params![value, id],
    )
    .map_err(|e| ServerError::DbError(format!("update busy hour threshold failed: {e}")))?;
    Ok(())
}

/// Company rates and when they were stored, if ever.
pub fn stored_rates(conn: &Connection, id: i64) -> Result<Option<(ExchangeRates, i64)>, ServerError> {
    let row: Option<(Option<f64>, Option<f64>, Option<i64>)> = conn
        .query_row(
            "select rate_usd, rate_try, rates_updated_at from companies where id = ?",
            params![id],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )
        .optional()
        .map_err(|e| ServerError::DbError(format!("select rates failed: {e}")))?;

    Ok(match row {
        Some((Some(usd), Some(r#try), Some(at))) => Some((
            ExchangeRates {
                eur: 1.0,
                usd,
                r#try,
            },
            at,
        )),
        _ => None,
    })
}

pub fn save_rates(
    conn: &Connection,
    id: i64,
    rates: &ExchangeRates,
    now: i64,
) -> Result<(), ServerError> {
    conn.execute(
        "update companies set rate_usd = ?, rate_try = ?, rates_updated_at = ? where id = ?",
        params![rates.usd, rates.r#try, now, id],
    )
    .map_err(|e| ServerError::DbError(format!("update rates failed: {e}")))?;
    Ok(())
}
