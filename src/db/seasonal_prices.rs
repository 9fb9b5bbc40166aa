// src/db/seasonal_prices.rs
use rusqlite::{params, Connection, Row};

use crate::domain::pricing::{inherit_for_new_cari, SeasonalPrice, SeasonalPriceInput};
use crate::errors::ServerError;

fn seasonal_price_from_row(r: &Row<'_>) -> rusqlite::Result<SeasonalPrice> {
    let tour_type_ids: String = r.get(5)?;
    let cari_prices: String = r.get(6)?;
    Ok(SeasonalPrice {
        id: r.get(0)?,
        start_date: r.get(1)?,
        end_date: r.get(2)?,
        price: r.get(3)?,
        currency: r.get(4)?,
        tour_type_ids: serde_json::from_str(&tour_type_ids).unwrap_or_default(),
        cari_prices: serde_json::from_str(&cari_prices).unwrap_or_default(),
        apply_to_new_caris: r.get(7)?,
    })
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, ServerError> {
    serde_json::to_string(value)
        .map_err(|e| ServerError::DbError(format!("encode seasonal price field failed: {e}")))
}

pub fn list_seasonal_prices(
    conn: &Connection,
    company_id: i64,
) -> Result<Vec<SeasonalPrice>, ServerError> {
    let mut stmt = conn
        .prepare(
            "select id, start_date, end_date, price, currency, tour_type_ids, cari_prices,
                    apply_to_new_caris
             from seasonal_prices where company_id = ? order by start_date desc, id desc",
        )
        .map_err(|e| ServerError::DbError(format!("prepare list seasonal prices failed: {e}")))?;
    let rows = stmt
        .query_map(params![company_id], seasonal_price_from_row)
        .map_err(|e| ServerError::DbError(format!("list seasonal prices failed: {e}")))?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| ServerError::DbError(format!("read seasonal price row failed: {e}")))
}

pub fn insert_seasonal_price(
    conn: &Connection,
    company_id: i64,
    input: &SeasonalPriceInput,
    now: i64,
) -> Result<i64, ServerError> {
    conn.execute(
        r#"
        insert into seasonal_prices
          (company_id, start_date, end_date, price, currency, tour_type_ids, cari_prices,
           apply_to_new_caris, created_at)
        values (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
        params![
            company_id,
            input.start_date.as_deref().unwrap_or("").trim(),
            input.end_date.as_deref().unwrap_or("").trim(),
            input.price.unwrap_or(0.0),
            input.currency,
            to_json(&input.tour_type_ids)?,
            to_json(&input.cari_prices)?,
            input.apply_to_new_caris,
            now
        ],
    )
    .map_err(|e| ServerError::DbError(format!("insert seasonal price failed: {e}")))?;
    Ok(conn.last_insert_rowid())
}

pub fn delete_seasonal_price(
    conn: &Connection,
    company_id: i64,
    id: i64,
) -> Result<bool, ServerError> {
    let n = conn
        .execute(
            "delete from seasonal_prices where company_id = ? and id = ?",
            params![company_id, id],
        )
        .map_err(|e| ServerError::DbError(format!("delete seasonal price failed: {e}")))?;
    Ok(n > 0)
}

/// Gives a new cari its override on every season flagged for new caris.
pub fn apply_to_new_cari(conn: &Connection, company_id: i64, cari_id: i64) -> Result<usize, ServerError> {
    let mut prices = list_seasonal_prices(conn, company_id)?;
    let changed = inherit_for_new_cari(&mut prices, cari_id);
    for p in prices.iter().filter(|p| changed.contains(&p.id)) {
        conn.execute(
            "update seasonal_prices set cari_prices = ? where company_id = ? and id = ?",
            params![to_json(&p.cari_prices)?, company_id, p.id],
        )
        .map_err(|e| ServerError::DbError(format!("update seasonal cari prices failed: {e}")))?;
    }
    Ok(changed.len())
}
