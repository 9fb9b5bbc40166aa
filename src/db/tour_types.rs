// src/db/tour_types.rs
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::domain::reference::{TourType, TourTypeInput};
use crate::domain::validation::non_empty;
use crate::errors::ServerError;

const TOUR_TYPE_COLUMNS: &str =
    "id, name, duration_hours, default_price, default_currency, color, description";

fn tour_type_from_row(r: &Row<'_>) -> rusqlite::Result<TourType> {
    Ok(TourType {
        id: r.get(0)?,
        name: r.get(1)?,
        duration_hours: r.get(2)?,
        default_price: r.get(3)?,
        default_currency: r.get(4)?,
        color: r.get(5)?,
        description: r.get(6)?,
    })
}

pub fn list_tour_types(conn: &Connection, company_id: i64) -> Result<Vec<TourType>, ServerError> {
    let mut stmt = conn
        .prepare(&format!(
            "select {TOUR_TYPE_COLUMNS} from tour_types where company_id = ? order by name"
        ))
        .map_err(|e| ServerError::DbError(format!("prepare list tour types failed: {e}")))?;
    let rows = stmt
        .query_map(params![company_id], tour_type_from_row)
        .map_err(|e| ServerError::DbError(format!("list tour types failed: {e}")))?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| ServerError::DbError(format!("read tour type row failed: {e}")))
}

pub fn get_tour_type(
    conn: &Connection,
    company_id: i64,
    id: i64,
) -> Result<Option<TourType>, ServerError> {
    conn.query_row(
        &format!("select {TOUR_TYPE_COLUMNS} from tour_types where company_id = ? and id = ?"),
        params![company_id, id],
        tour_type_from_row,
    )
    .optional()
    .map_err(|e| ServerError::DbError(format!("select tour type failed: {e}")))
}

pub fn insert_tour_type(
    conn: &Connection,
    company_id: i64,
    input: &TourTypeInput,
) -> Result<TourType, ServerError> {
    conn.execute(
        r#"
        insert into tour_types
          (company_id, name, duration_hours, default_price, default_currency, color, description)
        values (?, ?, ?, ?, ?, ?, ?)
        "#,
        params![
            company_id,
            input.name.as_deref().unwrap_or("").trim(),
            input.duration_hours,
            input.default_price.unwrap_or(0.0),
            input.default_currency.unwrap_or_default(),
            non_empty(input.color.clone()),
            non_empty(input.description.clone())
        ],
    )
    .map_err(|e| ServerError::DbError(format!("insert tour type failed: {e}")))?;

    get_tour_type(conn, company_id, conn.last_insert_rowid())?
        .ok_or_else(|| ServerError::DbError("tour type vanished after insert".into()))
}

pub fn delete_tour_type(conn: &Connection, company_id: i64, id: i64) -> Result<bool, ServerError> {
    let n = conn
        .execute(
            "delete from tour_types where company_id = ? and id = ?",
            params![company_id, id],
        )
        .map_err(|e| ServerError::DbError(format!("delete tour type failed: {e}")))?;
    Ok(n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::companies::insert_company;
    use crate::db::connection::test_conn;
    use crate::domain::currency::Currency;

    #[test]
    fn insert_applies_defaults() {
        let conn = test_conn();
        let c = insert_company(&conn, "Acme", 0).unwrap();
        let input = TourTypeInput {
            name: Some(" Sunset ATV ".into()),
            duration_hours: Some(1.5),
            ..Default::default()
        };
        let t = insert_tour_type(&conn, c.id, &input).unwrap();
        assert_eq!(t.name, "Sunset ATV");
        assert_eq!(t.default_currency, Currency::EUR);
        assert_eq!(t.default_price, 0.0);
        assert_eq!(list_tour_types(&conn, c.id).unwrap().len(), 1);
        assert!(delete_tour_type(&conn, c.id, t.id).unwrap());
        assert!(get_tour_type(&conn, c.id, t.id).unwrap().is_none());
    }
}
