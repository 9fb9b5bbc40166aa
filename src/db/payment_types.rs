// src/db/payment_types.rs
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::domain::payment::PaymentKind;
use crate::domain::reference::{PaymentType, PaymentTypeInput};
use crate::domain::validation::non_empty;
use crate::errors::ServerError;

/// Types every new company starts with.
pub const DEFAULT_PAYMENT_TYPES: [(&str, PaymentKind); 5] = [
    ("Nakit", PaymentKind::Cash),
    ("Havale / EFT", PaymentKind::BankTransfer),
    ("Kredi Kartı", PaymentKind::CreditCard),
    ("Çek / Senet", PaymentKind::CheckPromissory),
    ("Cariye Aktar", PaymentKind::TransferToCari),
];

fn payment_type_from_row(r: &Row<'_>) -> rusqlite::Result<PaymentType> {
    Ok(PaymentType {
        id: r.get(0)?,
        name: r.get(1)?,
        kind: r.get(2)?,
        description: r.get(3)?,
    })
}

pub fn list_payment_types(
    conn: &Connection,
    company_id: i64,
) -> Result<Vec<PaymentType>, ServerError> {
    let mut stmt = conn
        .prepare(
            "select id, name, kind, description from payment_types
             where company_id = ? order by id",
        )
        .map_err(|e| ServerError::DbError(format!("prepare list payment types failed: {e}")))?;
    let rows = stmt
        .query_map(params![company_id], payment_type_from_row)
        .map_err(|e| ServerError::DbError(format!("list payment types failed: {e}")))?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| ServerError::DbError(format!("read payment type row failed: {e}")))
}

pub fn get_payment_type(
    conn: &Connection,
    company_id: i64,
    id: i64,
) -> Result<Option<PaymentType>, ServerError> {
    conn.query_row(
        "select id, name, kind, description from payment_types where company_id = ? and id = ?",
        params![company_id, id],
        payment_type_from_row,
    )
    .optional()
    .map_err(|e| ServerError::DbError(format!("select payment type failed: {e}")))
}

pub fn insert_payment_type(
    conn: &Connection,
    company_id: i64,
    input: &PaymentTypeInput,
) -> Result<PaymentType, ServerError> {
    conn.execute(
        "insert into payment_types (company_id, name, kind, description) values (?, ?, ?, ?)",
        params![
            company_id,
            input.name.as_deref().unwrap_or("").trim(),
            input.kind,
            non_empty(input.description.clone())
        ],
    )
    .map_err(|e| ServerError::DbError(format!("insert payment type failed: {e}")))?;

    get_payment_type(conn, company_id, conn.last_insert_rowid())?
        .ok_or_else(|| ServerError::DbError("payment type vanished after insert".into()))
}

pub fn seed_defaults(conn: &Connection, company_id: i64) -> Result<(), ServerError> {
    for (name, kind) in DEFAULT_PAYMENT_TYPES {
        let input = PaymentTypeInput {
            name: Some(name.to_string()),
            kind,
            description: None,
        };
        insert_payment_type(conn, company_id, &input)?;
    }
    Ok(())
}

pub fn delete_payment_type(
    conn: &Connection,
    company_id: i64,
    id: i64,
) -> Result<bool, ServerError> {
    let n = conn
        .execute(
            "delete from payment_types where company_id = ? and id = ?",
            params![company_id, id],
        )
        .map_err(|e| ServerError::DbError(format!("delete payment type failed: {e}")))?;
    Ok(n > 0)
}
