// src/db/cash_accounts.rs
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::domain::reference::{CashAccount, CashAccountInput, CashAccountKind};
use crate::domain::validation::non_empty;
use crate::errors::ServerError;

fn cash_account_from_row(r: &Row<'_>) -> rusqlite::Result<CashAccount> {
    let kind: String = r.get(2)?;
    Ok(CashAccount {
        id: r.get(0)?,
        name: r.get(1)?,
        account_type: if kind == "bank" {
            CashAccountKind::Bank
        } else {
            CashAccountKind::Cash
        },
        currency: r.get(3)?,
        bank_name: r.get(4)?,
        iban: r.get(5)?,
    })
}

const CASH_ACCOUNT_COLUMNS: &str = "id, name, account_type, currency, bank_name, iban";

pub fn list_cash_accounts(
    conn: &Connection,
    company_id: i64,
) -> Result<Vec<CashAccount>, ServerError> {
    let mut stmt = conn
        .prepare(&format!(
            "select {CASH_ACCOUNT_COLUMNS} from cash_accounts where company_id = ? order by name"
        ))
        .map_err(|e| ServerError::DbError(format!("prepare list cash accounts failed: {e}")))?;
    let rows = stmt
        .query_map(params![company_id], cash_account_from_row)
        .map_err(|e| ServerError::DbError(format!("list cash accounts failed: {e}")))?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| ServerError::DbError(format!("read cash account row failed: {e}")))
}

pub fn get_cash_account(
    conn: &Connection,
    company_id: i64,
    id: i64,
) -> Result<Option<CashAccount>, ServerError> {
    conn.query_row(
        &format!(
            "select {CASH_ACCOUNT_COLUMNS} from cash_accounts where company_id = ? and id = ?"
        ),
        params![company_id, id],
        cash_account_from_row,
    )
    .optional()
    .map_err(|e| ServerError::DbError(format!("select cash account failed: {e}")))
}

pub fn insert_cash_account(
    conn: &Connection,
    company_id: i64,
    input: &CashAccountInput,
) -> Result<CashAccount, ServerError> {
    conn.execute(
        "insert into cash_accounts (company_id, name, account_type, currency, bank_name, iban)
         values (?, ?, ?, ?, ?, ?)",
        params![
            company_id,
            input.name.as_deref().unwrap_or("").trim(),
            input.account_type.as_str(),
            input.currency,
            non_empty(input.bank_name.clone()),
            non_empty(input.iban.clone())
        ],
    )
    .map_err(|e| ServerError::DbError(format!("insert cash account failed: {e}")))?;

    get_cash_account(conn, company_id, conn.last_insert_rowid())?
        .ok_or_else(|| ServerError::DbError("cash account vanished after insert".into()))
}

pub fn delete_cash_account(
    conn: &Connection,
    company_id: i64,
    id: i64,
) -> Result<bool, ServerError> {
    let n = conn
        .execute(
            "delete from cash_accounts where company_id = ? and id = ?",
            params![company_id, id],
        )
        .map_err(|e| ServerError::DbError(format!("delete cash account failed: {e}")))?;
    Ok(n > 0)
}
