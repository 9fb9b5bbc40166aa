// src/db/transactions.rs
//
// Ledger entries. Every insert or delete moves the owning cari's balance in
// the entry's currency, so balances always equal the signed sum of entries.
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::cari::adjust_balance;
use crate::domain::ledger::{Transaction, TransactionInput, TransactionLink, TransactionType};
use crate::domain::validation::non_empty;
use crate::errors::ServerError;

const TRANSACTION_SELECT: &str = r#"
    select t.id, t.cari_id, t.transaction_type, t.amount, t.currency, t.exchange_rate,
           t.payment_type_id, p.name, t.bank_account_id, t.due_date, t.check_number,
           t.transfer_to_cari_id, t.description, t.reference_id, t.reference_type,
           t.date, t.created_by, t.created_at
    from transactions t
    left join payment_types p on p.id = t.payment_type_id
"#;

fn transaction_from_row(r: &Row<'_>) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: r.get(0)?,
        cari_id: r.get(1)?,
        transaction_type: r.get(2)?,
        amount: r.get(3)?,
        currency: r.get(4)?,
        exchange_rate: r.get(5)?,
        payment_type_id: r.get(6)?,
        payment_type_name: r.get(7)?,
        bank_account_id: r.get(8)?,
        due_date: r.get(9)?,
        check_number: r.get(10)?,
        transfer_to_cari_id: r.get(11)?,
        description: r.get(12)?,
        reference_id: r.get(13)?,
        reference_type: r.get(14)?,
        date: r.get(15)?,
        created_by: r.get(16)?,
        created_at: r.get(17)?,
    })
}

#[derive(Debug, Default, Clone)]
pub struct TransactionFilter {
    pub cari_id: Option<i64>,
    pub reference_id: Option<i64>,
    pub reference_type: Option<String>,
    pub transaction_type: Option<TransactionType>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

/// Inserts the entry and applies it to the cari balance. `today` is used when
/// the input carries no date.
pub fn insert_transaction(
    conn: &Connection,
    company_id: i64,
    input: &TransactionInput,
    created_by: Option<i64>,
    today: &str,
    now: i64,
) -> Result<Transaction, ServerError> {
    let p = &input.payment;
    let description = non_empty(p.description.clone()).unwrap_or_default();
    let date = non_empty(input.date.clone()).unwrap_or_else(|| today.to_string());

    conn.execute(
        r#"
        insert into transactions
          (company_id, cari_id, transaction_type, amount, currency, exchange_rate,
           payment_type_id, bank_account_id, due_date, check_number, transfer_to_cari_id,
           description, reference_id, reference_type, date, created_by, created_at)
        values (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
        params![
            company_id,
            input.cari_id,
            input.transaction_type,
            p.amount,
            p.currency,
            input.exchange_rate,
            p.payment_type_id,
            p.bank_account_id,
            non_empty(p.due_date.clone()),
            non_empty(p.check_number.clone()),
            p.transfer_to_cari_id,
            description,
            input.reference_id,
            input.reference_type,
            date,
            created_by,
            now
        ],
    )
    .map_err(|e| ServerError::DbError(format!("insert transaction failed: {e}")))?;
    let id = conn.last_insert_rowid();

    adjust_balance(
        conn,
        input.cari_id,
        p.currency,
        input.transaction_type.balance_sign() * p.amount,
    )?;

    get_transaction(conn, company_id, id)?
        .ok_or_else(|| ServerError::DbError("transaction vanished after insert".into()))
}

pub fn get_transaction(
    conn: &Connection,
    company_id: i64,
    id: i64,
) -> Result<Option<Transaction>, ServerError> {
    conn.query_row(
        &format!("{TRANSACTION_SELECT} where t.company_id = ? and t.id = ?"),
        params![company_id, id],
        transaction_from_row,
    )
    .optional()
    .map_err(|e| ServerError::DbError(format!("select transaction failed: {e}")))
}

pub fn list_transactions(
    conn: &Connection,
    company_id: i64,
    filter: &TransactionFilter,
) -> Result<Vec<Transaction>, ServerError> {
    let mut stmt = conn
        .prepare(&format!(
            r#"{TRANSACTION_SELECT}
            where t.company_id = ?1
              and (?2 is null or t.cari_id = ?2)
              and (?3 is null or t.reference_id = ?3)
              and (?4 is null or t.reference_type = ?4)
              and (?5 is null or t.transaction_type = ?5)
              and (?6 is null or t.date >= ?6)
              and (?7 is null or t.date <= ?7)
            order by t.date desc, t.id desc"#
        ))
        .map_err(|e| ServerError::DbError(format!("prepare list transactions failed: {e}")))?;
    let rows = stmt
        .query_map(
            params![
                company_id,
                filter.cari_id,
                filter.reference_id,
                filter.reference_type,
                filter.transaction_type,
                filter.date_from,
                filter.date_to
            ],
            transaction_from_row,
        )
        .map_err(|e| ServerError::DbError(format!("list transactions failed: {e}")))?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| ServerError::DbError(format!("read transaction row failed: {e}")))
}

/// Applies the after-the-fact reservation link. Amount and cari never change
/// here, so balances are untouched.
pub fn update_link(
    conn: &Connection,
    company_id: i64,
    id: i64,
    link: &TransactionLink,
) -> Result<Option<Transaction>, ServerError> {
    let n = conn
        .execute(
            r#"
            update transactions set
              reference_id = coalesce(?, reference_id),
              reference_type = coalesce(?, reference_type),
              description = coalesce(?, description)
            where company_id = ? and id = ?
            "#,
            params![
                link.reference_id,
                link.reference_type,
                link.description,
                company_id,
                id
            ],
        )
        .map_err(|e| ServerError::DbError(format!("update transaction link failed: {e}")))?;
    if n == 0 {
        return Ok(None);
    }
    get_transaction(conn, company_id, id)
}

/// Deletes an entry and reverts its balance effect.
pub fn delete_transaction(conn: &Connection, company_id: i64, id: i64) -> Result<bool, ServerError> {
    let Some(t) = get_transaction(conn, company_id, id)? else {
        return Ok(false);
    };
    conn.execute(
        "delete from transactions where company_id = ? and id = ?",
        params![company_id, id],
    )
    .map_err(|e| ServerError::DbError(format!("delete transaction failed: {e}")))?;
    adjust_balance(
        conn,
        t.cari_id,
        t.currency,
        -t.transaction_type.balance_sign() * t.amount,
    )?;
    Ok(true)
}

/// Deletes every entry of one type referencing `(reference_type, reference_id)`,
/// reverting balances. Returns how many were removed.
pub fn delete_referenced(
    conn: &Connection,
    company_id: i64,
    reference_type: &str,
    reference_id: i64,
    transaction_type: TransactionType,
) -> Result<usize, ServerError> {
    let filter = TransactionFilter {
        reference_id: Some(reference_id),
        reference_type: Some(reference_type.to_string()),
        transaction_type: Some(transaction_type),
        ..Default::default()
    };
    let entries = list_transactions(conn, company_id, &filter)?;
    for t in &entries {
        delete_transaction(conn, company_id, t.id)?;
    }
    Ok(entries.len())
}
