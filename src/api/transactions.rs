// api/transactions.rs
use astra::Request;

use crate::api::{path_id, read_json, Query};
use crate::auth::{Action, Module, Principal};
use crate::db::cari::get_cari;
use crate::db::cash_accounts::get_cash_account;
use crate::db::payment_types::get_payment_type;
use crate::db::reservations::get_reservation;
use crate::db::transactions::{
    delete_transaction, get_transaction, insert_transaction, list_transactions, update_link,
    TransactionFilter,
};
use crate::domain::ledger::{TransactionInput, TransactionLink, REFERENCE_RESERVATION};
use crate::domain::validation::{FieldError, Validator};
use crate::errors::ServerError;
use crate::responses::{created_json, message_json, ok_json, ResultResp};
use crate::router::AppState;

/// `GET /transactions?cari_id=&reference_id=&reference_type=&type=&date_from=&date_to=`
pub fn list(req: &mut Request, app: &AppState, who: &Principal) -> ResultResp {
    who.require(Module::Transactions, Action::View)?;
    let q = Query::from_request(req);
    let filter = TransactionFilter {
        cari_id: q.parse("cari_id")?,
        reference_id: q.parse("reference_id")?,
        reference_type: q.text("reference_type"),
        transaction_type: q.parse("type")?,
        date_from: q.date("date_from")?,
        date_to: q.date("date_to")?,
    };
    let entries = app
        .db
        .with_conn(|conn| list_transactions(conn, who.company_id(), &filter))?;
    ok_json(&entries)
}

pub fn get(app: &AppState, who: &Principal, id: &str) -> ResultResp {
    who.require(Module::Transactions, Action::View)?;
    let id = path_id(id)?;
    let t = app
        .db
        .with_conn(|conn| get_transaction(conn, who.company_id(), id))?
        .ok_or_else(|| ServerError::not_found("transaction"))?;
    ok_json(&t)
}

/// `POST /transactions`. Payments may be taken before their reservation
/// exists; such entries carry no reference until linked.
pub fn create(req: &mut Request, app: &AppState, who: &Principal) -> ResultResp {
    who.require(Module::Transactions, Action::Create)?;
    let input: TransactionInput = read_json(req)?;
    input.validate()?;
    let company_id = who.company_id();

    let t = app.db.with_tx(|tx| {
        let mut errors = Vec::new();
        if get_cari(tx, company_id, input.cari_id)?.is_none() {
            errors.push(FieldError::new("cari_id", "unknown cari account"));
        }
        let p = &input.payment;
        if let Some(id) = p.payment_type_id {
            if get_payment_type(tx, company_id, id)?.is_none() {
                errors.push(FieldError::new("payment_type_id", "unknown payment type"));
            }
        }
        if let Some(id) = p.bank_account_id {
            if get_cash_account(tx, company_id, id)?.is_none() {
                errors.push(FieldError::new("bank_account_id", "unknown bank account"));
            }
        }
        if let Some(id) = p.transfer_to_cari_id {
            if get_cari(tx, company_id, id)?.is_none() {
                errors.push(FieldError::new("transfer_to_cari_id", "unknown cari account"));
            }
        }
        if !errors.is_empty() {
            return Err(ServerError::Validation(errors));
        }
        insert_transaction(
            tx,
            company_id,
            &input,
            Some(who.user_id()),
            &app.clock.today_iso(),
            app.now(),
        )
    })?;

    tracing::info!(
        company_id,
        transaction_id = t.id,
        cari_id = t.cari_id,
        kind = t.transaction_type.as_str(),
        amount = t.amount,
        "transaction recorded"
    );
    created_json(&t)
}

/// `PUT /transactions/{id}`: sets the reservation link (and description)
/// after the fact. A reservation reference must point at a real reservation.
pub fn link(req: &mut Request, app: &AppState, who: &Principal, id: &str) -> ResultResp {
    who.require(Module::Transactions, Action::Edit)?;
    let id = path_id(id)?;
    let body: TransactionLink = read_json(req)?;
    let mut v = Validator::new();
    v.check(
        "reference_type",
        body.reference_id.is_none() || body.reference_type.is_some(),
        "required when reference_id is set",
    );
    v.finish()?;

    let company_id = who.company_id();
    let t = app.db.with_tx(|tx| {
        if let (Some(ref_id), Some(REFERENCE_RESERVATION)) =
            (body.reference_id, body.reference_type.as_deref())
        {
            if get_reservation(tx, company_id, ref_id)?.is_none() {
                return Err(ServerError::Validation(vec![FieldError::new(
                    "reference_id",
                    "unknown reservation",
                )]));
            }
        }
        update_link(tx, company_id, id, &body)
    })?;
    let t = t.ok_or_else(|| ServerError::not_found("transaction"))?;

    tracing::info!(
        company_id,
        transaction_id = t.id,
        reference_id = t.reference_id,
        "transaction linked"
    );
    ok_json(&t)
}

pub fn delete(app: &AppState, who: &Principal, id: &str) -> ResultResp {
    who.require(Module::Transactions, Action::Delete)?;
    let id = path_id(id)?;
    let removed = app
        .db
        .with_tx(|tx| delete_transaction(tx, who.company_id(), id))?;
    if !removed {
        return Err(ServerError::not_found("transaction"));
    }
    message_json("transaction deleted")
}
