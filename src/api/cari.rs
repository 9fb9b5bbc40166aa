// api/cari.rs
//
// Cari (agency / individual) accounts and their statements.
use astra::Request;
use serde::Serialize;

use crate::api::reservations::{views, ReservationView};
use crate::api::{path_id, read_json, Query};
use crate::auth::{Action, Module, Principal, Role};
use crate::db::cari::{delete_cari, get_cari, insert_cari, list_caris, reservation_count, update_cari};
use crate::db::reservations::{list_reservations, ReservationFilter};
use crate::db::seasonal_prices::apply_to_new_cari;
use crate::db::transactions::{list_transactions, TransactionFilter};
use crate::domain::ledger::Transaction;
use crate::domain::reference::{CariAccount, CariInput};
use crate::domain::validation::FieldError;
use crate::errors::ServerError;
use crate::responses::{created_json, message_json, ok_json, xlsx_response, ResultResp};
use crate::router::AppState;
use crate::spreadsheets::statement_workbook;

#[derive(Debug, Serialize)]
pub struct CariDetail {
    #[serde(flatten)]
    pub cari: CariAccount,
    pub transactions: Vec<Transaction>,
    pub reservations: Vec<ReservationView>,
}

/// Cari users may only read their own account.
fn check_own(who: &Principal, id: i64) -> Result<(), ServerError> {
    if who.role() == Role::Cari && who.user.cari_id != Some(id) {
        return Err(ServerError::not_found("cari account"));
    }
    Ok(())
}

/// `GET /cari-accounts?search=`
pub fn list(req: &mut Request, app: &AppState, who: &Principal) -> ResultResp {
    who.require(Module::Cari, Action::View)?;
    let search = Query::from_request(req).text("search");
    let mut caris = app
        .db
        .with_conn(|conn| list_caris(conn, who.company_id(), search.as_deref()))?;
    if who.role() == Role::Cari {
        caris.retain(|c| who.user.cari_id == Some(c.id));
    }
    ok_json(&caris)
}

pub fn detail(app: &AppState, who: &Principal, id: &str) -> ResultResp {
    who.require(Module::Cari, Action::View)?;
    let id = path_id(id)?;
    check_own(who, id)?;
    let company_id = who.company_id();

    let detail = app.db.with_conn(|conn| {
        let cari = get_cari(conn, company_id, id)?
            .ok_or_else(|| ServerError::not_found("cari account"))?;
        let transactions = list_transactions(
            conn,
            company_id,
            &TransactionFilter {
                cari_id: Some(id),
                ..Default::default()
            },
        )?;
        let reservations = list_reservations(
            conn,
            company_id,
            &ReservationFilter {
                cari_id: Some(id),
                ..Default::default()
            },
        )?;
        Ok(CariDetail {
            cari,
            transactions,
            reservations: views(reservations),
        })
    })?;
    ok_json(&detail)
}

/// `POST /cari-accounts`: the new account picks up every seasonal price
/// flagged for new caris.
pub fn create(req: &mut Request, app: &AppState, who: &Principal) -> ResultResp {
    who.require(Module::Cari, Action::Create)?;
    let input: CariInput = read_json(req)?;
    input.validate()?;
    let company_id = who.company_id();
    let now = app.now();

    let (cari, inherited) = app.db.with_tx(|tx| {
        let cari = insert_cari(tx, company_id, &input, now)?;
        let inherited = apply_to_new_cari(tx, company_id, cari.id)?;
        Ok((cari, inherited))
    })?;

    tracing::info!(company_id, cari_id = cari.id, inherited, "cari account created");
    created_json(&cari)
}

/// `PUT /cari-accounts/{id}`. The Münferit account is managed by the system.
pub fn update(req: &mut Request, app: &AppState, who: &Principal, id: &str) -> ResultResp {
    who.require(Module::Cari, Action::Edit)?;
    let id = path_id(id)?;
    let input: CariInput = read_json(req)?;
    if input.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(ServerError::Validation(vec![FieldError::new(
            "name",
            "must not be blank",
        )]));
    }
    let company_id = who.company_id();

    let updated = app.db.with_conn(|conn| {
        let existing = get_cari(conn, company_id, id)?
            .ok_or_else(|| ServerError::not_found("cari account"))?;
        if existing.is_munferit {
            return Err(ServerError::Conflict(
                "the Münferit account cannot be edited".into(),
            ));
        }
        update_cari(conn, company_id, id, &input)
    })?;
    let cari = updated.ok_or_else(|| ServerError::not_found("cari account"))?;
    ok_json(&cari)
}

/// `DELETE /cari-accounts/{id}`: refused for the Münferit account and for
/// accounts that still have reservations.
pub fn delete(app: &AppState, who: &Principal, id: &str) -> ResultResp {
    who.require(Module::Cari, Action::Delete)?;
    let id = path_id(id)?;
    let company_id = who.company_id();

    app.db.with_tx(|tx| {
        let cari = get_cari(tx, company_id, id)?
            .ok_or_else(|| ServerError::not_found("cari account"))?;
        if cari.is_munferit {
            return Err(ServerError::Conflict(
                "the Münferit account cannot be deleted".into(),
            ));
        }
        let booked = reservation_count(tx, id)?;
        if booked > 0 {
            return Err(ServerError::Conflict(format!(
                "cari account has {booked} reservation(s)"
            )));
        }
        delete_cari(tx, company_id, id)?;
        Ok(())
    })?;

    tracing::info!(company_id, cari_id = id, "cari account deleted");
    message_json("cari account deleted")
}

/// `GET /cari-accounts/{id}/statement.xlsx`
pub fn statement_xlsx(app: &AppState, who: &Principal, id: &str) -> ResultResp {
    who.require(Module::Cari, Action::View)?;
    let id = path_id(id)?;
    check_own(who, id)?;
    let company_id = who.company_id();

    let (cari, transactions) = app.db.with_conn(|conn| {
        let cari = get_cari(conn, company_id, id)?
            .ok_or_else(|| ServerError::not_found("cari account"))?;
        let transactions = list_transactions(
            conn,
            company_id,
            &TransactionFilter {
                cari_id: Some(id),
                ..Default::default()
            },
        )?;
        Ok((cari, transactions))
    })?;

    let buffer = statement_workbook(&cari, &transactions)?;
    xlsx_response(buffer, &format!("cari-{}-statement.xlsx", cari.id))
}
