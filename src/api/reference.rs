// api/reference.rs
//
// Tour types, payment types and cash/bank accounts. Any signed-in user may
// read them since the reservation form needs them; changes need settings
// permissions.
use astra::Request;

use crate::api::{path_id, read_json};
use crate::auth::{Action, Module, Principal};
use crate::db::{cash_accounts, payment_types, tour_types};
use crate::domain::reference::{CashAccountInput, PaymentTypeInput, TourTypeInput};
use crate::domain::validation::Validator;
use crate::errors::ServerError;
use crate::responses::{created_json, message_json, ok_json, ResultResp};
use crate::router::AppState;

pub fn list_tour_types(app: &AppState, who: &Principal) -> ResultResp {
    let types = app
        .db
        .with_conn(|conn| tour_types::list_tour_types(conn, who.company_id()))?;
    ok_json(&types)
}

pub fn create_tour_type(req: &mut Request, app: &AppState, who: &Principal) -> ResultResp {
    who.require(Module::Settings, Action::Create)?;
    let input: TourTypeInput = read_json(req)?;
    input.validate()?;
    let tour = app
        .db
        .with_conn(|conn| tour_types::insert_tour_type(conn, who.company_id(), &input))?;
    tracing::info!(company_id = who.company_id(), tour_type_id = tour.id, "tour type created");
    created_json(&tour)
}

/// Reservations keep their denormalised tour name after the type is gone.
pub fn delete_tour_type(app: &AppState, who: &Principal, id: &str) -> ResultResp {
    who.require(Module::Settings, Action::Delete)?;
    let id = path_id(id)?;
    let removed = app
        .db
        .with_conn(|conn| tour_types::delete_tour_type(conn, who.company_id(), id))?;
    if !removed {
        return Err(ServerError::not_found("tour type"));
    }
    message_json("tour type deleted")
}

pub fn list_payment_types(app: &AppState, who: &Principal) -> ResultResp {
    let types = app
        .db
        .with_conn(|conn| payment_types::list_payment_types(conn, who.company_id()))?;
    ok_json(&types)
}

pub fn create_payment_type(req: &mut Request, app: &AppState, who: &Principal) -> ResultResp {
    who.require(Module::Settings, Action::Create)?;
    let input: PaymentTypeInput = read_json(req)?;
    let mut v = Validator::new();
    v.require_text("name", input.name.as_deref());
    v.finish()?;

    let payment_type = app
        .db
        .with_conn(|conn| payment_types::insert_payment_type(conn, who.company_id(), &input))?;
    created_json(&payment_type)
}

pub fn delete_payment_type(app: &AppState, who: &Principal, id: &str) -> ResultResp {
    who.require(Module::Settings, Action::Delete)?;
    let id = path_id(id)?;
    let removed = app
        .db
        .with_conn(|conn| payment_types::delete_payment_type(conn, who.company_id(), id))?;
    if !removed {
        return Err(ServerError::not_found("payment type"));
    }
    message_json("payment type deleted")
}

pub fn list_cash_accounts(app: &AppState, who: &Principal) -> ResultResp {
    let accounts = app
        .db
        .with_conn(|conn| cash_accounts::list_cash_accounts(conn, who.company_id()))?;
    ok_json(&accounts)
}

pub fn create_cash_account(req: &mut Request, app: &AppState, who: &Principal) -> ResultResp {
    who.require(Module::Settings, Action::Create)?;
    let input: CashAccountInput = read_json(req)?;
    input.validate()?;
    let account = app
        .db
        .with_conn(|conn| cash_accounts::insert_cash_account(conn, who.company_id(), &input))?;
    created_json(&account)
}

pub fn delete_cash_account(app: &AppState, who: &Principal, id: &str) -> ResultResp {
    who.require(Module::Settings, Action::Delete)?;
    let id = path_id(id)?;
    let removed = app
        .db
        .with_conn(|conn| cash_accounts::delete_cash_account(conn, who.company_id(), id))?;
    if !removed {
        return Err(ServerError::not_found("cash account"));
    }
    message_json("cash account deleted")
}
