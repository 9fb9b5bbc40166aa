// api/pricing.rs
use astra::Request;

use crate::api::{path_id, read_json, Query};
use crate::auth::{Action, Module, Principal, Role};
use crate::db::seasonal_prices::{delete_seasonal_price, insert_seasonal_price, list_seasonal_prices};
use crate::db::tour_types::get_tour_type;
use crate::domain::pricing::{quote as resolve_quote, SeasonalPriceInput};
use crate::domain::validation::{FieldError, Validator};
use crate::errors::ServerError;
use crate::responses::{created_json, message_json, ok_json, ResultResp};
use crate::router::AppState;

pub fn list(app: &AppState, who: &Principal) -> ResultResp {
    who.require(Module::Settings, Action::View)?;
    let prices = app
        .db
        .with_conn(|conn| list_seasonal_prices(conn, who.company_id()))?;
    ok_json(&prices)
}

pub fn create(req: &mut Request, app: &AppState, who: &Principal) -> ResultResp {
    who.require(Module::Settings, Action::Create)?;
    let input: SeasonalPriceInput = read_json(req)?;
    input.validate()?;
    let company_id = who.company_id();
    let now = app.now();

    let price = app.db.with_tx(|tx| {
        let id = insert_seasonal_price(tx, company_id, &input, now)?;
        list_seasonal_prices(tx, company_id)?
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| ServerError::DbError("seasonal price vanished after insert".into()))
    })?;

    tracing::info!(
        company_id,
        seasonal_price_id = price.id,
        start = %price.start_date,
        end = %price.end_date,
        "seasonal price created"
    );
    created_json(&price)
}

pub fn delete(app: &AppState, who: &Principal, id: &str) -> ResultResp {
    who.require(Module::Settings, Action::Delete)?;
    let id = path_id(id)?;
    let removed = app
        .db
        .with_conn(|conn| delete_seasonal_price(conn, who.company_id(), id))?;
    if !removed {
        return Err(ServerError::not_found("seasonal price"));
    }
    message_json("seasonal price deleted")
}

/// `GET /seasonal-prices/quote?date=&tour_type_id=&cari_id=&atv_count=`
///
/// Cari users always quote for their own account.
pub fn quote(req: &mut Request, app: &AppState, who: &Principal) -> ResultResp {
    let q = Query::from_request(req);
    let date = q.date("date")?;
    let tour_type_id: Option<i64> = q.parse("tour_type_id")?;
    let mut cari_id: Option<i64> = q.parse("cari_id")?;
    let atv_count: Option<i64> = q.parse("atv_count")?;
    if who.role() == Role::Cari {
        cari_id = who.user.cari_id;
    }

    let mut v = Validator::new();
    v.require("date", date.as_ref());
    v.finish()?;
    let date = date.unwrap_or_default();
    let company_id = who.company_id();

    let (prices, tour) = app.db.with_conn(|conn| {
        let tour = match tour_type_id {
            Some(id) => Some(get_tour_type(conn, company_id, id)?.ok_or_else(|| {
                ServerError::Validation(vec![FieldError::new("tour_type_id", "unknown tour type")])
            })?),
            None => None,
        };
        Ok((list_seasonal_prices(conn, company_id)?, tour))
    })?;

    let quote = resolve_quote(&prices, &date, tour.as_ref(), cari_id, atv_count.unwrap_or(1))
        .ok_or_else(|| ServerError::not_found("price for that date"))?;
    ok_json(&quote)
}
