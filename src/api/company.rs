// api/company.rs
//
// Per-company settings: exchange rates, busy-hour threshold and profile.
use astra::Request;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::api::read_json;
use crate::auth::{Action, Module, Principal};
use crate::db::companies::{
    self, get_company, save_rates, stored_rates, update_profile as db_update_profile,
    CompanyProfileInput,
};
use crate::domain::currency::{round2, ExchangeRates};
use crate::domain::validation::Validator;
use crate::errors::ServerError;
use crate::rates_feed::fetch_or_fallback;
use crate::responses::{ok_json, ResultResp};
use crate::router::AppState;

/// Rates in force for a company: stored ones, else the configured fallback.
pub(crate) fn current_rates(
    conn: &Connection,
    company_id: i64,
    fallback: ExchangeRates,
) -> Result<ExchangeRates, ServerError> {
    Ok(stored_rates(conn, company_id)?
        .map(|(rates, _)| rates)
        .unwrap_or(fallback))
}

/// Threshold in force for a company.
pub(crate) fn threshold_for(
    conn: &Connection,
    company_id: i64,
    default: i64,
) -> Result<i64, ServerError> {
    Ok(companies::busy_hour_threshold(conn, company_id)?.unwrap_or(default))
}

#[derive(Debug, Serialize)]
pub struct RatesResponse {
    pub rates: ExchangeRates,
    pub updated_at: Option<i64>,
    /// `stored`, `live` or `fallback`.
    pub source: &'static str,
}

/// Compact strip for the page header.
#[derive(Debug, Serialize)]
pub struct RatesHeader {
    pub usd: f64,
    #[serde(rename = "try")]
    pub r#try: f64,
    pub eur_try: f64,
    pub usd_try: f64,
    pub updated_at: Option<i64>,
}

impl RatesHeader {
    fn new(rates: &ExchangeRates, updated_at: Option<i64>) -> Self {
        let usd_try = if rates.usd > 0.0 {
            round2(rates.r#try / rates.usd)
        } else {
            0.0
        };
        Self {
            usd: rates.usd,
            r#try: rates.r#try,
            eur_try: rates.r#try,
            usd_try,
            updated_at,
        }
    }
}

pub fn rates(app: &AppState, who: &Principal) -> ResultResp {
    let stored = app
        .db
        .with_conn(|conn| stored_rates(conn, who.company_id()))?;
    let body = match stored {
        Some((rates, at)) => RatesResponse {
            rates,
            updated_at: Some(at),
            source: "stored",
        },
        None => RatesResponse {
            rates: app.config.rates.fallback,
            updated_at: None,
            source: "fallback",
        },
    };
    ok_json(&body)
}

pub fn rates_header(app: &AppState, who: &Principal) -> ResultResp {
    let stored = app
        .db
        .with_conn(|conn| stored_rates(conn, who.company_id()))?;
    let header = match stored {
        Some((rates, at)) => RatesHeader::new(&rates, Some(at)),
        None => RatesHeader::new(&app.config.rates.fallback, None),
    };
    ok_json(&header)
}

#[derive(Debug, Deserialize)]
pub struct RatesInput {
    #[serde(alias = "USD")]
    pub usd: Option<f64>,
    #[serde(rename = "try", alias = "TRY")]
    pub r#try: Option<f64>,
}

/// `PUT /currency/rates`: manual override of the EUR-based table.
pub fn set_rates(req: &mut Request, app: &AppState, who: &Principal) -> ResultResp {
    who.require(Module::Settings, Action::Edit)?;
    let body: RatesInput = read_json(req)?;

    let positive = |v: Option<f64>| v.map_or(false, |r| r.is_finite() && r > 0.0);
    let mut v = Validator::new();
    v.check("usd", positive(body.usd), "must be greater than zero")
        .check("try", positive(body.r#try), "must be greater than zero");
    v.finish()?;

    let rates = ExchangeRates {
        eur: 1.0,
        usd: body.usd.unwrap_or_default(),
        r#try: body.r#try.unwrap_or_default(),
    };
    let now = app.now();
    app.db
        .with_conn(|conn| save_rates(conn, who.company_id(), &rates, now))?;
    tracing::info!(company_id = who.company_id(), usd = rates.usd, try_rate = rates.r#try, "rates set manually");

    ok_json(&RatesResponse {
        rates,
        updated_at: Some(now),
        source: "stored",
    })
}

/// `POST /currency/rates/refresh`: pull the live feed. A failing feed keeps
/// whatever the company already had and reports the fallback.
pub fn refresh_rates(app: &AppState, who: &Principal) -> ResultResp {
    who.require(Module::Settings, Action::View)?;
    let (rates, live) = fetch_or_fallback(app.rates.as_ref(), app.config.rates.fallback);
    let now = app.now();

    if !live {
        return rates_fallback(app, who);
    }

    app.db
        .with_conn(|conn| save_rates(conn, who.company_id(), &rates, now))?;
    tracing::info!(company_id = who.company_id(), "rates refreshed from live feed");
    ok_json(&RatesResponse {
        rates,
        updated_at: Some(now),
        source: "live",
    })
}

fn rates_fallback(app: &AppState, who: &Principal) -> ResultResp {
    let stored = app
        .db
        .with_conn(|conn| stored_rates(conn, who.company_id()))?;
    let (rates, updated_at) = match stored {
        Some((rates, at)) => (rates, Some(at)),
        None => (app.config.rates.fallback, None),
    };
    ok_json(&RatesResponse {
        rates,
        updated_at,
        source: "fallback",
    })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ThresholdBody {
    pub threshold: Option<i64>,
}

pub fn busy_hour_threshold(app: &AppState, who: &Principal) -> ResultResp {
    let default = app.config.dashboard.default_busy_hour_threshold;
    let threshold = app
        .db
        .with_conn(|conn| threshold_for(conn, who.company_id(), default))?;
    ok_json(&ThresholdBody {
        threshold: Some(threshold),
    })
}

pub fn set_busy_hour_threshold(req: &mut Request, app: &AppState, who: &Principal) -> ResultResp {
    who.require(Module::Settings, Action::Edit)?;
    let body: ThresholdBody = read_json(req)?;
    let mut v = Validator::new();
    v.require("threshold", body.threshold).check(
        "threshold",
        body.threshold.map_or(true, |t| t >= 1),
        "must be at least 1",
    );
    v.finish()?;

    let threshold = body.threshold.unwrap_or(1);
    app.db.with_conn(|conn| {
        companies::set_busy_hour_threshold(conn, who.company_id(), threshold)
    })?;
    ok_json(&ThresholdBody {
        threshold: Some(threshold),
    })
}

pub fn profile(app: &AppState, who: &Principal) -> ResultResp {
    let company = app
        .db
        .with_conn(|conn| get_company(conn, who.company_id()))?
        .ok_or_else(|| ServerError::not_found("company"))?;
    ok_json(&company)
}

pub fn update_profile(req: &mut Request, app: &AppState, who: &Principal) -> ResultResp {
    who.require_admin()?;
    let body: CompanyProfileInput = read_json(req)?;
    let mut v = Validator::new();
    v.check(
        "company_name",
        body.company_name.as_deref().map_or(true, |n| !n.trim().is_empty()),
        "must not be blank",
    )
    .check(
        "email",
        body.email
            .as_deref()
            .map_or(true, |e| e.trim().is_empty() || e.contains('@')),
        "invalid email address",
    );
    v.finish()?;

    let company = app
        .db
        .with_conn(|conn| db_update_profile(conn, who.company_id(), &body))?
        .ok_or_else(|| ServerError::not_found("company"))?;
    ok_json(&company)
}
