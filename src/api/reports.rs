// api/reports.rs
//
// Read-only reporting over reservations and the ledger. Money is never summed
// across currencies; every total is reported per currency.
use astra::Request;
use serde::Serialize;

use crate::api::Query;
use crate::auth::{Action, Module, Principal};
use crate::db::cari::list_caris;
use crate::db::reservations::{list_reservations, ReservationFilter};
use crate::db::transactions::{list_transactions, TransactionFilter};
use crate::domain::currency::{round2, Currency};
use crate::domain::ledger::{Transaction, TransactionType};
use crate::domain::reference::CariAccount;
use crate::domain::reservation::{Reservation, ReservationStatus};
use crate::errors::ServerError;
use crate::responses::{ok_json, xlsx_response, ResultResp};
use crate::router::AppState;
use crate::spreadsheets::reservations_workbook;

const CURRENCIES: [Currency; 3] = [Currency::EUR, Currency::USD, Currency::TRY];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrencyTotal {
    pub currency: Currency,
    pub count: usize,
    pub amount: f64,
}

/// One row per currency, in EUR/USD/TRY order, zero rows included.
pub fn per_currency<T>(items: &[T], key: impl Fn(&T) -> Option<(Currency, f64)>) -> Vec<CurrencyTotal> {
    CURRENCIES
        .iter()
        .map(|&currency| {
            let matching: Vec<f64> = items
                .iter()
                .filter_map(&key)
                .filter(|(c, _)| *c == currency)
                .map(|(_, amount)| amount)
                .collect();
            CurrencyTotal {
                currency,
                count: matching.len(),
                amount: round2(matching.iter().sum()),
            }
        })
        .collect()
}

#[derive(Debug, Default)]
struct Period {
    date_from: Option<String>,
    date_to: Option<String>,
}

impl Period {
    fn from_query(q: &Query) -> Result<Self, ServerError> {
        Ok(Self {
            date_from: q.date("date_from")?,
            date_to: q.date("date_to")?,
        })
    }

    fn label(&self) -> String {
        match (&self.date_from, &self.date_to) {
            (Some(from), Some(to)) => format!("{from} - {to}"),
            (Some(from), None) => format!("{from} -"),
            (None, Some(to)) => format!("- {to}"),
            (None, None) => "Tümü".to_string(),
        }
    }

    fn reservations(&self, status: Option<ReservationStatus>) -> ReservationFilter {
        ReservationFilter {
            status,
            date_from: self.date_from.clone(),
            date_to: self.date_to.clone(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EarningsReport {
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub reservation_count: usize,
    pub atv_total: i64,
    pub totals: Vec<CurrencyTotal>,
}

pub fn earnings_of(reservations: &[Reservation]) -> (usize, i64, Vec<CurrencyTotal>) {
    let live: Vec<&Reservation> = reservations
        .iter()
        .filter(|r| r.status != ReservationStatus::Cancelled)
        .collect();
    let totals = per_currency(&live, |r| Some((r.currency, r.price)));
    (live.len(), live.iter().map(|r| r.atv_count).sum(), totals)
}

/// `GET /reports/earnings?date_from=&date_to=`
pub fn earnings(req: &mut Request, app: &AppState, who: &Principal) -> ResultResp {
    who.require(Module::Reports, Action::View)?;
    let period = Period::from_query(&Query::from_request(req))?;
    let reservations = app
        .db
        .with_conn(|conn| list_reservations(conn, who.company_id(), &period.reservations(None)))?;

    let (reservation_count, atv_total, totals) = earnings_of(&reservations);
    ok_json(&EarningsReport {
        date_from: period.date_from,
        date_to: period.date_to,
        reservation_count,
        atv_total,
        totals,
    })
}

#[derive(Debug, Serialize)]
pub struct PaymentTypeTotal {
    pub payment_type: String,
    pub totals: Vec<CurrencyTotal>,
}

#[derive(Debug, Serialize)]
pub struct CollectionsReport {
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub totals: Vec<CurrencyTotal>,
    pub by_payment_type: Vec<PaymentTypeTotal>,
}

pub fn collections_of(payments: &[Transaction]) -> (Vec<CurrencyTotal>, Vec<PaymentTypeTotal>) {
    let totals = per_currency(payments, |t| Some((t.currency, t.amount)));

    let mut names: Vec<String> = payments
        .iter()
        .map(|t| t.payment_type_name.clone().unwrap_or_else(|| "-".to_string()))
        .collect();
    names.sort();
    names.dedup();

    let by_payment_type = names
        .into_iter()
        .map(|name| {
            let totals = per_currency(payments, |t| {
                (t.payment_type_name.as_deref().unwrap_or("-") == name)
                    .then_some((t.currency, t.amount))
            });
            PaymentTypeTotal {
                payment_type: name,
                totals,
            }
        })
        .collect();
    (totals, by_payment_type)
}

/// `GET /reports/collections?date_from=&date_to=`: payments received.
pub fn collections(req: &mut Request, app: &AppState, who: &Principal) -> ResultResp {
    who.require(Module::Reports, Action::View)?;
    let period = Period::from_query(&Query::from_request(req))?;
    let filter = TransactionFilter {
        transaction_type: Some(TransactionType::Payment),
        date_from: period.date_from.clone(),
        date_to: period.date_to.clone(),
        ..Default::default()
    };
    let payments = app
        .db
        .with_conn(|conn| list_transactions(conn, who.company_id(), &filter))?;

    let (totals, by_payment_type) = collections_of(&payments);
    ok_json(&CollectionsReport {
        date_from: period.date_from,
        date_to: period.date_to,
        totals,
        by_payment_type,
    })
}

#[derive(Debug, Serialize)]
pub struct BalanceReport {
    pub accounts: Vec<CariAccount>,
    pub totals: Vec<CurrencyTotal>,
}

/// Accounts with at least one balance on the requested side of zero; totals
/// sum only that side.
fn balances(caris: Vec<CariAccount>, owing: bool) -> BalanceReport {
    let side = |v: f64| if owing { v > 0.0 } else { v < 0.0 };
    let accounts: Vec<CariAccount> = caris
        .into_iter()
        .filter(|c| CURRENCIES.iter().any(|&cur| side(c.balance(cur))))
        .collect();
    let totals = CURRENCIES
        .iter()
        .map(|&currency| {
            let values: Vec<f64> = accounts
                .iter()
                .map(|c| c.balance(currency))
                .filter(|v| side(*v))
                .collect();
            CurrencyTotal {
                currency,
                count: values.len(),
                amount: round2(values.iter().sum()),
            }
        })
        .collect();
    BalanceReport { accounts, totals }
}

/// `GET /reports/debtors`: caris that owe the company.
pub fn debtors(app: &AppState, who: &Principal) -> ResultResp {
    who.require(Module::Reports, Action::View)?;
    let caris = app
        .db
        .with_conn(|conn| list_caris(conn, who.company_id(), None))?;
    ok_json(&balances(caris, true))
}

/// `GET /reports/creditors`: caris the company owes.
pub fn creditors(app: &AppState, who: &Principal) -> ResultResp {
    who.require(Module::Reports, Action::View)?;
    let caris = app
        .db
        .with_conn(|conn| list_caris(conn, who.company_id(), None))?;
    ok_json(&balances(caris, false))
}

#[derive(Debug, Serialize)]
pub struct CancelledReport {
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub cancelled_count: usize,
    pub no_show_count: usize,
    pub lost_revenue: Vec<CurrencyTotal>,
    pub no_show_totals: Vec<CurrencyTotal>,
    pub reservations: Vec<Reservation>,
}

/// `GET /reports/cancelled?date_from=&date_to=`
pub fn cancelled(req: &mut Request, app: &AppState, who: &Principal) -> ResultResp {
    who.require(Module::Reports, Action::View)?;
    let period = Period::from_query(&Query::from_request(req))?;
    let filter = period.reservations(Some(ReservationStatus::Cancelled));
    let reservations = app
        .db
        .with_conn(|conn| list_reservations(conn, who.company_id(), &filter))?;

    let no_show_totals = per_currency(&reservations, |r| {
        match (r.no_show_applied, r.no_show_amount, r.no_show_currency) {
            (true, Some(amount), Some(currency)) => Some((currency, amount)),
            _ => None,
        }
    });
    ok_json(&CancelledReport {
        date_from: period.date_from,
        date_to: period.date_to,
        cancelled_count: reservations.len(),
        no_show_count: reservations.iter().filter(|r| r.no_show_applied).count(),
        lost_revenue: per_currency(&reservations, |r| Some((r.currency, r.price))),
        no_show_totals,
        reservations,
    })
}

/// `GET /reports/reservations.xlsx?date_from=&date_to=&status=`
pub fn reservations_xlsx(req: &mut Request, app: &AppState, who: &Principal) -> ResultResp {
    who.require(Module::Reports, Action::View)?;
    let q = Query::from_request(req);
    let period = Period::from_query(&q)?;
    let filter = period.reservations(q.parse("status")?);
    let reservations = app
        .db
        .with_conn(|conn| list_reservations(conn, who.company_id(), &filter))?;

    let buffer = reservations_workbook(&reservations, &period.label())?;
    tracing::info!(
        company_id = who.company_id(),
        rows = reservations.len(),
        "reservations workbook exported"
    );
    xlsx_response(buffer, "reservations.xlsx")
}
