use astra::Request;
use std::sync::Arc;

use crate::api;
use crate::auth::authenticate;
use crate::clock::Clock;
use crate::config::Config;
use crate::db::Database;
use crate::errors::ServerError;
use crate::rates_feed::RatesSource;
use crate::responses::{message_json, ResultResp};

/// Everything a handler needs besides the request itself.
pub struct AppState {
    pub db: Database,
    pub config: Config,
    pub rates: Arc<dyn RatesSource>,
    pub clock: Clock,
}

impl AppState {
    pub fn new(db: Database, config: Config, rates: Arc<dyn RatesSource>) -> Self {
        Self {
            db,
            config,
            rates,
            clock: Clock::System,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn now(&self) -> i64 {
        self.clock.unix()
    }
}

/// Routes are served both bare and under `/api`.
fn route_path(path: &str) -> &str {
    match path.strip_prefix("/api") {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => path,
    }
}

pub fn handle(mut req: Request, app: &AppState) -> ResultResp {
    let method = req.method().as_str().to_string();
    let full_path = req.uri().path().to_string();
    tracing::debug!(method = %method, path = %full_path, "request");

    let segments: Vec<&str> = route_path(&full_path)
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    // Public routes
    match (method.as_str(), segments.as_slice()) {
        ("GET", ["health"]) => return message_json("ok"),
        ("POST", ["auth", "register"]) => return api::auth::register(&mut req, app),
        ("POST", ["auth", "login"]) => return api::auth::login(&mut req, app),
        ("POST", ["demo-requests"]) => return api::admin::create_demo_request(&mut req, app),
        _ => {}
    }

    let who = authenticate(&req, &app.db, app.now())?;
    let req = &mut req;

    match (method.as_str(), segments.as_slice()) {
        // Session
        ("GET", ["auth", "me"]) => api::auth::me(app, &who),
        ("POST", ["auth", "logout"]) => api::auth::logout(app, &who),
        ("GET", ["users"]) => api::auth::list_users(app, &who),
        ("POST", ["users"]) => api::auth::create_user(req, app, &who),

        // Reservations
        ("GET", ["reservations"]) => api::reservations::list(req, app, &who),
        ("POST", ["reservations"]) => api::reservations::create(req, app, &who),
        ("GET", ["reservations", "pending"]) => api::reservations::pending(app, &who),
        ("GET", ["reservations", id]) => api::reservations::get(app, &who, id),
        ("PUT", ["reservations", id]) => api::reservations::update(req, app, &who, id),
        ("DELETE", ["reservations", id]) => api::reservations::delete(app, &who, id),
        ("POST", ["reservations", id, "complete"]) => api::reservations::complete(app, &who, id),
        ("POST", ["reservations", id, "approve"]) => api::reservations::approve(req, app, &who, id),
        ("POST", ["reservations", id, "reject"]) => api::reservations::reject(req, app, &who, id),
        ("PUT", ["reservations", id, "cancel"]) => api::reservations::cancel(req, app, &who, id),
        ("GET", ["reservations", id, "voucher"]) => api::reservations::voucher(app, &who, id),
        ("POST", ["bookings"]) => api::reservations::book(req, app, &who),

        // Ledger
        ("GET", ["transactions"]) => api::transactions::list(req, app, &who),
        ("POST", ["transactions"]) => api::transactions::create(req, app, &who),
        ("GET", ["transactions", id]) => api::transactions::get(app, &who, id),
        ("PUT", ["transactions", id]) => api::transactions::link(req, app, &who, id),
        ("DELETE", ["transactions", id]) => api::transactions::delete(app, &who, id),

        // Cari accounts
        ("GET", ["cari-accounts"]) => api::cari::list(req, app, &who),
        ("POST", ["cari-accounts"]) => api::cari::create(req, app, &who),
        ("GET", ["cari-accounts", id]) => api::cari::detail(app, &who, id),
        ("PUT", ["cari-accounts", id]) => api::cari::update(req, app, &who, id),
        ("DELETE", ["cari-accounts", id]) => api::cari::delete(app, &who, id),
        ("GET", ["cari-accounts", id, "statement.xlsx"]) => api::cari::statement_xlsx(app, &who, id),

        // Reference data
        ("GET", ["tour-types"]) => api::reference::list_tour_types(app, &who),
        ("POST", ["tour-types"]) => api::reference::create_tour_type(req, app, &who),
        ("DELETE", ["tour-types", id]) => api::reference::delete_tour_type(app, &who, id),
        ("GET", ["payment-types"]) => api::reference::list_payment_types(app, &who),
        ("POST", ["payment-types"]) => api::reference::create_payment_type(req, app, &who),
        ("DELETE", ["payment-types", id]) => api::reference::delete_payment_type(app, &who, id),
        ("GET", ["cash-accounts"]) => api::reference::list_cash_accounts(app, &who),
        ("POST", ["cash-accounts"]) => api::reference::create_cash_account(req, app, &who),
        ("DELETE", ["cash-accounts", id]) => api::reference::delete_cash_account(app, &who, id),

        // Seasonal pricing
        ("GET", ["seasonal-prices"]) => api::pricing::list(app, &who),
        ("POST", ["seasonal-prices"]) => api::pricing::create(req, app, &who),
        ("GET", ["seasonal-prices", "quote"]) => api::pricing::quote(req, app, &who),
        ("DELETE", ["seasonal-prices", id]) => api::pricing::delete(app, &who, id),

        // Company settings
        ("GET", ["currency", "rates"]) => api::company::rates(app, &who),
        ("PUT", ["currency", "rates"]) => api::company::set_rates(req, app, &who),
        ("GET", ["currency", "rates", "header"]) => api::company::rates_header(app, &who),
        ("POST", ["currency", "rates", "refresh"]) => api::company::refresh_rates(app, &who),
        ("GET", ["busy-hour-threshold"]) => api::company::busy_hour_threshold(app, &who),
        ("PUT", ["busy-hour-threshold"]) => api::company::set_busy_hour_threshold(req, app, &who),
        ("GET", ["company", "profile"]) => api::company::profile(app, &who),
        ("PUT", ["company", "profile"]) => api::company::update_profile(req, app, &who),

        // Operational views
        ("GET", ["dashboard"]) => api::dashboard::dashboard(req, app, &who),
        ("GET", ["calendar"]) => api::dashboard::calendar(req, app, &who),

        // Notifications
        ("GET", ["notifications"]) => api::notifications::list(req, app, &who),
        ("POST", ["notifications", "mark-read"]) => api::notifications::mark_read(req, app, &who),
        ("POST", ["notifications", "batch"]) => api::notifications::batch(req, app, &who),

        // Reports
        ("GET", ["reports", "earnings"]) => api::reports::earnings(req, app, &who),
        ("GET", ["reports", "collections"]) => api::reports::collections(req, app, &who),
        ("GET", ["reports", "debtors"]) => api::reports::debtors(app, &who),
        ("GET", ["reports", "creditors"]) => api::reports::creditors(app, &who),
        ("GET", ["reports", "cancelled"]) => api::reports::cancelled(req, app, &who),
        ("GET", ["reports", "reservations.xlsx"]) => api::reports::reservations_xlsx(req, app, &who),

        // Super admin
        ("GET", ["super-admin", "demo-requests"]) => api::admin::list_demo_requests(app, &who),

        _ => Err(ServerError::NotFound(format!("no route for {method} {full_path}"))),
    }
}
