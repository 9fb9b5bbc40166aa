// rates_feed.rs
use reqwest::blocking::Client;
use serde::Deserialize;
use std::collections::HashMap;

use crate::config::RatesConfig;
use crate::domain::currency::{round2, ExchangeRates};
use crate::errors::ServerError;

const USER_AGENT: &str = concat!("tourdesk/", env!("CARGO_PKG_VERSION"));

/// Anything that can produce EUR-based rates.
pub trait RatesSource: Send + Sync {
    fn fetch(&self) -> Result<ExchangeRates, ServerError>;
}

/// `{"base": "EUR", "rates": {"USD": 1.08, "TRY": 36.9, ...}}`
#[derive(Debug, Deserialize)]
pub struct FeedBody {
    #[serde(default)]
    pub base: Option<String>,
    pub rates: HashMap<String, f64>,
}

pub fn parse_feed(body: &FeedBody) -> Result<ExchangeRates, ServerError> {
    if let Some(base) = body.base.as_deref() {
        if !base.eq_ignore_ascii_case("EUR") {
            return Err(ServerError::Upstream(format!("unexpected rates base {base}")));
        }
    }
    let pick = |code: &str| {
        body.rates
            .get(code)
            .copied()
            .ok_or_else(|| ServerError::Upstream(format!("rates feed lacks {code}")))
    };
    let rates = ExchangeRates {
        eur: 1.0,
        usd: round4(pick("USD")?),
        r#try: round2(pick("TRY")?),
    };
    if !rates.is_sane() {
        return Err(ServerError::Upstream("rates feed returned non-positive rates".into()));
    }
    Ok(rates)
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

pub struct LiveRates {
    client: Client,
    url: String,
}

impl LiveRates {
    pub fn new(config: &RatesConfig) -> Result<Self, ServerError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout())
            .build()
            .map_err(|e| ServerError::Upstream(format!("rates client init failed: {e}")))?;
        Ok(Self {
            client,
            url: config.api_url.clone(),
        })
    }
}

impl RatesSource for LiveRates {
    fn fetch(&self) -> Result<ExchangeRates, ServerError> {
        let body: FeedBody = self
            .client
            .get(&self.url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| ServerError::Upstream(format!("rates request failed: {e}")))?
            .json()
            .map_err(|e| ServerError::Upstream(format!("rates body unreadable: {e}")))?;
        parse_feed(&body)
    }
}

/// Fixed table, used in tests and when no live client could be built.
pub struct StaticRates(pub ExchangeRates);

impl RatesSource for StaticRates {
    fn fetch(&self) -> Result<ExchangeRates, ServerError> {
        Ok(self.0)
    }
}

/// Rates from `source`, or `fallback` when the feed fails. The flag tells
/// whether the live feed answered.
pub fn fetch_or_fallback(source: &dyn RatesSource, fallback: ExchangeRates) -> (ExchangeRates, bool) {
    match source.fetch() {
        Ok(rates) => (rates, true),
        Err(e) => {
            tracing::warn!(error = %e, "live rates unavailable, using fallback table");
            (fallback, false)
        }
    }
}
