// src/domain/cancellation.rs
use serde::{Deserialize, Serialize};

use crate::domain::currency::{Currency, ExchangeRates};
use crate::domain::validation::{FieldError, Validator};

/// Body of `PUT /reservations/{id}/cancel`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CancelRequest {
    pub reason: Option<String>,
    #[serde(default)]
    pub apply_no_show: bool,
    pub no_show_amount: Option<f64>,
    pub no_show_currency: Option<Currency>,
    /// Units of `no_show_currency` per EUR at the time of cancelling.
    pub exchange_rate: Option<f64>,
}

impl CancelRequest {
    pub fn plain(reason: Option<String>) -> Self {
        Self {
            reason,
            ..Default::default()
        }
    }

    /// Cancellation with a no-show penalty priced from the current rates table.
    pub fn with_no_show(
        reason: Option<String>,
        amount: f64,
        currency: Currency,
        rates: &ExchangeRates,
    ) -> Self {
        Self {
            reason,
            apply_no_show: true,
            no_show_amount: Some(amount),
            no_show_currency: Some(currency),
            exchange_rate: Some(rates.rate(currency)),
        }
    }

    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut v = Validator::new();
        if self.apply_no_show {
            v.require("no_show_amount", self.no_show_amount)
                .check(
                    "no_show_amount",
                    self.no_show_amount.map_or(true, |a| a.is_finite() && a > 0.0),
                    "must be greater than zero",
                )
                .require("no_show_currency", self.no_show_currency);
        }
        v.check(
            "exchange_rate",
            self.exchange_rate.map_or(true, |r| r.is_finite() && r > 0.0),
            "must be greater than zero",
        );
        v.finish()
    }

    /// The penalty to post, if one applies. Without an explicit rate the
    /// penalty is priced from `rates`.
    pub fn penalty(&self, rates: &ExchangeRates) -> Option<(f64, Currency, f64)> {
        if !self.apply_no_show {
            return None;
        }
        let amount = self.no_show_amount?;
        let currency = self.no_show_currency.unwrap_or_default();
        let rate = self.exchange_rate.unwrap_or_else(|| rates.rate(currency));
        Some((amount, currency, rate))
    }
}
