// src/domain/currency.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Currency {
    #[default]
    EUR,
    USD,
    TRY,
}

impl Currency {
    pub const ALL: [Currency; 3] = [Currency::EUR, Currency::USD, Currency::TRY];

    pub fn as_str(self) -> &'static str {
        match self {
            Currency::EUR => "EUR",
            Currency::USD => "USD",
            Currency::TRY => "TRY",
        }
    }

    /// Cari balance column holding this currency.
    pub fn balance_column(self) -> &'static str {
        match self {
            Currency::EUR => "balance_eur",
            Currency::USD => "balance_usd",
            Currency::TRY => "balance_try",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EUR" => Ok(Currency::EUR),
            "USD" => Ok(Currency::USD),
            "TRY" => Ok(Currency::TRY),
            other => Err(format!("unsupported currency: {other}")),
        }
    }
}

impl rusqlite::ToSql for Currency {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl rusqlite::types::FromSql for Currency {
    fn column_result(value: rusqlite::types::ValueRef<'_>) -> rusqlite::types::FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| rusqlite::types::FromSqlError::Other(e.into()))
    }
}

/// Units of each currency per one EUR.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRates {
    #[serde(rename = "EUR", default = "one")]
    pub eur: f64,
    #[serde(rename = "USD")]
    pub usd: f64,
    #[serde(rename = "TRY")]
    pub r#try: f64,
}

fn one() -> f64 {
    1.0
}

impl Default for ExchangeRates {
    /// Used whenever neither stored nor live rates are available.
    fn default() -> Self {
        Self {
            eur: 1.0,
            usd: 1.1,
            r#try: 35.0,
        }
    }
}

impl ExchangeRates {
    pub fn rate(&self, currency: Currency) -> f64 {
        match currency {
            Currency::EUR => self.eur,
            Currency::USD => self.usd,
            Currency::TRY => self.r#try,
        }
    }

    pub fn convert(&self, amount: f64, from: Currency, to: Currency) -> f64 {
        if from == to {
            return amount;
        }
        let in_eur = amount / self.rate(from);
        round2(in_eur * self.rate(to))
    }

    pub fn is_sane(&self) -> bool {
        Currency::ALL
            .iter()
            .all(|c| self.rate(*c).is_finite() && self.rate(*c) > 0.0)
    }
}

pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
