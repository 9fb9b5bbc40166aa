// src/domain/reference.rs
//
// Reference entities the reservation form reads: cari accounts, tour types,
// payment types and cash/bank accounts.
use serde::{Deserialize, Serialize};

use crate::domain::currency::Currency;
use crate::domain::payment::PaymentKind;
use crate::domain::timeline::MAX_TOUR_HOURS;
use crate::domain::validation::{FieldError, Validator};

pub const MUNFERIT_NAME: &str = "Münferit";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CariAccount {
    pub id: i64,
    pub name: String,
    pub is_munferit: bool,
    pub authorized_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub tax_office: Option<String>,
    pub tax_number: Option<String>,
    pub pickup_location: Option<String>,
    pub pickup_maps_link: Option<String>,
    pub notes: Option<String>,
    pub balance_eur: f64,
    pub balance_usd: f64,
    pub balance_try: f64,
    pub created_at: i64,
}

impl CariAccount {
    pub fn balance(&self, currency: Currency) -> f64 {
        match currency {
            Currency::EUR => self.balance_eur,
            Currency::USD => self.balance_usd,
            Currency::TRY => self.balance_try,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CariInput {
    pub name: Option<String>,
    pub authorized_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub tax_office: Option<String>,
    pub tax_number: Option<String>,
    pub pickup_location: Option<String>,
    pub pickup_maps_link: Option<String>,
    pub notes: Option<String>,
}

impl CariInput {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut v = Validator::new();
        v.require_text("name", self.name.as_deref()).check(
            "email",
            self.email
                .as_deref()
                .map_or(true, |e| e.trim().is_empty() || e.contains('@')),
            "invalid email address",
        );
        v.finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TourType {
    pub id: i64,
    pub name: String,
    pub duration_hours: Option<f64>,
    pub default_price: f64,
    pub default_currency: Currency,
    pub color: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TourTypeInput {
    pub name: Option<String>,
    pub duration_hours: Option<f64>,
    pub default_price: Option<f64>,
    pub default_currency: Option<Currency>,
    pub color: Option<String>,
    pub description: Option<String>,
}

impl TourTypeInput {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut v = Validator::new();
        v.require_text("name", self.name.as_deref())
            .check(
                "duration_hours",
                self.duration_hours
                    .map_or(true, |h| h.is_finite() && h > 0.0 && h <= MAX_TOUR_HOURS),
                "must be greater than zero and at most 24",
            )
            .check(
                "default_price",
                self.default_price.map_or(true, |p| p.is_finite() && p >= 0.0),
                "must be zero or greater",
            )
            .check(
                "color",
                self.color.as_deref().map_or(true, is_hex_color),
                "expected a #rrggbb color",
            );
        v.finish()
    }
}

fn is_hex_color(value: &str) -> bool {
    let value = value.trim();
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentType {
    pub id: i64,
    pub name: String,
    pub kind: PaymentKind,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentTypeInput {
    pub name: Option<String>,
    #[serde(default)]
    pub kind: PaymentKind,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CashAccountKind {
    #[default]
    Cash,
    Bank,
}

impl CashAccountKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CashAccountKind::Cash => "cash",
            CashAccountKind::Bank => "bank",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashAccount {
    pub id: i64,
    pub name: String,
    pub account_type: CashAccountKind,
    pub currency: Currency,
    pub bank_name: Option<String>,
    pub iban: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CashAccountInput {
    pub name: Option<String>,
    #[serde(default)]
    pub account_type: CashAccountKind,
    #[serde(default)]
    pub currency: Currency,
    pub bank_name: Option<String>,
    pub iban: Option<String>,
}

impl CashAccountInput {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut v = Validator::new();
        v.require_text("name", self.name.as_deref());
        if self.account_type == CashAccountKind::Bank {
            v.require_text("iban", self.iban.as_deref());
        }
        v.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cari_requires_name() {
        let errors = CariInput::default().validate().unwrap_err();
        assert_eq!(errors[0].field(), "name");

        let input = CariInput {
            name: Some("Sunset Travel".into()),
            email: Some("ops@sunset.example".into()),
            ..Default::default()
        };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn tour_type_color_must_be_hex() {
        let mut input = TourTypeInput {
            name: Some("Sunset ATV".into()),
            color: Some("orange".into()),
            ..Default::default()
        };
        assert_eq!(input.validate().unwrap_err()[0].field(), "color");
        input.color = Some("#f97316".into());
        assert!(input.validate().is_ok());
    }

    #[test]
    fn tour_type_duration_is_bounded() {
        let mut input = TourTypeInput {
            name: Some("Canyon".into()),
            duration_hours: Some(1e9),
            ..Default::default()
        };
        assert_eq!(input.validate().unwrap_err()[0].field(), "duration_hours");
        input.duration_hours = Some(24.0);
        assert!(input.validate().is_ok());
    }

    #[test]
    fn bank_accounts_need_iban() {
        let input = CashAccountInput {
            name: Some("Ziraat".into()),
            account_type: CashAccountKind::Bank,
            ..Default::default()
        };
        assert_eq!(input.validate().unwrap_err()[0].field(), "iban");
    }
}
