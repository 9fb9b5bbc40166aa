// src/domain/payment.rs
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::domain::currency::Currency;
use crate::domain::validation::{FieldError, Validator};

/// How a payment was taken. Stored on the payment type so each company can
/// name its own types ("Nakit", "Havale", ...) while keeping the rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentKind {
    #[default]
    Cash,
    BankTransfer,
    CreditCard,
    CheckPromissory,
    TransferToCari,
}

impl PaymentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentKind::Cash => "cash",
            PaymentKind::BankTransfer => "bank_transfer",
            PaymentKind::CreditCard => "credit_card",
            PaymentKind::CheckPromissory => "check_promissory",
            PaymentKind::TransferToCari => "transfer_to_cari",
        }
    }
}

impl FromStr for PaymentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(PaymentKind::Cash),
            "bank_transfer" => Ok(PaymentKind::BankTransfer),
            "credit_card" => Ok(PaymentKind::CreditCard),
            "check_promissory" => Ok(PaymentKind::CheckPromissory),
            "transfer_to_cari" => Ok(PaymentKind::TransferToCari),
            other => Err(format!("unknown payment kind: {other}")),
        }
    }
}

impl rusqlite::ToSql for PaymentKind {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl rusqlite::types::FromSql for PaymentKind {
    fn column_result(value: rusqlite::types::ValueRef<'_>) -> rusqlite::types::FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| rusqlite::types::FromSqlError::Other(e.into()))
    }
}

/// Conditional requirements per payment kind. Every submit path checks this
/// one table.
const KIND_RULES: &[(PaymentKind, &str)] = &[
    (PaymentKind::BankTransfer, "bank_account_id"),
    (PaymentKind::CreditCard, "bank_account_id"),
    (PaymentKind::CheckPromissory, "due_date"),
    (PaymentKind::TransferToCari, "transfer_to_cari_id"),
];

pub fn required_fields(kind: PaymentKind) -> Vec<&'static str> {
    KIND_RULES
        .iter()
        .filter(|(k, _)| *k == kind)
        .map(|(_, field)| *field)
        .collect()
}

/// A payment collected before or after the reservation exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PaymentDraft {
    pub amount: f64,
    #[serde(default)]
    pub currency: Currency,
    #[serde(default)]
    pub payment_kind: PaymentKind,
    pub payment_type_id: Option<i64>,
    pub bank_account_id: Option<i64>,
    pub due_date: Option<String>,
    pub check_number: Option<String>,
    pub transfer_to_cari_id: Option<i64>,
    pub description: Option<String>,
}

impl PaymentDraft {
    pub fn cash(amount: f64, currency: Currency) -> Self {
        Self {
            amount,
            currency,
            ..Default::default()
        }
    }

    fn has(&self, field: &str) -> bool {
        match field {
            "bank_account_id" => self.bank_account_id.is_some(),
            "due_date" => self
                .due_date
                .as_deref()
                .is_some_and(|d| !d.trim().is_empty()),
            "transfer_to_cari_id" => self.transfer_to_cari_id.is_some(),
            _ => true,
        }
    }

    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut v = Validator::new();
        v.check(
            "amount",
            self.amount.is_finite() && self.amount > 0.0,
            "must be greater than zero",
        );
        for field in required_fields(self.payment_kind) {
            v.check(
                field,
                self.has(field),
                &format!("required for {} payments", self.payment_kind.as_str()),
            );
        }
        v.date("due_date", self.due_date.as_deref());
        v.finish()
    }
}
