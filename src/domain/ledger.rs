// src/domain/ledger.rs
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::domain::currency::Currency;
use crate::domain::payment::PaymentDraft;
use crate::domain::validation::{FieldError, Validator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Borç: the cari owes us more.
    Debit,
    /// Alacak: we owe the cari.
    Credit,
    /// Tahsilat: money collected from the cari.
    Payment,
    /// İade: money handed back to the cari.
    Refund,
}

impl TransactionType {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::Debit => "debit",
            TransactionType::Credit => "credit",
            TransactionType::Payment => "payment",
            TransactionType::Refund => "refund",
        }
    }

    /// Direction the entry moves the cari balance.
    pub fn balance_sign(self) -> f64 {
        match self {
            TransactionType::Debit | TransactionType::Refund => 1.0,
            TransactionType::Credit | TransactionType::Payment => -1.0,
        }
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debit" => Ok(TransactionType::Debit),
            "credit" => Ok(TransactionType::Credit),
            "payment" => Ok(TransactionType::Payment),
            "refund" => Ok(TransactionType::Refund),
            other => Err(format!("unknown transaction type: {other}")),
        }
    }
}

impl rusqlite::ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl rusqlite::types::FromSql for TransactionType {
    fn column_result(value: rusqlite::types::ValueRef<'_>) -> rusqlite::types::FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| rusqlite::types::FromSqlError::Other(e.into()))
    }
}

pub const REFERENCE_RESERVATION: &str = "reservation";
/// Penalty debits posted when a cancelled booking is charged as a no-show.
pub const REFERENCE_NO_SHOW: &str = "no_show";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub cari_id: i64,
    pub transaction_type: TransactionType,
    pub amount: f64,
    pub currency: Currency,
    pub exchange_rate: f64,
    pub payment_type_id: Option<i64>,
    pub payment_type_name: Option<String>,
    pub bank_account_id: Option<i64>,
    pub due_date: Option<String>,
    pub check_number: Option<String>,
    pub transfer_to_cari_id: Option<i64>,
    pub description: String,
    pub reference_id: Option<i64>,
    pub reference_type: Option<String>,
    pub date: String,
    pub created_by: Option<i64>,
    pub created_at: i64,
}

/// Body of `POST /transactions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionInput {
    pub cari_id: i64,
    pub transaction_type: TransactionType,
    #[serde(flatten)]
    pub payment: PaymentDraft,
    #[serde(default = "default_rate")]
    pub exchange_rate: f64,
    pub reference_id: Option<i64>,
    pub reference_type: Option<String>,
    pub date: Option<String>,
}

fn default_rate() -> f64 {
    1.0
}

impl TransactionInput {
    pub fn payment(cari_id: i64, payment: PaymentDraft, exchange_rate: f64) -> Self {
        Self {
            cari_id,
            transaction_type: TransactionType::Payment,
            payment,
            exchange_rate,
            reference_id: None,
            reference_type: None,
            date: None,
        }
    }

    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut v = Validator::new();
        if self.transaction_type == TransactionType::Payment {
            if let Err(errors) = self.payment.validate() {
                v.extend(errors);
            }
        } else {
            v.check(
                "amount",
                self.payment.amount.is_finite() && self.payment.amount > 0.0,
                "must be greater than zero",
            );
        }
        v.check(
            "exchange_rate",
            self.exchange_rate.is_finite() && self.exchange_rate > 0.0,
            "must be greater than zero",
        )
        .check(
            "reference_type",
            self.reference_id.is_none() || self.reference_type.is_some(),
            "required when reference_id is set",
        )
        .date("date", self.date.as_deref());
        v.finish()
    }
}

/// Body of `PUT /transactions/{id}`: the after-the-fact link to a reservation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionLink {
    pub reference_id: Option<i64>,
    pub reference_type: Option<String>,
    pub description: Option<String>,
}

impl TransactionLink {
    pub fn reservation(reservation_id: i64) -> Self {
        Self {
            reference_id: Some(reservation_id),
            reference_type: Some(REFERENCE_RESERVATION.to_string()),
            description: None,
        }
    }
}
