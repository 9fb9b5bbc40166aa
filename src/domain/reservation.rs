// src/domain/reservation.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::currency::Currency;
use crate::domain::validation::{FieldError, Validator};

/// Persisted lifecycle status.
///
/// `pending → confirmed → completed`, and any non-terminal state may move to
/// `cancelled`. `completed` and `cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl ReservationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Completed => "completed",
            ReservationStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ReservationStatus::Completed | ReservationStatus::Cancelled
        )
    }

    pub fn can_transition_to(self, next: ReservationStatus) -> bool {
        use ReservationStatus::*;
        match (self, next) {
            (Pending, Confirmed) | (Confirmed, Completed) => true,
            (from, Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReservationStatus::Pending),
            "confirmed" => Ok(ReservationStatus::Confirmed),
            "completed" => Ok(ReservationStatus::Completed),
            "cancelled" => Ok(ReservationStatus::Cancelled),
            other => Err(format!("unknown reservation status: {other}")),
        }
    }
}

impl rusqlite::ToSql for ReservationStatus {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl rusqlite::types::FromSql for ReservationStatus {
    fn column_result(value: rusqlite::types::ValueRef<'_>) -> rusqlite::types::FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| rusqlite::types::FromSqlError::Other(e.into()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub phone: Option<String>,
    pub email: Option<String>,
    pub nationality: Option<String>,
    pub id_number: Option<String>,
    pub birth_date: Option<String>,
}

impl CustomerDetails {
    pub fn is_empty(&self) -> bool {
        [
            &self.phone,
            &self.email,
            &self.nationality,
            &self.id_number,
            &self.birth_date,
        ]
        .iter()
        .all(|f| f.as_deref().map(str::trim).unwrap_or("").is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: i64,
    pub cari_id: i64,
    pub cari_name: String,
    /// True when `cari_id` is the company's individual (Münferit) pseudo-account.
    pub is_munferit: bool,
    pub customer_name: String,
    pub customer_contact: Option<String>,
    pub customer_details: Option<CustomerDetails>,
    pub date: String,
    pub time: String,
    pub tour_type_id: Option<i64>,
    pub tour_type_name: Option<String>,
    pub person_count: i64,
    pub atv_count: i64,
    pub pickup_location: Option<String>,
    pub pickup_maps_link: Option<String>,
    pub pickup_time: Option<String>,
    pub price: f64,
    pub currency: Currency,
    pub exchange_rate: f64,
    pub notes: Option<String>,
    pub status: ReservationStatus,
    pub voucher_code: String,
    pub has_payment: bool,
    pub no_show_applied: bool,
    pub no_show_amount: Option<f64>,
    pub no_show_currency: Option<Currency>,
    pub cancel_reason: Option<String>,
    pub created_by: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Body of `POST /reservations` and `PUT /reservations/{id}`.
///
/// On update, absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReservationInput {
    /// `None` books against the company's Münferit account.
    #[serde(default)]
    pub cari_id: Option<i64>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub tour_type_id: Option<i64>,
    pub customer_name: Option<String>,
    pub customer_contact: Option<String>,
    pub customer_details: Option<CustomerDetails>,
    pub person_count: Option<i64>,
    #[serde(alias = "vehicle_count")]
    pub atv_count: Option<i64>,
    pub pickup_location: Option<String>,
    pub pickup_maps_link: Option<String>,
    pub price: Option<f64>,
    pub currency: Option<Currency>,
    pub exchange_rate: Option<f64>,
    pub notes: Option<String>,
}

impl ReservationInput {
    pub fn validate_create(&self) -> Result<(), Vec<FieldError>> {
        let mut v = Validator::new();
        v.require_text("date", self.date.as_deref())
            .require_text("time", self.time.as_deref());
        self.check_values(&mut v);
        v.finish()
    }

    /// Absent `date`/`time` keep the stored value, but a blank one is an error.
    pub fn validate_update(&self) -> Result<(), Vec<FieldError>> {
        let mut v = Validator::new();
        v.check("date", not_blank(self.date.as_deref()), "field required")
            .check("time", not_blank(self.time.as_deref()), "field required");
        self.check_values(&mut v);
        v.finish()
    }

    fn check_values(&self, v: &mut Validator) {
        v.date("date", self.date.as_deref())
            .time("time", self.time.as_deref())
            .check(
                "person_count",
                self.person_count.map_or(true, |n| n >= 1),
                "must be at least 1",
            )
            .check(
                "atv_count",
                self.atv_count.map_or(true, |n| n >= 1),
                "must be at least 1",
            )
            .check(
                "price",
                self.price.map_or(true, |p| p.is_finite() && p >= 0.0),
                "must be zero or greater",
            )
            .check(
                "exchange_rate",
                self.exchange_rate.map_or(true, |r| r.is_finite() && r > 0.0),
                "must be greater than zero",
            );
    }
}

fn not_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| !v.trim().is_empty())
}

/// Splits a stored customer name at the first whitespace boundary.
///
/// "Ahmet Can Yılmaz" becomes ("Ahmet", "Can Yılmaz"), so multi-part first
/// names do not survive an edit round trip.
pub fn split_customer_name(full: &str) -> (String, String) {
    let full = full.trim();
    match full.split_once(char::is_whitespace) {
        Some((first, rest)) => (first.to_string(), rest.trim().to_string()),
        None => (full.to_string(), String::new()),
    }
}

pub fn join_customer_name(first: &str, last: &str) -> String {
    format!("{} {}", first.trim(), last.trim()).trim().to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentBadge {
    Received,
    NotReceived,
}

impl PaymentBadge {
    pub fn label(self) -> &'static str {
        match self {
            PaymentBadge::Received => "Alındı",
            PaymentBadge::NotReceived => "Alınmadı",
        }
    }

    /// Action offered next to the badge, if any.
    pub fn action(self) -> Option<&'static str> {
        match self {
            PaymentBadge::Received => None,
            PaymentBadge::NotReceived => Some("Tahsilat Ekle"),
        }
    }
}

/// Payment badge for individual-customer reservations; agency bookings settle
/// against the agency ledger and get none.
pub fn payment_badge(r: &Reservation) -> Option<PaymentBadge> {
    if !r.is_munferit || r.status == ReservationStatus::Cancelled {
        return None;
    }
    if r.has_payment {
        Some(PaymentBadge::Received)
    } else {
        Some(PaymentBadge::NotReceived)
    }
}

#[cfg(test)]
pub(crate) fn sample(id: i64, date: &str, time: &str, atv_count: i64) -> Reservation {
    Reservation {
        id,
        cari_id: 1,
        cari_name: "Sunset Travel".into(),
        is_munferit: false,
        customer_name: format!("Guest {id}"),
        customer_contact: None,
        customer_details: None,
        date: date.into(),
        time: time.into(),
        tour_type_id: None,
        tour_type_name: None,
        person_count: 1,
        atv_count,
        pickup_location: None,
        pickup_maps_link: None,
        pickup_time: None,
        price: 100.0,
        currency: Currency::EUR,
        exchange_rate: 1.0,
        notes: None,
        status: ReservationStatus::Confirmed,
        voucher_code: format!("VCHR-TEST-{id}"),
        has_payment: false,
        no_show_applied: false,
        no_show_amount: None,
        no_show_currency: None,
        cancel_reason: None,
        created_by: None,
        created_at: 0,
        updated_at: 0,
    }
}
