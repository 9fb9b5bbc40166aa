// client/api.rs
use http::Method;
use serde::Deserialize;

use crate::client::http::{ApiClient, ApiError, Transport};
use crate::domain::cancellation::CancelRequest;
use crate::domain::currency::ExchangeRates;
use crate::domain::ledger::{Transaction, TransactionInput, TransactionLink};
use crate::domain::reference::CariAccount;
use crate::domain::reservation::{Reservation, ReservationInput};

/// The REST calls the reservation workflow makes. Workflows only see this
/// trait, so tests can record the exact request sequence.
pub trait BackOfficeApi {
    fn create_reservation(&self, input: &ReservationInput) -> Result<Reservation, ApiError>;
    fn update_reservation(&self, id: i64, input: &ReservationInput) -> Result<Reservation, ApiError>;
    fn get_reservation(&self, id: i64) -> Result<Reservation, ApiError>;
    fn delete_reservation(&self, id: i64) -> Result<(), ApiError>;
    fn complete_reservation(&self, id: i64) -> Result<Reservation, ApiError>;
    fn cancel_reservation(&self, id: i64, request: &CancelRequest) -> Result<Reservation, ApiError>;
    fn create_transaction(&self, input: &TransactionInput) -> Result<Transaction, ApiError>;
    fn link_transaction(&self, id: i64, link: &TransactionLink) -> Result<Transaction, ApiError>;
    fn cari_accounts(&self) -> Result<Vec<CariAccount>, ApiError>;
    fn current_rates(&self) -> Result<ExchangeRates, ApiError>;
}

#[derive(Deserialize)]
struct RatesEnvelope {
    rates: ExchangeRates,
}

impl<T: Transport> BackOfficeApi for ApiClient<T> {
    fn create_reservation(&self, input: &ReservationInput) -> Result<Reservation, ApiError> {
        self.request(Method::POST, "/reservations", Some(input))
    }

    fn update_reservation(&self, id: i64, input: &ReservationInput) -> Result<Reservation, ApiError> {
        self.request(Method::PUT, &format!("/reservations/{id}"), Some(input))
    }

    fn get_reservation(&self, id: i64) -> Result<Reservation, ApiError> {
        self.get(&format!("/reservations/{id}"))
    }

    fn delete_reservation(&self, id: i64) -> Result<(), ApiError> {
        self.send_ignoring_body::<()>(Method::DELETE, &format!("/reservations/{id}"), None)
    }

    fn complete_reservation(&self, id: i64) -> Result<Reservation, ApiError> {
        self.request::<(), _>(Method::POST, &format!("/reservations/{id}/complete"), None)
    }

    fn cancel_reservation(&self, id: i64, request: &CancelRequest) -> Result<Reservation, ApiError> {
        self.request(Method::PUT, &format!("/reservations/{id}/cancel"), Some(request))
    }

    fn create_transaction(&self, input: &TransactionInput) -> Result<Transaction, ApiError> {
        self.request(Method::POST, "/transactions", Some(input))
    }

    fn link_transaction(&self, id: i64, link: &TransactionLink) -> Result<Transaction, ApiError> {
        self.request(Method::PUT, &format!("/transactions/{id}"), Some(link))
    }

    fn cari_accounts(&self) -> Result<Vec<CariAccount>, ApiError> {
        self.get("/cari-accounts")
    }

    fn current_rates(&self) -> Result<ExchangeRates, ApiError> {
        self.get::<RatesEnvelope>("/currency/rates").map(|r| r.rates)
    }
}
