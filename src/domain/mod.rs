pub mod calendar;
pub mod cancellation;
pub mod currency;
pub mod ledger;
pub mod payment;
pub mod pricing;
pub mod reference;
pub mod reservation;
pub mod timeline;
pub mod validation;

pub use currency::{Currency, ExchangeRates};
pub use reservation::{Reservation, ReservationStatus};
