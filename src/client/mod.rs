//! Typed client for the back-office API and the reservation workflows the
//! dashboard runs on top of it.
pub mod api;
pub mod booking;
pub mod bulk;
pub mod context;
pub mod form;
pub mod http;
pub mod toast;

pub use api::BackOfficeApi;
pub use booking::{submit, PaymentTab, SubmitOutcome};
pub use bulk::{run_bulk, BulkAction, BulkReport};
pub use context::AppContext;
pub use form::{FormTab, ReservationForm};
pub use http::{ApiClient, ApiError, ClientConfig, HttpTransport, Transport};
pub use toast::{Toast, ToastLevel};
