pub mod cari;
pub mod cash_accounts;
pub mod companies;
pub mod connection;
pub mod demo_requests;
pub mod notifications;
pub mod payment_types;
pub mod reservations;
pub mod seasonal_prices;
pub mod tour_types;
pub mod transactions;
pub mod users;

pub use connection::Database;
