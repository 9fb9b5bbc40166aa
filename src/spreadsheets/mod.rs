// spreadsheets/mod.rs
pub mod ledger_xlsx;
pub mod report;
pub mod reservations_xlsx;

pub use ledger_xlsx::statement_workbook;
pub use report::{Cell, TabularReport};
pub use reservations_xlsx::reservations_workbook;
