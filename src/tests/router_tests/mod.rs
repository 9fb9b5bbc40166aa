mod admin_tests;
mod auth_tests;
mod cari_tests;
mod dashboard_tests;
mod ledger_tests;
mod notification_tests;
mod report_tests;
mod reservation_tests;
mod settings_tests;
