// spreadsheets/ledger_xlsx.rs
//
// Cari statement: one row per ledger entry with a running balance in the
// entry's own currency.
use std::collections::HashMap;

use crate::domain::currency::{round2, Currency};
use crate::domain::ledger::Transaction;
use crate::domain::reference::CariAccount;
use crate::errors::ServerError;
use crate::spreadsheets::report::{Cell, TabularReport};

const HEADERS: [&str; 7] = ["Tarih", "İşlem", "Açıklama", "Ödeme Tipi", "Tutar", "Döviz", "Bakiye"];
const WIDTHS: [f64; 7] = [11.0, 10.0, 32.0, 16.0, 12.0, 7.0, 12.0];

pub fn statement_report(cari: &CariAccount, transactions: &[Transaction]) -> TabularReport {
    let mut entries: Vec<&Transaction> = transactions.iter().collect();
    entries.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));

    let mut running: HashMap<Currency, f64> = HashMap::new();
    let rows = entries
        .iter()
        .map(|t| {
            let balance = running.entry(t.currency).or_insert(0.0);
            *balance = round2(*balance + t.transaction_type.balance_sign() * t.amount);
            vec![
                Cell::from(t.date.clone()),
                Cell::from(t.transaction_type.as_str()),
                Cell::from(t.description.clone()),
                Cell::from(t.payment_type_name.clone()),
                Cell::from(t.amount),
                Cell::from(t.currency.as_str()),
                Cell::from(*balance),
            ]
        })
        .collect();

    let mut summary = vec![("Cari".to_string(), cari.name.clone())];
    if let Some(person) = &cari.authorized_person {
        summary.push(("Yetkili".to_string(), person.clone()));
    }
    summary.push(("İşlem Sayısı".to_string(), transactions.len().to_string()));
    for currency in [Currency::EUR, Currency::USD, Currency::TRY] {
        summary.push((
            format!("Bakiye {currency}"),
            format!("{:.2}", cari.balance(currency)),
        ));
    }

    TabularReport {
        title: format!("Cari Ekstre: {}", cari.name),
        sheet_name: "Ekstre".to_string(),
        summary,
        headers: HEADERS.to_vec(),
        widths: WIDTHS.to_vec(),
        rows,
    }
}

pub fn statement_workbook(cari: &CariAccount, transactions: &[Transaction]) -> Result<Vec<u8>, ServerError> {
    statement_report(cari, transactions).to_buffer()
}
