// spreadsheets/reservations_xlsx.rs
use crate::domain::currency::{round2, Currency};
use crate::domain::reservation::{Reservation, ReservationStatus};
use crate::errors::ServerError;
use crate::spreadsheets::report::{Cell, TabularReport};

const HEADERS: [&str; 10] = [
    "Tarih",
    "Saat",
    "Voucher",
    "Müşteri",
    "Acenta",
    "Tur",
    "Kişi",
    "ATV",
    "Fiyat",
    "Durum",
];

const WIDTHS: [f64; 10] = [11.0, 7.0, 22.0, 24.0, 20.0, 18.0, 6.0, 6.0, 12.0, 11.0];

fn totals_line(reservations: &[Reservation]) -> String {
    let parts: Vec<String> = [Currency::EUR, Currency::USD, Currency::TRY]
        .into_iter()
        .filter_map(|currency| {
            let total: f64 = reservations
                .iter()
                .filter(|r| r.currency == currency && r.status != ReservationStatus::Cancelled)
                .map(|r| r.price)
                .sum();
            (total != 0.0).then(|| format!("{:.2} {currency}", round2(total)))
        })
        .collect();
    if parts.is_empty() {
        "0.00".to_string()
    } else {
        parts.join(" / ")
    }
}

pub fn reservations_report(reservations: &[Reservation], period: &str) -> TabularReport {
    let live = reservations
        .iter()
        .filter(|r| r.status != ReservationStatus::Cancelled);
    let atv_total: i64 = live.clone().map(|r| r.atv_count).sum();
    let cancelled = reservations
        .iter()
        .filter(|r| r.status == ReservationStatus::Cancelled)
        .count();

    let rows = reservations
        .iter()
        .map(|r| {
            vec![
                Cell::from(r.date.clone()),
                Cell::from(r.time.clone()),
                Cell::from(r.voucher_code.clone()),
                Cell::from(r.customer_name.clone()),
                Cell::from(r.cari_name.clone()),
                Cell::from(r.tour_type_name.clone()),
                Cell::from(r.person_count),
                Cell::from(r.atv_count),
                Cell::from(format!("{:.2} {}", r.price, r.currency)),
                Cell::from(r.status.as_str()),
            ]
        })
        .collect();

    TabularReport {
        title: "Rezervasyon Raporu".to_string(),
        sheet_name: "Rezervasyonlar".to_string(),
        summary: vec![
            ("Dönem".to_string(), period.to_string()),
            ("Rezervasyon".to_string(), reservations.len().to_string()),
            ("İptal".to_string(), cancelled.to_string()),
            ("Toplam ATV".to_string(), atv_total.to_string()),
            ("Ciro".to_string(), totals_line(reservations)),
        ],
        headers: HEADERS.to_vec(),
        widths: WIDTHS.to_vec(),
        rows,
    }
}

pub fn reservations_workbook(reservations: &[Reservation], period: &str) -> Result<Vec<u8>, ServerError> {
    reservations_report(reservations, period).to_buffer()
}
