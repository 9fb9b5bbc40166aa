use chrono::NaiveDate;
use maud::{html, Markup};

use crate::db::companies::Company;
use crate::domain::reservation::Reservation;
use crate::templates::{print_layout, Orientation};

/// `2025-06-01` → `01.06.2025`. Unparseable input is shown as stored.
pub fn display_date(iso: &str) -> String {
    NaiveDate::parse_from_str(iso.trim(), "%Y-%m-%d")
        .map(|d| d.format("%d.%m.%Y").to_string())
        .unwrap_or_else(|_| iso.to_string())
}

fn row(tr: &str, en: &str, value: Option<String>) -> Markup {
    html! {
        tr {
            th { (tr) " / " span class="muted" { (en) } }
            td { (value.unwrap_or_else(|| "-".to_string())) }
        }
    }
}

/// Landscape ticket: issuer block on the left, bilingual field table on the
/// right.
pub fn voucher_page(company: &Company, r: &Reservation, issued: NaiveDate) -> Markup {
    let details = r.customer_details.clone().unwrap_or_default();
    let pickup = match (&r.pickup_location, &r.pickup_time) {
        (Some(place), Some(time)) => Some(format!("{place} ({time})")),
        (Some(place), None) => Some(place.clone()),
        (None, Some(time)) => Some(time.clone()),
        (None, None) => None,
    };

    print_layout(
        &format!("Voucher {}", r.voucher_code),
        Orientation::Landscape,
        html! {
            div class="ticket" {
                div class="ticket-left" {
                    h2 { (company.company_name) }
                    @if let Some(address) = &company.address { p class="muted" { (address) } }
                    @if let Some(phone) = &company.phone { p class="muted" { "Tel: " (phone) } }
                    @if let Some(email) = &company.email { p class="muted" { (email) } }
                    @if let Some(website) = &company.website { p class="muted" { (website) } }

                    div class="voucher-code" { (r.voucher_code) }
                    p class="muted" {
                        "Düzenlenme Tarihi / Issue Date: " (issued.format("%d.%m.%Y"))
                    }
                }
                div class="ticket-right" {
                    h1 { "VOUCHER" }
                    table class="fields" {
                        (row("Müşteri", "Customer", Some(r.customer_name.clone()).filter(|n| !n.is_empty())))
                        (row("Telefon", "Phone", details.phone.or(r.customer_contact.clone())))
                        (row("Uyruk", "Nationality", details.nationality))
                        (row("Acenta", "Agency", (!r.is_munferit).then(|| r.cari_name.clone())))
                        (row("Tur", "Tour", r.tour_type_name.clone()))
                        (row("Tarih", "Date", Some(display_date(&r.date))))
                        (row("Saat", "Time", Some(r.time.clone())))
                        (row("Kişi Sayısı", "Persons", Some(r.person_count.to_string())))
                        (row("ATV Sayısı", "ATVs", Some(r.atv_count.to_string())))
                        (row("Alış Yeri", "Pickup", pickup))
                        (row("Notlar", "Notes", r.notes.clone()))
                    }
                }
            }
        },
    )
}
