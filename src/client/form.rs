// client/form.rs
//
// State of the reservation form across its tabs. Raw text from inputs is
// coerced on entry so the form always holds submit-ready values.
use chrono::NaiveDate;

use crate::client::toast::Toast;
use crate::domain::currency::Currency;
use crate::domain::pricing::PriceQuote;
use crate::domain::reference::CariAccount;
use crate::domain::reservation::{
    join_customer_name, split_customer_name, CustomerDetails, Reservation, ReservationInput,
};
use crate::domain::validation::{non_empty, FieldError, Validator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormTab {
    Details,
    Customer,
    /// Only offered for the Münferit account.
    Payment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(i64),
}

pub const DETAILS_INCOMPLETE: &str = "Lütfen cari, tarih ve saat alanlarını doldurun";

#[derive(Debug, Clone, PartialEq)]
pub struct ReservationForm {
    pub mode: FormMode,
    tab: FormTab,
    pub cari_id: Option<i64>,
    pub is_munferit: bool,
    pub date: String,
    pub time: String,
    pub tour_type_id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub customer_contact: String,
    pub customer_details: CustomerDetails,
    person_count: i64,
    atv_count: i64,
    pub pickup_location: String,
    pub pickup_maps_link: String,
    price: f64,
    pub currency: Currency,
    pub exchange_rate: Option<f64>,
    pub notes: String,
}

impl Default for ReservationForm {
    fn default() -> Self {
        Self {
            mode: FormMode::Create,
            tab: FormTab::Details,
            cari_id: None,
            is_munferit: false,
            date: String::new(),
            time: String::new(),
            tour_type_id: None,
            first_name: String::new(),
            last_name: String::new(),
            customer_contact: String::new(),
            customer_details: CustomerDetails::default(),
            person_count: 1,
            atv_count: 1,
            pickup_location: String::new(),
            pickup_maps_link: String::new(),
            price: 0.0,
            currency: Currency::EUR,
            exchange_rate: None,
            notes: String::new(),
        }
    }
}

/// Integer count of at least one; anything unreadable becomes 1.
pub fn coerce_count(raw: &str) -> i64 {
    let raw = raw.trim();
    let parsed = raw
        .parse::<i64>()
        .ok()
        .or_else(|| raw.parse::<f64>().ok().filter(|v| v.is_finite()).map(|v| v.trunc() as i64));
    parsed.filter(|n| *n >= 1).unwrap_or(1)
}

/// Decimal price; anything unreadable becomes 0.
pub fn coerce_price(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

fn text(value: &str) -> Option<String> {
    non_empty(Some(value.to_string()))
}

impl ReservationForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Edit mode: fields from a stored reservation, name split at the first
    /// whitespace.
    pub fn from_reservation(r: &Reservation) -> Self {
        let (first_name, last_name) = split_customer_name(&r.customer_name);
        Self {
            mode: FormMode::Edit(r.id),
            tab: FormTab::Details,
            cari_id: Some(r.cari_id),
            is_munferit: r.is_munferit,
            date: r.date.clone(),
            time: r.time.clone(),
            tour_type_id: r.tour_type_id,
            first_name,
            last_name,
            customer_contact: r.customer_contact.clone().unwrap_or_default(),
            customer_details: r.customer_details.clone().unwrap_or_default(),
            person_count: r.person_count.max(1),
            atv_count: r.atv_count.max(1),
            pickup_location: r.pickup_location.clone().unwrap_or_default(),
            pickup_maps_link: r.pickup_maps_link.clone().unwrap_or_default(),
            price: r.price,
            currency: r.currency,
            exchange_rate: Some(r.exchange_rate),
            notes: r.notes.clone().unwrap_or_default(),
        }
    }

    /// A new booking with every field of `r`, dated `today`.
    pub fn copy_of(r: &Reservation, today: NaiveDate) -> Self {
        Self {
            mode: FormMode::Create,
            date: today.format("%Y-%m-%d").to_string(),
            exchange_rate: None,
            ..Self::from_reservation(r)
        }
    }

    pub fn tab(&self) -> FormTab {
        self.tab
    }

    pub fn tabs(&self) -> Vec<FormTab> {
        let mut tabs = vec![FormTab::Details, FormTab::Customer];
        if self.is_munferit {
            tabs.push(FormTab::Payment);
        }
        tabs
    }

    fn details_complete(&self) -> bool {
        self.cari_id.is_some() && !self.date.trim().is_empty() && !self.time.trim().is_empty()
    }

    /// Moves to the next tab. Leaving the details tab needs cari, date and
    /// time; on failure the tab does not change.
    pub fn advance(&mut self) -> Result<FormTab, Toast> {
        let next = match self.tab {
            FormTab::Details => {
                if !self.details_complete() {
                    return Err(Toast::error(DETAILS_INCOMPLETE));
                }
                FormTab::Customer
            }
            FormTab::Customer if self.is_munferit => FormTab::Payment,
            current => current,
        };
        self.tab = next;
        Ok(next)
    }

    pub fn back(&mut self) -> FormTab {
        self.tab = match self.tab {
            FormTab::Payment => FormTab::Customer,
            FormTab::Customer | FormTab::Details => FormTab::Details,
        };
        self.tab
    }

    /// Selecting a cari decides the Münferit branch and pre-fills pickup
    /// details the user has not typed yet.
    pub fn select_cari(&mut self, cari: &CariAccount) {
        self.cari_id = Some(cari.id);
        self.is_munferit = cari.is_munferit;
        if self.pickup_location.trim().is_empty() {
            self.pickup_location = cari.pickup_location.clone().unwrap_or_default();
        }
        if self.pickup_maps_link.trim().is_empty() {
            self.pickup_maps_link = cari.pickup_maps_link.clone().unwrap_or_default();
        }
        if !self.is_munferit && self.tab == FormTab::Payment {
            self.tab = FormTab::Customer;
        }
    }

    pub fn person_count(&self) -> i64 {
        self.person_count
    }

    pub fn atv_count(&self) -> i64 {
        self.atv_count
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn set_person_count(&mut self, raw: &str) {
        self.person_count = coerce_count(raw);
    }

    pub fn set_atv_count(&mut self, raw: &str) {
        self.atv_count = coerce_count(raw);
    }

    pub fn set_price(&mut self, raw: &str) {
        self.price = coerce_price(raw);
    }

    pub fn apply_quote(&mut self, quote: &PriceQuote) {
        self.price = quote.total;
        self.currency = quote.currency;
    }

    pub fn customer_name(&self) -> String {
        join_customer_name(&self.first_name, &self.last_name)
    }

    /// Checks everything the server would reject before any request is made.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut v = Validator::new();
        v.require("cari_id", self.cari_id);
        if let Err(errors) = self.to_input().validate_create() {
            v.extend(errors);
        }
        v.finish()
    }

    pub fn to_input(&self) -> ReservationInput {
        let details = self.customer_details.clone();
        let customer_details = CustomerDetails {
            phone: non_empty(details.phone),
            email: non_empty(details.email),
            nationality: non_empty(details.nationality),
            id_number: non_empty(details.id_number),
            birth_date: non_empty(details.birth_date),
        };
        ReservationInput {
            cari_id: self.cari_id,
            date: text(&self.date),
            time: text(&self.time),
            tour_type_id: self.tour_type_id,
            customer_name: text(&self.customer_name()),
            customer_contact: text(&self.customer_contact),
            customer_details: (!customer_details.is_empty()).then_some(customer_details),
            person_count: Some(self.person_count),
            atv_count: Some(self.atv_count),
            pickup_location: text(&self.pickup_location),
            pickup_maps_link: text(&self.pickup_maps_link),
            price: Some(self.price),
            currency: Some(self.currency),
            exchange_rate: self.exchange_rate,
            notes: text(&self.notes),
        }
    }
}
