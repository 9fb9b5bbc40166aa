// src/domain/pricing.rs
use serde::{Deserialize, Serialize};

use crate::domain::currency::{round2, Currency};
use crate::domain::reference::TourType;
use crate::domain::validation::{FieldError, Validator};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CariPrice {
    pub cari_id: i64,
    pub price: f64,
}

/// Per-ATV price valid for an inclusive date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalPrice {
    pub id: i64,
    pub start_date: String,
    pub end_date: String,
    pub price: f64,
    pub currency: Currency,
    /// Empty means every tour type.
    pub tour_type_ids: Vec<i64>,
    pub cari_prices: Vec<CariPrice>,
    pub apply_to_new_caris: bool,
}

impl SeasonalPrice {
    /// ISO dates order lexically, so plain string comparison is enough.
    pub fn covers(&self, date: &str) -> bool {
        self.start_date.as_str() <= date && date <= self.end_date.as_str()
    }

    pub fn applies_to_tour(&self, tour_type_id: Option<i64>) -> bool {
        self.tour_type_ids.is_empty()
            || tour_type_id.is_some_and(|id| self.tour_type_ids.contains(&id))
    }

    pub fn price_for_cari(&self, cari_id: i64) -> Option<f64> {
        self.cari_prices
            .iter()
            .find(|p| p.cari_id == cari_id)
            .map(|p| p.price)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeasonalPriceInput {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub price: Option<f64>,
    #[serde(default)]
    pub currency: Currency,
    #[serde(default)]
    pub tour_type_ids: Vec<i64>,
    #[serde(default)]
    pub cari_prices: Vec<CariPrice>,
    #[serde(default)]
    pub apply_to_new_caris: bool,
}

impl SeasonalPriceInput {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut v = Validator::new();
        v.require_text("start_date", self.start_date.as_deref())
            .require_text("end_date", self.end_date.as_deref())
            .date("start_date", self.start_date.as_deref())
            .date("end_date", self.end_date.as_deref())
            .require("price", self.price)
            .check(
                "price",
                self.price.map_or(true, |p| p.is_finite() && p >= 0.0),
                "must be zero or greater",
            )
            .check(
                "cari_prices",
                self.cari_prices.iter().all(|p| p.price.is_finite() && p.price >= 0.0),
                "override prices must be zero or greater",
            );
        if let (Some(start), Some(end)) = (self.start_date.as_deref(), self.end_date.as_deref()) {
            v.check("end_date", start <= end, "must not be before start_date");
        }
        v.finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    CariOverride,
    Seasonal,
    TourDefault,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceQuote {
    pub unit_price: f64,
    pub currency: Currency,
    pub atv_count: i64,
    pub total: f64,
    pub source: PriceSource,
    pub seasonal_price_id: Option<i64>,
}

/// Resolves the per-ATV price for a booking.
///
/// Among seasons covering `date` for the tour, a cari-specific override beats
/// a plain season price; ties go to the season that started most recently.
/// Without a season the tour type's default price is used.
pub fn quote(
    prices: &[SeasonalPrice],
    date: &str,
    tour: Option<&TourType>,
    cari_id: Option<i64>,
    atv_count: i64,
) -> Option<PriceQuote> {
    let tour_type_id = tour.map(|t| t.id);
    let mut matching: Vec<&SeasonalPrice> = prices
        .iter()
        .filter(|p| p.covers(date) && p.applies_to_tour(tour_type_id))
        .collect();
    matching.sort_by(|a, b| b.start_date.cmp(&a.start_date).then(b.id.cmp(&a.id)));

    let atv_count = atv_count.max(1);
    let build = |unit: f64, currency, source, id| PriceQuote {
        unit_price: unit,
        currency,
        atv_count,
        total: round2(unit * atv_count as f64),
        source,
        seasonal_price_id: id,
    };

    if let Some(cari_id) = cari_id {
        for p in &matching {
            if let Some(unit) = p.price_for_cari(cari_id) {
                return Some(build(unit, p.currency, PriceSource::CariOverride, Some(p.id)));
            }
        }
    }
    if let Some(p) = matching.first() {
        return Some(build(p.price, p.currency, PriceSource::Seasonal, Some(p.id)));
    }
    tour.map(|t| build(t.default_price, t.default_currency, PriceSource::TourDefault, None))
}

/// Adds an override for a freshly created cari to every season flagged for
/// new caris. Returns the ids of the seasons that changed.
pub fn inherit_for_new_cari(prices: &mut [SeasonalPrice], cari_id: i64) -> Vec<i64> {
    let mut changed = Vec::new();
    for p in prices.iter_mut().filter(|p| p.apply_to_new_caris) {
        if p.price_for_cari(cari_id).is_none() {
            p.cari_prices.push(CariPrice {
                cari_id,
                price: p.price,
            });
            changed.push(p.id);
        }
    }
    changed
}
