// src/domain/calendar.rs
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::domain::reservation::{Reservation, ReservationStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Month,
    Week,
    /// Three months starting at the anchor's month.
    Quarter,
    Year,
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "month" => Ok(ViewMode::Month),
            "week" => Ok(ViewMode::Week),
            "quarter" | "3month" | "3-month" => Ok(ViewMode::Quarter),
            "year" => Ok(ViewMode::Year),
            other => Err(format!("unknown calendar view: {other}")),
        }
    }
}

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }
}

fn first_of_month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MIN)
}

/// First day of the month `months` after the one holding `day`.
fn month_start_after(day: NaiveDate, months: u32) -> NaiveDate {
    let index = day.year() * 12 + day.month0() as i32 + months as i32;
    first_of_month(index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

pub fn range_for(view: ViewMode, anchor: NaiveDate) -> DateRange {
    match view {
        ViewMode::Week => {
            let start = anchor - Duration::days(anchor.weekday().num_days_from_monday() as i64);
            DateRange {
                start,
                end: start + Duration::days(6),
            }
        }
        ViewMode::Month => DateRange {
            start: month_start_after(anchor, 0),
            end: month_start_after(anchor, 1) - Duration::days(1),
        },
        ViewMode::Quarter => DateRange {
            start: month_start_after(anchor, 0),
            end: month_start_after(anchor, 3) - Duration::days(1),
        },
        ViewMode::Year => DateRange {
            start: first_of_month(anchor.year(), 1),
            end: first_of_month(anchor.year() + 1, 1) - Duration::days(1),
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    None,
    Low,
    Medium,
    High,
}

impl Intensity {
    pub fn from_count(count: usize) -> Self {
        match count {
            0 => Intensity::None,
            1..=2 => Intensity::Low,
            3..=5 => Intensity::Medium,
            _ => Intensity::High,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySummary {
    pub date: String,
    pub reservation_count: usize,
    pub atv_total: i64,
    pub intensity: Intensity,
    pub reservation_ids: Vec<i64>,
}

/// Reservations whose `date` string equals `day`, cancelled ones included.
pub fn reservations_on<'a>(day: &str, reservations: &'a [Reservation]) -> Vec<&'a Reservation> {
    reservations.iter().filter(|r| r.date == day).collect()
}

pub fn summarize_day(day: &str, reservations: &[Reservation]) -> DaySummary {
    let live: Vec<&Reservation> = reservations_on(day, reservations)
        .into_iter()
        .filter(|r| r.status != ReservationStatus::Cancelled)
        .collect();

    DaySummary {
        date: day.to_string(),
        reservation_count: live.len(),
        atv_total: live.iter().map(|r| r.atv_count).sum(),
        intensity: Intensity::from_count(live.len()),
        reservation_ids: live.iter().map(|r| r.id).collect(),
    }
}

/// One summary per day of `range`, empty days included.
pub fn summarize_range(range: DateRange, reservations: &[Reservation]) -> Vec<DaySummary> {
    range
        .days()
        .map(|d| summarize_day(&d.format("%Y-%m-%d").to_string(), reservations))
        .collect()
}

/// Case-insensitive match over the fields shown on a calendar card.
pub fn matches_search(r: &Reservation, query: &str) -> bool {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return true;
    }
    [
        Some(r.customer_name.as_str()),
        Some(r.cari_name.as_str()),
        Some(r.voucher_code.as_str()),
        r.tour_type_name.as_deref(),
        r.customer_contact.as_deref(),
    ]
    .into_iter()
    .flatten()
    .any(|field| field.to_lowercase().contains(&q))
}
