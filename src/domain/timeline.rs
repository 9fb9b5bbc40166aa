// src/domain/timeline.rs
//
// Single-day operational view: hour buckets, wall-clock status and the
// stacked bar layout used by the dashboard.
use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::Serialize;

use crate::domain::reservation::{Reservation, ReservationStatus};
use crate::domain::validation::minutes_of_day;

pub const PX_PER_HOUR: f64 = 80.0;

/// Longest tour a tour type may declare.
pub const MAX_TOUR_HOURS: f64 = 24.0;

/// Integer hour of a `HH:MM` time string, i.e. its first segment.
pub fn hour_of(time: &str) -> Option<u32> {
    let hour: u32 = time.split(':').next()?.trim().parse().ok()?;
    (hour < 24).then_some(hour)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourBucket {
    pub hour: u32,
    pub reservation_ids: Vec<i64>,
    pub atv_total: i64,
    pub busy: bool,
}

/// Groups a day's reservations by start hour (0..=23). Cancelled reservations
/// are skipped; completed ones stay. An hour is busy when its ATV sum is
/// strictly above `threshold`.
pub fn hour_buckets(reservations: &[Reservation], threshold: i64) -> Vec<HourBucket> {
    let mut buckets: Vec<HourBucket> = (0..24)
        .map(|hour| HourBucket {
            hour,
            reservation_ids: Vec::new(),
            atv_total: 0,
            busy: false,
        })
        .collect();

    for r in reservations {
        if r.status == ReservationStatus::Cancelled {
            continue;
        }
        if let Some(hour) = hour_of(&r.time) {
            let bucket = &mut buckets[hour as usize];
            bucket.reservation_ids.push(r.id);
            bucket.atv_total += r.atv_count;
        }
    }

    for bucket in &mut buckets {
        bucket.busy = bucket.atv_total > threshold;
    }
    buckets
}

pub fn busy_hours(buckets: &[HourBucket]) -> Vec<u32> {
    buckets.iter().filter(|b| b.busy).map(|b| b.hour).collect()
}

/// Display status computed from the wall clock. Never written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DerivedStatus {
    Pending,
    Active,
    Completed,
    Cancelled,
}

pub fn derive_status(now: NaiveDateTime, r: &Reservation, duration_minutes: u32) -> DerivedStatus {
    match r.status {
        ReservationStatus::Completed => return DerivedStatus::Completed,
        ReservationStatus::Cancelled => return DerivedStatus::Cancelled,
        _ => {}
    }

    let is_today = NaiveDate::parse_from_str(&r.date, "%Y-%m-%d")
        .map(|d| d == now.date())
        .unwrap_or(false);
    let start = match minutes_of_day(&r.time) {
        Some(start) if is_today => start,
        _ => return DerivedStatus::Pending,
    };

    let current = now.hour() * 60 + now.minute();
    if current >= start.saturating_add(duration_minutes) {
        DerivedStatus::Completed
    } else if current >= start {
        DerivedStatus::Active
    } else {
        DerivedStatus::Pending
    }
}

/// Tour length in minutes: the tour type's configured hours when present,
/// otherwise `fallback`. Stored hours are capped at [`MAX_TOUR_HOURS`].
pub fn tour_minutes(duration_hours: Option<f64>, fallback: u32) -> u32 {
    match duration_hours {
        Some(h) if h.is_finite() && h > 0.0 => (h.min(MAX_TOUR_HOURS) * 60.0).round() as u32,
        _ => fallback,
    }
}

#[derive(Debug, Default, Serialize)]
pub struct TourPartition {
    pub upcoming: Vec<i64>,
    pub active: Vec<i64>,
    pub completed: Vec<i64>,
}

pub fn partition_tours<F>(now: NaiveDateTime, reservations: &[Reservation], minutes_for: F) -> TourPartition
where
    F: Fn(&Reservation) -> u32,
{
    let mut out = TourPartition::default();
    for r in reservations {
        match derive_status(now, r, minutes_for(r)) {
            DerivedStatus::Pending => out.upcoming.push(r.id),
            DerivedStatus::Active => out.active.push(r.id),
            DerivedStatus::Completed => out.completed.push(r.id),
            DerivedStatus::Cancelled => {}
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub reservation_id: i64,
    pub left: f64,
    pub width: f64,
    pub row: usize,
}

impl Bar {
    fn right(&self) -> f64 {
        self.left + self.width
    }
}

/// Greedy first-fit row assignment. Bars are placed in start order into the
/// first row whose last bar ends at or before their start, so touching bars
/// share a row and intersecting bars never do.
pub fn layout_rows<F>(reservations: &[Reservation], minutes_for: F) -> Vec<Bar>
where
    F: Fn(&Reservation) -> u32,
{
    let mut bars: Vec<Bar> = reservations
        .iter()
        .filter(|r| r.status != ReservationStatus::Cancelled)
        .filter_map(|r| {
            let start = minutes_of_day(&r.time)?;
            Some(Bar {
                reservation_id: r.id,
                left: start as f64 * PX_PER_HOUR / 60.0,
                width: minutes_for(r) as f64 * PX_PER_HOUR / 60.0,
                row: 0,
            })
        })
        .collect();

    bars.sort_by(|a, b| {
        a.left
            .total_cmp(&b.left)
            .then(a.reservation_id.cmp(&b.reservation_id))
    });

    let mut row_ends: Vec<f64> = Vec::new();
    for bar in &mut bars {
        match row_ends.iter().position(|end| *end <= bar.left) {
            Some(row) => {
                bar.row = row;
                row_ends[row] = bar.right();
            }
            None => {
                bar.row = row_ends.len();
                row_ends.push(bar.right());
            }
        }
    }
    bars
}

pub fn row_count(bars: &[Bar]) -> usize {
    bars.iter().map(|b| b.row + 1).max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::reservation::sample;

    fn at(date: &str, hm: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("{date} {hm}"), "%Y-%m-%d %H:%M").unwrap()
    }

    #[test]
    fn hour_is_first_time_segment() {
        assert_eq!(hour_of("09:45"), Some(9));
        assert_eq!(hour_of("9"), Some(9));
        assert_eq!(hour_of("25:00"), None);
        assert_eq!(hour_of(""), None);
    }

    #[test]
    fn busy_when_atv_sum_exceeds_threshold() {
        let mut cancelled = sample(4, "2025-06-01", "10:30", 9);
        cancelled.status = ReservationStatus::Cancelled;
        let mut done = sample(3, "2025-06-01", "11:00", 6);
        done.status = ReservationStatus::Completed;
        let rs = vec![
            sample(1, "2025-06-01", "10:00", 3),
            sample(2, "2025-06-01", "10:45", 2),
            done,
            cancelled,
        ];

        let buckets = hour_buckets(&rs, 5);
        assert_eq!(buckets.len(), 24);
        assert_eq!(buckets[10].atv_total, 5);
        assert!(!buckets[10].busy);
        assert_eq!(buckets[11].reservation_ids, vec![3]);
        assert!(buckets[11].busy);
        assert_eq!(busy_hours(&buckets), vec![11]);
    }

    #[test]
    fn status_follows_clock_only_today() {
        let r = sample(1, "2025-06-01", "10:00", 1);
        assert_eq!(derive_status(at("2025-06-01", "09:59"), &r, 120), DerivedStatus::Pending);
        assert_eq!(derive_status(at("2025-06-01", "10:00"), &r, 120), DerivedStatus::Active);
        assert_eq!(derive_status(at("2025-06-01", "11:59"), &r, 120), DerivedStatus::Active);
        assert_eq!(derive_status(at("2025-06-01", "12:00"), &r, 120), DerivedStatus::Completed);
        assert_eq!(derive_status(at("2025-06-02", "15:00"), &r, 120), DerivedStatus::Pending);
        assert_eq!(derive_status(at("2025-06-01", "11:00"), &r, 60), DerivedStatus::Completed);
    }

    #[test]
    fn persisted_terminal_status_wins() {
        let mut r = sample(1, "2025-06-01", "10:00", 1);
        r.status = ReservationStatus::Completed;
        assert_eq!(derive_status(at("2025-06-01", "08:00"), &r, 120), DerivedStatus::Completed);
        r.status = ReservationStatus::Cancelled;
        assert_eq!(derive_status(at("2025-06-01", "10:30"), &r, 120), DerivedStatus::Cancelled);
    }

    #[test]
    fn tour_minutes_prefers_configured_hours() {
        assert_eq!(tour_minutes(Some(1.5), 120), 90);
        assert_eq!(tour_minutes(Some(0.0), 120), 120);
        assert_eq!(tour_minutes(None, 120), 120);
        assert_eq!(tour_minutes(Some(1e9), 120), 24 * 60);
    }

    #[test]
    fn oversized_duration_does_not_overflow() {
        let r = sample(1, "2025-06-01", "10:00", 1);
        let now = at("2025-06-01", "23:59");
        assert_eq!(derive_status(now, &r, u32::MAX), DerivedStatus::Active);
    }

    #[test]
    fn disjoint_tours_share_row_zero() {
        let rs = vec![
            sample(1, "2025-06-01", "09:00", 1),
            sample(2, "2025-06-01", "11:00", 1),
            sample(3, "2025-06-01", "13:00", 1),
        ];
        let bars = layout_rows(&rs, |_| 60);
        assert!(bars.iter().all(|b| b.row == 0));
        assert_eq!(bars[1].left, 880.0);
        assert_eq!(bars[1].width, 80.0);
        assert_eq!(row_count(&bars), 1);
    }

    #[test]
    fn intersecting_tours_stack() {
        let rs = vec![
            sample(1, "2025-06-01", "10:00", 1),
            sample(2, "2025-06-01", "10:30", 1),
            sample(3, "2025-06-01", "11:00", 1),
            sample(4, "2025-06-01", "12:00", 1),
        ];
        let bars = layout_rows(&rs, |_| 120);
        let row = |id: i64| bars.iter().find(|b| b.reservation_id == id).unwrap().row;

        assert_eq!(row(1), 0);
        assert_eq!(row(2), 1);
        assert_eq!(row(3), 2);
        // 12:00 touches the end of the 10:00 bar
        assert_eq!(row(4), 0);
        assert_eq!(row_count(&bars), 3);
    }

    #[test]
    fn partition_splits_today_by_clock() {
        let rs = vec![
            sample(1, "2025-06-01", "08:00", 1),
            sample(2, "2025-06-01", "10:00", 1),
            sample(3, "2025-06-01", "15:00", 1),
        ];
        let parts = partition_tours(at("2025-06-01", "10:30"), &rs, |_| 120);
        assert_eq!(parts.completed, vec![1]);
        assert_eq!(parts.active, vec![2]);
        assert_eq!(parts.upcoming, vec![3]);
    }
}
