//! Monthly resampling and variation.
//!
//! A daily (or irregular) series is bucketed by calendar month, each bucket is
//! collapsed to one value with the series' `Aggregation`, and every month is
//! compared with the month before it. The first month has nothing to compare
//! against and is dropped.

use chrono::{Datelike, Duration, NaiveDate};
use tracing::debug;

use crate::domain::{Aggregation, MonthlyPoint, MonthlySeries, Series};
use crate::window::last_day_of_month;

/// Days subtracted from a month-end date so charts label the month near its
/// start. Presentation only; values are unaffected.
pub const DISPLAY_SHIFT_DAYS: i64 = 28;

/// One calendar month collapsed to a single value (month-end dated).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthBucket {
    pub month_end: NaiveDate,
    pub value: f64,
    pub count: usize,
}

/// Collapse observations into one value per calendar month present in the
/// series, ascending. Months without observations produce no bucket.
pub fn bucket_by_month(series: &Series, aggregation: Aggregation) -> Vec<MonthBucket> {
    let mut buckets: Vec<MonthBucket> = Vec::new();
    for obs in series.observations() {
        let month_end = last_day_of_month(obs.date);
        match buckets.last_mut() {
            Some(b) if b.month_end == month_end => {
                b.count += 1;
                b.value = match aggregation {
                    // Running sum; divided below.
                    Aggregation::Mean => b.value + obs.value,
                    Aggregation::Last => obs.value,
                };
            }
            _ => buckets.push(MonthBucket {
                month_end,
                value: obs.value,
                count: 1,
            }),
        }
    }

    if aggregation == Aggregation::Mean {
        for b in &mut buckets {
            b.value /= b.count as f64;
        }
    }
    buckets
}

/// Fractional change from `prev` to `curr`.
pub fn variation(prev: f64, curr: f64) -> f64 {
    (curr - prev) / prev
}

/// Shift a month-end date to its display date.
pub fn display_date(month_end: NaiveDate) -> NaiveDate {
    month_end - Duration::days(DISPLAY_SHIFT_DAYS)
}

/// Resample `series` to calendar months and compute month-over-month variation.
///
/// The output has one point per distinct month in the input, minus the first.
/// Months whose variation is not finite (previous value of zero) are skipped.
pub fn resample_monthly(series: &Series, aggregation: Aggregation) -> MonthlySeries {
    let buckets = bucket_by_month(series, aggregation);

    let mut points = Vec::with_capacity(buckets.len().saturating_sub(1));
    for pair in buckets.windows(2) {
        let (prev, curr) = (pair[0], pair[1]);
        let change = variation(prev.value, curr.value);
        if !change.is_finite() {
            debug!(
                series = %series.name,
                month = %curr.month_end,
                "skipping month with non-finite variation"
            );
            continue;
        }
        points.push(MonthlyPoint {
            month: display_date(curr.month_end),
            value: curr.value,
            variation: change,
        });
    }

    MonthlySeries {
        name: series.name.clone(),
        aggregation,
        points,
    }
}

/// Number of distinct calendar months covered by `series`.
pub fn distinct_months(series: &Series) -> usize {
    let mut months: Vec<(i32, u32)> = series
        .observations()
        .iter()
        .map(|o| (o.date.year(), o.date.month()))
        .collect();
    months.dedup();
    months.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Observation;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn series(points: &[(NaiveDate, f64)]) -> Series {
        Series::new(
            "test",
            points.iter().map(|&(date, value)| Observation::new(date, value)).collect(),
        )
    }

    #[test]
    fn one_point_per_month_gives_simple_variation() {
        let s = series(&[
            (d(2024, 1, 15), 100.0),
            (d(2024, 2, 15), 110.0),
            (d(2024, 3, 15), 121.0),
        ]);
        let monthly = resample_monthly(&s, Aggregation::Mean);

        assert_eq!(monthly.points.len(), 2);
        assert!((monthly.points[0].variation - 0.10).abs() < 1e-12);
        assert!((monthly.points[1].variation - 0.10).abs() < 1e-12);
        // Feb month end (29th in 2024) shifted back 28 days.
        assert_eq!(monthly.points[0].month, d(2024, 2, 1));
        assert_eq!(monthly.points[1].month, d(2024, 3, 3));
    }

    #[test]
    fn mean_and_last_policies_differ() {
        let s = series(&[
            (d(2024, 1, 2), 100.0),
            (d(2024, 1, 30), 200.0),
            (d(2024, 2, 1), 300.0),
            (d(2024, 2, 28), 300.0),
        ]);

        let mean = resample_monthly(&s, Aggregation::Mean);
        assert_eq!(mean.points.len(), 1);
        assert!((mean.points[0].variation - 1.0).abs() < 1e-12); // 150 -> 300

        let last = resample_monthly(&s, Aggregation::Last);
        assert!((last.points[0].variation - 0.5).abs() < 1e-12); // 200 -> 300
        assert_eq!(last.aggregation, Aggregation::Last);
    }

    #[test]
    fn gap_months_compare_with_previous_present_month() {
        let s = series(&[(d(2024, 1, 10), 100.0), (d(2024, 4, 10), 120.0)]);
        let monthly = resample_monthly(&s, Aggregation::Mean);
        assert_eq!(monthly.points.len(), 1);
        assert!((monthly.points[0].variation - 0.2).abs() < 1e-12);
    }

    #[test]
    fn zero_base_month_is_skipped() {
        let s = series(&[
            (d(2024, 1, 10), 0.0),
            (d(2024, 2, 10), 5.0),
            (d(2024, 3, 10), 10.0),
        ]);
        let monthly = resample_monthly(&s, Aggregation::Mean);
        assert_eq!(monthly.points.len(), 1);
        assert!((monthly.points[0].variation - 1.0).abs() < 1e-12);
    }

    #[test]
    fn empty_and_single_month_series_produce_nothing() {
        assert!(resample_monthly(&Series::empty("e"), Aggregation::Mean).points.is_empty());
        let single = series(&[(d(2024, 5, 1), 1.0), (d(2024, 5, 20), 2.0)]);
        assert!(resample_monthly(&single, Aggregation::Last).points.is_empty());
        assert_eq!(distinct_months(&single), 1);
    }
}
