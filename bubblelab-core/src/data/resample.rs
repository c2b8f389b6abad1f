//! Resampling dated observations onto monthly and quarterly axes.
//!
//! The rules mirror a period-resample with "last" aggregation: the output
//! axis is contiguous from the first to the last observed period, each
//! period takes the last finite observation inside it, and periods with no
//! finite observation are NaN.

use super::provider::Observation;
use crate::domain::Month;

/// Resample observations to a contiguous monthly axis, last-in-month.
pub fn monthly_last(observations: &[Observation]) -> Vec<(Month, f64)> {
    resample_last(observations, Month::from_date)
}

/// Resample observations to quarter-end months, last-in-quarter.
pub fn quarterly_last(observations: &[Observation]) -> Vec<(Month, f64)> {
    let points = resample_last(observations, |date| Month::from_date(date).quarter_end());
    // The contiguous axis from resample_last is monthly; keep quarter ends.
    points
        .into_iter()
        .filter(|(m, _)| m.month() % 3 == 0)
        .collect()
}

/// Expand sparse (month, value) points to a contiguous monthly axis,
/// carrying the last finite value forward. Months before the first point
/// do not exist in the output; gaps before the first finite value stay NaN.
pub fn monthly_ffill(points: &[(Month, f64)]) -> Vec<(Month, f64)> {
    let Some(&(first, _)) = points.first() else {
        return Vec::new();
    };
    let Some(&(last, _)) = points.last() else {
        return Vec::new();
    };

    let mut out = Vec::new();
    let mut held = f64::NAN;
    let mut i = 0;
    let mut month = first;
    while month <= last {
        while i < points.len() && points[i].0 <= month {
            if points[i].1.is_finite() {
                held = points[i].1;
            }
            i += 1;
        }
        out.push((month, held));
        month = month.plus_months(1);
    }
    out
}

fn resample_last(
    observations: &[Observation],
    period_of: impl Fn(chrono::NaiveDate) -> Month,
) -> Vec<(Month, f64)> {
    if observations.is_empty() {
        return Vec::new();
    }

    let mut sorted: Vec<&Observation> = observations.iter().collect();
    sorted.sort_by_key(|o| o.date);

    let first = period_of(sorted.first().unwrap().date);
    let last = period_of(sorted.last().unwrap().date);

    let mut out = Vec::with_capacity(last.months_since(&first) as usize + 1);
    let mut i = 0;
    let mut month = first;
    while month <= last {
        let mut value = f64::NAN;
        while i < sorted.len() && period_of(sorted[i].date) <= month {
            if sorted[i].value.is_finite() {
                value = sorted[i].value;
            }
            i += 1;
        }
        out.push((month, value));
        month = month.plus_months(1);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn obs(y: i32, m: u32, d: u32, v: f64) -> Observation {
        Observation::new(NaiveDate::from_ymd_opt(y, m, d).unwrap(), v)
    }

    #[test]
    fn monthly_last_takes_last_finite_in_month() {
        let observations = vec![
            obs(2020, 1, 2, 10.0),
            obs(2020, 1, 31, 11.0),
            obs(2020, 2, 14, f64::NAN),
            obs(2020, 3, 2, 13.0),
        ];
        let points = monthly_last(&observations);
        assert_eq!(points.len(), 3);
        assert_eq!(points[0], (Month::new(2020, 1), 11.0));
        assert!(points[1].1.is_nan()); // only a NaN observation in February
        assert_eq!(points[2], (Month::new(2020, 3), 13.0));
    }

    #[test]
    fn monthly_last_fills_skipped_months_with_nan() {
        let observations = vec![obs(2020, 1, 31, 1.0), obs(2020, 4, 30, 4.0)];
        let points = monthly_last(&observations);
        assert_eq!(points.len(), 4);
        assert!(points[1].1.is_nan());
        assert!(points[2].1.is_nan());
        assert_eq!(points[3], (Month::new(2020, 4), 4.0));
    }

    #[test]
    fn quarterly_last_labels_quarter_ends() {
        // Quarterly observations stamped at quarter starts, as FRED does.
        let observations = vec![
            obs(1980, 1, 1, 30.0),
            obs(1980, 4, 1, 31.0),
            obs(1980, 7, 1, 32.0),
        ];
        let points = quarterly_last(&observations);
        assert_eq!(
            points,
            vec![
                (Month::new(1980, 3), 30.0),
                (Month::new(1980, 6), 31.0),
                (Month::new(1980, 9), 32.0),
            ]
        );
    }

    #[test]
    fn ffill_carries_quarter_values_across_months() {
        let quarterly = vec![
            (Month::new(1980, 3), 30.0),
            (Month::new(1980, 6), 31.0),
        ];
        let monthly = monthly_ffill(&quarterly);
        assert_eq!(
            monthly,
            vec![
                (Month::new(1980, 3), 30.0),
                (Month::new(1980, 4), 30.0),
                (Month::new(1980, 5), 30.0),
                (Month::new(1980, 6), 31.0),
            ]
        );
    }

    #[test]
    fn ffill_leaves_leading_gaps_nan() {
        let points = vec![(Month::new(1980, 3), f64::NAN), (Month::new(1980, 6), 31.0)];
        let monthly = monthly_ffill(&points);
        assert!(monthly[0].1.is_nan());
        assert!(monthly[1].1.is_nan());
        assert!(monthly[2].1.is_nan());
        assert_eq!(monthly[3], (Month::new(1980, 6), 31.0));
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert!(monthly_last(&[]).is_empty());
        assert!(monthly_ffill(&[]).is_empty());
    }
}
