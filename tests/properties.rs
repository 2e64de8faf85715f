//! Generated-input properties of Aggregator

use chargestat::services::Aggregator;
use chargestat::types::{DailyMetric, Granularity};
use chrono::{Datelike, Duration, NaiveDate};
use proptest::prelude::*;
use std::collections::HashSet;

/// Any day from 2020 through 2029
fn any_date() -> impl Strategy<Value = NaiveDate> {
    let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    (0i64..3653).prop_map(move |offset| start + Duration::days(offset))
}

fn any_metric() -> impl Strategy<Value = DailyMetric> {
    (any_date(), 0u64..1_000_000, 0u64..1_000)
        .prop_map(|(date, revenue, sessions)| DailyMetric::new(date, revenue, sessions))
}

fn any_series() -> impl Strategy<Value = Vec<DailyMetric>> {
    prop::collection::vec(any_metric(), 0..200)
}

fn sums(pairs: impl Iterator<Item = (u64, u64)>) -> (u64, u64) {
    pairs.fold((0, 0), |(r, s), (rev, ses)| (r + rev, s + ses))
}

proptest! {
    #[test]
    fn test_day_mode_is_identity(data in any_series()) {
        let buckets = Aggregator::aggregate(&data, Granularity::Day);

        prop_assert_eq!(buckets.len(), data.len());
        for (bucket, metric) in buckets.iter().zip(&data) {
            prop_assert_eq!(bucket.revenue, metric.revenue);
            prop_assert_eq!(bucket.sessions, metric.sessions);
            prop_assert_eq!(&bucket.label, &metric.date.format("%d/%m").to_string());
        }
    }

    #[test]
    fn test_week_and_month_preserve_sums(data in any_series()) {
        let expected = sums(data.iter().map(|m| (m.revenue, m.sessions)));

        for g in [Granularity::Week, Granularity::Month] {
            let buckets = Aggregator::aggregate(&data, g);
            prop_assert_eq!(sums(buckets.iter().map(|b| (b.revenue, b.sessions))), expected);
        }
    }

    #[test]
    fn test_same_iso_week_iff_same_bucket(a in any_metric(), b in any_metric()) {
        let buckets = Aggregator::aggregate(&[a, b], Granularity::Week);
        prop_assert_eq!(buckets.len() == 1, a.date.iso_week() == b.date.iso_week());
    }

    #[test]
    fn test_same_month_iff_same_bucket(a in any_metric(), b in any_metric()) {
        let buckets = Aggregator::aggregate(&[a, b], Granularity::Month);
        let same_month = (a.date.year(), a.date.month()) == (b.date.year(), b.date.month());
        prop_assert_eq!(buckets.len() == 1, same_month);
    }

    #[test]
    fn test_bucket_count_matches_distinct_periods(data in any_series()) {
        let weeks: HashSet<_> = data.iter().map(|m| m.date.iso_week()).collect();
        let months: HashSet<_> = data.iter().map(|m| (m.date.year(), m.date.month())).collect();

        prop_assert_eq!(Aggregator::aggregate(&data, Granularity::Week).len(), weeks.len());
        prop_assert_eq!(Aggregator::aggregate(&data, Granularity::Month).len(), months.len());
    }
}
