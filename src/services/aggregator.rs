//! Aggregator service for bucketing daily revenue into day/week/month rows

use crate::types::{AggregationBucket, BucketKey, DailyMetric, Granularity};
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};

/// Aggregator for chart and table series
pub struct Aggregator;

impl Aggregator {
    /// Aggregate metrics at the given granularity.
    ///
    /// Buckets come out in the order their key is first seen while scanning
    /// `data` front to back. Nothing is re-sorted, and metrics sharing a date
    /// are merged into the same week/month bucket.
    pub fn aggregate(data: &[DailyMetric], granularity: Granularity) -> Vec<AggregationBucket> {
        match granularity {
            Granularity::Day => data.iter().map(Self::day_bucket).collect(),
            Granularity::Week => Self::group_by(data, |m| BucketKey::week_of(m.date)),
            Granularity::Month => Self::group_by(data, |m| BucketKey::month_of(m.date)),
        }
    }

    /// Like [`Aggregator::aggregate`] but on a copy of `data` stable-sorted by
    /// date, so buckets come out oldest first.
    pub fn aggregate_chronological(
        data: &[DailyMetric],
        granularity: Granularity,
    ) -> Vec<AggregationBucket> {
        let mut sorted = data.to_vec();
        sorted.sort_by_key(|m| m.date);
        Self::aggregate(&sorted, granularity)
    }

    /// Rows for the per-day detail table: the raw metrics, most recent first.
    /// Rows sharing a date keep their input order.
    pub fn detail_rows(data: &[DailyMetric]) -> Vec<DailyMetric> {
        let mut rows = data.to_vec();
        rows.sort_by(|a, b| b.date.cmp(&a.date));
        rows
    }

    /// Dates occurring more than once, in first-seen order
    pub fn duplicate_dates(data: &[DailyMetric]) -> Vec<NaiveDate> {
        let mut seen: HashSet<NaiveDate> = HashSet::new();
        let mut reported: HashSet<NaiveDate> = HashSet::new();
        let mut duplicates = Vec::new();

        for metric in data {
            if !seen.insert(metric.date) && reported.insert(metric.date) {
                duplicates.push(metric.date);
            }
        }

        duplicates
    }

    fn day_bucket(metric: &DailyMetric) -> AggregationBucket {
        let mut bucket = AggregationBucket::empty(BucketKey::Day(metric.date));
        bucket.add(metric);
        bucket
    }

    fn group_by<F>(data: &[DailyMetric], key_of: F) -> Vec<AggregationBucket>
    where
        F: Fn(&DailyMetric) -> BucketKey,
    {
        // key -> index into `buckets`, which holds first-seen order
        let mut index: HashMap<BucketKey, usize> = HashMap::new();
        let mut buckets: Vec<AggregationBucket> = Vec::new();

        for metric in data {
            let key = key_of(metric);
            let slot = *index.entry(key).or_insert_with(|| {
                tracing::trace!(key = %key, "new bucket");
                buckets.push(AggregationBucket::empty(key));
                buckets.len() - 1
            });
            buckets[slot].add(metric);
        }

        tracing::debug!(input = data.len(), buckets = buckets.len(), "grouped daily metrics");
        buckets
    }
}
