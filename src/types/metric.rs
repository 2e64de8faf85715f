//! Daily revenue metrics and the buckets they aggregate into

use std::fmt;
use std::sync::OnceLock;

use chrono::{Datelike, Duration, NaiveDate};
use regex::Regex;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{ChargestatError, Result};

/// Date format used by the backend for every date it sends or accepts
pub const WIRE_DATE_FORMAT: &str = "%d/%m/%Y";

/// Label format for a single day (`dd/MM`)
const DAY_LABEL_FORMAT: &str = "%d/%m";

/// Prefix for monthly labels ("Tháng 03")
const MONTH_LABEL_PREFIX: &str = "Tháng";

fn wire_date_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9]{2}/[0-9]{2}/[0-9]{4}$").expect("valid regex"))
}

/// Parse a `dd/MM/yyyy` wire date.
///
/// The shape is checked before chrono sees it: chrono alone would accept
/// unpadded fields like `5/3/2024`, and the day label relies on the
/// first five characters being `dd/MM`.
pub fn parse_wire_date(raw: &str) -> Result<NaiveDate> {
    if !wire_date_regex().is_match(raw) {
        return Err(ChargestatError::Parse(format!(
            "invalid date '{}': expected dd/MM/yyyy",
            raw
        )));
    }
    NaiveDate::parse_from_str(raw, WIRE_DATE_FORMAT)
        .map_err(|e| ChargestatError::Parse(format!("invalid date '{}': {}", raw, e)))
}

/// Format a date back into its `dd/MM/yyyy` wire form
pub fn format_wire_date(date: NaiveDate) -> String {
    date.format(WIRE_DATE_FORMAT).to_string()
}

mod wire_date {
    use super::*;

    pub fn serialize<S: Serializer>(
        date: &NaiveDate,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_wire_date(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_wire_date(&raw).map_err(de::Error::custom)
    }
}

/// Amounts arrive as JSON numbers. Integral floats (`150000.0`) are accepted,
/// negative or fractional values are not.
mod amount {
    use super::*;

    struct AmountVisitor;

    impl Visitor<'_> for AmountVisitor {
        type Value = u64;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a non-negative integral number")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<u64, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<u64, E> {
            u64::try_from(v).map_err(|_| E::custom(format!("negative amount {}", v)))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<u64, E> {
            if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v < u64::MAX as f64 {
                Ok(v as u64)
            } else {
                Err(E::custom(format!("amount {} is not a non-negative integer", v)))
            }
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<u64, D::Error> {
        deserializer.deserialize_any(AmountVisitor)
    }
}

/// One day of station activity as reported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyMetric {
    #[serde(with = "wire_date")]
    pub date: NaiveDate,
    /// Revenue in VND (no minor unit)
    #[serde(default, deserialize_with = "amount::deserialize")]
    pub revenue: u64,
    /// Number of charging sessions
    #[serde(default, deserialize_with = "amount::deserialize")]
    pub sessions: u64,
}

impl DailyMetric {
    pub fn new(date: NaiveDate, revenue: u64, sessions: u64) -> Self {
        Self {
            date,
            revenue,
            sessions,
        }
    }

    /// Build a metric from its wire date string
    pub fn parse(date: &str, revenue: u64, sessions: u64) -> Result<Self> {
        Ok(Self::new(parse_wire_date(date)?, revenue, sessions))
    }
}

/// Grouping identity of a bucket. Never leaves the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum BucketKey {
    Day(NaiveDate),
    /// Monday of the ISO week
    Week(NaiveDate),
    Month { year: i32, month: u32 },
}

impl BucketKey {
    pub(crate) fn week_of(date: NaiveDate) -> Self {
        let days_since_monday = date.weekday().num_days_from_monday();
        Self::Week(date - Duration::days(days_since_monday as i64))
    }

    pub(crate) fn month_of(date: NaiveDate) -> Self {
        Self::Month {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Display label for the bucket this key identifies
    pub(crate) fn label(&self) -> String {
        match *self {
            Self::Day(date) => date.format(DAY_LABEL_FORMAT).to_string(),
            Self::Week(monday) => {
                let sunday = monday + Duration::days(6);
                format!(
                    "{} - {}",
                    monday.format(DAY_LABEL_FORMAT),
                    sunday.format(DAY_LABEL_FORMAT)
                )
            }
            Self::Month { month, .. } => format!("{} {:02}", MONTH_LABEL_PREFIX, month),
        }
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Day(date) => write!(f, "{}", format_wire_date(*date)),
            Self::Week(monday) => write!(f, "{}", monday.format("%Y-%m-%d")),
            Self::Month { year, month } => write!(f, "{:02}/{}", month, year),
        }
    }
}

/// One aggregated output row: every metric that mapped to the same key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregationBucket {
    #[serde(skip)]
    pub(crate) key: BucketKey,
    pub label: String,
    pub revenue: u64,
    pub sessions: u64,
}

impl AggregationBucket {
    pub(crate) fn empty(key: BucketKey) -> Self {
        Self {
            key,
            label: key.label(),
            revenue: 0,
            sessions: 0,
        }
    }

    pub(crate) fn add(&mut self, metric: &DailyMetric) {
        self.revenue = self.revenue.saturating_add(metric.revenue);
        self.sessions = self.sessions.saturating_add(metric.sessions);
    }
}

/// Headline numbers shown above the chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsData {
    pub total_revenue: u64,
    pub total_sessions: u64,
    pub bucket_count: usize,
    pub avg_revenue_per_bucket: f64,
    pub avg_revenue_per_session: f64,
    /// (label, revenue) of the highest-revenue bucket; first one wins on ties
    pub peak: Option<(String, u64)>,
}

impl StatsData {
    pub fn from_buckets(buckets: &[AggregationBucket]) -> Self {
        let mut total_revenue: u64 = 0;
        let mut total_sessions: u64 = 0;
        let mut peak: Option<(&str, u64)> = None;

        for bucket in buckets {
            total_revenue = total_revenue.saturating_add(bucket.revenue);
            total_sessions = total_sessions.saturating_add(bucket.sessions);

            match peak {
                Some((_, max)) if bucket.revenue <= max => {}
                _ => peak = Some((bucket.label.as_str(), bucket.revenue)),
            }
        }

        let bucket_count = buckets.len();
        let avg_revenue_per_bucket = if bucket_count == 0 {
            0.0
        } else {
            total_revenue as f64 / bucket_count as f64
        };
        let avg_revenue_per_session = if total_sessions == 0 {
            0.0
        } else {
            total_revenue as f64 / total_sessions as f64
        };

        Self {
            total_revenue,
            total_sessions,
            bucket_count,
            avg_revenue_per_bucket,
            avg_revenue_per_session,
            peak: peak.map(|(label, revenue)| (label.to_string(), revenue)),
        }
    }
}
