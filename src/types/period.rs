//! Aggregation resolution and date ranges

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{format_wire_date, ChargestatError, DailyMetric, Result};

/// Requested aggregation resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Day,
    Week,
    Month,
}

impl Granularity {
    pub const ALL: [Granularity; 3] = [Self::Day, Self::Week, Self::Month];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Day => "Daily",
            Self::Week => "Weekly",
            Self::Month => "Monthly",
        }
    }

    pub fn date_column_label(&self) -> &'static str {
        match self {
            Self::Day => "Date",
            Self::Week => "Week",
            Self::Month => "Month",
        }
    }
}

impl FromStr for Granularity {
    type Err = ChargestatError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            other => Err(ChargestatError::InvalidArgument(format!(
                "unknown granularity '{}': expected day, week or month",
                other
            ))),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive calendar range `[from, to]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    from: NaiveDate,
    to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        if from > to {
            return Err(ChargestatError::InvalidArgument(format!(
                "date range starts after it ends: {} > {}",
                format_wire_date(from),
                format_wire_date(to)
            )));
        }
        Ok(Self { from, to })
    }

    /// The `days` days ending on (and including) `to`
    pub fn ending_on(to: NaiveDate, days: u32) -> Result<Self> {
        if days == 0 {
            return Err(ChargestatError::InvalidArgument(
                "date range must cover at least one day".into(),
            ));
        }
        Self::new(to - Duration::days(days as i64 - 1), to)
    }

    pub fn from(&self) -> NaiveDate {
        self.from
    }

    pub fn to(&self) -> NaiveDate {
        self.to
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }

    /// Keep metrics inside the range, preserving their order
    pub fn filter(&self, metrics: &[DailyMetric]) -> Vec<DailyMetric> {
        metrics
            .iter()
            .filter(|m| self.contains(m.date))
            .copied()
            .collect()
    }

    /// Filesystem-safe identifier, e.g. `20240101-20240131`
    pub fn cache_key(&self) -> String {
        format!("{}-{}", self.from.format("%Y%m%d"), self.to.format("%Y%m%d"))
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            format_wire_date(self.from),
            format_wire_date(self.to)
        )
    }
}
