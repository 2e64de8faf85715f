//! Plain-text rendering of aggregated series and the detail table

use crate::types::{format_wire_date, AggregationBucket, DailyMetric, Granularity, StatsData};
use std::fmt::Write;

/// Width of the revenue bar column
const BAR_WIDTH: usize = 24;

/// Format a sparkline bar based on revenue ratio
/// Example: value=500, max=1000, width=8 → "▓▓▓▓░░░░"
pub fn format_sparkline(value: u64, max: u64, width: usize) -> String {
    if max == 0 || width == 0 {
        return "░".repeat(width);
    }
    let ratio = value as f64 / max as f64;
    let filled = (ratio * width as f64).round() as usize;
    let filled = filled.min(width);
    let empty = width.saturating_sub(filled);
    format!("{}{}", "▓".repeat(filled), "░".repeat(empty))
}

/// Group thousands with '.', VND style: 1234567 → "1.234.567 ₫"
pub fn format_amount(amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 4);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    grouped.push_str(" ₫");
    grouped
}

/// Chart-style table: one row per bucket with a revenue bar
pub fn render_buckets(buckets: &[AggregationBucket], granularity: Granularity) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} revenue", granularity.label());

    if buckets.is_empty() {
        out.push_str("No data\n");
        return out;
    }

    let max = buckets.iter().map(|b| b.revenue).max().unwrap_or(0);
    let _ = writeln!(
        out,
        "{:<15} {:>10} {:>18}  {}",
        granularity.date_column_label(),
        "Sessions",
        "Revenue",
        "Usage"
    );
    for bucket in buckets {
        let _ = writeln!(
            out,
            "{:<15} {:>10} {:>18}  {}",
            bucket.label,
            bucket.sessions,
            format_amount(bucket.revenue),
            format_sparkline(bucket.revenue, max, BAR_WIDTH)
        );
    }
    out
}

/// Detail table rows as given (callers pass `Aggregator::detail_rows`)
pub fn render_detail(rows: &[DailyMetric]) -> String {
    let mut out = String::new();

    if rows.is_empty() {
        out.push_str("No data\n");
        return out;
    }

    let _ = writeln!(out, "{:<12} {:>10} {:>18}", "Date", "Sessions", "Revenue");
    for row in rows {
        let _ = writeln!(
            out,
            "{:<12} {:>10} {:>18}",
            format_wire_date(row.date),
            row.sessions,
            format_amount(row.revenue)
        );
    }
    out
}

pub fn render_stats(stats: &StatsData) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Total revenue:   {}", format_amount(stats.total_revenue));
    let _ = writeln!(out, "Total sessions:  {}", stats.total_sessions);
    let _ = writeln!(
        out,
        "Avg per bucket:  {}",
        format_amount(stats.avg_revenue_per_bucket.round() as u64)
    );
    let _ = writeln!(
        out,
        "Avg per session: {}",
        format_amount(stats.avg_revenue_per_session.round() as u64)
    );
    if let Some((label, revenue)) = &stats.peak {
        let _ = writeln!(out, "Peak:            {} ({})", label, format_amount(*revenue));
    }
    out
}
