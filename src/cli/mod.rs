pub mod logging;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::services::report::{render_buckets, render_detail, render_stats};
use crate::services::{
    parse_metrics, Aggregator, ApiClient, CacheSource, Config, DataLoaderService,
    MetricsCacheService,
};
use crate::types::{
    format_wire_date, parse_wire_date, AggregationBucket, CacheWarning, ChargestatError,
    DailyMetric, DateRange, Granularity, StatsData,
};

/// Days fetched when no range is given
const DEFAULT_FETCH_DAYS: u32 = 30;

/// Env var consulted when `--token` is absent
const TOKEN_ENV: &str = "CHARGESTAT_TOKEN";

/// Revenue and session analytics for EV charging stations
#[derive(Parser)]
#[command(name = "chargestat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Config file (default: ~/.chargestat/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate a revenue payload from a file ("-" for stdin)
    Aggregate {
        /// Revenue payload file ("-" for stdin)
        #[arg(long)]
        input: PathBuf,

        #[command(flatten)]
        series: SeriesArgs,
    },

    /// Fetch daily revenue from the backend and aggregate it
    Fetch {
        #[command(flatten)]
        series: SeriesArgs,

        /// Bearer token for the revenue endpoint (or CHARGESTAT_TOKEN)
        #[arg(long)]
        token: Option<String>,

        /// Always hit the backend, never read or write the cache
        #[arg(long)]
        no_cache: bool,
    },

    /// Aggregate every JSON export under a directory
    Load {
        /// Directory holding the exports
        #[arg(long)]
        dir: PathBuf,

        /// Glob pattern relative to the directory
        #[arg(long, default_value = crate::services::data_loader::DEFAULT_PATTERN)]
        pattern: String,

        #[command(flatten)]
        series: SeriesArgs,
    },

    /// Per-day detail table, most recent first
    Detail {
        /// Revenue payload file ("-" for stdin)
        #[arg(long)]
        input: PathBuf,

        #[command(flatten)]
        range: RangeArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug, Default)]
struct RangeArgs {
    /// First day to include (dd/MM/yyyy)
    #[arg(long, value_parser = parse_wire_date, requires = "to")]
    from: Option<NaiveDate>,

    /// Last day to include (dd/MM/yyyy)
    #[arg(long, value_parser = parse_wire_date, requires = "from")]
    to: Option<NaiveDate>,
}

impl RangeArgs {
    fn resolve(&self) -> crate::types::Result<Option<DateRange>> {
        match (self.from, self.to) {
            (Some(from), Some(to)) => DateRange::new(from, to).map(Some),
            (None, None) => Ok(None),
            _ => Err(ChargestatError::InvalidArgument(
                "--from and --to must be given together".into(),
            )),
        }
    }
}

#[derive(Args, Debug, Default)]
struct SeriesArgs {
    /// day, week or month (default from config)
    #[arg(short, long, value_parser = parse_granularity)]
    granularity: Option<Granularity>,

    #[command(flatten)]
    range: RangeArgs,

    /// Sort rows by date before grouping
    #[arg(long)]
    chronological: bool,

    /// Reject input containing the same date twice
    #[arg(long)]
    strict: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct SeriesReport<'a> {
    granularity: Granularity,
    buckets: &'a [AggregationBucket],
    stats: &'a StatsData,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        logging::init(self.verbose);

        let config = match &self.config {
            Some(path) => Config::load_from(path)?,
            None => Config::load()?,
        };

        match self.command {
            Commands::Aggregate { input, series } => {
                let metrics = read_input(&input)?;
                let metrics = apply_range(metrics, &series.range)?;
                print_series(&metrics, &series, &config)
            }
            Commands::Fetch {
                series,
                token,
                no_cache,
            } => {
                let range = match series.range.resolve()? {
                    Some(range) => range,
                    None => DateRange::ending_on(Local::now().date_naive(), DEFAULT_FETCH_DAYS)?,
                };
                let token = token.or_else(|| std::env::var(TOKEN_ENV).ok());
                let cache = if no_cache { None } else { open_cache(&config) };
                let metrics = fetch_with_cache(&config, &range, token, cache.as_ref())?;
                print_series(&metrics, &series, &config)
            }
            Commands::Load {
                dir,
                pattern,
                series,
            } => {
                let range = series.range.resolve()?;
                let result = DataLoaderService::new(dir)
                    .with_pattern(pattern)
                    .load(range.as_ref())?;
                tracing::info!(
                    loaded = result.loaded_files.len(),
                    skipped = result.skipped_files.len(),
                    "exports loaded"
                );
                print_series(&result.metrics, &series, &config)
            }
            Commands::Detail { input, range, json } => {
                let metrics = read_input(&input)?;
                let metrics = apply_range(metrics, &range)?;
                let rows = Aggregator::detail_rows(&metrics);
                if json {
                    println!("{}", serde_json::to_string_pretty(&rows)?);
                } else {
                    print!("{}", render_detail(&rows));
                }
                Ok(())
            }
        }
    }
}

fn parse_granularity(s: &str) -> crate::types::Result<Granularity> {
    s.parse()
}

/// Read a payload from a file, or stdin for "-"
fn read_input(path: &Path) -> anyhow::Result<Vec<DailyMetric>> {
    let mut bytes = if path == Path::new("-") {
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .context("failed to read stdin")?;
        buf
    } else {
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?
    };

    let metrics = parse_metrics(&mut bytes)
        .with_context(|| format!("failed to decode {}", path.display()))?;
    Ok(metrics)
}

fn apply_range(
    metrics: Vec<DailyMetric>,
    range: &RangeArgs,
) -> anyhow::Result<Vec<DailyMetric>> {
    Ok(match range.resolve()? {
        Some(range) => range.filter(&metrics),
        None => metrics,
    })
}

fn open_cache(config: &Config) -> Option<MetricsCacheService> {
    match MetricsCacheService::new(config.cache_ttl_secs) {
        Ok(cache) => Some(cache),
        Err(e) => {
            tracing::warn!(error = %e, "cache unavailable");
            None
        }
    }
}

/// Cached rows are keyed by the resolved URL and the token
fn fetch_with_cache(
    config: &Config,
    range: &DateRange,
    token: Option<String>,
    cache: Option<&MetricsCacheService>,
) -> anyhow::Result<Vec<DailyMetric>> {
    let source_token = token.clone();
    let client = ApiClient::new(config)?.with_token(token);
    let source = CacheSource::new(client.revenue_url(), source_token.as_deref());

    if let Some(cache) = cache {
        let (cached, warning) = cache.load(&source, range);
        match warning {
            Some(CacheWarning::Expired(msg)) => tracing::debug!(%msg, "cache expired"),
            Some(other) => tracing::warn!(warning = ?other, "cache ignored"),
            None => {}
        }
        if let Some(metrics) = cached {
            tracing::info!(%range, rows = metrics.len(), "using cached revenue");
            return Ok(metrics);
        }
    }

    let metrics = client.fetch_daily(range)?;

    if let Some(cache) = cache {
        if let Err(e) = cache.save(&source, range, &metrics) {
            tracing::warn!(error = %e, "failed to save cache");
        }
    }

    Ok(metrics)
}

fn print_series(
    metrics: &[DailyMetric],
    series: &SeriesArgs,
    config: &Config,
) -> anyhow::Result<()> {
    if series.strict {
        let dupes = Aggregator::duplicate_dates(metrics);
        if !dupes.is_empty() {
            let dates: Vec<String> = dupes.into_iter().map(format_wire_date).collect();
            anyhow::bail!("duplicate dates in input: {}", dates.join(", "));
        }
    }

    let granularity = series.granularity.unwrap_or(config.default_granularity);
    let buckets = if series.chronological {
        Aggregator::aggregate_chronological(metrics, granularity)
    } else {
        Aggregator::aggregate(metrics, granularity)
    };
    let stats = StatsData::from_buckets(&buckets);

    if series.json {
        let report = SeriesReport {
            granularity,
            buckets: &buckets,
            stats: &stats,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_buckets(&buckets, granularity));
        println!();
        print!("{}", render_stats(&stats));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_cli_parse_aggregate() {
        let cli = Cli::try_parse_from(["chargestat", "aggregate", "--input", "data.json"]).unwrap();
        match cli.command {
            Commands::Aggregate { input, series } => {
                assert_eq!(input, PathBuf::from("data.json"));
                assert!(series.granularity.is_none());
                assert!(!series.json);
            }
            _ => panic!("expected aggregate"),
        }
    }

    #[test]
    fn test_cli_parse_granularity_and_range() {
        let cli = Cli::try_parse_from([
            "chargestat",
            "aggregate",
            "--input",
            "-",
            "--granularity",
            "week",
            "--from",
            "01/01/2024",
            "--to",
            "31/01/2024",
            "--json",
        ])
        .unwrap();
        match cli.command {
            Commands::Aggregate { input, series } => {
                assert_eq!(input, PathBuf::from("-"));
                assert_eq!(series.granularity, Some(Granularity::Week));
                assert_eq!(series.range.from, Some(date(2024, 1, 1)));
                assert_eq!(series.range.to, Some(date(2024, 1, 31)));
                assert!(series.json);
            }
            _ => panic!("expected aggregate"),
        }
    }

    #[test]
    fn test_cli_input_is_a_flag() {
        assert!(Cli::try_parse_from(["chargestat", "aggregate", "x.json"]).is_err());
        assert!(Cli::try_parse_from(["chargestat", "aggregate"]).is_err());
        assert!(Cli::try_parse_from(["chargestat", "detail", "x.json"]).is_err());
        assert!(Cli::try_parse_from(["chargestat", "load", "exports"]).is_err());
    }

    #[test]
    fn test_cli_parse_detail() {
        let cli = Cli::try_parse_from(["chargestat", "detail", "--input", "-", "--json"]).unwrap();
        match cli.command {
            Commands::Detail { input, range, json } => {
                assert_eq!(input, PathBuf::from("-"));
                assert!(range.from.is_none());
                assert!(json);
            }
            _ => panic!("expected detail"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_granularity() {
        let result = Cli::try_parse_from([
            "chargestat",
            "aggregate",
            "--input",
            "x.json",
            "-g",
            "year",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_rejects_malformed_date() {
        let result = Cli::try_parse_from([
            "chargestat",
            "detail",
            "--input",
            "x.json",
            "--from",
            "2024-01-01",
            "--to",
            "31/01/2024",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_from_requires_to() {
        let result = Cli::try_parse_from([
            "chargestat",
            "detail",
            "--input",
            "x.json",
            "--from",
            "01/01/2024",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_fetch() {
        let cli = Cli::try_parse_from([
            "chargestat",
            "-vv",
            "fetch",
            "--no-cache",
            "--token",
            "jwt",
            "-g",
            "month",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Fetch {
                series,
                token,
                no_cache,
            } => {
                assert_eq!(series.granularity, Some(Granularity::Month));
                assert_eq!(token.as_deref(), Some("jwt"));
                assert!(no_cache);
            }
            _ => panic!("expected fetch"),
        }
    }

    #[test]
    fn test_cli_parse_load_default_pattern() {
        let cli = Cli::try_parse_from(["chargestat", "load", "--dir", "exports"]).unwrap();
        match cli.command {
            Commands::Load { dir, pattern, .. } => {
                assert_eq!(dir, PathBuf::from("exports"));
                assert_eq!(pattern, "**/*.json");
            }
            _ => panic!("expected load"),
        }
    }

    #[test]
    fn test_range_args_resolve() {
        let range = RangeArgs {
            from: Some(date(2024, 1, 1)),
            to: Some(date(2024, 1, 31)),
        };
        assert!(range.resolve().unwrap().is_some());
        assert!(RangeArgs::default().resolve().unwrap().is_none());

        let inverted = RangeArgs {
            from: Some(date(2024, 2, 1)),
            to: Some(date(2024, 1, 1)),
        };
        assert!(inverted.resolve().is_err());
    }

    #[test]
    fn test_print_series_strict_rejects_duplicates() {
        let metrics = vec![
            DailyMetric::new(date(2024, 1, 1), 1, 1),
            DailyMetric::new(date(2024, 1, 1), 1, 1),
        ];
        let series = SeriesArgs {
            strict: true,
            ..SeriesArgs::default()
        };

        let err = print_series(&metrics, &series, &Config::default()).unwrap_err();
        assert!(err.to_string().contains("01/01/2024"));
    }

    fn backend(base: &str) -> Config {
        Config {
            api_base_url: base.to_string(),
            timeout_secs: 1,
            ..Config::default()
        }
    }

    fn january() -> DateRange {
        DateRange::new(date(2024, 1, 1), date(2024, 1, 31)).unwrap()
    }

    fn cache_source(config: &Config, token: Option<&str>) -> CacheSource {
        let url = ApiClient::new(config).unwrap().revenue_url();
        CacheSource::new(url, token)
    }

    #[test]
    fn test_fetch_with_cache_serves_same_source() {
        let temp = tempfile::TempDir::new().unwrap();
        let cache = MetricsCacheService::with_cache_dir(temp.path().to_path_buf(), 3600);
        let config = backend("http://backend-a.invalid");
        let rows = vec![DailyMetric::new(date(2024, 1, 5), 999, 9)];
        cache
            .save(&cache_source(&config, Some("owner-a")), &january(), &rows)
            .unwrap();

        let got = fetch_with_cache(&config, &january(), Some("owner-a".into()), Some(&cache));

        assert_eq!(got.unwrap(), rows);
    }

    #[test]
    fn test_fetch_with_cache_other_backend_goes_to_network() {
        let temp = tempfile::TempDir::new().unwrap();
        let cache = MetricsCacheService::with_cache_dir(temp.path().to_path_buf(), 3600);
        let config_a = backend("http://backend-a.invalid");
        let rows = vec![DailyMetric::new(date(2024, 1, 5), 999, 9)];
        cache
            .save(&cache_source(&config_a, None), &january(), &rows)
            .unwrap();

        // Only the base URL differs; nothing listens on port 9
        let config_b = backend("http://127.0.0.1:9");
        let got = fetch_with_cache(&config_b, &january(), None, Some(&cache));

        assert!(got.is_err());
    }

    #[test]
    fn test_fetch_with_cache_other_token_goes_to_network() {
        let temp = tempfile::TempDir::new().unwrap();
        let cache = MetricsCacheService::with_cache_dir(temp.path().to_path_buf(), 3600);
        let config = backend("http://127.0.0.1:9");
        let rows = vec![DailyMetric::new(date(2024, 1, 5), 999, 9)];
        cache
            .save(&cache_source(&config, Some("owner-a")), &january(), &rows)
            .unwrap();

        let got = fetch_with_cache(&config, &january(), Some("owner-b".into()), Some(&cache));

        assert!(got.is_err());
    }
}
