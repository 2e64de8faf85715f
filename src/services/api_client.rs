//! REST client for the backend's daily revenue endpoint

use crate::services::config::Config;
use crate::services::payload::parse_metrics;
use crate::types::{format_wire_date, ChargestatError, DailyMetric, DateRange, Result};
use std::time::Duration;

/// Client for `GET {base}{endpoint}?from=dd/MM/yyyy&to=dd/MM/yyyy`
pub struct ApiClient {
    http: reqwest::blocking::Client,
    base_url: String,
    endpoint: String,
    /// JWT issued by the auth service, passed through untouched
    token: Option<String>,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ChargestatError::Api(format!("HTTP client error: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.api_base_url.clone(),
            endpoint: config.revenue_endpoint.clone(),
            token: None,
        })
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    /// Full endpoint URL, tolerant of stray or missing slashes in config
    pub fn revenue_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.endpoint.trim_start_matches('/')
        )
    }

    /// Fetch daily rows for the range. Order is whatever the backend returns.
    pub fn fetch_daily(&self, range: &DateRange) -> Result<Vec<DailyMetric>> {
        let url = self.revenue_url();
        tracing::info!(%url, %range, "fetching daily revenue");

        let mut request = self.http.get(&url).query(&[
            ("from", format_wire_date(range.from())),
            ("to", format_wire_date(range.to())),
        ]);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .map_err(|e| ChargestatError::Api(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChargestatError::Api(format!("{} returned {}", url, status)));
        }

        let mut body = response
            .bytes()
            .map_err(|e| ChargestatError::Api(format!("Failed to read body: {}", e)))?
            .to_vec();

        let metrics = parse_metrics(&mut body)?;
        tracing::debug!(rows = metrics.len(), "revenue payload decoded");
        Ok(metrics)
    }
}
