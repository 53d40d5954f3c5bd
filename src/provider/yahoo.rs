use async_trait::async_trait;
use chrono::DateTime;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tokio_retry::{strategy::ExponentialBackoff, RetryIf};

use super::{Observation, PriceProvider, ProviderError};

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const DEFAULT_RETRY_ATTEMPTS: usize = 3;

/// Daily close history from the Yahoo Finance chart API.
#[derive(Clone)]
pub struct YahooClient {
    client: Client,
    base_url: String,
    range: String,
    retry_attempts: usize,
}

#[derive(Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Deserialize)]
struct ChartError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Deserialize)]
struct Quote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

impl YahooClient {
    /// `range` is a Yahoo range token such as "1y", "2y" or "5y".
    pub fn new(range: impl Into<String>) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("Mozilla/5.0 (compatible; cb-alpha/", env!("CARGO_PKG_VERSION"), ")"))
            .build()
            .map_err(|e| ProviderError::Unavailable(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            range: range.into(),
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_retry_attempts(mut self, attempts: usize) -> Self {
        self.retry_attempts = attempts;
        self
    }

    async fn request_once(&self, ticker: &str) -> Result<Vec<Observation>, ProviderError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, ticker);

        let response = self
            .client
            .get(&url)
            .query(&[("range", self.range.as_str()), ("interval", "1d")])
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(format!("Yahoo request failed: {}", e)))?;

        let status = response.status();
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::Unavailable(format!("Yahoo returned {}", status)));
        }

        // Unknown tickers come back as 404 with a JSON error body, so parse before judging.
        let payload: ChartResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(format!("Yahoo chart for {}: {}", ticker, e)))?;

        if let Some(err) = payload.chart.error {
            return Err(if err.code.eq_ignore_ascii_case("Not Found") {
                ProviderError::SeriesNotFound(ticker.to_string())
            } else {
                ProviderError::Malformed(format!("{}: {}", err.code, err.description))
            });
        }

        let Some(result) = payload.chart.result.and_then(|r| r.into_iter().next()) else {
            return Ok(Vec::new());
        };

        let closes = result
            .indicators
            .quote
            .into_iter()
            .next()
            .map(|q| q.close)
            .unwrap_or_default();

        let mut observations: Vec<Observation> = result
            .timestamp
            .iter()
            .zip(closes)
            .filter_map(|(ts, close)| {
                DateTime::from_timestamp(*ts, 0).map(|dt| {
                    Observation::new(dt.date_naive(), close.filter(|v| v.is_finite()))
                })
            })
            .collect();

        observations.sort_by_key(|o| o.date);
        Ok(observations)
    }
}

#[async_trait]
impl PriceProvider for YahooClient {
    async fn fetch_closes(&self, ticker: &str) -> Result<Vec<Observation>, ProviderError> {
        let retry_strategy = ExponentialBackoff::from_millis(100)
            .max_delay(Duration::from_secs(5))
            .take(self.retry_attempts);

        RetryIf::spawn(
            retry_strategy,
            || self.request_once(ticker),
            ProviderError::is_transient,
        )
        .await
    }
}
