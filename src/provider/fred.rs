use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tokio_retry::{strategy::ExponentialBackoff, RetryIf};

use super::{Observation, ProviderError, SeriesProvider};

pub const DEFAULT_BASE_URL: &str = "https://api.stlouisfed.org";

const DEFAULT_RETRY_ATTEMPTS: usize = 3;

/// Client for the FRED `series/observations` endpoint.
#[derive(Clone)]
pub struct FredClient {
    client: Client,
    base_url: String,
    api_key: String,
    frequency: Option<String>,
    retry_attempts: usize,
}

#[derive(Deserialize)]
struct ObservationsResponse {
    #[serde(default)]
    observations: Vec<RawObservation>,
}

#[derive(Deserialize)]
struct RawObservation {
    date: String,
    value: String,
}

#[derive(Deserialize)]
struct FredErrorBody {
    #[serde(default)]
    error_message: String,
}

impl FredClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("cb-alpha/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProviderError::Unavailable(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            frequency: None,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
        })
    }

    /// Point the client at another host (mirrors, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Ask FRED to aggregate every series to `frequency` (e.g. "m"), end of period.
    pub fn with_frequency(mut self, frequency: Option<String>) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn with_retry_attempts(mut self, attempts: usize) -> Self {
        self.retry_attempts = attempts;
        self
    }

    async fn request_once(
        &self,
        series_id: &str,
        start: NaiveDate,
    ) -> Result<Vec<Observation>, ProviderError> {
        let url = format!("{}/fred/series/observations", self.base_url);
        let mut params: Vec<(&str, String)> = vec![
            ("series_id", series_id.to_string()),
            ("api_key", self.api_key.clone()),
            ("file_type", "json".to_string()),
            ("observation_start", start.format("%Y-%m-%d").to_string()),
        ];
        if let Some(ref frequency) = self.frequency {
            params.push(("frequency", frequency.clone()));
            params.push(("aggregation_method", "eop".to_string()));
        }

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(format!("FRED request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &body, series_id));
        }

        let payload: ObservationsResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(format!("FRED observations for {}: {}", series_id, e)))?;

        let mut observations = payload
            .observations
            .into_iter()
            .map(|raw| {
                let date = NaiveDate::parse_from_str(&raw.date, "%Y-%m-%d").map_err(|e| {
                    ProviderError::Malformed(format!("bad date '{}' in {}: {}", raw.date, series_id, e))
                })?;
                Ok(Observation::new(date, parse_value(&raw.value)))
            })
            .collect::<Result<Vec<_>, ProviderError>>()?;

        observations.sort_by_key(|o| o.date);
        Ok(observations)
    }
}

#[async_trait]
impl SeriesProvider for FredClient {
    async fn fetch_series(
        &self,
        series_id: &str,
        start: NaiveDate,
    ) -> Result<Vec<Observation>, ProviderError> {
        let retry_strategy = ExponentialBackoff::from_millis(100)
            .max_delay(Duration::from_secs(5))
            .take(self.retry_attempts);

        RetryIf::spawn(
            retry_strategy,
            || self.request_once(series_id, start),
            ProviderError::is_transient,
        )
        .await
    }
}

/// FRED writes "." for periods without a value.
fn parse_value(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn classify_failure(status: StatusCode, body: &str, series_id: &str) -> ProviderError {
    let message = serde_json::from_str::<FredErrorBody>(body)
        .map(|b| b.error_message)
        .unwrap_or_else(|_| body.trim().to_string());

    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        return ProviderError::Unavailable(format!("FRED returned {}", status));
    }

    if status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
        || message.to_lowercase().contains("api_key")
    {
        return ProviderError::InvalidCredential(if message.is_empty() {
            format!("FRED returned {}", status)
        } else {
            message
        });
    }

    match status {
        StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND => {
            ProviderError::SeriesNotFound(series_id.to_string())
        }
        _ => ProviderError::Unavailable(format!("FRED returned {}: {}", status, message)),
    }
}
