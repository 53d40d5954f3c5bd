pub mod fred;
pub mod yahoo;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use thiserror::Error;

pub use fred::FredClient;
pub use yahoo::YahooClient;

/// A single dated reading. `value` is `None` where the source left a gap.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

impl Observation {
    pub fn new(date: NaiveDate, value: Option<f64>) -> Self {
        Self { date, value }
    }
}

/// Extract the raw values of a series in date order, gaps included.
pub fn values(observations: &[Observation]) -> Vec<Option<f64>> {
    observations.iter().map(|o| o.value).collect()
}

/// Resample a date-ordered series to one value per calendar month.
///
/// Each month keeps its last non-gap reading. Months with no reading at all
/// (including those skipped by a quarterly series) become gaps, so index
/// distance is always a distance in months whatever the source cadence.
pub fn month_end_values(observations: &[Observation]) -> Vec<Option<f64>> {
    let mut months: Vec<Option<f64>> = Vec::new();
    let mut current: Option<i32> = None;

    for obs in observations {
        let month = obs.date.year() * 12 + obs.date.month0() as i32;
        match current {
            Some(prev) if month == prev => {
                if obs.value.is_some() {
                    if let Some(last) = months.last_mut() {
                        *last = obs.value;
                    }
                }
            }
            Some(prev) if month < prev => continue,
            Some(prev) => {
                months.resize(months.len() + (month - prev - 1) as usize, None);
                months.push(obs.value);
                current = Some(month);
            }
            None => {
                months.push(obs.value);
                current = Some(month);
            }
        }
    }
    months
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("credential rejected: {0}")]
    InvalidCredential(String),

    #[error("series '{0}' not found")]
    SeriesNotFound(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ProviderError {
    /// Worth retrying: the request may succeed if sent again.
    pub fn is_transient(&self) -> bool {
        matches!(self, ProviderError::Unavailable(_))
    }

    /// The provider itself is down or refusing us, as opposed to one bad series.
    pub fn is_outage(&self) -> bool {
        matches!(
            self,
            ProviderError::Unavailable(_) | ProviderError::InvalidCredential(_)
        )
    }
}

/// Source of economic indicator series (policy rates, CPI, balance sheets).
#[async_trait]
pub trait SeriesProvider: Send + Sync {
    /// Fetch every observation of `series_id` from `start` onwards, oldest first.
    /// An empty vector is a valid answer.
    async fn fetch_series(
        &self,
        series_id: &str,
        start: NaiveDate,
    ) -> Result<Vec<Observation>, ProviderError>;
}

/// Source of daily closing prices for FX tickers.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Fetch the daily close history of `ticker`, oldest first.
    async fn fetch_closes(&self, ticker: &str) -> Result<Vec<Observation>, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_keeps_gaps_in_order() {
        let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        let obs = vec![
            Observation::new(d(1), Some(1.0)),
            Observation::new(d(2), None),
            Observation::new(d(3), Some(3.0)),
        ];
        assert_eq!(values(&obs), vec![Some(1.0), None, Some(3.0)]);
    }

    #[test]
    fn test_month_end_values_keeps_last_reading_per_month() {
        let d = |m, day| NaiveDate::from_ymd_opt(2024, m, day).unwrap();
        let obs = vec![
            Observation::new(d(1, 3), Some(1.0)),
            Observation::new(d(1, 10), Some(2.0)),
            Observation::new(d(1, 31), None),
            Observation::new(d(2, 7), Some(3.0)),
            Observation::new(d(2, 28), Some(4.0)),
        ];
        assert_eq!(month_end_values(&obs), vec![Some(2.0), Some(4.0)]);
    }

    #[test]
    fn test_month_end_values_marks_skipped_months() {
        let obs = vec![
            Observation::new(NaiveDate::from_ymd_opt(2023, 10, 1).unwrap(), Some(1.0)),
            Observation::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), Some(2.0)),
        ];
        assert_eq!(month_end_values(&obs), vec![Some(1.0), None, None, Some(2.0)]);
    }

    #[test]
    fn test_month_end_values_monthly_is_unchanged() {
        let obs: Vec<Observation> = (1..=12)
            .map(|m| Observation::new(NaiveDate::from_ymd_opt(2024, m, 1).unwrap(), Some(m as f64)))
            .collect();
        assert_eq!(month_end_values(&obs), values(&obs));
    }

    #[test]
    fn test_error_classification() {
        assert!(ProviderError::Unavailable("503".into()).is_transient());
        assert!(!ProviderError::InvalidCredential("bad key".into()).is_transient());
        assert!(ProviderError::InvalidCredential("bad key".into()).is_outage());
        assert!(!ProviderError::SeriesNotFound("X".into()).is_outage());
        assert!(!ProviderError::Malformed("eof".into()).is_outage());
    }
}
