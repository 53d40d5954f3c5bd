use chrono::{DateTime, NaiveDate, Utc};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::EntityConfig;
use crate::provider::{month_end_values, values, PriceProvider, ProviderError, SeriesProvider};
use crate::scoring::{
    absorb_indicator, read_prices, score_entity, signal_label, EntityReadings, Indicator,
    IndicatorOutcome, PriceSignal, RankedTable, ScoringConfig, SignalConfig, SkippedEntity,
};

/// A refresh that produced nothing worth ranking.
#[derive(Debug, Error, PartialEq)]
pub enum FetchError {
    #[error("data provider unavailable ({0})")]
    ProviderUnavailable(String),

    #[error("no usable data for any of the {entities} configured entities")]
    NoData { entities: usize },
}

/// First date of the lookback window ending at `now`.
pub fn observation_start(now: DateTime<Utc>, lookback: Duration) -> NaiveDate {
    chrono::Duration::from_std(lookback)
        .ok()
        .and_then(|d| now.checked_sub_signed(d))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
        .date_naive()
}

/// What went wrong across a refresh, to pick the terminal error.
#[derive(Default)]
struct FailureTally {
    last_outage: Option<String>,
    answered: bool,
}

impl FailureTally {
    fn record(&mut self, result: &Result<Vec<Option<f64>>, ProviderError>) {
        match result {
            Err(e) if e.is_outage() => self.last_outage = Some(e.to_string()),
            // Data, or an error the provider chose to send
            _ => self.answered = true,
        }
    }

    fn into_error(self, entities: usize) -> FetchError {
        match self.last_outage {
            Some(msg) if !self.answered => FetchError::ProviderUnavailable(msg),
            _ => FetchError::NoData { entities },
        }
    }
}

/// Fetch one indicator series and run it through the absorption policy.
/// Only a rejected credential escapes as an error.
async fn fetch_indicator(
    provider: &dyn SeriesProvider,
    entity: &EntityConfig,
    indicator: Indicator,
    start: NaiveDate,
    scoring: &ScoringConfig,
    tally: &mut FailureTally,
) -> Result<IndicatorOutcome, FetchError> {
    let series_id = match indicator {
        Indicator::Rate => &entity.rate,
        Indicator::Inflation => &entity.inflation,
        Indicator::Liquidity => &entity.liquidity,
    };

    let result = match provider.fetch_series(series_id, start).await {
        Ok(observations) => {
            debug!(
                "{} {} ({}): {} observations",
                entity.symbol,
                indicator,
                series_id,
                observations.len()
            );
            Ok(month_end_values(&observations))
        }
        Err(e @ ProviderError::InvalidCredential(_)) => {
            return Err(FetchError::ProviderUnavailable(e.to_string()))
        }
        Err(e) => {
            warn!("{} {} ({}) unavailable: {}", entity.symbol, indicator, series_id, e);
            Err(e)
        }
    };

    tally.record(&result);
    Ok(absorb_indicator(indicator, result, scoring))
}

/// Fetch, score and rank every entity, one after the other.
///
/// Indicator and entity failures are absorbed; only a refresh with no usable
/// entity at all (or a rejected credential) is an error.
pub async fn fetch_and_score(
    provider: &dyn SeriesProvider,
    entities: &[EntityConfig],
    scoring: &ScoringConfig,
    lookback: Duration,
    now: DateTime<Utc>,
) -> Result<RankedTable, FetchError> {
    let start = observation_start(now, lookback);
    debug!("Fetching {} entities from {}", entities.len(), start);

    let mut rows = Vec::new();
    let mut skipped = Vec::new();
    let mut tally = FailureTally::default();

    for entity in entities {
        let readings = EntityReadings {
            rate: fetch_indicator(provider, entity, Indicator::Rate, start, scoring, &mut tally).await?,
            inflation: fetch_indicator(provider, entity, Indicator::Inflation, start, scoring, &mut tally)
                .await?,
            liquidity: fetch_indicator(provider, entity, Indicator::Liquidity, start, scoring, &mut tally)
                .await?,
        };

        match score_entity(&entity.label, &entity.symbol, readings, scoring) {
            Ok(row) => {
                for issue in &row.issues {
                    debug!("{}: {}", entity.symbol, issue);
                }
                rows.push(row);
            }
            Err(issues) => {
                warn!("{}: no usable indicator, left out of the ranking", entity.symbol);
                skipped.push(SkippedEntity {
                    label: entity.label.clone(),
                    symbol: entity.symbol.clone(),
                    reasons: issues.iter().map(|i| i.to_string()).collect(),
                });
            }
        }
    }

    if rows.is_empty() {
        return Err(tally.into_error(entities.len()));
    }

    Ok(RankedTable::new(rows, skipped, now))
}

/// Overlay price Z-scores on a ranked table.
///
/// Rows without a configured ticker are left out. Price failures never fail the
/// overlay: the row keeps a neutral price Z-score and records the issue.
pub async fn fetch_price_signals(
    provider: &dyn PriceProvider,
    table: &RankedTable,
    entities: &[EntityConfig],
    config: &SignalConfig,
    min_observations: usize,
) -> Vec<PriceSignal> {
    let mut signals = Vec::new();

    for row in &table.rows {
        let Some(entity) = entities.iter().find(|e| e.symbol == row.symbol) else {
            continue;
        };
        let Some(ref ticker) = entity.price_ticker else {
            continue;
        };

        let (last_price, price_z, issue) = match provider.fetch_closes(ticker).await {
            Ok(observations) => {
                let closes = values(&observations);
                match read_prices(&closes, entity.invert_price, min_observations) {
                    Some(reading) => (
                        Some(reading.last),
                        reading.z,
                        reading.degenerate.map(|d| format!("price series {}", d)),
                    ),
                    None => (None, 0.0, Some("no price data".to_string())),
                }
            }
            Err(e) => {
                warn!("{} price ({}) unavailable: {}", row.symbol, ticker, e);
                (None, 0.0, Some(e.to_string()))
            }
        };

        signals.push(PriceSignal {
            symbol: row.symbol.clone(),
            ticker: ticker.clone(),
            macro_score: row.macro_score,
            last_price,
            price_z,
            signal: signal_label(row.macro_score, price_z, config),
            issue,
        });
    }

    signals
}
