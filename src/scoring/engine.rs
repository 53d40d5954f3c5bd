use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::config::{LiquidityBasis, ScoringConfig};
use super::stats::{forward_fill, try_z_score, year_over_year, DegenerateSeries};
use crate::provider::ProviderError;

/// Scores above this are displayed as hawkish, below its negation as dovish.
pub const STANCE_THRESHOLD: f64 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Indicator {
    Rate,
    Inflation,
    Liquidity,
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Indicator::Rate => write!(f, "rate"),
            Indicator::Inflation => write!(f, "inflation"),
            Indicator::Liquidity => write!(f, "liquidity"),
        }
    }
}

/// A problem with one indicator that was absorbed rather than propagated.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum IndicatorIssue {
    #[error("{indicator} missing: {reason}")]
    Missing { indicator: Indicator, reason: String },

    #[error("{indicator} degenerate: {kind}")]
    Degenerate {
        indicator: Indicator,
        kind: DegenerateSeries,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorReading {
    /// Latest displayed value: the level for rates, YoY % for inflation and liquidity
    pub current: f64,
    pub z: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorOutcome {
    pub reading: IndicatorReading,
    pub issue: Option<IndicatorIssue>,
}

impl IndicatorOutcome {
    fn missing(indicator: Indicator, reason: impl Into<String>) -> Self {
        Self {
            reading: IndicatorReading::default(),
            issue: Some(IndicatorIssue::Missing {
                indicator,
                reason: reason.into(),
            }),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self.issue, Some(IndicatorIssue::Missing { .. }))
    }
}

/// Turn one fetched indicator series into a reading, absorbing every failure.
///
/// Provider errors and empty series become a zero reading flagged `Missing`.
/// Series too short or flat for a Z-score keep their current value with a zero
/// Z-score flagged `Degenerate`.
pub fn absorb_indicator(
    indicator: Indicator,
    fetched: Result<Vec<Option<f64>>, ProviderError>,
    config: &ScoringConfig,
) -> IndicatorOutcome {
    let raw = match fetched {
        Ok(raw) => raw,
        Err(e) => return IndicatorOutcome::missing(indicator, e.to_string()),
    };

    let levels = forward_fill(&raw);
    if levels.is_empty() {
        return IndicatorOutcome::missing(indicator, "no observations");
    }

    let (displayed, basis) = match indicator {
        Indicator::Rate => (levels, None),
        Indicator::Inflation => (year_over_year(&levels, config.yoy_lag), None),
        Indicator::Liquidity => {
            let growth = year_over_year(&levels, config.yoy_lag);
            match config.liquidity_basis {
                LiquidityBasis::Growth => (growth, None),
                LiquidityBasis::Level => (growth, Some(levels)),
            }
        }
    };

    let Some(&current) = displayed.last() else {
        return IndicatorOutcome::missing(
            indicator,
            format!(
                "fewer than {} observations for year-over-year change",
                config.yoy_lag + 1
            ),
        );
    };

    let z_input = basis.as_deref().unwrap_or(&displayed);
    match try_z_score(z_input, config.min_observations) {
        Ok(z) => IndicatorOutcome {
            reading: IndicatorReading { current, z },
            issue: None,
        },
        Err(kind) => IndicatorOutcome {
            reading: IndicatorReading { current, z: 0.0 },
            issue: Some(IndicatorIssue::Degenerate { indicator, kind }),
        },
    }
}

/// Weighted composite: `w_rate * z_rate + w_cpi * z_cpi - w_liq * z_liq`.
pub fn macro_score(z_rate: f64, z_inflation: f64, z_liquidity: f64, config: &ScoringConfig) -> f64 {
    config.rate_weight * z_rate + config.inflation_weight * z_inflation
        - config.liquidity_weight * z_liquidity
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stance {
    Hawkish,
    Neutral,
    Dovish,
}

impl Stance {
    pub fn from_score(score: f64) -> Self {
        if score > STANCE_THRESHOLD {
            Stance::Hawkish
        } else if score < -STANCE_THRESHOLD {
            Stance::Dovish
        } else {
            Stance::Neutral
        }
    }
}

impl fmt::Display for Stance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stance::Hawkish => write!(f, "Hawkish"),
            Stance::Neutral => write!(f, "Neutral"),
            Stance::Dovish => write!(f, "Dovish"),
        }
    }
}

/// One currency's snapshot for a refresh cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRow {
    pub label: String,
    pub symbol: String,
    pub rate: f64,
    pub inflation: f64,
    pub liquidity_growth: f64,
    pub z_rate: f64,
    pub z_inflation: f64,
    pub z_liquidity: f64,
    pub macro_score: f64,
    #[serde(default)]
    pub issues: Vec<IndicatorIssue>,
}

impl ScoreRow {
    /// False when any indicator was missing or degenerate.
    pub fn is_complete(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn stance(&self) -> Stance {
        Stance::from_score(self.macro_score)
    }
}

#[derive(Debug, Clone)]
pub struct FactorContribution {
    pub label: String,       // e.g. "Rate", "Inflation", "Liquidity"
    pub description: String, // e.g. "2 x z(+1.25)"
    pub before: f64,         // Score before this factor
    pub after: f64,          // Score after this factor
}

/// Step-by-step view of how a row's macro score was assembled.
pub fn breakdown(row: &ScoreRow, config: &ScoringConfig) -> Vec<FactorContribution> {
    let steps = [
        ("Rate", config.rate_weight, row.z_rate),
        ("Inflation", config.inflation_weight, row.z_inflation),
        ("Liquidity", -config.liquidity_weight, row.z_liquidity),
    ];

    let mut score = 0.0;
    steps
        .iter()
        .map(|&(label, weight, z)| {
            let before = score;
            score += weight * z;
            FactorContribution {
                label: label.to_string(),
                description: format!("{:+} x z({:+.2})", weight, z),
                before,
                after: score,
            }
        })
        .collect()
}

/// The three absorbed indicator outcomes of one entity.
#[derive(Debug, Clone)]
pub struct EntityReadings {
    pub rate: IndicatorOutcome,
    pub inflation: IndicatorOutcome,
    pub liquidity: IndicatorOutcome,
}

/// Build the score row for one entity.
///
/// An entity with no usable indicator at all is rejected with its issues so it
/// never shows up as a misleadingly neutral zero row.
pub fn score_entity(
    label: &str,
    symbol: &str,
    readings: EntityReadings,
    config: &ScoringConfig,
) -> Result<ScoreRow, Vec<IndicatorIssue>> {
    let EntityReadings {
        rate,
        inflation,
        liquidity,
    } = readings;

    let all_missing = rate.is_missing() && inflation.is_missing() && liquidity.is_missing();
    let issues: Vec<IndicatorIssue> = [&rate, &inflation, &liquidity]
        .into_iter()
        .filter_map(|o| o.issue.clone())
        .collect();

    if all_missing {
        return Err(issues);
    }

    let (r, c, l) = (rate.reading, inflation.reading, liquidity.reading);
    Ok(ScoreRow {
        label: label.to_string(),
        symbol: symbol.to_string(),
        rate: r.current,
        inflation: c.current,
        liquidity_growth: l.current,
        z_rate: r.z,
        z_inflation: c.z,
        z_liquidity: l.z,
        macro_score: macro_score(r.z, c.z, l.z, config),
        issues,
    })
}
