use serde::{Deserialize, Serialize};

/// Which series the liquidity Z-score is measured on.
///
/// The displayed liquidity figure is always the year-over-year growth rate.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LiquidityBasis {
    /// Z-score of the year-over-year growth rate.
    #[default]
    Growth,
    /// Z-score of the raw balance sheet / money stock level.
    Level,
}

/// Macro score weights and normalization settings.
///
/// Example YAML:
/// ```yaml
/// scoring:
///   rate_weight: 2.0
///   inflation_weight: 1.0
///   liquidity_weight: 0.5
///   min_observations: 10
///   yoy_lag: 12
///   liquidity_basis: growth
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ScoringConfig {
    /// Weight on the policy rate Z-score (default: 2.0)
    pub rate_weight: f64,

    /// Weight on the inflation Z-score (default: 1.0)
    pub inflation_weight: f64,

    /// Weight subtracted per unit of liquidity Z-score (default: 1.0)
    pub liquidity_weight: f64,

    /// Below this many clean observations a Z-score is neutral (default: 10)
    pub min_observations: usize,

    /// Lag, in months, for year-over-year change (default: 12)
    pub yoy_lag: usize,

    pub liquidity_basis: LiquidityBasis,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            rate_weight: 2.0,
            inflation_weight: 1.0,
            liquidity_weight: 1.0,
            min_observations: 10,
            yoy_lag: 12,
            liquidity_basis: LiquidityBasis::Growth,
        }
    }
}

/// Thresholds for flagging long/short pairs.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DivergenceConfig {
    /// Minimum score spread for a pair to be reported (default: 2.5)
    pub threshold: f64,

    /// Spread above which a pair is labelled high confidence (default: 4.0)
    pub high_confidence: f64,
}

impl Default for DivergenceConfig {
    fn default() -> Self {
        Self {
            threshold: 2.5,
            high_confidence: 4.0,
        }
    }
}

/// Price overlay settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SignalConfig {
    /// Yahoo range token for the price history (default: "2y")
    pub price_range: String,

    /// |macro score| needed before a directional signal is given (default: 1.0)
    pub macro_threshold: f64,

    /// |price Z-score| that upgrades a signal to "strong" (default: 1.0)
    pub price_threshold: f64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            price_range: "2y".to_string(),
            macro_threshold: 1.0,
            price_threshold: 1.0,
        }
    }
}
