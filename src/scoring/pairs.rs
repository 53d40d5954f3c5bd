use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

use super::config::DivergenceConfig;
use super::engine::ScoreRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Moderate,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::High => write!(f, "high"),
            Confidence::Moderate => write!(f, "moderate"),
        }
    }
}

/// A long/short candidate: buy `long`, sell `short`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DivergentPair {
    pub long: String,
    pub long_label: String,
    pub short: String,
    pub short_label: String,
    pub spread: f64,
    pub confidence: Confidence,
}

impl DivergentPair {
    pub fn name(&self) -> String {
        format!("{}/{}", self.long, self.short)
    }
}

/// Every ordered pair whose score spread exceeds `config.threshold`, widest first.
///
/// Only pairs where the long side scores strictly higher are emitted, whatever
/// the threshold.
pub fn find_divergent_pairs(rows: &[ScoreRow], config: &DivergenceConfig) -> Vec<DivergentPair> {
    let mut pairs = Vec::new();

    for long in rows {
        for short in rows {
            let spread = long.macro_score - short.macro_score;
            if spread <= 0.0 || spread <= config.threshold {
                continue;
            }
            pairs.push(DivergentPair {
                long: long.symbol.clone(),
                long_label: long.label.clone(),
                short: short.symbol.clone(),
                short_label: short.label.clone(),
                spread,
                confidence: if spread > config.high_confidence {
                    Confidence::High
                } else {
                    Confidence::Moderate
                },
            });
        }
    }

    // Stable sort keeps scan order for equal spreads
    pairs.sort_by(|a, b| b.spread.partial_cmp(&a.spread).unwrap_or(Ordering::Equal));
    pairs
}
