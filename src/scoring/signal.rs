use serde::Serialize;
use std::fmt;

use super::config::SignalConfig;
use super::stats::{forward_fill, try_z_score, DegenerateSeries};

/// Combined macro + price verdict for one currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalLabel {
    StrongBuy,
    Buy,
    Neutral,
    Sell,
    StrongSell,
}

impl fmt::Display for SignalLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalLabel::StrongBuy => write!(f, "STRONG BUY"),
            SignalLabel::Buy => write!(f, "BUY"),
            SignalLabel::Neutral => write!(f, "NEUTRAL"),
            SignalLabel::Sell => write!(f, "SELL"),
            SignalLabel::StrongSell => write!(f, "STRONG SELL"),
        }
    }
}

/// A hawkish currency that is also cheap against its own history is the
/// strongest buy; a dovish one trading rich is the strongest sell.
pub fn signal_label(macro_score: f64, price_z: f64, config: &SignalConfig) -> SignalLabel {
    let m = config.macro_threshold;
    let p = config.price_threshold;

    if macro_score >= m {
        if price_z <= -p {
            SignalLabel::StrongBuy
        } else {
            SignalLabel::Buy
        }
    } else if macro_score <= -m {
        if price_z >= p {
            SignalLabel::StrongSell
        } else {
            SignalLabel::Sell
        }
    } else {
        SignalLabel::Neutral
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceReading {
    pub last: f64,
    pub z: f64,
    pub degenerate: Option<DegenerateSeries>,
}

/// Latest close and its Z-score against the whole window.
///
/// With `invert` every close is replaced by its reciprocal, turning a USD-based
/// quote (USD/JPY) into the currency's own value (JPY/USD). Returns `None` when
/// there is no usable close.
pub fn read_prices(closes: &[Option<f64>], invert: bool, min_observations: usize) -> Option<PriceReading> {
    let mut prices = forward_fill(closes);
    if invert {
        prices = prices
            .into_iter()
            .filter(|p| *p != 0.0)
            .map(|p| 1.0 / p)
            .collect();
    }

    let last = *prices.last()?;
    let (z, degenerate) = match try_z_score(&prices, min_observations) {
        Ok(z) => (z, None),
        Err(kind) => (0.0, Some(kind)),
    };
    Some(PriceReading { last, z, degenerate })
}

/// Price overlay row for one ranked currency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSignal {
    pub symbol: String,
    pub ticker: String,
    pub macro_score: f64,
    pub last_price: Option<f64>,
    pub price_z: f64,
    pub signal: SignalLabel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue: Option<String>,
}
