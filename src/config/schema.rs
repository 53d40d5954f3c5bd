use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::scoring::{DivergenceConfig, ScoringConfig, SignalConfig};

/// Top-level configuration, passed explicitly into every refresh.
///
/// Every section has defaults, so an empty file is a valid config.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub fred: FredConfig,

    #[serde(default)]
    pub yahoo: YahooConfig,

    /// How far back to fetch indicator history, e.g. "5y" (default: 5y)
    #[serde(default = "default_lookback")]
    pub lookback: String,

    /// How long a computed table stays valid, e.g. "1d" (default: 1d)
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl: String,

    #[serde(default = "default_entities")]
    pub entities: Vec<EntityConfig>,

    #[serde(default)]
    pub scoring: ScoringConfig,

    #[serde(default)]
    pub divergence: DivergenceConfig,

    #[serde(default)]
    pub signals: SignalConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FredConfig {
    /// FRED API key. The CB_ALPHA_FRED_KEY environment variable takes precedence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Aggregate every series to this FRED frequency code (default: "m").
    /// Set to null to receive each series at its native cadence.
    #[serde(default = "default_frequency", skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
}

impl Default for FredConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            frequency: default_frequency(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct YahooConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// One monetary-policy issuer and the FRED series that describe it.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EntityConfig {
    /// Display label, e.g. "USD (Fed)"
    pub label: String,

    /// Short currency code, e.g. "USD"
    pub symbol: String,

    /// Policy rate series id
    pub rate: String,

    /// Consumer price index series id (levels; converted to YoY %)
    pub inflation: String,

    /// Balance sheet or money stock series id (levels; converted to YoY %)
    pub liquidity: String,

    /// Yahoo ticker for the price overlay, e.g. "EURUSD=X"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_ticker: Option<String>,

    /// The ticker prices USD in this currency ("JPY=X" is USD/JPY), so closes are inverted
    #[serde(default, skip_serializing_if = "is_false")]
    pub invert_price: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn default_frequency() -> Option<String> {
    Some("m".to_string())
}

fn default_lookback() -> String {
    "5y".to_string()
}

fn default_cache_ttl() -> String {
    "1d".to_string()
}

fn entity(
    label: &str,
    symbol: &str,
    rate: &str,
    inflation: &str,
    liquidity: &str,
    ticker: &str,
    invert_price: bool,
) -> EntityConfig {
    EntityConfig {
        label: label.to_string(),
        symbol: symbol.to_string(),
        rate: rate.to_string(),
        inflation: inflation.to_string(),
        liquidity: liquidity.to_string(),
        price_ticker: Some(ticker.to_string()),
        invert_price,
    }
}

/// The seven major central banks. Where no balance sheet series exists the
/// M1 money stock stands in as the liquidity proxy.
pub fn default_entities() -> Vec<EntityConfig> {
    vec![
        entity("USD (Fed)", "USD", "FEDFUNDS", "CPIAUCSL", "WALCL", "DX-Y.NYB", false),
        entity("EUR (ECB)", "EUR", "ECBDFR", "CP0000EZ19M086NEST", "ECBASSETSW", "EURUSD=X", false),
        entity("JPY (BoJ)", "JPY", "IRSTCI01JPM156N", "JPNCPIALLMINMEI", "JPNASSETS", "JPY=X", true),
        entity("GBP (BoE)", "GBP", "IUDSOIA", "GBRCPIALLMINMEI", "MANMM101GBM189S", "GBPUSD=X", false),
        entity("CAD (BoC)", "CAD", "IRSTCI01CAM156N", "CANCPIALLMINMEI", "MANMM101CAM189S", "CAD=X", true),
        entity("AUD (RBA)", "AUD", "IRSTCI01AUM156N", "AUSCPIALLMINMEI", "MANMM101AUM189S", "AUDUSD=X", false),
        entity("CHF (SNB)", "CHF", "IRSTCI01CHM156N", "CHECPIALLMINMEI", "CHFCENTRALBANK", "CHF=X", true),
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fred: FredConfig::default(),
            yahoo: YahooConfig::default(),
            lookback: default_lookback(),
            cache_ttl: default_cache_ttl(),
            entities: default_entities(),
            scoring: ScoringConfig::default(),
            divergence: DivergenceConfig::default(),
            signals: SignalConfig::default(),
        }
    }
}

impl Config {
    pub fn lookback_duration(&self) -> Result<Duration> {
        humantime::parse_duration(self.lookback.trim())
            .with_context(|| format!("Invalid lookback '{}'", self.lookback))
    }

    pub fn cache_ttl_duration(&self) -> Result<Duration> {
        humantime::parse_duration(self.cache_ttl.trim())
            .with_context(|| format!("Invalid cache_ttl '{}'", self.cache_ttl))
    }
}
