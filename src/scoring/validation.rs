use std::collections::HashSet;

use crate::config::Config;

const PRICE_RANGES: &[&str] = &["3mo", "6mo", "1y", "2y", "5y", "10y", "ytd", "max"];

/// Validate the whole configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_config(config: &Config) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    // Durations
    if let Err(e) = config.lookback_duration() {
        errors.push(format!("lookback: {:#}", e));
    }
    match config.cache_ttl_duration() {
        Ok(ttl) if ttl.as_secs() == 0 => {
            errors.push("cache_ttl: must be at least one second".to_string());
        }
        Ok(_) => {}
        Err(e) => errors.push(format!("cache_ttl: {:#}", e)),
    }

    // Entities
    if config.entities.is_empty() {
        errors.push("entities: at least one entity is required".to_string());
    }
    let mut seen = HashSet::new();
    for (i, entity) in config.entities.iter().enumerate() {
        if entity.symbol.trim().is_empty() {
            errors.push(format!("entities[{}].symbol: must not be empty", i));
        } else if !seen.insert(entity.symbol.to_uppercase()) {
            errors.push(format!("entities[{}].symbol: duplicate '{}'", i, entity.symbol));
        }
        for (field, id) in [
            ("rate", &entity.rate),
            ("inflation", &entity.inflation),
            ("liquidity", &entity.liquidity),
        ] {
            if id.trim().is_empty() {
                errors.push(format!("entities[{}].{}: series id must not be empty", i, field));
            }
        }
    }

    // Scoring
    let scoring = &config.scoring;
    for (field, weight) in [
        ("rate_weight", scoring.rate_weight),
        ("inflation_weight", scoring.inflation_weight),
        ("liquidity_weight", scoring.liquidity_weight),
    ] {
        if !weight.is_finite() {
            errors.push(format!("scoring.{}: must be a finite number", field));
        }
    }
    if scoring.min_observations < 2 {
        errors.push("scoring.min_observations: must be at least 2".to_string());
    }
    if scoring.yoy_lag == 0 {
        errors.push("scoring.yoy_lag: must be at least 1".to_string());
    }

    // Divergence
    let divergence = &config.divergence;
    if !divergence.threshold.is_finite() || divergence.threshold < 0.0 {
        errors.push("divergence.threshold: must be non-negative".to_string());
    }
    if !divergence.high_confidence.is_finite() || divergence.high_confidence < divergence.threshold {
        errors.push("divergence.high_confidence: must be >= divergence.threshold".to_string());
    }

    // Signals
    let signals = &config.signals;
    if !(signals.macro_threshold.is_finite() && signals.macro_threshold > 0.0) {
        errors.push("signals.macro_threshold: must be positive".to_string());
    }
    if !(signals.price_threshold.is_finite() && signals.price_threshold > 0.0) {
        errors.push("signals.price_threshold: must be positive".to_string());
    }
    if !PRICE_RANGES.contains(&signals.price_range.as_str()) {
        errors.push(format!(
            "signals.price_range: invalid '{}' - expected one of {}",
            signals.price_range,
            PRICE_RANGES.join(", ")
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
