use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Deviations this small relative to the largest value are rounding noise, not variance.
const RELATIVE_VARIANCE_FLOOR: f64 = 1e-12;

/// Why a series could not produce a meaningful Z-score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum DegenerateSeries {
    #[error("no observations")]
    Empty,

    #[error("only {len} observations, need {min}")]
    TooShort { len: usize, min: usize },

    #[error("zero variance")]
    ZeroVariance,
}

/// Carry the last seen value forward over gaps.
///
/// Leading gaps have nothing to carry and are dropped, as are non-finite values.
pub fn forward_fill(series: &[Option<f64>]) -> Vec<f64> {
    let mut last = None;
    series
        .iter()
        .filter_map(|value| {
            if let Some(v) = value.filter(|v| v.is_finite()) {
                last = Some(v);
            }
            last
        })
        .collect()
}

/// Percent change between each value and the one `lag` steps earlier.
///
/// The first `lag` entries have no prior value and are dropped. Changes from a
/// zero base are undefined and dropped too. A `lag` of 0 yields nothing.
pub fn year_over_year(series: &[f64], lag: usize) -> Vec<f64> {
    if lag == 0 || series.len() <= lag {
        return Vec::new();
    }

    series
        .windows(lag + 1)
        .filter_map(|w| {
            let (prev, curr) = (w[0], w[lag]);
            let change = (curr / prev - 1.0) * 100.0;
            change.is_finite().then_some(change)
        })
        .collect()
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator).
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (sum_sq / (values.len() - 1) as f64).sqrt()
}

/// Z-score of the latest value against the whole of `values`.
///
/// `values` must already be clean (see [`forward_fill`]).
pub fn try_z_score(values: &[f64], min_observations: usize) -> Result<f64, DegenerateSeries> {
    let Some(&last) = values.last() else {
        return Err(DegenerateSeries::Empty);
    };

    // A sample deviation needs two points whatever the configured minimum says.
    let min = min_observations.max(2);
    if values.len() < min {
        return Err(DegenerateSeries::TooShort {
            len: values.len(),
            min,
        });
    }

    let m = mean(values);
    let sd = std_dev(values);
    let magnitude = values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if sd <= RELATIVE_VARIANCE_FLOOR * magnitude {
        return Err(DegenerateSeries::ZeroVariance);
    }

    let z = (last - m) / sd;
    if z.is_finite() {
        Ok(z)
    } else {
        Err(DegenerateSeries::ZeroVariance)
    }
}

/// Z-score of a raw series with gaps; 0.0 whenever the series is degenerate.
pub fn z_score(series: &[Option<f64>], min_observations: usize) -> f64 {
    try_z_score(&forward_fill(series), min_observations).unwrap_or(0.0)
}
