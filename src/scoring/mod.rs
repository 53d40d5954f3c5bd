pub mod config;
pub mod engine;
pub mod pairs;
pub mod rank;
pub mod signal;
pub mod stats;
pub mod validation;

pub use config::*;
pub use engine::{
    absorb_indicator, breakdown, macro_score, score_entity, EntityReadings, FactorContribution,
    Indicator, IndicatorIssue, IndicatorOutcome, IndicatorReading, ScoreRow, Stance,
};
pub use pairs::{find_divergent_pairs, Confidence, DivergentPair};
pub use rank::{headline, rank, Headline, RankedTable, SkippedEntity};
pub use signal::{read_prices, signal_label, PriceReading, PriceSignal, SignalLabel};
pub use stats::{forward_fill, try_z_score, year_over_year, z_score, DegenerateSeries};
pub use validation::validate_config;
