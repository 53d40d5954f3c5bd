use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::engine::ScoreRow;

/// An entity left out of the table because none of its indicators were usable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedEntity {
    pub label: String,
    pub symbol: String,
    pub reasons: Vec<String>,
}

/// Score rows of one refresh cycle, best (most hawkish) first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedTable {
    pub rows: Vec<ScoreRow>,
    #[serde(default)]
    pub skipped: Vec<SkippedEntity>,
    pub generated_at: DateTime<Utc>,
}

impl RankedTable {
    /// Rank `rows` and wrap them into a table.
    pub fn new(rows: Vec<ScoreRow>, skipped: Vec<SkippedEntity>, generated_at: DateTime<Utc>) -> Self {
        Self {
            rows: rank(rows),
            skipped,
            generated_at,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn find(&self, symbol: &str) -> Option<&ScoreRow> {
        self.rows.iter().find(|r| r.symbol.eq_ignore_ascii_case(symbol))
    }
}

/// Sort by macro score descending, then by symbol ascending for equal scores.
pub fn rank(mut rows: Vec<ScoreRow>) -> Vec<ScoreRow> {
    rows.sort_by(|a, b| {
        // Primary: score descending
        let score_cmp = b
            .macro_score
            .partial_cmp(&a.macro_score)
            .unwrap_or(Ordering::Equal);
        if score_cmp != Ordering::Equal {
            return score_cmp;
        }
        // Tie-breaker: symbol ascending
        a.symbol.cmp(&b.symbol)
    });
    rows
}

/// The strongest and weakest currency of a table and the pair they suggest.
#[derive(Debug, Clone, PartialEq)]
pub struct Headline<'a> {
    pub top_buy: &'a ScoreRow,
    pub top_sell: &'a ScoreRow,
    pub spread: f64,
}

impl Headline<'_> {
    /// Suggested pair, long side first: "EUR/JPY".
    pub fn pair(&self) -> String {
        format!("{}/{}", self.top_buy.symbol, self.top_sell.symbol)
    }
}

pub fn headline(table: &RankedTable) -> Option<Headline<'_>> {
    if table.rows.len() < 2 {
        return None;
    }
    let top_buy = table.rows.first()?;
    let top_sell = table.rows.last()?;
    Some(Headline {
        top_buy,
        top_sell,
        spread: top_buy.macro_score - top_sell.macro_score,
    })
}
