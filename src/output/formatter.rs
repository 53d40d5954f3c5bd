use owo_colors::OwoColorize;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use crate::scoring::{
    breakdown, Confidence, DivergentPair, Headline, PriceSignal, RankedTable, ScoreRow,
    ScoringConfig, SignalLabel, Stance,
};

const LABEL_WIDTH: usize = 28;
const METER_MIN_HALF: usize = 5;
const METER_MAX_HALF: usize = 30;
const METER_DEFAULT_HALF: usize = 20;

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width, defaulting to None for pipes
pub fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Signed score with two decimals: "+2.35", "-0.80".
/// If incomplete is true, appends asterisk to flag absorbed indicator issues
pub fn format_score(score: f64, incomplete: bool) -> String {
    let formatted = format!("{:+.2}", score);
    if incomplete {
        format!("{}*", formatted)
    } else {
        formatted
    }
}

/// Truncate to fit available width, by char rather than byte
fn truncate_label(label: &str, max_width: usize) -> String {
    let chars: Vec<char> = label.chars().collect();
    if chars.len() <= max_width {
        label.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

fn paint_signed(text: &str, value: f64, use_colors: bool) -> String {
    if !use_colors {
        text.to_string()
    } else if value > 0.0 {
        text.green().to_string()
    } else if value < 0.0 {
        text.red().to_string()
    } else {
        text.to_string()
    }
}

fn paint_stance(stance: Stance, use_colors: bool) -> String {
    let text = stance.to_string();
    if !use_colors {
        return text;
    }
    match stance {
        Stance::Hawkish => text.green().bold().to_string(),
        Stance::Dovish => text.red().bold().to_string(),
        Stance::Neutral => text.dimmed().to_string(),
    }
}

/// Ranked table with a header row, best score first.
pub fn format_ranked_table(table: &RankedTable, use_colors: bool) -> String {
    if table.is_empty() {
        return "No scored currencies.".to_string();
    }

    let header = format!(
        "{:>3} {:<5} {:<width$} {:>7} {:>7} {:>7} {:>7} {:>7} {:>7} {:>8}  {}",
        "#",
        "SYM",
        "CENTRAL BANK",
        "RATE",
        "CPI%",
        "LIQ%",
        "Z(R)",
        "Z(C)",
        "Z(L)",
        "SCORE",
        "STANCE",
        width = LABEL_WIDTH
    );

    let mut lines = vec![if use_colors {
        header.bold().to_string()
    } else {
        header
    }];

    for (idx, row) in table.rows.iter().enumerate() {
        let score = format!(
            "{:>8}",
            format_score(row.macro_score, !row.is_complete())
        );
        lines.push(format!(
            "{:>2}. {:<5} {:<width$} {:>7.2} {:>7.2} {:>7.2} {:>+7.2} {:>+7.2} {:>+7.2} {}  {}",
            idx + 1,
            row.symbol,
            truncate_label(&row.label, LABEL_WIDTH),
            row.rate,
            row.inflation,
            row.liquidity_growth,
            row.z_rate,
            row.z_inflation,
            row.z_liquidity,
            paint_signed(&score, row.macro_score, use_colors),
            paint_stance(row.stance(), use_colors),
            width = LABEL_WIDTH
        ));
    }

    lines.join("\n")
}

/// Per-row score breakdown, absorbed issues and skipped entities (verbose mode).
pub fn format_details(table: &RankedTable, config: &ScoringConfig) -> String {
    let mut lines = Vec::new();

    for row in &table.rows {
        lines.push(format!("{} ({})", row.symbol, format_score(row.macro_score, !row.is_complete())));
        for step in breakdown(row, config) {
            lines.push(format!(
                "  {:<10} {:<22} {:+.2} -> {:+.2}",
                step.label, step.description, step.before, step.after
            ));
        }
        for issue in &row.issues {
            lines.push(format!("  ! {}", issue));
        }
    }

    if !table.skipped.is_empty() {
        lines.push("Skipped:".to_string());
        for skipped in &table.skipped {
            lines.push(format!("  {} ({}): {}", skipped.symbol, skipped.label, skipped.reasons.join("; ")));
        }
    }

    lines.join("\n")
}

/// Ranked rows as tab-separated values for scripting
/// Columns: symbol, score, rate, cpi, liquidity, z_rate, z_inflation,
/// z_liquidity, complete (no headers, no colors)
pub fn format_tsv(table: &RankedTable) -> String {
    table
        .rows
        .iter()
        .map(|row| {
            format!(
                "{}\t{:.4}\t{:.4}\t{:.4}\t{:.4}\t{:.4}\t{:.4}\t{:.4}\t{}",
                row.symbol,
                row.macro_score,
                row.rate,
                row.inflation,
                row.liquidity_growth,
                row.z_rate,
                row.z_inflation,
                row.z_liquidity,
                row.is_complete()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Horizontal strength meter centred on zero.
///
/// Bars are scaled so the largest absolute score fills half of the available
/// width. `width` is the terminal width (None for pipes).
pub fn format_strength_meter(rows: &[ScoreRow], width: Option<usize>, use_colors: bool) -> String {
    if rows.is_empty() {
        return "No scored currencies.".to_string();
    }

    // "USD  +2.35* " prefix
    let prefix_width = 5 + 9;
    let half = width
        .map(|w| w.saturating_sub(prefix_width + 1) / 2)
        .unwrap_or(METER_DEFAULT_HALF)
        .clamp(METER_MIN_HALF, METER_MAX_HALF);

    let max_abs = rows
        .iter()
        .map(|r| r.macro_score.abs())
        .fold(0.0_f64, f64::max);

    rows.iter()
        .map(|row| {
            let cells = if max_abs > 0.0 {
                ((row.macro_score.abs() / max_abs) * half as f64).round() as usize
            } else {
                0
            };
            let bar = "█".repeat(cells);
            let (left, right) = if row.macro_score < 0.0 {
                (format!("{:>half$}", bar, half = half), String::new())
            } else {
                (" ".repeat(half), bar)
            };
            let score = format!("{:>8}", format_score(row.macro_score, !row.is_complete()));
            format!(
                "{:<5}{} {}|{}",
                row.symbol,
                score,
                paint_signed(&left, row.macro_score, use_colors),
                paint_signed(&right, row.macro_score, use_colors)
            )
            .trim_end()
            .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Top buy / top sell summary line.
pub fn format_headline(headline: Option<&Headline<'_>>, use_colors: bool) -> String {
    let Some(h) = headline else {
        return "Not enough scored currencies for a headline.".to_string();
    };

    let pair = h.pair();
    let pair = if use_colors { pair.bold().to_string() } else { pair };
    format!(
        "Top buy: {} ({})  Top sell: {} ({})  Pair: {}  Spread: {:.2}",
        h.top_buy.symbol,
        format_score(h.top_buy.macro_score, !h.top_buy.is_complete()),
        h.top_sell.symbol,
        format_score(h.top_sell.macro_score, !h.top_sell.is_complete()),
        pair,
        h.spread
    )
}

/// One card per divergent pair, widest spread first.
pub fn format_pair_cards(pairs: &[DivergentPair], threshold: f64, use_colors: bool) -> String {
    if pairs.is_empty() {
        return format!(
            "No major divergence detected (no spread above {:.2}).",
            threshold
        );
    }

    pairs
        .iter()
        .map(|pair| {
            let name = pair.name();
            let (name, confidence) = if use_colors {
                let confidence = match pair.confidence {
                    Confidence::High => pair.confidence.to_string().green().bold().to_string(),
                    Confidence::Moderate => pair.confidence.to_string().yellow().to_string(),
                };
                (name.bold().to_string(), confidence)
            } else {
                (name, pair.confidence.to_string())
            };
            format!(
                "{}  spread {:.2}  confidence {}\n  Long {} / short {}",
                name, pair.spread, confidence, pair.long_label, pair.short_label
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn paint_signal(signal: SignalLabel, use_colors: bool) -> String {
    let text = signal.to_string();
    if !use_colors {
        return text;
    }
    match signal {
        SignalLabel::StrongBuy => text.green().bold().to_string(),
        SignalLabel::Buy => text.green().to_string(),
        SignalLabel::Neutral => text.dimmed().to_string(),
        SignalLabel::Sell => text.red().to_string(),
        SignalLabel::StrongSell => text.red().bold().to_string(),
    }
}

/// Price overlay table: macro score, latest price, price Z-score, verdict.
pub fn format_signals(signals: &[PriceSignal], use_colors: bool) -> String {
    if signals.is_empty() {
        return "No price tickers configured.".to_string();
    }

    let header = format!(
        "{:<5} {:<10} {:>8} {:>12} {:>8}  {}",
        "SYM", "TICKER", "SCORE", "PRICE", "Z(P)", "SIGNAL"
    );
    let mut lines = vec![if use_colors {
        header.bold().to_string()
    } else {
        header
    }];

    for signal in signals {
        let price = signal
            .last_price
            .map(|p| format!("{:.4}", p))
            .unwrap_or_else(|| "-".to_string());
        let mut line = format!(
            "{:<5} {:<10} {:>8} {:>12} {:>+8.2}  {}",
            signal.symbol,
            signal.ticker,
            format_score(signal.macro_score, false),
            price,
            signal.price_z,
            paint_signal(signal.signal, use_colors)
        );
        if let Some(ref issue) = signal.issue {
            line.push_str(&format!("  ({})", issue));
        }
        lines.push(line);
    }

    lines.join("\n")
}
