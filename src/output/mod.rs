pub mod formatter;

pub use formatter::{
    format_details, format_headline, format_pair_cards, format_ranked_table, format_score,
    format_signals, format_strength_meter, format_tsv, get_terminal_width, should_use_colors,
};
