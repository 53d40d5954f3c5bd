use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use cb_alpha::cache::TableCache;
use cb_alpha::config::Config;
use cb_alpha::fetch::{self, FetchError};
use cb_alpha::output;
use cb_alpha::provider::{FredClient, YahooClient};
use cb_alpha::scoring::{self, RankedTable};

const EXIT_SUCCESS: i32 = 0;
const EXIT_AUTH: i32 = 1;
const EXIT_NETWORK: i32 = 2;
const EXIT_CONFIG: i32 = 4;

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rank currencies by macro score (default if no subcommand)
    Rank,
    /// Currency strength meter
    Meter,
    /// Headline pair and divergence opportunities
    Pairs,
    /// Macro score combined with price positioning
    Signals,
    /// Write the default config file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
    /// Remove cached ranked tables
    ClearCache,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
enum Format {
    Table,
    Tsv,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "cb-alpha")]
#[command(about = "Central bank macro scoring CLI", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/cb-alpha/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Always fetch fresh data, bypassing the table cache
    #[arg(long, global = true)]
    no_cache: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = Format::Table)]
    format: Format,

    #[command(subcommand)]
    command: Option<Commands>,
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Failed to serialize output: {}", e);
            std::process::exit(EXIT_CONFIG);
        }
    }
}

/// Fetch a fresh table, or serve the one cached for the current TTL bucket.
async fn load_table(
    config: &Config,
    api_key: String,
    lookback: Duration,
    ttl: Duration,
    no_cache: bool,
) -> Result<RankedTable, FetchError> {
    let now = Utc::now();

    let cache = if no_cache {
        None
    } else {
        match cb_alpha::cache::fingerprint(config) {
            Ok(fp) => Some(TableCache::new(cb_alpha::cache::get_cache_path(), ttl, fp)),
            Err(e) => {
                warn!("Table cache disabled: {:#}", e);
                None
            }
        }
    };

    if let Some(table) = cache.as_ref().and_then(|c| c.load(now)) {
        return Ok(table);
    }

    let mut client = FredClient::new(api_key)
        .map_err(|e| FetchError::ProviderUnavailable(e.to_string()))?
        .with_frequency(config.fred.frequency.clone());
    if let Some(ref url) = config.fred.base_url {
        client = client.with_base_url(url);
    }

    let table = fetch::fetch_and_score(&client, &config.entities, &config.scoring, lookback, now).await?;

    if let Some(cache) = cache {
        if let Err(e) = cache.store(&table, now) {
            warn!("Failed to cache ranked table: {:#}", e);
        }
    }

    Ok(table)
}

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for rustls 0.23+)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let cli = Cli::parse();
    cb_alpha::logging::init_logging(cli.verbose);
    let command = cli.command.unwrap_or(Commands::Rank);
    let start_time = Instant::now();
    let config_path = cli.config.map(PathBuf::from);

    // Commands that don't need a loaded config
    match command {
        Commands::Init { force } => {
            match cb_alpha::config::write_default_config(config_path, force) {
                Ok(path) => {
                    println!("Wrote default config to {}", path.display());
                    std::process::exit(EXIT_SUCCESS);
                }
                Err(e) => {
                    eprintln!("Config error: {:#}", e);
                    std::process::exit(EXIT_CONFIG);
                }
            }
        }
        Commands::ClearCache => match cb_alpha::cache::clear_cache() {
            Ok(()) => {
                println!("Cache cleared.");
                std::process::exit(EXIT_SUCCESS);
            }
            Err(e) => {
                eprintln!("Failed to clear cache: {:#}", e);
                std::process::exit(EXIT_CONFIG);
            }
        },
        _ => {}
    }

    let config = match cb_alpha::config::load_config(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };
    debug!("Loaded {} entities from config", config.entities.len());

    // Validate the whole config at startup
    if let Err(errors) = scoring::validate_config(&config) {
        eprintln!("Config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    let api_key = match cb_alpha::credentials::resolve_api_key(&config.fred) {
        Ok(key) => key,
        Err(e) => {
            eprintln!("Credential error: {}", e);
            std::process::exit(EXIT_AUTH);
        }
    };

    let durations = config
        .lookback_duration()
        .and_then(|lookback| Ok((lookback, config.cache_ttl_duration()?)));
    let (lookback, ttl) = match durations {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    let table = match load_table(&config, api_key, lookback, ttl, cli.no_cache).await {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Refresh failed: {}", e);
            if matches!(e, FetchError::NoData { .. }) {
                eprintln!("No data. Check the FRED series ids in your config.");
            } else {
                eprintln!("Check your network connection and FRED API key.");
            }
            std::process::exit(EXIT_NETWORK);
        }
    };

    let use_colors = output::should_use_colors();

    match command {
        Commands::Rank => match cli.format {
            Format::Json => print_json(&table),
            Format::Tsv => println!("{}", output::format_tsv(&table)),
            Format::Table => {
                println!("{}", output::format_ranked_table(&table, use_colors));
                if cli.verbose {
                    println!();
                    println!("{}", output::format_details(&table, &config.scoring));
                }
            }
        },
        Commands::Meter => {
            if cli.format == Format::Json {
                print_json(&table.rows);
            } else {
                let width = output::get_terminal_width();
                println!("{}", output::format_strength_meter(&table.rows, width, use_colors));
            }
        }
        Commands::Pairs => {
            let pairs = scoring::find_divergent_pairs(&table.rows, &config.divergence);
            match cli.format {
                Format::Json => print_json(&pairs),
                Format::Tsv => {
                    for pair in &pairs {
                        println!("{}\t{:.4}\t{}", pair.name(), pair.spread, pair.confidence);
                    }
                }
                Format::Table => {
                    let headline = scoring::headline(&table);
                    println!("{}", output::format_headline(headline.as_ref(), use_colors));
                    println!();
                    println!(
                        "{}",
                        output::format_pair_cards(&pairs, config.divergence.threshold, use_colors)
                    );
                }
            }
        }
        Commands::Signals => {
            let prices = match YahooClient::new(config.signals.price_range.clone()) {
                Ok(client) => match config.yahoo.base_url {
                    Some(ref url) => client.with_base_url(url),
                    None => client,
                },
                Err(e) => {
                    eprintln!("Failed to create price client: {}", e);
                    std::process::exit(EXIT_NETWORK);
                }
            };
            let signals = fetch::fetch_price_signals(
                &prices,
                &table,
                &config.entities,
                &config.signals,
                config.scoring.min_observations,
            )
            .await;
            match cli.format {
                Format::Json => print_json(&signals),
                Format::Tsv => {
                    for s in &signals {
                        println!("{}\t{:.4}\t{:.4}\t{}", s.symbol, s.macro_score, s.price_z, s.signal);
                    }
                }
                Format::Table => println!("{}", output::format_signals(&signals, use_colors)),
            }
        }
        // Handled before the config was loaded
        Commands::Init { .. } | Commands::ClearCache => {}
    }

    debug!("Done in {:?}", start_time.elapsed());
    std::process::exit(EXIT_SUCCESS);
}
