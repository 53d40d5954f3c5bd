use std::io::IsTerminal;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when RUST_LOG is not set.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "cb_alpha=debug"
    } else {
        "cb_alpha=warn"
    }
}

/// Initialize the global tracing subscriber.
///
/// Records go to stderr so they never mix with table output on stdout.
/// RUST_LOG takes precedence over `--verbose`.
pub fn init_logging(verbose: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(std::io::stderr().is_terminal())
                .compact(),
        )
        .init();
}
