//! Diagnostic logging for rolerun
//!
//! Diagnostics go through `tracing` to stderr. They are separate from the
//! tagged console messages (`[Retry]`, `[Error]`, ...) that form the
//! stdout/log contract, so the default filter only lets warnings through.

use std::io::IsTerminal;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Default filter when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "rolerun=warn";

/// Filter used with `--verbose` when `RUST_LOG` is not set
pub const VERBOSE_FILTER: &str = "rolerun=debug,warn";

/// Check if colored diagnostics should be used.
///
/// Returns true only if stderr is a terminal and NO_COLOR is not set.
fn use_color() -> bool {
    std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

/// Build the filter for the given verbosity, honoring `RUST_LOG` first.
pub fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER }))
        .unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Initialize the tracing subscriber.
///
/// Verbose mode adds targets and span close timings; the default format is
/// compact and target-free.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(use_color())
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_line_number(false)
        .with_file(false);

    if verbose {
        tracing_subscriber::registry()
            .with(env_filter(true))
            .with(
                layer
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter(false))
            .with(layer.with_target(false).compact())
            .try_init()?;
    }

    Ok(())
}
