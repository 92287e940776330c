//! CLI entry point
//!
//! Owns `run()`, which parses arguments, resolves configuration from the
//! environment once, builds the tokio runtime, wires operator signals to a
//! cancellation token, and maps the run's status to an exit code.

use clap::Parser;
use rolerun_config::{ProcessEnv, RunnerConfig};
use rolerun_engine::{Console, RunStatus, run_agent};
use rolerun_llm::GeminiBackendFactory;
use rolerun_utils::exit_codes::ExitCode;
use rolerun_utils::logging::init_tracing;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::args::Cli;

/// Main CLI execution function.
///
/// All user-facing output happens inside; on failure the exit code is
/// returned and `main` only exits with it.
pub fn run() -> Result<(), ExitCode> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // --help and --version arrive here too
            return if e.use_stderr() {
                Err(ExitCode::CLI_ARGS)
            } else {
                Ok(())
            };
        }
    };

    if let Err(e) = init_tracing(cli.verbose) {
        eprintln!("[Warning] Could not initialise diagnostics: {e}");
    }

    let config = RunnerConfig::from_env(&ProcessEnv);
    let request = cli.into_request();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("[Error] Failed to create async runtime: {e}");
            return Err(ExitCode::FAILURE);
        }
    };

    let status = rt.block_on(async {
        let cancel = CancellationToken::new();
        let signals = tokio::spawn(cancel_on_signal(cancel.clone()));

        let mut console = Console::stdio();
        let factory = GeminiBackendFactory::new();
        let status = run_agent(&request, &config, &factory, &mut console, &cancel).await;

        signals.abort();
        status
    });

    match status {
        RunStatus::Succeeded => Ok(()),
        other => Err(other.exit_code()),
    }
}

/// Cancel `token` on SIGINT, or SIGTERM on unix.
async fn cancel_on_signal(token: CancellationToken) {
    wait_for_signal().await;
    debug!("Operator interrupt received");
    token.cancel();
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(stream) => stream,
        Err(e) => {
            debug!(error = %e, "SIGTERM handler unavailable");
            return wait_for_ctrl_c().await;
        }
    };

    tokio::select! {
        () = wait_for_ctrl_c() => {}
        _ = terminate.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    wait_for_ctrl_c().await;
}

async fn wait_for_ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        // Without a handler the default disposition still terminates the process
        debug!(error = %e, "Ctrl-C handler unavailable");
        std::future::pending::<()>().await;
    }
}
