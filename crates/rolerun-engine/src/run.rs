//! Run orchestration
//!
//! One run, end to end: build the client, read the role, assemble the
//! context, build the redaction set, open the log, then hand over to the
//! retry controller. Every fatal condition is reported on the console and
//! folded into a [`RunStatus`]; nothing escapes as an error.

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use rolerun_config::RunnerConfig;
use rolerun_context::{assemble_sections_reporting, read_file_reporting, render_sections};
use rolerun_llm::{BackendFactory, GenerationBackend, GenerationRequest};
use rolerun_redaction::RedactionSet;
use rolerun_utils::error::{ConfigError, UserFriendlyError};
use rolerun_utils::exit_codes::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::console::{Console, append_line};
use crate::executor::{Outcome, execute_once};
use crate::retry::{Attempt, RetryPolicy, Sleeper, TokioSleeper, run_with_retry};

const SKIP_MESSAGE: &str = "[Skip] All input files are empty. Nothing to process.";
const INTERRUPT_MESSAGE: &str = "\n[Agent] Interrupted. Exiting gracefully.";

/// Everything the operator asked for, fixed for the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub role_file: Utf8PathBuf,
    /// Context files, in the order given
    pub input_files: Vec<Utf8PathBuf>,
    pub output_file: Utf8PathBuf,
    pub log_file: Option<Utf8PathBuf>,
    /// Overrides the configured default model
    pub model: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Succeeded,
    Failed,
    Interrupted,
}

impl RunStatus {
    #[must_use]
    pub fn exit_code(self) -> ExitCode {
        match self {
            Self::Succeeded => ExitCode::SUCCESS,
            Self::Failed => ExitCode::FAILURE,
            Self::Interrupted => ExitCode::INTERRUPTED,
        }
    }
}

/// Execute one run with the default retry policy and real backoff waits.
pub async fn run_agent(
    request: &RunRequest,
    config: &RunnerConfig,
    factory: &dyn BackendFactory,
    console: &mut Console,
    cancel: &CancellationToken,
) -> RunStatus {
    run_agent_with(
        request,
        config,
        factory,
        &RetryPolicy::default(),
        &TokioSleeper,
        console,
        cancel,
    )
    .await
}

/// [`run_agent`] with an explicit retry policy and sleeper.
pub async fn run_agent_with(
    request: &RunRequest,
    config: &RunnerConfig,
    factory: &dyn BackendFactory,
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
    console: &mut Console,
    cancel: &CancellationToken,
) -> RunStatus {
    let status = drive(request, config, factory, policy, sleeper, console, cancel).await;
    if status == RunStatus::Interrupted {
        console.out_line(INTERRUPT_MESSAGE);
    }
    console.close_log();
    info!(status = ?status, "Run finished");
    status
}

async fn drive(
    request: &RunRequest,
    config: &RunnerConfig,
    factory: &dyn BackendFactory,
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
    console: &mut Console,
    cancel: &CancellationToken,
) -> RunStatus {
    let created = {
        let mut notify = |line: &str| console.out_line(line);
        tokio::select! {
            biased;
            () = cancel.cancelled() => return RunStatus::Interrupted,
            created = factory.create(config, &mut notify) => created,
        }
    };
    let backend = match created {
        Ok(backend) => backend,
        Err(e) => {
            report_fatal(console, &e);
            return RunStatus::Failed;
        }
    };

    let role = read_file_reporting(&request.role_file, &mut |line: &str| console.err_line(line));
    let Some(role) = role else {
        let e = ConfigError::MissingRole {
            path: request.role_file.to_string(),
        };
        report_fatal(console, &e);
        return RunStatus::Failed;
    };

    let sections = assemble_sections_reporting(&request.input_files, &mut |line: &str| {
        console.err_line(line);
    });
    let Some(context) = render_sections(&sections) else {
        console.out_line(SKIP_MESSAGE);
        if let Some(log) = &request.log_file
            && let Err(e) = append_line(log, SKIP_MESSAGE)
        {
            warn!(path = %log, error = %e, "Could not record skip in log");
        }
        return RunStatus::Failed;
    };

    let redaction = RedactionSet::from_config(config);
    debug!(entries = redaction.len(), "Built redaction set");

    if let Some(log) = &request.log_file
        && let Err(e) = console.open_log(log)
    {
        console.err_line(&format!("[Warning] Could not open log file: {e}"));
    }

    let model = config.model_or_default(request.model.as_deref());
    info!(
        model = %model,
        sections = sections.len(),
        bytes = context.len(),
        "Starting generation"
    );

    let generation = GenerationRequest::new(model, role, context);
    let mut attempt = ExecutorAttempt {
        backend: backend.as_ref(),
        request: &generation,
        redaction: &redaction,
        output: &request.output_file,
        cancel,
    };

    match run_with_retry(&mut attempt, policy, sleeper, console, cancel).await {
        Ok(true) => RunStatus::Succeeded,
        Ok(false) => RunStatus::Failed,
        Err(_) => RunStatus::Interrupted,
    }
}

fn report_fatal(console: &mut Console, error: &ConfigError) {
    debug!(category = %error.category(), error = %error, "Run cannot start");
    console.err_line(&format!("[Error] {}", error.user_message()));
    for suggestion in error.suggestions() {
        console.err_line(&format!("  → {suggestion}"));
    }
}

/// One streaming attempt per retry step.
struct ExecutorAttempt<'a> {
    backend: &'a dyn GenerationBackend,
    request: &'a GenerationRequest,
    redaction: &'a RedactionSet,
    output: &'a Utf8Path,
    cancel: &'a CancellationToken,
}

#[async_trait]
impl Attempt for ExecutorAttempt<'_> {
    async fn attempt(&mut self, number: u32, console: &mut Console) -> Outcome {
        debug!(attempt = number, model = %self.request.model, "Executing attempt");
        execute_once(
            self.backend,
            self.request,
            self.redaction,
            console,
            self.output,
            self.cancel,
        )
        .await
    }
}
