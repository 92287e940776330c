//! Streaming executor: one generation attempt
//!
//! [`execute_once`] opens a single generation call, forwards each redacted
//! fragment to the console as it arrives, and persists the raw text to the
//! output file only when the attempt produced something. It never retries;
//! that is the job of [`crate::retry`].

use camino::Utf8Path;
use futures::StreamExt;
use rolerun_llm::{GenerationBackend, GenerationRequest, LlmError};
use rolerun_redaction::{RedactionSet, redact_error_message};
use rolerun_utils::atomic_write::write_file_atomic;
use rolerun_utils::error::{ErrorCategory, UserFriendlyError};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::console::Console;

/// Result of one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Non-empty text was streamed and persisted
    Success(String),
    /// The stream ended cleanly without any non-whitespace text
    EmptyResponse,
    /// The stream could not be established, faulted midway, or the output
    /// could not be persisted
    TransportError(Fault),
    /// Cancellation was observed before the attempt finished
    Interrupted,
}

impl Outcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// A failed attempt as shown to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    /// Redacted one-line description
    pub detail: String,
    /// Remediation lines, shown once the retry budget is spent
    pub hints: Vec<String>,
}

impl Fault {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
            hints: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_hints(mut self, hints: Vec<String>) -> Self {
        self.hints = hints;
        self
    }
}

/// Raw fragments of one attempt, in arrival order.
#[derive(Debug, Default)]
pub struct StreamAccumulator {
    fragments: Vec<String>,
}

impl StreamAccumulator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, fragment: String) {
        self.fragments.push(fragment);
    }

    /// Concatenation of every fragment received so far.
    #[must_use]
    pub fn text(&self) -> String {
        self.fragments.concat()
    }

    /// True when nothing but whitespace has arrived.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fragments.iter().all(|f| f.trim().is_empty())
    }

    #[must_use]
    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }
}

/// Run one generation attempt against `backend`.
///
/// Fragments are redacted before they reach stdout or the log; the output
/// file receives the unredacted concatenation. Cancellation is observed
/// while establishing the stream and while waiting for each fragment, and
/// leaves the output file untouched.
pub async fn execute_once(
    backend: &dyn GenerationBackend,
    request: &GenerationRequest,
    redaction: &RedactionSet,
    console: &mut Console,
    output: &Utf8Path,
    cancel: &CancellationToken,
) -> Outcome {
    debug!(model = %request.model, "Opening generation stream");

    let mut stream = tokio::select! {
        biased;
        () = cancel.cancelled() => return Outcome::Interrupted,
        result = backend.stream_generate(request) => match result {
            Ok(stream) => stream,
            Err(e) => return transport_error(&e, redaction),
        },
    };

    let mut accumulator = StreamAccumulator::new();
    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => return Outcome::Interrupted,
            next = stream.next() => next,
        };

        match next {
            Some(Ok(fragment)) => {
                console.stream(&redaction.apply(&fragment));
                accumulator.push(fragment);
            }
            Some(Err(e)) => return transport_error(&e, redaction),
            None => break,
        }
    }

    console.stream("\n");

    if accumulator.is_empty() {
        console.err_line("[Warning] Empty response from model.");
        return Outcome::EmptyResponse;
    }

    let text = accumulator.text();
    match write_file_atomic(output, &text) {
        Ok(result) => {
            debug!(
                path = %output,
                bytes = result.bytes_written,
                rename_retries = result.rename_retry_count,
                fragments = accumulator.fragment_count(),
                "Persisted model output"
            );
            Outcome::Success(text)
        }
        Err(e) => {
            debug!(path = %output, error = %e, "Failed to persist model output");
            Outcome::TransportError(Fault::new(redaction.apply(&redact_error_message(
                &format!("Failed to write {output}: {e:#}"),
            ))))
        }
    }
}

/// Only authentication faults carry hints; retrying cannot fix them.
fn transport_error(error: &LlmError, redaction: &RedactionSet) -> Outcome {
    let detail = redaction.apply(&redact_error_message(&error.to_string()));
    debug!(error = %detail, category = %error.category(), "Generation attempt failed");
    let fault = Fault::new(detail);
    if error.category() == ErrorCategory::Authentication {
        Outcome::TransportError(fault.with_hints(error.suggestions()))
    } else {
        Outcome::TransportError(fault)
    }
}
