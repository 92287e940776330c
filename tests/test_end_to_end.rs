//! End-to-end runs through the engine with scripted backends
//!
//! Each test builds real role/input files in a temp directory, runs the full
//! orchestration (client → role → context → redaction → log → retry loop)
//! and checks stdout, stderr, the log file and the output file together.

use std::time::Duration;

use camino::Utf8PathBuf;
use rolerun::engine::test_support::{
    RecordingSleeper, Script, ScriptedBackend, ScriptedFactory, capture_console,
};
use rolerun::engine::{RetryPolicy, run_agent_with};
use rolerun::llm::LlmError;
use rolerun::{RunRequest, RunStatus, RunnerConfig, RunnerConfigBuilder};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    fn path(&self, name: &str) -> Utf8PathBuf {
        Utf8PathBuf::try_from(self.dir.path().join(name)).unwrap()
    }

    fn write(&self, name: &str, content: &str) -> Utf8PathBuf {
        let path = self.path(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn read(&self, name: &str) -> String {
        std::fs::read_to_string(self.path(name)).unwrap()
    }

    fn request(&self, inputs: &[&str]) -> RunRequest {
        RunRequest {
            role_file: self.write("role.md", "You review documents."),
            input_files: inputs.iter().map(|name| self.path(name)).collect(),
            output_file: self.path("out.md"),
            log_file: Some(self.path("run.log")),
            model: None,
        }
    }
}

fn config() -> RunnerConfig {
    RunnerConfigBuilder::new().api_key("AIza-test").build()
}

#[tokio::test]
async fn test_streamed_fragments_are_concatenated() {
    let ws = Workspace::new();
    ws.write("a.txt", "hello");
    let request = ws.request(&["a.txt"]);
    let factory = ScriptedFactory::new(ScriptedBackend::new([Script::text([
        "He", "llo", " world",
    ])]));
    let (mut console, captured) = capture_console();

    let status = run_agent_with(
        &request,
        &config(),
        &factory,
        &RetryPolicy::default(),
        &RecordingSleeper::new(),
        &mut console,
        &CancellationToken::new(),
    )
    .await;
    drop(console);

    assert_eq!(status, RunStatus::Succeeded);
    assert!(captured.stdout.contents().ends_with("Hello world\n"));
    assert_eq!(ws.read("out.md"), "Hello world");
    assert_eq!(ws.read("run.log"), "Hello world\n");
}

#[tokio::test]
async fn test_redaction_masks_sinks_but_not_output_file() {
    let ws = Workspace::new();
    ws.write("a.txt", "hello");
    let request = ws.request(&["a.txt"]);
    let config = RunnerConfigBuilder::new()
        .api_key("AIza-test")
        .redact_values("secret123")
        .build();
    let factory = ScriptedFactory::new(ScriptedBackend::new([Script::text([
        "the secret", "123 value",
    ])]));
    let (mut console, captured) = capture_console();

    run_agent_with(
        &request,
        &config,
        &factory,
        &RetryPolicy::default(),
        &RecordingSleeper::new(),
        &mut console,
        &CancellationToken::new(),
    )
    .await;

    // Fragments are redacted one at a time, so a value split across two
    // fragments is not caught on the console
    assert_eq!(ws.read("out.md"), "the secret123 value");
    assert!(!captured.stdout.contents().contains("[REDACTED]"));
}

#[tokio::test]
async fn test_redaction_within_a_fragment() {
    let ws = Workspace::new();
    ws.write("a.txt", "hello");
    let request = ws.request(&["a.txt"]);
    let config = RunnerConfigBuilder::new()
        .api_key("AIza-test")
        .redact_values(" secret123 , ,secret123")
        .build();
    let factory = ScriptedFactory::new(ScriptedBackend::new([Script::text([
        "the secret123 value",
    ])]));
    let (mut console, captured) = capture_console();

    let status = run_agent_with(
        &request,
        &config,
        &factory,
        &RetryPolicy::default(),
        &RecordingSleeper::new(),
        &mut console,
        &CancellationToken::new(),
    )
    .await;

    assert_eq!(status, RunStatus::Succeeded);
    assert!(
        captured
            .stdout
            .contents()
            .ends_with("the [REDACTED] value\n")
    );
    assert_eq!(ws.read("run.log"), "the [REDACTED] value\n");
    assert_eq!(ws.read("out.md"), "the secret123 value");
}

#[tokio::test]
async fn test_transient_failures_then_success() {
    let ws = Workspace::new();
    ws.write("a.txt", "hello");
    let request = ws.request(&["a.txt"]);
    let backend = ScriptedBackend::new([
        Script::transport_error("connection reset"),
        Script::Fragments(vec![
            Ok("half".to_string()),
            Err(LlmError::ProviderOutage("503".to_string())),
        ]),
        Script::text(["final answer"]),
    ]);
    let factory = ScriptedFactory::new(backend.clone());
    let sleeper = RecordingSleeper::new();
    let (mut console, captured) = capture_console();

    let status = run_agent_with(
        &request,
        &config(),
        &factory,
        &RetryPolicy::default(),
        &sleeper,
        &mut console,
        &CancellationToken::new(),
    )
    .await;

    assert_eq!(status, RunStatus::Succeeded);
    assert_eq!(backend.calls(), 3);
    assert_eq!(
        sleeper.waits(),
        vec![Duration::from_secs(4), Duration::from_secs(8)]
    );
    assert_eq!(ws.read("out.md"), "final answer");

    let stderr = captured.stderr.contents();
    assert!(stderr.contains("[Error] Attempt 1/3: Transport error: connection reset"));
    assert!(stderr.contains("[Error] Attempt 2/3: Provider outage: 503"));

    let log = ws.read("run.log");
    assert!(log.contains("[Retry] Attempt 2/3 in 4s..."));
    assert!(log.contains("[Retry] Attempt 3/3 in 8s..."));
    assert!(log.ends_with("final answer\n"));
}

#[tokio::test]
async fn test_always_empty_exhausts_without_output() {
    let ws = Workspace::new();
    ws.write("a.txt", "hello");
    let request = ws.request(&["a.txt"]);
    let backend = ScriptedBackend::new([Script::empty(), Script::empty(), Script::empty()]);
    let factory = ScriptedFactory::new(backend.clone());
    let (mut console, captured) = capture_console();

    let status = run_agent_with(
        &request,
        &config(),
        &factory,
        &RetryPolicy::default(),
        &RecordingSleeper::new(),
        &mut console,
        &CancellationToken::new(),
    )
    .await;

    assert_eq!(status, RunStatus::Failed);
    assert_eq!(status.exit_code().as_i32(), 1);
    assert_eq!(backend.calls(), 3);
    assert!(!ws.path("out.md").exists());

    let stderr = captured.stderr.contents();
    assert_eq!(
        stderr.matches("[Warning] Empty response from model.").count(),
        3
    );
    assert!(stderr.ends_with("[Error] All retries exhausted.\n"));
}

#[tokio::test]
async fn test_context_sections_follow_input_order() {
    let ws = Workspace::new();
    ws.write("b.txt", "second\n");
    ws.write("empty.txt", "   ");
    ws.write("a.txt", "  first  ");
    let request = ws.request(&["b.txt", "empty.txt", "missing.txt", "a.txt"]);
    let backend = ScriptedBackend::new([Script::text(["ok"])]);
    let factory = ScriptedFactory::new(backend.clone());
    let (mut console, _captured) = capture_console();

    run_agent_with(
        &request,
        &config(),
        &factory,
        &RetryPolicy::default(),
        &RecordingSleeper::new(),
        &mut console,
        &CancellationToken::new(),
    )
    .await;

    let sent = backend.requests();
    assert_eq!(
        sent[0].user_content,
        "=== b.txt ===\nsecond\n\n=== a.txt ===\nfirst"
    );
    assert_eq!(sent[0].system_instruction, "You review documents.");
}

#[tokio::test]
async fn test_interrupt_during_stream_leaves_no_output() {
    let ws = Workspace::new();
    ws.write("a.txt", "hello");
    let request = ws.request(&["a.txt"]);
    let factory = ScriptedFactory::new(ScriptedBackend::new([Script::Stall(vec![
        "partial ".to_string(),
    ])]));
    let cancel = CancellationToken::new();
    let (mut console, captured) = capture_console();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let status = run_agent_with(
        &request,
        &config(),
        &factory,
        &RetryPolicy::default(),
        &RecordingSleeper::new(),
        &mut console,
        &cancel,
    )
    .await;

    assert_eq!(status, RunStatus::Interrupted);
    assert_eq!(status.exit_code().as_i32(), 130);
    assert!(!ws.path("out.md").exists());
    assert!(
        captured
            .stdout
            .contents()
            .ends_with("partial \n[Agent] Interrupted. Exiting gracefully.\n")
    );
    assert_eq!(ws.read("run.log"), "partial ");
}

#[tokio::test]
async fn test_existing_log_is_appended() {
    let ws = Workspace::new();
    ws.write("a.txt", "hello");
    ws.write("run.log", "previous run\n");
    let request = ws.request(&["a.txt"]);
    let factory = ScriptedFactory::new(ScriptedBackend::new([Script::text(["new"])]));
    let (mut console, _captured) = capture_console();

    run_agent_with(
        &request,
        &config(),
        &factory,
        &RetryPolicy::default(),
        &RecordingSleeper::new(),
        &mut console,
        &CancellationToken::new(),
    )
    .await;

    assert_eq!(ws.read("run.log"), "previous run\nnew\n");
}

#[tokio::test]
async fn test_rejected_key_prints_remediation_after_last_attempt() {
    let ws = Workspace::new();
    ws.write("a.txt", "hello");
    let request = ws.request(&["a.txt"]);
    let rejected = || Script::ConnectError(LlmError::ProviderAuth("HTTP 403".to_string()));
    let factory = ScriptedFactory::new(ScriptedBackend::new([
        rejected(),
        rejected(),
        rejected(),
    ]));
    let (mut console, captured) = capture_console();

    let status = run_agent_with(
        &request,
        &config(),
        &factory,
        &RetryPolicy::default(),
        &RecordingSleeper::new(),
        &mut console,
        &CancellationToken::new(),
    )
    .await;
    drop(console);

    assert_eq!(status, RunStatus::Failed);
    let stderr = captured.stderr.contents();
    assert_eq!(stderr.matches("  → ").count(), 2);
    let hints_at = stderr.find("  → Verify the API key").unwrap();
    assert!(stderr.find("[Error] Attempt 3/3").unwrap() < hints_at);
    assert!(hints_at < stderr.find("[Error] All retries exhausted.").unwrap());
    assert!(!ws.path("out.md").exists());
}
