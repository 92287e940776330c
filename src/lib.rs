//! rolerun - run a Gemini agent with a fixed role over file context
//!
//! One invocation sends a role (system prompt) plus the concatenated contents
//! of the input files to Gemini, streams the redacted response to stdout and
//! an optional log, retries transient failures with backoff, and persists the
//! final response to an output file.
//!
//! The binary is a thin wrapper over [`cli::run`]. Embedders can drive a run
//! directly:
//!
//! ```rust,no_run
//! use rolerun::{Console, GeminiBackendFactory, RunRequest, RunnerConfig, run_agent};
//! use rolerun::config::ProcessEnv;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() {
//! let config = RunnerConfig::from_env(&ProcessEnv);
//! let request = RunRequest {
//!     role_file: "roles/reviewer.md".into(),
//!     input_files: vec!["notes.txt".into()],
//!     output_file: "review.md".into(),
//!     log_file: None,
//!     model: None,
//! };
//! let mut console = Console::stdio();
//! let status = run_agent(
//!     &request,
//!     &config,
//!     &GeminiBackendFactory::new(),
//!     &mut console,
//!     &CancellationToken::new(),
//! )
//! .await;
//! std::process::exit(status.exit_code().as_i32());
//! # }
//! ```

pub mod cli;

pub use rolerun_config as config;
pub use rolerun_context as context;
pub use rolerun_engine as engine;
pub use rolerun_llm as llm;
pub use rolerun_redaction as redaction;
pub use rolerun_utils::{error, exit_codes};

pub use rolerun_config::{RunnerConfig, RunnerConfigBuilder};
pub use rolerun_engine::{Console, Outcome, RunRequest, RunStatus, run_agent};
pub use rolerun_llm::{AuthMode, GeminiBackendFactory};
pub use rolerun_redaction::{RedactionSet, redact};
pub use rolerun_utils::exit_codes::ExitCode;
