//! CLI argument definitions
//!
//! This module defines the command-line interface using clap. The parsed
//! [`Cli`] converts into the engine's [`RunRequest`].

use camino::Utf8PathBuf;
use clap::Parser;
use rolerun_engine::RunRequest;

/// rolerun - run a Gemini agent with a fixed role over file context
#[derive(Parser, Debug)]
#[command(name = "rolerun")]
#[command(about = "Run a Gemini agent with a fixed role over accumulated file context")]
#[command(long_about = r#"
rolerun sends a role (system prompt) and the concatenated contents of one or
more input files to Gemini, streams the answer to the terminal (and an optional
log), masks configured secrets in everything it prints, and writes the final
answer to an output file.

EXAMPLES:
  # Review two files with a reviewer role
  rolerun --role roles/reviewer.md --input src/a.rs src/b.rs --output review.md

  # Follow the stream from another terminal
  rolerun --role r.md --input notes.txt --output out.md --log run.log

AUTHENTICATION (GEMINI_AUTH_MODE=auto):
  GEMINI_API_KEY                     → Google AI Studio
  GEMINI_GCP_PROJECT / _LOCATION     → Vertex AI
  GOOGLE_APPLICATION_CREDENTIALS     → Application Default Credentials
  gcloud application-default login   → Application Default Credentials

EXIT CODES:
  0 success, 1 failure, 2 invalid arguments, 130 interrupted
"#)]
#[command(version)]
pub struct Cli {
    /// System prompt file defining the agent's role
    #[arg(long, value_name = "PATH")]
    pub role: Utf8PathBuf,

    /// Context files, concatenated in the order given
    #[arg(long, value_name = "PATH", num_args = 1.., required = true)]
    pub input: Vec<Utf8PathBuf>,

    /// File that receives the final response (overwritten)
    #[arg(long, value_name = "PATH")]
    pub output: Utf8PathBuf,

    /// Append the streamed response and retry/error lines to this file
    #[arg(long, value_name = "PATH")]
    pub log: Option<Utf8PathBuf>,

    /// Model name (overrides GEMINI_MODEL; default gemini-2.5-flash)
    #[arg(long)]
    pub model: Option<String>,

    /// Enable debug diagnostics on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    #[must_use]
    pub fn into_request(self) -> RunRequest {
        RunRequest {
            role_file: self.role,
            input_files: self.input,
            output_file: self.output,
            log_file: self.log,
            model: self.model,
        }
    }
}
