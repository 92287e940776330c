//! Error taxonomy for rolerun
//!
//! Every failure a run can hit is resolved to one of three narrow types:
//!
//! | Type | Raised by | Run behavior |
//! |------|-----------|--------------|
//! | [`ConfigError`] | auth resolution, role validation | fatal, no retry |
//! | [`LlmError`] | the generation backend | retried by the retry controller |
//! | [`CredentialError`] | ambient credential discovery | folded into auth resolution |
//!
//! Each implements [`UserFriendlyError`]. Fatal configuration errors print
//! their remediation lines at once; authentication faults from the backend
//! print theirs after the last failed attempt.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Trait for providing user-friendly error reporting with suggestions
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get suggested actions to resolve the error
    fn suggestions(&self) -> Vec<String>;

    /// Get the error category for grouping similar errors
    fn category(&self) -> ErrorCategory;
}

/// Categories of errors for better organization and handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Authentication,
    Provider,
    FileSystem,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "Configuration"),
            Self::Authentication => write!(f, "Authentication"),
            Self::Provider => write!(f, "Provider"),
            Self::FileSystem => write!(f, "File System"),
        }
    }
}

/// Fatal configuration errors. None of these are retried.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unknown auth mode: {value} (expected api_key / vertex_ai / adc)")]
    UnknownAuthMode { value: String },

    #[error("GEMINI_AUTH_MODE=api_key but GEMINI_API_KEY is not set")]
    MissingApiKey,

    #[error("{context} but no project ID could be resolved")]
    MissingProject { context: String },

    #[error("No credentials could be detected")]
    NoCredentials,

    #[error("Role file is empty or missing: {path}")]
    MissingRole { path: String },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

impl UserFriendlyError for ConfigError {
    fn user_message(&self) -> String {
        self.to_string()
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::UnknownAuthMode { .. } => vec![
                "GEMINI_AUTH_MODE must be one of api_key / vertex_ai / adc".to_string(),
            ],
            Self::MissingApiKey => vec!["Run: export GEMINI_API_KEY='your-key'".to_string()],
            Self::MissingProject { .. } => vec![
                "Set GEMINI_GCP_PROJECT, or configure a gcloud default project".to_string(),
            ],
            Self::NoCredentials => vec![
                "Set GEMINI_API_KEY or GEMINI_GCP_PROJECT".to_string(),
                "Or set GEMINI_AUTH_MODE explicitly to api_key / vertex_ai / adc".to_string(),
            ],
            Self::MissingRole { .. } => vec![
                "Pass a non-empty system prompt file with --role".to_string(),
            ],
            Self::HttpClient(_) => vec![
                "Check the TLS configuration of this host".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::UnknownAuthMode { .. } | Self::MissingRole { .. } | Self::HttpClient(_) => {
                ErrorCategory::Configuration
            }
            Self::MissingApiKey | Self::MissingProject { .. } | Self::NoCredentials => {
                ErrorCategory::Authentication
            }
        }
    }
}

/// Errors from the generation backend.
///
/// All variants are transport or service faults from the run's point of
/// view and are eligible for retry.
#[derive(Error, Debug)]
pub enum LlmError {
    /// Transport-level failure (connection, TLS, body read)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Provider authentication failure (401, 403)
    #[error("Provider authentication error: {0}")]
    ProviderAuth(String),

    /// Provider quota/rate limit exceeded (429)
    #[error("Provider quota exceeded: {0}")]
    ProviderQuota(String),

    /// Provider service outage (5xx errors)
    #[error("Provider outage: {0}")]
    ProviderOutage(String),

    /// The provider reported an error inside the event stream, or sent a
    /// payload that could not be decoded
    #[error("Stream error: {0}")]
    Stream(String),

    /// An access token could not be obtained for this request
    #[error("Credential error: {0}")]
    Credentials(#[from] CredentialError),
}

impl UserFriendlyError for LlmError {
    fn user_message(&self) -> String {
        match self {
            Self::Transport(msg) => format!("LLM transport error: {msg}"),
            Self::ProviderAuth(msg) => format!("LLM provider authentication failed: {msg}"),
            Self::ProviderQuota(msg) => format!("LLM provider quota exceeded: {msg}"),
            Self::ProviderOutage(msg) => format!("LLM provider service outage: {msg}"),
            Self::Stream(msg) => format!("LLM response stream failed: {msg}"),
            Self::Credentials(err) => {
                format!("Could not obtain an access token: {}", err.user_message())
            }
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Transport(_) | Self::Stream(_) => vec![
                "Verify network connectivity".to_string(),
                "Try running with --verbose to see detailed error information".to_string(),
            ],
            Self::ProviderAuth(_) => vec![
                "Verify the API key is valid and not expired".to_string(),
                "For Vertex AI, run 'gcloud auth application-default login'".to_string(),
            ],
            Self::ProviderQuota(_) | Self::ProviderOutage(_) => {
                vec!["Wait a few minutes and try again".to_string()]
            }
            Self::Credentials(err) => err.suggestions(),
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::ProviderAuth(_) | Self::Credentials(_) => ErrorCategory::Authentication,
            _ => ErrorCategory::Provider,
        }
    }
}

/// Failures while discovering ambient (application default) credentials.
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("No application default credentials found")]
    NotFound,

    #[error("Could not read credentials file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid credentials file {path}: {reason}")]
    InvalidFile { path: PathBuf, reason: String },

    #[error("Token refresh failed: {0}")]
    TokenRefresh(String),

    #[error("'{command}' failed: {reason}")]
    Command { command: String, reason: String },
}

impl UserFriendlyError for CredentialError {
    fn user_message(&self) -> String {
        self.to_string()
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::NotFound => vec![
                "Run 'gcloud auth application-default login'".to_string(),
                "Or point GOOGLE_APPLICATION_CREDENTIALS at a credentials file".to_string(),
            ],
            Self::Io { .. } | Self::InvalidFile { .. } => vec![
                "Check the file referenced by GOOGLE_APPLICATION_CREDENTIALS".to_string(),
            ],
            Self::TokenRefresh(_) | Self::Command { .. } => vec![
                "Re-run 'gcloud auth application-default login'".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Io { .. } => ErrorCategory::FileSystem,
            _ => ErrorCategory::Authentication,
        }
    }
}
