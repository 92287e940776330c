//! Core types for the generation backend abstraction

use async_trait::async_trait;
use futures::stream::BoxStream;
use rolerun_config::RunnerConfig;
use rolerun_utils::error::{ConfigError, LlmError};

/// Ordered, finite, non-restartable sequence of text fragments.
///
/// `None` from the stream is a clean end; `Some(Err(_))` is a fault, after
/// which the stream yields nothing further.
pub type FragmentStream = BoxStream<'static, Result<String, LlmError>>;

/// Input to a single generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub model: String,
    /// Fixed instruction the model follows (the role)
    pub system_instruction: String,
    /// The single user turn (the assembled context)
    pub user_content: String,
}

impl GenerationRequest {
    #[must_use]
    pub fn new(
        model: impl Into<String>,
        system_instruction: impl Into<String>,
        user_content: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            system_instruction: system_instruction.into(),
            user_content: user_content.into(),
        }
    }
}

/// A provider that can stream a completion.
///
/// Errors returned directly from `stream_generate` mean the stream could not
/// be established; faults after that arrive as `Err` items on the stream.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn stream_generate(&self, request: &GenerationRequest)
    -> Result<FragmentStream, LlmError>;
}

/// Line sink for the human-facing messages produced while building a client.
pub type Notify<'a> = &'a mut (dyn FnMut(&str) + Send);

/// Builds the backend for a run.
///
/// The production implementation resolves the auth mode and constructs a
/// Gemini client; tests substitute scripted backends.
#[async_trait]
pub trait BackendFactory: Send + Sync {
    async fn create(
        &self,
        config: &RunnerConfig,
        notify: Notify<'_>,
    ) -> Result<Box<dyn GenerationBackend>, ConfigError>;
}
