//! Gemini access for rolerun
//!
//! This crate resolves how to authenticate ([`resolve_auth_mode`],
//! [`create_client`]), discovers ambient Google credentials
//! ([`GoogleCredentialSource`]), and streams completions from the Gemini
//! API as text fragments ([`GeminiBackend`]).
//!
//! Callers work against the [`GenerationBackend`] and [`BackendFactory`]
//! traits so the engine can be driven by scripted backends in tests.

mod ambient;
mod auth;
mod gemini_backend;
pub(crate) mod http_client;
mod sse;
mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;

pub use ambient::{
    AmbientCredentials, CredentialKind, CredentialSource, GOOGLE_TOKEN_ENDPOINT,
    GoogleCredentialSource,
};
pub use auth::{AuthMode, GeminiBackendFactory, create_client, resolve_auth_mode};
pub use gemini_backend::{DEFAULT_API_BASE_URL, GeminiBackend};
pub use sse::SseParser;
pub use types::{BackendFactory, FragmentStream, GenerationBackend, GenerationRequest, Notify};

pub use rolerun_utils::error::{ConfigError, CredentialError, LlmError};
