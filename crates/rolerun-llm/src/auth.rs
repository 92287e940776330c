//! Authentication-mode resolution and client construction
//!
//! The configured mode (`GEMINI_AUTH_MODE`, default `auto`) is resolved once
//! per run into one of four terminal modes. In `auto` mode the first match
//! wins:
//!
//! 1. an API key is set → [`AuthMode::ApiKey`]
//! 2. a cloud project or location is set → [`AuthMode::VertexAi`]
//! 3. an explicit credentials file is set → [`AuthMode::Adc`]
//! 4. ambient default credentials are discoverable → [`AuthMode::Adc`]
//! 5. otherwise → [`AuthMode::None`]
//!
//! Any explicit value other than `auto` skips detection entirely.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use rolerun_config::{AuthConfig, RunnerConfig};
use rolerun_utils::error::ConfigError;
use tracing::debug;

use crate::ambient::{CredentialSource, GoogleCredentialSource};
use crate::gemini_backend::GeminiBackend;
use crate::http_client::HttpClient;
use crate::types::{BackendFactory, GenerationBackend, Notify};

/// Resolved authentication mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Google AI Studio API key
    ApiKey,
    /// Vertex AI with an explicit or derived project
    VertexAi,
    /// Vertex AI through Application Default Credentials
    Adc,
    /// Nothing usable was found
    None,
}

impl AuthMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ApiKey => "api_key",
            Self::VertexAi => "vertex_ai",
            Self::Adc => "adc",
            Self::None => "none",
        }
    }

    /// Parse a configured mode. `Ok(None)` means `auto`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownAuthMode`] for unrecognized values.
    pub fn from_config_value(value: &str) -> Result<Option<Self>, ConfigError> {
        match value.trim().to_lowercase().as_str() {
            "auto" | "" => Ok(None),
            "api_key" => Ok(Some(Self::ApiKey)),
            "vertex_ai" => Ok(Some(Self::VertexAi)),
            "adc" => Ok(Some(Self::Adc)),
            "none" => Ok(Some(Self::None)),
            _ => Err(ConfigError::UnknownAuthMode {
                value: value.to_string(),
            }),
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve the auth mode for this run.
///
/// Ambient discovery is only attempted in `auto` mode and only when nothing
/// explicit is configured.
///
/// # Errors
///
/// Returns [`ConfigError::UnknownAuthMode`] for an unrecognized explicit mode.
pub async fn resolve_auth_mode(
    auth: &AuthConfig,
    credentials: &dyn CredentialSource,
) -> Result<AuthMode, ConfigError> {
    if let Some(explicit) = AuthMode::from_config_value(&auth.mode)? {
        return Ok(explicit);
    }

    if auth.api_key.is_some() {
        return Ok(AuthMode::ApiKey);
    }
    if auth.project.is_some() || auth.location.is_some() {
        return Ok(AuthMode::VertexAi);
    }
    if auth.credentials_file.is_some() {
        return Ok(AuthMode::Adc);
    }

    match credentials.discover().await {
        Ok(_) => Ok(AuthMode::Adc),
        Err(e) => {
            debug!(error = %e, "No ambient credentials");
            Ok(AuthMode::None)
        }
    }
}

/// Configured project, else the one attached to ambient credentials.
async fn resolve_project(auth: &AuthConfig, credentials: &dyn CredentialSource) -> Option<String> {
    if let Some(project) = &auth.project {
        return Some(project.clone());
    }
    match credentials.discover().await {
        Ok(found) => found.project_id,
        Err(e) => {
            debug!(error = %e, "Could not derive project from ambient credentials");
            None
        }
    }
}

/// Build a Gemini client for the resolved auth mode.
///
/// Human-facing `[Auth]` lines are sent to `notify`. On failure nothing is
/// returned; there is no partially configured client.
///
/// # Errors
///
/// Returns a [`ConfigError`] describing what is missing and how to fix it.
pub async fn create_client(
    config: &RunnerConfig,
    credentials: Arc<dyn CredentialSource>,
    notify: Notify<'_>,
) -> Result<GeminiBackend, ConfigError> {
    let auth = &config.auth;
    let mode = resolve_auth_mode(auth, credentials.as_ref()).await?;
    debug!(mode = %mode, "Resolved auth mode");

    match mode {
        AuthMode::ApiKey => {
            let key = auth.api_key.clone().ok_or(ConfigError::MissingApiKey)?;
            let http = HttpClient::new().map_err(ConfigError::HttpClient)?;
            notify("[Auth] API Key mode (Google AI Studio)");
            Ok(GeminiBackend::with_api_key(
                http,
                key,
                config.api_base_url.as_deref(),
            ))
        }
        AuthMode::VertexAi => {
            let location = auth.location_or_default().to_string();
            let project = resolve_project(auth, credentials.as_ref())
                .await
                .ok_or_else(|| ConfigError::MissingProject {
                    context: "GEMINI_AUTH_MODE=vertex_ai".to_string(),
                })?;
            let http = HttpClient::new().map_err(ConfigError::HttpClient)?;
            notify(&format!(
                "[Auth] Vertex AI mode (project={project}, location={location})"
            ));
            Ok(GeminiBackend::with_vertex(http, project, location, credentials))
        }
        AuthMode::Adc => {
            notify("[Auth] ADC mode (Application Default Credentials)");
            notify("  → gcloud auth application-default login must have been run beforehand.");
            let location = auth.location_or_default().to_string();
            let project = resolve_project(auth, credentials.as_ref())
                .await
                .ok_or_else(|| ConfigError::MissingProject {
                    context: "ADC mode".to_string(),
                })?;
            let http = HttpClient::new().map_err(ConfigError::HttpClient)?;
            Ok(GeminiBackend::with_vertex(http, project, location, credentials))
        }
        AuthMode::None => Err(ConfigError::NoCredentials),
    }
}

/// Production [`BackendFactory`]: auth resolution plus the Gemini backend.
#[derive(Default, Clone)]
pub struct GeminiBackendFactory {
    credentials: Option<Arc<dyn CredentialSource>>,
}

impl GeminiBackendFactory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific credential source instead of discovering one from the
    /// run's configuration.
    #[must_use]
    pub fn with_credentials(credentials: Arc<dyn CredentialSource>) -> Self {
        Self {
            credentials: Some(credentials),
        }
    }
}

#[async_trait]
impl BackendFactory for GeminiBackendFactory {
    async fn create(
        &self,
        config: &RunnerConfig,
        notify: Notify<'_>,
    ) -> Result<Box<dyn GenerationBackend>, ConfigError> {
        let credentials: Arc<dyn CredentialSource> = match &self.credentials {
            Some(credentials) => Arc::clone(credentials),
            None => Arc::new(GoogleCredentialSource::from_config(&config.auth)),
        };
        let backend = create_client(config, credentials, notify).await?;
        Ok(Box::new(backend))
    }
}
