use std::path::PathBuf;

use rolerun_redaction::RedactionSource;

use crate::env::EnvSource;

pub const ENV_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_PROJECT: &str = "GEMINI_GCP_PROJECT";
pub const ENV_LOCATION: &str = "GEMINI_GCP_LOCATION";
pub const ENV_CREDENTIALS_FILE: &str = "GOOGLE_APPLICATION_CREDENTIALS";
pub const ENV_AMBIENT_PROJECT: &str = "GOOGLE_CLOUD_PROJECT";
pub const ENV_GCLOUD_CONFIG_DIR: &str = "CLOUDSDK_CONFIG";
pub const ENV_AUTH_MODE: &str = "GEMINI_AUTH_MODE";
pub const ENV_REDACT_VALUES: &str = "REDACT_VALUES";
pub const ENV_REDACT_REPLACEMENT: &str = "REDACT_REPLACEMENT";
pub const ENV_MODEL: &str = "GEMINI_MODEL";
pub const ENV_API_BASE_URL: &str = "GEMINI_API_BASE_URL";

pub const DEFAULT_AUTH_MODE: &str = "auto";
pub const DEFAULT_LOCATION: &str = "us-central1";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_REDACT_REPLACEMENT: &str = "[REDACTED]";

/// Everything rolerun takes from the environment, resolved once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    pub auth: AuthConfig,
    pub redaction: RedactionConfig,
    /// Model used when `--model` is not given
    pub default_model: String,
    /// Override for the API-key endpoint base URL
    pub api_base_url: Option<String>,
}

/// Inputs to auth-mode resolution and client construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    /// Requested mode, lowercased. `auto` unless overridden.
    pub mode: String,
    pub api_key: Option<String>,
    pub project: Option<String>,
    pub location: Option<String>,
    /// Explicit credentials file (`GOOGLE_APPLICATION_CREDENTIALS`)
    pub credentials_file: Option<PathBuf>,
    /// Project hint consulted during ambient credential discovery
    pub ambient_project: Option<String>,
    /// gcloud configuration directory override (`CLOUDSDK_CONFIG`)
    pub gcloud_config_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedactionConfig {
    /// Raw comma-separated list
    pub values: Option<String>,
    pub replacement: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            mode: DEFAULT_AUTH_MODE.to_string(),
            api_key: None,
            project: None,
            location: None,
            credentials_file: None,
            ambient_project: None,
            gcloud_config_dir: None,
        }
    }
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            values: None,
            replacement: DEFAULT_REDACT_REPLACEMENT.to_string(),
        }
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            auth: AuthConfig::default(),
            redaction: RedactionConfig::default(),
            default_model: DEFAULT_MODEL.to_string(),
            api_base_url: None,
        }
    }
}

/// Read a variable, treating empty or whitespace-only values as unset.
fn non_empty<E: EnvSource + ?Sized>(env: &E, key: &str) -> Option<String> {
    env.var(key).filter(|v| !v.trim().is_empty())
}

impl RunnerConfig {
    /// Resolve configuration from an environment source.
    ///
    /// Empty values count as unset, with one exception: an explicitly empty
    /// `REDACT_REPLACEMENT` is honored and masks values with nothing.
    pub fn from_env<E: EnvSource + ?Sized>(env: &E) -> Self {
        let auth = AuthConfig {
            mode: non_empty(env, ENV_AUTH_MODE)
                .map(|m| m.trim().to_lowercase())
                .unwrap_or_else(|| DEFAULT_AUTH_MODE.to_string()),
            api_key: non_empty(env, ENV_API_KEY),
            project: non_empty(env, ENV_PROJECT),
            location: non_empty(env, ENV_LOCATION),
            credentials_file: non_empty(env, ENV_CREDENTIALS_FILE).map(PathBuf::from),
            ambient_project: non_empty(env, ENV_AMBIENT_PROJECT),
            gcloud_config_dir: non_empty(env, ENV_GCLOUD_CONFIG_DIR).map(PathBuf::from),
        };

        let redaction = RedactionConfig {
            values: non_empty(env, ENV_REDACT_VALUES),
            replacement: env
                .var(ENV_REDACT_REPLACEMENT)
                .unwrap_or_else(|| DEFAULT_REDACT_REPLACEMENT.to_string()),
        };

        let config = Self {
            auth,
            redaction,
            default_model: non_empty(env, ENV_MODEL).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_base_url: non_empty(env, ENV_API_BASE_URL),
        };

        tracing::debug!(
            auth_mode = %config.auth.mode,
            has_api_key = config.auth.api_key.is_some(),
            has_project = config.auth.project.is_some(),
            default_model = %config.default_model,
            "Resolved runner configuration"
        );

        config
    }

    /// Model for this run: the CLI override wins over the configured default.
    #[must_use]
    pub fn model_or_default(&self, cli_model: Option<&str>) -> String {
        cli_model
            .filter(|m| !m.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.default_model.clone())
    }
}

impl AuthConfig {
    #[must_use]
    pub fn location_or_default(&self) -> &str {
        self.location.as_deref().unwrap_or(DEFAULT_LOCATION)
    }
}

impl RedactionSource for RunnerConfig {
    fn redact_values(&self) -> Option<&str> {
        self.redaction.values.as_deref()
    }

    fn redact_replacement(&self) -> &str {
        &self.redaction.replacement
    }

    fn active_api_key(&self) -> Option<&str> {
        self.auth.api_key.as_deref()
    }
}
