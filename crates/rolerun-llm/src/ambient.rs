//! Ambient Google credential discovery
//!
//! Locates Application Default Credentials the way the Google tooling does:
//! an explicit `GOOGLE_APPLICATION_CREDENTIALS` file first, then gcloud's
//! well-known `application_default_credentials.json`, then a logged-in
//! `gcloud` on PATH. Access tokens for `authorized_user` credentials are
//! minted with a refresh-token exchange; every other credential type is
//! delegated to `gcloud auth application-default print-access-token`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use rolerun_config::AuthConfig;
use rolerun_redaction::redact_error_message;
use rolerun_utils::error::CredentialError;
use serde::Deserialize;
use tokio::process::Command;
use tokio::sync::{Mutex, OnceCell};
use tracing::debug;

use crate::http_client::HttpClient;

/// OAuth 2.0 token endpoint for refresh-token exchanges
pub const GOOGLE_TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

/// File name gcloud writes after `gcloud auth application-default login`
const WELL_KNOWN_FILE: &str = "application_default_credentials.json";

/// Lifetime assumed for tokens printed by gcloud, which does not report one
const GCLOUD_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

/// Tokens are refreshed this long before they expire
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// The kind of ambient credential that was found.
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialKind {
    /// End-user credentials from `gcloud auth application-default login`
    AuthorizedUser {
        client_id: String,
        client_secret: String,
        refresh_token: String,
    },
    /// A service-account key file
    ServiceAccount { client_email: String },
    /// Any other credentials-file type; tokens come from gcloud
    Other(String),
    /// No file, but a logged-in gcloud CLI
    GcloudCli,
}

impl fmt::Debug for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AuthorizedUser { client_id, .. } => f
                .debug_struct("AuthorizedUser")
                .field("client_id", client_id)
                .finish_non_exhaustive(),
            Self::ServiceAccount { client_email } => f
                .debug_struct("ServiceAccount")
                .field("client_email", client_email)
                .finish(),
            Self::Other(kind) => f.debug_tuple("Other").field(kind).finish(),
            Self::GcloudCli => f.write_str("GcloudCli"),
        }
    }
}

/// Result of a successful discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmbientCredentials {
    pub kind: CredentialKind,
    /// Project associated with the credentials, if one could be resolved
    pub project_id: Option<String>,
    /// Credentials file the kind was read from
    pub source: Option<PathBuf>,
}

/// Narrow interface over ambient credentials.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Locate credentials and the project they belong to.
    async fn discover(&self) -> Result<AmbientCredentials, CredentialError>;

    /// Produce a bearer token for Google Cloud APIs.
    async fn access_token(&self) -> Result<String, CredentialError>;
}

#[derive(Deserialize)]
struct CredentialsFile {
    #[serde(rename = "type")]
    kind: String,
    client_id: Option<String>,
    client_secret: Option<String>,
    refresh_token: Option<String>,
    client_email: Option<String>,
    project_id: Option<String>,
    quota_project_id: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
    error: Option<String>,
    error_description: Option<String>,
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// [`CredentialSource`] backed by the local filesystem, gcloud, and Google's
/// OAuth endpoint.
pub struct GoogleCredentialSource {
    explicit_file: Option<PathBuf>,
    gcloud_config_dir: Option<PathBuf>,
    project_hint: Option<String>,
    token_endpoint: String,
    discovered: OnceCell<AmbientCredentials>,
    token: Mutex<Option<CachedToken>>,
}

impl GoogleCredentialSource {
    #[must_use]
    pub fn from_config(auth: &AuthConfig) -> Self {
        Self {
            explicit_file: auth.credentials_file.clone(),
            gcloud_config_dir: auth.gcloud_config_dir.clone(),
            project_hint: auth.ambient_project.clone(),
            token_endpoint: GOOGLE_TOKEN_ENDPOINT.to_string(),
            discovered: OnceCell::new(),
            token: Mutex::new(None),
        }
    }

    /// Path gcloud uses for application default credentials.
    #[must_use]
    pub fn well_known_file(&self) -> Option<PathBuf> {
        self.gcloud_config_dir
            .clone()
            .or_else(default_gcloud_config_dir)
            .map(|dir| dir.join(WELL_KNOWN_FILE))
    }

    async fn discover_uncached(&self) -> Result<AmbientCredentials, CredentialError> {
        let file = match &self.explicit_file {
            Some(path) => Some(path.clone()),
            None => self.well_known_file().filter(|path| path.is_file()),
        };

        let (kind, file_project) = match &file {
            Some(path) => load_credentials_file(path).await?,
            None => {
                self.gcloud_output(&["auth", "application-default", "print-access-token"])
                    .await
                    .map_err(|e| {
                        debug!(error = %e, "gcloud cannot mint an access token");
                        CredentialError::NotFound
                    })?;
                (CredentialKind::GcloudCli, None)
            }
        };

        let project_id = match self.project_hint.clone().or(file_project) {
            Some(project) => Some(project),
            None => self.gcloud_project().await,
        };

        debug!(
            kind = ?kind,
            source = ?file,
            has_project = project_id.is_some(),
            "Discovered ambient credentials"
        );

        Ok(AmbientCredentials {
            kind,
            project_id,
            source: file,
        })
    }

    async fn gcloud_project(&self) -> Option<String> {
        let output = self
            .gcloud_output(&["config", "get-value", "project"])
            .await
            .ok()?;
        let project = output.trim();
        if project.is_empty() || project == "(unset)" {
            None
        } else {
            Some(project.to_string())
        }
    }

    async fn gcloud_output(&self, args: &[&str]) -> Result<String, CredentialError> {
        let command = format!("gcloud {}", args.join(" "));
        let binary = which::which("gcloud").map_err(|e| CredentialError::Command {
            command: command.clone(),
            reason: e.to_string(),
        })?;

        let mut cmd = Command::new(binary);
        cmd.args(args).kill_on_drop(true);
        if let Some(dir) = &self.gcloud_config_dir {
            cmd.env("CLOUDSDK_CONFIG", dir);
        }
        if let Some(file) = &self.explicit_file {
            cmd.env("GOOGLE_APPLICATION_CREDENTIALS", file);
        }

        let output = cmd.output().await.map_err(|e| CredentialError::Command {
            command: command.clone(),
            reason: e.to_string(),
        })?;
        if !output.status.success() {
            return Err(CredentialError::Command {
                command,
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn refresh_user_token(
        &self,
        client_id: &str,
        client_secret: &str,
        refresh_token: &str,
    ) -> Result<(String, Duration), CredentialError> {
        let http = HttpClient::new().map_err(CredentialError::TokenRefresh)?;
        let response = http
            .inner()
            .post(&self.token_endpoint)
            .form(&[
                ("grant_type", "refresh_token"),
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await
            .map_err(|e| CredentialError::TokenRefresh(redact_error_message(&e.to_string())))?;

        let status = response.status();
        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| CredentialError::TokenRefresh(format!("unreadable response ({status}): {e}")))?;

        match body.access_token {
            Some(token) if status.is_success() => {
                let ttl = Duration::from_secs(body.expires_in.unwrap_or(3600));
                Ok((token, ttl))
            }
            _ => Err(CredentialError::TokenRefresh(format!(
                "{status}: {}",
                body.error_description
                    .or(body.error)
                    .unwrap_or_else(|| "no access_token in response".to_string())
            ))),
        }
    }
}

#[async_trait]
impl CredentialSource for GoogleCredentialSource {
    async fn discover(&self) -> Result<AmbientCredentials, CredentialError> {
        self.discovered
            .get_or_try_init(|| self.discover_uncached())
            .await
            .cloned()
    }

    async fn access_token(&self) -> Result<String, CredentialError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref()
            && Instant::now() + TOKEN_EXPIRY_MARGIN < token.expires_at
        {
            return Ok(token.value.clone());
        }

        let credentials = self.discover().await?;
        let (value, ttl) = match &credentials.kind {
            CredentialKind::AuthorizedUser {
                client_id,
                client_secret,
                refresh_token,
            } => {
                self.refresh_user_token(client_id, client_secret, refresh_token)
                    .await?
            }
            _ => {
                let output = self
                    .gcloud_output(&["auth", "application-default", "print-access-token"])
                    .await?;
                (output.trim().to_string(), GCLOUD_TOKEN_TTL)
            }
        };

        if value.is_empty() {
            return Err(CredentialError::TokenRefresh("empty access token".to_string()));
        }
        debug!(ttl_secs = ttl.as_secs(), "Obtained access token");
        *cached = Some(CachedToken {
            value: value.clone(),
            expires_at: Instant::now() + ttl,
        });
        Ok(value)
    }
}

fn default_gcloud_config_dir() -> Option<PathBuf> {
    if cfg!(windows) {
        dirs::config_dir().map(|dir| dir.join("gcloud"))
    } else {
        dirs::home_dir().map(|home| home.join(".config").join("gcloud"))
    }
}

/// Read and classify a credentials file, returning any project it names.
async fn load_credentials_file(
    path: &Path,
) -> Result<(CredentialKind, Option<String>), CredentialError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CredentialError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    parse_credentials(path, &raw)
}

fn parse_credentials(
    path: &Path,
    raw: &str,
) -> Result<(CredentialKind, Option<String>), CredentialError> {
    let invalid = |reason: String| CredentialError::InvalidFile {
        path: path.to_path_buf(),
        reason,
    };
    let file: CredentialsFile = serde_json::from_str(raw).map_err(|e| invalid(e.to_string()))?;
    let project = file.quota_project_id.or(file.project_id);

    let kind = match file.kind.as_str() {
        "authorized_user" => match (file.client_id, file.client_secret, file.refresh_token) {
            (Some(client_id), Some(client_secret), Some(refresh_token)) => {
                CredentialKind::AuthorizedUser {
                    client_id,
                    client_secret,
                    refresh_token,
                }
            }
            _ => {
                return Err(invalid(
                    "authorized_user credentials need client_id, client_secret and refresh_token"
                        .to_string(),
                ));
            }
        },
        "service_account" => CredentialKind::ServiceAccount {
            client_email: file.client_email.unwrap_or_default(),
        },
        other => CredentialKind::Other(other.to_string()),
    };
    Ok((kind, project))
}
