//! Test doubles for credentials and generation backends.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::StreamExt;
use rolerun_config::RunnerConfig;
use rolerun_utils::error::{ConfigError, CredentialError, LlmError};

use crate::ambient::{AmbientCredentials, CredentialKind, CredentialSource};
use crate::types::{BackendFactory, FragmentStream, GenerationBackend, GenerationRequest, Notify};

/// [`CredentialSource`] with fixed answers and a discovery counter.
#[derive(Debug, Default)]
pub struct StaticCredentials {
    discovered: Option<AmbientCredentials>,
    token: Option<String>,
    discover_calls: AtomicUsize,
}

impl StaticCredentials {
    /// Nothing discoverable.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// gcloud-style credentials bound to `project`.
    #[must_use]
    pub fn with_project(project: &str) -> Self {
        Self {
            discovered: Some(AmbientCredentials {
                kind: CredentialKind::GcloudCli,
                project_id: Some(project.to_string()),
                source: None,
            }),
            token: Some("test-access-token".to_string()),
            discover_calls: AtomicUsize::new(0),
        }
    }

    pub fn discover_calls(&self) -> usize {
        self.discover_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialSource for StaticCredentials {
    async fn discover(&self) -> Result<AmbientCredentials, CredentialError> {
        self.discover_calls.fetch_add(1, Ordering::SeqCst);
        self.discovered.clone().ok_or(CredentialError::NotFound)
    }

    async fn access_token(&self) -> Result<String, CredentialError> {
        self.token.clone().ok_or(CredentialError::NotFound)
    }
}

/// What a [`ScriptedBackend`] does for one call.
#[derive(Debug)]
pub enum Script {
    /// Stream these items, then end
    Fragments(Vec<Result<String, LlmError>>),
    /// Fail to establish the stream
    ConnectError(LlmError),
    /// Stream these fragments, then never yield again
    Stall(Vec<String>),
}

impl Script {
    /// A clean stream of text fragments.
    pub fn text<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Fragments(fragments.into_iter().map(|f| Ok(f.into())).collect())
    }

    /// A stream that ends without any text.
    #[must_use]
    pub fn empty() -> Self {
        Self::Fragments(Vec::new())
    }

    /// A connection failure with the given detail.
    pub fn transport_error(detail: impl Into<String>) -> Self {
        Self::ConnectError(LlmError::Transport(detail.into()))
    }
}

#[derive(Debug, Default)]
struct ScriptedInner {
    scripts: Mutex<VecDeque<Script>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

/// Backend that plays back one [`Script`] per call. Clones share state, so a
/// test can keep a handle after giving one away.
#[derive(Debug, Clone, Default)]
pub struct ScriptedBackend {
    inner: Arc<ScriptedInner>,
}

impl ScriptedBackend {
    pub fn new(scripts: impl IntoIterator<Item = Script>) -> Self {
        Self {
            inner: Arc::new(ScriptedInner {
                scripts: Mutex::new(scripts.into_iter().collect()),
                requests: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Number of generation calls made so far.
    pub fn calls(&self) -> usize {
        self.requests().len()
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.inner
            .requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    async fn stream_generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<FragmentStream, LlmError> {
        if let Ok(mut requests) = self.inner.requests.lock() {
            requests.push(request.clone());
        }
        let script = self
            .inner
            .scripts
            .lock()
            .ok()
            .and_then(|mut scripts| scripts.pop_front())
            .ok_or_else(|| LlmError::Transport("no scripted response left".to_string()))?;

        match script {
            Script::Fragments(items) => Ok(futures::stream::iter(items).boxed()),
            Script::ConnectError(error) => Err(error),
            Script::Stall(fragments) => {
                let head = futures::stream::iter(fragments.into_iter().map(Ok::<String, LlmError>));
                let tail = futures::stream::pending::<Result<String, LlmError>>();
                Ok(head.chain(tail).boxed())
            }
        }
    }
}

/// [`BackendFactory`] that hands out a [`ScriptedBackend`] or a fixed
/// configuration failure.
pub struct ScriptedFactory {
    backend: ScriptedBackend,
    notices: Vec<String>,
    failure: Option<fn() -> ConfigError>,
    created: AtomicUsize,
}

impl ScriptedFactory {
    pub fn new(backend: ScriptedBackend) -> Self {
        Self {
            backend,
            notices: vec!["[Auth] API Key mode (Google AI Studio)".to_string()],
            failure: None,
            created: AtomicUsize::new(0),
        }
    }

    /// A factory whose client construction always fails.
    pub fn failing(failure: fn() -> ConfigError) -> Self {
        Self {
            backend: ScriptedBackend::default(),
            notices: Vec::new(),
            failure: Some(failure),
            created: AtomicUsize::new(0),
        }
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackendFactory for ScriptedFactory {
    async fn create(
        &self,
        _config: &RunnerConfig,
        notify: Notify<'_>,
    ) -> Result<Box<dyn GenerationBackend>, ConfigError> {
        if let Some(failure) = self.failure {
            return Err(failure());
        }
        for notice in &self.notices {
            notify(notice);
        }
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(self.backend.clone()))
    }
}
