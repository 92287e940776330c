//! Gemini `streamGenerateContent` backend
//!
//! Talks to either Google AI Studio (API key) or Vertex AI (bearer token)
//! using server-sent events, and exposes the response as a
//! [`FragmentStream`] of text deltas.

use std::collections::VecDeque;
use std::fmt::Display;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use rolerun_redaction::redact_error_message;
use rolerun_utils::error::LlmError;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ambient::CredentialSource;
use crate::http_client::HttpClient;
use crate::sse::SseParser;
use crate::types::{FragmentStream, GenerationBackend, GenerationRequest};

/// Google AI Studio endpoint
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const PROVIDER: &str = "gemini";

enum Endpoint {
    AiStudio { base_url: String },
    Vertex { project: String, location: String },
}

enum Credential {
    ApiKey(String),
    Bearer(Arc<dyn CredentialSource>),
}

/// Streaming client for one authenticated Gemini endpoint.
pub struct GeminiBackend {
    http: HttpClient,
    endpoint: Endpoint,
    credential: Credential,
}

#[cfg(test)]
impl std::fmt::Debug for GeminiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiBackend").finish_non_exhaustive()
    }
}

impl GeminiBackend {
    pub(crate) fn with_api_key(http: HttpClient, api_key: String, base_url: Option<&str>) -> Self {
        let base_url = base_url
            .unwrap_or(DEFAULT_API_BASE_URL)
            .trim_end_matches('/')
            .to_string();
        Self {
            http,
            endpoint: Endpoint::AiStudio { base_url },
            credential: Credential::ApiKey(api_key),
        }
    }

    pub(crate) fn with_vertex(
        http: HttpClient,
        project: String,
        location: String,
        credentials: Arc<dyn CredentialSource>,
    ) -> Self {
        Self {
            http,
            endpoint: Endpoint::Vertex { project, location },
            credential: Credential::Bearer(credentials),
        }
    }

    /// Streaming URL for `model` on this endpoint.
    #[must_use]
    pub fn stream_url(&self, model: &str) -> String {
        let model = model.strip_prefix("models/").unwrap_or(model);
        match &self.endpoint {
            Endpoint::AiStudio { base_url } => {
                format!("{base_url}/v1beta/models/{model}:streamGenerateContent?alt=sse")
            }
            Endpoint::Vertex { project, location } => {
                let host = if location == "global" {
                    "aiplatform.googleapis.com".to_string()
                } else {
                    format!("{location}-aiplatform.googleapis.com")
                };
                format!(
                    "https://{host}/v1/projects/{project}/locations/{location}/publishers/google/models/{model}:streamGenerateContent?alt=sse"
                )
            }
        }
    }
}

#[async_trait]
impl GenerationBackend for GeminiBackend {
    async fn stream_generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<FragmentStream, LlmError> {
        let url = self.stream_url(&request.model);
        let body = GenerateContentRequest::from_request(request);

        let mut builder = self
            .http
            .inner()
            .post(&url)
            .header("Accept", "text/event-stream")
            .json(&body);
        builder = match (&self.credential, &self.endpoint) {
            (Credential::ApiKey(key), _) => builder.header("x-goog-api-key", key),
            (Credential::Bearer(source), Endpoint::Vertex { project, .. }) => {
                let token = source.access_token().await?;
                builder
                    .bearer_auth(token)
                    .header("x-goog-user-project", project)
            }
            (Credential::Bearer(source), Endpoint::AiStudio { .. }) => {
                builder.bearer_auth(source.access_token().await?)
            }
        };

        debug!(
            provider = PROVIDER,
            model = %request.model,
            system_bytes = request.system_instruction.len(),
            context_bytes = request.user_content.len(),
            "Opening generation stream"
        );

        let response = self.http.send(builder, PROVIDER).await?;
        Ok(fragment_stream(response.bytes_stream()))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: Content<'a>,
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

impl<'a> GenerateContentRequest<'a> {
    fn from_request(request: &'a GenerationRequest) -> Self {
        Self {
            system_instruction: Content {
                role: None,
                parts: [Part {
                    text: &request.system_instruction,
                }],
            },
            contents: [Content {
                role: Some("user"),
                parts: [Part {
                    text: &request.user_content,
                }],
            }],
        }
    }
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Deserialize)]
struct ApiError {
    code: Option<i64>,
    #[serde(default)]
    message: String,
    status: Option<String>,
}

/// Decode one SSE payload into its text delta.
///
/// `Ok(None)` for payloads that carry no text (usage metadata, safety
/// ratings, thought-only parts).
fn decode_payload(payload: &str) -> Result<Option<String>, LlmError> {
    let response: GenerateContentResponse = serde_json::from_str(payload)
        .map_err(|e| LlmError::Stream(format!("malformed {PROVIDER} event: {e}")))?;

    if let Some(error) = response.error {
        let status = error.status.unwrap_or_default();
        let code = error.code.map(|c| c.to_string()).unwrap_or_default();
        return Err(LlmError::Stream(format!(
            "{PROVIDER} reported {code} {status}: {}",
            redact_error_message(&error.message)
        )));
    }

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter(|part| !part.thought)
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    Ok((!text.is_empty()).then_some(text))
}

struct StreamState<S> {
    bytes: Pin<Box<S>>,
    parser: SseParser,
    pending: VecDeque<Result<String, LlmError>>,
    finished: bool,
}

impl<S> StreamState<S> {
    fn queue_payloads(&mut self, payloads: impl IntoIterator<Item = String>) {
        for payload in payloads {
            match decode_payload(&payload) {
                Ok(Some(text)) => self.pending.push_back(Ok(text)),
                Ok(None) => {}
                Err(e) => {
                    self.pending.push_back(Err(e));
                    return;
                }
            }
        }
    }
}

/// Turn a raw SSE byte stream into text fragments.
///
/// The first fault ends the stream.
fn fragment_stream<S, B, E>(bytes: S) -> FragmentStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    let state = StreamState {
        bytes: Box::pin(bytes),
        parser: SseParser::default(),
        pending: VecDeque::new(),
        finished: false,
    };

    futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                if item.is_err() {
                    state.pending.clear();
                    state.finished = true;
                }
                return Some((item, state));
            }
            if state.finished {
                return None;
            }
            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    let payloads = state.parser.feed(chunk.as_ref());
                    state.queue_payloads(payloads);
                }
                Some(Err(e)) => {
                    state.finished = true;
                    let detail = redact_error_message(&e.to_string());
                    return Some((
                        Err(LlmError::Transport(format!(
                            "{PROVIDER} stream interrupted: {detail}"
                        ))),
                        state,
                    ));
                }
                None => {
                    state.finished = true;
                    let trailing = state.parser.finish();
                    state.queue_payloads(trailing);
                }
            }
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::StaticCredentials;

    fn chunks(parts: &[&str]) -> Vec<Result<Vec<u8>, std::io::Error>> {
        parts.iter().map(|p| Ok(p.as_bytes().to_vec())).collect()
    }

    fn event(text: &str) -> String {
        format!(
            "data: {{\"candidates\": [{{\"content\": {{\"role\": \"model\", \"parts\": [{{\"text\": {}}}]}}}}]}}\n\n",
            serde_json::to_string(text).unwrap()
        )
    }

    async fn collect(stream: FragmentStream) -> Vec<Result<String, LlmError>> {
        stream.collect().await
    }

    #[test]
    fn test_request_body_shape() {
        let request = GenerationRequest::new("m", "be terse", "=== a.md ===\nhello");
        let body = serde_json::to_value(GenerateContentRequest::from_request(&request)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "systemInstruction": {"parts": [{"text": "be terse"}]},
                "contents": [{"role": "user", "parts": [{"text": "=== a.md ===\nhello"}]}]
            })
        );
    }

    #[test]
    fn test_ai_studio_url_honors_base_override() {
        let http = HttpClient::new().unwrap();
        let backend = GeminiBackend::with_api_key(http, "k".into(), Some("http://127.0.0.1:8080/"));
        assert_eq!(
            backend.stream_url("models/gemini-2.5-pro"),
            "http://127.0.0.1:8080/v1beta/models/gemini-2.5-pro:streamGenerateContent?alt=sse"
        );
    }

    #[test]
    fn test_vertex_urls() {
        let creds = Arc::new(StaticCredentials::with_project("p"));
        let regional = GeminiBackend::with_vertex(
            HttpClient::new().unwrap(),
            "p".into(),
            "europe-west4".into(),
            creds.clone(),
        );
        assert_eq!(
            regional.stream_url("gemini-2.5-flash"),
            "https://europe-west4-aiplatform.googleapis.com/v1/projects/p/locations/europe-west4/publishers/google/models/gemini-2.5-flash:streamGenerateContent?alt=sse"
        );

        let global =
            GeminiBackend::with_vertex(HttpClient::new().unwrap(), "p".into(), "global".into(), creds);
        assert!(
            global
                .stream_url("m")
                .starts_with("https://aiplatform.googleapis.com/v1/projects/p/locations/global/")
        );
    }

    #[test]
    fn test_decode_skips_thoughts_and_textless_payloads() {
        let payload = r#"{"candidates": [{"content": {"parts": [{"text": "hmm", "thought": true}, {"text": "Hel"}, {"text": "lo"}]}}]}"#;
        assert_eq!(decode_payload(payload).unwrap().as_deref(), Some("Hello"));

        let usage_only = r#"{"usageMetadata": {"promptTokenCount": 3}}"#;
        assert_eq!(decode_payload(usage_only).unwrap(), None);
    }

    #[test]
    fn test_decode_error_object_is_stream_fault() {
        let payload = r#"{"error": {"code": 503, "message": "overloaded", "status": "UNAVAILABLE"}}"#;
        let err = decode_payload(payload).unwrap_err();
        assert!(matches!(err, LlmError::Stream(ref m) if m.contains("overloaded") && m.contains("503")));
    }

    #[tokio::test]
    async fn test_stream_reassembles_split_events() {
        let first = event("He");
        let second = event("llo");
        let third = event(" world");
        let joined = format!("{first}{second}{third}");
        let (a, rest) = joined.split_at(17);
        let (b, c) = rest.split_at(first.len());

        let items = collect(fragment_stream(futures::stream::iter(chunks(&[a, b, c])))).await;
        let texts: Vec<String> = items.into_iter().map(Result::unwrap).collect();
        assert_eq!(texts.concat(), "Hello world");
        assert_eq!(texts, vec!["He", "llo", " world"]);
    }

    #[tokio::test]
    async fn test_stream_ends_after_first_fault() {
        let body = format!(
            "{}data: {{\"error\": {{\"message\": \"boom\"}}}}\n\n{}",
            event("partial"),
            event("never")
        );
        let items = collect(fragment_stream(futures::stream::iter(chunks(&[&body])))).await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_deref().unwrap(), "partial");
        assert!(items[1].is_err());
    }

    #[tokio::test]
    async fn test_transport_error_mid_stream() {
        let items: Vec<Result<Vec<u8>, std::io::Error>> = vec![
            Ok(event("a").into_bytes()),
            Err(std::io::Error::other("connection reset")),
        ];
        let items = collect(fragment_stream(futures::stream::iter(items))).await;
        assert_eq!(items.len(), 2);
        assert!(
            matches!(&items[1], Err(LlmError::Transport(m)) if m.contains("connection reset"))
        );
    }

    #[tokio::test]
    async fn test_unterminated_trailing_event_is_flushed() {
        let body = event("tail");
        let body = body.trim_end();
        let items = collect(fragment_stream(futures::stream::iter(chunks(&[body])))).await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].as_deref().unwrap(), "tail");
    }
}
