use std::sync::OnceLock;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::time::timeout;

use crate::circuit_breaker::{CircuitBreaker, ExponentialBackoff};
use crate::config::settings::Settings;
use crate::error::CoachError;
use crate::pipelines::markers::preview;
use crate::pipelines::perf::PerfTimer;
use crate::state::app::AppState;

/// Reusable HTTP client singleton (created once, reused for all requests)
static HTTP_CLIENT: OnceLock<Client> = OnceLock::new();

fn get_http_client() -> &'static Client {
    HTTP_CLIENT.get_or_init(|| {
        Client::builder()
            .tcp_keepalive(Duration::from_secs(30))
            .pool_max_idle_per_host(10)
            .build()
            .expect("Failed to create HTTP client")
    })
}

/// Who produced a conversation turn, in the endpoint's vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
}

impl Role {
    fn as_wire(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

/// One turn of a conversation sent to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn user<S: Into<String>>(text: S) -> Self {
        Turn {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn model<S: Into<String>>(text: S) -> Self {
        Turn {
            role: Role::Model,
            text: text.into(),
        }
    }
}

/// Sampling knobs, sent only when a request opts in. Chat requests use
/// them to get varied phrasing; grading requests leave them unset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenerationConfig {
    pub temperature: f32,
    #[serde(rename = "topP")]
    pub top_p: f32,
}

/// A complete request for one model call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub turns: Vec<Turn>,
    pub config: Option<GenerationConfig>,
}

impl GenerateRequest {
    /// A single user prompt with no sampling config.
    pub fn prompt<S: Into<String>>(text: S) -> Self {
        GenerateRequest {
            turns: vec![Turn::user(text)],
            config: None,
        }
    }

    /// A multi-turn conversation with no sampling config.
    pub fn conversation(turns: Vec<Turn>) -> Self {
        GenerateRequest { turns, config: None }
    }

    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.config = Some(config);
        self
    }
}

/// The single seam every model call goes through. Production uses the
/// Gemini client below; tests substitute scripted generators.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: GenerateRequest) -> Result<String, CoachError>;

    /// Label for logs and cache keys.
    fn model_name(&self) -> &str;
}

/// Gemini REST client with a retry loop and circuit breaker in front of
/// the wire call.
pub struct GeminiClient {
    api_key: String,
    model: String,
    base_url: String,
    request_timeout: Duration,
    max_retries: u32,
    breaker: CircuitBreaker,
}

impl GeminiClient {
    pub fn from_settings(settings: &Settings) -> Self {
        GeminiClient {
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            base_url: settings.base_url.clone(),
            request_timeout: Duration::from_secs(settings.request_timeout_secs),
            max_retries: settings.max_retries,
            breaker: CircuitBreaker::default(),
        }
    }

    /// One attempt against the endpoint, bounded by the request timeout.
    async fn execute(&self, request: &GenerateRequest) -> Result<String, CoachError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        let body = GeminiRequest::from_request(request);

        let outcome = timeout(self.request_timeout, post_generate(&url, &body)).await;
        let (status, text) = match outcome {
            Ok(Ok(pair)) => pair,
            Ok(Err(e)) => return Err(CoachError::transport(None, format!("{:#}", e))),
            Err(_) => {
                return Err(CoachError::transport(
                    None,
                    format!("model call timed out after {}s", self.request_timeout.as_secs()),
                ))
            }
        };

        if !(200..300).contains(&status) {
            return Err(CoachError::transport(Some(status), preview(&text, 300)));
        }

        let parsed: GeminiResponse = serde_json::from_str(&text)
            .map_err(|e| CoachError::transport(Some(status), format!("unreadable response body: {}", e)))?;
        extract_text(parsed)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, request: GenerateRequest) -> Result<String, CoachError> {
        if self.api_key.is_empty() {
            return Err(CoachError::MissingCredential);
        }
        if self.breaker.is_open() {
            return Err(CoachError::transport(
                None,
                "endpoint circuit is open, cooling down",
            ));
        }

        let backoff = ExponentialBackoff::default();
        let mut attempt = 0;
        loop {
            match self.execute(&request).await {
                Ok(text) => {
                    self.breaker.record_success();
                    return Ok(text);
                }
                Err(err @ CoachError::Transport { .. }) => {
                    self.breaker.record_failure();
                    if attempt >= self.max_retries {
                        return Err(err);
                    }
                    let delay = backoff.jittered_delay_for_attempt(attempt);
                    tracing::warn!(
                        model = %self.model,
                        attempt = attempt,
                        delay_ms = delay,
                        error = %err,
                        "Retrying model call after transport failure"
                    );
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    attempt += 1;
                }
                // The endpoint answered; only transport failures retry.
                Err(err) => return Err(err),
            }
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Run a request through the state's generator, keeping the gateway
/// counters and timing up to date.
pub async fn generate_tracked(state: &AppState, request: GenerateRequest) -> Result<String, CoachError> {
    let timer = PerfTimer::new("gateway_call");
    state.metrics.record_gateway_call();
    let result = state.generator.generate(request).await;
    state.metrics.record_gateway_latency(timer.elapsed_ms());
    if result.is_err() {
        state.metrics.record_gateway_failure();
    }
    result
}

async fn post_generate(url: &str, body: &GeminiRequest) -> anyhow::Result<(u16, String)> {
    let client = get_http_client();
    let response = client
        .post(url)
        .json(body)
        .send()
        .await
        .context("Failed to reach the Gemini endpoint")?;

    let status = response.status().as_u16();
    let text = response
        .text()
        .await
        .context("Failed to read the Gemini response body")?;
    Ok((status, text))
}

fn extract_text(response: GeminiResponse) -> Result<String, CoachError> {
    let candidate_text = response
        .candidates
        .unwrap_or_default()
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().next())
        .map(|part| part.text)
        .filter(|text| !text.is_empty());

    match candidate_text {
        Some(text) => Ok(text),
        None => {
            let block_reason = response.prompt_feedback.and_then(|f| f.block_reason);
            Err(CoachError::EmptyResponse { block_reason })
        }
    }
}

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

impl GeminiRequest {
    fn from_request(request: &GenerateRequest) -> Self {
        GeminiRequest {
            contents: request
                .turns
                .iter()
                .map(|turn| GeminiContent {
                    role: turn.role.as_wire(),
                    parts: vec![GeminiPart {
                        text: turn.text.clone(),
                    }],
                })
                .collect(),
            generation_config: request.config,
        }
    }
}

#[derive(Serialize)]
struct GeminiContent {
    role: &'static str,
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Option<Vec<GeminiCandidate>>,
    #[serde(rename = "promptFeedback", default)]
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiCandidateContent>,
}

#[derive(Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct GeminiPromptFeedback {
    #[serde(rename = "blockReason", default)]
    block_reason: Option<String>,
}
