//! Gemini `generateContent` adapter.
//!
//! Each invocation is stateless from the orchestrator's perspective: the
//! full instruction and full history are sent every call, so the remote
//! side holds no session memory. The conversation log in `chat` is the
//! only source of truth for continuity.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config;
use crate::models::HistoryEntry;

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("{0} environment variable is not set")]
    MissingApiKey(&'static str),

    #[error("request to Gemini failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gemini returned HTTP {status}: {body}")]
    Remote { status: u16, body: String },

    #[error("could not extract text from Gemini response")]
    MalformedResponse,
}

/// Model invocation seam between the orchestrator and the hosted service.
#[allow(async_fn_in_trait)]
pub trait ModelInvoker {
    async fn invoke(
        &self,
        instruction: &str,
        history: &[HistoryEntry],
        query: &str,
    ) -> Result<String, AdapterError>;
}

/// HTTP client for the hosted Gemini service.
pub struct GeminiClient {
    base_url: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiClient {
    /// Create a client from the process environment.
    ///
    /// A missing credential is a configuration error, raised here before
    /// any conversation activity rather than per request.
    pub fn new() -> Result<Self, AdapterError> {
        let api_key =
            config::api_key().ok_or(AdapterError::MissingApiKey(config::API_KEY_ENV))?;
        Ok(Self::with_api_key(api_key))
    }

    /// Create a client with an explicit credential.
    pub fn with_api_key(api_key: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config::REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: config::GEMINI_BASE_URL.trim_end_matches('/').to_string(),
            model: config::GEMINI_MODEL.to_string(),
            api_key,
            client,
        }
    }

    /// The model identifier being used.
    pub fn model(&self) -> &str {
        &self.model
    }
}

// ── Wire types for /v1beta/models/{model}:generateContent ───────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    thinking_config: ThinkingConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Concatenate the text parts of the first candidate.
///
/// `None` when the response carries no candidate content at all; an empty
/// string is a valid (if useless) result the caller maps to its fallback.
fn extract_text(response: GenerateContentResponse) -> Option<String> {
    let content = response.candidates.into_iter().next()?.content?;
    Some(
        content
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect::<Vec<_>>()
            .join(""),
    )
}

impl ModelInvoker for GeminiClient {
    async fn invoke(
        &self,
        instruction: &str,
        history: &[HistoryEntry],
        query: &str,
    ) -> Result<String, AdapterError> {
        let mut contents: Vec<Content> = history
            .iter()
            .map(|entry| Content {
                role: Some(entry.role.as_str()),
                parts: vec![Part { text: &entry.text }],
            })
            .collect();
        contents.push(Content {
            role: Some("user"),
            parts: vec![Part { text: query }],
        });

        let body = GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part { text: instruction }],
            },
            contents,
            generation_config: GenerationConfig {
                temperature: config::TEMPERATURE,
                thinking_config: ThinkingConfig {
                    thinking_budget: config::THINKING_BUDGET,
                },
            },
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        tracing::debug!(model = %self.model, history_len = history.len(), "invoking Gemini");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdapterError::Remote {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|_| AdapterError::MalformedResponse)?;

        extract_text(parsed).ok_or(AdapterError::MalformedResponse)
    }
}
