//! Best-effort text summarisation via an external completion service.
//!
//! Every failure path (missing credential, network, auth, malformed response)
//! is logged and mapped to `None`. Absence of a summary is never an error for
//! the caller; the rest of the pipeline works without this component.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const MODEL: &str = "gpt-3.5-turbo";
const MAX_TOKENS: u32 = 300;
const TEMPERATURE: f32 = 0.5;
/// Input is truncated to this many bytes before it is sent out.
const INPUT_PREFIX_LEN: usize = 3000;
const SYSTEM_PROMPT: &str = "You are a helpful assistant that summarizes text concisely.";

/// Seam for summary generation, mockable in pipeline and CLI tests.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Produce a short summary of `text`, or `None` when no summary is
    /// available for any reason.
    async fn summarize(&self, text: &str) -> Option<String>;
}

/// Client for an OpenAI-style chat-completions endpoint.
pub struct OpenAiSummarizer {
    client: reqwest::Client,
    api_key: Option<String>,
    api_base: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: &'static str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

impl OpenAiSummarizer {
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_api_base(api_key, DEFAULT_API_BASE.to_string())
    }

    /// Construct against a non-default endpoint. Used by tests to point the
    /// client at an unreachable or fake server.
    pub fn with_api_base(api_key: Option<String>, api_base: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            api_base,
        }
    }

    async fn request_summary(&self, api_key: &str, text: &str) -> Result<String, String> {
        let prefix = truncate_prefix(text, INPUT_PREFIX_LEN);
        let body = ChatRequest {
            model: MODEL,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: format!(
                        "Please provide a concise summary of the following text:\n\n{prefix}"
                    ),
                },
            ],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let url = format!("{}/chat/completions", self.api_base);
        debug!(url = %url, input_len = prefix.len(), "Requesting summary");

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(format!("service returned {status}: {detail}"));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| format!("malformed response: {e}"))?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| "response contained no choices".to_string())?;
        Ok(choice.message.content.trim().to_string())
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn summarize(&self, text: &str) -> Option<String> {
        let Some(api_key) = self.api_key.as_deref() else {
            info!("No API key configured, skipping summary");
            return None;
        };
        match self.request_summary(api_key, text).await {
            Ok(summary) => {
                info!(summary_len = summary.len(), "Summary generated");
                Some(summary)
            }
            Err(e) => {
                error!(error = %e, "Failed to generate summary");
                None
            }
        }
    }
}

/// Byte-length prefix of `text`, backed off to the nearest char boundary.
fn truncate_prefix(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
