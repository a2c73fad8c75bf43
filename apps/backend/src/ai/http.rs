//! Hosted model providers over HTTPS.
//!
//! One client type speaks the three wire formats. Each `decide` call is a
//! single request; a 429 surfaces as `DecisionError::RateLimited` with the
//! server's hint when one is present.

use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::parse::parse_order_quantity;
use super::prompt::{build_prompt, SYSTEM_PROMPT};
use super::trait_def::{DecisionError, DecisionProvider, DecisionRequest};

static RETRY_HINT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)retry after (\d+) second").expect("retry hint regex is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderApi {
    OpenAi,
    Anthropic,
    Gemini,
}

impl ProviderApi {
    pub const fn default_base_url(self) -> &'static str {
        match self {
            ProviderApi::OpenAi => "https://api.openai.com/v1",
            ProviderApi::Anthropic => "https://api.anthropic.com/v1",
            ProviderApi::Gemini => "https://generativelanguage.googleapis.com/v1beta",
        }
    }

    const fn name(self) -> &'static str {
        match self {
            ProviderApi::OpenAi => "openai",
            ProviderApi::Anthropic => "anthropic",
            ProviderApi::Gemini => "gemini",
        }
    }
}

pub struct HttpDecisionProvider {
    client: reqwest::Client,
    api: ProviderApi,
    api_key: String,
    base_url: String,
}

impl HttpDecisionProvider {
    pub fn new(api: ProviderApi, api_key: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            api,
            api_key: api_key.into(),
            base_url: api.default_base_url().to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn request_builder(&self, model: &str, prompt: &str) -> reqwest::RequestBuilder {
        match self.api {
            ProviderApi::OpenAi => self
                .client
                .post(format!("{}/chat/completions", self.base_url))
                .bearer_auth(&self.api_key)
                .json(&OpenAiChatRequest {
                    model,
                    messages: vec![
                        ChatMessage {
                            role: "system",
                            content: SYSTEM_PROMPT,
                        },
                        ChatMessage {
                            role: "user",
                            content: prompt,
                        },
                    ],
                    reasoning_effort: "medium",
                }),
            ProviderApi::Anthropic => {
                let content = format!("{SYSTEM_PROMPT}\n\n{prompt}");
                self.client
                    .post(format!("{}/messages", self.base_url))
                    .header("x-api-key", &self.api_key)
                    .header("anthropic-version", "2023-06-01")
                    .json(&AnthropicRequest {
                        model,
                        max_tokens: 100,
                        messages: vec![AnthropicMessage {
                            role: "user",
                            content,
                        }],
                    })
            }
            ProviderApi::Gemini => self
                .client
                .post(format!("{}/models/{model}:generateContent", self.base_url))
                .header("x-goog-api-key", &self.api_key)
                .json(&GeminiRequest {
                    contents: vec![GeminiContentOut {
                        parts: vec![GeminiPartOut {
                            text: format!("{SYSTEM_PROMPT}\n\n{prompt}"),
                        }],
                    }],
                }),
        }
    }

    fn extract_text(&self, body: &str) -> Result<String, DecisionError> {
        let invalid = |e: serde_json::Error| {
            DecisionError::InvalidResponse(format!("{} parse failed: {e}", self.api.name()))
        };
        let text = match self.api {
            ProviderApi::OpenAi => serde_json::from_str::<OpenAiChatResponse>(body)
                .map_err(invalid)?
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content),
            ProviderApi::Anthropic => serde_json::from_str::<AnthropicResponse>(body)
                .map_err(invalid)?
                .content
                .into_iter()
                .find_map(|block| block.text),
            ProviderApi::Gemini => serde_json::from_str::<GeminiResponse>(body)
                .map_err(invalid)?
                .candidates
                .into_iter()
                .next()
                .and_then(|c| c.content.parts.into_iter().find_map(|p| p.text)),
        };
        text.map(|t| t.trim().to_string()).ok_or_else(|| {
            DecisionError::InvalidResponse(format!("{} returned no text", self.api.name()))
        })
    }
}

#[async_trait]
impl DecisionProvider for HttpDecisionProvider {
    fn name(&self) -> &'static str {
        self.api.name()
    }

    async fn decide(&self, request: &DecisionRequest) -> Result<u32, DecisionError> {
        let prompt = build_prompt(request);
        let response = self
            .request_builder(&request.model.model, &prompt)
            .send()
            .await
            .map_err(|e| DecisionError::Request(e.to_string()))?;

        let status = response.status();
        let retry_header = retry_after_header(response.headers());
        let body = response
            .text()
            .await
            .map_err(|e| DecisionError::Request(e.to_string()))?;

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(DecisionError::RateLimited {
                retry_after: retry_header.or_else(|| retry_after_hint(&body)),
            });
        }
        if !status.is_success() {
            return Err(DecisionError::Request(format!(
                "{} error {status} (model={}): {body}",
                self.api.name(),
                request.model.model
            )));
        }

        let text = self.extract_text(&body)?;
        tracing::debug!(provider = self.api.name(), model = %request.model.model, response = %text, "decision text");
        parse_order_quantity(&text)
    }
}

fn retry_after_header(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Pull a "retry after N second(s)" hint out of an error body.
pub fn retry_after_hint(body: &str) -> Option<Duration> {
    RETRY_HINT
        .captures(body)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct OpenAiChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    reasoning_effort: &'a str,
}

#[derive(Deserialize)]
struct OpenAiChatResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
}

#[derive(Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<AnthropicBlock>,
}

#[derive(Deserialize)]
struct AnthropicBlock {
    text: Option<String>,
}

#[derive(Serialize)]
struct GeminiPartOut {
    text: String,
}

#[derive(Serialize)]
struct GeminiContentOut {
    parts: Vec<GeminiPartOut>,
}

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContentOut>,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiContentIn,
}

#[derive(Deserialize)]
struct GeminiContentIn {
    #[serde(default)]
    parts: Vec<GeminiPartIn>,
}

#[derive(Deserialize)]
struct GeminiPartIn {
    text: Option<String>,
}
