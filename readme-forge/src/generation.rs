#![doc = "Text generation integration: implements the core `TextGenerator` against an OpenAI-compatible chat-completions endpoint."]
//
//! # Chat completions client (CLI <-> Core)
//!
//! [`ChatCompletionsClient`] sends one system message and one user message per request and
//! returns the first choice's content. The default endpoint is DeepSeek; any service that
//! speaks the chat-completions wire format works.
//!
//! Failures keep the upstream status and message:
//! - 401/403 → [`GenerationFailure::Auth`]
//! - 429 → [`GenerationFailure::RateLimited`]
//! - anything else → [`GenerationFailure::Upstream`]

use anyhow::Context;
use async_trait::async_trait;
use readme_forge_core::contract::{CompletionRequest, GenerationFailure, TextGenerator};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::load_config::GenerationSettings;

pub struct ChatCompletionsClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

fn chat_request<'a>(model: &'a str, request: &'a CompletionRequest) -> ChatRequest<'a> {
    ChatRequest {
        model,
        messages: vec![
            ChatMessage {
                role: "system",
                content: &request.system,
            },
            ChatMessage {
                role: "user",
                content: &request.user,
            },
        ],
        temperature: request.sampling.temperature,
        max_tokens: request.sampling.max_output_tokens,
    }
}

/// Map a non-success response onto [`GenerationFailure`], keeping the service's message.
pub(crate) fn classify_failure(status: StatusCode, body: &str) -> GenerationFailure {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_string());
    let code = status.as_u16();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GenerationFailure::Auth {
            status: code,
            message,
        },
        StatusCode::TOO_MANY_REQUESTS => GenerationFailure::RateLimited {
            status: code,
            message,
        },
        _ => GenerationFailure::Upstream {
            status: Some(code),
            message,
        },
    }
}

fn first_choice(response: ChatResponse) -> Result<String, GenerationFailure> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| GenerationFailure::Upstream {
            status: None,
            message: "response contained no choices".to_string(),
        })
}

impl ChatCompletionsClient {
    pub fn new(settings: &GenerationSettings) -> anyhow::Result<Self> {
        let api_key = settings
            .api_key
            .clone()
            .context("GENERATION_API_KEY (or DEEPSEEK_API_KEY) is not set")?;
        let http = reqwest::Client::builder()
            .build()
            .context("Failed to build generation HTTP client")?;
        let endpoint = format!("{}/chat/completions", settings.base_url.trim_end_matches('/'));
        tracing::info!(%endpoint, model = %settings.model, "Initialized ChatCompletionsClient");
        Ok(Self {
            http,
            endpoint,
            model: settings.model.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl TextGenerator for ChatCompletionsClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, GenerationFailure> {
        let body = chat_request(&self.model, &request);
        tracing::info!(
            model = %self.model,
            prompt_chars = request.user.len(),
            "Requesting chat completion"
        );

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationFailure::Upstream {
                status: None,
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let failure = classify_failure(status, &text);
            tracing::error!(%status, error = %failure, "Chat completion request failed");
            return Err(failure);
        }

        let parsed: ChatResponse =
            response
                .json()
                .await
                .map_err(|e| GenerationFailure::Upstream {
                    status: Some(status.as_u16()),
                    message: format!("could not decode completion: {e}"),
                })?;
        first_choice(parsed)
    }
}
