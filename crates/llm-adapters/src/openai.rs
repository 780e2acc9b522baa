//! OpenAI-compatible chat completion client (`POST {base_url}/chat/completions`).
//!
//! One request per call with no retries. The wire types are private; callers
//! only see [`ChatMessage`] in and text out.

use std::time::Duration;

use async_trait::async_trait;
use domains::{ChatMessage, GatewayError, LanguageModel};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// Everything needed to reach a completion endpoint.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub base_url: String,
    pub model: String,
    /// `None` leaves the client unconfigured; every call fails fast.
    pub api_key: Option<SecretString>,
    pub timeout: Duration,
    /// Sent as `HTTP-Referer`.
    pub referer: Option<String>,
    /// Sent as `X-Title`.
    pub app_title: Option<String>,
}

/// Cheap to clone; `reqwest::Client` is reference-counted.
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleClient {
    client: Client,
    endpoint: String,
    options: ClientOptions,
}

impl OpenAiCompatibleClient {
    pub fn new(options: ClientOptions) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(options.timeout)
            .build()
            .map_err(|e| GatewayError::Transport(format!("failed to build HTTP client: {e}")))?;
        let endpoint = format!("{}/chat/completions", options.base_url.trim_end_matches('/'));
        Ok(Self { client, endpoint, options })
    }

    pub fn model(&self) -> &str {
        &self.options.model
    }

    pub fn is_configured(&self) -> bool {
        self.options.api_key.is_some()
    }
}

#[async_trait]
impl LanguageModel for OpenAiCompatibleClient {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, GatewayError> {
        let key = self.options.api_key.as_ref().ok_or(GatewayError::NotConfigured)?;

        let payload = ChatCompletionRequest { model: &self.options.model, messages: &messages };
        debug!(model = %self.options.model, messages = messages.len(), "sending completion request");

        let mut req = self.client.post(&self.endpoint).bearer_auth(key.expose_secret()).json(&payload);
        if let Some(referer) = &self.options.referer {
            req = req.header("HTTP-Referer", referer);
        }
        if let Some(title) = &self.options.app_title {
            req = req.header("X-Title", title);
        }

        let response = req.send().await.map_err(|e| {
            error!(endpoint = %self.endpoint, error = %e, timeout = e.is_timeout(), "completion request failed");
            GatewayError::Transport(e.to_string())
        })?;
        let response = check_status(response).await?;

        let parsed = response.json::<ChatCompletionResponse>().await.map_err(|e| {
            error!(error = %e, "failed to deserialize completion response");
            GatewayError::InvalidResponse(format!("failed to parse response body: {e}"))
        })?;
        debug!(choices = parsed.choices.len(), "completion response received");

        // Blank or missing content is still a reply; the caller decides what it means.
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::InvalidResponse("no choices in response".into()))?;
        Ok(choice.message.content.unwrap_or_default())
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_else(|_| "<failed to read error body>".to_string());
    let message = match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) => envelope.error.message,
        Err(_) => body,
    };

    error!(%status, %message, "completion endpoint returned an error status");
    Err(GatewayError::Status { status: status.as_u16(), message })
}
