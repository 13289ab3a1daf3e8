//! Completion HTTP client.

use std::time::Duration;

use log::warn;
use reqwest::Client;

use super::error::{CompletionError, CompletionResult};
use super::types::*;

/// Timeout applied by the underlying HTTP client; the adapter itself
/// enforces none.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Client for the external text-generation provider.
#[derive(Debug, Clone)]
pub struct CompletionClient {
    /// HTTP client.
    client: Client,
    /// Base URL of the provider (e.g., "https://api.openai.com").
    base_url: String,
    /// Bearer token for the provider.
    api_key: String,
    /// Fixed model selector sent with every request.
    model: String,
}

impl CompletionClient {
    /// Create a new completion client.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Request one completion for `prompt`.
    ///
    /// Single attempt, no retry. Every failure is folded into
    /// [`CompletionOutcome::Failed`]; callers never see an `Err`.
    pub async fn complete(&self, prompt: &str) -> CompletionOutcome {
        match self.request_reply(prompt).await {
            Ok(text) => CompletionOutcome::Reply(text),
            Err(e) => {
                warn!("completion call failed: {}", e);
                CompletionOutcome::Failed(e.to_string())
            }
        }
    }

    async fn request_reply(&self, prompt: &str) -> CompletionResult<String> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::user(prompt)],
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Api { status, body });
        }

        let parsed: ChatCompletionResponse = response.json().await?;
        let reply = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .unwrap_or_default();

        if reply.is_empty() {
            return Err(CompletionError::EmptyReply);
        }
        Ok(reply)
    }
}
