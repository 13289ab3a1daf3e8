//! Completion request/response types.
//!
//! The wire shapes follow the OpenAI-compatible chat-completions contract:
//! a fixed model selector with a single user-role message out, zero or more
//! choices back, of which only the first's text content is used.

use serde::{Deserialize, Serialize};

/// Outcome of one completion attempt.
///
/// The adapter never surfaces an error; the dispatcher chooses what to do
/// with a failure (it substitutes the fallback reply).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// The provider produced a reply.
    Reply(String),
    /// The call failed; carries the reason for the log line.
    Failed(String),
}

#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoiceMessage {
    #[serde(default)]
    pub content: String,
}
