//! Completion service adapter.
//!
//! Wraps the single request/response call to the external text-generation
//! provider. The provider is opaque beyond its input (a prompt string) and
//! output (a reply string or a failure reason).

mod client;
mod error;
mod types;

use async_trait::async_trait;

pub use client::CompletionClient;
pub use error::{CompletionError, CompletionResult};
pub use types::CompletionOutcome;

/// Seam between the command dispatcher and the completion provider.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// One attempt, no retry. Never returns an error: failures are folded
    /// into the tagged outcome.
    async fn complete(&self, prompt: &str) -> CompletionOutcome;
}

#[async_trait]
impl CompletionBackend for CompletionClient {
    async fn complete(&self, prompt: &str) -> CompletionOutcome {
        CompletionClient::complete(self, prompt).await
    }
}
