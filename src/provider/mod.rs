//! Completion providers
//!
//! The engine only ever needs one thing from a language model: send a prompt,
//! get text back. Everything vendor-specific lives behind `CompletionProvider`.
//!
//! - `chat`: OpenAI-compatible chat-completion endpoint over HTTPS
//! - `scripted`: canned replies, for tests

pub mod chat;
pub mod scripted;

pub use chat::{ChatCompletionProvider, ProviderConfig};
pub use scripted::ScriptedProvider;

use crate::error::ProviderError;
use async_trait::async_trait;

/// A text-completion service
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Send `prompt` as a single user message and return the reply text.
    ///
    /// Network and HTTP failures are errors, never an empty reply.
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError>;

    /// Model identifier, for logs
    fn model(&self) -> &str;
}
