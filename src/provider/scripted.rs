//! Scripted provider for tests
//!
//! Replies are consumed in order; every prompt is recorded for inspection.
//!
//! ```rust,ignore
//! let provider = ScriptedProvider::new()
//!     .with_reply(r#"[{"text": "Budget?", "options": ["Low", "High"]}]"#)
//!     .with_failure("connection reset");
//! ```

use super::CompletionProvider;
use crate::error::ProviderError;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone)]
enum Scripted {
    Reply(String),
    Failure(String),
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedProvider {
    script: Arc<Mutex<VecDeque<Scripted>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply
    pub fn with_reply(self, text: impl Into<String>) -> Self {
        lock(&self.script).push_back(Scripted::Reply(text.into()));
        self
    }

    /// Queue a network failure
    pub fn with_failure(self, message: impl Into<String>) -> Self {
        lock(&self.script).push_back(Scripted::Failure(message.into()));
        self
    }

    /// Prompts received so far, oldest first
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }

    pub fn remaining(&self) -> usize {
        lock(&self.script).len()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        lock(&self.prompts).push(prompt.to_string());
        match lock(&self.script).pop_front() {
            Some(Scripted::Reply(text)) => Ok(text),
            Some(Scripted::Failure(message)) => Err(ProviderError::Network(message)),
            None => Err(ProviderError::network("no scripted reply left")),
        }
    }

    fn model(&self) -> &str {
        "scripted"
    }
}
