//! Scripted completion service for testing
//!
//! Replays queued responses in order and records every prompt it receives.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use nlsql_llm::{CompletionService, ScriptedCompletion};
//!
//! let llm = ScriptedCompletion::new(["[\"customers\"]", "SELECT 1"]);
//! let text = llm.complete(&prompt).await?;
//! assert_eq!(llm.call_count(), 1);
//! ```

use crate::provider::{CompletionError, CompletionService};
use async_trait::async_trait;
use nlsql_core::Prompt;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

/// Completion service that replays a script
///
/// Clones share the script and the prompt log. Once the script runs out,
/// every call fails with [`CompletionError::Exhausted`].
#[derive(Clone, Default)]
pub struct ScriptedCompletion {
    script: Arc<Mutex<VecDeque<Result<String, CompletionError>>>>,
    prompts: Arc<Mutex<Vec<Prompt>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ScriptedCompletion {
    /// Create a script of successful responses
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let script = responses.into_iter().map(|r| Ok(r.into())).collect();
        Self {
            script: Arc::new(Mutex::new(script)),
            prompts: Arc::default(),
        }
    }

    /// Queue a successful response
    pub fn push_response(&self, response: impl Into<String>) {
        lock(&self.script).push_back(Ok(response.into()));
    }

    /// Queue a failure
    pub fn push_error(&self, error: CompletionError) {
        lock(&self.script).push_back(Err(error));
    }

    /// Builder form of [`Self::push_error`]
    pub fn with_error(self, error: CompletionError) -> Self {
        self.push_error(error);
        self
    }

    /// Number of `complete` calls made so far
    pub fn call_count(&self) -> usize {
        lock(&self.prompts).len()
    }

    /// Prompts received, in call order
    pub fn prompts(&self) -> Vec<Prompt> {
        lock(&self.prompts).clone()
    }

    /// Responses not yet consumed
    pub fn remaining(&self) -> usize {
        lock(&self.script).len()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, prompt: &Prompt) -> Result<String, CompletionError> {
        lock(&self.prompts).push(prompt.clone());
        lock(&self.script)
            .pop_front()
            .unwrap_or(Err(CompletionError::Exhausted))
    }
}
