//! Router: pick the tables relevant to a question
//!
//! The model sees every table's description and answers with a JSON array
//! of table names. Nothing else is accepted and there is no fallback to
//! "all tables". Names are returned as given; checking them against the
//! knowledge base is the pipeline's job.

use nlsql_llm::{CompletionError, CompletionService};
use nlsql_prompt::{PromptError, PromptRenderer};
use std::collections::BTreeMap;
use std::sync::Arc;

/// The router's answer was not a JSON array of strings
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Router response is not a JSON array of strings ({reason}): {response}")]
pub struct RoutingParseError {
    /// Raw model output
    pub response: String,
    pub reason: String,
}

#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    #[error(transparent)]
    Parse(#[from] RoutingParseError),

    #[error("Routing request failed: {0}")]
    Completion(#[from] CompletionError),

    #[error("Failed to render routing prompt: {0}")]
    Prompt(#[from] PromptError),
}

pub struct Router {
    llm: Arc<dyn CompletionService>,
    prompts: Arc<PromptRenderer>,
}

impl Router {
    pub fn new(llm: Arc<dyn CompletionService>, prompts: Arc<PromptRenderer>) -> Self {
        Self { llm, prompts }
    }

    /// Ask which tables answer `user_query`
    ///
    /// An empty array is a valid answer and is passed through.
    pub async fn route(
        &self,
        user_query: &str,
        table_descriptions: &BTreeMap<String, String>,
    ) -> Result<Vec<String>, RouterError> {
        let prompt = self.prompts.routing(user_query, table_descriptions)?;
        let response = self.llm.complete(&prompt).await?;
        let tables = parse_table_list(&response)?;

        tracing::debug!(?tables, "router selected tables");
        Ok(tables)
    }
}

/// Parse a router response as a JSON array of strings
///
/// Surrounding whitespace is ignored; anything else must be the array.
pub fn parse_table_list(response: &str) -> Result<Vec<String>, RoutingParseError> {
    serde_json::from_str::<Vec<String>>(response.trim()).map_err(|e| RoutingParseError {
        response: response.to_string(),
        reason: e.to_string(),
    })
}
