//! Query synthesizer: one SQL query from the question and the routed schema

use nlsql_core::{KnowledgeBase, SqlDialect};
use nlsql_llm::{CompletionError, CompletionService};
use nlsql_prompt::{PromptError, PromptRenderer};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("SQL generation request failed: {0}")]
    Completion(#[from] CompletionError),

    #[error("Failed to render SQL generation prompt: {0}")]
    Prompt(#[from] PromptError),
}

pub struct QuerySynthesizer {
    llm: Arc<dyn CompletionService>,
    prompts: Arc<PromptRenderer>,
}

impl QuerySynthesizer {
    pub fn new(llm: Arc<dyn CompletionService>, prompts: Arc<PromptRenderer>) -> Self {
        Self { llm, prompts }
    }

    /// Generate SQL for `user_query` over `filtered_kb`
    ///
    /// Always makes exactly one completion call, also for an empty schema.
    /// The model's text is returned as is, without validation.
    pub async fn synthesize(
        &self,
        user_query: &str,
        filtered_kb: &KnowledgeBase,
        dialect: SqlDialect,
    ) -> Result<String, GenerationError> {
        if filtered_kb.is_empty() {
            tracing::debug!("generating SQL with an empty schema");
        }
        let prompt = self.prompts.sql_generation(user_query, filtered_kb, dialect)?;
        Ok(self.llm.complete(&prompt).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nlsql_llm::ScriptedCompletion;

    fn synthesizer(llm: &ScriptedCompletion) -> QuerySynthesizer {
        QuerySynthesizer::new(Arc::new(llm.clone()), Arc::new(PromptRenderer::new().unwrap()))
    }

    #[tokio::test]
    async fn empty_schema_still_calls_once() {
        let llm = ScriptedCompletion::new(["I cannot answer that without tables."]);
        let sql = synthesizer(&llm)
            .synthesize("How many orders?", &KnowledgeBase::new(), SqlDialect::MySql)
            .await
            .unwrap();

        assert_eq!(sql, "I cannot answer that without tables.");
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn raw_text_is_not_trimmed_or_unfenced() {
        let raw = "```sql\nSELECT 1;\n```\n";
        let llm = ScriptedCompletion::new([raw]);
        let sql = synthesizer(&llm)
            .synthesize("one", &KnowledgeBase::new(), SqlDialect::PostgreSql)
            .await
            .unwrap();
        assert_eq!(sql, raw);
    }

    #[tokio::test]
    async fn provider_failure_is_a_generation_error() {
        let llm = ScriptedCompletion::default().with_error(CompletionError::Http {
            status: 503,
            body: "unavailable".to_string(),
        });
        let err = synthesizer(&llm)
            .synthesize("q", &KnowledgeBase::new(), SqlDialect::PostgreSql)
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Completion(CompletionError::Http { status: 503, .. })));
    }
}
