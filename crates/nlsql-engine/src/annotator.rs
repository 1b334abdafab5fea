//! Table annotator
//!
//! One completion call per table: the human-written purpose and a few sample
//! rows go in, the model's raw annotation text comes out. Parsing belongs to
//! the builder.

use nlsql_catalog::DataSample;
use nlsql_llm::{CompletionError, CompletionService};
use nlsql_prompt::{PromptError, PromptRenderer};
use std::sync::Arc;

/// Error while requesting an annotation
#[derive(Debug, thiserror::Error)]
pub enum AnnotatorError {
    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error(transparent)]
    Completion(#[from] CompletionError),
}

pub struct TableAnnotator {
    llm: Arc<dyn CompletionService>,
    prompts: Arc<PromptRenderer>,

    /// Background about the whole dataset, shared by every table prompt
    dataset_context: Option<String>,
}

impl TableAnnotator {
    pub fn new(llm: Arc<dyn CompletionService>, prompts: Arc<PromptRenderer>) -> Self {
        Self {
            llm,
            prompts,
            dataset_context: None,
        }
    }

    pub fn with_dataset_context(mut self, context: Option<String>) -> Self {
        self.dataset_context = context.filter(|c| !c.trim().is_empty());
        self
    }

    /// Ask the model to annotate one table; returns the raw response text
    pub async fn annotate(&self, table_purpose: &str, sample: &DataSample) -> Result<String, AnnotatorError> {
        let prompt = self.prompts.annotation(
            table_purpose,
            &sample.to_prompt_text(),
            self.dataset_context.as_deref(),
        )?;
        Ok(self.llm.complete(&prompt).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nlsql_llm::ScriptedCompletion;
    use serde_json::json;

    fn annotator(llm: &ScriptedCompletion) -> TableAnnotator {
        TableAnnotator::new(Arc::new(llm.clone()), Arc::new(PromptRenderer::new().unwrap()))
    }

    #[tokio::test]
    async fn returns_raw_text_unparsed() {
        let llm = ScriptedCompletion::new(["not a literal at all"]);
        let mut sample = DataSample::new(vec!["order_id".to_string()]);
        sample.push_row(vec![json!(1)]);

        let raw = annotator(&llm).annotate("order records", &sample).await.unwrap();

        assert_eq!(raw, "not a literal at all");
        let prompt = &llm.prompts()[0];
        assert!(prompt.user.contains("order records"));
        assert!(prompt.user.contains("{\"order_id\": 1}"));
    }

    #[tokio::test]
    async fn dataset_context_reaches_the_prompt() {
        let llm = ScriptedCompletion::new(["x"]);
        annotator(&llm)
            .with_dataset_context(Some("Brazilian e-commerce orders.".to_string()))
            .annotate("orders", &DataSample::default())
            .await
            .unwrap();

        assert!(llm.prompts()[0].user.contains("Context: Brazilian e-commerce orders."));
    }

    #[tokio::test]
    async fn completion_errors_propagate() {
        let llm = ScriptedCompletion::default();
        let err = annotator(&llm).annotate("orders", &DataSample::default()).await.unwrap_err();
        assert!(matches!(err, AnnotatorError::Completion(CompletionError::Exhausted)));
    }
}
