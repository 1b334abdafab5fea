//! Pipeline controller: router, then synthesizer
//!
//! The knowledge base is loaded once and shared read-only; every request
//! owns its own [`PipelineState`].

use crate::router::{Router, RouterError};
use crate::synthesizer::{GenerationError, QuerySynthesizer};
use nlsql_core::{KnowledgeBase, PipelineState, SqlDialect};
use nlsql_llm::CompletionService;
use nlsql_prompt::{PromptError, PromptRenderer};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Routing(#[from] RouterError),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

pub struct Pipeline {
    knowledge_base: Arc<KnowledgeBase>,

    /// Router input, computed once from the knowledge base
    table_descriptions: BTreeMap<String, String>,

    router: Router,
    synthesizer: QuerySynthesizer,
    dialect: SqlDialect,
}

impl Pipeline {
    pub fn new(
        knowledge_base: Arc<KnowledgeBase>,
        router: Router,
        synthesizer: QuerySynthesizer,
        dialect: SqlDialect,
    ) -> Self {
        let table_descriptions = knowledge_base.table_descriptions();
        Self {
            knowledge_base,
            table_descriptions,
            router,
            synthesizer,
            dialect,
        }
    }

    /// Wire a router and a synthesizer to the same completion service
    pub fn with_service(
        knowledge_base: Arc<KnowledgeBase>,
        llm: Arc<dyn CompletionService>,
        dialect: SqlDialect,
    ) -> Result<Self, PromptError> {
        let prompts = Arc::new(PromptRenderer::new()?);
        Ok(Self::new(
            knowledge_base,
            Router::new(llm.clone(), prompts.clone()),
            QuerySynthesizer::new(llm, prompts),
            dialect,
        ))
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.knowledge_base
    }

    pub fn dialect(&self) -> SqlDialect {
        self.dialect
    }

    /// Route only, without generating SQL
    pub async fn select_tables(&self, user_query: &str) -> Result<PipelineState, PipelineError> {
        let mut state = PipelineState::new(user_query);
        self.route(&mut state).await?;
        Ok(state)
    }

    /// Answer a question, returning the full request state
    pub async fn run(&self, user_query: &str) -> Result<PipelineState, PipelineError> {
        let mut state = PipelineState::new(user_query);
        self.route(&mut state).await?;
        self.generate(&mut state).await?;
        Ok(state)
    }

    /// Answer a question, returning only the SQL
    pub async fn answer(&self, user_query: &str) -> Result<String, PipelineError> {
        Ok(self.run(user_query).await?.sql_query)
    }

    async fn route(&self, state: &mut PipelineState) -> Result<(), PipelineError> {
        let routed = self
            .router
            .route(&state.user_query, &self.table_descriptions)
            .await?;

        let (filtered_kb, dropped) = self.knowledge_base.filter(&routed);
        if !dropped.is_empty() {
            tracing::warn!(?dropped, "router selected tables missing from the knowledge base");
        }

        let mut selected: Vec<String> = Vec::with_capacity(filtered_kb.len());
        for name in routed {
            if filtered_kb.contains(&name) && !selected.contains(&name) {
                selected.push(name);
            }
        }

        state.selected_tables = selected;
        state.filtered_kb = filtered_kb;
        state.dropped_tables = dropped;
        Ok(())
    }

    async fn generate(&self, state: &mut PipelineState) -> Result<(), PipelineError> {
        state.sql_query = self
            .synthesizer
            .synthesize(&state.user_query, &state.filtered_kb, self.dialect)
            .await?;
        Ok(())
    }
}
