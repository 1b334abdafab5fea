//! Per-request pipeline state

use crate::knowledge_base::KnowledgeBase;

/// State threaded through the router and the query synthesizer
///
/// One instance per request; never shared between requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineState {
    /// The user's question
    pub user_query: String,

    /// Router-selected names present in the knowledge base, in router order
    pub selected_tables: Vec<String>,

    /// Annotations of the selected tables that exist in the knowledge base
    pub filtered_kb: KnowledgeBase,

    /// Router-selected names missing from the knowledge base
    pub dropped_tables: Vec<String>,

    /// Generated SQL, empty until the synthesizer has run
    pub sql_query: String,
}

impl PipelineState {
    pub fn new(user_query: impl Into<String>) -> Self {
        Self {
            user_query: user_query.into(),
            ..Self::default()
        }
    }
}
