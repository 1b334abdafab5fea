//! nlsql core
//!
//! Shared data contracts for the text-to-SQL pipeline: table annotations,
//! the knowledge base and its file format, per-request pipeline state, SQL
//! dialects, prompts and configuration.

pub mod annotation;
pub mod knowledge_base;
pub mod state;
pub mod dialect;
pub mod config;
pub mod prompt;

pub use annotation::{ColumnAnnotation, TableAnnotation, InvalidColumnEntry};
pub use knowledge_base::{KnowledgeBase, KnowledgeBaseError};
pub use state::PipelineState;
pub use prompt::Prompt;
pub use dialect::{SqlDialect, UnknownDialect};
pub use config::{
    Config, ConfigError, DatabaseConfig, LlmConfig, KnowledgeBaseConfig, PacingConfig, PacingStrategy,
};
