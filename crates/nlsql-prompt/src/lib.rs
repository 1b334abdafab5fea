//! Prompt templates for the text-to-SQL pipeline
//!
//! Three single-turn conversations are rendered here with MiniJinja:
//! - table annotation (knowledge base build)
//! - routing a question to the relevant tables
//! - SQL generation over the routed tables

pub mod templates;
pub mod renderer;

pub use renderer::{PromptRenderer, PromptError, schema_document};
