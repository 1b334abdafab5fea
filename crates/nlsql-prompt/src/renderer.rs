//! Template environment and typed render helpers

use crate::templates;
use minijinja::{context, AutoEscape, Environment, ErrorKind, UndefinedBehavior};
use nlsql_core::{KnowledgeBase, Prompt, SqlDialect};
use serde::Serialize;
use std::collections::BTreeMap;

/// Error while rendering a prompt
#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("Unknown template: {0}")]
    UnknownTemplate(String),

    #[error("Template render error in '{template}': {message}")]
    Render { template: String, message: String },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Renders the pipeline's prompts
///
/// Undefined variables are errors, so a template and its caller cannot drift
/// apart silently.
pub struct PromptRenderer {
    env: Environment<'static>,
}

impl PromptRenderer {
    /// Create a renderer with all built-in templates registered
    pub fn new() -> Result<Self, PromptError> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_trim_blocks(true);

        for &(name, source) in templates::ALL {
            env.add_template(name, source)
                .map_err(|e| Self::convert_error(name, e))?;
        }

        Ok(Self { env })
    }

    /// Render a single registered template
    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<String, PromptError> {
        let template = self
            .env
            .get_template(name)
            .map_err(|e| Self::convert_error(name, e))?;
        template
            .render(ctx)
            .map(|text| text.trim().to_string())
            .map_err(|e| Self::convert_error(name, e))
    }

    /// Prompt asking for a table annotation
    pub fn annotation(
        &self,
        description: &str,
        data_sample: &str,
        dataset_context: Option<&str>,
    ) -> Result<Prompt, PromptError> {
        let ctx = context! {
            description => description,
            data_sample => data_sample,
            dataset_context => dataset_context,
        };
        Ok(Prompt::new(
            self.render(templates::ANNOTATE_SYSTEM, &ctx)?,
            self.render(templates::ANNOTATE_USER, &ctx)?,
        ))
    }

    /// Prompt asking which tables answer `question`
    pub fn routing(
        &self,
        question: &str,
        table_descriptions: &BTreeMap<String, String>,
    ) -> Result<Prompt, PromptError> {
        let ctx = context! {
            table_descriptions => serde_json::to_string(table_descriptions)?,
            question => question,
        };
        Ok(Prompt::new(
            self.render(templates::ROUTE_SYSTEM, &ctx)?,
            self.render(templates::ROUTE_USER, &ctx)?,
        ))
    }

    /// Prompt asking for one SQL query over the filtered knowledge base
    pub fn sql_generation(
        &self,
        question: &str,
        filtered_kb: &KnowledgeBase,
        dialect: SqlDialect,
    ) -> Result<Prompt, PromptError> {
        let ctx = context! {
            schema => schema_document(filtered_kb)?,
            dialect => dialect.as_str(),
            question => question,
        };
        Ok(Prompt::new(
            self.render(templates::SQLGEN_SYSTEM, &ctx)?,
            self.render(templates::SQLGEN_USER, &ctx)?,
        ))
    }

    fn convert_error(name: &str, error: minijinja::Error) -> PromptError {
        match error.kind() {
            ErrorKind::TemplateNotFound => PromptError::UnknownTemplate(name.to_string()),
            _ => PromptError::Render {
                template: name.to_string(),
                message: error.to_string(),
            },
        }
    }
}

/// Schema text shown to the SQL generator: table name to description and
/// annotated columns, as pretty JSON
pub fn schema_document(kb: &KnowledgeBase) -> Result<String, serde_json::Error> {
    let tables: BTreeMap<&str, serde_json::Value> = kb
        .iter()
        .map(|(name, table)| {
            (
                name.as_str(),
                serde_json::json!({
                    "description": table.description,
                    "columns": table.columns,
                }),
            )
        })
        .collect();
    serde_json::to_string_pretty(&tables)
}
