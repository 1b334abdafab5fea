//! Knowledge base builder
//!
//! Batch job that samples every configured table, asks the annotator for a
//! description and parses the answer. A table that fails at any step is
//! recorded with an empty annotation and the batch moves on; only saving
//! the finished knowledge base can fail the build.

use crate::annotator::{AnnotatorError, TableAnnotator};
use crate::literal::{parse_annotation, AnnotationParseError};
use crate::pacing::{NoPacing, Pacer};
use nlsql_catalog::{DataAccessError, SchemaSampler, DEFAULT_SAMPLE_SIZE};
use nlsql_core::{KnowledgeBase, KnowledgeBaseError, TableAnnotation};
use nlsql_llm::CompletionError;
use nlsql_prompt::PromptError;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Error that aborts a build
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Failed to save knowledge base: {0}")]
    Persist(#[from] KnowledgeBaseError),

    #[error("Failed to render annotation prompt: {0}")]
    Prompt(#[from] PromptError),
}

/// Why a single table ended up with an empty annotation
#[derive(Debug, thiserror::Error)]
pub enum TableFailure {
    #[error("sampling failed: {0}")]
    Sample(#[from] DataAccessError),

    #[error("annotation request failed: {0}")]
    Completion(#[from] CompletionError),

    #[error("annotation could not be parsed: {0}")]
    Parse(#[from] AnnotationParseError),
}

/// Outcome of a build
#[derive(Debug, Default)]
pub struct BuildReport {
    /// One entry per requested table, empty for failed ones
    pub knowledge_base: KnowledgeBase,

    /// Failed tables in processing order
    pub failures: Vec<(String, TableFailure)>,
}

impl BuildReport {
    pub fn failed_tables(&self) -> Vec<&str> {
        self.failures.iter().map(|(table, _)| table.as_str()).collect()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct KnowledgeBaseBuilder {
    sampler: Arc<dyn SchemaSampler>,
    annotator: TableAnnotator,
    pacer: Arc<dyn Pacer>,
    sample_size: usize,
}

impl KnowledgeBaseBuilder {
    /// Builder without pacing, sampling [`DEFAULT_SAMPLE_SIZE`] rows per table
    pub fn new(sampler: Arc<dyn SchemaSampler>, annotator: TableAnnotator) -> Self {
        Self {
            sampler,
            annotator,
            pacer: Arc::new(NoPacing),
            sample_size: DEFAULT_SAMPLE_SIZE,
        }
    }

    pub fn with_pacer(mut self, pacer: Arc<dyn Pacer>) -> Self {
        self.pacer = pacer;
        self
    }

    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = sample_size;
        self
    }

    /// Annotate every table and save the result to `save_path`
    ///
    /// An existing file at `save_path` is overwritten.
    pub async fn build(
        &self,
        table_purposes: &BTreeMap<String, String>,
        save_path: &Path,
    ) -> Result<BuildReport, BuildError> {
        let report = self.build_in_memory(table_purposes).await?;
        report.knowledge_base.save(save_path)?;

        tracing::info!(
            path = %save_path.display(),
            tables = report.knowledge_base.len(),
            failed = report.failures.len(),
            "knowledge base saved"
        );
        Ok(report)
    }

    /// Annotate every table without saving
    pub async fn build_in_memory(
        &self,
        table_purposes: &BTreeMap<String, String>,
    ) -> Result<BuildReport, BuildError> {
        let mut report = BuildReport::default();
        let total = table_purposes.len();

        for (index, (table, purpose)) in table_purposes.iter().enumerate() {
            self.pacer.pace().await;
            tracing::info!(table = %table, "annotating table {}/{}", index + 1, total);

            let annotation = match self.annotate_table(table, purpose).await {
                Ok(annotation) => annotation,
                Err(AnnotateFailure::Fatal(e)) => return Err(BuildError::Prompt(e)),
                Err(AnnotateFailure::Table(failure)) => {
                    tracing::warn!(table = %table, error = %failure, "recording empty annotation");
                    report.failures.push((table.clone(), failure));
                    TableAnnotation::empty(table.as_str())
                }
            };
            report.knowledge_base.insert(annotation);
        }

        Ok(report)
    }

    async fn annotate_table(&self, table: &str, purpose: &str) -> Result<TableAnnotation, AnnotateFailure> {
        let sample = self
            .sampler
            .sample(table, self.sample_size)
            .await
            .map_err(TableFailure::from)?;

        let raw = self.annotator.annotate(purpose, &sample).await.map_err(|e| match e {
            AnnotatorError::Prompt(e) => AnnotateFailure::Fatal(e),
            AnnotatorError::Completion(e) => AnnotateFailure::Table(e.into()),
        })?;
        tracing::debug!(table = %table, raw = %raw, "annotator response");

        let annotation = parse_annotation(table, &raw).map_err(TableFailure::from)?;
        tracing::debug!(table = %table, columns = annotation.columns.len(), "annotation parsed");
        Ok(annotation)
    }
}

enum AnnotateFailure {
    Fatal(PromptError),
    Table(TableFailure),
}

impl From<TableFailure> for AnnotateFailure {
    fn from(failure: TableFailure) -> Self {
        AnnotateFailure::Table(failure)
    }
}
