//! Knowledge base: table name -> annotation, persisted as JSON
//!
//! The on-disk layout keeps each table as a two-element array, matching what
//! the annotation model emits:
//!
//! ```json
//! {
//!   "orders": ["Orders table.", [["order_id: numeric id, sample values: 1, 2"]]]
//! }
//! ```
//!
//! Tables that failed to annotate are written as `["", []]`. A bare `[]` is
//! also accepted on load.

use crate::annotation::{ColumnAnnotation, InvalidColumnEntry, TableAnnotation};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Errors raised while loading or saving a knowledge base
#[derive(Debug, thiserror::Error)]
pub enum KnowledgeBaseError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Read-only mapping from table name to its annotation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnowledgeBase {
    tables: BTreeMap<String, TableAnnotation>,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a list of annotations, keyed by their table names
    pub fn from_annotations(annotations: impl IntoIterator<Item = TableAnnotation>) -> Self {
        let mut kb = Self::new();
        for annotation in annotations {
            kb.insert(annotation);
        }
        kb
    }

    /// Insert an annotation, replacing any previous entry for the table
    pub fn insert(&mut self, annotation: TableAnnotation) -> Option<TableAnnotation> {
        self.tables.insert(annotation.table_name.clone(), annotation)
    }

    pub fn get(&self, table: &str) -> Option<&TableAnnotation> {
        self.tables.get(table)
    }

    pub fn contains(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Table names in sorted order
    pub fn table_names(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &TableAnnotation)> {
        self.tables.iter()
    }

    /// Table-level descriptions only, as handed to the router
    pub fn table_descriptions(&self) -> BTreeMap<String, String> {
        self.tables
            .iter()
            .map(|(name, table)| (name.clone(), table.description.clone()))
            .collect()
    }

    /// Restrict to the given table names
    ///
    /// Returns the subset plus the requested names that are not present,
    /// deduplicated, in request order.
    pub fn filter(&self, names: &[String]) -> (KnowledgeBase, Vec<String>) {
        let mut subset = KnowledgeBase::new();
        let mut missing: Vec<String> = Vec::new();

        for name in names {
            match self.tables.get(name) {
                Some(table) => {
                    subset.insert(table.clone());
                }
                None => {
                    if !missing.contains(name) {
                        missing.push(name.clone());
                    }
                }
            }
        }

        (subset, missing)
    }

    /// Convert to the on-disk JSON value
    pub fn to_json_value(&self) -> Value {
        let map = self
            .tables
            .iter()
            .map(|(name, table)| {
                let columns: Vec<Value> = table
                    .columns
                    .iter()
                    .map(|c| Value::Array(vec![Value::String(c.to_entry())]))
                    .collect();
                let entry = Value::Array(vec![
                    Value::String(table.description.clone()),
                    Value::Array(columns),
                ]);
                (name.clone(), entry)
            })
            .collect();
        Value::Object(map)
    }

    /// Serialize as pretty-printed JSON
    pub fn to_json_string(&self) -> Result<String, KnowledgeBaseError> {
        Ok(serde_json::to_string_pretty(&self.to_json_value())?)
    }

    /// Parse the on-disk JSON layout
    ///
    /// A table whose entry is malformed loads as an empty annotation so the
    /// rest of the knowledge base stays usable.
    pub fn from_json_str(json: &str) -> Result<Self, KnowledgeBaseError> {
        let raw: BTreeMap<String, Value> = serde_json::from_str(json)?;
        let mut kb = KnowledgeBase::new();

        for (table, value) in raw {
            let annotation = parse_entry(&table, &value).unwrap_or_else(|reason| {
                tracing::warn!(%table, %reason, "invalid knowledge base entry, loading it as empty");
                TableAnnotation::empty(&table)
            });
            kb.insert(annotation);
        }

        Ok(kb)
    }

    /// Load from a file written by [`KnowledgeBase::save`]
    pub fn load(path: &Path) -> Result<Self, KnowledgeBaseError> {
        let contents = std::fs::read_to_string(path).map_err(|source| KnowledgeBaseError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    /// Write to `path`, replacing any existing file
    pub fn save(&self, path: &Path) -> Result<(), KnowledgeBaseError> {
        let json = self.to_json_string()?;
        std::fs::write(path, json).map_err(|source| KnowledgeBaseError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}

fn parse_entry(table: &str, value: &Value) -> Result<TableAnnotation, String> {
    let items = value
        .as_array()
        .ok_or_else(|| "expected a [description, columns] array".to_string())?;

    match items.as_slice() {
        [] => Ok(TableAnnotation::empty(table)),
        [Value::String(description), Value::Array(columns)] => {
            let columns = columns
                .iter()
                .map(|column| parse_column(column).map_err(|e| e.to_string()))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(TableAnnotation::new(table, description.clone(), columns))
        }
        other => Err(format!(
            "expected [description, columns], found {} element(s)",
            other.len()
        )),
    }
}

fn parse_column(value: &Value) -> Result<ColumnAnnotation, InvalidColumnEntry> {
    match value {
        Value::String(entry) => ColumnAnnotation::parse_entry(entry),
        Value::Array(parts) => match parts.as_slice() {
            [Value::String(entry)] => ColumnAnnotation::parse_entry(entry),
            _ => Err(InvalidColumnEntry {
                entry: value.to_string(),
                reason: "expected a single-string list".to_string(),
            }),
        },
        _ => Err(InvalidColumnEntry {
            entry: value.to_string(),
            reason: "expected a string".to_string(),
        }),
    }
}
