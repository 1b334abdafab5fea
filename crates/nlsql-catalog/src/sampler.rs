//! Schema sampler trait for drawing random rows from a table

use nlsql_core::SqlDialect;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;

/// Rows drawn per table unless configured otherwise
pub const DEFAULT_SAMPLE_SIZE: usize = 5;

/// Errors that can occur while sampling a table
#[derive(Debug, Clone, thiserror::Error)]
pub enum DataAccessError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// A handful of rows from one table, in column order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataSample {
    /// Column names in table order
    pub columns: Vec<String>,

    /// Row values, each aligned with `columns`
    pub rows: Vec<Vec<Value>>,
}

impl DataSample {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row; missing trailing values are filled with null
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Null);
        self.rows.push(row);
    }

    /// Build from `(column, value)` rows; columns follow the first row
    pub fn from_records(records: Vec<Vec<(String, Value)>>) -> Self {
        let columns = records
            .first()
            .map(|r| r.iter().map(|(name, _)| name.clone()).collect())
            .unwrap_or_default();

        let mut sample = Self::new(columns);
        for record in records {
            let row = sample
                .columns
                .iter()
                .map(|col| {
                    record
                        .iter()
                        .find(|(name, _)| name == col)
                        .map(|(_, v)| v.clone())
                        .unwrap_or(Value::Null)
                })
                .collect();
            sample.rows.push(row);
        }
        sample
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of one column across all rows
    pub fn column_values(&self, column: &str) -> Option<Vec<&Value>> {
        let idx = self.columns.iter().position(|c| c == column)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// Render for the annotation prompt: one JSON object per line, keys in
    /// column order
    pub fn to_prompt_text(&self) -> String {
        if self.rows.is_empty() {
            let header = serde_json::to_string(&self.columns).unwrap_or_default();
            return format!("(no rows; columns: {})", header);
        }

        self.rows
            .iter()
            .map(|row| {
                let fields: Vec<String> = self
                    .columns
                    .iter()
                    .zip(row)
                    .map(|(col, value)| {
                        format!("{}: {}", Value::String(col.clone()), value)
                    })
                    .collect();
                format!("{{{}}}", fields.join(", "))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Trait for database backends that can sample table rows
#[async_trait::async_trait]
pub trait SchemaSampler: Send + Sync {
    /// Get the backend name (e.g., "PostgreSQL", "MySQL")
    fn name(&self) -> &'static str;

    /// Dialect used to build the sample query
    fn dialect(&self) -> SqlDialect;

    /// Draw `n` random rows from `table`
    ///
    /// Fewer rows come back when the table is smaller than `n`. A missing
    /// table or an unavailable connection is an error; nothing is retried.
    async fn sample(&self, table: &str, n: usize) -> Result<DataSample, DataAccessError>;

    /// Test the connection to the database
    async fn test_connection(&self) -> Result<(), DataAccessError>;
}

/// Reject a zero sample size before touching the database
pub fn check_sample_size(n: usize) -> Result<(), DataAccessError> {
    if n == 0 {
        return Err(DataAccessError::InvalidArgument(
            "sample size must be a positive integer".to_string(),
        ));
    }
    Ok(())
}

/// Map a driver error message onto the sampler error taxonomy
pub fn classify_error(table: &str, message: &str) -> DataAccessError {
    let lower = message.to_lowercase();
    if lower.contains("does not exist") || lower.contains("doesn't exist") {
        DataAccessError::TableNotFound(table.to_string())
    } else if lower.contains("connection") && (lower.contains("closed") || lower.contains("refused")) {
        DataAccessError::ConnectionFailed(message.to_string())
    } else {
        DataAccessError::QueryFailed(message.to_string())
    }
}

/// Run a database future with an upper bound on its duration
pub async fn with_timeout<T, F>(timeout: Duration, fut: F) -> Result<T, DataAccessError>
where
    F: Future<Output = Result<T, DataAccessError>>,
{
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| DataAccessError::Timeout(timeout))?
}
