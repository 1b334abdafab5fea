//! Mock sampler for testing
//!
//! Returns predefined rows without connecting to any database. Useful for
//! unit tests of the knowledge base builder, demos without credentials and
//! simulating per-table failures.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use nlsql_catalog::{MockSampler, SchemaSampler, DataSample};
//!
//! let sampler = MockSampler::new();
//! sampler.add_sample("orders", sample).await;
//!
//! let rows = sampler.sample("orders", 5).await?;
//! ```

use crate::sampler::{check_sample_size, DataAccessError, DataSample, SchemaSampler};
use nlsql_core::SqlDialect;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory sampler
///
/// `sample(table, n)` returns the first `n` stored rows for the table. State
/// is shared between clones.
pub struct MockSampler {
    /// Stored rows by table name
    samples: Arc<RwLock<HashMap<String, DataSample>>>,

    /// Errors to return for specific tables
    errors: Arc<RwLock<HashMap<String, DataAccessError>>>,

    /// Number of `sample` calls made
    calls: Arc<AtomicUsize>,

    /// Simulate connection failure
    fail_connection: bool,

    /// Simulate query latency (milliseconds)
    latency_ms: u64,

    dialect: SqlDialect,
}

impl MockSampler {
    /// Create a new mock sampler with no tables
    pub fn new() -> Self {
        Self {
            samples: Arc::new(RwLock::new(HashMap::new())),
            errors: Arc::new(RwLock::new(HashMap::new())),
            calls: Arc::new(AtomicUsize::new(0)),
            fail_connection: false,
            latency_ms: 0,
            dialect: SqlDialect::PostgreSql,
        }
    }

    /// Create a mock sampler from a pre-built map of samples
    pub fn from_samples(samples: HashMap<String, DataSample>) -> Self {
        let sampler = Self::new();
        Self {
            samples: Arc::new(RwLock::new(samples)),
            ..sampler
        }
    }

    /// Store rows for a table
    pub async fn add_sample(&self, table: impl Into<String>, sample: DataSample) {
        self.samples.write().await.insert(table.into(), sample);
    }

    /// Configure an error to be returned for a specific table
    pub async fn add_error_for_table(&self, table: impl Into<String>, error: DataAccessError) {
        self.errors.write().await.insert(table.into(), error);
    }

    /// Configure to fail all connection tests
    pub fn with_connection_failure(mut self) -> Self {
        self.fail_connection = true;
        self
    }

    /// Configure simulated latency for all operations
    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// Report a different dialect
    pub fn with_dialect(mut self, dialect: SqlDialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Number of `sample` calls received so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Get all table names that have samples
    pub async fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.samples.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    async fn simulate_latency(&self) {
        if self.latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.latency_ms)).await;
        }
    }
}

impl Default for MockSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MockSampler {
    fn clone(&self) -> Self {
        Self {
            samples: Arc::clone(&self.samples),
            errors: Arc::clone(&self.errors),
            calls: Arc::clone(&self.calls),
            fail_connection: self.fail_connection,
            latency_ms: self.latency_ms,
            dialect: self.dialect,
        }
    }
}

#[async_trait::async_trait]
impl SchemaSampler for MockSampler {
    fn name(&self) -> &'static str {
        "Mock"
    }

    fn dialect(&self) -> SqlDialect {
        self.dialect
    }

    async fn sample(&self, table: &str, n: usize) -> Result<DataSample, DataAccessError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        check_sample_size(n)?;
        self.simulate_latency().await;

        if let Some(error) = self.errors.read().await.get(table) {
            return Err(error.clone());
        }

        let samples = self.samples.read().await;
        let stored = samples
            .get(table)
            .ok_or_else(|| DataAccessError::TableNotFound(table.to_string()))?;

        Ok(DataSample {
            columns: stored.columns.clone(),
            rows: stored.rows.iter().take(n).cloned().collect(),
        })
    }

    async fn test_connection(&self) -> Result<(), DataAccessError> {
        self.simulate_latency().await;

        if self.fail_connection {
            Err(DataAccessError::ConnectionFailed(
                "Simulated connection failure".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}
