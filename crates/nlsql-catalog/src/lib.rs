//! Database samplers for knowledge base construction
//!
//! A sampler draws a few random rows from a table so the annotation model can
//! see real values. Only read queries are issued.
//!
//! ## Features
//!
//! Enable database support via Cargo features:
//! - `postgres` - PostgreSQL support (`ORDER BY RANDOM()`)
//! - `mysql` - MySQL support (`ORDER BY RAND()`)
//! - `all-databases` - Both backends
//!
//! The in-memory [`MockSampler`] is always available.
//!
//! ## Example
//!
//! ```rust,ignore
//! use nlsql_catalog::{connect, SchemaSampler, DEFAULT_SAMPLE_SIZE};
//!
//! let sampler = connect(&config.database).await?;
//! let sample = sampler.sample("olist_orders_dataset", DEFAULT_SAMPLE_SIZE).await?;
//! ```

pub mod sampler;
pub mod postgres;
pub mod mysql;
pub mod mock;

pub use sampler::{DataAccessError, DataSample, SchemaSampler, DEFAULT_SAMPLE_SIZE};
pub use postgres::PostgresSampler;
pub use mysql::MySqlSampler;
pub use mock::MockSampler;

use nlsql_core::{DatabaseConfig, SqlDialect};

/// Connect the sampler matching the configured dialect
pub async fn connect(config: &DatabaseConfig) -> Result<Box<dyn SchemaSampler>, DataAccessError> {
    match config.dialect {
        SqlDialect::PostgreSql => Ok(Box::new(PostgresSampler::connect(config).await?)),
        SqlDialect::MySql => Ok(Box::new(MySqlSampler::connect(config).await?)),
    }
}
