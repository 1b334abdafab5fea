//! MySQL sampler
//!
//! Draws random rows with `ORDER BY RAND()` over the text protocol.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let sampler = MySqlSampler::connect(&config.database).await?;
//! let sample = sampler.sample("olist_orders_dataset", 5).await?;
//! ```

use crate::sampler::{DataAccessError, DataSample, SchemaSampler};
use nlsql_core::{DatabaseConfig, SqlDialect};
use std::time::Duration;

#[cfg(feature = "mysql")]
use crate::sampler::{check_sample_size, classify_error, with_timeout};

#[cfg(feature = "mysql")]
use mysql_async::{prelude::Queryable, Opts, Pool, Row, Value as MyValue};

/// MySQL sampler backed by a connection pool
pub struct MySqlSampler {
    #[cfg(feature = "mysql")]
    pool: Pool,

    host: String,

    port: u16,

    database: String,

    /// Upper bound for each query
    timeout: Duration,
}

impl MySqlSampler {
    /// Connect using the `[database]` section of the configuration
    #[cfg(feature = "mysql")]
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DataAccessError> {
        let opts = Opts::from_url(&config.mysql_url())
            .map_err(|e| DataAccessError::ConfigError(format!("Invalid MySQL URL: {}", e)))?;

        let sampler = Self {
            pool: Pool::new(opts),
            host: config.host.clone(),
            port: config.effective_port(),
            database: config.name.clone(),
            timeout: config.timeout(),
        };

        // The pool connects lazily; fail early on bad credentials
        sampler.test_connection().await?;
        tracing::info!(host = %sampler.host, port = sampler.port, database = %sampler.database, "connected to MySQL");

        Ok(sampler)
    }

    /// Create sampler without mysql feature (returns error)
    #[cfg(not(feature = "mysql"))]
    pub async fn connect(_config: &DatabaseConfig) -> Result<Self, DataAccessError> {
        Err(DataAccessError::ConfigError(
            "MySQL support not compiled. Rebuild with: cargo build --features mysql".to_string()
        ))
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// Per-query timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Close all pooled connections
    #[cfg(feature = "mysql")]
    pub async fn disconnect(self) -> Result<(), DataAccessError> {
        self.pool
            .disconnect()
            .await
            .map_err(|e| DataAccessError::ConnectionFailed(e.to_string()))
    }
}

#[cfg(feature = "mysql")]
fn to_json(value: &MyValue) -> serde_json::Value {
    match value {
        MyValue::NULL => serde_json::Value::Null,
        MyValue::Bytes(bytes) => serde_json::Value::String(String::from_utf8_lossy(bytes).into_owned()),
        MyValue::Int(i) => serde_json::Value::from(*i),
        MyValue::UInt(u) => serde_json::Value::from(*u),
        MyValue::Float(f) => serde_json::Value::from(*f as f64),
        MyValue::Double(d) => serde_json::Value::from(*d),
        other => serde_json::Value::String(other.as_sql(true).trim_matches('\'').to_string()),
    }
}

#[async_trait::async_trait]
impl SchemaSampler for MySqlSampler {
    fn name(&self) -> &'static str {
        "MySQL"
    }

    fn dialect(&self) -> SqlDialect {
        SqlDialect::MySql
    }

    #[cfg(feature = "mysql")]
    async fn sample(&self, table: &str, n: usize) -> Result<DataSample, DataAccessError> {
        check_sample_size(n)?;
        let query = SqlDialect::MySql.sample_query(table, n);
        tracing::debug!(%table, %query, "sampling table");

        let rows: Vec<Row> = with_timeout(self.timeout, async {
            let mut conn = self
                .pool
                .get_conn()
                .await
                .map_err(|e| DataAccessError::ConnectionFailed(e.to_string()))?;
            conn.query(query.as_str())
                .await
                .map_err(|e| classify_error(table, &e.to_string()))
        })
        .await?;

        let Some(first) = rows.first() else {
            return Ok(DataSample::default());
        };

        let mut sample = DataSample::new(
            first
                .columns_ref()
                .iter()
                .map(|c| c.name_str().into_owned())
                .collect(),
        );
        for row in &rows {
            let values = (0..row.len())
                .map(|idx| row.as_ref(idx).map(to_json).unwrap_or(serde_json::Value::Null))
                .collect();
            sample.push_row(values);
        }

        Ok(sample)
    }

    #[cfg(not(feature = "mysql"))]
    async fn sample(&self, _table: &str, _n: usize) -> Result<DataSample, DataAccessError> {
        Err(DataAccessError::ConfigError(
            "MySQL support not compiled. Rebuild with: cargo build --features mysql".to_string()
        ))
    }

    #[cfg(feature = "mysql")]
    async fn test_connection(&self) -> Result<(), DataAccessError> {
        with_timeout(self.timeout, async {
            let mut conn = self
                .pool
                .get_conn()
                .await
                .map_err(|e| DataAccessError::ConnectionFailed(e.to_string()))?;
            conn.query_drop("SELECT 1")
                .await
                .map_err(|e| DataAccessError::QueryFailed(format!("Connection test failed: {}", e)))
        })
        .await
    }

    #[cfg(not(feature = "mysql"))]
    async fn test_connection(&self) -> Result<(), DataAccessError> {
        Err(DataAccessError::ConfigError(
            "MySQL support not compiled. Rebuild with: cargo build --features mysql".to_string()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(feature = "mysql"))]
    #[tokio::test]
    async fn connect_without_feature_fails() {
        let result = MySqlSampler::connect(&DatabaseConfig::default()).await;
        assert!(matches!(result, Err(DataAccessError::ConfigError(_))));
    }

    #[cfg(feature = "mysql")]
    #[tokio::test]
    async fn timeout_comes_from_config() {
        let config = DatabaseConfig {
            dialect: SqlDialect::MySql,
            timeout_secs: 7,
            ..DatabaseConfig::default()
        };
        // The pool connects lazily, so no server is needed here
        let sampler = MySqlSampler {
            pool: Pool::new(Opts::from_url(&config.mysql_url()).unwrap()),
            host: config.host.clone(),
            port: config.effective_port(),
            database: config.name.clone(),
            timeout: config.timeout(),
        };
        assert_eq!(sampler.timeout(), Duration::from_secs(7));
        assert_eq!(sampler.port(), 3306);
    }

    #[cfg(feature = "mysql")]
    #[test]
    fn value_conversion() {
        assert_eq!(to_json(&MyValue::NULL), serde_json::Value::Null);
        assert_eq!(to_json(&MyValue::Int(-3)), serde_json::json!(-3));
        assert_eq!(to_json(&MyValue::Bytes(b"SP".to_vec())), serde_json::json!("SP"));
    }
}
