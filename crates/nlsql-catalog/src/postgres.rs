//! PostgreSQL sampler
//!
//! Draws random rows with `ORDER BY RANDOM()` over the simple query protocol,
//! so every value comes back as text regardless of the column type.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let sampler = PostgresSampler::connect(&config.database).await?;
//! let sample = sampler.sample("olist_orders_dataset", 5).await?;
//! ```

use crate::sampler::{DataAccessError, DataSample, SchemaSampler};
use nlsql_core::{DatabaseConfig, SqlDialect};
use std::time::Duration;

#[cfg(feature = "postgres")]
use crate::sampler::{check_sample_size, classify_error, with_timeout};

#[cfg(feature = "postgres")]
use tokio_postgres::{Client, NoTls, SimpleQueryMessage};

#[cfg(feature = "postgres")]
use postgres_native_tls::MakeTlsConnector;

#[cfg(feature = "postgres")]
use native_tls::TlsConnector;

/// PostgreSQL sampler
pub struct PostgresSampler {
    /// PostgreSQL client (only available with postgres feature)
    #[cfg(feature = "postgres")]
    client: Client,

    /// Connection host
    host: String,

    /// Connection port
    port: u16,

    /// Database name
    database: String,

    /// Upper bound for each query
    timeout: Duration,
}

impl PostgresSampler {
    /// Connect using the `[database]` section of the configuration
    ///
    /// Uses TLS when `database.tls` is set.
    #[cfg(feature = "postgres")]
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DataAccessError> {
        let conn_str = config.connection_string();
        let timeout = config.timeout();
        let host = config.host.clone();
        let port = config.effective_port();

        let client = with_timeout(timeout, async {
            if config.tls {
                let connector = TlsConnector::builder()
                    .build()
                    .map_err(|e| DataAccessError::ConfigError(format!(
                        "Failed to create TLS connector: {}", e
                    )))?;
                let tls = MakeTlsConnector::new(connector);

                let (client, connection) = tokio_postgres::connect(&conn_str, tls)
                    .await
                    .map_err(|e| DataAccessError::ConnectionFailed(format!(
                        "Failed to connect to PostgreSQL at {}:{} with TLS: {}",
                        host, port, e
                    )))?;

                let (h, p) = (host.clone(), port);
                tokio::spawn(async move {
                    if let Err(e) = connection.await {
                        tracing::error!("PostgreSQL TLS connection error ({}:{}): {}", h, p, e);
                    }
                });
                Ok::<_, DataAccessError>(client)
            } else {
                let (client, connection) = tokio_postgres::connect(&conn_str, NoTls)
                    .await
                    .map_err(|e| DataAccessError::ConnectionFailed(format!(
                        "Failed to connect to PostgreSQL at {}:{}: {}",
                        host, port, e
                    )))?;

                let (h, p) = (host.clone(), port);
                tokio::spawn(async move {
                    if let Err(e) = connection.await {
                        tracing::error!("PostgreSQL connection error ({}:{}): {}", h, p, e);
                    }
                });
                Ok::<_, DataAccessError>(client)
            }
        })
        .await?;

        tracing::info!(host = %config.host, port, database = %config.name, "connected to PostgreSQL");

        Ok(Self {
            client,
            host: config.host.clone(),
            port,
            database: config.name.clone(),
            timeout,
        })
    }

    /// Create sampler without postgres feature (returns error)
    #[cfg(not(feature = "postgres"))]
    pub async fn connect(_config: &DatabaseConfig) -> Result<Self, DataAccessError> {
        Err(DataAccessError::ConfigError(
            "PostgreSQL support not compiled. Rebuild with: cargo build --features postgres".to_string()
        ))
    }

    /// Get the connection host
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Get the connection port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Get the database name
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Per-query timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait::async_trait]
impl SchemaSampler for PostgresSampler {
    fn name(&self) -> &'static str {
        "PostgreSQL"
    }

    fn dialect(&self) -> SqlDialect {
        SqlDialect::PostgreSql
    }

    #[cfg(feature = "postgres")]
    async fn sample(&self, table: &str, n: usize) -> Result<DataSample, DataAccessError> {
        check_sample_size(n)?;
        let query = SqlDialect::PostgreSql.sample_query(table, n);
        tracing::debug!(%table, %query, "sampling table");

        let messages = with_timeout(self.timeout, async {
            self.client
                .simple_query(&query)
                .await
                .map_err(|e| classify_error(table, &e.to_string()))
        })
        .await?;

        let mut sample: Option<DataSample> = None;
        for message in messages {
            if let SimpleQueryMessage::Row(row) = message {
                let sample = sample.get_or_insert_with(|| {
                    DataSample::new(row.columns().iter().map(|c| c.name().to_string()).collect())
                });
                let values = (0..row.len())
                    .map(|idx| match row.get(idx) {
                        Some(text) => serde_json::Value::String(text.to_string()),
                        None => serde_json::Value::Null,
                    })
                    .collect();
                sample.push_row(values);
            }
        }

        Ok(sample.unwrap_or_default())
    }

    #[cfg(not(feature = "postgres"))]
    async fn sample(&self, _table: &str, _n: usize) -> Result<DataSample, DataAccessError> {
        Err(DataAccessError::ConfigError(
            "PostgreSQL support not compiled. Rebuild with: cargo build --features postgres".to_string()
        ))
    }

    #[cfg(feature = "postgres")]
    async fn test_connection(&self) -> Result<(), DataAccessError> {
        with_timeout(self.timeout, async {
            self.client
                .simple_query("SELECT 1")
                .await
                .map_err(|e| DataAccessError::QueryFailed(format!("Connection test failed: {}", e)))
        })
        .await?;
        Ok(())
    }

    #[cfg(not(feature = "postgres"))]
    async fn test_connection(&self) -> Result<(), DataAccessError> {
        Err(DataAccessError::ConfigError(
            "PostgreSQL support not compiled. Rebuild with: cargo build --features postgres".to_string()
        ))
    }
}
