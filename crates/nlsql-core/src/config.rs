//! Configuration schema (nlsql.toml)

use crate::dialect::SqlDialect;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Database connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQL dialect of the target database
    pub dialect: SqlDialect,

    pub host: String,

    /// Port; falls back to the dialect's default when unset
    pub port: Option<u16>,

    pub user: String,

    pub password: String,

    /// Database name
    pub name: String,

    /// Connect over TLS (PostgreSQL only)
    pub tls: bool,

    /// Per-query timeout in seconds
    pub timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            dialect: SqlDialect::default(),
            host: "localhost".to_string(),
            port: None,
            user: "postgres".to_string(),
            password: String::new(),
            name: "postgres".to_string(),
            tls: false,
            timeout_secs: 30,
        }
    }
}

impl DatabaseConfig {
    /// Port to connect to
    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or(match self.dialect {
            SqlDialect::MySql => 3306,
            SqlDialect::PostgreSql => 5432,
        })
    }

    /// tokio-postgres key/value connection string, every value single-quoted
    pub fn connection_string(&self) -> String {
        let mut conn = format!(
            "host={} port={} dbname={} user={}",
            quote_conn_value(&self.host),
            self.effective_port(),
            quote_conn_value(&self.name),
            quote_conn_value(&self.user)
        );
        if !self.password.is_empty() {
            conn.push_str(&format!(" password={}", quote_conn_value(&self.password)));
        }
        conn
    }

    /// mysql:// URL with percent-encoded credentials and database name
    pub fn mysql_url(&self) -> String {
        let user = urlencoding::encode(&self.user);
        let auth = if self.password.is_empty() {
            user.into_owned()
        } else {
            format!("{}:{}", user, urlencoding::encode(&self.password))
        };
        format!(
            "mysql://{}@{}:{}/{}",
            auth,
            self.host,
            self.effective_port(),
            urlencoding::encode(&self.name)
        )
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

fn quote_conn_value(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Completion provider settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// OpenAI-compatible chat completions endpoint
    pub base_url: String,

    pub model: String,

    /// Environment variable holding the API key
    pub api_key_env: String,

    pub temperature: f32,

    pub max_tokens: u32,

    /// Per-call timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            temperature: 0.0,
            max_tokens: 2048,
            timeout_secs: 60,
        }
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

/// Pacing strategy between annotation calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacingStrategy {
    /// No delay
    None,

    /// Start consecutive calls at least one interval apart
    FixedInterval,

    /// Allow bursts of `capacity` calls, refilling one token per interval
    TokenBucket,
}

/// Rate limiting settings for the knowledge base build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    pub strategy: PacingStrategy,

    pub interval_ms: u64,

    /// Bucket size for `token_bucket`
    pub capacity: u32,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            strategy: PacingStrategy::FixedInterval,
            interval_ms: 5000,
            capacity: 1,
        }
    }
}

impl PacingConfig {
    pub fn interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.interval_ms)
    }
}

/// Knowledge base build and load settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeBaseConfig {
    /// Where the knowledge base is saved and loaded from
    pub path: PathBuf,

    /// Rows sampled per table
    pub sample_size: usize,

    /// Free-text background about the dataset, added to annotation prompts
    pub dataset_context: Option<String>,

    pub pacing: PacingConfig,
}

impl Default for KnowledgeBaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("kb.json"),
            sample_size: 5,
            dataset_context: None,
            pacing: PacingConfig::default(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub knowledge_base: KnowledgeBaseConfig,

    /// Human-written purpose of each table, keyed by table name
    #[serde(default)]
    pub tables: BTreeMap<String, String>,

    /// Directory the config was loaded from (for resolving relative paths)
    #[serde(skip)]
    pub project_root: PathBuf,
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        let mut config = Self::from_toml(&contents)?;

        if let Some(parent) = path.parent() {
            config.project_root = parent.to_path_buf();
        }

        Ok(config)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_env_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides using `lookup` to read variables
    ///
    /// Recognised: `DB_DIALECT`, `DB_HOST`, `DB_PORT`, `DB_USER`,
    /// `DB_PASSWORD`, `DB_NAME`, `NLSQL_LLM_MODEL`, `NLSQL_LLM_BASE_URL`,
    /// `NLSQL_KB_PATH`.
    pub fn apply_env_overrides_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dialect) = lookup("DB_DIALECT") {
            self.database.dialect = dialect
                .parse()
                .map_err(|e: crate::dialect::UnknownDialect| ConfigError::InvalidValue(e.to_string()))?;
        }
        if let Some(host) = lookup("DB_HOST") {
            self.database.host = host;
        }
        if let Some(port) = lookup("DB_PORT") {
            let port = port.trim().parse::<u16>().map_err(|e| {
                ConfigError::InvalidValue(format!("DB_PORT '{}': {}", port, e))
            })?;
            self.database.port = Some(port);
        }
        if let Some(user) = lookup("DB_USER") {
            self.database.user = user;
        }
        if let Some(password) = lookup("DB_PASSWORD") {
            self.database.password = password;
        }
        if let Some(name) = lookup("DB_NAME") {
            self.database.name = name;
        }
        if let Some(model) = lookup("NLSQL_LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(url) = lookup("NLSQL_LLM_BASE_URL") {
            self.llm.base_url = url;
        }
        if let Some(path) = lookup("NLSQL_KB_PATH") {
            self.knowledge_base.path = PathBuf::from(path);
        }

        self.validate()
    }

    /// Knowledge base path, resolved against the config directory
    pub fn knowledge_base_path(&self) -> PathBuf {
        let path = &self.knowledge_base.path;
        if path.is_relative() && !self.project_root.as_os_str().is_empty() {
            self.project_root.join(path)
        } else {
            path.clone()
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.knowledge_base.sample_size == 0 {
            return Err(ConfigError::InvalidValue(
                "knowledge_base.sample_size must be at least 1".to_string(),
            ));
        }
        if self.knowledge_base.pacing.strategy == PacingStrategy::TokenBucket
            && self.knowledge_base.pacing.capacity == 0
        {
            return Err(ConfigError::InvalidValue(
                "knowledge_base.pacing.capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}
