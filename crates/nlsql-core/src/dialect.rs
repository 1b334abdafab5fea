//! SQL dialects supported for sampling and generation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Target SQL dialect
///
/// The dialect label is passed verbatim into the generation prompt. The only
/// dialect-specific logic on our side is how rows are sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlDialect {
    /// MySQL / MariaDB
    #[serde(rename = "mysql")]
    MySql,

    /// PostgreSQL
    #[serde(rename = "postgresql", alias = "postgres")]
    PostgreSql,
}

impl Default for SqlDialect {
    fn default() -> Self {
        Self::PostgreSql
    }
}

impl SqlDialect {
    /// Label used in configuration files and prompts
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MySql => "mysql",
            Self::PostgreSql => "postgresql",
        }
    }

    /// Function producing a random ordering key
    pub fn random_function(&self) -> &'static str {
        match self {
            Self::MySql => "RAND()",
            Self::PostgreSql => "RANDOM()",
        }
    }

    /// Quote an identifier, escaping embedded quote characters
    pub fn quote_identifier(&self, ident: &str) -> String {
        match self {
            Self::MySql => format!("`{}`", ident.replace('`', "``")),
            Self::PostgreSql => format!("\"{}\"", ident.replace('"', "\"\"")),
        }
    }

    /// Build the query that draws `n` random rows from `table`
    pub fn sample_query(&self, table: &str, n: usize) -> String {
        format!(
            "SELECT * FROM {} ORDER BY {} LIMIT {}",
            self.quote_identifier(table),
            self.random_function(),
            n
        )
    }
}

impl fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a dialect label is not recognised
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported SQL dialect '{0}': only 'mysql' and 'postgresql' are supported")]
pub struct UnknownDialect(pub String);

impl FromStr for SqlDialect {
    type Err = UnknownDialect;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mysql" => Ok(Self::MySql),
            "postgresql" | "postgres" => Ok(Self::PostgreSql),
            other => Err(UnknownDialect(other.to_string())),
        }
    }
}
