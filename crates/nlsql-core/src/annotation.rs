//! Table and column annotations produced by the knowledge base builder

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Annotation for a single column
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnAnnotation {
    /// Column name
    pub column_name: String,

    /// What the column holds
    pub description: String,

    /// One or two representative values, as text
    pub sample_values: Vec<String>,
}

/// Error returned when a free-form column entry cannot be split into parts
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid column entry '{entry}': {reason}")]
pub struct InvalidColumnEntry {
    pub entry: String,
    pub reason: String,
}

fn sample_marker() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| Regex::new(r"(?i)sample\s+values?\s*:").expect("valid sample marker regex"))
}

impl ColumnAnnotation {
    pub fn new(
        column_name: impl Into<String>,
        description: impl Into<String>,
        sample_values: Vec<String>,
    ) -> Self {
        Self {
            column_name: column_name.into(),
            description: description.into(),
            sample_values,
        }
    }

    /// Parse a knowledge base column entry
    ///
    /// Entries look like `"<column_name>: description, sample values: v1, v2"`.
    /// The column name is everything before the first `:`. The last
    /// `sample values:` marker separates the description from the values;
    /// without a marker the whole remainder is the description.
    pub fn parse_entry(entry: &str) -> Result<Self, InvalidColumnEntry> {
        let invalid = |reason: &str| InvalidColumnEntry {
            entry: entry.to_string(),
            reason: reason.to_string(),
        };

        let (name, rest) = entry
            .split_once(':')
            .ok_or_else(|| invalid("missing ':' after column name"))?;

        let column_name = name.trim();
        if column_name.is_empty() {
            return Err(invalid("empty column name"));
        }

        let (description, sample_values) = match sample_marker().find_iter(rest).last() {
            Some(marker) => {
                let values = rest[marker.end()..]
                    .split(',')
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(str::to_string)
                    .collect();
                (&rest[..marker.start()], values)
            }
            None => (rest, Vec::new()),
        };

        let description = description.trim().trim_end_matches(',').trim_end();

        Ok(Self::new(column_name, description, sample_values))
    }

    /// Render back into the knowledge base entry form
    pub fn to_entry(&self) -> String {
        if self.sample_values.is_empty() {
            format!("{}: {}", self.column_name, self.description)
        } else {
            format!(
                "{}: {}, sample values: {}",
                self.column_name,
                self.description,
                self.sample_values.join(", ")
            )
        }
    }
}

/// Annotation for a whole table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableAnnotation {
    /// Table name (unique key in the knowledge base)
    pub table_name: String,

    /// Table-level description
    pub description: String,

    /// Column annotations in the order the model produced them
    pub columns: Vec<ColumnAnnotation>,
}

impl TableAnnotation {
    pub fn new(
        table_name: impl Into<String>,
        description: impl Into<String>,
        columns: Vec<ColumnAnnotation>,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            description: description.into(),
            columns,
        }
    }

    /// Placeholder recorded when a table could not be annotated
    pub fn empty(table_name: impl Into<String>) -> Self {
        Self::new(table_name, "", Vec::new())
    }

    /// True for the placeholder produced by [`TableAnnotation::empty`]
    pub fn is_empty(&self) -> bool {
        self.description.is_empty() && self.columns.is_empty()
    }

    /// Find a column by name
    pub fn find_column(&self, name: &str) -> Option<&ColumnAnnotation> {
        self.columns.iter().find(|c| c.column_name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_entry_with_samples() {
        let col = ColumnAnnotation::parse_entry("order_id: numeric id, sample values: 1, 2").unwrap();
        assert_eq!(
            col,
            ColumnAnnotation::new("order_id", "numeric id", vec!["1".to_string(), "2".to_string()])
        );
    }

    #[test]
    fn parse_entry_keeps_colons_in_description() {
        let col = ColumnAnnotation::parse_entry(
            "order_purchase_timestamp: purchase time (format: YYYY-MM-DD HH:MM:SS), sample values: 2017-10-02 10:56:33",
        )
        .unwrap();
        assert_eq!(col.column_name, "order_purchase_timestamp");
        assert_eq!(col.description, "purchase time (format: YYYY-MM-DD HH:MM:SS)");
        assert_eq!(col.sample_values, vec!["2017-10-02 10:56:33".to_string()]);
    }

    #[test]
    fn parse_entry_without_samples() {
        let col = ColumnAnnotation::parse_entry("status: order status").unwrap();
        assert_eq!(col.description, "order status");
        assert!(col.sample_values.is_empty());
    }

    #[test]
    fn parse_entry_marker_is_case_insensitive() {
        let col = ColumnAnnotation::parse_entry("state: two-letter code, Sample Values: MG, SP").unwrap();
        assert_eq!(col.description, "two-letter code");
        assert_eq!(col.sample_values, vec!["MG".to_string(), "SP".to_string()]);
    }

    #[test]
    fn parse_entry_rejects_missing_name() {
        assert!(ColumnAnnotation::parse_entry("no separator here").is_err());
        assert!(ColumnAnnotation::parse_entry("  : description").is_err());
    }

    #[test]
    fn entry_round_trip() {
        let col = ColumnAnnotation::new("city", "customer city", vec!["belo horizonte".to_string()]);
        let parsed = ColumnAnnotation::parse_entry(&col.to_entry()).unwrap();
        assert_eq!(parsed, col);

        let bare = ColumnAnnotation::new("city", "customer city", vec![]);
        assert_eq!(bare.to_entry(), "city: customer city");
    }

    #[test]
    fn empty_annotation() {
        let table = TableAnnotation::empty("orders");
        assert!(table.is_empty());
        assert_eq!(table.table_name, "orders");

        let table = TableAnnotation::new("orders", "Orders table.", vec![]);
        assert!(!table.is_empty());
        assert!(table.find_column("order_id").is_none());
    }
}
