//! Databricks SQL rendering rules.

use crate::settings::DialectConfig;

/// Default output pattern of timestamp formatting.
pub(crate) const DEFAULT_TIMESTAMP_PATTERN: &str = "yyyyMMddHHmmss";

/// Output pattern of date formatting.
pub(crate) const DATE_PATTERN: &str = "yyyy-MM-dd'T'HH:mm:ss";

/// Quote an identifier with backticks, doubling embedded backticks.
pub(crate) fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Rendering rules for Databricks (Spark) SQL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabricksDialect {
    config: DialectConfig,
}

impl DatabricksDialect {
    /// Create a dialect from settings.
    pub fn new(config: DialectConfig) -> Self {
        Self { config }
    }

    /// The dialect settings.
    pub fn config(&self) -> &DialectConfig {
        &self.config
    }

    /// Qualify a table name with the configured catalog and schema.
    pub fn full_table_name(&self, table_name: &str) -> String {
        format!("{}.{}", self.config.schema, table_name)
    }

    /// Quote an identifier with backticks.
    pub fn quote_identifier(&self, name: &str) -> String {
        quote_identifier(name)
    }

    /// A double-quoted string literal.
    pub fn string_literal(&self, value: &str) -> String {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    }

    /// A single-quoted string literal.
    pub fn quoted_value(&self, value: &str) -> String {
        format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
    }

    /// Extract a JSON field from a string column.
    pub fn json_extract(&self, expression: &str, json_path: &str) -> String {
        format!("get_json_object({expression}, '$.{json_path}')")
    }

    /// Geometry columns are stored as text already.
    pub fn geometry_as_text(&self, geometry: &str) -> String {
        geometry.to_string()
    }

    /// Translate a `strftime` pattern to a Spark datetime pattern.
    pub fn timestamp_pattern(&self, source: &str) -> Option<&'static str> {
        match source {
            "%Y-%m-%d" => Some("yyyy-MM-dd"),
            _ => None,
        }
    }
}
