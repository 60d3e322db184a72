//! Export settings.
//!
//! Settings can be specified in `dbexport.toml`; the CLI loads them and
//! applies `DBEXPORT__*` environment overrides.
//!
//! # Example Configuration
//!
//! ```toml
//! log_level = "info"
//! skip_catalogs = ["test_catalogue", "brk"]
//!
//! [dialect]
//! schema = "dpbk_dev.02_silver"
//! ```

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Settings of the target SQL dialect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialectConfig {
    /// Catalog and schema that qualify every table name.
    /// Default: "dpbk_dev.02_silver"
    #[serde(default = "default_schema")]
    pub schema: String,
}

fn default_schema() -> String {
    "dpbk_dev.02_silver".to_string()
}

impl Default for DialectConfig {
    fn default() -> Self {
        Self {
            schema: default_schema(),
        }
    }
}

/// Settings of an export run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSettings {
    /// Logging level used when `RUST_LOG` is not set.
    /// Default: "info"
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Catalogs that are never exported.
    /// Default: ["test_catalogue", "brk"]
    #[serde(default = "default_skip_catalogs")]
    pub skip_catalogs: Vec<String>,

    /// Target dialect settings.
    #[serde(default)]
    pub dialect: DialectConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_skip_catalogs() -> Vec<String> {
    vec!["test_catalogue".to_string(), "brk".to_string()]
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            skip_catalogs: default_skip_catalogs(),
            dialect: DialectConfig::default(),
        }
    }
}

impl ExportSettings {
    /// Validates the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if a setting is empty or malformed.
    pub fn validate(&self) -> Result<()> {
        if self.dialect.schema.trim().is_empty() {
            return Err(Error::Config("dialect.schema must not be empty".into()));
        }
        if self.dialect.schema.split('.').any(str::is_empty) {
            return Err(Error::Config(format!(
                "dialect.schema has an empty segment: {}",
                self.dialect.schema
            )));
        }
        Ok(())
    }

    /// Whether a catalog is excluded from export.
    pub fn is_skipped(&self, catalog: &str) -> bool {
        self.skip_catalogs.iter().any(|c| c == catalog)
    }
}
