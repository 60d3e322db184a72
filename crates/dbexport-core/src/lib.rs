//! Format-expression compiler for Databricks exports.
//!
//! This crate turns the per-product export "format" of a GraphQL-based export
//! into the SELECT list of a Databricks SQL query. The GraphQL-to-SQL layer
//! upstream resolves joins and column expressions; this crate compiles the
//! formatting layer on top of them.
//!
//! # Components
//!
//! - [`FormatSpec`] - The format DSL: references, actions and conditions
//! - [`BaseExpressionRegistry`] - Resolved SQL expressions from the query layer
//! - [`FormatCompiler`] - Evaluates the DSL and assembles the select list
//! - [`RelationTableOverrides`] - Maps relation names to physical tables
//! - [`ExportBatch`] - Compiles many export jobs with per-job failure isolation
//! - [`Notebook`] - Packages compiled queries into a Databricks notebook
//!
//! # Example
//!
//! ```ignore
//! use dbexport_core::{BaseExpressionRegistry, DatabricksDialect, FieldMapping, FormatCompiler};
//!
//! let mut registry = BaseExpressionRegistry::new();
//! registry.add_select_expression("t.identificatie", Some("identificatie"));
//!
//! let mapping: FieldMapping = serde_json::from_value(json)?;
//! let compiler = FormatCompiler::new(&registry, DatabricksDialect::default());
//! let select = compiler.assemble(&mapping, false)?;
//! println!("{}", select.to_sql());
//! ```

mod batch;
mod compiler;
mod dialect;
mod format_spec;
mod notebook;
mod registry;
mod relation_tables;
mod settings;

pub use batch::{BatchReport, CompiledExport, ExportBatch, ExportJob, JobError};
pub use compiler::{CompiledSelectList, FormatCompiler, SelectItem};
pub use dialect::DatabricksDialect;
pub use format_spec::{
    Action, Condition, ConditionKind, FieldMapping, FillType, FormatKwargs, FormatSpec, Formatter,
    ProductFormat, column_format_to_mapping,
};
pub use notebook::{Notebook, sql_file_name};
pub use registry::{BaseExpressionRegistry, RelationJoin, to_snake};
pub use relation_tables::{RelationTableOverrides, ViewDefinitionLookup};
pub use settings::{DialectConfig, ExportSettings};

use thiserror::Error;

/// Errors that can occur while compiling an export format.
#[derive(Debug, Error)]
pub enum Error {
    /// A `format` action names a formatter without a rendering rule.
    #[error("Unimplemented formatter: {0}")]
    UnimplementedFormatter(String),

    /// A condition kind other than `isempty` or `isnone`.
    #[error("Unimplemented condition: {0}")]
    UnimplementedCondition(String),

    /// An action kind without a dispatch rule.
    #[error("Unimplemented action: {0}")]
    UnimplementedAction(String),

    /// One or more export attributes are missing from the compiled select list.
    #[error("Missing output attributes: {}", .0.join(", "))]
    MissingAttributes(Vec<String>),

    /// A format parameter (timestamp pattern, formatter path) cannot be mapped.
    #[error("Malformed format string: {0}")]
    MalformedFormatString(String),

    /// A relation referenced by a formatter is not known to the registry.
    #[error("Unknown relation: {0}")]
    UnknownRelation(String),

    /// The format specification is structurally invalid.
    #[error("Invalid format spec: {0}")]
    InvalidFormatSpec(String),

    /// Settings failed validation.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Compiling an export attribute failed.
    #[error("attribute '{attribute}': {source}")]
    Attribute {
        attribute: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// The export attribute that failed to compile, if known.
    pub fn attribute(&self) -> Option<&str> {
        match self {
            Self::Attribute { attribute, .. } => Some(attribute),
            _ => None,
        }
    }

    /// The underlying error, without attribute context.
    pub fn root_cause(&self) -> &Error {
        match self {
            Self::Attribute { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
