//! Batch compilation of export jobs.
//!
//! An export run covers many (catalog, collection, product) combinations.
//! Every job is compiled by its own [`FormatCompiler`]; a failing job is
//! recorded with its context and never affects the other jobs.

use std::borrow::Cow;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::compiler::FormatCompiler;
use crate::dialect::DatabricksDialect;
use crate::format_spec::ProductFormat;
use crate::notebook::Notebook;
use crate::registry::{BaseExpressionRegistry, RelationJoin};
use crate::relation_tables::RelationTableOverrides;
use crate::settings::ExportSettings;
use crate::{Error, Result};

/// API types whose products are compiled.
const GRAPHQL_API_TYPES: [&str; 2] = ["graphql", "graphql_streaming"];

/// One export product with its resolved query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportJob {
    /// Catalog name (e.g. "gebieden").
    pub catalog: String,

    /// Collection name (e.g. "buurten").
    pub collection: String,

    /// Product name (e.g. "csv_actueel").
    pub product: String,

    /// API type of the product. Only GraphQL products are compiled.
    #[serde(default = "default_api_type")]
    pub api_type: String,

    /// Whether the product is exported as a shape file.
    #[serde(default)]
    pub is_shape: bool,

    /// The product's export format.
    pub format: ProductFormat,

    /// Expressions resolved from the product's GraphQL query.
    #[serde(default)]
    pub registry: BaseExpressionRegistry,

    /// Relations joined into the query, added to the registry on compile.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub joins: Vec<RelationJoin>,
}

fn default_api_type() -> String {
    "graphql".to_string()
}

impl ExportJob {
    /// Job name: `<catalog>_<collection>_<product>`.
    pub fn name(&self) -> String {
        format!("{}_{}_{}", self.catalog, self.collection, self.product)
    }

    /// Whether the product is backed by a GraphQL query.
    pub fn is_graphql(&self) -> bool {
        GRAPHQL_API_TYPES.contains(&self.api_type.as_str())
    }

    /// The registry with every joined relation registered.
    pub fn resolved_registry(&self) -> Cow<'_, BaseExpressionRegistry> {
        if self.joins.is_empty() {
            return Cow::Borrowed(&self.registry);
        }
        let mut registry = self.registry.clone();
        for join in &self.joins {
            registry.add_relation_join(join);
        }
        Cow::Owned(registry)
    }

    /// Compile this job's select list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFormatSpec`] for an empty format and any
    /// compilation error of the job's format.
    pub fn compile(&self, dialect: &DatabricksDialect) -> Result<String> {
        if self.format.is_empty() {
            return Err(Error::InvalidFormatSpec(format!(
                "{} has an empty format",
                self.name()
            )));
        }
        let mapping = self.format.clone().into_mapping();
        let registry = self.resolved_registry();
        FormatCompiler::new(&registry, dialect.clone()).compile(&mapping, self.is_shape)
    }
}

/// A job that failed to compile.
#[derive(Debug, thiserror::Error)]
#[error("{catalog} {collection} {product}: {source}")]
pub struct JobError {
    /// Catalog of the failed job.
    pub catalog: String,

    /// Collection of the failed job.
    pub collection: String,

    /// Product of the failed job.
    pub product: String,

    /// The compilation error.
    #[source]
    pub source: Error,
}

/// A successfully compiled job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledExport {
    /// Catalog of the job.
    pub catalog: String,

    /// Job name.
    pub name: String,

    /// The compiled select list.
    pub sql: String,
}

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Compiled jobs in input order.
    pub compiled: Vec<CompiledExport>,

    /// Jobs that failed to compile.
    pub failures: Vec<JobError>,

    /// Names of jobs that were not compiled.
    pub skipped: Vec<String>,
}

impl BatchReport {
    /// Whether every compiled job succeeded.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// One notebook per catalog, in order of first appearance.
    pub fn notebooks(&self) -> Vec<Notebook> {
        let mut notebooks: IndexMap<&str, Notebook> = IndexMap::new();
        for export in &self.compiled {
            notebooks
                .entry(export.catalog.as_str())
                .or_insert_with(|| Notebook::new(export.catalog.clone()))
                .push(export.name.clone(), export.sql.clone());
        }
        notebooks.into_values().collect()
    }
}

/// Compiles export jobs.
#[derive(Debug, Clone, Default)]
pub struct ExportBatch {
    settings: ExportSettings,
    dialect: DatabricksDialect,
    relation_tables: RelationTableOverrides,
}

impl ExportBatch {
    /// Create a batch with the given settings.
    pub fn new(settings: ExportSettings) -> Self {
        let dialect = DatabricksDialect::new(settings.dialect.clone());
        Self {
            settings,
            dialect,
            relation_tables: RelationTableOverrides::default(),
        }
    }

    /// Use the given relation table overrides for every job.
    pub fn with_relation_tables(mut self, relation_tables: RelationTableOverrides) -> Self {
        self.relation_tables = relation_tables;
        self
    }

    /// The dialect jobs are compiled for.
    pub fn dialect(&self) -> &DatabricksDialect {
        &self.dialect
    }

    /// The relation table overrides of this run.
    pub fn relation_tables(&self) -> &RelationTableOverrides {
        &self.relation_tables
    }

    /// Compile all jobs.
    pub fn run(&self, jobs: &[ExportJob]) -> BatchReport {
        let mut report = BatchReport::default();

        for job in jobs {
            let name = job.name();
            let _span = tracing::info_span!("export_job", job = %name).entered();

            if self.settings.is_skipped(&job.catalog) {
                tracing::debug!("Skipping excluded catalog");
                report.skipped.push(name);
                continue;
            }
            if !job.is_graphql() {
                tracing::info!(api_type = %job.api_type, "Skipping, not a GraphQL product");
                report.skipped.push(name);
                continue;
            }

            match job.compile(&self.dialect) {
                Ok(sql) => {
                    tracing::info!("Compiled export");
                    report.compiled.push(CompiledExport {
                        catalog: job.catalog.clone(),
                        name,
                        sql,
                    });
                }
                Err(source) => {
                    tracing::error!(
                        error = %source.root_cause(),
                        attribute = source.attribute().unwrap_or_default(),
                        "Export failed"
                    );
                    report.failures.push(JobError {
                        catalog: job.catalog.clone(),
                        collection: job.collection.clone(),
                        product: job.product.clone(),
                        source,
                    });
                }
            }
        }

        tracing::info!(
            compiled = report.compiled.len(),
            failed = report.failures.len(),
            skipped = report.skipped.len(),
            "Batch finished"
        );
        report
    }
}
