//! Relation table name resolution.
//!
//! Relation tables are named `rel_<relation>`. Some of them are exposed in
//! Databricks under a different name through a custom view definition; those
//! renames are collected once, up front, so lookups are plain map reads.

use std::collections::HashMap;

use crate::dialect::DatabricksDialect;

/// Source of custom view definitions for relation tables.
pub trait ViewDefinitionLookup {
    /// The physical table name of a custom view for `table_name`, if any.
    fn custom_table_name(&self, table_name: &str) -> Option<String>;
}

impl<F> ViewDefinitionLookup for F
where
    F: Fn(&str) -> Option<String>,
{
    fn custom_table_name(&self, table_name: &str) -> Option<String> {
        self(table_name)
    }
}

impl ViewDefinitionLookup for HashMap<String, String> {
    fn custom_table_name(&self, table_name: &str) -> Option<String> {
        self.get(table_name).cloned()
    }
}

/// Renamed relation tables, keyed by logical table name (`rel_<relation>`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationTableOverrides {
    renames: HashMap<String, String>,
}

impl RelationTableOverrides {
    /// Collect the renames of all known relations.
    pub fn load<'a, I, L>(relation_names: I, lookup: &L) -> Self
    where
        I: IntoIterator<Item = &'a str>,
        L: ViewDefinitionLookup + ?Sized,
    {
        let renames: HashMap<String, String> = relation_names
            .into_iter()
            .filter_map(|relation_name| {
                let table_name = relation_table(relation_name);
                lookup
                    .custom_table_name(&table_name)
                    .map(|renamed| (table_name, renamed))
            })
            .collect();

        tracing::debug!(renamed = renames.len(), "Loaded relation table overrides");

        Self { renames }
    }

    /// Number of renamed relation tables.
    pub fn len(&self) -> usize {
        self.renames.len()
    }

    /// Whether no relation table is renamed.
    pub fn is_empty(&self) -> bool {
        self.renames.is_empty()
    }

    /// Whether a relation is exposed under a custom table name.
    pub fn is_renamed(&self, relation_name: &str) -> bool {
        self.renames.contains_key(&relation_table(relation_name))
    }

    /// The physical, unqualified table name of a relation.
    pub fn table_name(&self, relation_name: &str) -> String {
        let table_name = relation_table(relation_name);
        match self.renames.get(&table_name) {
            Some(renamed) => renamed.clone(),
            None => table_name,
        }
    }

    /// The physical, schema-qualified table name of a relation.
    pub fn resolve_table_name(&self, relation_name: &str, dialect: &DatabricksDialect) -> String {
        dialect.full_table_name(&self.table_name(relation_name))
    }
}

fn relation_table(relation_name: &str) -> String {
    format!("rel_{relation_name}")
}
