//! Base expression registry.
//!
//! The GraphQL-to-SQL layer resolves a query into joins and column
//! expressions. This registry holds the result: aliased select expressions,
//! unaliased select expressions and the join alias of every relation. The
//! compiler only reads from it.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A relation joined into the query, with the attributes selected from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationJoin {
    /// Relation attribute on the source collection (e.g. `ligtInBuurt`).
    pub relation: String,

    /// Alias of the joined table.
    pub join_alias: String,

    /// Catalog of the related collection.
    pub catalog: String,

    /// Related collection.
    pub collection: String,

    /// Attributes selected from the related collection.
    #[serde(default)]
    pub attributes: Vec<String>,
}

/// Resolved SQL expressions of one export query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaseExpressionRegistry {
    /// Canonical (snake case) alias to SQL expression.
    #[serde(default)]
    pub aliased: IndexMap<String, String>,

    /// Select expressions without an alias, matched on their last path segment.
    #[serde(default)]
    pub unaliased: Vec<String>,

    /// Relation attribute name to the alias of its joined table.
    #[serde(default)]
    pub relations: IndexMap<String, String>,
}

impl BaseExpressionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a select expression, optionally under an alias.
    pub fn add_select_expression(&mut self, expression: impl Into<String>, alias: Option<&str>) {
        let expression = expression.into();
        match alias {
            Some(alias) => {
                self.aliased.insert(alias.to_string(), expression);
            }
            None => self.unaliased.push(expression),
        }
    }

    /// Register the join alias of a relation attribute.
    pub fn add_relation(&mut self, relation_attr: impl Into<String>, join_alias: impl Into<String>) {
        self.relations.insert(relation_attr.into(), join_alias.into());
    }

    /// Register the attributes selected from a joined relation.
    ///
    /// Each attribute is selected from the join alias as
    /// `<relation>_<attribute>`; the destination catalog and collection are
    /// added as constant columns.
    pub fn add_relation_join_attributes(
        &mut self,
        attributes: &[&str],
        dst_catalog_name: &str,
        dst_collection_name: &str,
        join_alias: &str,
        relation_attr_name: &str,
    ) {
        let relation = to_snake(relation_attr_name);
        let join_alias = to_snake(join_alias);

        for attribute in attributes {
            let attribute = to_snake(attribute);
            self.add_select_expression(
                format!("{join_alias}.{attribute}"),
                Some(&format!("{relation}_{attribute}")),
            );
        }

        self.add_select_expression(
            format!("'{dst_catalog_name}'"),
            Some(&format!("{relation}_catalog")),
        );
        self.add_select_expression(
            format!("'{dst_collection_name}'"),
            Some(&format!("{relation}_collection")),
        );
    }

    /// Register a joined relation: its join alias and the attributes
    /// selected from it.
    pub fn add_relation_join(&mut self, join: &RelationJoin) {
        self.add_relation(join.relation.as_str(), join.join_alias.as_str());
        let attributes: Vec<&str> = join.attributes.iter().map(String::as_str).collect();
        self.add_relation_join_attributes(
            &attributes,
            &join.catalog,
            &join.collection,
            &join.join_alias,
            &join.relation,
        );
    }

    /// Resolve a logical path to a SQL expression.
    ///
    /// The path is normalized (`.` to `_`, camelCase to snake_case) and looked
    /// up as an alias first, then against the last segment of every unaliased
    /// expression.
    ///
    /// Paths with bracket syntax cannot be translated. They resolve to a
    /// string literal marking the expression for manual follow-up.
    pub fn resolve(&self, path: &str) -> Option<String> {
        if path.contains('[') && path.contains(']') {
            tracing::warn!(reference = %path, "Bracket syntax needs manual translation");
            return Some(format!("'TODO: DO THIS MANUALLY ({path})'"));
        }

        let search_for = to_snake(&path.replace('.', "_"));

        if let Some(expression) = self.aliased.get(&search_for) {
            return Some(expression.clone());
        }

        self.unaliased
            .iter()
            .find(|expression| expression.rsplit('.').next() == Some(search_for.as_str()))
            .cloned()
    }

    /// Get the join alias of a relation attribute.
    pub fn relation_alias(&self, relation_attr: &str) -> Option<&str> {
        self.relations
            .get(relation_attr)
            .or_else(|| self.relations.get(&to_snake(relation_attr)))
            .map(String::as_str)
    }
}

/// Convert a camelCase name to snake_case.
///
/// Every uppercase letter becomes `_` followed by its lowercase form; a
/// leading underscore produced this way is dropped.
pub fn to_snake(name: &str) -> String {
    let mut snake = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_uppercase() {
            snake.push('_');
            snake.extend(c.to_lowercase());
        } else {
            snake.push(c);
        }
    }
    match snake.strip_prefix('_') {
        Some(stripped) if name.starts_with(char::is_uppercase) => stripped.to_string(),
        _ => snake,
    }
}
