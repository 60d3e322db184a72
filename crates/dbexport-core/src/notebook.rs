//! Databricks notebook packaging.
//!
//! All queries of a catalog are bundled into one SQL notebook source file;
//! each query becomes a titled cell.

use std::fmt::Write as _;

const NOTEBOOK_HEADER: &str = "-- Databricks notebook source\n";
const CELL_SEPARATOR: &str = "\n\n-- COMMAND ----------\n\n";

/// A Databricks SQL notebook for one catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Notebook {
    catalog: String,
    cells: Vec<(String, String)>,
}

impl Notebook {
    /// Create an empty notebook.
    pub fn new(catalog: impl Into<String>) -> Self {
        Self {
            catalog: catalog.into(),
            cells: Vec::new(),
        }
    }

    /// The catalog of this notebook.
    pub fn catalog(&self) -> &str {
        &self.catalog
    }

    /// Append a titled query cell.
    pub fn push(&mut self, title: impl Into<String>, sql: impl Into<String>) {
        self.cells.push((title.into(), sql.into()));
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the notebook has no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// File name of the notebook source.
    pub fn file_name(&self) -> String {
        sql_file_name(&self.catalog)
    }

    /// Render the notebook source.
    pub fn render(&self) -> String {
        let mut source = String::from(NOTEBOOK_HEADER);
        for (title, sql) in &self.cells {
            let _ = writeln!(source, "-- DBTITLE 1, {title}");
            source.push_str(sql);
            source.push_str(CELL_SEPARATOR);
        }
        source
    }
}

/// File name of a single exported query.
pub fn sql_file_name(name: &str) -> String {
    format!("{name}.sql")
}
