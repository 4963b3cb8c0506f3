//! In-memory table model.
//!
//! - [`Table`] - ordered headings plus the sequence of rows
//! - [`Row`] - one record, addressed by heading name
//!
//! Heading order is load-bearing: it is both the CSV column order and the
//! field order used when a row is written back out. Rows are always looked
//! up by name, never by position.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// One record: heading name to cell text.
///
/// A row may lack some headings (written as empty fields) but never holds a
/// key that is not a heading of its table.
pub type Row = HashMap<String, String>;

// =============================================================================
// Table
// =============================================================================

/// Ordered headings plus rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    headings: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    /// Create an empty table with the given headings.
    pub fn new(headings: Vec<String>) -> Self {
        Self {
            headings,
            rows: Vec::new(),
        }
    }

    pub fn headings(&self) -> &[String] {
        &self.headings
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Mutable access to the rows. The row count cannot change through it.
    pub fn rows_mut(&mut self) -> &mut [Row] {
        &mut self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.heading_index(name).is_some()
    }

    pub fn heading_index(&self, name: &str) -> Option<usize> {
        self.headings.iter().position(|h| h == name)
    }

    /// Append a row built positionally from `fields`.
    ///
    /// Fields beyond the heading count are dropped; headings beyond the field
    /// count are left absent from the row.
    pub fn push_fields(&mut self, fields: Vec<String>) {
        let row: Row = self
            .headings
            .iter()
            .cloned()
            .zip(fields)
            .collect();
        self.rows.push(row);
    }

    /// Append a heading. Returns `false` if it already exists.
    pub fn add_column(&mut self, name: &str) -> bool {
        if self.has_column(name) {
            return false;
        }
        self.headings.push(name.to_string());
        true
    }

    /// Remove a heading and its cell from every row.
    ///
    /// Returns `false` if the heading did not exist.
    pub fn remove_column(&mut self, name: &str) -> bool {
        let Some(idx) = self.heading_index(name) else {
            return false;
        };
        self.headings.remove(idx);
        for row in &mut self.rows {
            row.remove(name);
        }
        true
    }

    /// Cell text, if the row exists and has the key.
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        self.rows.get(row)?.get(column).map(String::as_str)
    }

    /// Rows as JSON objects; absent cells become empty strings.
    pub fn to_json_records(&self) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| {
                let obj: Map<String, Value> = self
                    .headings
                    .iter()
                    .map(|h| {
                        let cell = row.get(h).cloned().unwrap_or_default();
                        (h.clone(), Value::String(cell))
                    })
                    .collect();
                Value::Object(obj)
            })
            .collect()
    }
}

// =============================================================================
// Tests
// =============================================================================
