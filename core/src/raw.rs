//! Format-agnostic input tables.
//!
//! Ingestion collaborators hand the loader a `TableSet` of `RawTable`s:
//! a header plus rows of optional string cells. An empty string cell is
//! treated as null. Typing happens in `loader`.

use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row of text cells. Empty strings become nulls.
    pub fn push_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let row = cells
            .into_iter()
            .map(|c| {
                let c = c.as_ref();
                if c.is_empty() {
                    None
                } else {
                    Some(c.to_string())
                }
            })
            .collect();
        self.rows.push(row);
    }

    /// Append a row with explicit nulls.
    pub fn push_cells(&mut self, cells: Vec<Option<String>>) {
        self.rows.push(cells);
    }

    /// Builder form of `push_row`.
    pub fn with_row<I, S>(mut self, cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.push_row(cells);
        self
    }

    /// Build a table from JSON objects (e.g. a records-oriented export).
    /// Columns are the union of keys across records. JSON null and missing
    /// keys become null cells; other scalars are rendered as text.
    pub fn from_json_records(records: &[Value]) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for record in records {
            if let Value::Object(map) = record {
                for key in map.keys() {
                    if !columns.iter().any(|c| c == key) {
                        columns.push(key.clone());
                    }
                }
            }
        }

        let rows = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|col| match record.get(col) {
                        None | Some(Value::Null) => None,
                        Some(Value::String(s)) if s.is_empty() => None,
                        Some(Value::String(s)) => Some(s.clone()),
                        Some(other) => Some(other.to_string()),
                    })
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column, matched case-insensitively on the trimmed name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.trim().eq_ignore_ascii_case(name))
    }
}

/// Named raw tables making up one snapshot.
#[derive(Debug, Clone, Default)]
pub struct TableSet {
    tables: HashMap<String, RawTable>,
}

impl TableSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, table: RawTable) {
        self.tables.insert(name.into(), table);
    }

    pub fn with_table(mut self, name: impl Into<String>, table: RawTable) -> Self {
        self.insert(name, table);
        self
    }

    pub fn get(&self, name: &str) -> Option<&RawTable> {
        self.tables.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<RawTable> {
        self.tables.remove(name)
    }
}
