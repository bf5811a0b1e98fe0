//! Generic Tabular Exchange Type
//!
//! An ordered set of named columns with one row per entity. Hosting layers
//! serialize it to JSON records; the pipeline never depends on the wire format.

use crate::error::ValidationError;
use crate::normalizer::canonical_name;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single table cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Number(f64),
    Text(String),
}

impl Cell {
    /// Convert a JSON value into a cell. Nested values are rejected.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(Cell::Null),
            Value::Bool(b) => Some(Cell::Number(if *b { 1.0 } else { 0.0 })),
            Value::Number(n) => n.as_f64().map(Cell::Number),
            Value::String(s) => Some(Cell::Text(s.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Convert into a JSON value
    pub fn to_json(&self) -> Value {
        match self {
            Cell::Null => Value::Null,
            Cell::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Cell::Text(s) => Value::String(s.clone()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Integral number representable as `i64`
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            // i64::MAX as f64 rounds up to 2^63, which is out of range
            Cell::Number(n)
                if n.is_finite() && n.fract() == 0.0 && *n >= i64::MIN as f64 && *n < i64::MAX as f64 =>
            {
                Some(*n as i64)
            }
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

/// Ordered named columns, one row per entity
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    /// Canonical column names, parallel to `columns`
    keys: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Create an empty table with the given header
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let keys = columns.iter().map(|c| canonical_name(c)).collect();
        Self {
            columns,
            keys,
            rows: Vec::new(),
        }
    }

    /// Create a table and append rows, checking each row's width
    pub fn with_rows<S: Into<String>>(
        columns: impl IntoIterator<Item = S>,
        rows: impl IntoIterator<Item = Vec<Cell>>,
    ) -> Result<Self, ValidationError> {
        let mut table = Self::new(columns);
        table.check_header()?;
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Two columns must not share a canonical key
    fn check_header(&self) -> Result<(), ValidationError> {
        for (i, key) in self.keys.iter().enumerate() {
            if let Some(first) = self.keys[..i].iter().position(|k| k == key) {
                return Err(ValidationError::InvalidFormat(format!(
                    "columns '{}' and '{}' both resolve to '{}'",
                    self.columns[first], self.columns[i], key
                )));
            }
        }
        Ok(())
    }

    /// Append a row
    pub fn push_row(&mut self, row: Vec<Cell>) -> Result<(), ValidationError> {
        if row.len() != self.columns.len() {
            return Err(ValidationError::RaggedRow {
                row: self.rows.len(),
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Build a table from JSON records (objects). Columns appear in the order
    /// they are first seen; keys missing from a record become `Null`.
    pub fn from_records(records: &[Value]) -> Result<Self, ValidationError> {
        let mut columns: Vec<String> = Vec::new();
        for (row, record) in records.iter().enumerate() {
            let object = record.as_object().ok_or_else(|| {
                ValidationError::InvalidFormat(format!("record {} is not a JSON object", row))
            })?;
            for key in object.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }

        let mut table = Self::new(columns.clone());
        table.check_header()?;
        for (row, record) in records.iter().enumerate() {
            let Some(object) = record.as_object() else {
                continue;
            };
            let mut cells = Vec::with_capacity(columns.len());
            for column in &columns {
                let cell = match object.get(column) {
                    None => Cell::Null,
                    Some(value) => Cell::from_json(value).ok_or_else(|| {
                        ValidationError::malformed(row, column, "holds a nested value")
                    })?,
                };
                cells.push(cell);
            }
            table.push_row(cells)?;
        }
        Ok(table)
    }

    /// Convert into JSON records
    pub fn to_records(&self) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| {
                let object: Map<String, Value> = self
                    .columns
                    .iter()
                    .zip(row)
                    .map(|(column, cell)| (column.clone(), cell.to_json()))
                    .collect();
                Value::Object(object)
            })
            .collect()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column, matching on canonical names
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let key = canonical_name(name);
        self.keys.iter().position(|k| *k == key)
    }

    /// Iterate over rows with by-name access
    pub fn iter_rows(&self) -> impl Iterator<Item = RowView<'_>> {
        (0..self.rows.len()).map(move |index| RowView { table: self, index })
    }
}

/// Borrowed view of one table row
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    table: &'a Table,
    index: usize,
}

impl<'a> RowView<'a> {
    /// Row position in the table
    pub fn index(&self) -> usize {
        self.index
    }

    /// Cell by column name (canonical match)
    pub fn get(&self, column: &str) -> Option<&'a Cell> {
        let position = self.table.column_index(column)?;
        self.table.rows[self.index].get(position)
    }

    /// Cell by column position
    pub fn at(&self, position: usize) -> Option<&'a Cell> {
        self.table.rows[self.index].get(position)
    }
}
