//! Columnar batches.

use crate::types::{DataType, Value};
use thiserror::Error;

/// A typed column.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// One value per row.
    Flat {
        data_type: DataType,
        values: Vec<Value>,
    },
    /// A single value replicated across `len` rows.
    Constant {
        data_type: DataType,
        value: Value,
        len: usize,
    },
}

impl Column {
    pub fn flat(data_type: DataType, values: Vec<Value>) -> Self {
        Column::Flat { data_type, values }
    }

    pub fn constant(data_type: DataType, value: Value, len: usize) -> Self {
        Column::Constant {
            data_type,
            value,
            len,
        }
    }

    pub fn data_type(&self) -> &DataType {
        match self {
            Column::Flat { data_type, .. } | Column::Constant { data_type, .. } => data_type,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Flat { values, .. } => values.len(),
            Column::Constant { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value at `row`, or `None` if the row is out of range.
    pub fn value_at(&self, row: usize) -> Option<&Value> {
        match self {
            Column::Flat { values, .. } => values.get(row),
            Column::Constant { value, len, .. } => (row < *len).then_some(value),
        }
    }

    /// The replicated value if this is a constant column.
    pub fn constant_value(&self) -> Option<&Value> {
        match self {
            Column::Constant { value, .. } => Some(value),
            Column::Flat { .. } => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> + '_ {
        (0..self.len()).filter_map(move |row| self.value_at(row))
    }
}

/// Errors raised when assembling a [`RowBatch`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BatchError {
    #[error("{names} column names given for {columns} columns")]
    NameCountMismatch { names: usize, columns: usize },

    #[error("column '{name}' has {actual} rows, expected {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
}

/// An ordered sequence of named columns with equal row counts.
#[derive(Debug, Clone, PartialEq)]
pub struct RowBatch {
    names: Vec<String>,
    columns: Vec<Column>,
    num_rows: usize,
}

impl RowBatch {
    pub fn try_new(names: Vec<String>, columns: Vec<Column>) -> Result<Self, BatchError> {
        if names.len() != columns.len() {
            return Err(BatchError::NameCountMismatch {
                names: names.len(),
                columns: columns.len(),
            });
        }

        let num_rows = columns.first().map(Column::len).unwrap_or(0);
        for (name, column) in names.iter().zip(&columns) {
            if column.len() != num_rows {
                return Err(BatchError::LengthMismatch {
                    name: name.clone(),
                    expected: num_rows,
                    actual: column.len(),
                });
            }
        }

        Ok(Self {
            names,
            columns,
            num_rows,
        })
    }

    /// Build a batch from generated argument columns, naming them `c0`, `c1`, ...
    pub fn from_columns(columns: Vec<Column>) -> Result<Self, BatchError> {
        let names = (0..columns.len()).map(|i| format!("c{}", i)).collect();
        Self::try_new(names, columns)
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|index| &self.columns[index])
    }

    pub fn column_at(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// Materialize row `row` across all columns.
    pub fn row(&self, row: usize) -> Vec<Value> {
        self.columns
            .iter()
            .map(|c| c.value_at(row).cloned().unwrap_or(Value::Null))
            .collect()
    }

    pub fn rows(&self) -> Vec<Vec<Value>> {
        (0..self.num_rows).map(|row| self.row(row)).collect()
    }

    /// Compare two batches as multisets of rows, ignoring row order and
    /// column names. Column count must match.
    pub fn same_rows_unordered(&self, other: &RowBatch) -> bool {
        if self.num_columns() != other.num_columns() || self.num_rows != other.num_rows {
            return false;
        }
        let mut left = self.rows();
        let mut right = other.rows();
        left.sort();
        right.sort();
        left == right
    }
}
