//! IO representations: what a computation's `predict` actually receives.
//!
//! RECORD_LIST computations see the decoded JSON untouched. TABULAR
//! computations see a column-oriented `Table`. A TABULAR request may post
//! a single row as a bare object; it is wrapped into a one-row table and
//! the reply is unwrapped back to a bare object.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::validator::kind_of;

/// Which physical representation a computation consumes and produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IoType {
    #[default]
    #[serde(alias = "PYTHON_DICT")]
    RecordList,
    #[serde(alias = "PANDAS_DATA_FRAME")]
    Tabular,
}

impl IoType {
    /// Parse a metadata `io_type` value. Legacy names are accepted.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "RECORD_LIST" | "PYTHON_DICT" => Some(Self::RecordList),
            "TABULAR" | "PANDAS_DATA_FRAME" => Some(Self::Tabular),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RecordList => "RECORD_LIST",
            Self::Tabular => "TABULAR",
        }
    }
}

impl fmt::Display for IoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Table ─────────────────────────────────────────────────────────────────────

/// A column-oriented table: named columns of equal length.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<(String, Vec<Value>)>,
    rows: usize,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty-columned table with `rows` rows.
    pub fn with_rows(rows: usize) -> Self {
        Self {
            columns: Vec::new(),
            rows,
        }
    }

    /// Build from row-oriented records.
    ///
    /// Columns appear in first-seen order. A key missing from some record
    /// is filled with `null` in that row.
    pub fn from_records(records: &[Value]) -> Result<Self, AdaptError> {
        let mut table = Self::with_rows(records.len());
        for (row, record) in records.iter().enumerate() {
            let obj = record.as_object().ok_or(AdaptError::NotARecord {
                index: row,
                found: kind_of(record),
            })?;
            for (key, value) in obj {
                let col = match table.position(key) {
                    Some(i) => i,
                    None => {
                        table
                            .columns
                            .push((key.clone(), vec![Value::Null; table.rows]));
                        table.columns.len() - 1
                    }
                };
                table.columns[col].1[row] = value.clone();
            }
        }
        Ok(table)
    }

    /// Build from named columns. All columns must have the same length.
    pub fn from_columns<I, S>(columns: I) -> Result<Self, AdaptError>
    where
        I: IntoIterator<Item = (S, Vec<Value>)>,
        S: Into<String>,
    {
        let mut table = Self::new();
        for (name, values) in columns {
            table.push_column(name, values)?;
        }
        Ok(table)
    }

    /// Append (or replace) a column.
    pub fn push_column(
        &mut self,
        name: impl Into<String>,
        values: Vec<Value>,
    ) -> Result<(), AdaptError> {
        let name = name.into();
        if self.columns.is_empty() && self.rows == 0 {
            self.rows = values.len();
        }
        if values.len() != self.rows {
            return Err(AdaptError::RaggedColumn {
                column: name,
                len: values.len(),
                rows: self.rows,
            });
        }
        match self.position(&name) {
            Some(i) => self.columns[i].1 = values,
            None => self.columns.push((name, values)),
        }
        Ok(())
    }

    /// Convert back to row-oriented records, one object per row.
    pub fn to_records(&self) -> Vec<Value> {
        (0..self.rows).map(|r| Value::Object(self.row(r))).collect()
    }

    /// One row as a mapping of column name to value.
    pub fn row(&self, index: usize) -> Map<String, Value> {
        self.columns
            .iter()
            .filter_map(|(name, values)| values.get(index).map(|v| (name.clone(), v.clone())))
            .collect()
    }

    pub fn column(&self, name: &str) -> Option<&[Value]> {
        self.position(name).map(|i| self.columns[i].1.as_slice())
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn num_rows(&self) -> usize {
        self.rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|(n, _)| n == name)
    }
}

// ── Frames ────────────────────────────────────────────────────────────────────

/// A computation's input or output in its physical representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Records(Value),
    Table(Table),
}

impl Frame {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Records(_) => "records",
            Self::Table(_) => "table",
        }
    }

    /// Row-oriented JSON view, regardless of representation.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Records(v) => v.clone(),
            Self::Table(t) => Value::Array(t.to_records()),
        }
    }
}

/// The adapted request input plus what the reverse conversion needs.
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptedInput {
    pub frame: Frame,
    /// The caller posted one bare record instead of a list.
    pub was_single_record: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdaptError {
    #[error("row {index}: expected object, found {found}")]
    NotARecord { index: usize, found: &'static str },
    #[error("tabular input must be an object or a list of objects, found {found}")]
    NotTabular { found: &'static str },
    #[error("column '{column}' has {len} values, table has {rows} rows")]
    RaggedColumn {
        column: String,
        len: usize,
        rows: usize,
    },
    #[error("{io_type} computation returned a {found} frame")]
    FrameMismatch {
        io_type: IoType,
        found: &'static str,
    },
}

/// Convert request JSON into the representation `io_type` calls for.
pub fn to_computation_input(value: Value, io_type: IoType) -> Result<AdaptedInput, AdaptError> {
    match io_type {
        IoType::RecordList => Ok(AdaptedInput {
            frame: Frame::Records(value),
            was_single_record: false,
        }),
        IoType::Tabular => {
            let (table, single) = match value {
                Value::Array(rows) => (Table::from_records(&rows)?, false),
                Value::Object(_) => (Table::from_records(std::slice::from_ref(&value))?, true),
                Value::Null => (Table::with_rows(1), true),
                other => {
                    return Err(AdaptError::NotTabular {
                        found: kind_of(&other),
                    })
                }
            };
            Ok(AdaptedInput {
                frame: Frame::Table(table),
                was_single_record: single,
            })
        }
    }
}

/// Convert a computation's result back into reply JSON.
///
/// For TABULAR, a single-record request unwraps to the last row of the
/// result (`null` for an empty result); otherwise the reply is a list.
pub fn from_computation_output(
    output: Frame,
    io_type: IoType,
    was_single_record: bool,
) -> Result<Value, AdaptError> {
    match (io_type, output) {
        (IoType::RecordList, Frame::Records(v)) => Ok(v),
        (IoType::Tabular, Frame::Table(table)) => {
            let mut rows = table.to_records();
            if was_single_record {
                Ok(rows.pop().unwrap_or(Value::Null))
            } else {
                Ok(Value::Array(rows))
            }
        }
        (io_type, other) => Err(AdaptError::FrameMismatch {
            io_type,
            found: other.kind(),
        }),
    }
}
