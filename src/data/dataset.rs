use std::collections::HashMap;

use crate::data::value::FieldValue;
use crate::foundation::error::{PlotError, PlotResult};

/// Resettable forward-only cursor over rows of named, typed fields.
///
/// Iteration contract: call [`DataSet::next`] until it returns `false`, then consult
/// [`DataSet::err`]. [`DataSet::reset`] rewinds to before the first row without re-running the
/// query that produced the data, so repeated scans observe identical values.
pub trait DataSet: Send {
    /// Advance to the next row. Returns `false` at the end or when iteration failed.
    fn next(&mut self) -> bool;
    /// Error that ended the iteration, if any.
    fn err(&self) -> Option<&str>;
    /// Value of `name` in the current row; unknown fields yield [`FieldValue::Error`].
    fn field(&self, name: &str) -> FieldValue;
    /// Rewind to before the first row.
    fn reset(&mut self);
}

/// Fully materialized, column-oriented dataset.
///
/// Every source in this crate materializes its result set into one of these, which makes
/// `reset` free and scans repeatable.
#[derive(Clone, Debug, Default)]
pub struct StaticDataSet {
    names: Vec<String>,
    columns: HashMap<String, Vec<FieldValue>>,
    rows: usize,
    cursor: Option<usize>,
    end_error: Option<String>,
    exhausted: bool,
}

impl StaticDataSet {
    /// Empty dataset with the given field names.
    pub fn with_fields<S: AsRef<str>>(names: &[S]) -> Self {
        let names: Vec<String> = names.iter().map(|n| n.as_ref().to_owned()).collect();
        let columns = names.iter().map(|n| (n.clone(), Vec::new())).collect();
        Self {
            names,
            columns,
            ..Self::default()
        }
    }

    /// Build from named columns. All columns must have the same length.
    pub fn from_columns(cols: Vec<(String, Vec<FieldValue>)>) -> PlotResult<Self> {
        let rows = cols.first().map(|(_, v)| v.len()).unwrap_or(0);
        let mut names = Vec::with_capacity(cols.len());
        let mut columns = HashMap::with_capacity(cols.len());
        for (name, values) in cols {
            if values.len() != rows {
                return Err(PlotError::configuration(format!(
                    "column {name:?} has {} values, expected {rows}",
                    values.len()
                )));
            }
            if columns.insert(name.clone(), values).is_some() {
                return Err(PlotError::configuration(format!(
                    "duplicate column {name:?}"
                )));
            }
            names.push(name);
        }
        Ok(Self {
            names,
            columns,
            rows,
            ..Self::default()
        })
    }

    /// Append one row; `values` follow the field order given at construction.
    pub fn push_row(&mut self, values: Vec<FieldValue>) -> PlotResult<()> {
        if values.len() != self.names.len() {
            return Err(PlotError::configuration(format!(
                "row has {} values, dataset has {} fields",
                values.len(),
                self.names.len()
            )));
        }
        for (name, v) in self.names.iter().zip(values) {
            if let Some(col) = self.columns.get_mut(name) {
                col.push(v);
            }
        }
        self.rows += 1;
        Ok(())
    }

    /// Make iteration end with `msg` as its error once the rows are exhausted.
    pub fn fail_at_end(mut self, msg: impl Into<String>) -> Self {
        self.end_error = Some(msg.into());
        self
    }

    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }
}

impl DataSet for StaticDataSet {
    fn next(&mut self) -> bool {
        let next = self.cursor.map_or(0, |c| c + 1);
        if next >= self.rows {
            self.cursor = Some(self.rows);
            self.exhausted = true;
            return false;
        }
        self.cursor = Some(next);
        true
    }

    fn err(&self) -> Option<&str> {
        if self.exhausted {
            self.end_error.as_deref()
        } else {
            None
        }
    }

    fn field(&self, name: &str) -> FieldValue {
        let Some(col) = self.columns.get(name) else {
            return FieldValue::Error(format!("unknown field {name:?}"));
        };
        match self.cursor {
            Some(row) if row < self.rows => col[row].clone(),
            _ => FieldValue::Error("no current row".to_owned()),
        }
    }

    fn reset(&mut self) {
        self.cursor = None;
        self.exhausted = false;
    }
}

/// Turn a dataset's end-of-iteration error into a [`PlotError::DataAccess`].
pub fn check_iteration(ds: &dyn DataSet) -> PlotResult<()> {
    match ds.err() {
        Some(e) => Err(PlotError::data_access(format!(
            "dataset iteration ended with an error: {e}"
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/data/dataset.rs"]
mod tests;
