// =============================================================================
// Frame: In-Memory Named-Column Table
// =============================================================================
//
// A `Frame` is the tabular input to every fitting backend: an ordered set
// of named columns, all of one length. Two column types are enough for
// this library's needs:
//
//   - Float columns hold the numeric variables models are fit on
//   - Label columns hold categorical values, used as grouping keys
//
// The two operations beyond plain access are `design_matrix` (numeric
// predictor matrix with an optional leading intercept column) and
// `group_by` (partition rows by a key column, preserving the order in
// which each key first appears, never sorted).
//
// =============================================================================

use ndarray::{Array1, Array2};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use crate::error::{Result, TidyError};

/// The value of the partition key a model was fit under.
///
/// Attached as the leading column of every grouped output row so
/// multi-model results remain joinable back to their group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GroupKey(pub String);

impl GroupKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GroupKey {
    fn from(s: &str) -> Self {
        GroupKey(s.to_string())
    }
}

/// A single named column.
#[derive(Debug, Clone)]
pub enum Column {
    Float(Array1<f64>),
    Label(Vec<String>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Float(v) => v.len(),
            Column::Label(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Select the given row indices into a new column.
    fn take(&self, indices: &[usize]) -> Column {
        match self {
            Column::Float(v) => {
                Column::Float(indices.iter().map(|&i| v[i]).collect())
            }
            Column::Label(v) => {
                Column::Label(indices.iter().map(|&i| v[i].clone()).collect())
            }
        }
    }
}

/// An in-memory table of named columns sharing one length.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    columns: Vec<(String, Column)>,
}

impl Frame {
    pub fn new() -> Self {
        Frame { columns: Vec::new() }
    }

    /// Number of rows (0 for a frame with no columns).
    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, |(_, c)| c.len())
    }

    /// Number of columns.
    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// Column names in insertion order.
    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Add a float column. The first column fixes the frame's length;
    /// later columns must match it.
    pub fn push_float<I>(mut self, name: &str, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let col = Column::Float(values.into_iter().collect());
        self.push(name, col)?;
        Ok(self)
    }

    /// Add a label (categorical) column.
    pub fn push_label<I, S>(mut self, name: &str, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let col = Column::Label(values.into_iter().map(Into::into).collect());
        self.push(name, col)?;
        Ok(self)
    }

    fn push(&mut self, name: &str, col: Column) -> Result<()> {
        if !self.columns.is_empty() && col.len() != self.n_rows() {
            return Err(TidyError::DimensionMismatch(format!(
                "column '{}' has {} rows but the frame has {}",
                name,
                col.len(),
                self.n_rows()
            )));
        }
        if self.columns.iter().any(|(n, _)| n == name) {
            return Err(TidyError::InvalidValue(format!(
                "column '{}' already exists",
                name
            )));
        }
        self.columns.push((name.to_string(), col));
        Ok(())
    }

    fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
            .ok_or_else(|| TidyError::UnknownColumn(name.to_string()))
    }

    /// Borrow a float column by name.
    pub fn float(&self, name: &str) -> Result<&Array1<f64>> {
        match self.column(name)? {
            Column::Float(v) => Ok(v),
            Column::Label(_) => Err(TidyError::ColumnTypeMismatch {
                column: name.to_string(),
                expected: "float",
            }),
        }
    }

    /// Borrow a label column by name.
    pub fn label(&self, name: &str) -> Result<&[String]> {
        match self.column(name)? {
            Column::Label(v) => Ok(v),
            Column::Float(_) => Err(TidyError::ColumnTypeMismatch {
                column: name.to_string(),
                expected: "label",
            }),
        }
    }

    /// Select the given row indices into a new frame with the same columns.
    pub fn take(&self, indices: &[usize]) -> Frame {
        Frame {
            columns: self
                .columns
                .iter()
                .map(|(n, c)| (n.clone(), c.take(indices)))
                .collect(),
        }
    }

    /// Build the numeric design matrix for the given predictor columns,
    /// with a leading column of ones when `intercept` is set.
    ///
    /// Column order in the matrix follows `terms` order.
    pub fn design_matrix(&self, terms: &[String], intercept: bool) -> Result<Array2<f64>> {
        let n = self.n_rows();
        let p = terms.len() + usize::from(intercept);
        if p == 0 {
            return Err(TidyError::EmptyInput(
                "design matrix has no columns".to_string(),
            ));
        }

        let mut x = Array2::zeros((n, p));
        let mut j = 0;
        if intercept {
            x.column_mut(0).fill(1.0);
            j = 1;
        }
        for term in terms {
            let col = self.float(term)?;
            for (i, &v) in col.iter().enumerate() {
                x[[i, j]] = v;
            }
            j += 1;
        }
        Ok(x)
    }

    /// Partition rows by the value of a key column.
    ///
    /// The key column may be a label column (grouped by value) or a float
    /// column (grouped by formatted value). Partitions come back in the
    /// order each key first appears; every partition is non-empty and
    /// carries all columns of the parent frame.
    pub fn group_by(&self, key: &str) -> Result<Vec<(GroupKey, Frame)>> {
        let keys: Vec<String> = match self.column(key)? {
            Column::Label(v) => v.clone(),
            Column::Float(v) => v.iter().map(|x| x.to_string()).collect(),
        };

        let mut order: Vec<String> = Vec::new();
        let mut buckets: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, k) in keys.iter().enumerate() {
            let bucket = buckets.entry(k.clone()).or_insert_with(|| {
                order.push(k.clone());
                Vec::new()
            });
            bucket.push(i);
        }

        Ok(order
            .into_iter()
            .map(|k| {
                let indices = &buckets[&k];
                (GroupKey(k), self.take(indices))
            })
            .collect())
    }
}

// =============================================================================
// Tests
// =============================================================================
