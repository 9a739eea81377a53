// =============================================================================
// Tidy Views
// =============================================================================
//
// The uniform tabular representations every model kind is normalized into:
//
//   - TermRow:      one row per estimated term, fixed schema
//   - SummaryRow:   one row per model, fields vary by kind
//   - AugmentedRow: one row per original observation
//
// The point of the fixed TermRow struct is that column names cannot drift
// between model kinds: `p_value` is `p_value` whether the row came from a
// regression or a hypothesis test, so combined tables filter and sort
// uniformly. Summary rows have kind-specific fields instead; `SummaryGrid`
// combines them into one rectangular table, filling holes with `None`
// rather than inventing zeroes.
//
// =============================================================================

mod correlation;
mod linear;
mod registry;

pub use registry::{AdapterRegistry, ModelAdapter, TidyModel};

use serde::Serialize;

use crate::error::{Result, TidyError};
use crate::frame::{Frame, GroupKey};
use crate::models::ModelResult;

// =============================================================================
// Row Types
// =============================================================================

/// One estimated term of a model, under the uniform schema.
///
/// All five fields are always populated, whatever model kind produced the
/// row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TermRow {
    /// Term name, e.g. `(Intercept)` or the predictor's column name.
    pub term: String,
    /// Point estimate of the term.
    pub estimate: f64,
    /// Standard error of the estimate.
    pub std_error: f64,
    /// Test statistic (estimate / std_error for the built-in kinds).
    pub statistic: f64,
    /// Two-sided p-value.
    pub p_value: f64,
}

/// One model's fit statistics as ordered name/value pairs.
///
/// Field sets vary by model kind; a field a kind does not define is simply
/// absent. Values are numeric throughout (counts and degrees of freedom
/// are carried as floats). Serializes as a flat map in field order.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    fields: Vec<(String, f64)>,
}

impl Serialize for SummaryRow {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl SummaryRow {
    pub fn new() -> Self {
        SummaryRow { fields: Vec::new() }
    }

    /// Append a field, preserving insertion order.
    pub fn push(mut self, name: &str, value: f64) -> Self {
        self.fields.push((name.to_string(), value));
        self
    }

    /// Append a field only when the value is present.
    pub fn push_opt(self, name: &str, value: Option<f64>) -> Self {
        match value {
            Some(v) => self.push(name, v),
            None => self,
        }
    }

    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    /// Field names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

impl Default for SummaryRow {
    fn default() -> Self {
        SummaryRow::new()
    }
}

/// One original observation with its model view attached, in input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AugmentedRow {
    /// Observed response value.
    pub observed: f64,
    /// Fitted value for this observation.
    pub fitted: f64,
    /// Response residual (observed - fitted).
    pub residual: f64,
}

// =============================================================================
// Build Entry Points
// =============================================================================

/// Build the per-term table for a model result via its registered adapter.
///
/// Rows come back in the order the fitting procedure reports terms; they
/// are never re-sorted here.
pub fn term_table(registry: &AdapterRegistry, model: &dyn ModelResult) -> Result<Vec<TermRow>> {
    registry.get(model.kind())?.term_rows(model)
}

/// Build the one-row fit-statistics summary for a model result.
pub fn summary_table(registry: &AdapterRegistry, model: &dyn ModelResult) -> Result<SummaryRow> {
    registry.get(model.kind())?.summary_row(model)
}

/// Build the per-observation table for a model result against the
/// observations it was fit on.
///
/// Fails with `DimensionMismatch` when the model's fitted values do not
/// align 1:1 with `data`'s rows, and `UnsupportedOperation` for kinds with
/// no per-observation view.
pub fn augment_table(
    registry: &AdapterRegistry,
    model: &dyn ModelResult,
    data: &Frame,
) -> Result<Vec<AugmentedRow>> {
    registry.get(model.kind())?.augmented_rows(model, data)
}

// =============================================================================
// Combined Tables
// =============================================================================

/// A failed partition in a best-effort grouped run.
#[derive(Debug)]
pub struct PartitionFailure {
    /// Key of the partition whose fit or build failed.
    pub group: GroupKey,
    /// What went wrong.
    pub error: TidyError,
}

/// Rows from a grouped run, each tagged with its partition's key.
///
/// Row order follows partition order (first appearance of each key in the
/// input), with each partition's rows in builder order. Under a best-effort
/// run, `failures` records the partitions that produced no rows; under
/// fail-fast it is always empty.
#[derive(Debug)]
pub struct GroupedTable<R> {
    pub rows: Vec<(GroupKey, R)>,
    pub failures: Vec<PartitionFailure>,
}

impl<R> GroupedTable<R> {
    pub(crate) fn new() -> Self {
        GroupedTable {
            rows: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Total number of rows across all groups.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Keys in output order, one entry per partition that produced rows.
    pub fn keys(&self) -> Vec<&GroupKey> {
        let mut keys: Vec<&GroupKey> = Vec::new();
        for (k, _) in &self.rows {
            if keys.last() != Some(&k) {
                keys.push(k);
            }
        }
        keys
    }

    /// Rows belonging to one group, in their original order.
    pub fn group(&self, key: &str) -> Vec<&R> {
        self.rows
            .iter()
            .filter(|(k, _)| k.as_str() == key)
            .map(|(_, r)| r)
            .collect()
    }
}

/// A rectangular view over summary rows with differing field sets.
///
/// Columns are the union of the input rows' fields, ordered by first
/// appearance; cells absent from a given row are `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryGrid {
    pub columns: Vec<String>,
    pub rows: Vec<(GroupKey, Vec<Option<f64>>)>,
}

impl SummaryGrid {
    /// Combine keyed summary rows into one rectangular table.
    pub fn from_keyed(rows: &[(GroupKey, SummaryRow)]) -> SummaryGrid {
        let mut columns: Vec<String> = Vec::new();
        for (_, row) in rows {
            for name in row.names() {
                if !columns.iter().any(|c| c == name) {
                    columns.push(name.to_string());
                }
            }
        }

        let grid_rows = rows
            .iter()
            .map(|(key, row)| {
                let cells = columns.iter().map(|c| row.get(c)).collect();
                (key.clone(), cells)
            })
            .collect();

        SummaryGrid {
            columns,
            rows: grid_rows,
        }
    }

    /// Cell lookup by group key and column name.
    pub fn cell(&self, key: &str, column: &str) -> Option<f64> {
        let j = self.columns.iter().position(|c| c == column)?;
        let (_, cells) = self.rows.iter().find(|(k, _)| k.as_str() == key)?;
        cells[j]
    }
}

impl From<&GroupedTable<SummaryRow>> for SummaryGrid {
    fn from(table: &GroupedTable<SummaryRow>) -> SummaryGrid {
        SummaryGrid::from_keyed(&table.rows)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_row_order_and_lookup() {
        let row = SummaryRow::new()
            .push("r_squared", 0.9)
            .push("aic", 42.0)
            .push_opt("f_statistic", None);
        assert_eq!(row.names().collect::<Vec<_>>(), vec!["r_squared", "aic"]);
        assert_eq!(row.get("aic"), Some(42.0));
        assert_eq!(row.get("f_statistic"), None);
    }

    #[test]
    fn test_grid_unions_columns_and_fills_missing() {
        let rows = vec![
            (
                GroupKey::from("a"),
                SummaryRow::new().push("r_squared", 0.8).push("aic", 10.0),
            ),
            (
                GroupKey::from("b"),
                SummaryRow::new().push("aic", 12.0).push("df", 4.0),
            ),
        ];
        let grid = SummaryGrid::from_keyed(&rows);
        assert_eq!(grid.columns, vec!["r_squared", "aic", "df"]);
        assert_eq!(grid.cell("a", "aic"), Some(10.0));
        // Absent fields are None, not zero
        assert_eq!(grid.cell("b", "r_squared"), None);
        assert_eq!(grid.cell("a", "df"), None);
    }

    #[test]
    fn test_term_schema_uniform_across_kinds() {
        use crate::models::{fit_correlation, fit_linear};

        let frame = Frame::new()
            .push_float("x", vec![1.0, 2.0, 3.0, 4.0, 5.0])
            .unwrap()
            .push_float("y", vec![2.2, 3.8, 6.1, 8.3, 9.9])
            .unwrap();
        let registry = AdapterRegistry::with_builtins();

        let lm = fit_linear("y ~ x", &frame).unwrap();
        let cor = fit_correlation("x", "y", &frame).unwrap();

        let field_names = |model: &dyn crate::models::ModelResult| -> Vec<String> {
            let rows = term_table(&registry, model).unwrap();
            let value = serde_json::to_value(&rows[0]).unwrap();
            value.as_object().unwrap().keys().cloned().collect()
        };

        let lm_fields = field_names(&lm);
        let cor_fields = field_names(&cor);
        assert_eq!(lm_fields, cor_fields);
        // serde_json orders object keys alphabetically
        assert_eq!(
            lm_fields,
            vec!["estimate", "p_value", "statistic", "std_error", "term"]
        );
    }

    #[test]
    fn test_summary_row_serializes_as_flat_map() {
        let row = SummaryRow::new().push("aic", 10.5).push("n_obs", 6.0);
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"aic":10.5,"n_obs":6.0}"#);
    }

    #[test]
    fn test_grouped_table_filtering() {
        let mut table: GroupedTable<u32> = GroupedTable::new();
        table.rows.push((GroupKey::from("a"), 1));
        table.rows.push((GroupKey::from("a"), 2));
        table.rows.push((GroupKey::from("b"), 3));
        assert_eq!(table.len(), 3);
        assert_eq!(table.group("a"), vec![&1, &2]);
        assert_eq!(
            table.keys(),
            vec![&GroupKey::from("a"), &GroupKey::from("b")]
        );
    }
}
