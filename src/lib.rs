// =============================================================================
// tidystats
// =============================================================================
//
// Uniform tabular views over heterogeneous statistical model results.
//
// Different model kinds report their results in different shapes; this
// library normalizes them into three flat tables with globally consistent
// column names, so results from many models can be filtered, sorted, and
// exported together:
//
//   - term table:      one row per estimated coefficient/term
//   - summary table:   one row per model of fit statistics
//   - augmented table: one row per original observation
//
// STRUCTURE:
// ----------
//   - frame:       in-memory named-column table and group_by partitioning
//   - formula:     "y ~ x1 + x2" model specifications
//   - models:      fitting backends (OLS, Pearson correlation)
//   - inference:   p-values, confidence intervals, significance stars
//   - diagnostics: residuals, R², log-likelihood, AIC/BIC
//   - tidy:        row types, adapter registry, table builders
//   - grouped:     per-partition model runs into combined keyed tables
//   - error:       error types used throughout the library
//
// FOR MAINTAINERS:
// ----------------
// To support a new model kind, implement `TidyModel` for its fit-result
// type and register it with `AdapterRegistry::register_model`. Callers of
// the table builders and the grouped runner need no changes.
//
// =============================================================================

pub mod diagnostics;
pub mod error;
pub mod formula;
pub mod frame;
pub mod grouped;
pub mod inference;
pub mod models;
pub mod tidy;

// Re-export the working surface at the top level so users can write
// `use tidystats::fit_linear` instead of `use tidystats::models::linear::fit_linear`.
pub use error::{Result, TidyError};
pub use formula::Formula;
pub use frame::{Column, Frame, GroupKey};
pub use grouped::{FailurePolicy, GroupedRunner};
pub use inference::{
    confidence_interval_t, confidence_interval_z, pvalue_t, pvalue_z, significance_stars,
};
pub use models::{fit_correlation, fit_linear, CorrelationFit, LinearFit, ModelResult};
pub use tidy::{
    augment_table, summary_table, term_table, AdapterRegistry, AugmentedRow, GroupedTable,
    ModelAdapter, PartitionFailure, SummaryGrid, SummaryRow, TermRow, TidyModel,
};
