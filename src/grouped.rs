// =============================================================================
// Grouped-Model Runner
// =============================================================================
//
// Fits one model per partition of a frame and concatenates a chosen
// tabular view across partitions, with the group key attached to every
// output row.
//
// Partitions are fully independent: each gets its own sub-frame and its
// own model fit, and nothing is shared between them but the final append.
// That makes the opt-in parallel mode safe - partitions run on the rayon
// pool and results are collected in partition order, so sequential and
// parallel runs produce identical tables.
//
// FAILURE POLICY
// --------------
// A partition's fit can fail (insufficient rows, constant predictor, ...).
// The policy is explicit and uniform for the whole run:
//
//   - FailFast (default): the first failing partition aborts the run with
//     an error naming its group key.
//   - BestEffort: failing partitions are recorded as error markers next to
//     the surviving rows; nothing is silently dropped.
//
// =============================================================================

use log::{debug, warn};
use rayon::prelude::*;

use crate::error::{Result, TidyError};
use crate::frame::{Frame, GroupKey};
use crate::models::ModelResult;
use crate::tidy::{
    augment_table, summary_table, term_table, AdapterRegistry, AugmentedRow, GroupedTable,
    PartitionFailure, SummaryRow, TermRow,
};

/// What a grouped run does when one partition's fit fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Abort the whole run on the first failing partition, reporting its
    /// group key.
    #[default]
    FailFast,
    /// Keep going; failed partitions become per-partition error markers in
    /// the output.
    BestEffort,
}

/// Runs a model fit per partition and builds combined keyed tables.
pub struct GroupedRunner<'a> {
    registry: &'a AdapterRegistry,
    policy: FailurePolicy,
    parallel: bool,
}

impl<'a> GroupedRunner<'a> {
    /// A sequential, fail-fast runner over `registry`'s model kinds.
    pub fn new(registry: &'a AdapterRegistry) -> Self {
        GroupedRunner {
            registry,
            policy: FailurePolicy::FailFast,
            parallel: false,
        }
    }

    /// Set the failure policy for the whole run.
    pub fn policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Execute partitions on the rayon thread pool. Output order is
    /// unchanged.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Fit per partition and build the combined per-term table.
    pub fn term_tables<M, F>(
        &self,
        frame: &Frame,
        key: &str,
        fit: F,
    ) -> Result<GroupedTable<TermRow>>
    where
        M: ModelResult,
        F: Fn(&Frame) -> Result<M> + Sync,
    {
        self.run(frame, key, |sub| {
            let model = fit(sub)?;
            term_table(self.registry, &model)
        })
    }

    /// Fit per partition and build the combined summary table (one row per
    /// partition).
    pub fn summary_tables<M, F>(
        &self,
        frame: &Frame,
        key: &str,
        fit: F,
    ) -> Result<GroupedTable<SummaryRow>>
    where
        M: ModelResult,
        F: Fn(&Frame) -> Result<M> + Sync,
    {
        self.run(frame, key, |sub| {
            let model = fit(sub)?;
            Ok(vec![summary_table(self.registry, &model)?])
        })
    }

    /// Fit per partition and build the combined per-observation table.
    pub fn augmented_tables<M, F>(
        &self,
        frame: &Frame,
        key: &str,
        fit: F,
    ) -> Result<GroupedTable<AugmentedRow>>
    where
        M: ModelResult,
        F: Fn(&Frame) -> Result<M> + Sync,
    {
        self.run(frame, key, |sub| {
            let model = fit(sub)?;
            augment_table(self.registry, &model, sub)
        })
    }

    /// Partition, build per partition, and combine under the failure
    /// policy. `build` owns the fit-then-extract step for one partition.
    fn run<R, F>(&self, frame: &Frame, key: &str, build: F) -> Result<GroupedTable<R>>
    where
        R: Send,
        F: Fn(&Frame) -> Result<Vec<R>> + Sync,
    {
        let partitions = frame.group_by(key)?;
        debug!(
            "grouped run over '{}': {} partition(s), {} total rows",
            key,
            partitions.len(),
            frame.n_rows()
        );

        let build_one = |group: &GroupKey, sub: &Frame| -> Result<Vec<R>> {
            debug!("fitting group '{}' ({} rows)", group, sub.n_rows());
            build(sub)
        };

        let outcomes: Vec<(GroupKey, Result<Vec<R>>)> = if self.parallel {
            partitions
                .into_par_iter()
                .map(|(group, sub)| {
                    let outcome = build_one(&group, &sub);
                    (group, outcome)
                })
                .collect()
        } else {
            partitions
                .into_iter()
                .map(|(group, sub)| {
                    let outcome = build_one(&group, &sub);
                    (group, outcome)
                })
                .collect()
        };

        let mut table = GroupedTable::new();
        for (group, outcome) in outcomes {
            match outcome {
                Ok(rows) => {
                    table
                        .rows
                        .extend(rows.into_iter().map(|r| (group.clone(), r)));
                }
                Err(error) => match self.policy {
                    FailurePolicy::FailFast => {
                        return Err(error.for_group(group.as_str()));
                    }
                    FailurePolicy::BestEffort => {
                        warn!("group '{}' failed, continuing: {}", group, error);
                        table.failures.push(PartitionFailure { group, error });
                    }
                },
            }
        }
        Ok(table)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{fit_correlation, fit_linear};
    use crate::tidy::SummaryGrid;
    use approx::assert_abs_diff_eq;

    /// Two groups: "A" with 10 rows on y = 2x + 1, "B" with 3 rows on
    /// y = 5 - x. Key order in the data is A first.
    fn two_group_frame() -> Frame {
        let x: Vec<f64> = (0..10).map(|i| i as f64).chain(vec![1.0, 2.0, 3.0]).collect();
        let y: Vec<f64> = (0..10)
            .map(|i| 2.0 * i as f64 + 1.0)
            .chain(vec![4.0, 3.0, 2.0])
            .collect();
        let grp: Vec<&str> = std::iter::repeat("A")
            .take(10)
            .chain(std::iter::repeat("B").take(3))
            .collect();
        Frame::new()
            .push_float("x", x)
            .unwrap()
            .push_float("y", y)
            .unwrap()
            .push_label("grp", grp)
            .unwrap()
    }

    #[test]
    fn test_two_terms_times_two_groups_is_four_rows() {
        let registry = AdapterRegistry::with_builtins();
        let table = GroupedRunner::new(&registry)
            .term_tables(&two_group_frame(), "grp", |g| fit_linear("y ~ x", g))
            .unwrap();

        assert_eq!(table.len(), 4);
        assert!(table.failures.is_empty());
        // Key order is first appearance, not sorted
        assert_eq!(
            table.keys(),
            vec![&GroupKey::from("A"), &GroupKey::from("B")]
        );

        // Group A recovers y = 1 + 2x
        let a_rows = table.group("A");
        assert_eq!(a_rows[0].term, "(Intercept)");
        assert_abs_diff_eq!(a_rows[0].estimate, 1.0, epsilon = 1e-8);
        assert_abs_diff_eq!(a_rows[1].estimate, 2.0, epsilon = 1e-8);

        // Group B recovers y = 5 - x
        let b_rows = table.group("B");
        assert_abs_diff_eq!(b_rows[0].estimate, 5.0, epsilon = 1e-8);
        assert_abs_diff_eq!(b_rows[1].estimate, -1.0, epsilon = 1e-8);
    }

    #[test]
    fn test_grouped_matches_single_group_run() {
        let registry = AdapterRegistry::with_builtins();
        let frame = two_group_frame();
        let grouped = GroupedRunner::new(&registry)
            .term_tables(&frame, "grp", |g| fit_linear("y ~ x", g))
            .unwrap();

        // Build group B alone and compare row for row
        let b_frame = frame.group_by("grp").unwrap().remove(1).1;
        let fit = fit_linear("y ~ x", &b_frame).unwrap();
        let alone = crate::tidy::term_table(&registry, &fit).unwrap();

        let from_grouped = grouped.group("B");
        assert_eq!(from_grouped.len(), alone.len());
        for (g, a) in from_grouped.iter().zip(alone.iter()) {
            assert_eq!(*g, a);
        }
    }

    #[test]
    fn test_parallel_equals_sequential() {
        let registry = AdapterRegistry::with_builtins();
        let frame = two_group_frame();

        let sequential = GroupedRunner::new(&registry)
            .term_tables(&frame, "grp", |g| fit_linear("y ~ x", g))
            .unwrap();
        let parallel = GroupedRunner::new(&registry)
            .parallel(true)
            .term_tables(&frame, "grp", |g| fit_linear("y ~ x", g))
            .unwrap();

        assert_eq!(sequential.rows, parallel.rows);
    }

    #[test]
    fn test_fail_fast_names_the_group() {
        let registry = AdapterRegistry::with_builtins();
        // Group "B" has 3 rows: a correlation test needs 4
        let err = GroupedRunner::new(&registry)
            .term_tables(&two_group_frame(), "grp", |g| fit_correlation("x", "y", g))
            .unwrap_err();
        match err {
            TidyError::PartitionFittingFailure { group, source } => {
                assert_eq!(group, "B");
                assert!(matches!(
                    *source,
                    TidyError::InsufficientObservations { .. }
                ));
            }
            other => panic!("expected PartitionFittingFailure, got {other:?}"),
        }
    }

    #[test]
    fn test_best_effort_keeps_surviving_groups() {
        let registry = AdapterRegistry::with_builtins();
        let table = GroupedRunner::new(&registry)
            .policy(FailurePolicy::BestEffort)
            .term_tables(&two_group_frame(), "grp", |g| fit_correlation("x", "y", g))
            .unwrap();

        // Group A succeeds, group B is an error marker
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows[0].0, GroupKey::from("A"));
        assert_eq!(table.failures.len(), 1);
        assert_eq!(table.failures[0].group, GroupKey::from("B"));
        assert!(matches!(
            table.failures[0].error,
            TidyError::InsufficientObservations { .. }
        ));
    }

    #[test]
    fn test_grouped_summaries_into_grid() {
        let registry = AdapterRegistry::with_builtins();
        let table = GroupedRunner::new(&registry)
            .summary_tables(&two_group_frame(), "grp", |g| fit_linear("y ~ x", g))
            .unwrap();
        assert_eq!(table.len(), 2);

        let grid = SummaryGrid::from(&table);
        assert_eq!(grid.rows.len(), 2);
        // Exact fit in group A
        assert_abs_diff_eq!(grid.cell("A", "r_squared").unwrap(), 1.0, epsilon = 1e-8);
        assert_eq!(grid.cell("A", "n_obs"), Some(10.0));
        assert_eq!(grid.cell("B", "n_obs"), Some(3.0));
    }

    #[test]
    fn test_grouped_augmentation_row_counts() {
        let registry = AdapterRegistry::with_builtins();
        let frame = two_group_frame();
        let table = GroupedRunner::new(&registry)
            .augmented_tables(&frame, "grp", |g| fit_linear("y ~ x", g))
            .unwrap();
        // One augmented row per input observation
        assert_eq!(table.len(), frame.n_rows());
        assert_eq!(table.group("A").len(), 10);
        assert_eq!(table.group("B").len(), 3);
        // Exact fit: group A residuals are zero
        for row in table.group("A") {
            assert_abs_diff_eq!(row.residual, 0.0, epsilon = 1e-8);
        }
    }
}
