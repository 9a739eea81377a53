// =============================================================================
// Correlation Test Adapter
// =============================================================================
//
// A correlation test normalizes to a single term row - the tested pair -
// under the same schema as regression coefficients, which is what lets
// correlation results sit in one table with model terms and be filtered
// by `p_value` uniformly. There is no per-observation view: augmentation
// is a typed error, not an empty table.
//
// =============================================================================

use crate::error::{Result, TidyError};
use crate::frame::Frame;
use crate::models::correlation::{CorrelationFit, CORRELATION_KIND};
use crate::tidy::{AugmentedRow, SummaryRow, TermRow, TidyModel};

impl TidyModel for CorrelationFit {
    const KIND: &'static str = CORRELATION_KIND;

    fn term_rows(&self) -> Vec<TermRow> {
        vec![TermRow {
            term: self.term_name(),
            estimate: self.estimate,
            std_error: self.std_error(),
            statistic: self.statistic,
            p_value: self.p_value,
        }]
    }

    fn summary_row(&self) -> SummaryRow {
        SummaryRow::new()
            .push("estimate", self.estimate)
            .push("statistic", self.statistic)
            .push("p_value", self.p_value)
            .push("df", self.df)
            .push("conf_low", self.conf_low)
            .push("conf_high", self.conf_high)
            .push("n_obs", self.n_obs as f64)
    }

    fn augmented_rows(&self, _data: &Frame) -> Result<Vec<AugmentedRow>> {
        Err(TidyError::UnsupportedOperation {
            kind: CORRELATION_KIND.to_string(),
            operation: "augmentation",
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fit_correlation;
    use approx::assert_abs_diff_eq;

    fn frame() -> Frame {
        Frame::new()
            .push_float("x", vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])
            .unwrap()
            .push_float("y", vec![2.0, 1.0, 4.0, 3.0, 7.0, 5.0])
            .unwrap()
    }

    #[test]
    fn test_single_term_row_with_full_schema() {
        let fit = fit_correlation("x", "y", &frame()).unwrap();
        let rows = fit.term_rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].term, "cor(x, y)");
        assert_abs_diff_eq!(rows[0].estimate, fit.estimate, epsilon = 1e-12);
        assert!(rows[0].std_error.is_finite());
        assert!(rows[0].statistic.is_finite());
        assert!((0.0..=1.0).contains(&rows[0].p_value));
    }

    #[test]
    fn test_summary_has_no_regression_fields() {
        let fit = fit_correlation("x", "y", &frame()).unwrap();
        let row = fit.summary_row();
        assert!(row.get("estimate").is_some());
        assert!(row.get("conf_low").is_some());
        // Fields of the regression family are absent, not zero
        assert_eq!(row.get("r_squared"), None);
        assert_eq!(row.get("adj_r_squared"), None);
    }

    #[test]
    fn test_augmentation_is_unsupported() {
        let data = frame();
        let fit = fit_correlation("x", "y", &data).unwrap();
        let err = fit.augmented_rows(&data).unwrap_err();
        assert!(matches!(
            err,
            TidyError::UnsupportedOperation { operation: "augmentation", .. }
        ));
    }
}
