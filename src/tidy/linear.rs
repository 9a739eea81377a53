// =============================================================================
// Linear Model Adapter
// =============================================================================
//
// Normalizes a fitted linear model into the three uniform views. Summary
// fields follow the regression-family convention: `r_squared` and
// `adj_r_squared` are always present, the overall F statistic only when
// the model has predictors.
//
// =============================================================================

use crate::error::{Result, TidyError};
use crate::frame::Frame;
use crate::models::linear::{LinearFit, LINEAR_KIND};
use crate::tidy::{AugmentedRow, SummaryRow, TermRow, TidyModel};

impl TidyModel for LinearFit {
    const KIND: &'static str = LINEAR_KIND;

    fn term_rows(&self) -> Vec<TermRow> {
        let t_stats = self.t_statistics();
        let p_values = self.p_values();
        self.term_names
            .iter()
            .enumerate()
            .map(|(j, name)| TermRow {
                term: name.clone(),
                estimate: self.coefficients[j],
                std_error: self.std_errors[j],
                statistic: t_stats[j],
                p_value: p_values[j],
            })
            .collect()
    }

    fn summary_row(&self) -> SummaryRow {
        let deviance: f64 = self.residuals.iter().map(|r| r * r).sum();
        SummaryRow::new()
            .push("r_squared", self.r_squared)
            .push("adj_r_squared", self.adj_r_squared)
            .push("sigma", self.sigma)
            .push_opt("statistic", self.f_statistic.map(|(f, _, _)| f))
            .push_opt("p_value", self.f_pvalue)
            .push("df", self.coefficients.len() as f64)
            .push("log_lik", self.log_likelihood)
            .push("aic", self.aic)
            .push("bic", self.bic)
            .push("deviance", deviance)
            .push("df_residual", self.df_residual)
            .push("n_obs", self.n_obs as f64)
    }

    fn augmented_rows(&self, data: &Frame) -> Result<Vec<AugmentedRow>> {
        if self.fitted_values.len() != data.n_rows() {
            return Err(TidyError::DimensionMismatch(format!(
                "model has {} fitted values but the frame has {} rows",
                self.fitted_values.len(),
                data.n_rows()
            )));
        }
        let observed = data.float(&self.formula.response)?;

        Ok(observed
            .iter()
            .zip(self.fitted_values.iter())
            .map(|(&obs, &fit)| AugmentedRow {
                observed: obs,
                fitted: fit,
                residual: obs - fit,
            })
            .collect())
    }
}

// =============================================================================
// Tests
// =============================================================================
