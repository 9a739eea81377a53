// =============================================================================
// Ordinary Least Squares
// =============================================================================
//
// Fits y = Xβ + ε by solving the normal equations (X'X)β = X'y.
//
// The solve uses Cholesky decomposition (X'X is symmetric positive
// definite for a full-rank design) and falls back to LU when Cholesky
// fails. A singular system is reported as an error rather than producing
// garbage coefficients - the usual cause is multicollinearity in the
// predictors.
//
// Standard errors come from the scaled inverse: Var(β̂) = σ̂² (X'X)⁻¹ with
// σ̂² = RSS / (n - p), t-statistics use n - p degrees of freedom.
//
// =============================================================================

use log::debug;
use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2};
use statrs::distribution::{ContinuousCDF, FisherSnedecor};

use crate::diagnostics::{
    adj_r_squared, aic, bic, log_likelihood_gaussian, r_squared, resid_response,
};
use crate::error::{Result, TidyError};
use crate::formula::Formula;
use crate::frame::Frame;
use crate::inference::pvalue_t;
use crate::models::ModelResult;

/// Model-kind tag for OLS fits.
pub const LINEAR_KIND: &str = "linear";

/// An immutable fitted linear model.
#[derive(Debug, Clone)]
pub struct LinearFit {
    /// The parsed formula the model was fit from.
    pub formula: Formula,
    /// Term names in design-matrix order ("(Intercept)" first when present).
    pub term_names: Vec<String>,
    /// Coefficient estimates β̂, one per term.
    pub coefficients: Array1<f64>,
    /// Standard errors of the coefficients.
    pub std_errors: Array1<f64>,
    /// Fitted values Xβ̂, in input observation order.
    pub fitted_values: Array1<f64>,
    /// Response residuals y - Xβ̂.
    pub residuals: Array1<f64>,
    /// Residual standard error σ̂ (on n - p degrees of freedom).
    pub sigma: f64,
    /// R².
    pub r_squared: f64,
    /// Adjusted R².
    pub adj_r_squared: f64,
    /// Overall F statistic with its (numerator, denominator) degrees of
    /// freedom; absent for the intercept-only model.
    pub f_statistic: Option<(f64, f64, f64)>,
    /// P-value of the overall F test; absent with `f_statistic`.
    pub f_pvalue: Option<f64>,
    /// Gaussian log-likelihood.
    pub log_likelihood: f64,
    /// Akaike information criterion.
    pub aic: f64,
    /// Bayesian information criterion.
    pub bic: f64,
    /// Residual degrees of freedom n - p.
    pub df_residual: f64,
    /// Number of observations fit on.
    pub n_obs: usize,
}

impl ModelResult for LinearFit {
    fn kind(&self) -> &'static str {
        LINEAR_KIND
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// Fit an ordinary least squares model described by `formula` on `data`.
///
/// # Arguments
/// * `formula` - e.g. `"y ~ x1 + x2"`; see [`Formula`] for the grammar
/// * `data` - frame holding the response and every predictor as float columns
///
/// # Errors
/// * `FormulaError` for an unparseable formula
/// * `UnknownColumn` / `ColumnTypeMismatch` for missing or non-numeric variables
/// * `EmptyInput` for a zero-row frame
/// * `InsufficientObservations` when n ≤ p
/// * `LinearAlgebra` for a singular design matrix
pub fn fit_linear(formula: &str, data: &Frame) -> Result<LinearFit> {
    let formula = Formula::parse(formula)?;
    let y = data.float(&formula.response)?.clone();
    let x = data.design_matrix(&formula.predictors, formula.intercept)?;

    let n = y.len();
    let p = x.ncols();
    if n == 0 {
        return Err(TidyError::EmptyInput(format!(
            "response '{}' has no observations",
            formula.response
        )));
    }
    if n <= p {
        return Err(TidyError::InsufficientObservations {
            needed: p + 1,
            got: n,
        });
    }

    let (coefficients, xtx_inv) = solve_normal_equations(&x, &y)?;

    let fitted_values = x.dot(&coefficients);
    let residuals = resid_response(&y, &fitted_values);
    let rss: f64 = residuals.iter().map(|r| r * r).sum();
    let df_residual = (n - p) as f64;
    let sigma2 = rss / df_residual;

    let std_errors: Array1<f64> = (0..p)
        .map(|j| (sigma2 * xtx_inv[[j, j]]).sqrt())
        .collect();

    let r2 = if formula.intercept {
        r_squared(&y, &fitted_values)
    } else {
        // Without an intercept the baseline is the zero model, so R² is
        // computed against the uncentered total sum of squares.
        let tss: f64 = y.iter().map(|yi| yi * yi).sum();
        if tss == 0.0 {
            f64::NAN
        } else {
            1.0 - rss / tss
        }
    };
    let adj_r2 = adj_r_squared(r2, n, p);

    let (f_statistic, f_pvalue) = overall_f_test(r2, n, p, formula.intercept);

    let log_likelihood = log_likelihood_gaussian(&y, &fitted_values);
    let k = p + 1; // coefficients plus the variance estimate

    let mut term_names = Vec::with_capacity(p);
    if formula.intercept {
        term_names.push("(Intercept)".to_string());
    }
    term_names.extend(formula.predictors.iter().cloned());

    Ok(LinearFit {
        term_names,
        coefficients,
        std_errors,
        fitted_values,
        residuals,
        sigma: sigma2.sqrt(),
        r_squared: r2,
        adj_r_squared: adj_r2,
        f_statistic,
        f_pvalue,
        log_likelihood,
        aic: aic(log_likelihood, k),
        bic: bic(log_likelihood, k, n),
        df_residual,
        n_obs: n,
        formula,
    })
}

impl LinearFit {
    /// T-statistic for each coefficient (estimate / std_error).
    pub fn t_statistics(&self) -> Array1<f64> {
        self.coefficients
            .iter()
            .zip(self.std_errors.iter())
            .map(|(&b, &se)| b / se)
            .collect()
    }

    /// Two-sided p-value for each coefficient on n - p degrees of freedom.
    pub fn p_values(&self) -> Array1<f64> {
        self.t_statistics()
            .iter()
            .map(|&t| pvalue_t(t, self.df_residual))
            .collect()
    }
}

/// Solve (X'X)β = X'y, returning the coefficients and (X'X)⁻¹.
///
/// Cholesky first, LU as fallback, error if the system is singular.
fn solve_normal_equations(x: &Array2<f64>, y: &Array1<f64>) -> Result<(Array1<f64>, Array2<f64>)> {
    let (n, p) = (x.nrows(), x.ncols());

    let x_na = DMatrix::from_fn(n, p, |i, j| x[[i, j]]);
    let y_na = DVector::from_fn(n, |i, _| y[i]);

    let xtx = x_na.transpose() * &x_na;
    let xty = x_na.transpose() * y_na;

    let (coefficients, xtx_inv) = match xtx.clone().cholesky() {
        Some(chol) => {
            let beta = chol.solve(&xty);
            let inv = chol.solve(&DMatrix::identity(p, p));
            (beta, inv)
        }
        None => {
            debug!("Cholesky failed for {}x{} normal equations, trying LU", p, p);
            let beta = xtx.clone().lu().solve(&xty).ok_or_else(singular_error)?;
            let inv = xtx.try_inverse().ok_or_else(singular_error)?;
            (beta, inv)
        }
    };

    let coef_out: Array1<f64> = coefficients.iter().copied().collect();
    let inv_out = Array2::from_shape_fn((p, p), |(i, j)| xtx_inv[(i, j)]);
    Ok((coef_out, inv_out))
}

fn singular_error() -> TidyError {
    TidyError::LinearAlgebra(
        "failed to solve normal equations - design matrix may be singular. \
         This often indicates multicollinearity in predictors."
            .to_string(),
    )
}

/// Overall F test of the model against its baseline.
///
/// With an intercept the baseline is the mean model (numerator df p - 1);
/// without one it is the zero model (numerator df p). Undefined for the
/// intercept-only model.
fn overall_f_test(
    r2: f64,
    n: usize,
    p: usize,
    intercept: bool,
) -> (Option<(f64, f64, f64)>, Option<f64>) {
    let df1 = if intercept { p as f64 - 1.0 } else { p as f64 };
    if df1 < 1.0 {
        return (None, None);
    }
    let df2 = (n - p) as f64;
    let f = (r2 / df1) / ((1.0 - r2) / df2);
    let pval = match FisherSnedecor::new(df1, df2) {
        Ok(dist) => 1.0 - dist.cdf(f),
        Err(_) => f64::NAN,
    };
    (Some((f, df1, df2)), Some(pval))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn exact_line() -> Frame {
        // y = 1 + 2x exactly
        Frame::new()
            .push_float("x", vec![0.0, 1.0, 2.0, 3.0, 4.0])
            .unwrap()
            .push_float("y", vec![1.0, 3.0, 5.0, 7.0, 9.0])
            .unwrap()
    }

    fn noisy_line() -> Frame {
        Frame::new()
            .push_float("x", vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])
            .unwrap()
            .push_float("y", vec![5.1, 7.9, 11.2, 13.8, 17.1, 19.0])
            .unwrap()
    }

    #[test]
    fn test_recovers_exact_coefficients() {
        let fit = fit_linear("y ~ x", &exact_line()).unwrap();
        assert_eq!(fit.term_names, vec!["(Intercept)", "x"]);
        assert_abs_diff_eq!(fit.coefficients[0], 1.0, epsilon = 1e-8);
        assert_abs_diff_eq!(fit.coefficients[1], 2.0, epsilon = 1e-8);
        assert_abs_diff_eq!(fit.r_squared, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_noisy_fit_statistics() {
        let fit = fit_linear("y ~ x", &noisy_line()).unwrap();
        // Roughly y ≈ 2.2 + 2.9x
        assert!((fit.coefficients[1] - 2.9).abs() < 0.3);
        assert!(fit.r_squared > 0.99);
        assert!(fit.adj_r_squared < fit.r_squared);
        assert_abs_diff_eq!(fit.df_residual, 4.0, epsilon = 1e-12);

        // Slope should be overwhelmingly significant, p-values in [0, 1]
        let pvals = fit.p_values();
        assert!(pvals[1] < 1e-4);
        assert!(pvals.iter().all(|p| (0.0..=1.0).contains(p)));

        // F test present with df (1, 4)
        let (f, df1, df2) = fit.f_statistic.unwrap();
        assert!(f > 100.0);
        assert_abs_diff_eq!(df1, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(df2, 4.0, epsilon = 1e-12);
        assert!(fit.f_pvalue.unwrap() < 0.001);
    }

    #[test]
    fn test_fitted_plus_residual_reconstructs_response() {
        let frame = noisy_line();
        let fit = fit_linear("y ~ x", &frame).unwrap();
        let y = frame.float("y").unwrap();
        for i in 0..fit.n_obs {
            assert_abs_diff_eq!(
                fit.fitted_values[i] + fit.residuals[i],
                y[i],
                epsilon = 1e-10
            );
        }
    }

    #[test]
    fn test_intercept_only_model() {
        let fit = fit_linear("y ~ 1", &noisy_line()).unwrap();
        assert_eq!(fit.term_names, vec!["(Intercept)"]);
        // Intercept-only OLS fits the mean
        let y = noisy_line();
        let mean = y.float("y").unwrap().sum() / 6.0;
        assert_abs_diff_eq!(fit.coefficients[0], mean, epsilon = 1e-10);
        assert!(fit.f_statistic.is_none());
        assert!(fit.f_pvalue.is_none());
    }

    #[test]
    fn test_no_intercept_model() {
        let fit = fit_linear("y ~ 0 + x", &exact_line()).unwrap();
        assert_eq!(fit.term_names, vec!["x"]);
        assert_eq!(fit.coefficients.len(), 1);
        // F test defined with numerator df = 1
        let (_, df1, _) = fit.f_statistic.unwrap();
        assert_abs_diff_eq!(df1, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_insufficient_observations() {
        let frame = Frame::new()
            .push_float("x", vec![1.0, 2.0])
            .unwrap()
            .push_float("y", vec![1.0, 2.0])
            .unwrap();
        let result = fit_linear("y ~ x", &frame);
        assert!(matches!(
            result,
            Err(TidyError::InsufficientObservations { needed: 3, got: 2 })
        ));
    }

    #[test]
    fn test_singular_design_rejected() {
        // x2 = 2 * x1: perfectly collinear
        let frame = Frame::new()
            .push_float("x1", vec![1.0, 2.0, 3.0, 4.0])
            .unwrap()
            .push_float("x2", vec![2.0, 4.0, 6.0, 8.0])
            .unwrap()
            .push_float("y", vec![1.0, 2.0, 3.0, 4.0])
            .unwrap();
        let result = fit_linear("y ~ x1 + x2", &frame);
        assert!(matches!(result, Err(TidyError::LinearAlgebra(_))));
    }

    #[test]
    fn test_unknown_predictor() {
        let result = fit_linear("y ~ z", &exact_line());
        assert!(matches!(result, Err(TidyError::UnknownColumn(_))));
    }

    #[test]
    fn test_aic_bic_consistent_with_loglik() {
        let fit = fit_linear("y ~ x", &noisy_line()).unwrap();
        // k = 2 coefficients + 1 variance
        assert_abs_diff_eq!(fit.aic, -2.0 * fit.log_likelihood + 6.0, epsilon = 1e-10);
        assert_abs_diff_eq!(
            fit.bic,
            -2.0 * fit.log_likelihood + 6.0_f64.ln() * 3.0,
            epsilon = 1e-10
        );
    }
}
