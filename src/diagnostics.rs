// =============================================================================
// Fit Diagnostics
// =============================================================================
//
// Goodness-of-fit measures shared by the linear backend and its summary
// view: residuals, R², adjusted R², Gaussian log-likelihood, AIC and BIC.
//
// =============================================================================

use ndarray::Array1;

/// Response residuals: y - fitted.
pub fn resid_response(y: &Array1<f64>, fitted: &Array1<f64>) -> Array1<f64> {
    y - fitted
}

/// Coefficient of determination.
///
/// 1 - RSS/TSS against the mean model. A constant response fit exactly
/// scores 1, fit with error scores 0.
pub fn r_squared(y: &Array1<f64>, fitted: &Array1<f64>) -> f64 {
    let n = y.len();
    if n == 0 {
        return f64::NAN;
    }
    let mean = y.sum() / n as f64;
    let tss: f64 = y.iter().map(|&yi| (yi - mean).powi(2)).sum();
    let rss: f64 = y
        .iter()
        .zip(fitted.iter())
        .map(|(&yi, &fi)| (yi - fi).powi(2))
        .sum();
    if tss == 0.0 {
        if rss == 0.0 {
            1.0
        } else {
            0.0
        }
    } else {
        1.0 - rss / tss
    }
}

/// Adjusted R² for a model with `p` estimated parameters on `n` observations.
pub fn adj_r_squared(r2: f64, n: usize, p: usize) -> f64 {
    if n <= p {
        return f64::NAN;
    }
    1.0 - (1.0 - r2) * (n as f64 - 1.0) / (n - p) as f64
}

/// Gaussian log-likelihood at the MLE variance estimate RSS/n.
///
/// Matches the value R reports for `logLik(lm(...))`.
pub fn log_likelihood_gaussian(y: &Array1<f64>, fitted: &Array1<f64>) -> f64 {
    let n = y.len() as f64;
    if n == 0.0 {
        return f64::NAN;
    }
    let rss: f64 = y
        .iter()
        .zip(fitted.iter())
        .map(|(&yi, &fi)| (yi - fi).powi(2))
        .sum();
    let sigma2 = rss / n;
    if sigma2 <= 0.0 {
        return f64::INFINITY;
    }
    -0.5 * n * ((2.0 * std::f64::consts::PI * sigma2).ln() + 1.0)
}

/// Akaike information criterion: -2·loglik + 2k, where `k` counts every
/// estimated parameter (coefficients plus the variance).
pub fn aic(log_likelihood: f64, k: usize) -> f64 {
    -2.0 * log_likelihood + 2.0 * k as f64
}

/// Bayesian information criterion: -2·loglik + ln(n)·k.
pub fn bic(log_likelihood: f64, k: usize, n: usize) -> f64 {
    -2.0 * log_likelihood + (n as f64).ln() * k as f64
}

// =============================================================================
// Tests
// =============================================================================
