// =============================================================================
// Statistical Inference Helpers
// =============================================================================
//
// P-values and confidence intervals for coefficient estimates, shared by
// the model backends. All functions are total: non-finite or out-of-domain
// inputs yield NaN rather than panicking, so a bad coefficient never takes
// down a whole table build.
//
// =============================================================================

use statrs::distribution::{ContinuousCDF, Normal, StudentsT};

/// Degrees of freedom above which the t-distribution is treated as normal.
const LARGE_DF: f64 = 1000.0;

/// Two-sided p-value for a t-statistic with `df` degrees of freedom.
///
/// P(|T| > |t|) under the null of a zero coefficient. Falls back to the
/// normal approximation for very large `df`.
pub fn pvalue_t(t: f64, df: f64) -> f64 {
    if !t.is_finite() || df <= 0.0 {
        return f64::NAN;
    }
    if df > LARGE_DF {
        return pvalue_z(t);
    }
    match StudentsT::new(0.0, 1.0, df) {
        Ok(dist) => 2.0 * (1.0 - dist.cdf(t.abs())),
        Err(_) => f64::NAN,
    }
}

/// Two-sided p-value for a z-statistic under the standard normal.
pub fn pvalue_z(z: f64) -> f64 {
    if !z.is_finite() {
        return f64::NAN;
    }
    let normal = Normal::new(0.0, 1.0).unwrap();
    2.0 * (1.0 - normal.cdf(z.abs()))
}

/// Confidence interval `estimate ± t_crit * std_error` from the
/// t-distribution. `confidence` is the coverage level, e.g. 0.95.
pub fn confidence_interval_t(
    estimate: f64,
    std_error: f64,
    df: f64,
    confidence: f64,
) -> (f64, f64) {
    if !estimate.is_finite() || !std_error.is_finite() || std_error <= 0.0 || df <= 0.0 {
        return (f64::NAN, f64::NAN);
    }
    if df > LARGE_DF {
        return confidence_interval_z(estimate, std_error, confidence);
    }
    let dist = match StudentsT::new(0.0, 1.0, df) {
        Ok(d) => d,
        Err(_) => return (f64::NAN, f64::NAN),
    };
    let margin = dist.inverse_cdf(1.0 - (1.0 - confidence) / 2.0) * std_error;
    (estimate - margin, estimate + margin)
}

/// Confidence interval from the standard normal.
pub fn confidence_interval_z(estimate: f64, std_error: f64, confidence: f64) -> (f64, f64) {
    if !estimate.is_finite() || !std_error.is_finite() || std_error <= 0.0 {
        return (f64::NAN, f64::NAN);
    }
    let normal = Normal::new(0.0, 1.0).unwrap();
    let margin = normal.inverse_cdf(1.0 - (1.0 - confidence) / 2.0) * std_error;
    (estimate - margin, estimate + margin)
}

/// Significance stars for a p-value, for display alongside term tables.
///
/// "***" below 0.001, "**" below 0.01, "*" below 0.05, "." below 0.1.
pub fn significance_stars(pvalue: f64) -> &'static str {
    if pvalue < 0.001 {
        "***"
    } else if pvalue < 0.01 {
        "**"
    } else if pvalue < 0.05 {
        "*"
    } else if pvalue < 0.1 {
        "."
    } else {
        ""
    }
}

// =============================================================================
// Tests
// =============================================================================
