// =============================================================================
// Pearson Correlation Test
// =============================================================================
//
// Tests the association between two numeric variables:
//
//     r = cov(x, y) / (sd(x) * sd(y))
//     t = r * sqrt((n - 2) / (1 - r²)),   df = n - 2
//
// The confidence interval uses the Fisher z transform: atanh(r) is
// approximately normal with standard error 1/sqrt(n - 3), so the interval
// is built on the z scale and mapped back through tanh. This needs n > 3.
//
// =============================================================================

use crate::error::{Result, TidyError};
use crate::frame::Frame;
use crate::inference::{confidence_interval_z, pvalue_t};
use crate::models::ModelResult;

/// Model-kind tag for correlation tests.
pub const CORRELATION_KIND: &str = "correlation";

/// Confidence level of the reported interval.
const CONFIDENCE: f64 = 0.95;

/// An immutable Pearson correlation test result.
#[derive(Debug, Clone)]
pub struct CorrelationFit {
    /// Name of the first variable.
    pub x_name: String,
    /// Name of the second variable.
    pub y_name: String,
    /// Sample correlation coefficient r.
    pub estimate: f64,
    /// T-statistic of the test of r = 0.
    pub statistic: f64,
    /// Degrees of freedom (n - 2).
    pub df: f64,
    /// Two-sided p-value.
    pub p_value: f64,
    /// Lower bound of the 95% confidence interval.
    pub conf_low: f64,
    /// Upper bound of the 95% confidence interval.
    pub conf_high: f64,
    /// Number of observation pairs.
    pub n_obs: usize,
}

impl ModelResult for CorrelationFit {
    fn kind(&self) -> &'static str {
        CORRELATION_KIND
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

impl CorrelationFit {
    /// Standard error of r implied by the t-statistic: sqrt((1-r²)/(n-2)).
    pub fn std_error(&self) -> f64 {
        ((1.0 - self.estimate * self.estimate) / self.df).sqrt()
    }

    /// Display name of the tested pair, e.g. `cor(speed, dist)`.
    pub fn term_name(&self) -> String {
        format!("cor({}, {})", self.x_name, self.y_name)
    }
}

/// Run a Pearson correlation test between two float columns of `data`.
///
/// # Errors
/// * `UnknownColumn` / `ColumnTypeMismatch` for missing or non-numeric columns
/// * `InsufficientObservations` when n ≤ 3 (the Fisher interval is undefined)
/// * `InvalidValue` when either variable is constant
pub fn fit_correlation(x: &str, y: &str, data: &Frame) -> Result<CorrelationFit> {
    let xs = data.float(x)?;
    let ys = data.float(y)?;

    let n = xs.len();
    if n <= 3 {
        return Err(TidyError::InsufficientObservations { needed: 4, got: n });
    }

    let nf = n as f64;
    let x_mean = xs.sum() / nf;
    let y_mean = ys.sum() / nf;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (&xi, &yi) in xs.iter().zip(ys.iter()) {
        let dx = xi - x_mean;
        let dy = yi - y_mean;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx == 0.0 || syy == 0.0 {
        return Err(TidyError::InvalidValue(format!(
            "correlation undefined: '{}' is constant",
            if sxx == 0.0 { x } else { y }
        )));
    }

    let r = sxy / (sxx * syy).sqrt();
    let df = nf - 2.0;
    let statistic = r * (df / (1.0 - r * r)).sqrt();
    let p_value = pvalue_t(statistic, df);

    // Fisher z interval, mapped back to the r scale
    let z = r.atanh();
    let z_se = 1.0 / (nf - 3.0).sqrt();
    let (z_low, z_high) = confidence_interval_z(z, z_se, CONFIDENCE);
    let (conf_low, conf_high) = (z_low.tanh(), z_high.tanh());

    Ok(CorrelationFit {
        x_name: x.to_string(),
        y_name: y.to_string(),
        estimate: r,
        statistic,
        df,
        p_value,
        conf_low,
        conf_high,
        n_obs: n,
    })
}

// =============================================================================
// Tests
// =============================================================================
