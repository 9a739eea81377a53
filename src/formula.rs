//! Formula parsing for model specifications.
//!
//! Parses the `"y ~ x1 + x2"` surface that fitting calls accept into a
//! response name, predictor names, and an intercept flag. The term `1`
//! keeps the intercept (the default), `0` removes it, so `"y ~ 1"` is the
//! intercept-only model and `"y ~ 0 + x"` a through-the-origin fit.

use crate::error::{Result, TidyError};

/// A parsed model formula.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    pub response: String,
    pub predictors: Vec<String>,
    pub intercept: bool,
}

impl Formula {
    /// Parse a formula of the form `response ~ term + term + ...`.
    pub fn parse(input: &str) -> Result<Formula> {
        let mut sides = input.splitn(2, '~');
        let lhs = sides.next().unwrap_or("").trim();
        let rhs = match sides.next() {
            Some(r) => r.trim(),
            None => {
                return Err(TidyError::FormulaError(format!(
                    "'{}' has no '~' separator",
                    input
                )))
            }
        };

        if lhs.is_empty() {
            return Err(TidyError::FormulaError(format!(
                "'{}' has no response variable",
                input
            )));
        }
        if rhs.is_empty() {
            return Err(TidyError::FormulaError(format!(
                "'{}' has no right-hand side",
                input
            )));
        }

        let mut predictors = Vec::new();
        let mut intercept = true;
        for term in rhs.split('+') {
            let term = term.trim();
            match term {
                "" => {
                    return Err(TidyError::FormulaError(format!(
                        "'{}' contains an empty term",
                        input
                    )))
                }
                "1" => intercept = true,
                "0" => intercept = false,
                name => {
                    if predictors.iter().any(|p| p == name) {
                        return Err(TidyError::FormulaError(format!(
                            "term '{}' appears more than once",
                            name
                        )));
                    }
                    predictors.push(name.to_string());
                }
            }
        }

        if predictors.is_empty() && !intercept {
            return Err(TidyError::FormulaError(format!(
                "'{}' specifies no terms at all",
                input
            )));
        }

        Ok(Formula {
            response: lhs.to_string(),
            predictors,
            intercept,
        })
    }

    /// Number of coefficients this formula estimates.
    pub fn n_params(&self) -> usize {
        self.predictors.len() + usize::from(self.intercept)
    }
}

impl std::str::FromStr for Formula {
    type Err = TidyError;

    fn from_str(s: &str) -> Result<Formula> {
        Formula::parse(s)
    }
}
