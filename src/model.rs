//! Model specification: response family, response column and predictor terms.

use std::fmt;

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::sample::Partition;

/// Name given to the intercept coefficient.
pub const INTERCEPT: &str = "(Intercept)";

/// Response family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Family {
    /// Real-valued response, linear regression with a dispersion estimate.
    Continuous,
    /// Response in `[0, 1]`, logistic regression under the logit link.
    Binary,
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Continuous => f.write_str("linear"),
            Self::Binary => f.write_str("logistic"),
        }
    }
}

/// Which columns make up the model.
///
/// A term is either a column name or an interaction `a:b:…`, whose design
/// column is the element-wise product of the named columns. A `ModelSpec` is a
/// plain value: nothing is resolved until it meets a [`Partition`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Response family.
    pub family: Family,
    /// Response column.
    pub response: String,
    /// Predictor terms in model order.
    pub terms: Vec<String>,
    /// Whether an intercept column leads the design.
    pub intercept: bool,
}

impl ModelSpec {
    /// Spec with an intercept.
    pub fn new<S: Into<String>>(
        family: Family,
        response: impl Into<String>,
        terms: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            family,
            response: response.into(),
            terms: terms.into_iter().map(Into::into).collect(),
            intercept: true,
        }
    }

    /// Linear regression spec.
    pub fn linear<S: Into<String>>(response: impl Into<String>, terms: impl IntoIterator<Item = S>) -> Self {
        Self::new(Family::Continuous, response, terms)
    }

    /// Logistic regression spec.
    pub fn logistic<S: Into<String>>(response: impl Into<String>, terms: impl IntoIterator<Item = S>) -> Self {
        Self::new(Family::Binary, response, terms)
    }

    /// Drop the intercept column.
    #[must_use]
    pub fn without_intercept(mut self) -> Self {
        self.intercept = false;
        self
    }

    /// Parse `"y ~ a + b + a:b"`.
    ///
    /// `1` is a no-op term; `- 1` or `+ 0` removes the intercept. Anything
    /// fancier than sums of column names and interactions is rejected.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] on a malformed formula.
    pub fn parse(family: Family, formula: &str) -> Result<Self> {
        let (lhs, rhs) = formula
            .split_once('~')
            .ok_or_else(|| Error::InvalidArgument(format!("formula `{formula}` has no `~`")))?;

        let response = lhs.trim();
        if !is_name(response) {
            return Err(Error::InvalidArgument(format!("bad response `{response}`")));
        }

        let mut intercept = true;
        let mut terms: Vec<String> = Vec::new();
        // Normalise "a - 1" to "a + -1" so every piece carries its sign.
        for piece in rhs.replace('-', "+-").split('+') {
            let piece: String = piece.split_whitespace().collect();
            match piece.as_str() {
                "" if terms.is_empty() && rhs.trim_start().starts_with('-') => {}
                "1" => {}
                "0" | "-1" => intercept = false,
                "" => return Err(Error::InvalidArgument(format!("empty term in `{formula}`"))),
                term if term.split(':').all(is_name) => {
                    if !terms.iter().any(|t| t == term) {
                        terms.push(term.to_owned());
                    }
                }
                other => {
                    return Err(Error::InvalidArgument(format!("unsupported term `{other}`")));
                }
            }
        }

        if !intercept && terms.is_empty() {
            return Err(Error::InvalidArgument(format!("formula `{formula}` has no coefficients")));
        }

        Ok(Self {
            family,
            response: response.to_owned(),
            terms,
            intercept,
        })
    }

    /// Coefficient names in design-column order.
    pub fn coefficient_names(&self) -> Vec<String> {
        let intercept = self.intercept.then(|| INTERCEPT.to_owned());
        intercept.into_iter().chain(self.terms.iter().cloned()).collect()
    }

    /// Number of design columns.
    pub fn width(&self) -> usize {
        usize::from(self.intercept) + self.terms.len()
    }

    /// Resolve the design matrix `X` (rows × width) against `table`.
    ///
    /// # Errors
    /// [`Error::SchemaMismatch`] when a column a term needs is missing,
    /// [`Error::InvalidArgument`] when a term column holds NaN or infinity.
    pub fn design(&self, table: &Partition) -> Result<DMatrix<f64>> {
        let n = table.rows();
        let mut columns: Vec<Vec<f64>> = Vec::with_capacity(self.width());
        if self.intercept {
            columns.push(vec![1.0; n]);
        }
        for term in &self.terms {
            let mut values = vec![1.0; n];
            for factor in term.split(':') {
                let col = table.require(factor)?;
                values.iter_mut().zip(col).for_each(|(v, x)| *v *= x);
            }
            if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
                return Err(Error::InvalidArgument(format!("term `{term}` has non-finite value {bad}")));
            }
            columns.push(values);
        }
        Ok(DMatrix::from_fn(n, columns.len(), |i, j| columns[j][i]))
    }

    /// The response column of `table`, checked against the family's domain.
    ///
    /// # Errors
    /// [`Error::SchemaMismatch`] when the column is missing,
    /// [`Error::InvalidArgument`] for a non-finite value or a binary
    /// response outside `[0, 1]`.
    pub fn response_values<'a>(&self, table: &'a Partition) -> Result<&'a [f64]> {
        let y = table.require(&self.response)?;
        if let Some(bad) = y.iter().find(|v| !v.is_finite()) {
            return Err(Error::InvalidArgument(format!(
                "response `{}` has non-finite value {bad}",
                self.response
            )));
        }
        match self.family {
            Family::Continuous => Ok(y),
            Family::Binary => match y.iter().find(|v| !(0.0..=1.0).contains(*v)) {
                Some(bad) => Err(Error::InvalidArgument(format!(
                    "binary response `{}` has value {bad} outside [0, 1]",
                    self.response
                ))),
                None => Ok(y),
            },
        }
    }
}

impl fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ~ ", self.response)?;
        let mut rhs: Vec<&str> = self.terms.iter().map(String::as_str).collect();
        if !self.intercept {
            rhs.push("0");
        } else if rhs.is_empty() {
            rhs.push("1");
        }
        f.write_str(&rhs.join(" + "))
    }
}

fn is_name(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '.')
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '.')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Partition {
        Partition::new([
            ("y", vec![1.0, 0.0, 1.0]),
            ("a", vec![1.0, 2.0, 3.0]),
            ("b", vec![2.0, 2.0, 0.5]),
        ])
        .unwrap()
    }

    #[test]
    fn parse_sums_and_interactions() {
        let spec = ModelSpec::parse(Family::Continuous, "y ~ a + b + a:b").unwrap();
        assert_eq!(spec.terms, vec!["a", "b", "a:b"]);
        assert!(spec.intercept);
        assert_eq!(spec.coefficient_names(), vec![INTERCEPT, "a", "b", "a:b"]);
    }

    #[test]
    fn parse_removes_intercept() {
        let spec = ModelSpec::parse(Family::Binary, "y ~ a - 1").unwrap();
        assert!(!spec.intercept);
        assert_eq!(spec.terms, vec!["a"]);
        assert!(!ModelSpec::parse(Family::Binary, "y ~ 0 + a").unwrap().intercept);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(ModelSpec::parse(Family::Continuous, "y a").is_err());
        assert!(ModelSpec::parse(Family::Continuous, "y ~ log(a)").is_err());
        assert!(ModelSpec::parse(Family::Continuous, "y ~ a + ").is_err());
    }

    #[test]
    fn display_round_trips_through_parse() {
        let spec = ModelSpec::linear("y", ["a", "a:b"]).without_intercept();
        let again = ModelSpec::parse(Family::Continuous, &spec.to_string()).unwrap();
        assert_eq!(spec, again);
    }

    #[test]
    fn design_builds_intercept_and_products() {
        let spec = ModelSpec::linear("y", ["a", "a:b"]);
        let x = spec.design(&table()).unwrap();
        assert_eq!(x.shape(), (3, 3));
        let col = |j: usize| x.column(j).iter().copied().collect::<Vec<f64>>();
        assert_eq!(col(0), vec![1.0, 1.0, 1.0]);
        assert_eq!(col(1), vec![1.0, 2.0, 3.0]);
        assert_eq!(col(2), vec![2.0, 4.0, 1.5]);
    }

    #[test]
    fn design_reports_missing_column() {
        let spec = ModelSpec::linear("y", ["a", "c"]);
        assert!(matches!(spec.design(&table()), Err(Error::SchemaMismatch(_))));
    }

    #[test]
    fn binary_response_must_be_probability() {
        let spec = ModelSpec::logistic("a", ["b"]);
        assert!(matches!(spec.response_values(&table()), Err(Error::InvalidArgument(_))));
        assert!(ModelSpec::logistic("y", ["b"]).response_values(&table()).is_ok());
    }

    #[test]
    fn parse_rejects_empty_model() {
        for formula in ["y ~ 0", "y ~ -1", "y ~ 1 - 1"] {
            let err = ModelSpec::parse(Family::Continuous, formula).unwrap_err();
            assert!(matches!(err, Error::InvalidArgument(_)), "{formula}: {err}");
        }
    }

    #[test]
    fn non_finite_values_name_their_column() {
        let table = Partition::new([
            ("y", vec![1.0, f64::NAN, 3.0]),
            ("a", vec![1.0, 2.0, f64::INFINITY]),
            ("b", vec![2.0, 2.0, 0.5]),
        ])
        .unwrap();
        let err = ModelSpec::linear("y", ["b"]).response_values(&table).unwrap_err();
        assert!(err.to_string().contains("`y`"), "{err}");
        let err = ModelSpec::linear("b", ["a:b"]).design(&table).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(err.to_string().contains("`a:b`"), "{err}");
    }
}
