//! Weighted least squares, the continuous-family fitter and the inner solve of IRLS.

use nalgebra::{DMatrix, DVector};

use crate::error::{Error, Result};

/// Relative eigenvalue cut-off on the unit-diagonal scaled cross-product.
const RANK_TOL: f64 = 1e-11;

/// Weighted least squares solution.
#[derive(Debug, Clone)]
pub struct WlsSolution {
    /// Solution of `(XᵀWX)β = XᵀWy`.
    pub coefficients: DVector<f64>,
    /// Column rank of the weighted design.
    pub rank: usize,
}

/// Solve `min Σ wᵢ (yᵢ - xᵢᵀβ)²`.
///
/// Rows with zero weight drop out. Rank is judged on `XᵀWX` rescaled to a
/// unit diagonal, so predictors on very different scales are not mistaken
/// for collinear ones.
///
/// # Errors
/// [`Error::SingularFit`] when the weighted design is rank-deficient; a
/// column that is zero on every positively weighted row is named.
pub fn weighted_least_squares(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    w: &[f64],
    names: &[String],
) -> Result<WlsSolution> {
    let p = x.ncols();
    check_shapes(x, y, w)?;

    // W^(1/2) X and W^(1/2) y
    let sqrt_w: Vec<f64> = w.iter().map(|wi| wi.sqrt()).collect();
    let mut xw = x.clone();
    for (mut row, s) in xw.row_iter_mut().zip(&sqrt_w) {
        row *= *s;
    }
    let yw = DVector::from_iterator(y.len(), y.iter().zip(&sqrt_w).map(|(yi, s)| yi * s));

    let xtwx = xw.tr_mul(&xw);
    let xtwy = xw.tr_mul(&yw);

    let rank = scaled_rank(&xtwx, names)?;
    if rank < p {
        return Err(Error::singular(format!(
            "weighted design has rank {rank} but {p} coefficients"
        )));
    }

    let coefficients = xtwx
        .cholesky()
        .ok_or_else(|| Error::singular("weighted cross-product is not positive definite"))?
        .solve(&xtwy);

    Ok(WlsSolution { coefficients, rank })
}

/// Weights and response must match the design rows, weights must be finite
/// and non-negative, and the design needs at least one column.
pub(crate) fn check_shapes(x: &DMatrix<f64>, y: &DVector<f64>, w: &[f64]) -> Result<()> {
    if x.ncols() == 0 {
        return Err(Error::InvalidArgument("design matrix has no columns".into()));
    }
    if w.len() != x.nrows() || y.len() != x.nrows() {
        return Err(Error::InvalidArgument(format!(
            "weights ({}) and response ({}) must match design rows ({})",
            w.len(),
            y.len(),
            x.nrows()
        )));
    }
    if let Some(bad) = w.iter().find(|wi| !wi.is_finite() || **wi < 0.0) {
        return Err(Error::InvalidArgument(format!("invalid weight {bad}")));
    }
    Ok(())
}

fn scaled_rank(xtwx: &DMatrix<f64>, names: &[String]) -> Result<usize> {
    let diag = xtwx.diagonal();
    if let Some(j) = diag.iter().position(|d| *d <= 0.0 || !d.is_finite()) {
        let name = names.get(j).map_or("?", String::as_str);
        return Err(Error::singular(format!(
            "column `{name}` is zero on every positively weighted row"
        )));
    }

    let inv_sqrt: Vec<f64> = diag.iter().map(|d| d.sqrt().recip()).collect();
    let scaled = DMatrix::from_fn(xtwx.nrows(), xtwx.ncols(), |i, j| {
        xtwx[(i, j)] * inv_sqrt[i] * inv_sqrt[j]
    });
    let eigen = scaled.symmetric_eigenvalues();
    let max = eigen.amax();
    Ok(eigen.iter().filter(|v| **v > max * RANK_TOL).count())
}

/// `Σ w·e² / (Σw − rank)`, square-rooted: the weighted residual scale.
///
/// # Errors
/// [`Error::SingularFit`] when `Σw <= rank` leaves no residual degrees of freedom.
pub fn weighted_sigma(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    w: &[f64],
    solution: &WlsSolution,
) -> Result<f64> {
    let fitted = x * &solution.coefficients;
    let rss: f64 = y
        .iter()
        .zip(fitted.iter())
        .zip(w)
        .map(|((yi, fi), wi)| wi * (yi - fi).powi(2))
        .sum();
    let df = w.iter().sum::<f64>() - solution.rank as f64;
    if df <= 0.0 {
        return Err(Error::singular(format!(
            "no residual degrees of freedom (total weight minus rank is {df})"
        )));
    }
    Ok((rss / df).sqrt())
}
