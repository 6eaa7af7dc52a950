//! Householder QR decomposition for least squares.
//!
//! `X = Q R` with `R` upper triangular. Least-squares coefficients solve
//! `R b = Q^T y` by back substitution, and `(X^T X)^{-1} = R^{-1} R^{-T}`.
//!
//! Rank deficiency is detected column by column: after the reflections for
//! the first `j` columns, `|R_jj|` is the norm of the part of column `j` that
//! lies outside the span of columns `0..j`. When that is below
//! `tolerance * ||x_j||` the column is linearly dependent on its predecessors.

use crate::error::RegressionError;
use ndarray::{Array1, Array2, s};

/// Default relative tolerance for rank detection.
pub const DEFAULT_RANK_TOLERANCE: f64 = 1e-10;

/// QR decomposition of a tall design matrix.
#[derive(Debug, Clone)]
pub struct QrDecomposition {
    /// Upper triangular factor (k x k)
    r: Array2<f64>,
    /// Householder vectors; reflector `j` acts on rows `j..n`
    reflectors: Vec<Array1<f64>>,
    /// Number of rows of the decomposed matrix
    n_rows: usize,
}

impl QrDecomposition {
    /// Decompose `x` (n x k, n >= k).
    ///
    /// # Errors
    /// `SingularDesign` if a column is numerically dependent on earlier
    /// columns, `InsufficientData` if `n < k`, `EmptyDesign` if `k == 0`.
    pub fn new(x: &Array2<f64>, tolerance: f64) -> Result<Self, RegressionError> {
        let (n, k) = x.dim();
        if k == 0 {
            return Err(RegressionError::EmptyDesign);
        }
        if n < k {
            return Err(RegressionError::InsufficientData {
                required: k,
                actual: n,
            });
        }

        let column_norms: Vec<f64> = (0..k)
            .map(|j| x.column(j).dot(&x.column(j)).sqrt())
            .collect();

        let mut a = x.to_owned();
        let mut reflectors = Vec::with_capacity(k);

        for j in 0..k {
            let mut v = a.slice(s![j.., j]).to_owned();
            let norm = v.dot(&v).sqrt();

            if norm > 0.0 {
                let alpha = if v[0] > 0.0 { -norm } else { norm };
                v[0] -= alpha;
                let v_norm_sq = v.dot(&v);
                if v_norm_sq > 0.0 {
                    for c in j..k {
                        let mut target = a.slice_mut(s![j.., c]);
                        let proj = 2.0 * v.dot(&target) / v_norm_sq;
                        target.scaled_add(-proj, &v);
                    }
                }
            }

            let diag = a[[j, j]].abs();
            if column_norms[j] == 0.0 || diag <= tolerance * column_norms[j] {
                return Err(RegressionError::SingularDesign {
                    column: j,
                    columns: k,
                });
            }

            reflectors.push(v);
        }

        let mut r = Array2::<f64>::zeros((k, k));
        for i in 0..k {
            for j in i..k {
                r[[i, j]] = a[[i, j]];
            }
        }

        Ok(Self {
            r,
            reflectors,
            n_rows: n,
        })
    }

    /// The upper triangular factor.
    pub const fn r(&self) -> &Array2<f64> {
        &self.r
    }

    /// Compute `Q^T y`.
    pub fn apply_qt(&self, y: &Array1<f64>) -> Result<Array1<f64>, RegressionError> {
        if y.len() != self.n_rows {
            return Err(RegressionError::DimensionMismatch {
                expected: self.n_rows,
                actual: y.len(),
            });
        }

        let mut b = y.to_owned();
        for (j, v) in self.reflectors.iter().enumerate() {
            let v_norm_sq = v.dot(v);
            if v_norm_sq > 0.0 {
                let mut segment = b.slice_mut(s![j..]);
                let proj = 2.0 * v.dot(&segment) / v_norm_sq;
                segment.scaled_add(-proj, v);
            }
        }
        Ok(b)
    }

    /// Least-squares solution of `X b = y`.
    pub fn solve(&self, y: &Array1<f64>) -> Result<Array1<f64>, RegressionError> {
        let qty = self.apply_qt(y)?;
        Ok(self.back_substitute(&qty.slice(s![..self.r.ncols()]).to_owned()))
    }

    /// Solve `R z = b` for upper triangular `R`.
    fn back_substitute(&self, b: &Array1<f64>) -> Array1<f64> {
        let k = self.r.ncols();
        let mut z = Array1::<f64>::zeros(k);
        for i in (0..k).rev() {
            let mut sum = b[i];
            for j in (i + 1)..k {
                sum -= self.r[[i, j]] * z[j];
            }
            z[i] = sum / self.r[[i, i]];
        }
        z
    }

    /// Inverse of the upper triangular factor.
    pub fn r_inverse(&self) -> Array2<f64> {
        let k = self.r.ncols();
        let mut inv = Array2::<f64>::zeros((k, k));
        for c in 0..k {
            let mut e = Array1::<f64>::zeros(k);
            e[c] = 1.0;
            inv.column_mut(c).assign(&self.back_substitute(&e));
        }
        inv
    }

    /// `(X^T X)^{-1}`, the unscaled coefficient covariance.
    pub fn xtx_inverse(&self) -> Array2<f64> {
        let r_inv = self.r_inverse();
        r_inv.dot(&r_inv.t())
    }
}
