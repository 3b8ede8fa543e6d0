//! Dense linear-solve strategies and norms shared by the solvers.
//!
//! Purpose
//! -------
//! Centralize the conversions between `ndarray` containers and `nalgebra`
//! matrices together with the two solve paths the crate needs: a square LU
//! solve and an SVD least-squares solve for over-determined collocation
//! systems.
//!
//! Key behaviors
//! -------------
//! - [`LinearSolve::for_shape`] picks the strategy once from the system shape
//!   (`rows == cols` → [`LinearSolve::Dense`], `rows > cols` →
//!   [`LinearSolve::LeastSquares`]).
//! - [`LinearSolve::solve`] and [`LinearSolve::solve_columns`] solve for one
//!   or several right-hand sides.
//! - [`sup_norm`] propagates `NaN` so callers can detect numerical blow-ups.
//!
//! Invariants & assumptions
//! ------------------------
//! - Systems are small and dense; no sparse path is provided.
//! - A singular square system, or a solution with non-finite entries, is
//!   reported as [`DpError::SingularSystem`].
use crate::errors::{DpError, DpResult};
use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

/// Strategy used to solve `A z = b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinearSolve {
    /// Square system, LU with partial pivoting.
    Dense,
    /// Over-determined system, minimum-norm least squares through the SVD.
    LeastSquares,
}

impl LinearSolve {
    /// Choose the solve strategy for a `rows × cols` system.
    ///
    /// # Errors
    /// [`DpError::UnderdeterminedSystem`] when `rows < cols`.
    pub fn for_shape(rows: usize, cols: usize) -> DpResult<Self> {
        if rows < cols {
            return Err(DpError::UnderdeterminedSystem { rows, cols });
        }
        if rows == cols {
            Ok(LinearSolve::Dense)
        } else {
            Ok(LinearSolve::LeastSquares)
        }
    }

    /// Solve `A z = b` for a single right-hand side.
    ///
    /// # Errors
    /// - [`DpError::CoefficientLength`] if `b.len() != a.nrows()`.
    /// - [`DpError::SingularSystem`] if the factorization fails or the
    ///   solution is not finite.
    pub fn solve(&self, a: ArrayView2<f64>, b: ArrayView1<f64>) -> DpResult<Array1<f64>> {
        if b.len() != a.nrows() {
            return Err(DpError::CoefficientLength { expected: a.nrows(), found: b.len() });
        }
        let rhs = b.to_owned().insert_axis(ndarray::Axis(1));
        let z = self.solve_columns(a, rhs.view())?;
        Ok(z.column(0).to_owned())
    }

    /// Solve `A Z = B` column by column, `B` being `rows × k`.
    ///
    /// # Errors
    /// Same as [`LinearSolve::solve`].
    pub fn solve_columns(&self, a: ArrayView2<f64>, b: ArrayView2<f64>) -> DpResult<Array2<f64>> {
        let (rows, cols) = a.dim();
        if b.nrows() != rows {
            return Err(DpError::CoefficientLength { expected: rows, found: b.nrows() });
        }
        let a_nalg = to_dmatrix(a);
        let b_nalg = to_dmatrix(b);
        let z = match self {
            LinearSolve::Dense => {
                a_nalg.lu().solve(&b_nalg).ok_or(DpError::SingularSystem { rows, cols })?
            }
            LinearSolve::LeastSquares => {
                let svd = a_nalg.svd(true, true);
                let sigma_max = svd.singular_values.max();
                let eps = f64::EPSILON * rows.max(cols) as f64 * sigma_max;
                svd.solve(&b_nalg, eps).map_err(|_| DpError::SingularSystem { rows, cols })?
            }
        };
        if z.iter().any(|v| !v.is_finite()) {
            return Err(DpError::SingularSystem { rows, cols });
        }
        Ok(Array2::from_shape_fn((z.nrows(), z.ncols()), |(r, c)| z[(r, c)]))
    }
}

/// Sup-norm `max_k |v_k|`; returns `NaN` if any entry is `NaN`.
pub fn sup_norm<'a, I>(values: I) -> f64
where
    I: IntoIterator<Item = &'a f64>,
{
    let mut norm = 0.0_f64;
    for &v in values {
        if v.is_nan() {
            return f64::NAN;
        }
        norm = norm.max(v.abs());
    }
    norm
}

/// Solve a small dense square system, returning `None` if it is singular.
///
/// Used for the per-node Newton steps of the action optimizers, where a
/// singular system degrades to a zero step instead of aborting the solve.
pub fn solve_small(a: &DMatrix<f64>, b: &DVector<f64>) -> Option<DVector<f64>> {
    let z = a.clone().lu().solve(b)?;
    if z.iter().all(|v| v.is_finite()) {
        Some(z)
    } else {
        None
    }
}

// ---- Helper methods ----

/// Copy an `ndarray` view into a column-major `DMatrix`.
pub(crate) fn to_dmatrix(a: ArrayView2<f64>) -> DMatrix<f64> {
    let (rows, cols) = a.dim();
    let mut out = DMatrix::<f64>::zeros(rows, cols);
    for c in 0..cols {
        for r in 0..rows {
            out[(r, c)] = a[[r, c]];
        }
    }
    out
}
