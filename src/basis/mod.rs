//! basis — function approximation used for value and policy functions.
//!
//! Purpose
//! -------
//! Provide the interpolation layer that backs every value and policy
//! function: a basis with a fixed node set, the basis matrix that maps
//! coefficients to function values, and derivative queries at arbitrary
//! points.
//!
//! Key behaviors
//! -------------
//! - [`Interpolant`]: the trait the solvers program against.
//! - [`chebyshev::ChebyshevBasis`]: tensor-product Chebyshev polynomials
//!   with analytic first and second derivatives.
//! - [`collocation::Collocation`]: basis matrix at the nodes plus the
//!   linear-solve strategy used to fit coefficients to node values.
//!
//! Invariants & assumptions
//! ------------------------
//! - Points are passed as `ds × npts` arrays, one column per point.
//! - A coefficient vector has length [`Interpolant::n_coef`].
//!
//! Conventions
//! -----------
//! - `InterpolantEval::gradient` is `ds × npts`,
//!   `InterpolantEval::hessian` is `ds × ds × npts`.
pub mod chebyshev;
pub mod collocation;

pub use self::{chebyshev::ChebyshevBasis, collocation::Collocation};

use crate::errors::{DpError, DpResult};
use ndarray::{Array1, Array2, Array3, ArrayView1, ArrayView2};

/// Value, gradient and Hessian of an interpolant at a batch of points.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpolantEval {
    /// Length `npts`.
    pub value: Array1<f64>,
    /// `ds × npts`.
    pub gradient: Array2<f64>,
    /// `ds × ds × npts`.
    pub hessian: Array3<f64>,
}

/// Coefficient-backed approximation of a function of the continuous state.
///
/// Required:
/// - `ds()`: dimension of the continuous state.
/// - `n_coef()`: number of coefficients `nc`.
/// - `nodes()`: collocation nodes, `ds × ns`.
/// - `basis_matrix(points)`: `npts × nc` matrix `Φ` with `Φ c` the function
///   values at `points`.
/// - `eval_derivatives(coef, points)`: value, gradient and Hessian.
///
/// Provided:
/// - `eval(coef, points)`: values only, `Φ c`.
pub trait Interpolant {
    fn ds(&self) -> usize;
    fn n_coef(&self) -> usize;
    fn nodes(&self) -> Array2<f64>;
    fn basis_matrix(&self, points: ArrayView2<f64>) -> DpResult<Array2<f64>>;
    fn eval_derivatives(
        &self, coef: ArrayView1<f64>, points: ArrayView2<f64>,
    ) -> DpResult<InterpolantEval>;

    fn eval(&self, coef: ArrayView1<f64>, points: ArrayView2<f64>) -> DpResult<Array1<f64>> {
        check_coef(self.n_coef(), coef.len())?;
        let phi = self.basis_matrix(points)?;
        Ok(phi.dot(&coef))
    }
}

/// Validate a coefficient vector length.
///
/// # Errors
/// [`DpError::CoefficientLength`] when `found != expected`.
pub fn check_coef(expected: usize, found: usize) -> DpResult<()> {
    if expected != found {
        return Err(DpError::CoefficientLength { expected, found });
    }
    Ok(())
}

/// Validate the row count of a batch of evaluation points.
///
/// # Errors
/// [`DpError::PointDimension`] when `found != expected`.
pub fn check_points(expected: usize, found: usize) -> DpResult<()> {
    if expected != found {
        return Err(DpError::PointDimension { expected, found });
    }
    Ok(())
}
