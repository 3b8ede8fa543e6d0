//! optimizer::lcp — complementarity reformulation of box-constrained
//! first-order conditions and a single Newton step on it.
//!
//! Purpose
//! -------
//! Turn the first-order conditions of `max_x v(x)` subject to `a ≤ x ≤ b`,
//!
//! ```text
//! x = a ⇒ F ≤ 0,   a < x < b ⇒ F = 0,   x = b ⇒ F ≥ 0,   F = ∂v/∂x,
//! ```
//!
//! into a (semi)smooth root problem `Φ(x) = 0` and take one Newton step on
//! it.
//!
//! Key behaviors
//! -------------
//! - [`NcpMethod::MinMax`]: `Φ = min(max(F, a − x), b − x)`; clamped rows of
//!   the Jacobian become `−e_k`.
//! - [`NcpMethod::Smooth`]: `Φ = φ⁻(φ⁺(F, a − x), b − x)` with
//!   `φ±(u, v) = u + v ± √(u² + v²)`; infinite bounds drop the
//!   corresponding smoothing.
//! - [`lcp_step`]: batched per-node step `Δx = −JΦ⁻¹ Φ`, clamped into
//!   `[a − x, b − x]`.
//!
//! Invariants & assumptions
//! ------------------------
//! - `x`, `a`, `b`, `F` have equal length; `J` is square of that size.
//! - A singular per-node system produces a zero step for that node.
use crate::{errors::DpError, linalg::solve_small};
use nalgebra::{DMatrix, DVector};
use ndarray::{Array2, ArrayView2, ArrayView3};
use std::str::FromStr;

/// Reformulation of the complementarity conditions.
///
/// Parsing:
/// Implements `FromStr`, accepting case-insensitive `"minmax"` and
/// `"smooth"`. Unknown names return [`DpError::UnknownNcpMethod`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NcpMethod {
    #[default]
    MinMax,
    Smooth,
}

impl FromStr for NcpMethod {
    type Err = DpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "minmax" => Ok(NcpMethod::MinMax),
            "smooth" => Ok(NcpMethod::Smooth),
            _ => Err(DpError::UnknownNcpMethod { name: s.to_string() }),
        }
    }
}

/// Complementarity residual `Φ` and its Jacobian.
///
/// Parameters
/// ----------
/// - `method`: reformulation.
/// - `x`: current point.
/// - `lb`, `ub`: bounds (may be infinite).
/// - `f`: gradient of the objective at `x`.
/// - `jac`: Jacobian of `f` at `x` (the Hessian of the objective).
///
/// Returns
/// -------
/// `(Φ, JΦ)` of sizes `N` and `N × N`.
pub fn complementarity_transform(
    method: NcpMethod, x: &DVector<f64>, lb: &DVector<f64>, ub: &DVector<f64>,
    f: &DVector<f64>, jac: &DMatrix<f64>,
) -> (DVector<f64>, DMatrix<f64>) {
    let n = x.len();
    let mut phi = DVector::zeros(n);
    let mut jphi = jac.clone();
    match method {
        NcpMethod::MinMax => {
            for k in 0..n {
                let lo = lb[k] - x[k];
                let hi = ub[k] - x[k];
                let clamped = f[k].max(lo).min(hi);
                phi[k] = clamped;
                if f[k] <= lo || f[k] >= hi {
                    jphi.row_mut(k).fill(0.0);
                    jphi[(k, k)] = -1.0;
                }
            }
        }
        NcpMethod::Smooth => {
            for k in 0..n {
                let lo = lb[k] - x[k];
                let hi = ub[k] - x[k];
                // y = φ⁺(F, a − x), dy = α J_k − β e_k
                let (y, alpha, beta) = if lo.is_finite() {
                    let r = f[k].hypot(lo);
                    let (du, dv) = if r > 0.0 { (f[k] / r, lo / r) } else { (0.0, 0.0) };
                    (f[k] + lo + r, 1.0 + du, 1.0 + dv)
                } else {
                    (f[k], 1.0, 0.0)
                };
                // Φ = φ⁻(y, b − x), dΦ = γ dy − η e_k
                let (value, gamma, eta) = if hi.is_finite() {
                    let r = y.hypot(hi);
                    let (du, dv) = if r > 0.0 { (y / r, hi / r) } else { (0.0, 0.0) };
                    (y + hi - r, 1.0 - du, 1.0 - dv)
                } else {
                    (y, 1.0, 0.0)
                };
                phi[k] = value;
                let mut row = jphi.row_mut(k);
                row *= gamma * alpha;
                row[k] -= gamma * beta + eta;
            }
        }
    }
    (phi, jphi)
}

/// One bounded Newton step per node.
///
/// Parameters
/// ----------
/// - `x`, `lb`, `ub`: `dx × m` current actions and bounds.
/// - `grad`: `dx × m` gradient of the objective.
/// - `hess`: `dx × dx × m` Hessian of the objective.
///
/// Returns
/// -------
/// `(Φ, Δx)`, both `dx × m`. `x + Δx` lies inside `[lb, ub]`.
pub fn lcp_step(
    method: NcpMethod, x: ArrayView2<f64>, lb: ArrayView2<f64>, ub: ArrayView2<f64>,
    grad: ArrayView2<f64>, hess: ArrayView3<f64>,
) -> (Array2<f64>, Array2<f64>) {
    let (dx, m) = x.dim();
    let mut phi_out = Array2::zeros((dx, m));
    let mut step_out = Array2::zeros((dx, m));
    for n in 0..m {
        let xn = DVector::from_iterator(dx, x.column(n).iter().copied());
        let an = DVector::from_iterator(dx, lb.column(n).iter().copied());
        let bn = DVector::from_iterator(dx, ub.column(n).iter().copied());
        let fn_ = DVector::from_iterator(dx, grad.column(n).iter().copied());
        let jn = DMatrix::from_fn(dx, dx, |r, c| hess[[r, c, n]]);
        let (phi, jphi) = complementarity_transform(method, &xn, &an, &bn, &fn_, &jn);

        let step = if dx == 1 {
            let d = jphi[(0, 0)];
            let s = -phi[0] / d;
            if d != 0.0 && s.is_finite() {
                DVector::from_element(1, s)
            } else {
                DVector::zeros(1)
            }
        } else {
            solve_small(&jphi, &(-&phi)).unwrap_or_else(|| DVector::zeros(dx))
        };

        for k in 0..dx {
            phi_out[[k, n]] = phi[k];
            step_out[[k, n]] = step[k].max(an[k] - xn[k]).min(bn[k] - xn[k]);
        }
    }
    (phi_out, step_out)
}
