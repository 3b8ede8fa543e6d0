//! bellman::finite_diff — numerical action derivatives of the Bellman RHS.
//!
//! Purpose
//! -------
//! Provide gradients and Hessians of the Bellman right-hand side with respect
//! to the continuous action for models that only implement the value
//! callbacks ([`DerivativeMode::FiniteDifference`]).
//!
//! Key behaviors
//! -------------
//! - Each node is differentiated on its own: the RHS is independent across
//!   nodes, so the per-node problem is a scalar function of `dx` variables.
//! - Derivatives are taken by `finitediff` in a rescaled coordinate
//!   `x = x₀ + λ y`, which widens the effective step from `√ε` to `ε^{1/3}`
//!   (gradient) and keeps the nested Hessian well conditioned.
//! - Errors raised by the model callbacks inside the differencing closures
//!   are captured in a `RefCell` and surfaced after the fact.
//! - Gradients and Hessians are validated for finiteness and the Hessian is
//!   symmetrized.
//!
//! Invariants & assumptions
//! ------------------------
//! - Callbacks accept single-column batches (`ds × 1`, `dx × 1`).
//!
//! Testing notes
//! -------------
//! - Unit tests compare against the analytic chain rule on the
//!   linear-quadratic test model.
//!
//! [`DerivativeMode::FiniteDifference`]: crate::model::functions::DerivativeMode::FiniteDifference
use crate::{
    basis::Interpolant,
    bellman::{rhs_value, BellmanEval},
    errors::{DpError, DpResult},
    model::{functions::DpFunctions, DpModel},
};
use finitediff::FiniteDiff;
use ndarray::{s, Array1, Array2, Array3, ArrayView2, Axis};
use std::cell::RefCell;

/// Differencing step in the rescaled coordinate, as used by `finitediff`.
const BASE_STEP: f64 = 1.490_116_119_384_765_6e-8;

/// Bellman RHS with finite-difference gradient and Hessian.
///
/// Errors
/// ------
/// - Errors raised by the model callbacks.
/// - [`DpError::InvalidGradient`] / [`DpError::InvalidHessian`] when the
///   differences are not finite.
pub fn rhs_finite_diff<F: DpFunctions, B: Interpolant>(
    model: &DpModel<F, B>, s: ArrayView2<f64>, x: ArrayView2<f64>, i: usize, j: usize,
    next_coef: ArrayView2<f64>,
) -> DpResult<BellmanEval> {
    let m = s.ncols();
    let dx = x.nrows();
    let value = rhs_value(model, s, x, i, j, next_coef)?;
    let mut gradient = Array2::zeros((dx, m));
    let mut hessian = Array3::zeros((dx, dx, m));
    let closure_err: RefCell<Option<DpError>> = RefCell::new(None);

    for n in 0..m {
        let s_n = s.slice(s![.., n..n + 1]);
        let x0 = x.column(n).to_owned();
        let scale = step_scale(&x0);
        let node_value = |y: &Array1<f64>| -> f64 {
            let xn = (&x0 + &(y * scale)).insert_axis(Axis(1));
            match rhs_value(model, s_n, xn.view(), i, j, next_coef) {
                Ok(v) => v[0],
                Err(err) => {
                    closure_err.replace(Some(err));
                    f64::NAN
                }
            }
        };
        let y0 = Array1::zeros(dx);

        closure_err.replace(None);
        let grad_y = y0.central_diff(&node_value);
        let node_grad = |y: &Array1<f64>| -> Array1<f64> { y.central_diff(&node_value) };
        let mut hess_y = y0.central_hessian(&node_grad);
        if let Some(err) = closure_err.take() {
            return Err(err);
        }

        for a in 0..dx {
            let g = grad_y[a] / scale;
            if !g.is_finite() {
                return Err(DpError::InvalidGradient { node: n, index: a, value: g });
            }
            gradient[[a, n]] = g;
        }
        symmetrize(&mut hess_y);
        for a in 0..dx {
            for b in 0..dx {
                let h = hess_y[[a, b]] / (scale * scale);
                if !h.is_finite() {
                    return Err(DpError::InvalidHessian { node: n, row: a, col: b, value: h });
                }
                hessian[[a, b, n]] = h;
            }
        }
    }
    Ok(BellmanEval { value, gradient, hessian })
}

// ---- Helper methods ----

/// `λ` such that a unit `finitediff` step in `y` moves `x` by
/// `ε^{1/3} · max(1, ‖x‖∞)`.
fn step_scale(x: &Array1<f64>) -> f64 {
    let magnitude = x.iter().fold(1.0_f64, |acc, v| acc.max(v.abs()));
    f64::EPSILON.cbrt() / BASE_STEP * magnitude
}

/// Average each off-diagonal pair in place.
fn symmetrize(hess: &mut Array2<f64>) {
    for r in 0..hess.nrows() {
        for c in 0..r {
            let avg = 0.5 * (hess[[r, c]] + hess[[c, r]]);
            hess[[r, c]] = avg;
            hess[[c, r]] = avg;
        }
    }
}
