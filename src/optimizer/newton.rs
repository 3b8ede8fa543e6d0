//! Complementarity-Newton stepping and its mixed-complementarity variant.
//!
//! Both strategies solve the box-constrained first-order conditions of the
//! Bellman maximization at every node for a fixed `(i, j)`.
//! [`optimize_newton`] takes bounded, backtracked per-node Newton steps for
//! at most `maxit` rounds; [`optimize_mcp`] stacks all nodes into one system
//! with a block-diagonal Jacobian and hands it to [`MixedComplementarity`].
//! Neither reports per-node failures: a node that has not reached the
//! tolerance keeps its last iterate.
use crate::{
    basis::Interpolant,
    bellman::{rhs_derivatives, rhs_value},
    errors::DpResult,
    linalg::sup_norm,
    model::{functions::DpFunctions, DpModel},
    optimizer::{
        lcp::{lcp_step, NcpMethod},
        mcp::MixedComplementarity,
        node_bounds,
    },
};
use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2, ArrayView2, Axis};

/// Step halvings allowed per round before the last trial point is accepted.
const MAX_BACKSTEPS: usize = 30;

/// Bounded Newton stepping on the complementarity reformulation.
///
/// Each round takes the clamped step from [`lcp_step`] and backtracks per
/// node: a node's step is halved until its residual `‖Φ_n‖₂` decreases,
/// at most `MAX_BACKSTEPS` times.
///
/// Parameters
/// ----------
/// - `method`: reformulation used by [`lcp_step`].
/// - `maxit`: maximum number of steps.
/// - `tol`: stop once `‖Φ‖∞ < tol`.
/// - `x`: incumbent actions (`dx × ns`), overwritten with the result.
///
/// Returns
/// -------
/// The Bellman RHS at the final actions.
pub fn optimize_newton<F: DpFunctions, B: Interpolant>(
    model: &DpModel<F, B>, i: usize, j: usize, next_coef: ArrayView2<f64>, method: NcpMethod,
    maxit: usize, tol: f64, x: &mut Array2<f64>,
) -> DpResult<Array1<f64>> {
    let s = model.collocation().nodes();
    let (lb, ub) = node_bounds(model, s, i, j)?;
    let step_at = |xv: ArrayView2<f64>| -> DpResult<(Array2<f64>, Array2<f64>)> {
        let eval = rhs_derivatives(model, s, xv, i, j, next_coef)?;
        Ok(lcp_step(method, xv, lb.view(), ub.view(), eval.gradient.view(), eval.hessian.view()))
    };

    let (mut phi, mut step) = step_at(x.view())?;
    for _ in 0..maxit {
        if sup_norm(phi.iter()) < tol {
            break;
        }
        let norm0 = column_norms(&phi);
        let mut t = Array1::<f64>::ones(x.ncols());
        let mut accepted = None;
        for _ in 0..=MAX_BACKSTEPS {
            let trial = &*x + &(&step * &t);
            let (phi_t, step_t) = step_at(trial.view())?;
            let norms = column_norms(&phi_t);
            let mut shrunk = false;
            for n in 0..norms.len() {
                // NaN residuals at the trial count as no decrease.
                if norm0[n] > 0.0 && !(norms[n] < norm0[n]) {
                    t[n] *= 0.5;
                    shrunk = true;
                }
            }
            accepted = Some((trial, phi_t, step_t));
            if !shrunk {
                break;
            }
        }
        if let Some((trial, phi_t, step_t)) = accepted {
            *x = trial;
            phi = phi_t;
            step = step_t;
        }
    }
    rhs_value(model, s, x.view(), i, j, next_coef)
}

/// Euclidean norm of every column.
fn column_norms(a: &Array2<f64>) -> Array1<f64> {
    a.map_axis(Axis(0), |col| col.dot(&col).sqrt())
}

/// Stacked mixed-complementarity solve over all nodes.
///
/// The unknown is `z[n·dx + k] = x[k, n]`; the residual is the stacked
/// gradient and the Jacobian is block diagonal with the per-node Hessians.
pub fn optimize_mcp<F: DpFunctions, B: Interpolant>(
    model: &DpModel<F, B>, i: usize, j: usize, next_coef: ArrayView2<f64>,
    solver: &MixedComplementarity, x: &mut Array2<f64>,
) -> DpResult<Array1<f64>> {
    let s = model.collocation().nodes();
    let (dx, ns) = (model.dims().dx, model.dims().ns);
    let (lb, ub) = node_bounds(model, s, i, j)?;
    let stack = |a: &Array2<f64>| DVector::from_fn(dx * ns, |r, _| a[[r % dx, r / dx]]);
    let unstack = |z: &DVector<f64>| Array2::from_shape_fn((dx, ns), |(k, n)| z[n * dx + k]);

    let residual = |z: &DVector<f64>| -> DpResult<(DVector<f64>, DMatrix<f64>)> {
        let xz = unstack(z);
        let eval = rhs_derivatives(model, s, xz.view(), i, j, next_coef)?;
        let f = stack(&eval.gradient);
        let mut jac = DMatrix::zeros(dx * ns, dx * ns);
        for n in 0..ns {
            for a in 0..dx {
                for b in 0..dx {
                    jac[(n * dx + a, n * dx + b)] = eval.hessian[[a, b, n]];
                }
            }
        }
        Ok((f, jac))
    };
    let outcome = solver.zero(residual, &stack(&lb), &stack(&ub), stack(&*x))?;
    if !outcome.converged {
        log::debug!(
            "MCP action solve for (i = {i}, j = {j}) stopped after {} iterations, residual {:.3e}",
            outcome.iterations,
            outcome.residual
        );
    }
    *x = unstack(&outcome.z);
    rhs_value(model, s, x.view(), i, j, next_coef)
}
