//! Infinite-horizon Newton iteration on the value coefficients.
//!
//! The collocation residual is `R(c) = Φ_k c − v(c)`, with
//! `Φ_k = I_ni ⊗ Φ` and `v(c)` the optimized Bellman values at the nodes.
//! By the envelope theorem its Jacobian is `Φ_k − v_c`, where `v_c` is the
//! coefficient Jacobian of the discounted continuation value at the current
//! optimal actions. Each iteration solves `(Φ_k − v_c) Δc = −R(c)` as one
//! dense system over all discrete states and nodes (least squares when there
//! are more nodes than coefficients).
use crate::{
    basis::Interpolant,
    bellman::coefficient_jacobian,
    errors::{DpError, DpResult},
    linalg::{sup_norm, LinearSolve},
    model::{functions::DpFunctions, DpModel},
    solver::{
        options::SolveOptions,
        outcome::{SolveMethod, SolveOutcome},
        progress::Progress,
        state::DpSolution,
        vmax::bellman_pass,
    },
};
use ndarray::{s, Array1, Array2};

pub(crate) fn solve_newton<F: DpFunctions, B: Interpolant>(
    model: &DpModel<F, B>, options: &SolveOptions, sol: &mut DpSolution,
) -> DpResult<SolveOutcome> {
    let method = SolveMethod::Newton;
    let progress = Progress::start(method, options.verbose);
    let optimizer = options.action_optimizer();
    let (ni, ns, nc) = (model.dims().ni, model.dims().ns, model.dims().nc);
    let phik = block_diagonal(model.collocation().phi(), ni);
    let strategy = LinearSolve::for_shape(ni * ns, ni * nc)?;

    let mut change = f64::INFINITY;
    let mut iterations = 0;
    let mut converged = false;

    for it in 1..=options.maxit {
        iterations = it;
        let cold = sol.value_coef.slice(s![0, .., ..]).to_owned();
        bellman_pass(model, options, &optimizer, cold.view(), sol.period_mut(0))?;

        let vc = coefficient_jacobian(
            model,
            sol.policy_j.slice(s![0, .., .., .., ..]),
            sol.discrete_action.slice(s![0, .., ..]),
        )?;
        let c_flat = Array1::from_iter(cold.iter().copied());
        let v_flat = Array1::from_iter(sol.value.slice(s![0, .., ..]).iter().copied());
        let residual = phik.dot(&c_flat) - &v_flat;
        if residual.iter().any(|r| r.is_nan()) {
            return Err(DpError::NanInIteration { algorithm: "Newton", iteration: it });
        }
        let jac = &phik - &vc;
        let step = -strategy.solve(jac.view(), residual.view())?;
        let c_new = (&c_flat + &step)
            .into_shape((ni, nc))
            .map_err(|_| DpError::CoefficientLength { expected: ni * nc, found: step.len() })?;
        sol.value_coef.slice_mut(s![0, .., ..]).assign(&c_new);

        change = sup_norm(step.iter());
        progress.iteration(it, change);
        if change.is_nan() {
            return Err(DpError::NanInIteration { algorithm: "Newton", iteration: it });
        }
        if change < options.tol {
            converged = true;
            break;
        }
    }
    Ok(progress.finish(method, converged, iterations, change))
}

/// `I_n ⊗ a`.
fn block_diagonal(a: ndarray::ArrayView2<f64>, n: usize) -> Array2<f64> {
    let (r, c) = a.dim();
    let mut out = Array2::zeros((n * r, n * c));
    for k in 0..n {
        out.slice_mut(s![k * r..(k + 1) * r, k * c..(k + 1) * c]).assign(&a);
    }
    out
}
