//! Infinite-horizon function iteration.
use crate::{
    basis::Interpolant,
    errors::{DpError, DpResult},
    linalg::sup_norm,
    model::{functions::DpFunctions, DpModel},
    solver::{
        options::SolveOptions,
        outcome::{SolveMethod, SolveOutcome},
        progress::Progress,
        state::DpSolution,
        vmax::bellman_pass,
    },
};
use ndarray::s;

/// Iterate `c ← fit(T(c))` until `‖c_new − c_old‖∞ < tol` or `maxit`
/// iterations have run. The last iterate is kept either way.
///
/// # Errors
/// [`DpError::NanInIteration`] when the change is `NaN`, plus any error of
/// the Bellman pass.
pub(crate) fn solve_function_iteration<F: DpFunctions, B: Interpolant>(
    model: &DpModel<F, B>, options: &SolveOptions, sol: &mut DpSolution,
) -> DpResult<SolveOutcome> {
    let method = SolveMethod::FunctionIteration;
    let progress = Progress::start(method, options.verbose);
    let optimizer = options.action_optimizer();
    let mut change = f64::INFINITY;
    let mut iterations = 0;
    let mut converged = false;

    for it in 1..=options.maxit {
        iterations = it;
        let cold = sol.value_coef.slice(s![0, .., ..]).to_owned();
        bellman_pass(model, options, &optimizer, cold.view(), sol.period_mut(0))?;
        let coef = sol.refit_value(model, 0)?;
        change = sup_norm((&coef - &cold).iter());
        sol.value_coef.slice_mut(s![0, .., ..]).assign(&coef);
        progress.iteration(it, change);
        if change.is_nan() {
            return Err(DpError::NanInIteration { algorithm: "function iteration", iteration: it });
        }
        if change < options.tol {
            converged = true;
            break;
        }
    }
    Ok(progress.finish(method, converged, iterations, change))
}
