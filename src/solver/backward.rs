//! Finite-horizon backward recursion.
use crate::{
    basis::Interpolant,
    errors::DpResult,
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

/// Solve periods `T-1, …, 0` in order, each from the value of the period
/// after it. Slot `T` of `sol.value` holds the terminal value on entry.
///
/// Runs exactly `periods` passes; there is no convergence test.
pub(crate) fn solve_backward<F: DpFunctions, B: Interpolant>(
    model: &DpModel<F, B>, options: &SolveOptions, sol: &mut DpSolution, periods: usize,
) -> DpResult<SolveOutcome> {
    let progress = Progress::start(SolveMethod::BackwardRecursion, options.verbose);
    let optimizer = options.action_optimizer();
    for t in (0..periods).rev() {
        let next = sol.value_coef.slice(s![t + 1, .., ..]).to_owned();
        bellman_pass(model, options, &optimizer, next.view(), sol.period_mut(t))?;
        let coef = sol.refit_value(model, t)?;
        sol.value_coef.slice_mut(s![t, .., ..]).assign(&coef);
        progress.period(t);
    }
    Ok(progress.finish(SolveMethod::BackwardRecursion, true, periods, 0.0))
}
