//! solver — fixed-point drivers for dynamic-programming models.
//!
//! Purpose
//! -------
//! Turn a [`DpModel`] into value and policy functions. Finite horizons are
//! solved by backward recursion from the terminal value; infinite horizons
//! by function iteration or by Newton iteration on the collocation residual.
//!
//! Key behaviors
//! -------------
//! - [`solve`] validates the options against the model, builds the initial
//!   [`DpSolution`] and dispatches on the horizon and
//!   [`options::Algorithm`].
//! - Every driver applies the same Bellman pass: optimize each
//!   `(i, j)` pair, pick the best discrete action, refit the value.
//! - Progress is written through the `log` facade; a [`SolveOutcome`]
//!   reports convergence in argmin's termination vocabulary.
//!
//! Invariants & assumptions
//! ------------------------
//! - Hitting `maxit` is not an error. The last iterate is returned with
//!   `converged = false` and a warning is logged.
//! - A `NaN` coefficient change aborts with
//!   [`crate::errors::DpError::NanInIteration`].
//! - The model is never mutated; all state lives in the returned solution.
pub mod backward;
pub mod function_iteration;
pub mod newton;
pub mod options;
pub mod outcome;
pub(crate) mod progress;
pub mod state;
pub(crate) mod vmax;

pub use self::{
    options::{Algorithm, InitialGuess, SolveOptions},
    outcome::{SolveMethod, SolveOutcome},
    state::DpSolution,
};

use crate::{
    basis::Interpolant,
    errors::DpResult,
    model::{functions::DpFunctions, DpModel, Horizon},
};

/// Solve a model.
///
/// Parameters
/// ----------
/// - `model`: model definition.
/// - `options`: algorithm choice, tolerances and action strategy.
/// - `guess`: initial value (the terminal value for a finite horizon) and
///   initial conditional policies. Missing parts default to zero values and
///   bound midpoints.
///
/// Returns
/// -------
/// The solution state and a [`SolveOutcome`].
///
/// Errors
/// ------
/// - Option and initial-guess validation errors.
/// - Callback, interpolation and linear-algebra errors raised inside a pass.
/// - [`crate::errors::DpError::NanInIteration`] on a `NaN` change.
/// - [`crate::errors::DpError::NoFeasibleAction`] when a node has no
///   feasible action under any discrete choice.
pub fn solve<F: DpFunctions, B: Interpolant>(
    model: &DpModel<F, B>, options: &SolveOptions, guess: &InitialGuess,
) -> DpResult<(DpSolution, SolveOutcome)> {
    options.validate_for(&model.dims())?;
    let mut sol = DpSolution::initialize(model, guess)?;
    let outcome = match (model.horizon(), options.algorithm) {
        (Horizon::Finite(periods), _) => {
            backward::solve_backward(model, options, &mut sol, periods)?
        }
        (Horizon::Infinite, Algorithm::Newton) => newton::solve_newton(model, options, &mut sol)?,
        (Horizon::Infinite, Algorithm::FunctionIteration) => {
            function_iteration::solve_function_iteration(model, options, &mut sol)?
        }
    };
    Ok((sol, outcome))
}
