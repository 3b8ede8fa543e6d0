//! Convergence report returned alongside a solution.
use argmin::core::{TerminationReason, TerminationStatus};
use std::time::Duration;

/// Fixed-point method that produced a solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveMethod {
    BackwardRecursion,
    FunctionIteration,
    Newton,
}

impl std::fmt::Display for SolveMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolveMethod::BackwardRecursion => write!(f, "backward recursion"),
            SolveMethod::FunctionIteration => write!(f, "function iteration"),
            SolveMethod::Newton => write!(f, "Newton"),
        }
    }
}

/// Normalized result of a solve.
///
/// - `method`: fixed-point method used.
/// - `converged`: `true` if the tolerance was reached (always `true` for
///   backward recursion, which runs exactly `T` passes).
/// - `status`: human-readable termination status.
/// - `iterations`: outer iterations (or periods) performed.
/// - `change`: last sup-norm coefficient change (`0.0` for backward
///   recursion).
/// - `elapsed`: wall-clock time.
/// - `termination`: the same information in argmin's vocabulary.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveOutcome {
    pub method: SolveMethod,
    pub converged: bool,
    pub status: String,
    pub iterations: usize,
    pub change: f64,
    pub elapsed: Duration,
    pub termination: TerminationStatus,
}

impl SolveOutcome {
    /// Build an outcome, mapping `converged` onto a termination status.
    pub fn new(
        method: SolveMethod, converged: bool, iterations: usize, change: f64, elapsed: Duration,
    ) -> Self {
        let reason = if converged {
            TerminationReason::SolverConverged
        } else {
            TerminationReason::MaxItersReached
        };
        let status = match method {
            SolveMethod::BackwardRecursion => format!("Solved {iterations} periods"),
            _ if converged => format!("Converged after {iterations} iterations"),
            _ => format!("Not converged after {iterations} iterations (change {change:.3e})"),
        };
        SolveOutcome {
            method,
            converged,
            status,
            iterations,
            change,
            elapsed,
            termination: TerminationStatus::Terminated(reason),
        }
    }
}
