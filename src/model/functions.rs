//! User-supplied model functions: reward, transition and action bounds.
//!
//! Purpose
//! -------
//! Define the [`DpFunctions`] trait a model implements, together with the
//! containers returned when derivatives with respect to the continuous action
//! are supplied analytically ([`RewardEval`], [`TransitionEval`]).
//!
//! Key behaviors
//! -------------
//! - All callbacks are batched over nodes: `s` is `ds × ns`, `x` is
//!   `dx × ns` (zero rows for a purely discrete model) and every output has a
//!   trailing node axis.
//! - Derivative availability is fixed once per model through
//!   [`DerivativeMode`]; the evaluator never probes a callback to find out
//!   whether derivatives exist.
//!
//! Invariants & assumptions
//! ------------------------
//! - `reward` returns a length-`ns` vector.
//! - `transition` returns the successor continuous state, `ds × ns`.
//! - `RewardEval::gradient` is `dx × ns`, `RewardEval::hessian` is
//!   `dx × dx × ns`.
//! - `TransitionEval::jacobian[[k, d, n]] = ∂s'_d / ∂x_k` at node `n`
//!   (`dx × ds × ns`); `TransitionEval::hessian[[k, l, d, n]] =
//!   ∂²s'_d / ∂x_k ∂x_l` (`dx × dx × ds × ns`).
//! - `bounds` returns `(lower, upper)`, each `dx × ns`; infinite entries are
//!   allowed.
//!
//! Conventions
//! -----------
//! - Default method bodies return [`DpError::DerivativesNotImplemented`] or
//!   [`DpError::MissingBounds`], mirroring optional trait methods elsewhere
//!   in the crate.
//! - Shapes are checked by the evaluator through [`check_shape`] so that a
//!   malformed callback surfaces as [`DpError::FunctionShapeMismatch`]
//!   rather than an out-of-bounds panic.
use crate::errors::{DpError, DpResult};
use ndarray::{Array1, Array2, Array3, Array4, ArrayView1, ArrayView2};

/// How derivatives of the Bellman right-hand side with respect to the
/// continuous action are obtained.
///
/// - `Analytic`: use [`DpFunctions::reward_derivatives`] and
///   [`DpFunctions::transition_derivatives`].
/// - `FiniteDifference`: differentiate the value-only callbacks numerically,
///   one node at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DerivativeMode {
    #[default]
    Analytic,
    FiniteDifference,
}

/// Reward value with first and second action derivatives.
#[derive(Debug, Clone, PartialEq)]
pub struct RewardEval {
    /// `f(s, x)`, length `ns`.
    pub value: Array1<f64>,
    /// `∂f/∂x`, `dx × ns`.
    pub gradient: Array2<f64>,
    /// `∂²f/∂x²`, `dx × dx × ns`.
    pub hessian: Array3<f64>,
}

/// Successor state with first and second action derivatives.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionEval {
    /// `g(s, x, e)`, `ds × ns`.
    pub next: Array2<f64>,
    /// `∂g/∂x`, `dx × ds × ns`.
    pub jacobian: Array3<f64>,
    /// `∂²g/∂x²`, `dx × dx × ds × ns`.
    pub hessian: Array4<f64>,
}

/// Model callbacks evaluated by the Bellman operator.
///
/// Required:
/// - `reward(s, x, i, j)`: period payoff at every node.
/// - `transition(s, x, i, j, i_next, e)`: successor continuous state for the
///   shock realization `e` (length `de`) when the discrete state moves from
///   `i` to `i_next` under discrete action `j`.
///
/// Optional:
/// - `reward_derivatives`, `transition_derivatives`: analytic action
///   derivatives, required when the model uses [`DerivativeMode::Analytic`]
///   and has a continuous action.
/// - `bounds(s, i, j)`: box constraints on the continuous action, required
///   whenever `dx > 0`.
pub trait DpFunctions {
    fn reward(
        &self, s: ArrayView2<f64>, x: ArrayView2<f64>, i: usize, j: usize,
    ) -> DpResult<Array1<f64>>;

    fn transition(
        &self, s: ArrayView2<f64>, x: ArrayView2<f64>, i: usize, j: usize, i_next: usize,
        e: ArrayView1<f64>,
    ) -> DpResult<Array2<f64>>;

    fn reward_derivatives(
        &self, _s: ArrayView2<f64>, _x: ArrayView2<f64>, _i: usize, _j: usize,
    ) -> DpResult<RewardEval> {
        Err(DpError::DerivativesNotImplemented { function: "reward" })
    }

    fn transition_derivatives(
        &self, _s: ArrayView2<f64>, _x: ArrayView2<f64>, _i: usize, _j: usize, _i_next: usize,
        _e: ArrayView1<f64>,
    ) -> DpResult<TransitionEval> {
        Err(DpError::DerivativesNotImplemented { function: "transition" })
    }

    fn bounds(
        &self, _s: ArrayView2<f64>, _i: usize, _j: usize,
    ) -> DpResult<(Array2<f64>, Array2<f64>)> {
        Err(DpError::MissingBounds)
    }
}

/// Check that a callback returned the shape the evaluator expects.
///
/// # Errors
/// [`DpError::FunctionShapeMismatch`] naming `function` when
/// `found != expected`.
pub fn check_shape(function: &'static str, found: &[usize], expected: &[usize]) -> DpResult<()> {
    if found != expected {
        return Err(DpError::FunctionShapeMismatch {
            function,
            expected: expected.to_vec(),
            found: found.to_vec(),
        });
    }
    Ok(())
}
