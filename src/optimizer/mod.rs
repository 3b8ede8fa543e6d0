//! optimizer — continuous-action maximization of the Bellman RHS.
//!
//! Purpose
//! -------
//! For a fixed discrete state `i` and discrete action `j`, choose at every
//! collocation node the continuous action that maximizes the Bellman
//! right-hand side within the node's bounds, given the next-period value
//! coefficients. The optimizer is a pure function of its inputs and can be
//! used without any fixed-point driver.
//!
//! Key behaviors
//! -------------
//! - [`ActionOptimizer::Grid`]: search over a finite candidate set
//!   ([`grid::optimize_grid`]).
//! - [`ActionOptimizer::Newton`]: bounded Newton steps on the
//!   complementarity reformulation ([`newton::optimize_newton`]).
//! - [`ActionOptimizer::Mcp`]: one stacked mixed-complementarity solve
//!   ([`newton::optimize_mcp`]).
//! - Models without a continuous action skip optimization and return the
//!   value-only RHS.
//!
//! Invariants & assumptions
//! ------------------------
//! - The action buffer `x` is `dx × ns` and is overwritten in place; the
//!   returned vector is the RHS at the returned actions.
//! - Bounds are queried from the model once per call.
//!
//! Conventions
//! -----------
//! - Per-node failures (a Newton round that does not reach its tolerance,
//!   a singular per-node system) are not surfaced; they only cost accuracy.
pub mod grid;
pub mod lcp;
pub mod mcp;
pub mod newton;

pub use self::{
    lcp::NcpMethod,
    mcp::{McpOutcome, MixedComplementarity},
};

use crate::{
    basis::Interpolant,
    bellman::rhs_value,
    errors::DpResult,
    model::{
        functions::{check_shape, DpFunctions},
        DpModel,
    },
};
use ndarray::{Array1, Array2, ArrayView2};

/// Which continuous-action strategy to use for a model that is not
/// discretized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionStrategy {
    /// Per-node bounded Newton steps.
    #[default]
    ComplementarityNewton,
    /// Stacked mixed-complementarity solve.
    MixedComplementarity,
}

/// A configured action optimizer.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOptimizer<'a> {
    /// Candidate actions, `dx × nx`.
    Grid(ArrayView2<'a, f64>),
    Newton { method: NcpMethod, maxit: usize, tol: f64 },
    Mcp(MixedComplementarity),
}

impl ActionOptimizer<'_> {
    /// Maximize the Bellman RHS for `(i, j)` at every node.
    ///
    /// Parameters
    /// ----------
    /// - `model`: model definition.
    /// - `i`, `j`: discrete state and action.
    /// - `next_coef`: next-period value coefficients, `ni × nc`.
    /// - `x`: incumbent actions, `dx × ns`; overwritten with the optimum.
    ///
    /// Returns
    /// -------
    /// RHS values at the returned actions, length `ns`.
    ///
    /// Errors
    /// ------
    /// - [`crate::errors::DpError::MissingBounds`] and shape errors from the
    ///   bounds callback.
    /// - Evaluator errors.
    pub fn optimize<F: DpFunctions, B: Interpolant>(
        &self, model: &DpModel<F, B>, i: usize, j: usize, next_coef: ArrayView2<f64>,
        x: &mut Array2<f64>,
    ) -> DpResult<Array1<f64>> {
        if model.dims().is_discrete() {
            return rhs_value(model, model.collocation().nodes(), x.view(), i, j, next_coef);
        }
        match self {
            ActionOptimizer::Grid(grid) => {
                grid::optimize_grid(model, i, j, next_coef, grid.view(), x)
            }
            ActionOptimizer::Newton { method, maxit, tol } => {
                newton::optimize_newton(model, i, j, next_coef, *method, *maxit, *tol, x)
            }
            ActionOptimizer::Mcp(solver) => newton::optimize_mcp(model, i, j, next_coef, solver, x),
        }
    }
}

/// Action bounds at the nodes `s`, validated to be `dx × m` each.
pub(crate) fn node_bounds<F: DpFunctions, B: Interpolant>(
    model: &DpModel<F, B>, s: ArrayView2<f64>, i: usize, j: usize,
) -> DpResult<(Array2<f64>, Array2<f64>)> {
    let expected = [model.dims().dx, s.ncols()];
    let (lb, ub) = model.functions().bounds(s, i, j)?;
    check_shape("lower bound", lb.shape(), &expected)?;
    check_shape("upper bound", ub.shape(), &expected)?;
    Ok((lb, ub))
}
