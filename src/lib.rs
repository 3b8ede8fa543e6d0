//! rust_dynprog — collocation solvers for discrete-time dynamic programs.
//!
//! Purpose
//! -------
//! Solve Bellman equations of the form
//! `V(s, i) = max_{x, j} f(s, x, i, j) + δ E[V(g(s, x, i, j, e), i')]`
//! with continuous states `s`, discrete states `i`, continuous actions `x`
//! and discrete actions `j`, approximating each value function by a linear
//! combination of basis functions fitted at collocation nodes.
//!
//! Key behaviors
//! -------------
//! - [`model`]: the immutable model definition and the user callback trait
//!   [`model::DpFunctions`].
//! - [`basis`]: the [`basis::Interpolant`] seam, a tensor Chebyshev basis and
//!   the collocation fitting system.
//! - [`bellman`]: value and derivatives of the Bellman right-hand side.
//! - [`optimizer`]: per-node maximization over continuous actions by grid
//!   search, bounded Newton steps or a stacked complementarity solve.
//! - [`choice`]: maximization over discrete actions.
//! - [`solver`]: backward recursion, function iteration and Newton
//!   iteration, reached through [`solver::solve`].
//!
//! Invariants & assumptions
//! ------------------------
//! - All arrays are `ndarray` arrays with points stored column-wise
//!   (`ds × m`, `dx × m`).
//! - Validation happens at construction; solvers assume well-formed models.
//!
//! Conventions
//! -----------
//! - Fallible operations return [`errors::DpResult`].
//! - Diagnostics go through the `log` facade; install any logger to see the
//!   iteration table.
//!
//! Testing notes
//! -------------
//! - Unit tests live next to each module; end-to-end checks against models
//!   with closed-form solutions are in `tests/`.

pub mod basis;
pub mod bellman;
pub mod choice;
pub mod errors;
pub mod linalg;
pub mod model;
pub mod optimizer;
pub mod solver;

pub use crate::{
    basis::{ChebyshevBasis, Collocation, Interpolant},
    errors::{DpError, DpResult},
    model::{DerivativeMode, DpFunctions, DpModel, DpTime, Horizon, MarkovTransition, RandomSpec},
    solver::{solve, Algorithm, DpSolution, InitialGuess, SolveOptions, SolveOutcome},
};
