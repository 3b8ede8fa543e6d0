//! model — description of a discrete-time dynamic-programming problem.
//!
//! Purpose
//! -------
//! Collect everything that defines a model and stays fixed while it is
//! solved: dimensions, discounting and horizon, shocks and discrete-state
//! transitions, and the user callbacks for reward, transition and action
//! bounds.
//!
//! Key behaviors
//! -------------
//! - [`dims::DpDims`]: validated counts (`ds`, `ns`, `dx`, `ni`, `nj`, `ne`,
//!   `nc`) and the "at least one decision" rule.
//! - [`time::DpTime`]: discount factor and [`time::Horizon`].
//! - [`random::RandomSpec`]: shock quadrature and the Markov tensor `q`.
//! - [`functions::DpFunctions`]: batched callbacks plus optional analytic
//!   derivatives, selected once through [`functions::DerivativeMode`].
//! - [`definition::DpModel`]: the assembled model.
//!
//! Invariants & assumptions
//! ------------------------
//! - A model is immutable after construction; solver state lives in
//!   `solver::state::DpSolution`.
//! - Every validation happens in a constructor, so downstream code can rely
//!   on well-formed arrays.
pub mod definition;
pub mod dims;
pub mod functions;
pub mod random;
pub mod time;

pub use self::{
    definition::DpModel,
    dims::DpDims,
    functions::{DerivativeMode, DpFunctions, RewardEval, TransitionEval},
    random::{MarkovTransition, RandomSpec, MARKOV_ROW_TOL},
    time::{DpTime, Horizon},
};
