//! Solver configuration and initial guesses.
//!
//! Purpose
//! -------
//! Replace a free-form option bag with an explicit, validated configuration
//! ([`SolveOptions`]) and an explicit starting point ([`InitialGuess`]).
//!
//! Key behaviors
//! -------------
//! - [`Algorithm`] and the complementarity method parse case-insensitively
//!   from strings.
//! - [`SolveOptions::new`] validates tolerances and iteration limits;
//!   shape checks that need the model happen in
//!   [`SolveOptions::validate_for`].
//! - [`SolveOptions::action_optimizer`] resolves the configuration into the
//!   optimizer used by every Bellman pass.
//!
//! Conventions
//! -----------
//! - Defaults: Newton, `tol = √ε`, `maxit = 80`, min-max reformulation,
//!   `maxit_ncp = 50`, complementarity-Newton actions, no action grid, no
//!   known functions, quiet.
use crate::{
    errors::{DpError, DpResult},
    model::DpDims,
    optimizer::{ActionOptimizer, ActionStrategy, MixedComplementarity, NcpMethod},
};
use ndarray::{Array2, Array4};
use std::str::FromStr;

/// Infinite-horizon fixed-point algorithm.
///
/// Parsing:
/// Accepts case-insensitive `"newton"`, `"funcit"` and
/// `"function_iteration"`; anything else is
/// [`DpError::UnknownAlgorithm`]. Finite-horizon models always use backward
/// recursion regardless of this choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Algorithm {
    #[default]
    Newton,
    FunctionIteration,
}

impl FromStr for Algorithm {
    type Err = DpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "newton" => Ok(Algorithm::Newton),
            "funcit" | "function_iteration" => Ok(Algorithm::FunctionIteration),
            _ => Err(DpError::UnknownAlgorithm { name: s.to_string() }),
        }
    }
}

/// Fully enumerated solver configuration.
///
/// Fields:
/// - `algorithm`: infinite-horizon fixed-point algorithm.
/// - `tol`: convergence tolerance, shared by the outer iteration (sup-norm of
///   the coefficient change) and the action optimizer (sup-norm of the
///   complementarity residual).
/// - `maxit`: maximum outer iterations.
/// - `ncp_method`: complementarity reformulation.
/// - `maxit_ncp`: maximum action-optimizer iterations per Bellman pass.
/// - `action_strategy`: continuous-action strategy when not discretized.
/// - `discretized_actions`: optional `dx × nx` candidate grid; when set,
///   actions are chosen by grid search.
/// - `known_functions`: optional `ni × nj` flags; a flagged pair keeps its
///   supplied policy and is only evaluated.
/// - `verbose`: log the iteration table at `info` instead of `debug`.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveOptions {
    pub algorithm: Algorithm,
    pub tol: f64,
    pub maxit: usize,
    pub ncp_method: NcpMethod,
    pub maxit_ncp: usize,
    pub action_strategy: ActionStrategy,
    pub discretized_actions: Option<Array2<f64>>,
    pub known_functions: Option<Array2<bool>>,
    pub verbose: bool,
}

impl SolveOptions {
    /// Build validated options with the remaining fields at their defaults.
    ///
    /// # Errors
    /// - [`DpError::InvalidTolerance`] if `tol` is non-finite or `≤ 0`.
    /// - [`DpError::InvalidMaxIter`] if `maxit` or `maxit_ncp` is zero.
    pub fn new(algorithm: Algorithm, tol: f64, maxit: usize, maxit_ncp: usize) -> DpResult<Self> {
        verify_tol(tol)?;
        verify_maxit(maxit)?;
        verify_maxit(maxit_ncp)?;
        Ok(SolveOptions { algorithm, tol, maxit, maxit_ncp, ..Default::default() })
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_ncp_method(mut self, method: NcpMethod) -> Self {
        self.ncp_method = method;
        self
    }

    pub fn with_action_strategy(mut self, strategy: ActionStrategy) -> Self {
        self.action_strategy = strategy;
        self
    }

    pub fn with_discretized_actions(mut self, grid: Array2<f64>) -> Self {
        self.discretized_actions = Some(grid);
        self
    }

    pub fn with_known_functions(mut self, known: Array2<bool>) -> Self {
        self.known_functions = Some(known);
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Check the options against a model's dimensions.
    ///
    /// # Errors
    /// - [`DpError::InvalidTolerance`] / [`DpError::InvalidMaxIter`] for
    ///   fields edited after construction.
    /// - [`DpError::DiscretizedActionRows`] when the grid does not have `dx`
    ///   rows.
    /// - [`DpError::KnownFunctionsShape`] when the flags are not `ni × nj`.
    pub fn validate_for(&self, dims: &DpDims) -> DpResult<()> {
        verify_tol(self.tol)?;
        verify_maxit(self.maxit)?;
        verify_maxit(self.maxit_ncp)?;
        if let Some(grid) = &self.discretized_actions {
            if grid.nrows() != dims.dx {
                return Err(DpError::DiscretizedActionRows {
                    expected: dims.dx,
                    found: grid.nrows(),
                });
            }
        }
        if let Some(known) = &self.known_functions {
            if known.dim() != (dims.ni, dims.nj) {
                return Err(DpError::KnownFunctionsShape {
                    expected: (dims.ni, dims.nj),
                    found: known.dim(),
                });
            }
        }
        Ok(())
    }

    /// `true` when the pair `(i, j)` keeps its supplied policy.
    pub fn is_known(&self, i: usize, j: usize) -> bool {
        self.known_functions.as_ref().is_some_and(|known| known[[i, j]])
    }

    /// Resolve the action optimizer used in every Bellman pass.
    pub fn action_optimizer(&self) -> ActionOptimizer<'_> {
        if let Some(grid) = &self.discretized_actions {
            return ActionOptimizer::Grid(grid.view());
        }
        match self.action_strategy {
            ActionStrategy::ComplementarityNewton => ActionOptimizer::Newton {
                method: self.ncp_method,
                maxit: self.maxit_ncp,
                tol: self.tol,
            },
            ActionStrategy::MixedComplementarity => {
                ActionOptimizer::Mcp(MixedComplementarity {
                    method: self.ncp_method,
                    maxit: self.maxit_ncp,
                    tol: self.tol,
                    ..Default::default()
                })
            }
        }
    }
}

impl Default for SolveOptions {
    fn default() -> Self {
        SolveOptions {
            algorithm: Algorithm::Newton,
            tol: f64::EPSILON.sqrt(),
            maxit: 80,
            ncp_method: NcpMethod::MinMax,
            maxit_ncp: 50,
            action_strategy: ActionStrategy::ComplementarityNewton,
            discretized_actions: None,
            known_functions: None,
            verbose: false,
        }
    }
}

/// Caller-supplied starting point.
///
/// - `value`: `ni × ns` values at the nodes. Infinite horizon: the first
///   iterate. Finite horizon: the terminal value `Value[T]`. Defaults to 0.
/// - `policy`: `[ni, nj, dx, ns]` conditional actions. Seeds every period.
///   Defaults to the midpoint of the action bounds at each node (the finite
///   bound if only one is finite, 0 if neither is).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InitialGuess {
    pub value: Option<Array2<f64>>,
    pub policy: Option<Array4<f64>>,
}

impl InitialGuess {
    pub fn with_value(mut self, value: Array2<f64>) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_policy(mut self, policy: Array4<f64>) -> Self {
        self.policy = Some(policy);
        self
    }
}

// ---- Helper methods ----

fn verify_tol(tol: f64) -> DpResult<()> {
    if !tol.is_finite() {
        return Err(DpError::InvalidTolerance { tol, reason: "Tolerance must be finite." });
    }
    if tol <= 0.0 {
        return Err(DpError::InvalidTolerance { tol, reason: "Tolerance must be positive." });
    }
    Ok(())
}

fn verify_maxit(max_iter: usize) -> DpResult<()> {
    if max_iter == 0 {
        return Err(DpError::InvalidMaxIter {
            max_iter,
            reason: "Maximum iterations must be greater than zero.",
        });
    }
    Ok(())
}
