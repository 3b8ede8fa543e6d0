//! Errors for dynamic-programming models and their collocation solvers.
//!
//! This module defines the crate-wide error type, [`DpError`], used by model
//! construction, interpolation, the Bellman evaluator, the action optimizers
//! and the fixed-point drivers. It implements `Display`/`Error`.
//!
//! ## Conventions
//! - **Indices are 0-based**: `i` is the discrete state, `j` the discrete
//!   action, `n` the node.
//! - Failure to converge within the iteration budget is *not* an error; it is
//!   reported through `SolveOutcome::converged`.
//! - A `NaN` in the iterate-to-iterate coefficient change aborts the solve
//!   with [`DpError::NanInIteration`].
//! - A node whose best value over all actions is `-∞` aborts the pass with
//!   [`DpError::NoFeasibleAction`].

/// Crate-wide result alias for operations that may produce [`DpError`].
pub type DpResult<T> = Result<T, DpError>;

/// Unified error type for dynamic-programming models and solvers.
#[derive(Debug, Clone, PartialEq)]
pub enum DpError {
    // ---- Model dimensions ----
    /// Model has neither a continuous action nor more than one discrete action.
    NoDecision,

    /// A dimension is zero or otherwise inconsistent.
    InvalidDimension { name: &'static str, value: usize, reason: &'static str },

    // ---- Time ----
    /// Discount factor must be finite and within its admissible range.
    InvalidDiscount { value: f64, reason: &'static str },

    /// Finite horizons must have at least one period.
    InvalidHorizon { periods: usize },

    // ---- Random specification ----
    /// Shock support and weights disagree on the number of realizations.
    ShockLengthMismatch { support: usize, weights: usize },

    /// Shock weights must be finite, non-negative and sum to one.
    InvalidShockWeights { index: usize, value: f64, reason: &'static str },

    /// A model with two or more discrete states needs a discrete transition.
    MissingDiscreteTransition { ni: usize },

    /// Discrete transition tensor has the wrong shape.
    TransitionShapeMismatch { expected: Vec<usize>, found: Vec<usize> },

    /// Transition probability outside `[0, 1]`.
    InvalidTransitionProb { j: usize, i: usize, i_next: usize, value: f64 },

    /// Row of the transition tensor does not sum to one.
    TransitionRowSum { j: usize, i: usize, sum: f64 },

    /// Deterministic transition points to a state that does not exist.
    TransitionTargetOutOfRange { j: usize, i: usize, target: usize },

    // ---- Model functions ----
    /// Analytic derivatives were requested but the function does not provide them.
    DerivativesNotImplemented { function: &'static str },

    /// Bounds are required whenever the model has a continuous action.
    MissingBounds,

    /// A user function returned an array of the wrong shape.
    FunctionShapeMismatch { function: &'static str, expected: Vec<usize>, found: Vec<usize> },

    // ---- Interpolation ----
    /// Basis specification is invalid.
    InvalidBasis { reason: &'static str },

    /// Coefficient vector has the wrong length for the basis.
    CoefficientLength { expected: usize, found: usize },

    /// Evaluation points have the wrong number of rows.
    PointDimension { expected: usize, found: usize },

    // ---- Linear algebra ----
    /// Linear system could not be solved.
    SingularSystem { rows: usize, cols: usize },

    /// Collocation system has fewer nodes than coefficients.
    UnderdeterminedSystem { rows: usize, cols: usize },

    // ---- Finite differences ----
    /// Finite-difference gradient contained a non-finite entry.
    InvalidGradient { node: usize, index: usize, value: f64 },

    /// Finite-difference Hessian contained a non-finite entry.
    InvalidHessian { node: usize, row: usize, col: usize, value: f64 },

    // ---- Solver options ----
    /// Tolerance must be finite and strictly positive.
    InvalidTolerance { tol: f64, reason: &'static str },

    /// Iteration limits must be positive.
    InvalidMaxIter { max_iter: usize, reason: &'static str },

    /// Unrecognized fixed-point algorithm name.
    UnknownAlgorithm { name: String },

    /// Unrecognized complementarity transform name.
    UnknownNcpMethod { name: String },

    /// Discretized action grid must have one row per continuous action.
    DiscretizedActionRows { expected: usize, found: usize },

    /// Known-function flags must be an `ni × nj` array.
    KnownFunctionsShape { expected: (usize, usize), found: (usize, usize) },

    /// Caller-supplied initial guess has the wrong shape.
    InitialGuessShape { what: &'static str, expected: Vec<usize>, found: Vec<usize> },

    // ---- Fixed-point iteration ----
    /// A NaN appeared in the coefficient change.
    NanInIteration { algorithm: &'static str, iteration: usize },

    /// No discrete action has a feasible candidate action at a node.
    NoFeasibleAction { i: usize, node: usize },

    /// Requested period is outside the solved horizon.
    PeriodOutOfRange { period: usize, periods: usize },
}

impl std::error::Error for DpError {}

impl std::fmt::Display for DpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Model dimensions ----
            DpError::NoDecision => {
                write!(
                    f,
                    "Model does not specify any policy variable: needs a continuous action or \
                     at least two discrete actions"
                )
            }
            DpError::InvalidDimension { name, value, reason } => {
                write!(f, "Invalid dimension {name} = {value}: {reason}")
            }

            // ---- Time ----
            DpError::InvalidDiscount { value, reason } => {
                write!(f, "Invalid discount factor {value}: {reason}")
            }
            DpError::InvalidHorizon { periods } => {
                write!(f, "Invalid finite horizon {periods}: must be at least one period")
            }

            // ---- Random specification ----
            DpError::ShockLengthMismatch { support, weights } => {
                write!(
                    f,
                    "Shock support has {support} realizations but {weights} weights were given"
                )
            }
            DpError::InvalidShockWeights { index, value, reason } => {
                write!(f, "Invalid shock weight at index {index}: {value}: {reason}")
            }
            DpError::MissingDiscreteTransition { ni } => {
                write!(
                    f,
                    "Model has {ni} discrete states: a deterministic or stochastic discrete \
                     transition must be provided"
                )
            }
            DpError::TransitionShapeMismatch { expected, found } => {
                write!(f, "Discrete transition shape mismatch: expected {expected:?}, found {found:?}")
            }
            DpError::InvalidTransitionProb { j, i, i_next, value } => {
                write!(f, "Transition probability q[{j}, {i}, {i_next}] = {value} is outside [0, 1]")
            }
            DpError::TransitionRowSum { j, i, sum } => {
                write!(f, "Transition row q[{j}, {i}, :] sums to {sum}, must sum to 1")
            }
            DpError::TransitionTargetOutOfRange { j, i, target } => {
                write!(f, "Deterministic transition h[{j}, {i}] = {target} is not a discrete state")
            }

            // ---- Model functions ----
            DpError::DerivativesNotImplemented { function } => {
                write!(f, "Analytic derivatives of the {function} function are not implemented")
            }
            DpError::MissingBounds => {
                write!(f, "Bounds for the continuous action are missing")
            }
            DpError::FunctionShapeMismatch { function, expected, found } => {
                write!(
                    f,
                    "The {function} function returned shape {found:?}, expected {expected:?}"
                )
            }

            // ---- Interpolation ----
            DpError::InvalidBasis { reason } => {
                write!(f, "Invalid interpolation basis: {reason}")
            }
            DpError::CoefficientLength { expected, found } => {
                write!(f, "Coefficient length mismatch: expected {expected}, found {found}")
            }
            DpError::PointDimension { expected, found } => {
                write!(f, "Evaluation points must have {expected} rows, found {found}")
            }

            // ---- Linear algebra ----
            DpError::SingularSystem { rows, cols } => {
                write!(f, "Linear system of shape ({rows}, {cols}) could not be solved")
            }
            DpError::UnderdeterminedSystem { rows, cols } => {
                write!(
                    f,
                    "Collocation system of shape ({rows}, {cols}) has fewer nodes than coefficients"
                )
            }

            // ---- Finite differences ----
            DpError::InvalidGradient { node, index, value } => {
                write!(f, "Invalid finite-difference gradient at node {node}, index {index}: {value}")
            }
            DpError::InvalidHessian { node, row, col, value } => {
                write!(
                    f,
                    "Invalid finite-difference Hessian at node {node}, ({row}, {col}): {value}"
                )
            }

            // ---- Solver options ----
            DpError::InvalidTolerance { tol, reason } => {
                write!(f, "Invalid tolerance {tol}: {reason}")
            }
            DpError::InvalidMaxIter { max_iter, reason } => {
                write!(f, "Invalid maximum iterations {max_iter}: {reason}")
            }
            DpError::UnknownAlgorithm { name } => {
                write!(
                    f,
                    "Unknown solution algorithm '{name}': valid options are 'newton' or 'funcit'"
                )
            }
            DpError::UnknownNcpMethod { name } => {
                write!(
                    f,
                    "Unknown complementarity method '{name}': valid options are 'minmax' or 'smooth'"
                )
            }
            DpError::DiscretizedActionRows { expected, found } => {
                write!(
                    f,
                    "If the model is discretized, the action grid must have {expected} rows, found {found}"
                )
            }
            DpError::KnownFunctionsShape { expected, found } => {
                write!(f, "Known-function flags must have shape {expected:?}, found {found:?}")
            }
            DpError::InitialGuessShape { what, expected, found } => {
                write!(f, "Initial {what} must have shape {expected:?}, found {found:?}")
            }

            // ---- Fixed-point iteration ----
            DpError::NanInIteration { algorithm, iteration } => {
                write!(f, "NaN found on {algorithm} iteration {iteration}")
            }
            DpError::NoFeasibleAction { i, node } => {
                write!(f, "No feasible action at node {node} of discrete state {i}")
            }
            DpError::PeriodOutOfRange { period, periods } => {
                write!(f, "Period {period} is outside the solved horizon of {periods} periods")
            }
        }
    }
}
