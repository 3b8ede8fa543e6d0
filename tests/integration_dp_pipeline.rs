//! Integration tests for the dynamic-programming pipeline.
//!
//! Purpose
//! -------
//! - Validate the end-to-end path from model definition, through the
//!   Bellman pass and action optimizers, to the fixed-point drivers.
//! - Compare against models with closed-form solutions rather than against
//!   stored numbers.
//!
//! Coverage
//! --------
//! - `model`: callbacks, Markov transitions and their validation.
//! - `basis::Interpolant`: a user-defined basis plugged into the solvers.
//! - `solver::solve`: Newton and function iteration on a log-linear growth
//!   model, with analytic and finite-difference derivatives, with and
//!   without known policies.
//! - Backward recursion and Newton iteration on a purely discrete stopping
//!   model; grid search over a discretized action set.
//!
//! Exclusions
//! ----------
//! - Per-node optimizer edge cases and interpolation internals, which are
//!   covered by unit tests.
use approx::assert_abs_diff_eq;
use ndarray::{array, Array1, Array2, Array3, Array4, ArrayView1, ArrayView2};
use rust_dynprog::{
    basis::InterpolantEval,
    model::{RewardEval, TransitionEval},
    solve, Algorithm, ChebyshevBasis, DerivativeMode, DpError, DpFunctions, DpModel, DpResult,
    DpTime, Horizon, InitialGuess, Interpolant, MarkovTransition, RandomSpec, SolveOptions,
};

const DISCOUNT: f64 = 0.95;

/// Basis `{1, ln s}` on two nodes; spans the value function of log-utility
/// growth models exactly.
#[derive(Debug, Clone)]
struct LogLinear;

impl Interpolant for LogLinear {
    fn ds(&self) -> usize {
        1
    }

    fn n_coef(&self) -> usize {
        2
    }

    fn nodes(&self) -> Array2<f64> {
        array![[1.0, 2.0]]
    }

    fn basis_matrix(&self, points: ArrayView2<f64>) -> DpResult<Array2<f64>> {
        let m = points.ncols();
        Ok(Array2::from_shape_fn((m, 2), |(n, c)| if c == 0 { 1.0 } else { points[[0, n]].ln() }))
    }

    fn eval_derivatives(
        &self, coef: ArrayView1<f64>, points: ArrayView2<f64>,
    ) -> DpResult<InterpolantEval> {
        let s = points.row(0);
        let m = s.len();
        Ok(InterpolantEval {
            value: s.mapv(|v| coef[0] + coef[1] * v.ln()),
            gradient: Array2::from_shape_fn((1, m), |(_, n)| coef[1] / s[n]),
            hessian: Array3::from_shape_fn((1, 1, m), |(_, _, n)| -coef[1] / (s[n] * s[n])),
        })
    }
}

/// Consume `x`, carry `A_i s − x` forward, log utility.
#[derive(Debug, Clone)]
struct Growth {
    productivity: Vec<f64>,
}

impl DpFunctions for Growth {
    fn reward(
        &self, _s: ArrayView2<f64>, x: ArrayView2<f64>, _i: usize, _j: usize,
    ) -> DpResult<Array1<f64>> {
        Ok(x.row(0).mapv(f64::ln))
    }

    fn transition(
        &self, s: ArrayView2<f64>, x: ArrayView2<f64>, i: usize, _j: usize, _i_next: usize,
        _e: ArrayView1<f64>,
    ) -> DpResult<Array2<f64>> {
        Ok(self.productivity[i] * &s - &x)
    }

    fn reward_derivatives(
        &self, s: ArrayView2<f64>, x: ArrayView2<f64>, i: usize, j: usize,
    ) -> DpResult<RewardEval> {
        let m = x.ncols();
        Ok(RewardEval {
            value: self.reward(s, x, i, j)?,
            gradient: x.mapv(|v| 1.0 / v),
            hessian: Array3::from_shape_fn((1, 1, m), |(_, _, n)| -1.0 / x[[0, n]].powi(2)),
        })
    }

    fn transition_derivatives(
        &self, s: ArrayView2<f64>, x: ArrayView2<f64>, i: usize, j: usize, i_next: usize,
        e: ArrayView1<f64>,
    ) -> DpResult<TransitionEval> {
        let m = x.ncols();
        Ok(TransitionEval {
            next: self.transition(s, x, i, j, i_next, e)?,
            jacobian: Array3::from_elem((1, 1, m), -1.0),
            hessian: Array4::zeros((1, 1, 1, m)),
        })
    }

    fn bounds(
        &self, s: ArrayView2<f64>, i: usize, _j: usize,
    ) -> DpResult<(Array2<f64>, Array2<f64>)> {
        Ok((s.mapv(|v| 0.01 * v), s.mapv(|v| 0.99 * self.productivity[i] * v)))
    }
}

fn growth_model(
    productivity: Vec<f64>, transition: MarkovTransition, derivatives: DerivativeMode,
) -> DpModel<Growth, LogLinear> {
    let ni = productivity.len();
    let time = DpTime::new(DISCOUNT, Horizon::Infinite).unwrap();
    let random = RandomSpec::new(ni, 1, None, None, transition).unwrap();
    DpModel::new(Growth { productivity }, LogLinear, time, random, 1, derivatives).unwrap()
}

/// Starting point `V = 10 ln s`, `x = 0.2 s` for every discrete state.
fn growth_guess(ni: usize) -> InitialGuess {
    let value = Array2::from_shape_fn((ni, 2), |(_, n)| 10.0 * ((n + 1) as f64).ln());
    let policy = Array4::from_shape_fn((ni, 1, 1, 2), |(_, _, _, n)| 0.2 * (n + 1) as f64);
    InitialGuess::default().with_value(value).with_policy(policy)
}

/// Closed form for a single productivity level `A`:
/// `b = 1/(1−δ)`, `a = [ln((1−δ)A) + δ/(1−δ)·ln(δA)] / (1−δ)`.
fn growth_closed_form(a_prod: f64) -> (f64, f64) {
    let d = DISCOUNT;
    let b = 1.0 / (1.0 - d);
    let a = (((1.0 - d) * a_prod).ln() + d / (1.0 - d) * (d * a_prod).ln()) / (1.0 - d);
    (a, b)
}

#[test]
// Purpose
// -------
// Newton iteration recovers the closed-form value and policy of the
// log-linear growth model.
//
// Given
// -----
// - A = 3, δ = 0.95, analytic derivatives, tol = 1e-8.
//
// Expect
// ------
// - Value coefficients `(a, b)` and consumption `x = (1−δ) A s` at the nodes.
fn growth_model_newton_matches_closed_form() {
    // Arrange
    let model = growth_model(vec![3.0], MarkovTransition::None, DerivativeMode::Analytic);
    let options = SolveOptions::new(Algorithm::Newton, 1e-8, 80, 50).unwrap();

    // Act
    let (sol, outcome) = solve(&model, &options, &growth_guess(1)).unwrap();

    // Assert
    let (a, b) = growth_closed_form(3.0);
    assert!(outcome.converged, "{}", outcome.status);
    assert_abs_diff_eq!(sol.value_coef[[0, 0, 0]], a, epsilon = 1e-6);
    assert_abs_diff_eq!(sol.value_coef[[0, 0, 1]], b, epsilon = 1e-6);
    for (n, s) in [1.0, 2.0].into_iter().enumerate() {
        assert_abs_diff_eq!(sol.policy[[0, 0, 0, n]], (1.0 - DISCOUNT) * 3.0 * s, epsilon = 1e-6);
    }
}

#[test]
// Purpose
// -------
// Function iteration reaches the same solution as Newton, more slowly.
//
// Given
// -----
// - The growth model of the Newton test, function iteration with
//   maxit = 1000.
//
// Expect
// ------
// - Convergence near the closed form and more iterations than Newton.
fn growth_model_function_iteration_matches_closed_form() {
    // Arrange
    let model = growth_model(vec![3.0], MarkovTransition::None, DerivativeMode::Analytic);
    let funcit = SolveOptions::new(Algorithm::FunctionIteration, 1e-8, 1000, 50).unwrap();
    let newton = SolveOptions::new(Algorithm::Newton, 1e-8, 80, 50).unwrap();

    // Act
    let (sol, outcome) = solve(&model, &funcit, &growth_guess(1)).unwrap();
    let (_, newton_outcome) = solve(&model, &newton, &growth_guess(1)).unwrap();

    // Assert
    let (a, b) = growth_closed_form(3.0);
    assert!(outcome.converged, "{}", outcome.status);
    assert_abs_diff_eq!(sol.value_coef[[0, 0, 0]], a, epsilon = 1e-5);
    assert_abs_diff_eq!(sol.value_coef[[0, 0, 1]], b, epsilon = 1e-5);
    assert!(newton_outcome.iterations < outcome.iterations);
}

#[test]
// Purpose
// -------
// Finite-difference derivatives give the same solution as analytic ones.
//
// Given
// -----
// - The growth model with `DerivativeMode::FiniteDifference`.
//
// Expect
// ------
// - Value coefficients within 1e-5 of the closed form.
fn growth_model_finite_difference_derivatives() {
    // Arrange
    let model =
        growth_model(vec![3.0], MarkovTransition::None, DerivativeMode::FiniteDifference);
    let options = SolveOptions::new(Algorithm::Newton, 1e-8, 80, 50).unwrap();

    // Act
    let (sol, _) = solve(&model, &options, &growth_guess(1)).unwrap();

    // Assert
    let (a, b) = growth_closed_form(3.0);
    assert_abs_diff_eq!(sol.value_coef[[0, 0, 0]], a, epsilon = 1e-5);
    assert_abs_diff_eq!(sol.value_coef[[0, 0, 1]], b, epsilon = 1e-5);
}

#[test]
// Purpose
// -------
// Markov productivity: each discrete state consumes the same share of its
// own output, and the high state is worth more.
//
// Given
// -----
// - Two productivity levels 2.5 and 3.5 with a persistent shared transition.
//
// Expect
// ------
// - `b_i = 1/(1−δ)` in both states, `x_i = (1−δ) A_i s`, `a_1 > a_0`.
fn markov_growth_model_policies() {
    // Arrange
    let q = array![[0.9, 0.1], [0.1, 0.9]];
    let model =
        growth_model(vec![2.5, 3.5], MarkovTransition::Shared(q), DerivativeMode::Analytic);
    let options = SolveOptions::new(Algorithm::Newton, 1e-8, 80, 50).unwrap();

    // Act
    let (sol, outcome) = solve(&model, &options, &growth_guess(2)).unwrap();

    // Assert
    assert!(outcome.converged, "{}", outcome.status);
    for (i, prod) in [2.5, 3.5].into_iter().enumerate() {
        assert_abs_diff_eq!(sol.value_coef[[0, i, 1]], 1.0 / (1.0 - DISCOUNT), epsilon = 1e-6);
        for (n, s) in [1.0, 2.0].into_iter().enumerate() {
            let expected = (1.0 - DISCOUNT) * prod * s;
            assert_abs_diff_eq!(sol.policy[[0, i, 0, n]], expected, epsilon = 1e-6);
        }
    }
    assert!(sol.value_coef[[0, 1, 0]] > sol.value_coef[[0, 0, 0]]);
}

#[test]
// Purpose
// -------
// With every pair flagged as known, the solver evaluates the supplied
// policy instead of optimizing it.
//
// Given
// -----
// - The optimal policy `x = (1−δ) A s` supplied as the guess, all pairs known.
//
// Expect
// ------
// - The policy is returned unchanged and the value matches the closed form.
fn known_policy_is_evaluated_not_optimized() {
    // Arrange
    let model = growth_model(vec![3.0], MarkovTransition::None, DerivativeMode::Analytic);
    let policy = Array4::from_shape_fn((1, 1, 1, 2), |(_, _, _, n)| {
        (1.0 - DISCOUNT) * 3.0 * (n + 1) as f64
    });
    let guess = InitialGuess::default().with_policy(policy.clone());
    let options = SolveOptions::new(Algorithm::Newton, 1e-8, 80, 50)
        .unwrap()
        .with_known_functions(Array2::from_elem((1, 1), true));

    // Act
    let (sol, _) = solve(&model, &options, &guess).unwrap();

    // Assert
    let (a, b) = growth_closed_form(3.0);
    assert_eq!(sol.policy_j.index_axis(ndarray::Axis(0), 0), policy);
    assert_abs_diff_eq!(sol.value_coef[[0, 0, 0]], a, epsilon = 1e-6);
    assert_abs_diff_eq!(sol.value_coef[[0, 0, 1]], b, epsilon = 1e-6);
}

/// Keep (`j = 0`) earns `s` and decays the state; stop (`j = 1`) earns 0.45
/// and freezes it.
#[derive(Debug, Clone)]
struct Stopping;

impl DpFunctions for Stopping {
    fn reward(
        &self, s: ArrayView2<f64>, _x: ArrayView2<f64>, _i: usize, j: usize,
    ) -> DpResult<Array1<f64>> {
        Ok(if j == 0 { s.row(0).to_owned() } else { Array1::from_elem(s.ncols(), 0.45) })
    }

    fn transition(
        &self, s: ArrayView2<f64>, _x: ArrayView2<f64>, _i: usize, j: usize, _i_next: usize,
        _e: ArrayView1<f64>,
    ) -> DpResult<Array2<f64>> {
        Ok(if j == 0 { 0.9 * &s } else { s.to_owned() })
    }
}

fn stopping_model(horizon: Horizon) -> DpModel<Stopping, ChebyshevBasis> {
    let basis = ChebyshevBasis::univariate(5, 0.0, 1.0).unwrap();
    let time = DpTime::new(0.9, horizon).unwrap();
    let random = RandomSpec::new(1, 2, None, None, MarkovTransition::None).unwrap();
    DpModel::new(Stopping, basis, time, random, 0, DerivativeMode::Analytic).unwrap()
}

fn terminal(level: f64) -> InitialGuess {
    InitialGuess::default().with_value(Array2::from_elem((1, 5), level))
}

#[test]
// Purpose
// -------
// A one-period discrete model reduces to a pointwise maximum.
//
// Given
// -----
// - T = 1 with zero terminal value.
//
// Expect
// ------
// - `V_0(s) = max(s, 0.45)` at the nodes and `j = 0` exactly where `s > 0.45`.
fn discrete_model_single_period_is_pointwise_max() {
    // Arrange
    let model = stopping_model(Horizon::Finite(1));

    // Act
    let (sol, outcome) = solve(&model, &SolveOptions::default(), &terminal(0.0)).unwrap();

    // Assert
    assert_eq!(outcome.iterations, 1);
    for (n, &s) in model.collocation().nodes().row(0).iter().enumerate() {
        assert_abs_diff_eq!(sol.value[[0, 0, n]], s.max(0.45), epsilon = 1e-12);
        assert_eq!(sol.discrete_action[[0, 0, n]], if s > 0.45 { 0 } else { 1 });
    }
}

#[test]
// Purpose
// -------
// Backward recursion is deterministic and monotone in the terminal value.
//
// Given
// -----
// - T = 4 solved twice with terminal value 0, once with terminal value 1.
//
// Expect
// ------
// - Identical solutions for identical inputs; a higher terminal value
//   raises the period-0 value at every node.
fn discrete_model_backward_recursion_is_deterministic_and_monotone() {
    // Arrange
    let model = stopping_model(Horizon::Finite(4));
    let options = SolveOptions::default();

    // Act
    let (first, _) = solve(&model, &options, &terminal(0.0)).unwrap();
    let (second, _) = solve(&model, &options, &terminal(0.0)).unwrap();
    let (higher, _) = solve(&model, &options, &terminal(1.0)).unwrap();

    // Assert
    assert_eq!(first, second);
    assert_eq!(first.periods(), 4);
    for n in 0..5 {
        assert!(higher.value[[0, 0, n]] > first.value[[0, 0, n]]);
    }
}

#[test]
// Purpose
// -------
// Newton iteration handles discrete choices on an infinite horizon: the
// coefficient Jacobian follows the selected discrete action at each node.
//
// Given
// -----
// - The stopping model with an infinite horizon, solved from a zero value
//   by both algorithms.
//
// Expect
// ------
// - Both converge to the same coefficients and discrete choices; Newton
//   needs fewer iterations; the lowest node stops.
fn discrete_model_infinite_horizon_newton_matches_function_iteration() {
    // Arrange
    let model = stopping_model(Horizon::Infinite);
    let newton = SolveOptions::new(Algorithm::Newton, 1e-10, 80, 50).unwrap();
    let funcit = SolveOptions::new(Algorithm::FunctionIteration, 1e-10, 1000, 50).unwrap();

    // Act
    let (sol_nt, out_nt) = solve(&model, &newton, &InitialGuess::default()).unwrap();
    let (sol_fi, out_fi) = solve(&model, &funcit, &InitialGuess::default()).unwrap();

    // Assert
    assert!(out_nt.converged, "{}", out_nt.status);
    assert!(out_fi.converged, "{}", out_fi.status);
    assert!(out_nt.iterations < out_fi.iterations);
    for k in 0..5 {
        let (nt, fi) = (sol_nt.value_coef[[0, 0, k]], sol_fi.value_coef[[0, 0, k]]);
        assert_abs_diff_eq!(nt, fi, epsilon = 1e-6);
    }
    assert_eq!(sol_nt.discrete_action, sol_fi.discrete_action);
    assert_eq!(sol_nt.discrete_action[[0, 0, 0]], 1);
}

#[test]
// Purpose
// -------
// A discretized action set replaces the continuous optimizer inside a full
// Newton solve.
//
// Given
// -----
// - The growth model with A = 3 and candidates `0.05, 0.10, …, 0.80`, which
//   contain the optimal actions `0.15` and `0.30` at `s = 1, 2`.
//
// Expect
// ------
// - Policies land exactly on those candidates and the value matches the
//   closed form.
fn growth_model_discretized_actions_match_closed_form() {
    // Arrange
    let model = growth_model(vec![3.0], MarkovTransition::None, DerivativeMode::Analytic);
    let grid = Array2::from_shape_fn((1, 16), |(_, k)| 0.05 * (k + 1) as f64);
    let options =
        SolveOptions::new(Algorithm::Newton, 1e-8, 80, 50).unwrap().with_discretized_actions(grid);

    // Act
    let (sol, outcome) = solve(&model, &options, &growth_guess(1)).unwrap();

    // Assert
    let (a, b) = growth_closed_form(3.0);
    assert!(outcome.converged, "{}", outcome.status);
    assert_abs_diff_eq!(sol.policy[[0, 0, 0, 0]], 0.15, epsilon = 1e-12);
    assert_abs_diff_eq!(sol.policy[[0, 0, 0, 1]], 0.30, epsilon = 1e-12);
    assert_abs_diff_eq!(sol.value_coef[[0, 0, 0]], a, epsilon = 1e-6);
    assert_abs_diff_eq!(sol.value_coef[[0, 0, 1]], b, epsilon = 1e-6);
}

#[test]
// Purpose
// -------
// Malformed models and options are rejected with specific errors.
//
// Given
// -----
// - A Markov matrix whose row sums to 0.9, two discrete states without a
//   transition, and an unknown algorithm name.
//
// Expect
// ------
// - `TransitionRowSum`, `MissingDiscreteTransition`, `UnknownAlgorithm`.
fn invalid_inputs_are_rejected() {
    // Act
    let row_sum = RandomSpec::new(
        2,
        1,
        None,
        None,
        MarkovTransition::Shared(array![[0.5, 0.4], [0.0, 1.0]]),
    );
    let missing = RandomSpec::new(2, 1, None, None, MarkovTransition::None);
    let parsed: Result<Algorithm, DpError> = "policy_iteration".parse();

    // Assert
    assert!(matches!(row_sum, Err(DpError::TransitionRowSum { i: 0, .. })));
    assert_eq!(missing, Err(DpError::MissingDiscreteTransition { ni: 2 }));
    assert!(matches!(parsed, Err(DpError::UnknownAlgorithm { .. })));
    assert_eq!("funcit".parse::<Algorithm>(), Ok(Algorithm::FunctionIteration));
}
