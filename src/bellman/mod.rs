//! bellman — right-hand side of the Bellman equation at the collocation nodes.
//!
//! Purpose
//! -------
//! Evaluate, for a fixed discrete state `i` and discrete action `j`,
//!
//! ```text
//! v(s, x) = f(s, x, i, j) + δ Σ_k w_k Σ_{i'} q[j, i, i'] V_{i'}(g(s, x, i, j, i', e_k))
//! ```
//!
//! batched over nodes, together with its first and second derivatives with
//! respect to the continuous action, and the Jacobian of the discounted
//! continuation value with respect to the value-function coefficients.
//!
//! Key behaviors
//! -------------
//! - [`rhs_value`]: value only; this is also the discrete-only variant used
//!   when `dx = 0`.
//! - [`rhs_derivatives`]: value, gradient and Hessian in `x`, by the chain
//!   rule through the interpolant (analytic mode) or by central differences
//!   (finite-difference mode, see [`finite_diff`]).
//! - [`coefficient_jacobian`]: `∂/∂c` of the continuation value, assembled
//!   with the same shock/transition aggregation, for Newton iteration.
//!
//! Invariants & assumptions
//! ------------------------
//! - `s` is `ds × m` and `x` is `dx × m` for some batch size `m` (usually the
//!   full node set, a subset for the Jacobian).
//! - `next_coef` holds one row of `nc` coefficients per discrete state: the
//!   value function of the next period.
//! - Successor discrete states with zero transition probability are skipped.
//!
//! Conventions
//! -----------
//! - The discount factor is folded into the per-term weight
//!   `p = δ w_k q[j, i, i']`.
//! - `BellmanEval::gradient` is `dx × m`, `BellmanEval::hessian` is
//!   `dx × dx × m`.
pub mod finite_diff;

use crate::{
    basis::Interpolant,
    errors::DpResult,
    model::{
        functions::{check_shape, DerivativeMode, DpFunctions},
        DpModel,
    },
};
use ndarray::{Array1, Array2, Array3, ArrayView2};

/// Bellman right-hand side and its action derivatives at a batch of nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct BellmanEval {
    pub value: Array1<f64>,
    pub gradient: Array2<f64>,
    pub hessian: Array3<f64>,
}

/// Iterate over the `(k, i_next, p)` terms of the expectation with
/// `p = δ w_k q[j, i, i_next] > 0`.
fn expectation_terms<F: DpFunctions, B: Interpolant>(
    model: &DpModel<F, B>, i: usize, j: usize,
) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
    let delta = model.discount();
    let ni = model.dims().ni;
    (0..model.dims().ne).flat_map(move |k| {
        (0..ni).filter_map(move |i_next| {
            let p = delta * model.random().w[k] * model.random().q[[j, i, i_next]];
            (p > 0.0).then_some((k, i_next, p))
        })
    })
}

/// Bellman right-hand side, value only.
///
/// Parameters
/// ----------
/// - `model`: model definition.
/// - `s`: states, `ds × m`.
/// - `x`: actions, `dx × m` (zero rows when the model is discrete).
/// - `i`, `j`: discrete state and action.
/// - `next_coef`: next-period value coefficients, `ni × nc`.
///
/// Errors
/// ------
/// - Errors raised by the model callbacks.
/// - [`crate::errors::DpError::FunctionShapeMismatch`] when a callback
///   returns a wrongly shaped array.
/// - Interpolation errors for malformed coefficients.
pub fn rhs_value<F: DpFunctions, B: Interpolant>(
    model: &DpModel<F, B>, s: ArrayView2<f64>, x: ArrayView2<f64>, i: usize, j: usize,
    next_coef: ArrayView2<f64>,
) -> DpResult<Array1<f64>> {
    let m = s.ncols();
    let ds = model.dims().ds;
    let basis = model.collocation().basis();

    let mut value = model.functions().reward(s, x, i, j)?;
    check_shape("reward", value.shape(), &[m])?;
    if model.discount() == 0.0 {
        return Ok(value);
    }
    for (k, i_next, p) in expectation_terms(model, i, j) {
        let e = model.random().e.column(k);
        let next = model.functions().transition(s, x, i, j, i_next, e)?;
        check_shape("transition", next.shape(), &[ds, m])?;
        let v = basis.eval(next_coef.row(i_next), next.view())?;
        value.scaled_add(p, &v);
    }
    Ok(value)
}

/// Bellman right-hand side with gradient and Hessian in the continuous action.
///
/// Dispatches on the model's [`DerivativeMode`]. Arguments and errors are as
/// in [`rhs_value`]; analytic mode additionally fails with
/// [`crate::errors::DpError::DerivativesNotImplemented`] when the callbacks
/// do not provide derivatives.
pub fn rhs_derivatives<F: DpFunctions, B: Interpolant>(
    model: &DpModel<F, B>, s: ArrayView2<f64>, x: ArrayView2<f64>, i: usize, j: usize,
    next_coef: ArrayView2<f64>,
) -> DpResult<BellmanEval> {
    match model.derivatives() {
        DerivativeMode::Analytic => rhs_analytic(model, s, x, i, j, next_coef),
        DerivativeMode::FiniteDifference => {
            finite_diff::rhs_finite_diff(model, s, x, i, j, next_coef)
        }
    }
}

fn rhs_analytic<F: DpFunctions, B: Interpolant>(
    model: &DpModel<F, B>, s: ArrayView2<f64>, x: ArrayView2<f64>, i: usize, j: usize,
    next_coef: ArrayView2<f64>,
) -> DpResult<BellmanEval> {
    let m = s.ncols();
    let ds = model.dims().ds;
    let dx = model.dims().dx;
    let basis = model.collocation().basis();

    let reward = model.functions().reward_derivatives(s, x, i, j)?;
    check_shape("reward", reward.value.shape(), &[m])?;
    check_shape("reward gradient", reward.gradient.shape(), &[dx, m])?;
    check_shape("reward hessian", reward.hessian.shape(), &[dx, dx, m])?;
    let mut value = reward.value;
    let mut gradient = reward.gradient;
    let mut hessian = reward.hessian;
    if model.discount() == 0.0 {
        return Ok(BellmanEval { value, gradient, hessian });
    }

    for (k, i_next, p) in expectation_terms(model, i, j) {
        let e = model.random().e.column(k);
        let tr = model.functions().transition_derivatives(s, x, i, j, i_next, e)?;
        check_shape("transition", tr.next.shape(), &[ds, m])?;
        check_shape("transition jacobian", tr.jacobian.shape(), &[dx, ds, m])?;
        check_shape("transition hessian", tr.hessian.shape(), &[dx, dx, ds, m])?;
        let vn = basis.eval_derivatives(next_coef.row(i_next), tr.next.view())?;
        value.scaled_add(p, &vn.value);

        for n in 0..m {
            for a in 0..dx {
                let mut ga = 0.0;
                for d in 0..ds {
                    ga += vn.gradient[[d, n]] * tr.jacobian[[a, d, n]];
                }
                gradient[[a, n]] += p * ga;

                for b in 0..dx {
                    // snxᵀ Vss snx + Vs · snxx
                    let mut hab = 0.0;
                    for d in 0..ds {
                        hab += vn.gradient[[d, n]] * tr.hessian[[a, b, d, n]];
                        for c in 0..ds {
                            hab += tr.jacobian[[a, d, n]]
                                * vn.hessian[[d, c, n]]
                                * tr.jacobian[[b, c, n]];
                        }
                    }
                    hessian[[a, b, n]] += p * hab;
                }
            }
        }
    }
    Ok(BellmanEval { value, gradient, hessian })
}

/// Jacobian of the discounted continuation value with respect to the stacked
/// value coefficients.
///
/// Row `n + ns·i` and column `c + nc·i'` hold
/// `Σ_k δ w_k q[j*, i, i'] φ_c(g(s_n, x_n, i, j*, i', e_k))`, where `j*` is
/// the optimal discrete action at node `n` and `x_n` its conditional policy.
///
/// Parameters
/// ----------
/// - `policy_j`: conditional policies, `[ni, nj, dx, ns]`.
/// - `discrete_action`: optimal discrete action per node, `[ni, ns]`.
///
/// Returns
/// -------
/// `(ni·ns) × (ni·nc)` dense matrix.
pub fn coefficient_jacobian<F: DpFunctions, B: Interpolant>(
    model: &DpModel<F, B>, policy_j: ndarray::ArrayView4<f64>,
    discrete_action: ndarray::ArrayView2<usize>,
) -> DpResult<Array2<f64>> {
    let dims = model.dims();
    let (ns, nc, ni, ds) = (dims.ns, dims.nc, dims.ni, dims.ds);
    let nodes = model.collocation().nodes();
    let basis = model.collocation().basis();
    let mut vc = Array2::zeros((ns * ni, nc * ni));

    for i in 0..ni {
        for j in 0..dims.nj {
            let idx: Vec<usize> = (0..ns).filter(|&n| discrete_action[[i, n]] == j).collect();
            if idx.is_empty() {
                continue;
            }
            let s = nodes.select(ndarray::Axis(1), &idx);
            let x = policy_j.slice(ndarray::s![i, j, .., ..]).select(ndarray::Axis(1), &idx);
            for (k, i_next, p) in expectation_terms(model, i, j) {
                let e = model.random().e.column(k);
                let next = model.functions().transition(s.view(), x.view(), i, j, i_next, e)?;
                check_shape("transition", next.shape(), &[ds, idx.len()])?;
                let phi = basis.basis_matrix(next.view())?;
                for (row, &n) in idx.iter().enumerate() {
                    for c in 0..nc {
                        vc[[n + ns * i, c + nc * i_next]] += p * phi[[row, c]];
                    }
                }
            }
        }
    }
    Ok(vc)
}


#[cfg(test)]
mod tests {
    use super::test_models::{lq_model, LinearQuadratic};
    use super::*;
    use crate::model::{
        functions::DerivativeMode,
        random::{MarkovTransition, RandomSpec},
    };
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array4};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Value-only evaluation against a hand-computed expectation.
    // - Chain-rule derivatives against closed forms.
    // - The coefficient Jacobian layout used by Newton iteration.
    //
    // They intentionally DO NOT cover:
    // - Action optimization (see `optimizer`).
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // With next value `V(s) = -s²`, the RHS of the linear-quadratic model has a
    // closed form.
    //
    // Given
    // -----
    // - δ = 0.9, Chebyshev coefficients of `-s²` on `[-1, 1]`: `[-½, 0, -½]`.
    //
    // Expect
    // ------
    // - `v = -½(s² + x²) - 0.9 (s + x)²`,
    //   `v_x = -x - 1.8 (s + x)`, `v_xx = -1 - 1.8`.
    fn rhs_matches_closed_form_for_quadratic_next_value() {
        // Arrange
        let model = lq_model(0.9, DerivativeMode::Analytic);
        let next_coef = array![[-0.5, 0.0, -0.5]];
        let s = array![[-0.4, 0.1, 0.6]];
        let x = array![[0.2, -0.3, 0.05]];

        // Act
        let value = rhs_value(&model, s.view(), x.view(), 0, 0, next_coef.view()).unwrap();
        let eval = rhs_derivatives(&model, s.view(), x.view(), 0, 0, next_coef.view()).unwrap();

        // Assert
        for n in 0..3 {
            let (sv, xv) = (s[[0, n]], x[[0, n]]);
            let expected = -0.5 * (sv * sv + xv * xv) - 0.9 * (sv + xv).powi(2);
            assert_abs_diff_eq!(value[n], expected, epsilon = 1e-12);
            assert_abs_diff_eq!(eval.value[n], expected, epsilon = 1e-12);
            assert_abs_diff_eq!(eval.gradient[[0, n]], -xv - 1.8 * (sv + xv), epsilon = 1e-12);
            assert_abs_diff_eq!(eval.hessian[[0, 0, n]], -2.8, epsilon = 1e-12);
        }
    }

    #[test]
    // Purpose
    // -------
    // Shock realizations are averaged with their weights.
    //
    // Given
    // -----
    // - Shocks `±0.1` with weights `½`, next value `V(s) = s` (coefficients
    //   `[0, 1, 0]`), δ = 0.5.
    //
    // Expect
    // ------
    // - The shock averages out: `v = f + 0.5 (s + x)`.
    fn rhs_value_averages_over_shocks() {
        // Arrange
        let shocks = RandomSpec::new(
            1,
            1,
            Some(array![[-0.1, 0.1]]),
            Some(array![0.5, 0.5]),
            MarkovTransition::None,
        )
        .unwrap();
        let model = lq_model(0.5, DerivativeMode::Analytic).with_random(shocks).unwrap();
        let next_coef = array![[0.0, 1.0, 0.0]];
        let s = array![[0.3]];
        let x = array![[0.2]];

        // Act
        let value = rhs_value(&model, s.view(), x.view(), 0, 0, next_coef.view()).unwrap();

        // Assert
        let expected = -0.5 * (0.09 + 0.04) + 0.5 * 0.5;
        assert_abs_diff_eq!(value[0], expected, epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // The coefficient Jacobian is `δ Φ(g(s, x))` for a single discrete state.
    //
    // Given
    // -----
    // - The linear-quadratic model, policy `x = 0` at every node.
    //
    // Expect
    // ------
    // - `vc = δ Φ(s)` because the successor of each node is the node itself.
    fn coefficient_jacobian_is_discounted_basis_matrix() {
        // Arrange
        let model = lq_model(0.9, DerivativeMode::Analytic);
        let policy_j = Array4::<f64>::zeros((1, 1, 1, 3));
        let discrete_action = ndarray::Array2::<usize>::zeros((1, 3));

        // Act
        let vc = coefficient_jacobian(&model, policy_j.view(), discrete_action.view()).unwrap();

        // Assert
        let phi = model.collocation().phi();
        assert_eq!(vc.shape(), &[3, 3]);
        for r in 0..3 {
            for c in 0..3 {
                assert_abs_diff_eq!(vc[[r, c]], 0.9 * phi[[r, c]], epsilon = 1e-12);
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // Analytic mode without analytic callbacks reports the missing capability.
    //
    // Given
    // -----
    // - A value-only reward wrapped around the linear-quadratic transition.
    //
    // Expect
    // ------
    // - `DerivativesNotImplemented { function: "reward" }`.
    fn rhs_derivatives_requires_analytic_callbacks() {
        // Arrange
        #[derive(Debug, Clone)]
        struct ValueOnly;
        impl DpFunctions for ValueOnly {
            fn reward(
                &self, s: ArrayView2<f64>, x: ArrayView2<f64>, i: usize, j: usize,
            ) -> DpResult<Array1<f64>> {
                LinearQuadratic.reward(s, x, i, j)
            }
            fn transition(
                &self, s: ArrayView2<f64>, x: ArrayView2<f64>, i: usize, j: usize, i_next: usize,
                e: ndarray::ArrayView1<f64>,
            ) -> DpResult<Array2<f64>> {
                LinearQuadratic.transition(s, x, i, j, i_next, e)
            }
        }
        let lq = lq_model(0.9, DerivativeMode::Analytic);
        let model = DpModel::new(
            ValueOnly,
            lq.collocation().basis().clone(),
            lq.time(),
            lq.random().clone(),
            1,
            DerivativeMode::Analytic,
        )
        .unwrap();
        let s = array![[0.1]];
        let x = array![[0.0]];
        let next_coef = array![[0.0, 0.0, 0.0]];

        // Act
        let result = rhs_derivatives(&model, s.view(), x.view(), 0, 0, next_coef.view());

        // Assert
        assert_eq!(
            result,
            Err(crate::errors::DpError::DerivativesNotImplemented { function: "reward" })
        );
    }
}
