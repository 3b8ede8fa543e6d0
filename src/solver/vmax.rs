//! One Bellman pass: optimize every `(i, j)` pair, then choose `j`.
use crate::{
    basis::Interpolant,
    bellman::rhs_value,
    choice::{make_discrete_choice, update_policy},
    errors::{DpError, DpResult},
    model::{functions::DpFunctions, DpModel},
    optimizer::ActionOptimizer,
    solver::options::SolveOptions,
};
use ndarray::{s, ArrayView2, ArrayViewMut2, ArrayViewMut3, ArrayViewMut4};

/// Mutable slices of one decision period of a `DpSolution`.
pub(crate) struct PeriodState<'a> {
    /// `[ni, nj, dx, ns]`, incumbent on entry, optimum on exit.
    pub policy_j: ArrayViewMut4<'a, f64>,
    /// `[ni, nj, ns]`.
    pub value_j: ArrayViewMut3<'a, f64>,
    /// `[ni, ns]`.
    pub value: ArrayViewMut2<'a, f64>,
    /// `[ni, ns]`.
    pub discrete_action: ArrayViewMut2<'a, usize>,
    /// `[ni, dx, ns]`.
    pub policy: ArrayViewMut3<'a, f64>,
}

/// Apply the Bellman operator once with next-period coefficients
/// `next_coef` (`ni × nc`).
///
/// Pairs flagged as known keep their policy and are only evaluated. The
/// pair loop is the only place that iterates over the discrete grid; each
/// optimizer call is batched over all nodes.
///
/// A pair may score `-∞` at a node; the pass fails with
/// [`DpError::NoFeasibleAction`] only when every pair does.
pub(crate) fn bellman_pass<F: DpFunctions, B: Interpolant>(
    model: &DpModel<F, B>, options: &SolveOptions, optimizer: &ActionOptimizer<'_>,
    next_coef: ArrayView2<f64>, state: PeriodState<'_>,
) -> DpResult<()> {
    let PeriodState { mut policy_j, mut value_j, mut value, mut discrete_action, policy } = state;
    let nodes = model.collocation().nodes();
    for i in 0..model.dims().ni {
        for j in 0..model.dims().nj {
            let mut x = policy_j.slice(s![i, j, .., ..]).to_owned();
            let v = if options.is_known(i, j) {
                rhs_value(model, nodes, x.view(), i, j, next_coef)?
            } else {
                optimizer.optimize(model, i, j, next_coef, &mut x)?
            };
            policy_j.slice_mut(s![i, j, .., ..]).assign(&x);
            value_j.slice_mut(s![i, j, ..]).assign(&v);
        }
    }
    make_discrete_choice(value_j.view(), value.view_mut(), discrete_action.view_mut());
    if let Some(((i, node), _)) = value.indexed_iter().find(|(_, v)| **v == f64::NEG_INFINITY) {
        return Err(DpError::NoFeasibleAction { i, node });
    }
    update_policy(policy_j.view(), discrete_action.view(), policy);
    Ok(())
}
