//! Discrete choice selection and policy update.
//!
//! Purpose
//! -------
//! Fold the conditional values `Value_j[i, j, n]` of one period into the
//! unconditional value `Value[i, n] = max_j Value_j[i, j, n]`, record the
//! maximizing discrete action, and select the matching conditional
//! continuous policy.
//!
//! Invariants & assumptions
//! ------------------------
//! - Ties resolve to the lowest action index (first maximum).
//! - With a single discrete action the selection is the identity and no
//!   search is performed.
//! - A `NaN` conditional value never wins against a number; an all-`NaN`
//!   node picks action 0 and propagates the `NaN`.
use ndarray::{ArrayView2, ArrayView3, ArrayView4, ArrayViewMut2, ArrayViewMut3, Axis};

/// Choose the best discrete action at every `(i, n)`.
///
/// Parameters
/// ----------
/// - `value_j`: conditional values, `[ni, nj, ns]`.
/// - `value`: output unconditional values, `[ni, ns]`.
/// - `discrete_action`: output maximizing actions, `[ni, ns]`.
pub fn make_discrete_choice(
    value_j: ArrayView3<f64>, mut value: ArrayViewMut2<f64>,
    mut discrete_action: ArrayViewMut2<usize>,
) {
    let (ni, nj, ns) = value_j.dim();
    if nj == 1 {
        value.assign(&value_j.index_axis(Axis(1), 0));
        discrete_action.fill(0);
        return;
    }
    for i in 0..ni {
        for n in 0..ns {
            let mut best_j = 0;
            let mut best = value_j[[i, 0, n]];
            for j in 1..nj {
                let v = value_j[[i, j, n]];
                if v > best || (best.is_nan() && !v.is_nan()) {
                    best = v;
                    best_j = j;
                }
            }
            value[[i, n]] = best;
            discrete_action[[i, n]] = best_j;
        }
    }
}

/// Select the conditional policy of the chosen discrete action.
///
/// Parameters
/// ----------
/// - `policy_j`: conditional policies, `[ni, nj, dx, ns]`.
/// - `discrete_action`: chosen actions, `[ni, ns]`.
/// - `policy`: output policy, `[ni, dx, ns]`.
pub fn update_policy(
    policy_j: ArrayView4<f64>, discrete_action: ArrayView2<usize>, mut policy: ArrayViewMut3<f64>,
) {
    let (ni, _, dx, ns) = policy_j.dim();
    for i in 0..ni {
        for n in 0..ns {
            let j = discrete_action[[i, n]];
            for k in 0..dx {
                policy[[i, k, n]] = policy_j[[i, j, k, n]];
            }
        }
    }
}
