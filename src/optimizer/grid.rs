//! Grid search over a discretized action set.
use crate::{
    basis::Interpolant,
    bellman::rhs_value,
    errors::{DpError, DpResult},
    model::{functions::DpFunctions, DpModel},
    optimizer::node_bounds,
};
use ndarray::{Array1, Array2, ArrayView2, Axis};

/// Pick, per node, the best feasible candidate column of `grid` (`dx × nx`).
///
/// Candidates outside `[lb, ub]` at a node score `-∞` there and are never
/// evaluated. Ties go to the lowest candidate index. A node without any
/// feasible candidate keeps its incumbent action and gets value `-∞`, which
/// marks the pair unavailable there; the Bellman pass rejects a node where
/// every pair is unavailable.
///
/// # Errors
/// - [`DpError::DiscretizedActionRows`] if `grid.nrows() != dx`.
/// - Callback and interpolation errors from the Bellman evaluator.
pub fn optimize_grid<F: DpFunctions, B: Interpolant>(
    model: &DpModel<F, B>, i: usize, j: usize, next_coef: ArrayView2<f64>,
    grid: ArrayView2<f64>, x: &mut Array2<f64>,
) -> DpResult<Array1<f64>> {
    let dx = model.dims().dx;
    let ns = model.dims().ns;
    if grid.nrows() != dx {
        return Err(DpError::DiscretizedActionRows { expected: dx, found: grid.nrows() });
    }
    let s = model.collocation().nodes();
    let (lb, ub) = node_bounds(model, s, i, j)?;
    let mut best = Array1::from_elem(ns, f64::NEG_INFINITY);

    for candidate in grid.columns() {
        let feasible: Vec<usize> = (0..ns)
            .filter(|&n| {
                (0..dx).all(|k| lb[[k, n]] <= candidate[k] && candidate[k] <= ub[[k, n]])
            })
            .collect();
        if feasible.is_empty() {
            continue;
        }
        let s_sub = s.select(Axis(1), &feasible);
        let x_sub = Array2::from_shape_fn((dx, feasible.len()), |(k, _)| candidate[k]);
        let v = rhs_value(model, s_sub.view(), x_sub.view(), i, j, next_coef)?;
        for (row, &n) in feasible.iter().enumerate() {
            if v[row] > best[n] {
                best[n] = v[row];
                x.column_mut(n).assign(&candidate);
            }
        }
    }
    Ok(best)
}
