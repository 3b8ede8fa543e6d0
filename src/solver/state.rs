//! Solver-owned value and policy state.
//!
//! Purpose
//! -------
//! Hold everything the fixed-point drivers mutate: value functions at the
//! nodes and their coefficients, conditional values and policies, the
//! unconditional policy and the discrete-action map. The model itself is
//! never mutated.
//!
//! Key behaviors
//! -------------
//! - [`DpSolution::initialize`] builds the state from an [`InitialGuess`],
//!   filling unspecified policies with bound midpoints.
//! - [`DpSolution::value_at`] evaluates a solved value function at arbitrary
//!   points; [`DpSolution::policy_coefficients`] fits the conditional
//!   policies of a period.
//!
//! Invariants & assumptions
//! ------------------------
//! - Shapes, with `np` decision periods and `nv` value slots
//!   (`np = T, nv = T + 1` for a finite horizon, `np = nv = 1` otherwise):
//!   - `value`: `[nv, ni, ns]`, `value_coef`: `[nv, ni, nc]`
//!   - `value_j`: `[np, ni, nj, ns]`
//!   - `policy_j`: `[np, ni, nj, dx, ns]`, `policy`: `[np, ni, dx, ns]`
//!   - `discrete_action`: `[np, ni, ns]`
//! - For a finite horizon, slot `T` of `value` is the terminal value.
use crate::{
    basis::Interpolant,
    errors::{DpError, DpResult},
    model::{functions::DpFunctions, DpModel},
    optimizer::node_bounds,
    solver::{options::InitialGuess, vmax::PeriodState},
};
use ndarray::{s, Array1, Array2, Array3, Array4, Array5, ArrayView2};

/// Value and policy functions of a solved (or partially solved) model.
#[derive(Debug, Clone, PartialEq)]
pub struct DpSolution {
    pub value: Array3<f64>,
    pub value_coef: Array3<f64>,
    pub value_j: Array4<f64>,
    pub policy_j: Array5<f64>,
    pub policy: Array4<f64>,
    pub discrete_action: Array3<usize>,
}

impl DpSolution {
    /// Allocate the state and apply the initial guess.
    ///
    /// Errors
    /// ------
    /// - [`DpError::InitialGuessShape`] for wrongly shaped guesses.
    /// - Bounds callback errors when a default policy is needed.
    /// - Collocation fit errors for the initial value coefficients.
    pub fn initialize<F: DpFunctions, B: Interpolant>(
        model: &DpModel<F, B>, guess: &InitialGuess,
    ) -> DpResult<Self> {
        let d = model.dims();
        let np = model.horizon().policy_periods();
        let nv = model.horizon().value_periods();
        let mut value = Array3::zeros((nv, d.ni, d.ns));
        let mut value_coef = Array3::zeros((nv, d.ni, d.nc));

        if let Some(v) = &guess.value {
            if v.dim() != (d.ni, d.ns) {
                return Err(DpError::InitialGuessShape {
                    what: "value",
                    expected: vec![d.ni, d.ns],
                    found: v.shape().to_vec(),
                });
            }
            // Infinite horizon: first iterate; finite horizon: terminal value.
            let slot = nv - 1;
            value.slice_mut(s![slot, .., ..]).assign(v);
            let coef = model.collocation().fit_columns(v.t())?;
            value_coef.slice_mut(s![slot, .., ..]).assign(&coef.t());
        }

        let seed = match &guess.policy {
            Some(p) => {
                if p.dim() != (d.ni, d.nj, d.dx, d.ns) {
                    return Err(DpError::InitialGuessShape {
                        what: "policy",
                        expected: vec![d.ni, d.nj, d.dx, d.ns],
                        found: p.shape().to_vec(),
                    });
                }
                p.clone()
            }
            None => default_policy(model)?,
        };
        let mut policy_j = Array5::zeros((np, d.ni, d.nj, d.dx, d.ns));
        for mut period in policy_j.outer_iter_mut() {
            period.assign(&seed);
        }
        let mut policy = Array4::zeros((np, d.ni, d.dx, d.ns));
        for mut period in policy.outer_iter_mut() {
            period.assign(&seed.slice(s![.., 0, .., ..]));
        }

        Ok(DpSolution {
            value,
            value_coef,
            value_j: Array4::zeros((np, d.ni, d.nj, d.ns)),
            policy_j,
            policy,
            discrete_action: Array3::zeros((np, d.ni, d.ns)),
        })
    }

    /// Mutable views of decision period `t` and its value slot.
    pub(crate) fn period_mut(&mut self, t: usize) -> PeriodState<'_> {
        PeriodState {
            policy_j: self.policy_j.slice_mut(s![t, .., .., .., ..]),
            value_j: self.value_j.slice_mut(s![t, .., .., ..]),
            value: self.value.slice_mut(s![t, .., ..]),
            discrete_action: self.discrete_action.slice_mut(s![t, .., ..]),
            policy: self.policy.slice_mut(s![t, .., .., ..]),
        }
    }

    /// Refit the value coefficients of slot `t` from the node values.
    pub(crate) fn refit_value<F: DpFunctions, B: Interpolant>(
        &self, model: &DpModel<F, B>, t: usize,
    ) -> DpResult<Array2<f64>> {
        let coef = model.collocation().fit_columns(self.value.slice(s![t, .., ..]).t())?;
        Ok(coef.reversed_axes())
    }

    /// Number of decision periods stored.
    pub fn periods(&self) -> usize {
        self.value_j.shape()[0]
    }

    /// Evaluate the value function of slot `t` and discrete state `i` at
    /// `points` (`ds × m`).
    ///
    /// # Errors
    /// - [`DpError::PeriodOutOfRange`] if `t` is not a value slot or `i` is
    ///   not a discrete state.
    /// - Interpolation errors for malformed points.
    pub fn value_at<F: DpFunctions, B: Interpolant>(
        &self, model: &DpModel<F, B>, t: usize, i: usize, points: ArrayView2<f64>,
    ) -> DpResult<Array1<f64>> {
        let (nv, ni, _) = self.value_coef.dim();
        if t >= nv {
            return Err(DpError::PeriodOutOfRange { period: t, periods: nv });
        }
        if i >= ni {
            return Err(DpError::InvalidDimension {
                name: "i",
                value: i,
                reason: "discrete state index out of range.",
            });
        }
        model.collocation().basis().eval(self.value_coef.slice(s![t, i, ..]), points)
    }

    /// Coefficients of the conditional policies of period `t`,
    /// `[ni, nj, dx, nc]`.
    ///
    /// # Errors
    /// [`DpError::PeriodOutOfRange`] and collocation fit errors.
    pub fn policy_coefficients<F: DpFunctions, B: Interpolant>(
        &self, model: &DpModel<F, B>, t: usize,
    ) -> DpResult<Array4<f64>> {
        let (np, ni, nj, dx, _) = self.policy_j.dim();
        if t >= np {
            return Err(DpError::PeriodOutOfRange { period: t, periods: np });
        }
        let nc = model.dims().nc;
        let mut coef = Array4::zeros((ni, nj, dx, nc));
        for i in 0..ni {
            for j in 0..nj {
                let x = self.policy_j.slice(s![t, i, j, .., ..]);
                let fitted = model.collocation().fit_columns(x.t())?;
                coef.slice_mut(s![i, j, .., ..]).assign(&fitted.t());
            }
        }
        Ok(coef)
    }
}

// ---- Helper methods ----

/// Bound midpoints at every node, `[ni, nj, dx, ns]`.
fn default_policy<F: DpFunctions, B: Interpolant>(
    model: &DpModel<F, B>,
) -> DpResult<Array4<f64>> {
    let d = model.dims();
    let mut policy = Array4::zeros((d.ni, d.nj, d.dx, d.ns));
    if d.dx == 0 {
        return Ok(policy);
    }
    let s = model.collocation().nodes();
    for i in 0..d.ni {
        for j in 0..d.nj {
            let (lb, ub) = node_bounds(model, s, i, j)?;
            let start = Array2::from_shape_fn((d.dx, d.ns), |(k, n)| {
                midpoint(lb[[k, n]], ub[[k, n]])
            });
            policy.slice_mut(s![i, j, .., ..]).assign(&start);
        }
    }
    Ok(policy)
}

fn midpoint(lo: f64, hi: f64) -> f64 {
    match (lo.is_finite(), hi.is_finite()) {
        (true, true) => 0.5 * (lo + hi),
        (true, false) => lo,
        (false, true) => hi,
        (false, false) => 0.0,
    }
}
