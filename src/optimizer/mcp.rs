//! optimizer::mcp — root finder for box-constrained nonlinear systems.
//!
//! Purpose
//! -------
//! Solve the mixed complementarity problem
//!
//! ```text
//! a ≤ z ≤ b,   z_k = a_k ⇒ F_k(z) ≤ 0,   a_k < z_k < b_k ⇒ F_k(z) = 0,   z_k = b_k ⇒ F_k(z) ≥ 0
//! ```
//!
//! by semismooth Newton iterations on the reformulation from
//! [`complementarity_transform`].
//!
//! Key behaviors
//! -------------
//! - Each iteration evaluates `(F, J)` through a caller-supplied closure,
//!   solves `JΦ Δz = −Φ` by dense LU and backtracks on `‖Φ‖₂`.
//! - Iterates are projected onto `[a, b]`.
//! - Stops when `‖Φ‖∞ < tol` or after `maxit` iterations; non-convergence is
//!   reported through [`McpOutcome::converged`], not as an error.
//!
//! Invariants & assumptions
//! ------------------------
//! - `a ≤ z0 ≤ b` is not required; the starting point is projected first.
//! - A singular Newton system ends the iteration at the current point.
use crate::{
    errors::{DpError, DpResult},
    linalg::{solve_small, sup_norm},
    optimizer::lcp::{complementarity_transform, NcpMethod},
};
use nalgebra::{DMatrix, DVector};

/// Settings of the semismooth Newton root finder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixedComplementarity {
    pub method: NcpMethod,
    pub maxit: usize,
    pub tol: f64,
    pub max_backsteps: usize,
}

/// Result of [`MixedComplementarity::zero`].
#[derive(Debug, Clone, PartialEq)]
pub struct McpOutcome {
    pub z: DVector<f64>,
    pub converged: bool,
    pub iterations: usize,
    pub residual: f64,
}

impl Default for MixedComplementarity {
    fn default() -> Self {
        MixedComplementarity {
            method: NcpMethod::MinMax,
            maxit: 100,
            tol: f64::EPSILON.sqrt(),
            max_backsteps: 30,
        }
    }
}

impl MixedComplementarity {
    /// Find `z` in `[lb, ub]` solving the complementarity conditions of `f`.
    ///
    /// Parameters
    /// ----------
    /// - `f`: closure returning `(F(z), J(z))`.
    /// - `lb`, `ub`: bounds, possibly infinite.
    /// - `z0`: starting point.
    ///
    /// Errors
    /// ------
    /// - Errors returned by `f`.
    /// - [`DpError::CoefficientLength`] if the bounds and `z0` disagree in length.
    pub fn zero<G>(
        &self, mut f: G, lb: &DVector<f64>, ub: &DVector<f64>, z0: DVector<f64>,
    ) -> DpResult<McpOutcome>
    where
        G: FnMut(&DVector<f64>) -> DpResult<(DVector<f64>, DMatrix<f64>)>,
    {
        let n = z0.len();
        if lb.len() != n || ub.len() != n {
            return Err(DpError::CoefficientLength { expected: n, found: lb.len().min(ub.len()) });
        }
        let mut z = project(z0, lb, ub);
        let (fz, jz) = f(&z)?;
        let (mut phi, mut jphi) = complementarity_transform(self.method, &z, lb, ub, &fz, &jz);
        let mut residual = sup_norm(phi.iter());
        let mut iterations = 0;

        // NaN residuals keep iterating until the budget runs out.
        while iterations < self.maxit && !(residual < self.tol) {
            iterations += 1;
            let Some(dz) = solve_small(&jphi, &(-&phi)) else {
                break;
            };
            let norm0 = phi.norm();
            let mut t = 1.0;
            let mut accepted = None;
            for _ in 0..=self.max_backsteps {
                let trial = project(&z + &dz * t, lb, ub);
                let (ft, jt) = f(&trial)?;
                let (pt, jpt) = complementarity_transform(self.method, &trial, lb, ub, &ft, &jt);
                let better = pt.norm() < norm0;
                accepted = Some((trial, pt, jpt));
                if better {
                    break;
                }
                t *= 0.5;
            }
            let Some((zt, pt, jpt)) = accepted else {
                break;
            };
            z = zt;
            phi = pt;
            jphi = jpt;
            residual = sup_norm(phi.iter());
        }
        Ok(McpOutcome { z, converged: residual < self.tol, iterations, residual })
    }
}

fn project(mut z: DVector<f64>, lb: &DVector<f64>, ub: &DVector<f64>) -> DVector<f64> {
    for k in 0..z.len() {
        z[k] = z[k].max(lb[k]).min(ub[k]);
    }
    z
}
