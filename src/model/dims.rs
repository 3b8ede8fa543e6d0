//! Dimensions of a dynamic-programming model.
//!
//! - `ds`: continuous state dimension, `ns`: number of collocation nodes.
//! - `dx`: continuous action dimension (0 for a purely discrete model).
//! - `ni`: discrete states, `nj`: discrete actions, `ne`: shock realizations.
//! - `nc`: number of collocation coefficients per function.
//!
//! At least one decision must exist: `nj > 1` or `dx > 0`.
use crate::errors::{DpError, DpResult};

/// Dimensions of a [`DpModel`](crate::model::definition::DpModel).
///
/// Invariants: `ds, ns, nc, ni, nj, ne ≥ 1`, `ns ≥ nc`, and `nj > 1 || dx > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DpDims {
    pub ds: usize,
    pub ns: usize,
    pub dx: usize,
    pub ni: usize,
    pub nj: usize,
    pub ne: usize,
    pub nc: usize,
}

impl DpDims {
    /// Construct and validate model dimensions.
    ///
    /// # Errors
    /// - [`DpError::NoDecision`] if `nj <= 1` and `dx == 0`.
    /// - [`DpError::InvalidDimension`] if any count is zero.
    /// - [`DpError::UnderdeterminedSystem`] if `ns < nc`.
    pub fn new(
        ds: usize, ns: usize, dx: usize, ni: usize, nj: usize, ne: usize, nc: usize,
    ) -> DpResult<Self> {
        let sizes = [("ds", ds), ("ns", ns), ("ni", ni), ("nj", nj), ("ne", ne), ("nc", nc)];
        for (name, value) in sizes {
            if value == 0 {
                return Err(DpError::InvalidDimension {
                    name,
                    value,
                    reason: "must be greater than zero.",
                });
            }
        }
        if nj <= 1 && dx == 0 {
            return Err(DpError::NoDecision);
        }
        if ns < nc {
            return Err(DpError::UnderdeterminedSystem { rows: ns, cols: nc });
        }
        Ok(DpDims { ds, ns, dx, ni, nj, ne, nc })
    }

    /// `true` when the model has no continuous action.
    pub fn is_discrete(&self) -> bool {
        self.dx == 0
    }
}
