//! Time parameters: discount factor and planning horizon.
use crate::errors::{DpError, DpResult};

/// Planning horizon of the agent.
///
/// - `Finite(T)`: `T ≥ 1` decision periods, solved by backward recursion.
/// - `Infinite`: stationary problem, solved as a fixed point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Horizon {
    Finite(usize),
    Infinite,
}

impl Horizon {
    /// Number of decision periods stored by a solution: `T` or `1`.
    pub fn policy_periods(&self) -> usize {
        match self {
            Horizon::Finite(periods) => *periods,
            Horizon::Infinite => 1,
        }
    }

    /// Number of value-function slots stored by a solution: `T + 1` or `1`.
    pub fn value_periods(&self) -> usize {
        match self {
            Horizon::Finite(periods) => periods + 1,
            Horizon::Infinite => 1,
        }
    }

    pub fn is_infinite(&self) -> bool {
        matches!(self, Horizon::Infinite)
    }
}

/// Discount factor `δ` and horizon.
///
/// Invariants: `δ` is finite and in `[0, 1]`; infinite horizons require
/// `δ < 1` so that the Bellman operator is a contraction. `δ = 0` is allowed
/// and reduces the problem to static maximization of the reward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DpTime {
    pub discount: f64,
    pub horizon: Horizon,
}

impl DpTime {
    /// Construct validated time parameters.
    ///
    /// # Errors
    /// - [`DpError::InvalidDiscount`] if `discount` is non-finite, negative,
    ///   above one, or equal to one with an infinite horizon.
    /// - [`DpError::InvalidHorizon`] for `Horizon::Finite(0)`.
    pub fn new(discount: f64, horizon: Horizon) -> DpResult<Self> {
        if !discount.is_finite() {
            return Err(DpError::InvalidDiscount {
                value: discount,
                reason: "Discount factor must be finite.",
            });
        }
        if !(0.0..=1.0).contains(&discount) {
            return Err(DpError::InvalidDiscount {
                value: discount,
                reason: "Discount factor must lie in [0, 1].",
            });
        }
        match horizon {
            Horizon::Finite(0) => return Err(DpError::InvalidHorizon { periods: 0 }),
            Horizon::Infinite if discount >= 1.0 => {
                return Err(DpError::InvalidDiscount {
                    value: discount,
                    reason: "Infinite-horizon models require a discount factor below one.",
                });
            }
            _ => {}
        }
        Ok(DpTime { discount, horizon })
    }
}
