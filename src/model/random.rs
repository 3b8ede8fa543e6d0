//! Random components: continuous shocks and discrete-state Markov transitions.
//!
//! Purpose
//! -------
//! Hold the discretized distribution of the continuous transition shock
//! (`e`, `w`) and the discrete-state transition tensor `q[j, i, i']`, the
//! probability of moving from discrete state `i` to `i'` after discrete
//! action `j`.
//!
//! Key behaviors
//! -------------
//! - Build `q` from one of several descriptions ([`MarkovTransition`]):
//!   a full `[nj, ni, ni]` tensor, a single `ni × ni` matrix shared by all
//!   actions, or a deterministic successor map `h[j, i] = i'`.
//! - Validate that every probability lies in `[0, 1]` and every row of `q`
//!   sums to one within [`MARKOV_ROW_TOL`]; validate shock weights the same
//!   way.
//!
//! Invariants & assumptions
//! ------------------------
//! - `e` is `de × ne` (one column per shock realization), `w` has length
//!   `ne`; the same realization is applied to every node.
//! - With a single discrete state, `q` is the all-ones `[nj, 1, 1]` tensor and
//!   no transition needs to be supplied.
//!
//! Conventions
//! -----------
//! - Validation happens once, in [`RandomSpec::new`]; the evaluator trusts
//!   the stored arrays.
use crate::errors::{DpError, DpResult};
use ndarray::{Array1, Array2, Array3};

/// Tolerance on `|Σ_i' q[j, i, i'] − 1|` and `|Σ_k w[k] − 1|`.
pub const MARKOV_ROW_TOL: f64 = 1e-8;

/// Description of the discrete-state transition.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkovTransition {
    /// No transition supplied; only valid when `ni == 1`.
    None,
    /// Full tensor `q[j, i, i']` of shape `[nj, ni, ni]`.
    Stochastic(Array3<f64>),
    /// One `ni × ni` matrix used regardless of the discrete action.
    Shared(Array2<f64>),
    /// Deterministic successor `h[j, i] = i'`, shape `nj × ni`.
    Deterministic(Array2<usize>),
}

/// Discretized shocks and discrete-state transition probabilities.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomSpec {
    /// Shock support, `de × ne`.
    pub e: Array2<f64>,
    /// Shock weights, length `ne`.
    pub w: Array1<f64>,
    /// Discrete transition tensor, `[nj, ni, ni]`.
    pub q: Array3<f64>,
}

impl RandomSpec {
    /// Build and validate the random specification.
    ///
    /// Parameters
    /// ----------
    /// - `ni`, `nj`: number of discrete states and actions.
    /// - `e`: optional shock support (`de × ne`); defaults to a single zero shock.
    /// - `w`: optional shock weights (length `ne`); defaults to `[1.0]`.
    /// - `transition`: discrete-state transition description.
    ///
    /// Errors
    /// ------
    /// - [`DpError::ShockLengthMismatch`] when `e` and `w` disagree on `ne`.
    /// - [`DpError::InvalidShockWeights`] for negative, non-finite or
    ///   non-normalized weights.
    /// - [`DpError::MissingDiscreteTransition`] when `ni > 1` and no
    ///   transition is given.
    /// - [`DpError::TransitionShapeMismatch`], [`DpError::InvalidTransitionProb`],
    ///   [`DpError::TransitionRowSum`], [`DpError::TransitionTargetOutOfRange`]
    ///   for malformed transitions.
    pub fn new(
        ni: usize, nj: usize, e: Option<Array2<f64>>, w: Option<Array1<f64>>,
        transition: MarkovTransition,
    ) -> DpResult<Self> {
        if ni == 0 {
            return Err(DpError::InvalidDimension {
                name: "ni",
                value: ni,
                reason: "must be greater than zero.",
            });
        }
        if nj == 0 {
            return Err(DpError::InvalidDimension {
                name: "nj",
                value: nj,
                reason: "must be greater than zero.",
            });
        }
        let w = w.unwrap_or_else(|| Array1::ones(1));
        let e = e.unwrap_or_else(|| Array2::zeros((1, w.len())));
        if e.ncols() != w.len() {
            return Err(DpError::ShockLengthMismatch { support: e.ncols(), weights: w.len() });
        }
        validate_weights(&w)?;
        let q = build_transition(ni, nj, transition)?;
        validate_transition(&q)?;
        Ok(RandomSpec { e, w, q })
    }

    /// Number of shock realizations.
    pub fn ne(&self) -> usize {
        self.w.len()
    }

    /// Number of discrete states implied by `q`.
    pub fn ni(&self) -> usize {
        self.q.shape()[1]
    }

    /// Number of discrete actions implied by `q`.
    pub fn nj(&self) -> usize {
        self.q.shape()[0]
    }
}

// ---- Helper methods ----

fn validate_weights(w: &Array1<f64>) -> DpResult<()> {
    if w.is_empty() {
        return Err(DpError::InvalidDimension {
            name: "ne",
            value: 0,
            reason: "at least one shock realization is required.",
        });
    }
    for (index, &value) in w.iter().enumerate() {
        if !value.is_finite() || value < 0.0 {
            return Err(DpError::InvalidShockWeights {
                index,
                value,
                reason: "Weights must be finite and non-negative.",
            });
        }
    }
    let total = w.sum();
    if (total - 1.0).abs() > MARKOV_ROW_TOL {
        return Err(DpError::InvalidShockWeights {
            index: w.len() - 1,
            value: total,
            reason: "Weights must sum to one.",
        });
    }
    Ok(())
}

fn build_transition(ni: usize, nj: usize, transition: MarkovTransition) -> DpResult<Array3<f64>> {
    match transition {
        MarkovTransition::None => {
            if ni == 1 {
                Ok(Array3::ones((nj, 1, 1)))
            } else {
                Err(DpError::MissingDiscreteTransition { ni })
            }
        }
        MarkovTransition::Stochastic(q) => {
            if q.shape() != [nj, ni, ni] {
                return Err(DpError::TransitionShapeMismatch {
                    expected: vec![nj, ni, ni],
                    found: q.shape().to_vec(),
                });
            }
            Ok(q)
        }
        MarkovTransition::Shared(q2) => {
            if q2.shape() != [ni, ni] {
                return Err(DpError::TransitionShapeMismatch {
                    expected: vec![ni, ni],
                    found: q2.shape().to_vec(),
                });
            }
            let mut q = Array3::zeros((nj, ni, ni));
            for mut slab in q.outer_iter_mut() {
                slab.assign(&q2);
            }
            Ok(q)
        }
        MarkovTransition::Deterministic(h) => {
            if h.shape() != [nj, ni] {
                return Err(DpError::TransitionShapeMismatch {
                    expected: vec![nj, ni],
                    found: h.shape().to_vec(),
                });
            }
            let mut q = Array3::zeros((nj, ni, ni));
            for ((j, i), &target) in h.indexed_iter() {
                if target >= ni {
                    return Err(DpError::TransitionTargetOutOfRange { j, i, target });
                }
                q[[j, i, target]] = 1.0;
            }
            Ok(q)
        }
    }
}

fn validate_transition(q: &Array3<f64>) -> DpResult<()> {
    let [nj, ni, _] = [q.shape()[0], q.shape()[1], q.shape()[2]];
    for j in 0..nj {
        for i in 0..ni {
            let mut sum = 0.0;
            for i_next in 0..ni {
                let value = q[[j, i, i_next]];
                if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                    return Err(DpError::InvalidTransitionProb { j, i, i_next, value });
                }
                sum += value;
            }
            if (sum - 1.0).abs() > MARKOV_ROW_TOL {
                return Err(DpError::TransitionRowSum { j, i, sum });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Defaults for shocks and single-state transitions.
    // - Construction of q from shared and deterministic descriptions.
    // - Rejection of malformed Markov tensors and shock weights.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // A single-state model needs no transition and gets one zero shock.
    //
    // Given
    // -----
    // - `ni = 1`, `nj = 3`, no shocks, `MarkovTransition::None`.
    //
    // Expect
    // ------
    // - `q` is all ones with shape `[3, 1, 1]`; one zero shock with weight one.
    fn new_single_state_defaults() {
        // Act
        let spec = RandomSpec::new(1, 3, None, None, MarkovTransition::None).unwrap();

        // Assert
        assert_eq!(spec.q.shape(), &[3, 1, 1]);
        assert!(spec.q.iter().all(|&p| p == 1.0));
        assert_eq!(spec.ne(), 1);
        assert_eq!(spec.e[[0, 0]], 0.0);
        assert_eq!(spec.w[0], 1.0);
    }

    #[test]
    // Purpose
    // -------
    // Multi-state models must say how the discrete state evolves.
    //
    // Given
    // -----
    // - `ni = 2` and `MarkovTransition::None`.
    //
    // Expect
    // ------
    // - `DpError::MissingDiscreteTransition`.
    fn new_multi_state_requires_transition() {
        // Act
        let result = RandomSpec::new(2, 2, None, None, MarkovTransition::None);

        // Assert
        assert_eq!(result, Err(DpError::MissingDiscreteTransition { ni: 2 }));
    }

    #[test]
    // Purpose
    // -------
    // A deterministic successor map becomes a 0/1 tensor.
    //
    // Given
    // -----
    // - `h = [[0, 1], [0, 0]]` (action 0 keeps/advances, action 1 resets).
    //
    // Expect
    // ------
    // - `q[j, i, h[j, i]] == 1` and every other entry is zero.
    fn new_deterministic_transition_builds_indicator_tensor() {
        // Arrange
        let h = array![[0usize, 1], [0, 0]];

        // Act
        let spec = RandomSpec::new(2, 2, None, None, MarkovTransition::Deterministic(h)).unwrap();

        // Assert
        assert_eq!(spec.q[[0, 0, 0]], 1.0);
        assert_eq!(spec.q[[0, 1, 1]], 1.0);
        assert_eq!(spec.q[[1, 1, 0]], 1.0);
        assert_eq!(spec.q.sum(), 4.0);
    }

    #[test]
    // Purpose
    // -------
    // A shared matrix is broadcast across discrete actions.
    //
    // Given
    // -----
    // - A 2×2 Markov matrix and `nj = 3`.
    //
    // Expect
    // ------
    // - Every action slab equals the supplied matrix.
    fn new_shared_transition_is_broadcast() {
        // Arrange
        let q2 = array![[0.9, 0.1], [0.3, 0.7]];

        // Act
        let spec = RandomSpec::new(2, 3, None, None, MarkovTransition::Shared(q2.clone())).unwrap();

        // Assert
        for slab in spec.q.outer_iter() {
            assert_eq!(slab, q2);
        }
    }

    #[test]
    // Purpose
    // -------
    // Rows that do not sum to one are rejected.
    //
    // Given
    // -----
    // - A tensor whose row `q[0, 1, :]` sums to 0.9.
    //
    // Expect
    // ------
    // - `DpError::TransitionRowSum` naming that row.
    fn new_rejects_row_not_summing_to_one() {
        // Arrange
        let q = array![[[0.5, 0.5], [0.4, 0.5]]];

        // Act
        let result = RandomSpec::new(2, 1, None, None, MarkovTransition::Stochastic(q));

        // Assert
        match result {
            Err(DpError::TransitionRowSum { j: 0, i: 1, sum }) => {
                assert!((sum - 0.9).abs() < 1e-12)
            }
            other => panic!("Expected TransitionRowSum, got {other:?}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // Probabilities outside [0, 1] are rejected even if the row sums to one.
    //
    // Given
    // -----
    // - Row `[1.5, -0.5]`.
    //
    // Expect
    // ------
    // - `DpError::InvalidTransitionProb`.
    fn new_rejects_probability_outside_unit_interval() {
        // Arrange
        let q = array![[[1.5, -0.5], [0.0, 1.0]]];

        // Act
        let result = RandomSpec::new(2, 1, None, None, MarkovTransition::Stochastic(q));

        // Assert
        assert!(matches!(result, Err(DpError::InvalidTransitionProb { .. })));
    }

    #[test]
    // Purpose
    // -------
    // Shock weights must form a distribution matching the support.
    //
    // Given
    // -----
    // - Weights summing to 0.8, and a support/weight length mismatch.
    //
    // Expect
    // ------
    // - `InvalidShockWeights` and `ShockLengthMismatch` respectively.
    fn new_rejects_bad_shock_weights() {
        // Arrange
        let e = array![[-1.0, 1.0]];

        // Act
        let bad_sum = RandomSpec::new(
            1,
            2,
            Some(e.clone()),
            Some(array![0.4, 0.4]),
            MarkovTransition::None,
        );
        let bad_len =
            RandomSpec::new(1, 2, Some(e), Some(array![1.0]), MarkovTransition::None);

        // Assert
        assert!(matches!(bad_sum, Err(DpError::InvalidShockWeights { .. })));
        assert_eq!(bad_len, Err(DpError::ShockLengthMismatch { support: 2, weights: 1 }));
    }
}
