//! The immutable description of a dynamic-programming model.
//!
//! A [`DpModel`] bundles the user callbacks, the collocation system, the time
//! parameters and the random specification, and derives the model
//! dimensions from them. Nothing in it is mutated by the solvers.
use crate::{
    basis::{Collocation, Interpolant},
    errors::DpResult,
    model::{
        dims::DpDims,
        functions::{DerivativeMode, DpFunctions},
        random::RandomSpec,
        time::{DpTime, Horizon},
    },
};

/// Dynamic-programming model solved by collocation.
///
/// Fields are private: `dims` is derived from the other parts, so every
/// change goes through a constructor that re-derives it.
///
/// Parts:
/// - `functions`: reward, transition and bounds callbacks.
/// - `collocation`: basis, nodes and fitting strategy shared by every value
///   and policy function.
/// - `time`: discount factor and horizon.
/// - `random`: shocks and discrete-state transitions.
/// - `dims`: derived dimensions.
/// - `derivatives`: how action derivatives are obtained.
#[derive(Debug, Clone)]
pub struct DpModel<F: DpFunctions, B: Interpolant> {
    functions: F,
    collocation: Collocation<B>,
    time: DpTime,
    random: RandomSpec,
    dims: DpDims,
    derivatives: DerivativeMode,
}

impl<F: DpFunctions, B: Interpolant> DpModel<F, B> {
    /// Assemble a model and derive its dimensions.
    ///
    /// Parameters
    /// ----------
    /// - `functions`: model callbacks.
    /// - `basis`: interpolation basis; its nodes become the collocation nodes.
    /// - `time`: validated discount factor and horizon.
    /// - `random`: validated shocks and transition tensor.
    /// - `dx`: number of continuous actions (0 for a purely discrete model).
    /// - `derivatives`: derivative mode, fixed for the lifetime of the model.
    ///
    /// Errors
    /// ------
    /// - Any error from [`Collocation::new`].
    /// - [`crate::errors::DpError::NoDecision`] or
    ///   [`crate::errors::DpError::InvalidDimension`] from [`DpDims::new`].
    pub fn new(
        functions: F, basis: B, time: DpTime, random: RandomSpec, dx: usize,
        derivatives: DerivativeMode,
    ) -> DpResult<Self> {
        let collocation = Collocation::new(basis)?;
        let dims = DpDims::new(
            collocation.ds(),
            collocation.ns(),
            dx,
            random.ni(),
            random.nj(),
            random.ne(),
            collocation.nc(),
        )?;
        Ok(DpModel { functions, collocation, time, random, dims, derivatives })
    }

    /// Replace the random specification and re-derive the dimensions.
    ///
    /// # Errors
    /// Any error from [`DpDims::new`], e.g. when the new specification has a
    /// different number of discrete states than the model is built for.
    pub fn with_random(self, random: RandomSpec) -> DpResult<Self> {
        let DpModel { functions, collocation, time, dims, derivatives, .. } = self;
        let dims = DpDims::new(
            dims.ds,
            dims.ns,
            dims.dx,
            random.ni(),
            random.nj(),
            random.ne(),
            dims.nc,
        )?;
        Ok(DpModel { functions, collocation, time, random, dims, derivatives })
    }

    pub fn functions(&self) -> &F {
        &self.functions
    }

    pub fn collocation(&self) -> &Collocation<B> {
        &self.collocation
    }

    pub fn time(&self) -> DpTime {
        self.time
    }

    pub fn random(&self) -> &RandomSpec {
        &self.random
    }

    pub fn dims(&self) -> DpDims {
        self.dims
    }

    pub fn derivatives(&self) -> DerivativeMode {
        self.derivatives
    }

    pub fn discount(&self) -> f64 {
        self.time.discount
    }

    pub fn horizon(&self) -> Horizon {
        self.time.horizon
    }
}
