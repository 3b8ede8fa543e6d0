//! Collocation: a basis tied to its node set.
//!
//! [`Collocation`] stores the nodes `s` (`ds × ns`), the basis matrix
//! `Φ = Φ(s)` (`ns × nc`) and the [`LinearSolve`] strategy that maps node
//! values to coefficients. The strategy is chosen once, when the collocation
//! is built: a square `Φ` is solved by LU, a tall `Φ` by least squares.
use crate::{
    basis::Interpolant,
    errors::{DpError, DpResult},
    linalg::LinearSolve,
};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

/// Basis plus precomputed node data used by the fixed-point solvers.
#[derive(Debug, Clone)]
pub struct Collocation<B: Interpolant> {
    basis: B,
    nodes: Array2<f64>,
    phi: Array2<f64>,
    strategy: LinearSolve,
}

impl<B: Interpolant> Collocation<B> {
    /// Build the collocation system of `basis` at its own nodes.
    ///
    /// # Errors
    /// - [`DpError::InvalidBasis`] if the node array does not have `ds` rows.
    /// - [`DpError::UnderdeterminedSystem`] if there are fewer nodes than
    ///   coefficients.
    pub fn new(basis: B) -> DpResult<Self> {
        let nodes = basis.nodes();
        if nodes.nrows() != basis.ds() {
            return Err(DpError::InvalidBasis {
                reason: "node array must have one row per state dimension.",
            });
        }
        let phi = basis.basis_matrix(nodes.view())?;
        let strategy = LinearSolve::for_shape(phi.nrows(), phi.ncols())?;
        Ok(Collocation { basis, nodes, phi, strategy })
    }

    pub fn basis(&self) -> &B {
        &self.basis
    }

    /// Nodes, `ds × ns`.
    pub fn nodes(&self) -> ArrayView2<'_, f64> {
        self.nodes.view()
    }

    /// Basis matrix at the nodes, `ns × nc`.
    pub fn phi(&self) -> ArrayView2<'_, f64> {
        self.phi.view()
    }

    pub fn strategy(&self) -> LinearSolve {
        self.strategy
    }

    pub fn ds(&self) -> usize {
        self.nodes.nrows()
    }

    pub fn ns(&self) -> usize {
        self.nodes.ncols()
    }

    pub fn nc(&self) -> usize {
        self.phi.ncols()
    }

    /// Coefficients whose interpolant matches `values` at the nodes (exactly
    /// for square systems, in the least-squares sense otherwise).
    ///
    /// # Errors
    /// - [`DpError::CoefficientLength`] if `values.len() != ns`.
    /// - [`DpError::SingularSystem`] if `Φ` cannot be factorized.
    pub fn fit(&self, values: ArrayView1<f64>) -> DpResult<Array1<f64>> {
        self.strategy.solve(self.phi.view(), values)
    }

    /// Fit several functions at once; `values` is `ns × k`, the result `nc × k`.
    pub fn fit_columns(&self, values: ArrayView2<f64>) -> DpResult<Array2<f64>> {
        self.strategy.solve_columns(self.phi.view(), values)
    }

    /// Function values at the nodes, `Φ c`.
    pub fn values_at_nodes(&self, coef: ArrayView1<f64>) -> DpResult<Array1<f64>> {
        crate::basis::check_coef(self.nc(), coef.len())?;
        Ok(self.phi.dot(&coef))
    }
}
