//! Tensor-product Chebyshev basis on a box.
//!
//! Purpose
//! -------
//! Approximate functions of a `ds`-dimensional continuous state on
//! `[a_1, b_1] × … × [a_ds, b_ds]` by tensor products of Chebyshev
//! polynomials, with nodes at the Chebyshev zeros.
//!
//! Key behaviors
//! -------------
//! - Node `k` of a dimension with `n` nodes is the mapped zero
//!   `-cos((2k + 1)π / (2n))`, so nodes are sorted in increasing order.
//! - Tensor grids enumerate the first dimension fastest, both for nodes and
//!   for coefficients.
//! - Derivatives come from the three-term recurrences of `T_m`, `T'_m` and
//!   `T''_m`, scaled by the affine factor `2 / (b - a)`.
//!
//! Invariants & assumptions
//! ------------------------
//! - `n_d ≥ 1`, `a_d < b_d` and both are finite.
//! - The basis has exactly as many coefficients as nodes, so collocation
//!   systems built on it are square.
//!
//! Conventions
//! -----------
//! - Points outside the box are extrapolated with the same polynomial.
use crate::{
    basis::{check_coef, check_points, Interpolant, InterpolantEval},
    errors::{DpError, DpResult},
};
use ndarray::{Array1, Array2, Array3, ArrayView1, ArrayView2};
use std::f64::consts::PI;

/// Tensor-product Chebyshev basis with `n[d]` nodes on `[a[d], b[d]]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChebyshevBasis {
    n: Vec<usize>,
    a: Vec<f64>,
    b: Vec<f64>,
}

/// Per-dimension polynomial values and derivatives at one coordinate.
struct DimPolys {
    t: Vec<f64>,
    dt: Vec<f64>,
    d2t: Vec<f64>,
}

impl ChebyshevBasis {
    /// Build a basis with `n[d]` nodes on `[a[d], b[d]]`.
    ///
    /// # Errors
    /// [`DpError::InvalidBasis`] when the three vectors have different
    /// lengths, are empty, contain a zero node count, or describe an empty
    /// or non-finite interval.
    pub fn new(n: Vec<usize>, a: Vec<f64>, b: Vec<f64>) -> DpResult<Self> {
        if n.is_empty() {
            return Err(DpError::InvalidBasis { reason: "at least one dimension is required." });
        }
        if n.len() != a.len() || n.len() != b.len() {
            return Err(DpError::InvalidBasis {
                reason: "node counts and bounds must have the same length.",
            });
        }
        if n.iter().any(|&nd| nd == 0) {
            return Err(DpError::InvalidBasis {
                reason: "every dimension needs at least one node.",
            });
        }
        for (&lo, &hi) in a.iter().zip(b.iter()) {
            if !lo.is_finite() || !hi.is_finite() || lo >= hi {
                return Err(DpError::InvalidBasis {
                    reason: "bounds must be finite with lower strictly below upper.",
                });
            }
        }
        Ok(ChebyshevBasis { n, a, b })
    }

    /// One-dimensional convenience constructor.
    pub fn univariate(n: usize, a: f64, b: f64) -> DpResult<Self> {
        Self::new(vec![n], vec![a], vec![b])
    }

    /// Number of nodes per dimension.
    pub fn nodes_per_dim(&self) -> &[usize] {
        &self.n
    }

    fn total(&self) -> usize {
        self.n.iter().product()
    }

    /// Per-dimension degree of tensor index `m`.
    fn multi_index(&self, mut m: usize) -> Vec<usize> {
        let mut idx = Vec::with_capacity(self.n.len());
        for &nd in &self.n {
            idx.push(m % nd);
            m /= nd;
        }
        idx
    }

    fn to_unit(&self, d: usize, x: f64) -> f64 {
        (2.0 * x - self.a[d] - self.b[d]) / (self.b[d] - self.a[d])
    }

    fn scale(&self, d: usize) -> f64 {
        2.0 / (self.b[d] - self.a[d])
    }

    fn polys(&self, d: usize, x: f64, with_derivatives: bool) -> DimPolys {
        let nd = self.n[d];
        let z = self.to_unit(d, x);
        let mut t = vec![0.0; nd];
        let mut dt = vec![0.0; if with_derivatives { nd } else { 0 }];
        let mut d2t = vec![0.0; if with_derivatives { nd } else { 0 }];
        t[0] = 1.0;
        if nd > 1 {
            t[1] = z;
            if with_derivatives {
                dt[1] = 1.0;
            }
        }
        for m in 1..nd.saturating_sub(1) {
            t[m + 1] = 2.0 * z * t[m] - t[m - 1];
            if with_derivatives {
                dt[m + 1] = 2.0 * t[m] + 2.0 * z * dt[m] - dt[m - 1];
                d2t[m + 1] = 4.0 * dt[m] + 2.0 * z * d2t[m] - d2t[m - 1];
            }
        }
        DimPolys { t, dt, d2t }
    }
}

impl Interpolant for ChebyshevBasis {
    fn ds(&self) -> usize {
        self.n.len()
    }

    fn n_coef(&self) -> usize {
        self.total()
    }

    fn nodes(&self) -> Array2<f64> {
        let ds = self.ds();
        let ns = self.total();
        let mut nodes = Array2::zeros((ds, ns));
        for m in 0..ns {
            for (d, &k) in self.multi_index(m).iter().enumerate() {
                let nd = self.n[d] as f64;
                let z = -((2 * k + 1) as f64 * PI / (2.0 * nd)).cos();
                nodes[[d, m]] = 0.5 * (self.a[d] + self.b[d]) + 0.5 * (self.b[d] - self.a[d]) * z;
            }
        }
        nodes
    }

    fn basis_matrix(&self, points: ArrayView2<f64>) -> DpResult<Array2<f64>> {
        check_points(self.ds(), points.nrows())?;
        let nc = self.total();
        let index: Vec<Vec<usize>> = (0..nc).map(|c| self.multi_index(c)).collect();
        let mut phi = Array2::zeros((points.ncols(), nc));
        for (p, point) in points.columns().into_iter().enumerate() {
            let polys: Vec<DimPolys> =
                point.iter().enumerate().map(|(d, &x)| self.polys(d, x, false)).collect();
            for (c, degrees) in index.iter().enumerate() {
                phi[[p, c]] = degrees.iter().enumerate().map(|(d, &k)| polys[d].t[k]).product();
            }
        }
        Ok(phi)
    }

    fn eval_derivatives(
        &self, coef: ArrayView1<f64>, points: ArrayView2<f64>,
    ) -> DpResult<InterpolantEval> {
        let ds = self.ds();
        let nc = self.total();
        check_coef(nc, coef.len())?;
        check_points(ds, points.nrows())?;
        let npts = points.ncols();
        let mut value = Array1::zeros(npts);
        let mut gradient = Array2::zeros((ds, npts));
        let mut hessian = Array3::zeros((ds, ds, npts));
        let scale: Vec<f64> = (0..ds).map(|d| self.scale(d)).collect();

        for (p, point) in points.columns().into_iter().enumerate() {
            let polys: Vec<DimPolys> =
                point.iter().enumerate().map(|(d, &x)| self.polys(d, x, true)).collect();
            for c in 0..nc {
                let ck = coef[c];
                if ck == 0.0 {
                    continue;
                }
                let deg = self.multi_index(c);
                let t: Vec<f64> = (0..ds).map(|d| polys[d].t[deg[d]]).collect();
                let dt: Vec<f64> = (0..ds).map(|d| polys[d].dt[deg[d]] * scale[d]).collect();
                let d2t: Vec<f64> =
                    (0..ds).map(|d| polys[d].d2t[deg[d]] * scale[d] * scale[d]).collect();
                let product_except = |skip: &[usize]| -> f64 {
                    (0..ds).filter(|d| !skip.contains(d)).map(|d| t[d]).product()
                };

                value[p] += ck * t.iter().product::<f64>();
                for d in 0..ds {
                    gradient[[d, p]] += ck * dt[d] * product_except(&[d]);
                    hessian[[d, d, p]] += ck * d2t[d] * product_except(&[d]);
                    for e in 0..d {
                        let cross = ck * dt[d] * dt[e] * product_except(&[d, e]);
                        hessian[[d, e, p]] += cross;
                        hessian[[e, d, p]] += cross;
                    }
                }
            }
        }
        Ok(InterpolantEval { value, gradient, hessian })
    }
}
