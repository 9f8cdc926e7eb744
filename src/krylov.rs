//! Krylov subspace methods for trust-region subproblems.
//!
//! The subproblem is to approximately solve `A x = b` for a symmetric operator
//! `A` subject to `||x|| <= radius`. For positive definite `A`, this is
//! equivalent to minimizing the quadratic model `q(x) = 1/2 x^T A x - b^T x`
//! in the ball.

use log::debug;
use nalgebra::DVector;

use crate::core::{LinearOperator, RealField};

/// Reason for termination of a [`Subsolver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubsolverStatus {
    /// The relative residual dropped below the requested tolerance.
    Converged,
    /// The iterate reached the boundary of the trust region, either by a
    /// step that would leave it or by following a direction of nonpositive
    /// curvature.
    OnBoundary,
    /// The iteration limit was reached.
    MaxIter,
}

/// Result of a [`Subsolver`] run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubsolverResult {
    /// Reason for termination.
    pub status: SubsolverStatus,
    /// Number of operator products performed.
    pub iters: usize,
}

/// Interface of a trust-region subproblem solver.
pub trait Subsolver<T: RealField> {
    /// Name of the subsolver.
    const NAME: &'static str;

    /// Approximately solves `op x = b` within the ball of given radius.
    ///
    /// The solution is written to `x`, which must have the dimension of the
    /// operator. The iteration stops when `||b - op x|| <= rtol ||b||`, when
    /// the boundary is reached or after `max_iter` operator products.
    fn solve<O>(
        &mut self,
        op: &mut O,
        b: &DVector<T>,
        radius: T,
        rtol: T,
        max_iter: usize,
        x: &mut DVector<T>,
    ) -> SubsolverResult
    where
        O: LinearOperator<T>;
}

/// Steihaug-Toint truncated conjugate gradient method.
///
/// Starting from zero, the iterates of conjugate gradients increase
/// monotonically in norm. The method therefore stops at the boundary of the
/// trust region as soon as a step would cross it, and also when negative
/// curvature is detected, in which case the direction is followed to the
/// boundary.
///
/// # References
///
/// \[1\] [The Conjugate Gradient Method and Trust Regions in Large Scale
/// Optimization](https://doi.org/10.1137/0720042)
///
/// \[2\] [Numerical Optimization](https://link.springer.com/book/10.1007/978-0-387-40065-5)
#[derive(Debug, Clone)]
pub struct SteihaugCg<T: RealField> {
    r: DVector<T>,
    p: DVector<T>,
    ap: DVector<T>,
}

impl<T: RealField> SteihaugCg<T> {
    /// Initializes the subsolver.
    pub fn new() -> Self {
        Self {
            r: DVector::zeros(0),
            p: DVector::zeros(0),
            ap: DVector::zeros(0),
        }
    }

    fn resize(&mut self, n: usize) {
        if self.r.nrows() != n {
            self.r = DVector::zeros(n);
            self.p = DVector::zeros(n);
            self.ap = DVector::zeros(n);
        }
    }
}

impl<T: RealField> Default for SteihaugCg<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: RealField> Subsolver<T> for SteihaugCg<T> {
    const NAME: &'static str = "Steihaug-Toint CG";

    fn solve<O>(
        &mut self,
        op: &mut O,
        b: &DVector<T>,
        radius: T,
        rtol: T,
        max_iter: usize,
        x: &mut DVector<T>,
    ) -> SubsolverResult
    where
        O: LinearOperator<T>,
    {
        let n = op.dim();
        debug_assert_eq!(x.nrows(), n);

        self.resize(n);
        let Self { r, p, ap } = self;

        x.fill(T::zero());
        r.copy_from(b);
        p.copy_from(b);

        let b_norm = b.norm();
        if b_norm == T::zero() {
            return SubsolverResult {
                status: SubsolverStatus::Converged,
                iters: 0,
            };
        }

        let eps = rtol * b_norm;
        let mut gamma = r.norm_squared();
        let mut iters = 0;

        while iters < max_iter {
            op.apply_to(p, ap);
            iters += 1;

            let pap = p.dot(&*ap);

            if pap <= T::zero() {
                let tau = boundary_step(x, p, radius);
                x.axpy(tau, &*p, T::one());

                debug!(
                    "nonpositive curvature {} in CG iteration {}, tau = {}",
                    pap, iters, tau
                );

                return SubsolverResult {
                    status: SubsolverStatus::OnBoundary,
                    iters,
                };
            }

            let alpha = gamma / pap;

            // ||x + alpha p||^2 without forming the vector.
            let two = T::one() + T::one();
            let next_norm_sq =
                x.norm_squared() + two * alpha * x.dot(&*p) + alpha * alpha * p.norm_squared();

            if next_norm_sq >= radius * radius {
                let tau = boundary_step(x, p, radius);
                x.axpy(tau, &*p, T::one());

                debug!(
                    "CG iteration {} crosses the boundary, alpha = {}, tau = {}",
                    iters, alpha, tau
                );

                return SubsolverResult {
                    status: SubsolverStatus::OnBoundary,
                    iters,
                };
            }

            x.axpy(alpha, &*p, T::one());
            r.axpy(-alpha, &*ap, T::one());

            let gamma_next = r.norm_squared();

            if gamma_next.sqrt() <= eps {
                debug!("CG converged in {} iterations", iters);

                return SubsolverResult {
                    status: SubsolverStatus::Converged,
                    iters,
                };
            }

            let beta = gamma_next / gamma;
            gamma = gamma_next;

            // p = r + beta p
            p.axpy(T::one(), &*r, beta);
        }

        debug!("CG reached maximum number of iterations {}", max_iter);

        SubsolverResult {
            status: SubsolverStatus::MaxIter,
            iters,
        }
    }
}

/// Computes the nonnegative `tau` such that `||x + tau p|| = radius`.
///
/// Assumes `||x|| <= radius` and nonzero `p`.
pub fn boundary_step<T: RealField>(x: &DVector<T>, p: &DVector<T>, radius: T) -> T {
    let a = p.norm_squared();
    let b = x.dot(p);
    let c = x.norm_squared() - radius * radius;
    let d = (b * b - a * c).max(T::zero()).sqrt();

    // Avoid cancellation in -b + d by using the alternative form of the
    // positive root when b is positive.
    if b <= T::zero() {
        (d - b) / a
    } else {
        -c / (b + d)
    }
}
