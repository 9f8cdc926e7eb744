//! Active-set projected Newton refinement of the Cauchy step.

use log::debug;
use nalgebra::DVector;

use super::line_search::projected_search;
use crate::{
    core::{Domain, IndexSet, LinearOperator, RealField, RestrictedOperator},
    krylov::{Subsolver, SubsolverStatus},
};

/// Reason for termination of the projected Newton refinement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NewtonStatus {
    StationaryPoint,
    OnBoundary,
    MaxIter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NewtonResult {
    pub status: NewtonStatus,
    /// Total number of subsolver iterations.
    pub iters: usize,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct NewtonParams<T> {
    pub mu0: T,
    pub cg_tol: T,
    pub max_cg_iter: usize,
}

/// Refines step `s` (with `hs = H s`) that already moved `x` to `x + s`.
///
/// In every iteration, the quadratic model restricted to the free variables
/// is minimized by the subsolver within the trust region, followed by a
/// projected search along its solution. The step and its product with the
/// Hessian are updated in place.
#[allow(clippy::too_many_arguments)]
pub(crate) fn projected_newton<T, O, S>(
    dom: &Domain<T>,
    x: &mut DVector<T>,
    g: &DVector<T>,
    hess: &mut O,
    subsolver: &mut S,
    radius: T,
    params: NewtonParams<T>,
    s: &mut DVector<T>,
    hs: &mut DVector<T>,
) -> NewtonResult
where
    T: RealField,
    O: LinearOperator<T>,
    S: Subsolver<T>,
{
    let NewtonParams {
        mu0,
        cg_tol,
        max_cg_iter,
    } = params;

    let n = x.nrows();
    let mut free = IndexSet::with_capacity(n);
    let mut w = DVector::zeros(n);
    let mut iters = 0;

    loop {
        // Gradient of the model in the current point.
        w.copy_from(g);
        w += &*hs;

        dom.free_set(x, &w, &mut free);

        if free.is_empty() {
            debug!("no free variables, stationary point found");
            return NewtonResult {
                status: NewtonStatus::StationaryPoint,
                iters,
            };
        }

        let m = free.len();
        let w_free = free.gather(&w);
        let w_free_norm = w_free.norm();
        let b = -&w_free;

        let sub_dom = dom.restrict(&free);
        let mut x_free = free.gather(x);
        let mut d = DVector::zeros(m);
        let mut s_free = DVector::zeros(m);
        let mut hs_free = DVector::zeros(m);

        let result = {
            let mut reduced = RestrictedOperator::new(&mut *hess, &free);
            let result = subsolver.solve(&mut reduced, &b, radius, cg_tol, max_cg_iter, &mut d);

            projected_search(
                &sub_dom,
                &mut x_free,
                &d,
                &w_free,
                &mut reduced,
                mu0,
                &mut s_free,
                &mut hs_free,
            );

            result
        };

        iters += result.iters;

        free.scatter(&x_free, x);
        free.scatter_add(&s_free, s);
        hess.apply_to(s, hs);

        w.copy_from(g);
        w += &*hs;
        let residual = free.gather(&w).norm();

        debug!(
            "projected Newton: {} free variables, {} subsolver iterations ({:?}), residual {} / {}",
            m, result.iters, result.status, residual, w_free_norm
        );

        if residual <= cg_tol * w_free_norm {
            return NewtonResult {
                status: NewtonStatus::StationaryPoint,
                iters,
            };
        } else if result.status == SubsolverStatus::OnBoundary {
            return NewtonResult {
                status: NewtonStatus::OnBoundary,
                iters,
            };
        } else if iters >= max_cg_iter {
            return NewtonResult {
                status: NewtonStatus::MaxIter,
                iters,
            };
        }
    }
}
