//! Generalized Cauchy point along the projected steepest descent path.

use log::debug;
use nalgebra::DVector;

use super::quadratic_model;
use crate::core::{Domain, LinearOperator, RealField};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CauchyStatus {
    Success,
    SmallStep,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct CauchyPoint<T> {
    /// Step length, used as the warm start in the next call.
    pub alpha: T,
    pub status: CauchyStatus,
}

/// Parameters of the search for the Cauchy point.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CauchyParams<T> {
    /// Sufficient decrease constant.
    pub mu0: T,
    /// Fraction of the trust region radius the step must fit in.
    pub mu1: T,
    /// Factor for shrinking or extending the step length.
    pub sigma: T,
}

/// Finds step `s = P(x - alpha g) - x` that satisfies `||s|| <= mu1 radius`
/// and the sufficient decrease `q(s) <= mu0 g's` of the quadratic model `q(s)
/// = 1/2 s'Hs + g's`.
///
/// The search starts from the step length `alpha`. If it does not satisfy
/// the conditions, it is repeatedly shrunk, otherwise it is extended as long
/// as the conditions keep holding. On return, `s` contains the step and `hs`
/// the product `H s`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn cauchy_point<T, O>(
    dom: &Domain<T>,
    x: &DVector<T>,
    g: &DVector<T>,
    hess: &mut O,
    radius: T,
    alpha: T,
    params: CauchyParams<T>,
    s: &mut DVector<T>,
    hs: &mut DVector<T>,
) -> CauchyPoint<T>
where
    T: RealField,
    O: LinearOperator<T>,
{
    let CauchyParams { mu0, mu1, sigma } = params;

    let d = -g;
    let max_norm = mu1 * radius;
    let brk = dom.breakpoints(x, &d);

    let mut alpha = alpha;

    dom.project_step(x, &d, alpha, s);
    let (mut q, mut slope) = quadratic_model(hess, g, s, hs);

    let mut search = s.norm() > max_norm || q >= mu0 * slope;

    if search {
        debug!("shrink Cauchy step length from alpha = {}", alpha);

        while search {
            alpha /= sigma;
            dom.project_step(x, &d, alpha, s);

            if s.norm() <= max_norm {
                (q, slope) = quadratic_model(hess, g, s, hs);
                search = q >= mu0 * slope;
            }

            if alpha < T::TINY_SQRT {
                debug!("Cauchy step length underflowed (alpha = {})", alpha);

                return CauchyPoint {
                    alpha,
                    status: CauchyStatus::SmallStep,
                };
            }
        }
    } else {
        debug!("extend Cauchy step length from alpha = {}", alpha);

        let mut alpha_success = alpha;
        search = brk.count() > 0;

        while search && alpha <= brk.max() {
            alpha *= sigma;
            dom.project_step(x, &d, alpha, s);

            if s.norm() <= max_norm {
                (q, slope) = quadratic_model(hess, g, s, hs);

                if q <= mu0 * slope {
                    alpha_success = alpha;
                }
            } else {
                search = false;
            }
        }

        alpha = alpha_success;
        dom.project_step(x, &d, alpha, s);
        hess.apply_to(s, hs);
    }

    debug!("Cauchy step length alpha = {}, || s || = {}", alpha, s.norm());

    CauchyPoint {
        alpha,
        status: CauchyStatus::Success,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use nalgebra::{dmatrix, dvector, DMatrix};

    fn params() -> CauchyParams<f64> {
        CauchyParams {
            mu0: 1e-2,
            mu1: 1.0,
            sigma: 10.0,
        }
    }

    fn model(hess: &DMatrix<f64>, g: &DVector<f64>, s: &DVector<f64>) -> f64 {
        0.5 * s.dot(&(hess * s)) + g.dot(s)
    }

    #[test]
    fn shrinks_into_radius() {
        let dom = Domain::unconstrained(2);
        let mut hess = dmatrix![1.0, 0.0; 0.0, 1.0];
        let x = dvector![0.0, 0.0];
        let g = dvector![3.0, 4.0];
        let mut s = DVector::zeros(2);
        let mut hs = DVector::zeros(2);

        let radius = 1.0;
        let cp = cauchy_point(&dom, &x, &g, &mut hess, radius, 1.0, params(), &mut s, &mut hs);

        assert_eq!(cp.status, CauchyStatus::Success);
        assert!(s.norm() <= radius);
        assert!(model(&hess, &g, &s) <= 1e-2 * g.dot(&s));
        assert_eq!(hs, &hess * &s);
    }

    #[test]
    fn extends_up_to_breakpoints() {
        let dom = Domain::rect(vec![-100.0, -100.0], vec![100.0, 100.0]);
        let mut hess = dmatrix![0.01, 0.0; 0.0, 0.01];
        let x = dvector![0.0, 0.0];
        let g = dvector![0.1, 0.0];
        let mut s = DVector::zeros(2);
        let mut hs = DVector::zeros(2);

        let radius = 1000.0;
        let cp = cauchy_point(&dom, &x, &g, &mut hess, radius, 1.0, params(), &mut s, &mut hs);

        assert_eq!(cp.status, CauchyStatus::Success);
        assert!(cp.alpha > 1.0);
        assert!(s.norm() <= radius);
        assert!(model(&hess, &g, &s) <= 1e-2 * g.dot(&s));
    }

    #[test]
    fn projected_path_stays_feasible() {
        let dom = Domain::rect(vec![0.0, 0.0], vec![1.0, 1.0]);
        let mut hess = dmatrix![2.0, 0.0; 0.0, 2.0];
        let x = dvector![0.5, 0.5];
        let g = dvector![-4.0, 1.0];
        let mut s = DVector::zeros(2);
        let mut hs = DVector::zeros(2);

        let radius = 10.0;
        let cp = cauchy_point(&dom, &x, &g, &mut hess, radius, 1.0, params(), &mut s, &mut hs);

        assert_eq!(cp.status, CauchyStatus::Success);
        assert!(dom.is_feasible(&(&x + &s)));
        assert!(s.norm() <= radius);
    }

    #[test]
    fn huge_curvature_underflows() {
        let dom = Domain::unconstrained(1);
        let mut hess = dmatrix![1e300];
        let x = dvector![0.0];
        let g = dvector![1.0];
        let mut s = DVector::zeros(1);
        let mut hs = DVector::zeros(1);

        let cp = cauchy_point(&dom, &x, &g, &mut hess, 1.0, 1.0, params(), &mut s, &mut hs);
        assert_eq!(cp.status, CauchyStatus::SmallStep);
    }
}
