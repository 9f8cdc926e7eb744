//! Projected backtracking search along a direction.

use log::debug;
use nalgebra::DVector;

use super::quadratic_model;
use crate::core::{Domain, LinearOperator, RealField};

/// Backtracks along the projected path `P(x + alpha d)` from `alpha = 1`
/// until the step satisfies the sufficient decrease `q(s) <= mu0 g's` of the
/// quadratic model with gradient `g` and Hessian `hess`.
///
/// Backtracking never goes below the first breakpoint of the path. If it
/// would, the step length snaps to the breakpoint, where the step lies on a
/// face of the box and is accepted as is. A path without a finite breakpoint
/// is backtracked until the decrease condition holds. The point `x` is moved by the
/// accepted step which is stored in `s`. Returns the step length.
#[allow(clippy::too_many_arguments)]
pub(crate) fn projected_search<T, O>(
    dom: &Domain<T>,
    x: &mut DVector<T>,
    d: &DVector<T>,
    g: &DVector<T>,
    hess: &mut O,
    mu0: T,
    s: &mut DVector<T>,
    hs: &mut DVector<T>,
) -> T
where
    T: RealField,
    O: LinearOperator<T>,
{
    let one = T::one();
    let half: T = one / (one + one);

    // Without a finite breakpoint, backtracking is not limited from below.
    let brkmin = dom.breakpoints(x, d).min();
    let brkmin = if brkmin.is_finite() { brkmin } else { T::zero() };

    let mut alpha = one;
    let mut accepted = false;

    while !accepted && alpha > brkmin {
        dom.project_step(x, d, alpha, s);
        let (q, slope) = quadratic_model(hess, g, s, hs);

        if q <= mu0 * slope {
            accepted = true;
        } else {
            alpha *= half;
        }
    }

    if alpha < one && alpha < brkmin {
        debug!(
            "snap line search step length from {} to breakpoint {}",
            alpha, brkmin
        );
        alpha = brkmin;
    }

    dom.project_step(x, d, alpha, s);
    *x += &*s;
    dom.project(x);

    debug!("line search step length alpha = {}", alpha);

    alpha
}
