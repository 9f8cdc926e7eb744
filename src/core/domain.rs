//! Problem domain definition such as bound constraints for variables.

use std::iter::FromIterator;

use na::{Dim, DimName};
use nalgebra as na;
use nalgebra::{
    convert,
    storage::{Storage, StorageMut},
    OVector, Vector,
};

use super::{base::RealField, operator::IndexSet};

/// Domain for a problem.
///
/// The domain is a box `l <= x <= u`. Positive and negative infinity can be
/// used to indicate a variable unbounded in that direction.
#[derive(Debug, Clone)]
pub struct Domain<T: RealField> {
    lower: OVector<T, na::Dyn>,
    upper: OVector<T, na::Dyn>,
}

impl<T: RealField> Domain<T> {
    /// Creates unconstrained domain with given dimensionality.
    pub fn unconstrained(dim: usize) -> Self {
        assert!(dim > 0, "empty domain");

        let inf: T = convert(f64::INFINITY);
        let n = na::Dyn(dim);
        let one = na::Const::<1>;

        Self {
            lower: OVector::from_iterator_generic(n, one, (0..dim).map(|_| -inf)),
            upper: OVector::from_iterator_generic(n, one, (0..dim).map(|_| inf)),
        }
    }

    /// Creates rectangular domain with given lower and upper bounds.
    ///
    /// Positive and negative infinity can be used to indicate a value unbounded
    /// in that dimension and direction. If the entire domain is unconstrained,
    /// use [`Domain::unconstrained`] instead.
    pub fn rect(lower: Vec<T>, upper: Vec<T>) -> Self {
        assert!(
            lower.len() == upper.len(),
            "lower and upper have different size"
        );

        let dim = lower.len();
        assert!(dim > 0, "empty domain");
        assert!(
            lower.iter().zip(upper.iter()).all(|(li, ui)| li <= ui),
            "lower bound is greater than upper bound"
        );

        let dim = na::Dyn(dim);
        let lower = OVector::from_iterator_generic(dim, na::U1::name(), lower);
        let upper = OVector::from_iterator_generic(dim, na::U1::name(), upper);

        Self { lower, upper }
    }

    /// Gets the dimensionality of the domain.
    pub fn dim(&self) -> usize {
        self.lower.nrows()
    }

    /// Gets the lower bounds.
    pub fn lower(&self) -> &OVector<T, na::Dyn> {
        &self.lower
    }

    /// Gets the upper bounds.
    pub fn upper(&self) -> &OVector<T, na::Dyn> {
        &self.upper
    }

    /// Determines whether all bounds are infinite.
    pub fn is_unconstrained(&self) -> bool {
        self.lower
            .iter()
            .chain(self.upper.iter())
            .all(|bound| !bound.is_finite())
    }

    /// Determines whether given point lies in the domain.
    pub fn is_feasible<D, Sx>(&self, x: &Vector<T, D, Sx>) -> bool
    where
        D: Dim,
        Sx: Storage<T, D>,
    {
        self.lower
            .iter()
            .zip(self.upper.iter())
            .zip(x.iter())
            .all(|((li, ui), xi)| li <= xi && xi <= ui)
    }

    /// Projects given point into the domain.
    ///
    /// Returns `true` if the point was not feasible before the projection.
    pub fn project<D, Sx>(&self, x: &mut Vector<T, D, Sx>) -> bool
    where
        D: Dim,
        Sx: StorageMut<T, D>,
    {
        let mut not_feasible = false;

        self.lower
            .iter()
            .zip(self.upper.iter())
            .zip(x.iter_mut())
            .for_each(|((li, ui), xi)| {
                if &*xi < li {
                    *xi = *li;
                    not_feasible = true;
                } else if &*xi > ui {
                    *xi = *ui;
                    not_feasible = true;
                }
            });

        not_feasible
    }

    /// Computes the projected step `s = P(x + alpha d) - x`, where `P` is the
    /// projection into the domain.
    ///
    /// The point `x + s` is feasible by construction whenever `x` is.
    pub fn project_step<Sx, Sd, Ss>(
        &self,
        x: &Vector<T, na::Dyn, Sx>,
        d: &Vector<T, na::Dyn, Sd>,
        alpha: T,
        s: &mut Vector<T, na::Dyn, Ss>,
    ) where
        Sx: Storage<T, na::Dyn>,
        Sd: Storage<T, na::Dyn>,
        Ss: StorageMut<T, na::Dyn>,
    {
        for i in 0..self.dim() {
            let xi = x[i];
            let target = (xi + alpha * d[i]).max(self.lower[i]).min(self.upper[i]);
            s[i] = target - xi;
        }
    }

    /// Computes the breakpoints of the path `x + t d` for `t > 0`, i.e., the
    /// step lengths at which a variable hits its bound.
    ///
    /// Only variables that can move in the direction contribute. That is,
    /// variables with `d_i = 0` or those that already lie on the bound the
    /// direction points to are skipped.
    pub fn breakpoints<Sx, Sd>(
        &self,
        x: &Vector<T, na::Dyn, Sx>,
        d: &Vector<T, na::Dyn, Sd>,
    ) -> Breakpoints<T>
    where
        Sx: Storage<T, na::Dyn>,
        Sd: Storage<T, na::Dyn>,
    {
        let zero = T::zero();
        let inf: T = convert(f64::INFINITY);

        let mut count = 0;
        let mut min = inf;
        let mut max = zero;

        for i in 0..self.dim() {
            let (xi, di) = (x[i], d[i]);

            let step = if di > zero && xi < self.upper[i] {
                (self.upper[i] - xi) / di
            } else if di < zero && xi > self.lower[i] {
                (self.lower[i] - xi) / di
            } else {
                continue;
            };

            count += 1;
            min = min.min(step);
            max = max.max(step);
        }

        if count == 0 {
            Breakpoints {
                count,
                min: inf,
                max: inf,
            }
        } else {
            Breakpoints { count, min, max }
        }
    }

    /// Collects the indices of free variables into `free`.
    ///
    /// A variable is active if it lies on its lower bound and the gradient
    /// is nonnegative, or if it lies on its upper bound and the gradient is
    /// nonpositive. In both cases the steepest descent pushes it out of the
    /// domain. All other variables are free.
    pub fn free_set<Sx, Sg>(
        &self,
        x: &Vector<T, na::Dyn, Sx>,
        g: &Vector<T, na::Dyn, Sg>,
        free: &mut IndexSet,
    ) where
        Sx: Storage<T, na::Dyn>,
        Sg: Storage<T, na::Dyn>,
    {
        let zero = T::zero();
        free.clear();

        for i in 0..self.dim() {
            let at_lower = x[i] <= self.lower[i] && g[i] >= zero;
            let at_upper = x[i] >= self.upper[i] && g[i] <= zero;

            if !at_lower && !at_upper {
                free.push(i);
            }
        }
    }

    /// Restricts the domain to the given subset of variables.
    pub fn restrict(&self, set: &IndexSet) -> Self {
        assert!(!set.is_empty(), "empty domain");

        let dim = na::Dyn(set.len());
        let one = na::U1::name();

        Self {
            lower: OVector::from_iterator_generic(dim, one, set.iter().map(|i| self.lower[i])),
            upper: OVector::from_iterator_generic(dim, one, set.iter().map(|i| self.upper[i])),
        }
    }
}

impl<T: RealField> FromIterator<(T, T)> for Domain<T> {
    fn from_iter<I: IntoIterator<Item = (T, T)>>(iter: I) -> Self {
        let (lower, upper) = iter.into_iter().unzip();
        Self::rect(lower, upper)
    }
}

/// Breakpoints along a direction as computed by [`Domain::breakpoints`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breakpoints<T> {
    count: usize,
    min: T,
    max: T,
}

impl<T: RealField> Breakpoints<T> {
    /// Number of variables that hit a bound along the direction.
    pub fn count(&self) -> usize {
        self.count
    }

    /// The smallest breakpoint. Positive infinity if there are none.
    pub fn min(&self) -> T {
        self.min
    }

    /// The largest breakpoint. Positive infinity if there are none.
    pub fn max(&self) -> T {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use nalgebra::{dvector, DVector};

    fn boxed() -> Domain<f64> {
        Domain::rect(vec![0.0, -1.0, f64::NEG_INFINITY], vec![1.0, 1.0, 2.0])
    }

    #[test]
    fn projection_is_idempotent() {
        let dom = boxed();
        let mut x = dvector![3.0, -5.0, 10.0];

        assert!(dom.project(&mut x));
        assert_eq!(x, dvector![1.0, -1.0, 2.0]);

        let projected = x.clone();
        assert!(!dom.project(&mut x));
        assert_eq!(x, projected);
    }

    #[test]
    fn feasible_point_is_unchanged() {
        let dom = boxed();
        let mut x = dvector![0.5, 0.0, -100.0];
        let before = x.clone();

        assert!(dom.is_feasible(&x));
        assert!(!dom.project(&mut x));
        assert_eq!(x, before);
    }

    #[test]
    fn projected_step_stays_feasible() {
        let dom = boxed();
        let x = dvector![0.5, 0.0, 0.0];
        let d = dvector![1.0, -1.0, 1.0];
        let mut s = DVector::zeros(3);

        dom.project_step(&x, &d, 10.0, &mut s);
        assert_eq!(s, dvector![0.5, -1.0, 2.0]);
        assert!(dom.is_feasible(&(x + s)));
    }

    #[test]
    fn breakpoints_skip_zero_direction() {
        let dom = boxed();
        let x = dvector![0.5, 0.0, 0.0];
        let d = dvector![0.0, 2.0, 0.0];

        let brk = dom.breakpoints(&x, &d);
        assert_eq!(brk.count(), 1);
        assert_eq!(brk.min(), 0.5);
        assert_eq!(brk.max(), 0.5);
    }

    #[test]
    fn breakpoints_interior_point_positive() {
        let dom = boxed();
        let x = dvector![0.25, 0.5, 1.0];

        for d in [
            dvector![1.0, 1.0, 1.0],
            dvector![-1.0, -1.0, -1.0],
            dvector![3.0, -0.5, 0.0],
        ] {
            let brk = dom.breakpoints(&x, &d);
            assert!(brk.count() > 0);
            assert!(brk.min() > 0.0);
            assert!(brk.min() <= brk.max());
        }
    }

    #[test]
    fn breakpoints_unbounded_direction() {
        let dom = boxed();
        let x = dvector![0.25, 0.5, 1.0];
        let d = dvector![0.0, 0.0, -1.0];

        let brk = dom.breakpoints(&x, &d);
        assert_eq!(brk.count(), 1);
        assert_eq!(brk.min(), f64::INFINITY);
    }

    #[test]
    fn breakpoints_none() {
        let dom = boxed();
        let x = dvector![1.0, -1.0, 0.0];
        let d = dvector![1.0, -1.0, 0.0];

        let brk = dom.breakpoints(&x, &d);
        assert_eq!(brk.count(), 0);
        assert_eq!(brk.min(), f64::INFINITY);
        assert_eq!(brk.max(), f64::INFINITY);
    }

    #[test]
    fn free_set_respects_gradient_sign() {
        let dom = boxed();
        let x = dvector![0.0, 1.0, 2.0];
        let mut free = IndexSet::with_capacity(3);

        // Steepest descent pushes every variable out of the domain.
        dom.free_set(&x, &dvector![1.0, -1.0, -1.0], &mut free);
        assert!(free.is_empty());

        // Steepest descent points inside for all variables.
        dom.free_set(&x, &dvector![-1.0, 1.0, 1.0], &mut free);
        assert_eq!(free.iter().collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn restrict_keeps_selected_bounds() {
        let dom = boxed();
        let mut set = IndexSet::with_capacity(3);
        set.push(0);
        set.push(2);

        let sub = dom.restrict(&set);
        assert_eq!(sub.dim(), 2);
        assert_eq!(sub.lower(), &dvector![0.0, f64::NEG_INFINITY]);
        assert_eq!(sub.upper(), &dvector![1.0, 2.0]);
    }

    #[test]
    fn from_iterator() {
        let dom: Domain<f64> = [(0.0, 1.0), (-2.0, 2.0)].into_iter().collect();
        assert_eq!(dom.dim(), 2);
        assert!(!dom.is_unconstrained());
        assert!(Domain::<f64>::unconstrained(3).is_unconstrained());
    }

    #[test]
    #[should_panic(expected = "lower bound is greater than upper bound")]
    fn inverted_bounds() {
        Domain::rect(vec![1.0], vec![0.0]);
    }
}
