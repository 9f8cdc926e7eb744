//! Tools for derivative-based methods.
//!
//! Newton-type methods need first and second order information about the
//! objective. When it is not available analytically, it is approximated by
//! finite differences.

use nalgebra::{
    storage::{Storage, StorageMut},
    ComplexField as _, DVector, Dyn, IsContiguous, RealField as _, Vector,
};
use num_traits::{One, Zero};

use crate::core::{Domain, Function, Objective, Problem, RealField, Sense};

/// Approximates the product of the Hessian matrix with vector `v` by forward
/// difference of gradients.
///
/// This is the default implementation of [`Objective::hess_prod`].
pub fn hess_prod_forward<F, Sx, Sv, Shv>(
    f: &F,
    x: &Vector<F::Field, Dyn, Sx>,
    v: &Vector<F::Field, Dyn, Sv>,
    hv: &mut Vector<F::Field, Dyn, Shv>,
) where
    F: Objective + ?Sized,
    Sx: Storage<F::Field, Dyn> + IsContiguous,
    Sv: Storage<F::Field, Dyn>,
    Shv: StorageMut<F::Field, Dyn>,
{
    hess_prod_with(f, x, v, hv, F::Field::EPSILON_SQRT);
}

fn hess_prod_with<F, Sx, Sv, Shv>(
    f: &F,
    x: &Vector<F::Field, Dyn, Sx>,
    v: &Vector<F::Field, Dyn, Sv>,
    hv: &mut Vector<F::Field, Dyn, Shv>,
    eps: F::Field,
) where
    F: Objective + ?Sized,
    Sx: Storage<F::Field, Dyn> + IsContiguous,
    Sv: Storage<F::Field, Dyn>,
    Shv: StorageMut<F::Field, Dyn>,
{
    let v_norm = v.norm();

    if v_norm == F::Field::zero() {
        hv.fill(F::Field::zero());
        return;
    }

    // Relative to the magnitude of x, normalized by the norm of v.
    let step = eps * (F::Field::one() + x.norm()) / v_norm;

    let n = x.nrows();
    let mut g = DVector::zeros(n);
    let mut g_step = DVector::zeros(n);
    let mut x_step = x.clone_owned();
    x_step.axpy(step, v, F::Field::one());

    f.gradient(x, &mut g);
    f.gradient(&x_step, &mut g_step);

    for i in 0..n {
        hv[i] = (g_step[i] - g[i]) / step;
    }
}

/// Computes the gradient of the function in given point by forward
/// differences, given the function value `fx` in that point.
pub fn gradient_forward<F, Sx, Sg>(
    f: &F,
    x: &Vector<F::Field, Dyn, Sx>,
    fx: F::Field,
    g: &mut Vector<F::Field, Dyn, Sg>,
) where
    F: Function + ?Sized,
    Sx: Storage<F::Field, Dyn> + IsContiguous,
    Sg: StorageMut<F::Field, Dyn>,
{
    let eps = F::Field::EPSILON_SQRT;
    let mut x = x.clone_owned();

    for i in 0..x.nrows() {
        let xi = x[i];

        // Compute the step size. We would like to have the step as small as
        // possible to be close to the real derivative. But at the same time,
        // very small step could cause f(x + e_i * step_i) ~= f(x) with very
        // small number of good digits.
        //
        // A reasonable way to balance these competing needs is to scale the
        // step by x_i itself. To avoid problems when x_i is close to zero,
        // the magnitude is at least one.
        let step = eps * xi.abs().max(F::Field::one()) * F::Field::one().copysign(xi);
        let step = if step == F::Field::zero() { eps } else { step };

        x[i] = xi + step;
        let fxi = f.apply(&x);

        // g[i] = (f(x + e_i * step_i) - f(x)) / step_i.
        g[i] = (fxi - fx) / step;

        x[i] = xi;
    }
}

/// Turns a [`Function`] into an [`Objective`] using finite differences.
///
/// The gradient is approximated by forward differences of function values
/// and the Hessian-vector product by forward differences of the approximate
/// gradients. This costs `n + 1` function evaluations per gradient and is
/// inherently less accurate than analytic derivatives.
///
/// ```rust
/// use tron::derivatives::FiniteDifference;
/// use tron::nalgebra as na;
/// use tron::{Domain, Function, Objective, Problem};
/// use na::{storage::Storage, Dyn, IsContiguous};
///
/// struct Parabola;
///
/// impl Problem for Parabola {
///     type Field = f64;
///
///     fn domain(&self) -> Domain<Self::Field> {
///         Domain::unconstrained(1)
///     }
/// }
///
/// impl Function for Parabola {
///     fn apply<Sx>(&self, x: &na::Vector<f64, Dyn, Sx>) -> f64
///     where
///         Sx: Storage<f64, Dyn> + IsContiguous,
///     {
///         (x[0] - 1.0).powi(2)
///     }
/// }
///
/// let f = FiniteDifference::new(&Parabola);
/// let mut g = na::dvector![0.0];
/// f.gradient(&na::dvector![3.0], &mut g);
///
/// assert!((g[0] - 4.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FiniteDifference<'f, F> {
    f: &'f F,
}

impl<'f, F: Function> FiniteDifference<'f, F> {
    /// Wraps the function.
    pub fn new(f: &'f F) -> Self {
        Self { f }
    }
}

impl<'f, F: Function> Problem for FiniteDifference<'f, F> {
    type Field = F::Field;

    fn domain(&self) -> Domain<Self::Field> {
        self.f.domain()
    }

    fn sense(&self) -> Sense {
        self.f.sense()
    }

    fn has_general_constraints(&self) -> bool {
        self.f.has_general_constraints()
    }
}

impl<'f, F: Function> Function for FiniteDifference<'f, F> {
    fn apply<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        self.f.apply(x)
    }
}

impl<'f, F: Function> Objective for FiniteDifference<'f, F> {
    fn gradient<Sx, Sg>(&self, x: &Vector<Self::Field, Dyn, Sx>, g: &mut Vector<Self::Field, Dyn, Sg>)
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
        Sg: StorageMut<Self::Field, Dyn>,
    {
        let fx = self.f.apply(x);
        gradient_forward(self.f, x, fx, g);
    }

    fn apply_gradient<Sx, Sg>(
        &self,
        x: &Vector<Self::Field, Dyn, Sx>,
        g: &mut Vector<Self::Field, Dyn, Sg>,
    ) -> Self::Field
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
        Sg: StorageMut<Self::Field, Dyn>,
    {
        let fx = self.f.apply(x);
        gradient_forward(self.f, x, fx, g);
        fx
    }

    fn hess_prod<Sx, Sv, Shv>(
        &self,
        x: &Vector<Self::Field, Dyn, Sx>,
        v: &Vector<Self::Field, Dyn, Sv>,
        hv: &mut Vector<Self::Field, Dyn, Shv>,
    ) where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
        Sv: Storage<Self::Field, Dyn>,
        Shv: StorageMut<Self::Field, Dyn>,
    {
        // Differences of already approximated gradients need a larger step.
        hess_prod_with(self, x, v, hv, Self::Field::EPSILON_CBRT);
    }
}
