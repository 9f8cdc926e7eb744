use nalgebra::{
    storage::{Storage, StorageMut},
    Dyn, IsContiguous, Vector,
};

use super::base::Problem;
use crate::derivatives;

/// The trait for defining functions.
///
/// ## Defining a function
///
/// A function is any type that implements [`Function`] and [`Problem`] traits.
/// There is one required associated type (field) and one required method
/// ([`apply`](Function::apply)).
///
/// ```rust
/// use tron::nalgebra as na;
/// use tron::{Domain, Function, Problem};
/// use na::{Dyn, IsContiguous};
///
/// // A problem is represented by a type.
/// struct Rosenbrock {
///     a: f64,
///     b: f64,
/// }
///
/// impl Problem for Rosenbrock {
///     // The numeric type. Usually f64 or f32.
///     type Field = f64;
///
///     // Specification for the domain. At the very least, the dimension
///     // must be known.
///     fn domain(&self) -> Domain<Self::Field> {
///         Domain::unconstrained(2)
///     }
/// }
///
/// impl Function for Rosenbrock {
///     // Apply trial values of variables to the function.
///     fn apply<Sx>(&self, x: &na::Vector<Self::Field, Dyn, Sx>) -> Self::Field
///     where
///         Sx: na::storage::Storage<Self::Field, Dyn> + IsContiguous,
///     {
///         // Compute the function value.
///         (self.a - x[0]).powi(2) + self.b * (x[1] - x[0].powi(2)).powi(2)
///     }
/// }
/// ```
pub trait Function: Problem {
    /// Calculates the function value given values of the variables.
    fn apply<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous;
}

/// The trait for smooth objectives with derivatives.
///
/// Newton-type methods need the gradient and access to the Hessian matrix.
/// The Hessian is never formed, only Hessian-vector products are requested.
/// The default implementation of [`hess_prod`](Objective::hess_prod) uses
/// forward differences of the gradient, which is usually good enough in
/// practice, but an analytic product makes the algorithms more reliable.
///
/// If even the gradient is not available, wrap the function into
/// [`FiniteDifference`](crate::derivatives::FiniteDifference).
///
/// ```rust
/// use tron::nalgebra as na;
/// use tron::{Domain, Function, Objective, Problem};
/// use na::{storage::{Storage, StorageMut}, Dyn, IsContiguous};
///
/// struct Paraboloid;
///
/// impl Problem for Paraboloid {
///     type Field = f64;
///
///     fn domain(&self) -> Domain<Self::Field> {
///         [(1.0, 2.0), (-1.0, 1.0)].into_iter().collect()
///     }
/// }
///
/// impl Function for Paraboloid {
///     fn apply<Sx>(&self, x: &na::Vector<f64, Dyn, Sx>) -> f64
///     where
///         Sx: Storage<f64, Dyn> + IsContiguous,
///     {
///         x[0].powi(2) + 3.0 * x[1].powi(2)
///     }
/// }
///
/// impl Objective for Paraboloid {
///     fn gradient<Sx, Sg>(&self, x: &na::Vector<f64, Dyn, Sx>, g: &mut na::Vector<f64, Dyn, Sg>)
///     where
///         Sx: Storage<f64, Dyn> + IsContiguous,
///         Sg: StorageMut<f64, Dyn>,
///     {
///         g[0] = 2.0 * x[0];
///         g[1] = 6.0 * x[1];
///     }
///
///     fn hess_prod<Sx, Sv, Shv>(
///         &self,
///         _x: &na::Vector<f64, Dyn, Sx>,
///         v: &na::Vector<f64, Dyn, Sv>,
///         hv: &mut na::Vector<f64, Dyn, Shv>,
///     ) where
///         Sx: Storage<f64, Dyn> + IsContiguous,
///         Sv: Storage<f64, Dyn>,
///         Shv: StorageMut<f64, Dyn>,
///     {
///         hv[0] = 2.0 * v[0];
///         hv[1] = 6.0 * v[1];
///     }
/// }
/// ```
pub trait Objective: Function {
    /// Calculates the gradient given values of the variables.
    fn gradient<Sx, Sg>(&self, x: &Vector<Self::Field, Dyn, Sx>, g: &mut Vector<Self::Field, Dyn, Sg>)
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
        Sg: StorageMut<Self::Field, Dyn>;

    /// Calculates both the function value and the gradient.
    ///
    /// Override this method if the two share a substantial part of the
    /// computation.
    fn apply_gradient<Sx, Sg>(
        &self,
        x: &Vector<Self::Field, Dyn, Sx>,
        g: &mut Vector<Self::Field, Dyn, Sg>,
    ) -> Self::Field
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
        Sg: StorageMut<Self::Field, Dyn>,
    {
        self.gradient(x, g);
        self.apply(x)
    }

    /// Calculates the product of the Hessian matrix in point `x` with vector
    /// `v`.
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
        derivatives::hess_prod_forward(self, x, v, hv);
    }
}
