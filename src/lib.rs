#![allow(clippy::many_single_char_names)]
#![allow(clippy::type_complexity)]
#![warn(missing_docs)]

//! # TRON
//!
//! A pure Rust implementation of the trust-region Newton method for
//! bound-constrained minimization by Lin and Moré.
//!
//! The method is suitable for large problems. The Hessian matrix is never
//! formed, only its products with vectors are requested, and they can be
//! computed analytically, approximated by finite differences of the gradient
//! or replaced by a limited-memory quasi-Newton approximation. Bound
//! constraints for variables are supported first-class, the iterates always
//! stay in the domain.
//!
//! ## Algorithm
//!
//! * [TRON](algo::tron) -- Projected Newton method with a trust region. Each
//!   iteration finds a Cauchy point along the projected gradient path and
//!   refines it by a conjugate gradient method on the free variables.
//!
//! ## Problem
//!
//! The problem of bound-constrained minimization is about finding values of
//! *n* variables that minimize a smooth function, while every variable stays
//! within its bounds.
//!
//! Mathematically, the problem is formulated as
//!
//! ```text
//! min f(x)
//!
//! subject to Li <= xi <= Ui for every i
//! ```
//!
//! The bounds can be negative/positive infinity, effectively making the
//! variable unconstrained.
//!
//! More sophisticated constraints (such as (in)equalities consisting of
//! multiple variables) are out of the scope of this library.
//!
//! When it comes to code, the problem is any type that implements the
//! [`Objective`], [`Function`] and [`Problem`] traits.
//!
//! ```rust
//! // TRON is based on `nalgebra` crate.
//! use tron::nalgebra as na;
//! use tron::{Domain, Function, Objective, Problem};
//! use na::{Dyn, IsContiguous};
//!
//! // A problem is represented by a type.
//! struct Rosenbrock {
//!     a: f64,
//!     b: f64,
//! }
//!
//! impl Problem for Rosenbrock {
//!     // The numeric type. Usually f64 or f32.
//!     type Field = f64;
//!
//!     // Specification for the domain. At the very least, the dimension
//!     // must be known.
//!     fn domain(&self) -> Domain<Self::Field> {
//!         Domain::unconstrained(2)
//!     }
//! }
//!
//! impl Function for Rosenbrock {
//!     // Evaluate the function in trial values of variables.
//!     fn apply<Sx>(&self, x: &na::Vector<Self::Field, Dyn, Sx>) -> Self::Field
//!     where
//!         Sx: na::storage::Storage<Self::Field, Dyn> + IsContiguous,
//!     {
//!         (self.a - x[0]).powi(2) + self.b * (x[1] - x[0].powi(2)).powi(2)
//!     }
//! }
//!
//! impl Objective for Rosenbrock {
//!     // Evaluate the gradient in trial values of variables.
//!     fn gradient<Sx, Sg>(
//!         &self,
//!         x: &na::Vector<Self::Field, Dyn, Sx>,
//!         g: &mut na::Vector<Self::Field, Dyn, Sg>,
//!     ) where
//!         Sx: na::storage::Storage<Self::Field, Dyn> + IsContiguous,
//!         Sg: na::storage::StorageMut<Self::Field, Dyn>,
//!     {
//!         let valley = x[1] - x[0].powi(2);
//!         g[0] = -2.0 * (self.a - x[0]) - 4.0 * self.b * x[0] * valley;
//!         g[1] = 2.0 * self.b * valley;
//!     }
//! }
//! ```
//!
//! The Hessian-vector products are approximated by finite differences of the
//! gradient unless [`Objective::hess_prod`] is overridden. If even the
//! gradient is not available, wrap the [`Function`] into
//! [`FiniteDifference`](derivatives::FiniteDifference).
//!
//! The previous example used unconstrained variables, but it is also
//! possible to specify bounds.
//!
//! ```rust
//! # use tron::nalgebra as na;
//! # use tron::*;
//! #
//! # struct Rosenbrock {
//! #     a: f64,
//! #     b: f64,
//! # }
//! #
//! impl Problem for Rosenbrock {
//! #     type Field = f64;
//!     // ...
//!
//!     fn domain(&self) -> Domain<Self::Field> {
//!         [(-10.0, 0.5), (-10.0, 10.0)].into_iter().collect()
//!     }
//! }
//! ```
//!
//! ## Solving
//!
//! When you have your objective available, you can use the [`TronDriver`] to
//! run the minimization until the solver terminates.
//!
//! ```rust
//! use tron::TronDriver;
//! # use tron::nalgebra as na;
//! # use tron::{Domain, Function, Objective, Problem};
//! # use na::{Dyn, IsContiguous};
//! #
//! # struct Rosenbrock {
//! #     a: f64,
//! #     b: f64,
//! # }
//! #
//! # impl Problem for Rosenbrock {
//! #     type Field = f64;
//! #
//! #     fn domain(&self) -> Domain<Self::Field> {
//! #         Domain::unconstrained(2)
//! #     }
//! # }
//! #
//! # impl Function for Rosenbrock {
//! #     fn apply<Sx>(&self, x: &na::Vector<Self::Field, Dyn, Sx>) -> Self::Field
//! #     where
//! #         Sx: na::storage::Storage<Self::Field, Dyn> + IsContiguous,
//! #     {
//! #         (self.a - x[0]).powi(2) + self.b * (x[1] - x[0].powi(2)).powi(2)
//! #     }
//! # }
//! #
//! # impl Objective for Rosenbrock {
//! #     fn gradient<Sx, Sg>(
//! #         &self,
//! #         x: &na::Vector<Self::Field, Dyn, Sx>,
//! #         g: &mut na::Vector<Self::Field, Dyn, Sg>,
//! #     ) where
//! #         Sx: na::storage::Storage<Self::Field, Dyn> + IsContiguous,
//! #         Sg: na::storage::StorageMut<Self::Field, Dyn>,
//! #     {
//! #         let valley = x[1] - x[0].powi(2);
//! #         g[0] = -2.0 * (self.a - x[0]) - 4.0 * self.b * x[0] * valley;
//! #         g[1] = 2.0 * self.b * valley;
//! #     }
//! # }
//!
//! let f = Rosenbrock { a: 1.0, b: 100.0 };
//! let mut driver = TronDriver::builder(&f)
//!     .with_initial(vec![-1.2, 1.0])
//!     .build();
//!
//! let (x, fx) = driver
//!     .find(|report| {
//!         println!(
//!             "iter = {}\tf = {}\t|| P(g) || = {}",
//!             report.iter(),
//!             report.objective(),
//!             report.dual_feas(),
//!         );
//!         report.iter() >= 100
//!     })
//!     .expect("invalid problem");
//!
//! println!("f({:?}) = {}", x, fx);
//!
//! if driver.report().unwrap().status().is_success() {
//!     println!("solved");
//! }
//! ```
//!
//! For full control over the process, use [`Tron`](algo::Tron) directly.
//!
//! ## License
//!
//! Licensed under MIT.

pub mod algo;
mod core;
pub mod derivatives;
pub mod driver;
pub mod krylov;
pub mod quasi_newton;

pub use core::*;
pub use driver::TronDriver;

#[cfg(feature = "testing")]
pub mod testing;

#[cfg(not(feature = "testing"))]
pub(crate) mod testing;

pub use nalgebra;
