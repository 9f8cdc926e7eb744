//! High-level API for minimization.
//!
//! This module contains the driver that encapsulates the solver, the domain
//! and the current point and provides a simple API to run the minimization.
//!
//! The simplest way of using the driver is to initialize it with the defaults:
//!
//! ```rust
//! use tron::TronDriver;
//! # use tron::nalgebra as na;
//! # use tron::{Domain, Function, Objective, Problem};
//! # use na::{Dyn, IsContiguous};
//! #
//! # struct MyObjective;
//! #
//! # impl MyObjective {
//! #     fn new() -> Self {
//! #         Self
//! #     }
//! # }
//! #
//! # impl Problem for MyObjective {
//! #     type Field = f64;
//! #
//! #     fn domain(&self) -> Domain<Self::Field> {
//! #         Domain::unconstrained(2)
//! #     }
//! # }
//! #
//! # impl Function for MyObjective {
//! #     fn apply<Sx>(&self, x: &na::Vector<f64, Dyn, Sx>) -> f64
//! #     where
//! #         Sx: na::storage::Storage<f64, Dyn> + IsContiguous,
//! #     {
//! #         x.norm_squared()
//! #     }
//! # }
//! #
//! # impl Objective for MyObjective {
//! #     fn gradient<Sx, Sg>(&self, x: &na::Vector<f64, Dyn, Sx>, g: &mut na::Vector<f64, Dyn, Sg>)
//! #     where
//! #         Sx: na::storage::Storage<f64, Dyn> + IsContiguous,
//! #         Sg: na::storage::StorageMut<f64, Dyn>,
//! #     {
//! #         g.copy_from(&(x * 2.0));
//! #     }
//! # }
//!
//! let f = MyObjective::new();
//!
//! let mut driver = TronDriver::new(&f);
//! ```
//!
//! If you need to specify additional settings, use the builder:
//!
//! ```rust
//! use tron::{algo::tron::TronOptions, TronDriver};
//! # use tron::nalgebra as na;
//! # use tron::{Domain, Function, Objective, Problem};
//! # use na::{Dyn, IsContiguous};
//! #
//! # struct MyObjective;
//! #
//! # impl MyObjective {
//! #     fn new() -> Self {
//! #         Self
//! #     }
//! # }
//! #
//! # impl Problem for MyObjective {
//! #     type Field = f64;
//! #
//! #     fn domain(&self) -> Domain<Self::Field> {
//! #         Domain::unconstrained(2)
//! #     }
//! # }
//! #
//! # impl Function for MyObjective {
//! #     fn apply<Sx>(&self, x: &na::Vector<f64, Dyn, Sx>) -> f64
//! #     where
//! #         Sx: na::storage::Storage<f64, Dyn> + IsContiguous,
//! #     {
//! #         x.norm_squared()
//! #     }
//! # }
//! #
//! # impl Objective for MyObjective {
//! #     fn gradient<Sx, Sg>(&self, x: &na::Vector<f64, Dyn, Sx>, g: &mut na::Vector<f64, Dyn, Sg>)
//! #     where
//! #         Sx: na::storage::Storage<f64, Dyn> + IsContiguous,
//! #         Sg: na::storage::StorageMut<f64, Dyn>,
//! #     {
//! #         g.copy_from(&(x * 2.0));
//! #     }
//! # }
//!
//! let f = MyObjective::new();
//!
//! let mut options = TronOptions::default();
//! options.set_max_iter(100);
//!
//! let mut driver = TronDriver::builder(&f)
//!     .with_initial(vec![10.0, -10.0])
//!     .with_options(options)
//!     .with_quasi_newton(5)
//!     .build();
//! ```
//!
//! Once you have the driver, you can use it to find the minimum:
//!
//! ```rust
//! # use tron::nalgebra as na;
//! # use tron::{Domain, Function, Objective, Problem, TronDriver};
//! # use na::{Dyn, IsContiguous};
//! #
//! # struct MyObjective;
//! #
//! # impl Problem for MyObjective {
//! #     type Field = f64;
//! #
//! #     fn domain(&self) -> Domain<Self::Field> {
//! #         Domain::unconstrained(2)
//! #     }
//! # }
//! #
//! # impl Function for MyObjective {
//! #     fn apply<Sx>(&self, x: &na::Vector<f64, Dyn, Sx>) -> f64
//! #     where
//! #         Sx: na::storage::Storage<f64, Dyn> + IsContiguous,
//! #     {
//! #         x.norm_squared()
//! #     }
//! # }
//! #
//! # impl Objective for MyObjective {
//! #     fn gradient<Sx, Sg>(&self, x: &na::Vector<f64, Dyn, Sx>, g: &mut na::Vector<f64, Dyn, Sg>)
//! #     where
//! #         Sx: na::storage::Storage<f64, Dyn> + IsContiguous,
//! #         Sg: na::storage::StorageMut<f64, Dyn>,
//! #     {
//! #         g.copy_from(&(x * 2.0));
//! #     }
//! # }
//! #
//! # let f = MyObjective;
//! #
//! # let mut driver = TronDriver::builder(&f).with_initial(vec![1.0, 1.0]).build();
//! #
//! let result = driver.find(|report| report.objective() <= 1e-12 || report.iter() >= 100);
//! ```
//!
//! Stopping from the criterion is reported as [`Status::User`]. Without any
//! additional criterion, use [`TronDriver::run`].

use nalgebra::{convert, DVector};

use crate::{
    algo::tron::{Report, Status, Tron, TronError, TronOptions},
    krylov::{SteihaugCg, Subsolver},
    Domain, Objective, Problem,
};

/// Builder for the [`TronDriver`].
pub struct TronBuilder<'a, F: Objective, S> {
    f: &'a F,
    dom: Domain<F::Field>,
    options: TronOptions<F::Field>,
    memory: Option<usize>,
    subsolver: S,
    x0: DVector<F::Field>,
}

impl<'a, F: Objective> TronBuilder<'a, F, SteihaugCg<F::Field>> {
    fn new(f: &'a F) -> Self {
        let dom = f.domain();
        let x0 = DVector::from_element(dom.dim(), convert(0.0));

        Self {
            f,
            dom,
            options: TronOptions::default(),
            memory: None,
            subsolver: SteihaugCg::new(),
            x0,
        }
    }
}

impl<'a, F: Objective, S: Subsolver<F::Field>> TronBuilder<'a, F, S> {
    /// Sets the initial point from which the iterative process starts.
    pub fn with_initial(mut self, x0: Vec<F::Field>) -> Self {
        self.x0 = DVector::from_vec(x0);
        self
    }

    /// Sets the options of the solver.
    pub fn with_options(mut self, options: TronOptions<F::Field>) -> Self {
        self.options = options;
        self
    }

    /// Uses limited-memory BFGS approximation of the Hessian matrix storing
    /// `memory` pairs instead of the Hessian-vector products of the
    /// objective.
    pub fn with_quasi_newton(mut self, memory: usize) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Sets the subsolver for the reduced Newton systems.
    pub fn with_subsolver<S2: Subsolver<F::Field>>(self, subsolver: S2) -> TronBuilder<'a, F, S2> {
        TronBuilder {
            f: self.f,
            dom: self.dom,
            options: self.options,
            memory: self.memory,
            subsolver,
            x0: self.x0,
        }
    }

    /// Builds the [`TronDriver`].
    pub fn build(self) -> TronDriver<'a, F, S> {
        let Self {
            f,
            dom,
            options,
            memory,
            subsolver,
            mut x0,
        } = self;

        if x0.nrows() == dom.dim() {
            dom.project(&mut x0);
        }

        let mut algo = Tron::with_options(f, &dom, options).with_subsolver(subsolver);

        if let Some(memory) = memory {
            algo = algo.with_quasi_newton(memory);
        }

        TronDriver {
            f,
            dom,
            algo,
            x: x0,
            report: None,
        }
    }
}

/// The driver for the process of minimization.
///
/// For default settings, use [`TronDriver::new`]. For more flexibility, use
/// [`TronDriver::builder`]. For the usage of the driver, see [module](self)
/// documentation.
pub struct TronDriver<'a, F: Objective, S = SteihaugCg<<F as Problem>::Field>> {
    f: &'a F,
    dom: Domain<F::Field>,
    algo: Tron<F, S>,
    x: DVector<F::Field>,
    report: Option<Report<F::Field>>,
}

impl<'a, F: Objective> TronDriver<'a, F> {
    /// Returns the builder for specifying additional settings.
    pub fn builder(f: &'a F) -> TronBuilder<'a, F, SteihaugCg<F::Field>> {
        TronBuilder::new(f)
    }

    /// Initializes the driver with the default settings.
    pub fn new(f: &'a F) -> Self {
        TronDriver::builder(f).build()
    }
}

impl<'a, F: Objective, S: Subsolver<F::Field>> TronDriver<'a, F, S> {
    /// Returns reference to the current point.
    pub fn x(&self) -> &[F::Field] {
        self.x.as_slice()
    }

    /// Returns the function value in the current point, if the minimization
    /// has already been run.
    pub fn fx(&self) -> Option<F::Field> {
        self.report.as_ref().map(|report| report.objective())
    }

    /// Returns the report of the last run.
    pub fn report(&self) -> Option<&Report<F::Field>> {
        self.report.as_ref()
    }

    /// Runs the minimization until the solver terminates or given stopping
    /// criterion is satisfied.
    ///
    /// The criterion is checked after the initial evaluation and every
    /// iteration. Running the process again continues from the current point.
    pub fn find<C>(&mut self, mut stop: C) -> Result<(&[F::Field], F::Field), TronError>
    where
        C: FnMut(&Report<F::Field>) -> bool,
    {
        let report = self.algo.solve(self.f, &self.dom, &mut self.x, |_, _, report| {
            if stop(report) {
                report.set_status(Status::User);
            }
        })?;

        let fx = report.objective();
        self.report = Some(report);

        Ok((self.x.as_slice(), fx))
    }

    /// Runs the minimization until the solver terminates.
    pub fn run(&mut self) -> Result<(&[F::Field], F::Field), TronError> {
        self.find(|_| false)
    }

    /// Returns the name of the solver.
    pub fn name(&self) -> &str {
        Tron::<F, S>::NAME
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        krylov::SteihaugCg,
        testing::{ExtendedRosenbrock, Linear, Sphere},
    };

    use super::*;

    #[test]
    fn basic_use_case() {
        let f = Sphere::new(4);
        let mut driver = TronDriver::builder(&f)
            // Zeros are the minimum for sphere, there would be no point is
            // such test.
            .with_initial(vec![10.0; 4])
            .build();

        let (x, value) = driver.run().unwrap();

        assert!(value <= 1e-12);
        assert!(x.iter().all(|xi| xi.abs() <= 1e-6));
        assert_eq!(driver.report().unwrap().status(), Status::FirstOrder);
    }

    #[test]
    fn quasi_newton() {
        let f = ExtendedRosenbrock::new(2);
        let mut options = TronOptions::default();
        options.set_max_iter(1000);

        let mut driver = TronDriver::builder(&f)
            .with_initial(vec![-1.2, 1.0])
            .with_options(options)
            .with_quasi_newton(5)
            .build();

        let x = driver.run().unwrap().0.to_vec();

        assert_eq!(driver.report().unwrap().status(), Status::FirstOrder);
        assert!((x[0] - 1.0).abs() <= 1e-3);
        assert!((x[1] - 1.0).abs() <= 1e-3);
        assert_eq!(driver.report().unwrap().evals().hprod(), 0);
    }

    #[test]
    fn custom_subsolver() {
        let f = Sphere::new(2);
        let mut driver = TronDriver::builder(&f)
            .with_subsolver(SteihaugCg::new())
            .with_initial(vec![3.0, -4.0])
            .build();

        let (_, value) = driver.run().unwrap();
        assert!(value <= 1e-12);
    }

    #[test]
    fn stopping_criterion() {
        let f = ExtendedRosenbrock::new(2);
        let mut driver = TronDriver::builder(&f)
            .with_initial(vec![-1.2, 1.0])
            .build();

        driver.find(|report| report.iter() >= 2).unwrap();

        let report = driver.report().unwrap();
        assert_eq!(report.status(), Status::User);
        assert_eq!(report.iter(), 2);
        assert_eq!(driver.fx(), Some(report.objective()));
    }

    #[test]
    fn initial() {
        let x0 = vec![10.0; 4];

        let f = Sphere::new(4);
        let driver = TronDriver::builder(&f).with_initial(x0.clone()).build();

        assert_eq!(driver.x(), &x0);
        assert_eq!(driver.fx(), None);
    }

    #[test]
    fn initial_in_domain() {
        let f = Linear::new(vec![0.0, 0.0], Domain::rect(vec![0.0, 0.0], vec![1.0, 1.0]));
        let driver = TronDriver::builder(&f)
            .with_initial(vec![10.0, -10.0])
            .build();

        assert_eq!(driver.x(), &[1.0, 0.0]);
    }

    #[test]
    fn invalid_initial() {
        let f = Sphere::new(2);
        let mut driver = TronDriver::builder(&f)
            .with_initial(vec![1.0, 2.0, 3.0])
            .build();

        assert!(driver.run().is_err());
    }

    #[test]
    fn name() {
        let f = Sphere::new(2);
        let driver = TronDriver::new(&f);
        assert_eq!(driver.name(), "TRON");
    }
}
