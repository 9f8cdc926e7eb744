//! Testing objectives and utilities useful for benchmarking, debugging and
//! smoke testing.
//!
//! [`ExtendedRosenbrock`] and [`Sphere`] are recommended for first tests.
//! Others can be used for specific conditions (e.g., singular Hessian matrix
//! or active bounds in the solution).
//!
//! # References
//!
//! \[1\] [A Literature Survey of Benchmark Functions For Global Optimization
//! Problems](https://arxiv.org/abs/1308.4008)
//!
//! \[2\] [Numerical Methods for Unconstrained Optimization and Nonlinear
//! Equations](https://epubs.siam.org/doi/book/10.1137/1.9781611971200)

#![allow(unused)]

use nalgebra::{
    storage::{Storage, StorageMut},
    DMatrix, DVector, Dyn, IsContiguous, OVector, Vector,
};
use approx::RelativeEq;
use num_traits::One;

use crate::algo::tron::{Report, Tron, TronError, TronOptions};
use crate::core::{Domain, Function, Objective, Problem};

/// Extension of the [`Problem`] trait that provides additional information
/// that is useful for testing solvers.
pub trait TestProblem: Problem {
    /// Standard initial values for the problem. Using the same initial values is
    /// essential for fair comparison of methods.
    fn initials(&self) -> Vec<OVector<Self::Field, Dyn>>;
}

/// Extension of the [`Objective`] trait that provides additional information
/// that is useful for testing solvers.
pub trait TestFunction: Objective + TestProblem {
    /// A set of minimizers (if known). This is mostly just for information,
    /// for example to know how close a solver got even if it failed. For
    /// testing if a given point is a minimizer, [`TestFunction::is_optimum`]
    /// should be used.
    fn optima(&self) -> Vec<OVector<Self::Field, Dyn>> {
        Vec::new()
    }

    /// Test if given point is first-order stationary in the domain of the
    /// problem, given the tolerance `eps` for the norm of the projected
    /// gradient.
    fn is_optimum<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>, eps: Self::Field) -> bool
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        let dom = self.domain();
        let x = x.clone_owned();

        let mut g = DVector::zeros(x.nrows());
        self.gradient(&x, &mut g);

        let mut step = DVector::zeros(x.nrows());
        dom.project_step(&x, &g, -Self::Field::one(), &mut step);
        step.norm() <= eps
    }

    /// Test if given point is close to one of the known minimizers, with
    /// both absolute and relative tolerance `eps`. Always false if no
    /// minimizers are known.
    fn is_near_optimum<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>, eps: Self::Field) -> bool
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        let x = x.clone_owned();
        self.optima()
            .iter()
            .any(|optimum| optimum.relative_eq(&x, eps, eps))
    }
}

/// [Extended Rosenbrock
/// function](https://en.wikipedia.org/wiki/Rosenbrock_function) \[1,2\] (also
/// known as Rosenbrock's valley or banana function).
///
/// The global minimum is inside a long, narrow, parabolic shaped flat valley.
/// The challenge is to find the solution inside the valley.
///
/// # References
///
/// \[1\] [A Literature Survey of Benchmark Functions For Global Optimization
/// Problems](https://arxiv.org/abs/1308.4008)
///
/// \[2\] [Numerical Methods for Unconstrained Optimization and Nonlinear
/// Equations](https://epubs.siam.org/doi/book/10.1137/1.9781611971200)
#[derive(Debug, Clone)]
pub struct ExtendedRosenbrock {
    n: usize,
    dom: Domain<f64>,
}

impl ExtendedRosenbrock {
    /// Initializes the function with given dimension.
    ///
    /// The dimension **must** be a multiplier of 2.
    pub fn new(n: usize) -> Self {
        assert!(n > 0, "n must be greater than zero");
        assert!(n % 2 == 0, "n must be a multiple of 2");
        Self {
            n,
            dom: Domain::unconstrained(n),
        }
    }

    /// Initializes the function with given bounds.
    ///
    /// The dimension **must** be a multiplier of 2.
    pub fn with_bounds(lower: Vec<f64>, upper: Vec<f64>) -> Self {
        let dom = Domain::rect(lower, upper);
        let n = dom.dim();
        assert!(n % 2 == 0, "n must be a multiple of 2");
        Self { n, dom }
    }
}

impl Default for ExtendedRosenbrock {
    fn default() -> Self {
        Self::new(2)
    }
}

impl Problem for ExtendedRosenbrock {
    type Field = f64;

    fn domain(&self) -> Domain<Self::Field> {
        self.dom.clone()
    }
}

impl Function for ExtendedRosenbrock {
    fn apply<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        (0..(self.n / 2))
            .map(|i| {
                let x1 = x[2 * i];
                let x2 = x[2 * i + 1];
                100.0 * (x2 - x1 * x1).powi(2) + (1.0 - x1).powi(2)
            })
            .sum()
    }
}

impl Objective for ExtendedRosenbrock {
    fn gradient<Sx, Sg>(&self, x: &Vector<Self::Field, Dyn, Sx>, g: &mut Vector<Self::Field, Dyn, Sg>)
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
        Sg: StorageMut<Self::Field, Dyn>,
    {
        for i in 0..(self.n / 2) {
            let x1 = x[2 * i];
            let x2 = x[2 * i + 1];
            let valley = x2 - x1 * x1;

            g[2 * i] = -400.0 * x1 * valley - 2.0 * (1.0 - x1);
            g[2 * i + 1] = 200.0 * valley;
        }
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
        for i in 0..(self.n / 2) {
            let (i1, i2) = (2 * i, 2 * i + 1);
            let x1 = x[i1];
            let x2 = x[i2];

            let h11 = 1200.0 * x1 * x1 - 400.0 * x2 + 2.0;
            let h12 = -400.0 * x1;
            let h22 = 200.0;

            hv[i1] = h11 * v[i1] + h12 * v[i2];
            hv[i2] = h12 * v[i1] + h22 * v[i2];
        }
    }
}

impl TestProblem for ExtendedRosenbrock {
    fn initials(&self) -> Vec<OVector<Self::Field, Dyn>> {
        let init1 = DVector::from_iterator(
            self.n,
            (0..self.n).map(|i| if i % 2 == 0 { -1.2 } else { 1.0 }),
        );

        let init2 = DVector::from_iterator(
            self.n,
            (0..self.n).map(|i| if i % 2 == 0 { 6.39 } else { -0.221 }),
        );

        vec![init1, init2]
    }
}

impl TestFunction for ExtendedRosenbrock {
    fn optima(&self) -> Vec<OVector<Self::Field, Dyn>> {
        if self.dom.is_unconstrained() {
            vec![DVector::from_element(self.n, 1.0)]
        } else {
            Vec::new()
        }
    }
}

/// Extended Powell function \[1,2\].
///
/// The Hessian matrix is singular in the solution. The Hessian-vector products
/// are approximated by finite differences of the gradient.
///
/// # References
///
/// \[1\] [A Literature Survey of Benchmark Functions For Global Optimization
/// Problems](https://arxiv.org/abs/1308.4008)
///
/// \[2\] [Numerical Methods for Unconstrained Optimization and Nonlinear
/// Equations](https://epubs.siam.org/doi/book/10.1137/1.9781611971200)
#[derive(Debug, Clone, Copy)]
pub struct ExtendedPowell {
    n: usize,
}

impl ExtendedPowell {
    /// Initializes the function with given dimension.
    ///
    /// The dimension **must** be a multiplier of 4.
    pub fn new(n: usize) -> Self {
        assert!(n > 0, "n must be greater than zero");
        assert!(n % 4 == 0, "n must be a multiple of 4");
        Self { n }
    }

    fn residuals<Sx>(x: &Vector<f64, Dyn, Sx>, i: usize) -> [f64; 4]
    where
        Sx: Storage<f64, Dyn>,
    {
        let (x1, x2, x3, x4) = (x[4 * i], x[4 * i + 1], x[4 * i + 2], x[4 * i + 3]);

        [
            x1 + 10.0 * x2,
            5f64.sqrt() * (x3 - x4),
            (x2 - 2.0 * x3).powi(2),
            10f64.sqrt() * (x1 - x4).powi(2),
        ]
    }
}

impl Default for ExtendedPowell {
    fn default() -> Self {
        Self::new(4)
    }
}

impl Problem for ExtendedPowell {
    type Field = f64;

    fn domain(&self) -> Domain<Self::Field> {
        Domain::unconstrained(self.n)
    }
}

impl Function for ExtendedPowell {
    fn apply<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        (0..(self.n / 4))
            .flat_map(|i| Self::residuals(x, i))
            .map(|r| r * r)
            .sum()
    }
}

impl Objective for ExtendedPowell {
    fn gradient<Sx, Sg>(&self, x: &Vector<Self::Field, Dyn, Sx>, g: &mut Vector<Self::Field, Dyn, Sg>)
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
        Sg: StorageMut<Self::Field, Dyn>,
    {
        let sqrt5 = 5f64.sqrt();
        let sqrt10 = 10f64.sqrt();

        for i in 0..(self.n / 4) {
            let [r1, r2, r3, r4] = Self::residuals(x, i);
            let (x1, x2, x3, x4) = (x[4 * i], x[4 * i + 1], x[4 * i + 2], x[4 * i + 3]);

            let d3 = 2.0 * (x2 - 2.0 * x3);
            let d4 = 2.0 * sqrt10 * (x1 - x4);

            g[4 * i] = 2.0 * r1 + 2.0 * r4 * d4;
            g[4 * i + 1] = 20.0 * r1 + 2.0 * r3 * d3;
            g[4 * i + 2] = 2.0 * sqrt5 * r2 - 4.0 * r3 * d3;
            g[4 * i + 3] = -2.0 * sqrt5 * r2 - 2.0 * r4 * d4;
        }
    }
}

impl TestProblem for ExtendedPowell {
    fn initials(&self) -> Vec<OVector<Self::Field, Dyn>> {
        let init = DVector::from_iterator(
            self.n,
            (0..self.n).map(|i| match i % 4 {
                0 => 3.0,
                1 => -1.0,
                2 => 0.0,
                3 => 1.0,
                _ => unreachable!(),
            }),
        );

        vec![init]
    }
}

impl TestFunction for ExtendedPowell {
    fn optima(&self) -> Vec<OVector<Self::Field, Dyn>> {
        vec![DVector::from_element(self.n, 0.0)]
    }
}

/// [Sphere
/// function](https://en.wikipedia.org/wiki/Test_functions_for_optimization)
/// \[1\], scaled by one half so that the Hessian matrix is identity.
///
/// This is a simple paraboloid which can be used in early development and
/// sanity checking as it can be considered a trivial problem.
///
/// # References
///
/// \[1\] [A Literature Survey of Benchmark Functions For Global Optimization
/// Problems](https://arxiv.org/abs/1308.4008)
#[derive(Debug, Clone, Copy)]
pub struct Sphere {
    n: usize,
}

impl Sphere {
    /// Initializes the function with given dimension.
    pub fn new(n: usize) -> Self {
        assert!(n > 0, "n must be greater than zero");
        Self { n }
    }
}

impl Default for Sphere {
    fn default() -> Self {
        Self::new(2)
    }
}

impl Problem for Sphere {
    type Field = f64;

    fn domain(&self) -> Domain<Self::Field> {
        Domain::unconstrained(self.n)
    }
}

impl Function for Sphere {
    fn apply<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        0.5 * x.norm_squared()
    }
}

impl Objective for Sphere {
    fn gradient<Sx, Sg>(&self, x: &Vector<Self::Field, Dyn, Sx>, g: &mut Vector<Self::Field, Dyn, Sg>)
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
        Sg: StorageMut<Self::Field, Dyn>,
    {
        g.copy_from(x);
    }

    fn hess_prod<Sx, Sv, Shv>(
        &self,
        _x: &Vector<Self::Field, Dyn, Sx>,
        v: &Vector<Self::Field, Dyn, Sv>,
        hv: &mut Vector<Self::Field, Dyn, Shv>,
    ) where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
        Sv: Storage<Self::Field, Dyn>,
        Shv: StorageMut<Self::Field, Dyn>,
    {
        hv.copy_from(v);
    }
}

impl TestProblem for Sphere {
    fn initials(&self) -> Vec<OVector<Self::Field, Dyn>> {
        let init = DVector::from_iterator(
            self.n,
            (0..self.n).map(|i| if i % 2 == 0 { 10.0 } else { -10.0 }),
        );

        vec![init]
    }
}

impl TestFunction for Sphere {
    fn optima(&self) -> Vec<OVector<Self::Field, Dyn>> {
        vec![DVector::from_element(self.n, 0.0)]
    }
}

/// Convex quadratic `f(x) = 1/2 x'Ax + b'x` on a box.
///
/// Useful for testing with known solutions and controlled conditioning. The
/// matrix `A` is expected to be symmetric.
#[derive(Debug, Clone)]
pub struct Quadratic {
    a: DMatrix<f64>,
    b: DVector<f64>,
    dom: Domain<f64>,
}

impl Quadratic {
    /// Initializes the function with given matrix, linear term and domain.
    pub fn new(a: DMatrix<f64>, b: DVector<f64>, dom: Domain<f64>) -> Self {
        assert!(a.is_square(), "matrix must be square");
        assert_eq!(a.nrows(), b.nrows(), "dimensions of a and b do not match");
        assert_eq!(a.nrows(), dom.dim(), "dimensions of a and domain do not match");
        Self { a, b, dom }
    }

    /// Diagonal quadratic with given diagonal, the same value `c` in the
    /// linear term and given domain.
    pub fn diagonal(diag: Vec<f64>, c: f64, dom: Domain<f64>) -> Self {
        let n = diag.len();
        Self::new(
            DMatrix::from_diagonal(&DVector::from_vec(diag)),
            DVector::from_element(n, c),
            dom,
        )
    }
}

impl Problem for Quadratic {
    type Field = f64;

    fn domain(&self) -> Domain<Self::Field> {
        self.dom.clone()
    }
}

impl Function for Quadratic {
    fn apply<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        let ax = &self.a * x;
        0.5 * x.dot(&ax) + self.b.dot(x)
    }
}

impl Objective for Quadratic {
    fn gradient<Sx, Sg>(&self, x: &Vector<Self::Field, Dyn, Sx>, g: &mut Vector<Self::Field, Dyn, Sg>)
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
        Sg: StorageMut<Self::Field, Dyn>,
    {
        g.copy_from(&(&self.a * x + &self.b));
    }

    fn hess_prod<Sx, Sv, Shv>(
        &self,
        _x: &Vector<Self::Field, Dyn, Sx>,
        v: &Vector<Self::Field, Dyn, Sv>,
        hv: &mut Vector<Self::Field, Dyn, Shv>,
    ) where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
        Sv: Storage<Self::Field, Dyn>,
        Shv: StorageMut<Self::Field, Dyn>,
    {
        hv.copy_from(&(&self.a * v));
    }
}

impl TestProblem for Quadratic {
    fn initials(&self) -> Vec<OVector<Self::Field, Dyn>> {
        let mut init = DVector::zeros(self.dom.dim());
        self.dom.project(&mut init);
        vec![init]
    }
}

impl TestFunction for Quadratic {}

/// Linear function `f(x) = c'x` on a box.
///
/// The minimum is attained in a vertex of the box if it is bounded in the
/// direction of `-c`, otherwise the function is unbounded below.
#[derive(Debug, Clone)]
pub struct Linear {
    c: DVector<f64>,
    dom: Domain<f64>,
}

impl Linear {
    /// Initializes the function with given coefficients and domain.
    pub fn new(c: Vec<f64>, dom: Domain<f64>) -> Self {
        assert_eq!(c.len(), dom.dim(), "dimensions of c and domain do not match");
        Self {
            c: DVector::from_vec(c),
            dom,
        }
    }
}

impl Problem for Linear {
    type Field = f64;

    fn domain(&self) -> Domain<Self::Field> {
        self.dom.clone()
    }
}

impl Function for Linear {
    fn apply<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
    {
        self.c.dot(x)
    }
}

impl Objective for Linear {
    fn gradient<Sx, Sg>(&self, _x: &Vector<Self::Field, Dyn, Sx>, g: &mut Vector<Self::Field, Dyn, Sg>)
    where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
        Sg: StorageMut<Self::Field, Dyn>,
    {
        g.copy_from(&self.c);
    }

    fn hess_prod<Sx, Sv, Shv>(
        &self,
        _x: &Vector<Self::Field, Dyn, Sx>,
        _v: &Vector<Self::Field, Dyn, Sv>,
        hv: &mut Vector<Self::Field, Dyn, Shv>,
    ) where
        Sx: Storage<Self::Field, Dyn> + IsContiguous,
        Sv: Storage<Self::Field, Dyn>,
        Shv: StorageMut<Self::Field, Dyn>,
    {
        hv.fill(0.0);
    }
}

impl TestProblem for Linear {
    fn initials(&self) -> Vec<OVector<Self::Field, Dyn>> {
        let mut init = DVector::zeros(self.dom.dim());
        self.dom.project(&mut init);
        vec![init]
    }
}

impl TestFunction for Linear {}

/// A simple solver driver that can be used in tests.
///
/// Runs [`Tron`] with given options from `x` and returns the final point
/// together with the report.
pub fn minimize<F: TestFunction>(
    f: &F,
    dom: &Domain<F::Field>,
    mut x: OVector<F::Field, Dyn>,
    options: TronOptions<F::Field>,
) -> Result<(OVector<F::Field, Dyn>, Report<F::Field>), TronError> {
    let mut solver = Tron::with_options(f, dom, options);
    let report = solver.solve(f, dom, &mut x, |_, _, _| {})?;
    Ok((x, report))
}
