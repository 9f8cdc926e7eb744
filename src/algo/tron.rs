//! Trust-region Newton method for bound-constrained minimization.
//!
//! TRON by Lin and Moré minimizes a smooth function subject to bounds `l <= x
//! <= u`. Each iteration builds a quadratic model of the objective from the
//! gradient and Hessian-vector products and
//!
//! 1. finds the generalized Cauchy point along the projected steepest
//!    descent path, which guarantees sufficient decrease of the model and
//!    identifies the active constraints,
//! 2. refines the step by a projected Newton method on the free variables,
//!    where the reduced Newton system is solved approximately by a truncated
//!    conjugate gradient method within the trust region,
//! 3. compares the actual and predicted reduction to accept or reject the
//!    step and to update the trust region radius.
//!
//! The Hessian matrix is never formed. It is accessed either through the
//! [`hess_prod`](crate::Objective::hess_prod) of the objective or replaced by
//! a limited-memory quasi-Newton approximation (see [`HessianModel`]).
//!
//! # References
//!
//! \[1\] [Newton's Method for Large Bound-Constrained Optimization
//! Problems](https://doi.org/10.1137/S1052623498345075)
//!
//! \[2\] [Numerical
//! Optimization](https://link.springer.com/book/10.1007/978-0-387-40065-5)

mod cauchy;
mod line_search;
mod newton;
mod region;

use std::fmt;
use std::time::{Duration, Instant};

use getset::{CopyGetters, MutGetters, Setters};
use log::{debug, info, warn};
use nalgebra::{convert, try_convert, ComplexField as _, DVector, RealField as _};
use num_traits::{One, Zero};
use thiserror::Error;

use crate::{
    core::{check_problem, Domain, LinearOperator, Objective, Problem, ProblemError, RealField},
    krylov::{SteihaugCg, Subsolver},
    quasi_newton::Lbfgs,
};

use cauchy::{cauchy_point, CauchyParams, CauchyStatus};
use newton::{projected_newton, NewtonParams};
use region::TrustRegion;

pub use region::TrustRegionOptions;

/// Options for [`Tron`] solver.
#[derive(Debug, Clone, Copy, CopyGetters, MutGetters, Setters)]
#[getset(get_copy = "pub", set = "pub")]
pub struct TronOptions<T: RealField> {
    /// Sufficient decrease constant for the Cauchy point and the projected
    /// search. Must lie in `(0, 1/2)`. Default: `1e-2`.
    mu0: T,
    /// The Cauchy step must fit in `mu1` times the trust region radius.
    /// Default: `1`.
    mu1: T,
    /// Factor by which the Cauchy step length is shrunk or extended. Must be
    /// greater than one. Default: `10`.
    sigma: T,
    /// Maximum number of objective evaluations. Negative value means
    /// unlimited. Default: `-1`.
    max_eval: i64,
    /// Maximum wall-clock time in seconds. Default: `30`.
    max_time: f64,
    /// Maximum number of outer iterations. Default: unlimited.
    max_iter: usize,
    /// Maximum number of subsolver iterations in one projected Newton
    /// refinement. Default: `50`.
    max_cg_iter: usize,
    /// Evaluate the objective only through
    /// [`apply_gradient`](crate::Objective::apply_gradient). Useful if the
    /// value and the gradient share most of the computation. Default:
    /// `false`.
    use_only_objgrad: bool,
    /// Relative tolerance of the subsolver and the projected Newton
    /// refinement. Default: `0.1`.
    cg_tol: T,
    /// Absolute tolerance for the norm of the projected gradient. Default:
    /// `sqrt(EPSILON)`.
    atol: T,
    /// Tolerance for the norm of the projected gradient relative to its
    /// initial value. Default: `sqrt(EPSILON)`.
    rtol: T,
    /// Log progress on info level every `verbose` iterations. Zero disables
    /// it. Default: `0`.
    verbose: usize,
    /// Options of the trust region.
    #[getset(get_mut = "pub")]
    trust_region: TrustRegionOptions<T>,
}

impl<T: RealField> Default for TronOptions<T> {
    fn default() -> Self {
        Self {
            mu0: convert(1e-2),
            mu1: T::one(),
            sigma: convert(10.0),
            max_eval: -1,
            max_time: 30.0,
            max_iter: usize::MAX,
            max_cg_iter: 50,
            use_only_objgrad: false,
            cg_tol: convert(0.1),
            atol: T::EPSILON_SQRT,
            rtol: T::EPSILON_SQRT,
            verbose: 0,
            trust_region: TrustRegionOptions::default(),
        }
    }
}

impl<T: RealField> TronOptions<T> {
    fn validate(&self) -> Result<(), TronError> {
        let half: T = convert(0.5);

        if !(self.mu0 > T::zero() && self.mu0 < half) {
            return Err(TronError::InvalidOptions("mu0 must lie in (0, 1/2)"));
        }

        if !(self.mu1 > T::zero()) {
            return Err(TronError::InvalidOptions("mu1 must be positive"));
        }

        if !(self.sigma > T::one()) {
            return Err(TronError::InvalidOptions("sigma must be greater than one"));
        }

        if !(self.cg_tol > T::zero() && self.cg_tol < T::one()) {
            return Err(TronError::InvalidOptions("cg_tol must lie in (0, 1)"));
        }

        if !(self.atol >= T::zero() && self.rtol >= T::zero()) {
            return Err(TronError::InvalidOptions("tolerances must be nonnegative"));
        }

        if self.max_cg_iter == 0 {
            return Err(TronError::InvalidOptions("max_cg_iter must be positive"));
        }

        self.trust_region
            .validate()
            .map_err(TronError::InvalidOptions)
    }
}

/// Termination status of [`Tron`] solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    /// The solver is still running.
    #[default]
    Unknown,
    /// The norm of the projected gradient reached the tolerance.
    FirstOrder,
    /// The objective dropped below `min(-1, f(x0)) / EPSILON`.
    Unbounded,
    /// The maximum number of objective evaluations was exceeded.
    MaxEval,
    /// The time limit was exceeded.
    MaxTime,
    /// The maximum number of iterations was reached.
    MaxIter,
    /// The solving was stopped from the callback.
    User,
    /// The quadratic model did not predict a decrease.
    NegPred,
    /// The Cauchy step length underflowed.
    SmallStep,
}

impl Status {
    /// Whether the status corresponds to a first-order stationary point.
    pub fn is_success(&self) -> bool {
        *self == Status::FirstOrder
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let description = match self {
            Status::Unknown => "unknown",
            Status::FirstOrder => "first-order stationary",
            Status::Unbounded => "objective function unbounded below",
            Status::MaxEval => "maximum number of evaluations",
            Status::MaxTime => "maximum elapsed time",
            Status::MaxIter => "maximum number of iterations",
            Status::User => "user-requested stop",
            Status::NegPred => "negative predicted reduction",
            Status::SmallStep => "step too small",
        };

        f.write_str(description)
    }
}

/// Number of evaluations of the objective.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct Counters {
    /// Function value evaluations.
    obj: usize,
    /// Gradient evaluations.
    grad: usize,
    /// Hessian-vector products.
    hprod: usize,
}

/// Report of [`Tron`] solver.
///
/// The report is updated after every iteration and passed to the callback
/// which can stop the solving by setting [`Status::User`].
#[derive(Debug, Clone, CopyGetters, Setters)]
#[getset(get_copy = "pub")]
pub struct Report<T: RealField> {
    /// Termination status.
    #[getset(set = "pub")]
    status: Status,
    /// Number of outer iterations.
    iter: usize,
    /// Objective value in the current point.
    objective: T,
    /// Norm of the projected gradient in the current point.
    dual_feas: T,
    /// Elapsed time.
    elapsed: Duration,
    /// Number of accepted steps.
    successful_iters: usize,
    /// Total number of subsolver iterations.
    inner_iters: usize,
    /// Current trust region radius.
    radius: T,
    /// Evaluation counters.
    evals: Counters,
}

/// Error returned from [`Tron`] solver.
#[derive(Debug, Error)]
pub enum TronError {
    /// The problem cannot be solved by the method.
    #[error("{0}")]
    Problem(#[from] ProblemError),
    /// The options are not valid.
    #[error("invalid options: {0}")]
    InvalidOptions(&'static str),
}

/// Source of the second-order information.
#[derive(Debug, Clone)]
pub enum HessianModel<T: RealField> {
    /// Hessian-vector products of the objective.
    Exact,
    /// Limited-memory BFGS approximation updated from accepted steps.
    QuasiNewton(Lbfgs<T>),
}

/// Hessian operator bound to the point of the current iteration.
enum HessianOperator<'a, F: Objective> {
    Exact {
        f: &'a F,
        x: &'a DVector<F::Field>,
        products: usize,
    },
    QuasiNewton(&'a Lbfgs<F::Field>),
}

impl<'a, F: Objective> HessianOperator<'a, F> {
    fn new(model: &'a HessianModel<F::Field>, f: &'a F, x: &'a DVector<F::Field>) -> Self {
        match model {
            HessianModel::Exact => HessianOperator::Exact { f, x, products: 0 },
            HessianModel::QuasiNewton(lbfgs) => HessianOperator::QuasiNewton(lbfgs),
        }
    }

    fn products(&self) -> usize {
        match self {
            HessianOperator::Exact { products, .. } => *products,
            HessianOperator::QuasiNewton(_) => 0,
        }
    }
}

impl<F: Objective> LinearOperator<F::Field> for HessianOperator<'_, F> {
    fn dim(&self) -> usize {
        match self {
            HessianOperator::Exact { x, .. } => x.nrows(),
            HessianOperator::QuasiNewton(lbfgs) => lbfgs.dim(),
        }
    }

    fn apply_to(&mut self, v: &DVector<F::Field>, out: &mut DVector<F::Field>) {
        match self {
            HessianOperator::Exact { f, x, products } => {
                f.hess_prod(*x, v, out);
                *products += 1;
            }
            HessianOperator::QuasiNewton(lbfgs) => lbfgs.apply(v, out),
        }
    }
}

/// Trust-region Newton solver.
///
/// See [module](self) documentation for more details.
pub struct Tron<F: Objective, S = SteihaugCg<<F as Problem>::Field>> {
    options: TronOptions<F::Field>,
    model: HessianModel<F::Field>,
    subsolver: S,
    region: TrustRegion<F::Field>,
    alpha: F::Field,
    g: DVector<F::Field>,
    xc: DVector<F::Field>,
    gn: DVector<F::Field>,
    gt: DVector<F::Field>,
    s: DVector<F::Field>,
    hs: DVector<F::Field>,
    work: DVector<F::Field>,
}

impl<F: Objective> Tron<F> {
    /// Initializes TRON solver with default options.
    pub fn new(f: &F, dom: &Domain<F::Field>) -> Self {
        Self::with_options(f, dom, TronOptions::default())
    }

    /// Initializes TRON solver with given options.
    pub fn with_options(_f: &F, dom: &Domain<F::Field>, options: TronOptions<F::Field>) -> Self {
        let dim = dom.dim();

        Self {
            options,
            model: HessianModel::Exact,
            subsolver: SteihaugCg::new(),
            region: TrustRegion::new(options.trust_region, dim),
            alpha: F::Field::one(),
            g: DVector::zeros(dim),
            xc: DVector::zeros(dim),
            gn: DVector::zeros(dim),
            gt: DVector::zeros(dim),
            s: DVector::zeros(dim),
            hs: DVector::zeros(dim),
            work: DVector::zeros(dim),
        }
    }
}

impl<F: Objective, S: Subsolver<F::Field>> Tron<F, S> {
    /// Name of the solver.
    pub const NAME: &'static str = "TRON";

    /// Replaces the Hessian-vector products of the objective by a
    /// limited-memory BFGS approximation storing `memory` pairs.
    pub fn with_quasi_newton(mut self, memory: usize) -> Self {
        self.model = HessianModel::QuasiNewton(Lbfgs::new(self.xc.nrows(), memory));
        self
    }

    /// Replaces the subsolver for the reduced Newton systems.
    pub fn with_subsolver<S2: Subsolver<F::Field>>(self, subsolver: S2) -> Tron<F, S2> {
        let Self {
            options,
            model,
            region,
            alpha,
            g,
            xc,
            gn,
            gt,
            s,
            hs,
            work,
            ..
        } = self;

        Tron {
            options,
            model,
            subsolver,
            region,
            alpha,
            g,
            xc,
            gn,
            gt,
            s,
            hs,
            work,
        }
    }

    /// Gets the options.
    pub fn options(&self) -> &TronOptions<F::Field> {
        &self.options
    }

    /// Gets the source of the second-order information.
    pub fn model(&self) -> &HessianModel<F::Field> {
        &self.model
    }

    /// Resets the internal state of the solver.
    ///
    /// The trust region radius is set to its initial value, the Cauchy step
    /// length to one and the quasi-Newton approximation (if used) forgets all
    /// pairs.
    pub fn reset(&mut self) {
        self.region.reset();
        self.alpha = F::Field::one();

        if let HessianModel::QuasiNewton(lbfgs) = &mut self.model {
            lbfgs.reset();
        }
    }

    fn resize(&mut self, n: usize) {
        if self.xc.nrows() != n {
            self.g = DVector::zeros(n);
            self.xc = DVector::zeros(n);
            self.gn = DVector::zeros(n);
            self.gt = DVector::zeros(n);
            self.s = DVector::zeros(n);
            self.hs = DVector::zeros(n);
            self.work = DVector::zeros(n);
        }

        self.region.resize(n);

        if let HessianModel::QuasiNewton(lbfgs) = &mut self.model {
            if lbfgs.dim() != n {
                *lbfgs = Lbfgs::new(n, lbfgs.memory());
            }
        }
    }

    /// Minimizes the objective over the domain, starting from `x`.
    ///
    /// The callback is called after the initial evaluation and after every
    /// iteration with the current point, the gradient and the report. It can
    /// stop the solving by setting [`Status::User`] to the report. The point
    /// is projected into the domain after the callback returns.
    ///
    /// On return, `x` contains the final point.
    pub fn solve<Cb>(
        &mut self,
        f: &F,
        dom: &Domain<F::Field>,
        x: &mut DVector<F::Field>,
        mut callback: Cb,
    ) -> Result<Report<F::Field>, TronError>
    where
        Cb: FnMut(&mut DVector<F::Field>, &mut DVector<F::Field>, &mut Report<F::Field>),
    {
        let start = Instant::now();

        check_problem(f, dom, x.nrows())?;
        self.options.validate()?;
        self.resize(x.nrows());

        let Self {
            options,
            model,
            subsolver,
            region,
            alpha,
            g,
            xc,
            gn,
            gt,
            s,
            hs,
            work,
        } = self;

        let TronOptions {
            mu0,
            mu1,
            sigma,
            max_cg_iter,
            use_only_objgrad,
            cg_tol,
            atol,
            rtol,
            verbose,
            ..
        } = *options;

        let one = F::Field::one();
        let half: F::Field = convert(0.5);

        let mut evals = Counters::default();
        *alpha = one;

        if dom.project(x) {
            debug!("initial point is not feasible, performing the projection");
        }

        let mut fx = if use_only_objgrad {
            f.apply_gradient(&*x, g)
        } else {
            let fx = f.apply(&*x);
            f.gradient(&*x, g);
            fx
        };
        evals.obj += 1;
        evals.grad += 1;

        let mut pi = projected_gradient_norm(dom, x, g, work);
        let eps = atol + rtol * pi;
        let fmin = (-one).min(fx) / F::Field::EPSILON;

        region.set_initial_radius((pi / convert(10.0)).max(one).min(convert(100.0)));

        debug!(
            "initial f = {}, || P(g) || = {}, tolerance = {}, radius = {}",
            fx,
            pi,
            eps,
            region.radius()
        );

        let mut report = Report {
            status: Status::Unknown,
            iter: 0,
            objective: fx,
            dual_feas: pi,
            elapsed: start.elapsed(),
            successful_iters: 0,
            inner_iters: 0,
            radius: region.radius(),
            evals,
        };
        report.status = check_status(&report, eps, fmin, options);

        if verbose > 0 {
            info!(
                "{:>6}  {:>12}  {:>12}  {:>12}  {:>12}  {:>6}",
                "iter", "f", "dual", "radius", "ratio", "inner"
            );
            log_progress(&report, F::Field::zero());
        }

        callback(x, g, &mut report);
        dom.project(x);

        while report.status == Status::Unknown {
            xc.copy_from(&*x);
            let fc = fx;

            let mut hess = HessianOperator::new(model, f, xc);

            let cauchy = cauchy_point(
                dom,
                x,
                g,
                &mut hess,
                region.radius(),
                *alpha,
                CauchyParams { mu0, mu1, sigma },
                s,
                hs,
            );
            *alpha = cauchy.alpha;

            if cauchy.status == CauchyStatus::SmallStep {
                evals.hprod += hess.products();
                warn!("Cauchy step length underflowed, alpha = {}", cauchy.alpha);
                report.status = Status::SmallStep;
                break;
            }

            *x += &*s;
            dom.project(x);

            let newton = projected_newton(
                dom,
                x,
                g,
                &mut hess,
                subsolver,
                region.radius(),
                NewtonParams {
                    mu0,
                    cg_tol,
                    max_cg_iter,
                },
                s,
                hs,
            );
            evals.hprod += hess.products();
            report.inner_iters += newton.iters;

            debug!(
                "projected Newton finished ({:?}) after {} subsolver iterations",
                newton.status, newton.iters
            );

            let slope = s.dot(&*g);
            let qs = half * s.dot(&*hs) + slope;

            fx = if use_only_objgrad {
                evals.grad += 1;
                f.apply_gradient(&*x, gt)
            } else {
                f.apply(&*x)
            };
            evals.obj += 1;

            let assessed = region.assess(fc, fx, qs, slope, s, |trial| {
                if use_only_objgrad {
                    trial.copy_from(&*gt);
                } else {
                    evals.grad += 1;
                    f.gradient(&*x, trial);
                }
            });

            let ratio = match assessed {
                Some(ratio) => ratio,
                None => {
                    x.copy_from(&*xc);
                    fx = fc;
                    warn!("predicted reduction is not negative (q(s) = {})", qs);
                    report.status = Status::NegPred;
                    break;
                }
            };

            let s_norm = s.norm();

            if report.successful_iters == 0 {
                region.shrink_to_step(s_norm);
            }

            region.update(s_norm);

            if region.is_acceptable() {
                report.successful_iters += 1;

                if region.good_grad() {
                    gn.copy_from(region.trial_gradient());
                } else if use_only_objgrad {
                    gn.copy_from(&*gt);
                } else {
                    evals.grad += 1;
                    f.gradient(&*x, gn);
                }

                if let HessianModel::QuasiNewton(lbfgs) = model {
                    work.copy_from(&*gn);
                    *work -= &*g;
                    lbfgs.push(s, work);
                }

                g.copy_from(&*gn);
                pi = projected_gradient_norm(dom, x, g, work);

                debug!("step accepted, f = {}, || P(g) || = {}", fx, pi);
            } else {
                x.copy_from(&*xc);
                fx = fc;

                debug!("step rejected, ratio = {}", ratio);
            }

            report.iter += 1;
            report.objective = fx;
            report.dual_feas = pi;
            report.radius = region.radius();
            report.evals = evals;
            report.elapsed = start.elapsed();
            report.status = check_status(&report, eps, fmin, options);

            if verbose > 0 && report.iter % verbose == 0 {
                log_progress(&report, ratio);
            }

            callback(x, g, &mut report);
            dom.project(x);
        }

        report.objective = fx;
        report.radius = region.radius();
        report.evals = evals;
        report.elapsed = start.elapsed();

        debug!(
            "{} finished after {} iterations: {}",
            Self::NAME,
            report.iter,
            report.status
        );

        Ok(report)
    }
}

/// Computes `||P(x - g) - x||`.
fn projected_gradient_norm<T: RealField>(
    dom: &Domain<T>,
    x: &DVector<T>,
    g: &DVector<T>,
    work: &mut DVector<T>,
) -> T {
    dom.project_step(x, g, -T::one(), work);
    work.norm()
}

/// Computes `q(s) = 1/2 s'Hs + g's` and the slope `g's`, storing `H s` in
/// `hs`.
fn quadratic_model<T, O>(hess: &mut O, g: &DVector<T>, s: &DVector<T>, hs: &mut DVector<T>) -> (T, T)
where
    T: RealField,
    O: LinearOperator<T>,
{
    hess.apply_to(s, hs);

    let half: T = convert(0.5);
    let slope = s.dot(g);

    (half * s.dot(&*hs) + slope, slope)
}

fn check_status<T: RealField>(
    report: &Report<T>,
    eps: T,
    fmin: T,
    options: &TronOptions<T>,
) -> Status {
    if report.dual_feas <= eps {
        Status::FirstOrder
    } else if report.objective < fmin {
        Status::Unbounded
    } else if options.max_eval >= 0 && report.evals.obj as u64 > options.max_eval as u64 {
        Status::MaxEval
    } else if report.elapsed.as_secs_f64() > options.max_time {
        Status::MaxTime
    } else if report.iter >= options.max_iter {
        Status::MaxIter
    } else {
        Status::Unknown
    }
}

fn log_progress<T: RealField>(report: &Report<T>, ratio: T) {
    let sci = |value: T| try_convert::<T, f64>(value).unwrap_or(f64::NAN);

    info!(
        "{:>6}  {:>12.4e}  {:>12.4e}  {:>12.4e}  {:>12.4e}  {:>6}",
        report.iter,
        sci(report.objective),
        sci(report.dual_feas),
        sci(report.radius),
        sci(ratio),
        report.inner_iters
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Function, Sense};
    use crate::derivatives::FiniteDifference;
    use crate::testing::*;

    use approx::assert_abs_diff_eq;
    use nalgebra::{
        dmatrix, dvector,
        storage::{Storage, StorageMut},
        Dyn, IsContiguous, Vector,
    };

    fn solve<F: Objective>(
        f: &F,
        x: &mut DVector<F::Field>,
        options: TronOptions<F::Field>,
    ) -> Report<F::Field> {
        let dom = f.domain();
        let mut solver = Tron::with_options(f, &dom, options);
        solver.solve(f, &dom, x, |_, _, _| {}).unwrap()
    }

    // f(x) = x with a "Hessian" that is not linear in the direction.
    struct NonlinearCurvature;

    impl Problem for NonlinearCurvature {
        type Field = f64;

        fn domain(&self) -> Domain<Self::Field> {
            Domain::unconstrained(1)
        }
    }

    impl Function for NonlinearCurvature {
        fn apply<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
        where
            Sx: Storage<Self::Field, Dyn> + IsContiguous,
        {
            x[0]
        }
    }

    impl Objective for NonlinearCurvature {
        fn gradient<Sx, Sg>(
            &self,
            _x: &Vector<Self::Field, Dyn, Sx>,
            g: &mut Vector<Self::Field, Dyn, Sg>,
        ) where
            Sx: Storage<Self::Field, Dyn> + IsContiguous,
            Sg: StorageMut<Self::Field, Dyn>,
        {
            g[0] = 1.0;
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
            hv[0] = 0.5 * v[0].powi(3);
        }
    }

    // f(x) = x with enormous curvature.
    struct Stiff;

    impl Problem for Stiff {
        type Field = f64;

        fn domain(&self) -> Domain<Self::Field> {
            Domain::unconstrained(1)
        }
    }

    impl Function for Stiff {
        fn apply<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
        where
            Sx: Storage<Self::Field, Dyn> + IsContiguous,
        {
            x[0]
        }
    }

    impl Objective for Stiff {
        fn gradient<Sx, Sg>(
            &self,
            _x: &Vector<Self::Field, Dyn, Sx>,
            g: &mut Vector<Self::Field, Dyn, Sg>,
        ) where
            Sx: Storage<Self::Field, Dyn> + IsContiguous,
            Sg: StorageMut<Self::Field, Dyn>,
        {
            g[0] = 1.0;
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
            hv[0] = 1e300 * v[0];
        }
    }

    // f(x) = -x^2, unbounded from below.
    struct Concave;

    impl Problem for Concave {
        type Field = f64;

        fn domain(&self) -> Domain<Self::Field> {
            Domain::unconstrained(1)
        }
    }

    impl Function for Concave {
        fn apply<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
        where
            Sx: Storage<Self::Field, Dyn> + IsContiguous,
        {
            -x[0] * x[0]
        }
    }

    impl Objective for Concave {
        fn gradient<Sx, Sg>(
            &self,
            x: &Vector<Self::Field, Dyn, Sx>,
            g: &mut Vector<Self::Field, Dyn, Sg>,
        ) where
            Sx: Storage<Self::Field, Dyn> + IsContiguous,
            Sg: StorageMut<Self::Field, Dyn>,
        {
            g[0] = -2.0 * x[0];
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
            hv[0] = -2.0 * v[0];
        }
    }

    struct Maximization;

    impl Problem for Maximization {
        type Field = f64;

        fn domain(&self) -> Domain<Self::Field> {
            Domain::unconstrained(2)
        }

        fn sense(&self) -> Sense {
            Sense::Maximize
        }
    }

    impl Function for Maximization {
        fn apply<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
        where
            Sx: Storage<Self::Field, Dyn> + IsContiguous,
        {
            -x.norm_squared()
        }
    }

    impl Objective for Maximization {
        fn gradient<Sx, Sg>(
            &self,
            x: &Vector<Self::Field, Dyn, Sx>,
            g: &mut Vector<Self::Field, Dyn, Sg>,
        ) where
            Sx: Storage<Self::Field, Dyn> + IsContiguous,
            Sg: StorageMut<Self::Field, Dyn>,
        {
            g.copy_from(&(x * -2.0));
        }
    }

    // Rosenbrock without derivatives.
    struct Banana;

    impl Problem for Banana {
        type Field = f64;

        fn domain(&self) -> Domain<Self::Field> {
            Domain::unconstrained(2)
        }
    }

    impl Function for Banana {
        fn apply<Sx>(&self, x: &Vector<Self::Field, Dyn, Sx>) -> Self::Field
        where
            Sx: Storage<Self::Field, Dyn> + IsContiguous,
        {
            100.0 * (x[1] - x[0] * x[0]).powi(2) + (1.0 - x[0]).powi(2)
        }
    }

    #[test]
    fn sphere() {
        let f = Sphere::new(3);
        let mut x = dvector![1.0, 2.0, 3.0];

        let report = solve(&f, &mut x, TronOptions::default());

        assert_eq!(report.status(), Status::FirstOrder);
        assert!(report.iter() <= 10);
        assert!(x.norm() <= 1e-6);
        assert!(f.is_optimum(&x, 1e-6));
    }

    #[test]
    fn stationary_initial_point() {
        let f = Linear::new(vec![1.0], Domain::rect(vec![0.0], vec![f64::INFINITY]));
        let mut x = dvector![0.0];

        let report = solve(&f, &mut x, TronOptions::default());

        assert_eq!(report.status(), Status::FirstOrder);
        assert_eq!(report.iter(), 0);
        assert_eq!(report.dual_feas(), 0.0);
        assert_eq!(x, dvector![0.0]);
    }

    #[test]
    fn infeasible_initial_point_is_projected() {
        let f = Linear::new(vec![1.0], Domain::rect(vec![0.0], vec![f64::INFINITY]));
        let mut x = dvector![-5.0];

        let report = solve(&f, &mut x, TronOptions::default());

        assert_eq!(report.status(), Status::FirstOrder);
        assert_eq!(x, dvector![0.0]);
    }

    #[test]
    fn linear_on_box_reaches_vertex() {
        let f = Linear::new(
            vec![1.0, -2.0],
            Domain::rect(vec![-1.0, -1.0], vec![1.0, 1.0]),
        );
        let mut x = dvector![0.0, 0.0];

        let report = solve(&f, &mut x, TronOptions::default());

        assert_eq!(report.status(), Status::FirstOrder);
        assert_abs_diff_eq!(x, dvector![-1.0, 1.0], epsilon = 1e-12);
    }

    #[test]
    fn negative_prediction_restores_point() {
        let f = NonlinearCurvature;
        let mut x = dvector![0.0];

        let report = solve(&f, &mut x, TronOptions::default());

        assert_eq!(report.status(), Status::NegPred);
        assert_eq!(report.iter(), 0);
        assert_eq!(report.objective(), 0.0);
        assert_eq!(x, dvector![0.0]);
    }

    #[test]
    fn small_cauchy_step() {
        let f = Stiff;
        let mut x = dvector![0.0];

        let report = solve(&f, &mut x, TronOptions::default());

        assert_eq!(report.status(), Status::SmallStep);
        assert_eq!(report.iter(), 0);
        assert_eq!(x, dvector![0.0]);
    }

    #[test]
    fn unbounded() {
        let f = Concave;
        let mut x = dvector![1.0];

        let report = solve(&f, &mut x, TronOptions::default());

        assert_eq!(report.status(), Status::Unbounded);
        assert!(report.iter() > 0);
        assert!(report.objective() < -1.0 / f64::EPSILON);
        assert_eq!(report.objective(), f.apply(&x));
    }

    #[test]
    fn max_eval() {
        let f = ExtendedRosenbrock::new(2);
        let mut x = dvector![-1.2, 1.0];

        let mut options = TronOptions::default();
        options.set_max_eval(1);

        let report = solve(&f, &mut x, options);

        assert_eq!(report.status(), Status::MaxEval);
        assert_eq!(report.evals().obj(), 2);
        assert_eq!(report.iter(), 1);
    }

    #[test]
    fn max_iter() {
        let f = ExtendedRosenbrock::new(2);
        let mut x = dvector![-1.2, 1.0];

        let mut options = TronOptions::default();
        options.set_max_iter(3);

        let report = solve(&f, &mut x, options);

        assert_eq!(report.status(), Status::MaxIter);
        assert_eq!(report.iter(), 3);
    }

    #[test]
    fn max_time() {
        let f = ExtendedRosenbrock::new(2);
        let mut x = dvector![-1.2, 1.0];

        let mut options = TronOptions::default();
        options.set_max_time(-1.0);

        let report = solve(&f, &mut x, options);

        assert_eq!(report.status(), Status::MaxTime);
        assert_eq!(report.iter(), 0);
    }

    #[test]
    fn rosenbrock() {
        let f = ExtendedRosenbrock::new(2);
        let x0 = dvector![-1.2, 1.0];

        let (x, report) = minimize(&f, &f.domain(), x0, TronOptions::default()).unwrap();

        assert_eq!(report.status(), Status::FirstOrder);
        assert_abs_diff_eq!(x, dvector![1.0, 1.0], epsilon = 1e-4);
        assert!(report.successful_iters() <= report.iter());
        assert!(report.evals().hprod() > 0);
        assert_eq!(report.evals().obj(), report.iter() + 1);
    }

    #[test]
    fn rosenbrock_with_active_bound() {
        let inf = f64::INFINITY;
        let f = ExtendedRosenbrock::with_bounds(vec![-inf, -inf], vec![0.5, inf]);
        let mut x = dvector![-1.2, 1.0];

        let report = solve(&f, &mut x, TronOptions::default());

        assert_eq!(report.status(), Status::FirstOrder);
        assert_abs_diff_eq!(x, dvector![0.5, 0.25], epsilon = 1e-4);
    }

    #[test]
    fn extended_rosenbrock_second_initial() {
        let f = ExtendedRosenbrock::new(4);
        let mut x = f.initials().remove(1);

        let mut options = TronOptions::default();
        options.set_atol(1e-9).set_rtol(0.0);

        let report = solve(&f, &mut x, options);

        assert_eq!(report.status(), Status::FirstOrder);
        assert!(f.is_near_optimum(&x, 1e-4));
    }

    #[test]
    fn powell_with_approximate_hessian() {
        let f = ExtendedPowell::new(4);
        let x0 = f.initials().remove(0);

        let mut options = TronOptions::default();
        options.set_atol(1e-6).set_rtol(0.0).set_max_iter(500);

        let (x, report) = minimize(&f, &f.domain(), x0, options).unwrap();

        assert_eq!(report.status(), Status::FirstOrder);
        assert!(f.apply(&x) <= 1e-6, "f(x) = {}", f.apply(&x));
    }

    #[test]
    fn quadratic_with_coupled_variables() {
        let f = Quadratic::new(
            dmatrix![2.0, 1.0; 1.0, 2.0],
            dvector![-1.0, -1.0],
            Domain::unconstrained(2),
        );
        let x0 = dvector![3.0, -2.0];

        let mut options = TronOptions::default();
        options.set_atol(1e-10).set_rtol(0.0).set_max_iter(50);

        let (x, report) = minimize(&f, &f.domain(), x0, options).unwrap();

        assert_eq!(report.status(), Status::FirstOrder);
        assert_abs_diff_eq!(x, dvector![1.0 / 3.0, 1.0 / 3.0], epsilon = 1e-8);
    }

    #[test]
    fn quasi_newton_on_ill_conditioned_quadratic() {
        let inf = f64::INFINITY;
        let f = Quadratic::diagonal(
            vec![1.0, 10.0, 100.0],
            -1.0,
            Domain::rect(vec![-inf, -inf, -inf], vec![0.5, inf, inf]),
        );
        let dom = f.domain();
        let mut x = dvector![0.0, 0.0, 0.0];

        let mut options = TronOptions::default();
        options.set_max_iter(200);

        let mut solver = Tron::with_options(&f, &dom, options).with_quasi_newton(5);
        let report = solver.solve(&f, &dom, &mut x, |_, _, _| {}).unwrap();

        assert_eq!(report.status(), Status::FirstOrder);
        assert_abs_diff_eq!(x, dvector![0.5, 0.1, 0.01], epsilon = 1e-6);
        assert_eq!(report.evals().hprod(), 0);
        assert!(matches!(solver.model(), HessianModel::QuasiNewton(lbfgs) if !lbfgs.is_empty()));
    }

    #[test]
    fn finite_difference_objective() {
        let f = Banana;
        let fd = FiniteDifference::new(&f);
        let mut x = dvector![-1.2, 1.0];

        let mut options = TronOptions::default();
        options.set_atol(1e-4).set_rtol(0.0).set_max_iter(500);

        let report = solve(&fd, &mut x, options);

        assert_eq!(report.status(), Status::FirstOrder);
        assert_abs_diff_eq!(x, dvector![1.0, 1.0], epsilon = 1e-2);
    }

    #[test]
    fn use_only_objgrad_gives_same_iterates() {
        let f = ExtendedRosenbrock::new(2);

        let mut x1 = dvector![-1.2, 1.0];
        let report1 = solve(&f, &mut x1, TronOptions::default());

        let mut options = TronOptions::default();
        options.set_use_only_objgrad(true);

        let mut x2 = dvector![-1.2, 1.0];
        let report2 = solve(&f, &mut x2, options);

        assert_eq!(x1, x2);
        assert_eq!(report1.iter(), report2.iter());
        assert_eq!(report1.status(), report2.status());
        assert_eq!(report2.evals().obj(), report2.evals().grad());
    }

    #[test]
    fn deterministic() {
        let f = ExtendedRosenbrock::new(2);

        let mut x1 = dvector![-1.2, 1.0];
        let report1 = solve(&f, &mut x1, TronOptions::default());

        let mut x2 = dvector![-1.2, 1.0];
        let report2 = solve(&f, &mut x2, TronOptions::default());

        assert_eq!(x1, x2);
        assert_eq!(report1.iter(), report2.iter());
        assert_eq!(report1.status(), report2.status());
        assert_eq!(report1.evals(), report2.evals());
    }

    #[test]
    fn reset_gives_same_result() {
        let f = ExtendedRosenbrock::new(2);
        let dom = f.domain();
        let mut solver = Tron::new(&f, &dom);

        let mut x1 = dvector![-1.2, 1.0];
        let report1 = solver.solve(&f, &dom, &mut x1, |_, _, _| {}).unwrap();

        solver.reset();

        let mut x2 = dvector![-1.2, 1.0];
        let report2 = solver.solve(&f, &dom, &mut x2, |_, _, _| {}).unwrap();

        assert_eq!(x1, x2);
        assert_eq!(report1.iter(), report2.iter());
    }

    #[test]
    fn iterates_are_feasible_and_radius_bounded() {
        let inf = f64::INFINITY;
        let f = ExtendedRosenbrock::with_bounds(vec![-inf, -inf], vec![0.5, inf]);
        let dom = f.domain();
        let mut x = dvector![-1.2, 1.0];

        let options = TronOptions::default();
        let max_radius = options.trust_region().max_radius();

        let mut solver = Tron::with_options(&f, &dom, options);
        let mut calls = 0;
        let report = solver
            .solve(&f, &dom, &mut x, |x, _, report| {
                calls += 1;
                assert!(dom.is_feasible(x));
                assert!(report.radius() > 0.0);
                assert!(report.radius() <= max_radius);
            })
            .unwrap();

        assert_eq!(calls, report.iter() + 1);
    }

    #[test]
    fn rejected_step_keeps_point() {
        let f = ExtendedRosenbrock::new(2);
        let dom = f.domain();
        let mut x = dvector![-1.2, 1.0];

        let mut previous: Option<(DVector<f64>, usize)> = None;

        let mut solver = Tron::new(&f, &dom);
        solver
            .solve(&f, &dom, &mut x, |x, _, report| {
                if let Some((x_prev, successful)) = &previous {
                    if *successful == report.successful_iters() {
                        assert_eq!(x, x_prev);
                    }
                }

                previous = Some((x.clone(), report.successful_iters()));
            })
            .unwrap();
    }

    #[test]
    fn user_stop() {
        let f = ExtendedRosenbrock::new(2);
        let dom = f.domain();
        let mut x = dvector![-1.2, 1.0];

        let mut solver = Tron::new(&f, &dom);
        let report = solver
            .solve(&f, &dom, &mut x, |_, _, report| {
                if report.iter() == 2 {
                    report.set_status(Status::User);
                }
            })
            .unwrap();

        assert_eq!(report.status(), Status::User);
        assert_eq!(report.iter(), 2);
    }

    #[test]
    fn callback_modifications_are_projected() {
        let f = Linear::new(vec![1.0], Domain::rect(vec![0.0], vec![10.0]));
        let dom = f.domain();
        let mut x = dvector![5.0];

        let mut solver = Tron::new(&f, &dom);
        solver
            .solve(&f, &dom, &mut x, |x, _, report| {
                x[0] = -3.0;
                report.set_status(Status::User);
            })
            .unwrap();

        assert_eq!(x, dvector![0.0]);
    }

    #[test]
    fn invalid_options() {
        let f = Sphere::new(2);
        let mut x = dvector![1.0, 1.0];
        let dom = f.domain();

        let mut options = TronOptions::default();
        options.set_mu0(0.7);

        let mut solver = Tron::with_options(&f, &dom, options);
        let result = solver.solve(&f, &dom, &mut x, |_, _, _| {});
        assert!(matches!(result, Err(TronError::InvalidOptions(_))));

        let mut options = TronOptions::default();
        options.trust_region_mut().set_increase_factor(0.5);

        let mut solver = Tron::with_options(&f, &dom, options);
        let result = solver.solve(&f, &dom, &mut x, |_, _, _| {});
        assert!(matches!(result, Err(TronError::InvalidOptions(_))));
    }

    #[test]
    fn invalid_problem() {
        let f = Sphere::new(2);
        let dom = f.domain();
        let mut x = dvector![1.0, 1.0, 1.0];

        let mut solver = Tron::new(&f, &dom);
        let result = solver.solve(&f, &dom, &mut x, |_, _, _| {});
        assert!(matches!(
            result,
            Err(TronError::Problem(ProblemError::InvalidDimensionality))
        ));

        let f = Maximization;
        let dom = f.domain();
        let mut x = dvector![1.0, 1.0];

        let mut solver = Tron::new(&f, &dom);
        let result = solver.solve(&f, &dom, &mut x, |_, _, _| {});
        assert!(matches!(
            result,
            Err(TronError::Problem(ProblemError::NotMinimization))
        ));
    }

    #[test]
    fn status_display() {
        assert_eq!(Status::FirstOrder.to_string(), "first-order stationary");
        assert!(Status::FirstOrder.is_success());
        assert!(!Status::MaxIter.is_success());
    }
}
