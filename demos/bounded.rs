use tron::algo::tron::{Status, Tron, TronOptions};
use tron::nalgebra as na;
use tron::{Domain, Function, Objective, Problem};
use na::{Dyn, IsContiguous};

// Rosenbrock function with the first variable bounded from above, so that the
// unconstrained minimum (1, 1) is cut off.
struct BoundedRosenbrock {
    upper: f64,
}

impl Problem for BoundedRosenbrock {
    type Field = f64;

    fn domain(&self) -> Domain<Self::Field> {
        [(f64::NEG_INFINITY, self.upper), (f64::NEG_INFINITY, f64::INFINITY)]
            .into_iter()
            .collect()
    }
}

impl Function for BoundedRosenbrock {
    fn apply<Sx>(&self, x: &na::Vector<Self::Field, Dyn, Sx>) -> Self::Field
    where
        Sx: na::storage::Storage<Self::Field, Dyn> + IsContiguous,
    {
        (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0].powi(2)).powi(2)
    }
}

impl Objective for BoundedRosenbrock {
    fn gradient<Sx, Sg>(
        &self,
        x: &na::Vector<Self::Field, Dyn, Sx>,
        g: &mut na::Vector<Self::Field, Dyn, Sg>,
    ) where
        Sx: na::storage::Storage<Self::Field, Dyn> + IsContiguous,
        Sg: na::storage::StorageMut<Self::Field, Dyn>,
    {
        let valley = x[1] - x[0].powi(2);
        g[0] = -2.0 * (1.0 - x[0]) - 400.0 * x[0] * valley;
        g[1] = 200.0 * valley;
    }
}

fn main() -> Result<(), String> {
    let f = BoundedRosenbrock { upper: 0.5 };
    let dom = f.domain();

    let mut options = TronOptions::default();
    options.set_max_iter(1000);

    let mut solver = Tron::with_options(&f, &dom, options).with_quasi_newton(5);
    let mut x = na::dvector![-1.2, 1.0];

    let report = solver
        .solve(&f, &dom, &mut x, |x, _, report| {
            println!(
                "iter = {}\tf(x) = {}\tx = [{}, {}]\tradius = {}",
                report.iter(),
                report.objective(),
                x[0],
                x[1],
                report.radius(),
            );
        })
        .map_err(|error| format!("{error}"))?;

    println!(
        "{} after {} iterations ({} accepted), evaluations: {:?}",
        report.status(),
        report.iter(),
        report.successful_iters(),
        report.evals(),
    );

    if report.status() == Status::FirstOrder {
        Ok(())
    } else {
        Err("did not converge".to_string())
    }
}
