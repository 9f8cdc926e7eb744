use tron::nalgebra as na;
use tron::{Domain, Function, Objective, Problem, TronDriver};
use na::{Dyn, IsContiguous};

// https://en.wikipedia.org/wiki/Rosenbrock_function
struct Rosenbrock {
    a: f64,
    b: f64,
}

impl Problem for Rosenbrock {
    type Field = f64;

    fn domain(&self) -> Domain<Self::Field> {
        Domain::unconstrained(2)
    }
}

impl Function for Rosenbrock {
    fn apply<Sx>(&self, x: &na::Vector<Self::Field, Dyn, Sx>) -> Self::Field
    where
        Sx: na::storage::Storage<Self::Field, Dyn> + IsContiguous,
    {
        (self.a - x[0]).powi(2) + self.b * (x[1] - x[0].powi(2)).powi(2)
    }
}

impl Objective for Rosenbrock {
    fn gradient<Sx, Sg>(
        &self,
        x: &na::Vector<Self::Field, Dyn, Sx>,
        g: &mut na::Vector<Self::Field, Dyn, Sg>,
    ) where
        Sx: na::storage::Storage<Self::Field, Dyn> + IsContiguous,
        Sg: na::storage::StorageMut<Self::Field, Dyn>,
    {
        let valley = x[1] - x[0].powi(2);
        g[0] = -2.0 * (self.a - x[0]) - 4.0 * self.b * x[0] * valley;
        g[1] = 2.0 * self.b * valley;
    }
}

fn main() -> Result<(), String> {
    let f = Rosenbrock { a: 1.0, b: 100.0 };
    let mut driver = TronDriver::builder(&f)
        .with_initial(vec![-1.2, 1.0])
        .build();

    let (x, value) = driver
        .find(|report| {
            println!(
                "iter = {}\tf(x) = {}\t|| P(g) || = {}\tradius = {}",
                report.iter(),
                report.objective(),
                report.dual_feas(),
                report.radius(),
            );
            report.iter() >= 100
        })
        .map_err(|error| format!("{error}"))?;

    println!("x = {x:?}, f(x) = {value}");

    match driver.report() {
        Some(report) if report.status().is_success() => Ok(()),
        Some(report) => Err(format!("did not converge: {}", report.status())),
        None => Err("not run".to_string()),
    }
}
