use thiserror::Error;

use super::domain::Domain;

/// Extension of [`nalgebra::RealField`] with constants derived from machine
/// epsilon that are used throughout the algorithms.
pub trait RealField: nalgebra::RealField + Copy {
    /// Machine epsilon.
    const EPSILON: Self;

    /// Square root of machine epsilon. This value is a standard constant for
    /// epsilons in approximating first-order derivate-based concepts.
    const EPSILON_SQRT: Self;

    /// Cubic root of machine epsilon. This value is a standard constant for
    /// epsilons in approximating second-order derivate-based concepts.
    const EPSILON_CBRT: Self;

    /// Square root of the smallest positive subnormal number. Step lengths
    /// below this value are considered to be underflowed.
    const TINY_SQRT: Self;
}

impl RealField for f32 {
    const EPSILON: Self = f32::EPSILON;
    const EPSILON_SQRT: Self = 0.00034526698;
    const EPSILON_CBRT: Self = 0.0049215667;
    const TINY_SQRT: Self = 3.743392e-23;
}

impl RealField for f64 {
    const EPSILON: Self = f64::EPSILON;
    const EPSILON_SQRT: Self = 0.000000014901161193847656;
    const EPSILON_CBRT: Self = 0.0000060554544523933395;
    const TINY_SQRT: Self = 2.2227587494850775e-162;
}

/// Direction of the optimization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sense {
    /// The objective is to be minimized.
    #[default]
    Minimize,
    /// The objective is to be maximized.
    Maximize,
}

/// The base trait for [`Function`](super::function::Function) and
/// [`Objective`](super::function::Objective).
pub trait Problem {
    /// Type of the field, usually f32 or f64.
    type Field: RealField;

    /// Get the domain (bound constraints) of the problem.
    fn domain(&self) -> Domain<Self::Field>;

    /// Direction of the optimization. If not overridden, the problem is a
    /// minimization.
    fn sense(&self) -> Sense {
        Sense::Minimize
    }

    /// Whether the problem has constraints other than simple bounds of the
    /// [`domain`](Problem::domain). If not overridden, it has none.
    fn has_general_constraints(&self) -> bool {
        false
    }
}

/// Error for problems that cannot be handled by a bound-constrained
/// minimizer.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ProblemError {
    /// The problem is not a minimization problem.
    #[error("problem is not a minimization problem")]
    NotMinimization,
    /// The problem has constraints other than simple bounds.
    #[error("problem has constraints other than simple bounds")]
    GeneralConstraints,
    /// The number of variables does not match the dimensionality of the
    /// domain.
    #[error("invalid dimensionality")]
    InvalidDimensionality,
}

/// Checks that the problem is a minimization problem with simple bounds at
/// most and that the point matches the dimensionality of the domain.
pub fn check_problem<P: Problem>(
    p: &P,
    dom: &Domain<P::Field>,
    dim: usize,
) -> Result<(), ProblemError> {
    if p.sense() != Sense::Minimize {
        return Err(ProblemError::NotMinimization);
    }

    if p.has_general_constraints() {
        return Err(ProblemError::GeneralConstraints);
    }

    if dom.dim() != dim {
        return Err(ProblemError::InvalidDimensionality);
    }

    Ok(())
}
