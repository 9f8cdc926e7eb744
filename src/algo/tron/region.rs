//! Trust-region radius management and step acceptance.

use getset::{CopyGetters, Setters};
use log::debug;
use nalgebra::{convert, DVector};

use crate::core::RealField;

/// Options for the trust region of [`Tron`](super::Tron).
///
/// The radius update follows Lin and Moré. Thresholds must satisfy
/// `0 < acceptance <= decrease < increase < 1` and factors `0 <
/// large_decrease < small_decrease < 1 < increase`.
#[derive(Debug, Clone, Copy, CopyGetters, Setters)]
#[getset(get_copy = "pub", set = "pub")]
pub struct TrustRegionOptions<T: RealField> {
    /// Maximum allowed trust region radius. Default: `1 / sqrt(EPSILON)`.
    max_radius: T,
    /// Threshold for the ratio of actual and predicted reduction that needs
    /// to be reached to accept the step. Default: `1e-4`.
    acceptance_threshold: T,
    /// Threshold for the ratio below which the radius is decreased. Default:
    /// `0.25`.
    decrease_threshold: T,
    /// Threshold for the ratio above which the radius may be increased.
    /// Default: `0.75`.
    increase_threshold: T,
    /// Factor for the strongest decrease of the radius. Default: `0.25`.
    large_decrease_factor: T,
    /// Factor for a moderate decrease of the radius. Default: `0.5`.
    small_decrease_factor: T,
    /// Factor for the increase of the radius. Default: `4`.
    increase_factor: T,
}

impl<T: RealField> TrustRegionOptions<T> {
    pub(crate) fn validate(&self) -> Result<(), &'static str> {
        let Self {
            max_radius,
            acceptance_threshold: eta0,
            decrease_threshold: eta1,
            increase_threshold: eta2,
            large_decrease_factor: sigma1,
            small_decrease_factor: sigma2,
            increase_factor: sigma3,
        } = *self;

        if !(max_radius > T::zero()) {
            return Err("max radius must be positive");
        }

        if !(T::zero() < eta0 && eta0 <= eta1 && eta1 < eta2 && eta2 < T::one()) {
            return Err("trust region thresholds must be increasing in (0, 1)");
        }

        if !(T::zero() < sigma1 && sigma1 < sigma2 && sigma2 < T::one() && T::one() < sigma3) {
            return Err("trust region factors must satisfy 0 < large < small < 1 < increase");
        }

        Ok(())
    }
}

impl<T: RealField> Default for TrustRegionOptions<T> {
    fn default() -> Self {
        Self {
            max_radius: T::one() / T::EPSILON_SQRT,
            acceptance_threshold: convert(1e-4),
            decrease_threshold: convert(0.25),
            increase_threshold: convert(0.75),
            large_decrease_factor: convert(0.25),
            small_decrease_factor: convert(0.5),
            increase_factor: convert(4.0),
        }
    }
}

/// State of the trust region.
#[derive(Debug, Clone)]
pub(crate) struct TrustRegion<T: RealField> {
    options: TrustRegionOptions<T>,
    initial_radius: T,
    radius: T,
    ratio: T,
    quad_min: T,
    good_grad: bool,
    gt: DVector<T>,
}

impl<T: RealField> TrustRegion<T> {
    pub fn new(options: TrustRegionOptions<T>, dim: usize) -> Self {
        Self {
            options,
            initial_radius: T::one(),
            radius: T::one(),
            ratio: T::zero(),
            quad_min: T::one(),
            good_grad: false,
            gt: DVector::zeros(dim),
        }
    }

    pub fn resize(&mut self, dim: usize) {
        if self.gt.nrows() != dim {
            self.gt = DVector::zeros(dim);
        }
    }

    /// Sets both the initial and the current radius.
    pub fn set_initial_radius(&mut self, radius: T) {
        self.initial_radius = radius.min(self.options.max_radius);
        self.radius = self.initial_radius;
        self.good_grad = false;
    }

    pub fn reset(&mut self) {
        self.radius = self.initial_radius;
        self.ratio = T::zero();
        self.quad_min = T::one();
        self.good_grad = false;
    }

    pub fn radius(&self) -> T {
        self.radius
    }

    /// Whether [`trial_gradient`](TrustRegion::trial_gradient) holds the
    /// gradient in the trial point.
    pub fn good_grad(&self) -> bool {
        self.good_grad
    }

    pub fn trial_gradient(&self) -> &DVector<T> {
        &self.gt
    }

    pub fn is_acceptable(&self) -> bool {
        self.ratio >= self.options.acceptance_threshold
    }

    /// Computes the ratio of actual and predicted reduction.
    ///
    /// `fc` is the function value in the current point, `fx` in the trial
    /// point `x + step`, `qs` the value of the quadratic model for the step
    /// and `slope` the directional derivative `g' step`. When the reductions
    /// are dominated by round-off, the actual reduction is estimated from the
    /// gradient in the trial point, which is requested through
    /// `trial_gradient`.
    ///
    /// Returns `None` if the model does not predict a decrease.
    pub fn assess<G>(
        &mut self,
        fc: T,
        fx: T,
        qs: T,
        slope: T,
        step: &DVector<T>,
        trial_gradient: G,
    ) -> Option<T>
    where
        G: FnOnce(&mut DVector<T>),
    {
        let TrustRegionOptions {
            large_decrease_factor: sigma1,
            increase_factor: sigma3,
            ..
        } = self.options;

        let two = T::one() + T::one();
        let shift = fc.abs().max(T::one()) * T::EPSILON * convert(10.0);

        self.good_grad = false;

        let pred = qs - shift;
        if !(pred < T::zero()) {
            debug!("predicted reduction {} is not negative", pred);
            return None;
        }

        if !fx.is_finite() {
            debug!("function value in the trial point is not finite");
            self.ratio = convert(f64::NEG_INFINITY);
            self.quad_min = sigma1;
            return Some(self.ratio);
        }

        let mut ared = fx - fc + shift;
        let roundoff: T = T::EPSILON * convert(1e4);

        if qs.abs() < roundoff || ared.abs() < roundoff * fc.abs() {
            trial_gradient(&mut self.gt);
            self.good_grad = true;
            ared = (self.gt.dot(step) + slope) / two;
            debug!("reductions near round-off, actual reduction estimated as {}", ared);
        }

        let gamma = fx - fc - slope;
        self.quad_min = if gamma <= T::zero() {
            sigma3
        } else {
            sigma1.max(-slope / (two * gamma))
        };

        self.ratio = ared / pred;
        debug!("gain ratio = {} / {} = {}", ared, pred, self.ratio);

        Some(self.ratio)
    }

    /// Limits the radius by the step norm. Used until the first step is
    /// accepted.
    pub fn shrink_to_step(&mut self, step_norm: T) {
        if step_norm > T::zero() && step_norm < self.radius {
            debug!("shrink initial radius from {} to {}", self.radius, step_norm);
            self.radius = step_norm;
        }
    }

    /// Updates the radius based on the last assessed ratio.
    pub fn update(&mut self, step_norm: T) {
        let TrustRegionOptions {
            max_radius,
            acceptance_threshold: eta0,
            decrease_threshold: eta1,
            increase_threshold: eta2,
            large_decrease_factor: sigma1,
            small_decrease_factor: sigma2,
            increase_factor: sigma3,
        } = self.options;

        let Self {
            radius,
            ratio,
            quad_min,
            ..
        } = self;

        let old = *radius;
        let interp = *quad_min * step_norm;

        let new = if *ratio < eta0 {
            (quad_min.max(sigma1) * step_norm).min(sigma2 * old)
        } else if *ratio < eta1 {
            (sigma1 * old).max(interp.min(sigma2 * old))
        } else if *ratio < eta2 {
            (sigma1 * old).max(interp.min(sigma3 * old))
        } else {
            old.max(interp.min(sigma3 * old))
        };

        let new = new.min(max_radius);
        *radius = if new > T::zero() { new } else { sigma1 * old };

        debug!(
            "update radius from {} to {} (ratio = {}, || s || = {})",
            old, *radius, *ratio, step_norm
        );
    }
}
