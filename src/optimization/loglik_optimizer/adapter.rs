//! Bridge from [`LogLikelihood`] to argmin's `CostFunction` / `Gradient`.
//!
//! The cost is `c(θ) = -ℓ(θ)`. An analytic `∇ℓ` is negated; without one the
//! cost itself is finite-differenced (central first, forward as fallback), so
//! that branch needs no sign flip.
use std::cell::RefCell;

use crate::optimization::{
    errors::OptError,
    loglik_optimizer::{
        traits::LogLikelihood,
        types::{Cost, Grad, Theta},
        validation::validate_grad,
    },
};
use argmin::core::{CostFunction, Error, Gradient};
use finitediff::FiniteDiff;

#[derive(Debug, Clone)]
pub struct ArgMinAdapter<'a, F: LogLikelihood> {
    pub f: &'a F,
    pub data: &'a F::Data,
}

impl<'a, F: LogLikelihood> ArgMinAdapter<'a, F> {
    pub fn new(f: &'a F, data: &'a F::Data) -> Self {
        Self { f, data }
    }

    /// Finite-difference gradient of the cost.
    ///
    /// The closure handed to `finitediff` must return `f64`, so the first
    /// evaluation error is parked in a `RefCell` and NaN is returned in its
    /// place. Central differences are tried first; a captured error or a
    /// non-finite result triggers one forward-difference retry, whose error
    /// (if any) is returned.
    fn fd_gradient(&self, theta: &Theta) -> Result<Grad, Error> {
        let dim = theta.len();
        let failure: RefCell<Option<Error>> = RefCell::new(None);
        let cost = |t: &Theta| -> f64 {
            self.cost(t).unwrap_or_else(|e| {
                failure.borrow_mut().get_or_insert(e);
                f64::NAN
            })
        };

        let central = theta.central_diff(&cost);
        if failure.borrow().is_none() && validate_grad(&central, dim).is_ok() {
            return Ok(central);
        }

        failure.replace(None);
        let forward = theta.forward_diff(&cost);
        if let Some(err) = failure.take() {
            return Err(err);
        }
        validate_grad(&forward, dim)?;
        Ok(forward)
    }
}

impl<F: LogLikelihood> CostFunction for ArgMinAdapter<'_, F> {
    type Param = Theta;
    type Output = Cost;

    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        let value = self.f.value(theta, self.data)?;
        if !value.is_finite() {
            return Err(OptError::NonFiniteCost { value }.into());
        }
        Ok(-value)
    }
}

impl<F: LogLikelihood> Gradient for ArgMinAdapter<'_, F> {
    type Param = Theta;
    type Gradient = Grad;

    fn gradient(&self, theta: &Self::Param) -> Result<Self::Gradient, Error> {
        match self.f.grad(theta, self.data) {
            Ok(g) => {
                validate_grad(&g, theta.len())?;
                Ok(-g)
            }
            Err(OptError::GradientNotImplemented) => self.fd_gradient(theta),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::errors::OptResult;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Sign convention of the cost and analytic gradient.
    // - Finite-difference fallback, including the forward retry near a
    //   domain edge.
    // -------------------------------------------------------------------------

    /// ℓ(θ) = -(θ - 1)², analytic gradient optional.
    struct Parabola {
        analytic: bool,
    }

    impl LogLikelihood for Parabola {
        type Data = ();

        fn value(&self, theta: &Theta, _: &()) -> OptResult<f64> {
            Ok(-(theta[0] - 1.0).powi(2))
        }

        fn check(&self, _: &Theta, _: &()) -> OptResult<()> {
            Ok(())
        }

        fn grad(&self, theta: &Theta, _: &()) -> OptResult<Grad> {
            if self.analytic {
                Ok(array![-2.0 * (theta[0] - 1.0)])
            } else {
                Err(OptError::GradientNotImplemented)
            }
        }
    }

    /// ℓ(θ) = ln θ, undefined for θ <= 0.
    struct LogBarrier;

    impl LogLikelihood for LogBarrier {
        type Data = ();

        fn value(&self, theta: &Theta, _: &()) -> OptResult<f64> {
            if theta[0] <= 0.0 {
                return Err(OptError::InvalidThetaInput { index: 0, value: theta[0] });
            }
            Ok(theta[0].ln())
        }

        fn check(&self, _: &Theta, _: &()) -> OptResult<()> {
            Ok(())
        }
    }

    #[test]
    fn cost_is_negated_log_likelihood() {
        let model = Parabola { analytic: true };
        let adapter = ArgMinAdapter::new(&model, &());

        let c = adapter.cost(&array![3.0]).unwrap();

        assert_eq!(c, 4.0);
    }

    #[test]
    fn analytic_gradient_is_negated() {
        let model = Parabola { analytic: true };
        let adapter = ArgMinAdapter::new(&model, &());

        let g = adapter.gradient(&array![3.0]).unwrap();

        assert_eq!(g[0], 4.0);
    }

    #[test]
    // Purpose
    // -------
    // Without an analytic gradient the adapter differentiates the cost.
    //
    // Given
    // -----
    // - `Parabola { analytic: false }` at θ = 3.
    //
    // Expect
    // ------
    // - ∇c(3) ≈ 4.
    fn finite_difference_gradient_matches_analytic() {
        let model = Parabola { analytic: false };
        let adapter = ArgMinAdapter::new(&model, &());

        let g = adapter.gradient(&array![3.0]).unwrap();

        assert_abs_diff_eq!(g[0], 4.0, epsilon = 1e-5);
    }

    #[test]
    // Purpose
    // -------
    // A central stencil that crosses the domain edge must not leak its
    // error when a forward stencil stays inside the domain.
    //
    // Given
    // -----
    // - `LogBarrier` at θ = 1e-9 (the central step reaches θ < 0).
    //
    // Expect
    // ------
    // - A finite, negative cost gradient (cost = -ln θ decreases in θ).
    fn finite_difference_retries_forward_at_domain_edge() {
        let model = LogBarrier;
        let adapter = ArgMinAdapter::new(&model, &());

        let g = adapter.gradient(&array![1e-9]).unwrap();

        assert!(g[0].is_finite() && g[0] < 0.0);
    }
}
