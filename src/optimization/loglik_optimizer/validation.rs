//! Consistency checks shared by the optimizer layer.
//!
//! - [`verify_tol_grad`] / [`verify_tol_cost`]: optional tolerances must be
//!   finite and strictly positive.
//! - [`validate_theta`]: a parameter vector has the expected length and only
//!   finite entries (used by model `check` hooks).
//! - [`validate_grad`]: gradient length and finiteness.
//! - [`validate_theta_hat`] / [`validate_value`]: solver output sanity.
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{Grad, Theta},
};

pub fn verify_tol_grad(tol: Option<f64>) -> OptResult<()> {
    if let Some(tol) = tol {
        if !tol.is_finite() {
            return Err(OptError::InvalidTolGrad { tol, reason: "Tolerance must be finite." });
        }
        if tol <= 0.0 {
            return Err(OptError::InvalidTolGrad { tol, reason: "Tolerance must be positive." });
        }
    }
    Ok(())
}

pub fn verify_tol_cost(tol: Option<f64>) -> OptResult<()> {
    if let Some(tol) = tol {
        if !tol.is_finite() {
            return Err(OptError::InvalidTolCost { tol, reason: "Tolerance must be finite." });
        }
        if tol <= 0.0 {
            return Err(OptError::InvalidTolCost { tol, reason: "Tolerance must be positive." });
        }
    }
    Ok(())
}

/// Check length and finiteness of a candidate parameter vector.
///
/// Errors
/// ------
/// - `OptError::ThetaLengthMismatch` when `theta.len() != dim`.
/// - `OptError::InvalidThetaInput` for the first non-finite entry.
pub fn validate_theta(theta: &Theta, dim: usize) -> OptResult<()> {
    if theta.len() != dim {
        return Err(OptError::ThetaLengthMismatch { expected: dim, actual: theta.len() });
    }
    if let Some((index, &value)) = theta.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(OptError::InvalidThetaInput { index, value });
    }
    Ok(())
}

pub fn validate_grad(grad: &Grad, dim: usize) -> OptResult<()> {
    if grad.len() != dim {
        return Err(OptError::GradientDimMismatch { expected: dim, found: grad.len() });
    }
    for (index, &value) in grad.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::InvalidGradient {
                index,
                value,
                reason: "Gradient elements must be finite.",
            });
        }
    }
    Ok(())
}

/// Unwrap the solver's best parameter, rejecting missing or non-finite output.
pub fn validate_theta_hat(theta_hat: Option<Theta>) -> OptResult<Theta> {
    let t = theta_hat.ok_or(OptError::MissingThetaHat)?;
    for (index, &value) in t.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::InvalidThetaHat {
                index,
                value,
                reason: "Parameter estimates must be finite.",
            });
        }
    }
    Ok(t)
}

pub fn validate_value(value: f64) -> OptResult<()> {
    if !value.is_finite() {
        return Err(OptError::NonFiniteCost { value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn verify_tol_grad_rejects_non_positive() {
        assert!(matches!(verify_tol_grad(Some(0.0)), Err(OptError::InvalidTolGrad { .. })));
        assert!(matches!(verify_tol_grad(Some(f64::NAN)), Err(OptError::InvalidTolGrad { .. })));
        assert!(verify_tol_grad(None).is_ok());
    }

    #[test]
    // Purpose
    // -------
    // `validate_theta` must name the first offending entry.
    //
    // Given
    // -----
    // - A length-3 vector with NaN at index 1 and ∞ at index 2.
    //
    // Expect
    // ------
    // - `InvalidThetaInput { index: 1, .. }`.
    fn validate_theta_reports_first_non_finite_index() {
        let theta = array![0.0, f64::NAN, f64::INFINITY];

        let err = validate_theta(&theta, 3).unwrap_err();

        assert!(matches!(err, OptError::InvalidThetaInput { index: 1, .. }));
    }

    #[test]
    fn validate_theta_rejects_wrong_length() {
        let err = validate_theta(&array![0.0, 1.0], 1).unwrap_err();

        assert_eq!(err, OptError::ThetaLengthMismatch { expected: 1, actual: 2 });
    }

    #[test]
    fn validate_theta_hat_requires_presence() {
        assert_eq!(validate_theta_hat(None).unwrap_err(), OptError::MissingThetaHat);
    }
}
