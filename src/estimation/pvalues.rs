//! Two-sided raw p-values for statistic fields.
//!
//! OLS statistics are referred to Student's t with the residual degrees of
//! freedom; mixed-model statistics (Wald z) to the standard normal. NaN in,
//! NaN out: sanitization to 1 happens in `correction`.
use statrs::distribution::{ContinuousCDF, Normal, StudentsT};

use ndarray::Array2;

/// `2 · P(T_df > |t|)` element-wise. A zero `df` yields an all-NaN field.
pub fn student_t_two_sided(t: &Array2<f64>, df: usize) -> Array2<f64> {
    match StudentsT::new(0.0, 1.0, df as f64) {
        Ok(dist) => t.mapv(|v| if v.is_nan() { f64::NAN } else { 2.0 * dist.sf(v.abs()) }),
        Err(_) => Array2::from_elem(t.dim(), f64::NAN),
    }
}

/// `2 · P(Z > |z|)` element-wise.
pub fn normal_two_sided(z: &Array2<f64>) -> Array2<f64> {
    z.mapv(normal_two_sided_scalar)
}

pub fn normal_two_sided_scalar(z: f64) -> f64 {
    if z.is_nan() {
        return f64::NAN;
    }
    match Normal::new(0.0, 1.0) {
        Ok(dist) => 2.0 * dist.sf(z.abs()),
        Err(_) => f64::NAN,
    }
}
