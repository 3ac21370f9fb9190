//! Random-intercept linear mixed model: sufficient statistics and the
//! profiled (restricted) log-likelihood.
//!
//! Model
//! -----
//! `y = Xβ + Zu + ε`, `u ~ N(0, σᵤ² I)`, `ε ~ N(0, σₑ² I)`, with `Z` the
//! block-indicator matrix. Writing `γ = σᵤ² / σₑ²`, the scaled covariance
//! `V = I + γ ZZᵀ` is block diagonal with blocks `I + γ 11ᵀ`, whose inverse
//! is `I − c_g 11ᵀ` with `c_g = γ / (1 + n_g γ)`. Every quantity the GLS
//! solution needs therefore reduces to per-block sums:
//!
//! - `XᵀV⁻¹X = Σ_g (X_gᵀX_g − c_g s_g s_gᵀ)` with `s_g = X_gᵀ1`
//! - `XᵀV⁻¹y = Σ_g (X_gᵀy_g − c_g s_g Σy_g)`
//! - `yᵀV⁻¹y = Σ_g (y_gᵀy_g − c_g (Σy_g)²)`
//! - `ln |V| = Σ_g ln(1 + n_g γ)`
//!
//! The design-only sums live in [`GroupMoments`] and are shared by all
//! locations; the outcome sums live in [`LocationMoments`].
//!
//! The optimizer works on `θ = ln γ`, clamped to
//! `[LOG_RATIO_MIN, LOG_RATIO_MAX]`.
use crate::{
    design::DesignError,
    estimation::linalg::SpdFactor,
    optimization::{
        errors::{OptError, OptResult},
        loglik_optimizer::{Cost, Grad, LogLikelihood, Theta, validation::validate_theta},
    },
};
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::{f64::consts::PI, str::FromStr};

pub const LOG_RATIO_MIN: f64 = -30.0;
pub const LOG_RATIO_MAX: f64 = 30.0;

/// Which likelihood is profiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Criterion {
    /// Restricted maximum likelihood.
    #[default]
    Reml,
    Ml,
}

impl FromStr for Criterion {
    type Err = DesignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reml" => Ok(Criterion::Reml),
            "ml" => Ok(Criterion::Ml),
            _ => Err(DesignError::UnknownOption {
                what: "likelihood criterion",
                value: s.to_string(),
                expected: "'REML' or 'ML'",
            }),
        }
    }
}

/// Design-level per-block sums.
#[derive(Debug, Clone)]
pub struct GroupMoments {
    x: Array2<f64>,
    blocks: Vec<Vec<usize>>,
    sizes: Vec<f64>,
    xtx: Vec<Array2<f64>>,
    xt1: Vec<Array1<f64>>,
}

impl GroupMoments {
    pub fn new(x: &Array2<f64>, blocks: Vec<Vec<usize>>) -> Self {
        let k = x.ncols();
        let mut xtx = Vec::with_capacity(blocks.len());
        let mut xt1 = Vec::with_capacity(blocks.len());
        for rows in &blocks {
            let mut a = Array2::<f64>::zeros((k, k));
            let mut s = Array1::<f64>::zeros(k);
            for &i in rows {
                let xi = x.row(i);
                s += &xi;
                for p in 0..k {
                    for q in 0..k {
                        a[[p, q]] += xi[p] * xi[q];
                    }
                }
            }
            xtx.push(a);
            xt1.push(s);
        }
        let sizes = blocks.iter().map(|b| b.len() as f64).collect();
        Self { x: x.clone(), blocks, sizes, xtx, xt1 }
    }

    pub fn nobs(&self) -> usize {
        self.x.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.x.ncols()
    }

    pub fn ngroups(&self) -> usize {
        self.blocks.len()
    }

    /// Outcome-dependent sums for one location.
    pub fn location(&self, y: ArrayView1<'_, f64>) -> LocationMoments {
        let k = self.ncols();
        let g = self.ngroups();
        let mut xty = Vec::with_capacity(g);
        let mut sumy = Vec::with_capacity(g);
        let mut yty = 0.0;
        for rows in &self.blocks {
            let mut v = Array1::<f64>::zeros(k);
            let mut s = 0.0;
            for &i in rows {
                let yi = y[i];
                v.scaled_add(yi, &self.x.row(i));
                s += yi;
                yty += yi * yi;
            }
            xty.push(v);
            sumy.push(s);
        }
        LocationMoments { xty, sumy, yty }
    }

    /// Generalized least squares at variance ratio `gamma`.
    ///
    /// Errors
    /// ------
    /// - `OptError::NotPositiveDefinite` when `XᵀV⁻¹X` cannot be factored.
    pub fn gls(&self, gamma: f64, loc: &LocationMoments) -> OptResult<GlsSolution> {
        let k = self.ncols();
        let mut a = Array2::<f64>::zeros((k, k));
        let mut b = Array1::<f64>::zeros(k);
        let mut q = loc.yty;
        let mut ln_det_v = 0.0;
        for g in 0..self.ngroups() {
            let n_g = self.sizes[g];
            let c = gamma / (1.0 + n_g * gamma);
            let s = &self.xt1[g];
            a += &self.xtx[g];
            for p in 0..k {
                for r in 0..k {
                    a[[p, r]] -= c * s[p] * s[r];
                }
            }
            b += &loc.xty[g];
            b.scaled_add(-c * loc.sumy[g], s);
            q -= c * loc.sumy[g] * loc.sumy[g];
            ln_det_v += (n_g * gamma).ln_1p();
        }
        let factor = SpdFactor::new(&a).ok_or(OptError::NotPositiveDefinite { what: "X'V^-1X" })?;
        let beta = factor.solve(&b);
        let rss = q - b.dot(&beta);
        Ok(GlsSolution { beta, factor, rss, ln_det_v })
    }
}

/// Outcome-dependent per-block sums for one location.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationMoments {
    xty: Vec<Array1<f64>>,
    sumy: Vec<f64>,
    yty: f64,
}

/// GLS solution at a fixed variance ratio.
///
/// `rss` is the residual quadratic form `(y − Xβ)ᵀV⁻¹(y − Xβ)`, i.e. the
/// residual sum of squares in units of `σₑ²`.
#[derive(Debug, Clone)]
pub struct GlsSolution {
    pub beta: Array1<f64>,
    pub factor: SpdFactor,
    pub rss: f64,
    pub ln_det_v: f64,
}

/// Map an unconstrained `θ` to the variance ratio `γ = e^θ`.
pub fn ratio_from_theta(theta: f64) -> f64 {
    theta.clamp(LOG_RATIO_MIN, LOG_RATIO_MAX).exp()
}

/// Profile log-likelihood of `θ = ln γ` with `β` and `σₑ²` concentrated out.
///
/// - REML: `ℓ = −½[(n−k)(1 + ln(2π·rss/(n−k))) + ln|V| + ln|XᵀV⁻¹X|]`
/// - ML:   `ℓ = −½[n(1 + ln(2π·rss/n)) + ln|V|]`
#[derive(Debug, Clone, Copy)]
pub struct ProfileLikelihood<'a> {
    pub moments: &'a GroupMoments,
    pub criterion: Criterion,
}

impl ProfileLikelihood<'_> {
    /// Residual-variance denominator: `n − k` for REML, `n` for ML.
    pub fn scale_df(&self) -> f64 {
        let n = self.moments.nobs() as f64;
        match self.criterion {
            Criterion::Reml => n - self.moments.ncols() as f64,
            Criterion::Ml => n,
        }
    }

    pub fn evaluate(&self, gamma: f64, loc: &LocationMoments) -> OptResult<(f64, GlsSolution)> {
        let sol = self.moments.gls(gamma, loc)?;
        if !(sol.rss > 0.0) {
            return Err(OptError::DegenerateResidual { value: sol.rss });
        }
        let d = self.scale_df();
        let core = d * (1.0 + (2.0 * PI * sol.rss / d).ln()) + sol.ln_det_v;
        let ll = match self.criterion {
            Criterion::Reml => -0.5 * (core + sol.factor.ln_det()),
            Criterion::Ml => -0.5 * core,
        };
        Ok((ll, sol))
    }
}

impl LogLikelihood for ProfileLikelihood<'_> {
    type Data = LocationMoments;

    fn value(&self, theta: &Theta, data: &LocationMoments) -> OptResult<Cost> {
        let (ll, _) = self.evaluate(ratio_from_theta(theta[0]), data)?;
        Ok(ll)
    }

    fn check(&self, theta: &Theta, _data: &LocationMoments) -> OptResult<()> {
        validate_theta(theta, 1)
    }

    /// Analytic `dℓ/dθ = γ · dℓ/dγ`, zero outside the clamp interval.
    ///
    /// With `e = y − Xβ̂` and `w_g = 1/(1 + n_g γ)`:
    /// - `d rss/dγ = −Σ_g (w_g Σe_g)²` (envelope theorem in β)
    /// - `d ln|V|/dγ = Σ_g n_g w_g`
    /// - `d ln|XᵀV⁻¹X|/dγ = −Σ_g w_g² s_gᵀ(XᵀV⁻¹X)⁻¹s_g`
    fn grad(&self, theta: &Theta, data: &LocationMoments) -> OptResult<Grad> {
        let t = theta[0];
        if !(LOG_RATIO_MIN..=LOG_RATIO_MAX).contains(&t) {
            return Ok(Array1::zeros(1));
        }
        let gamma = t.exp();
        let (_, sol) = self.evaluate(gamma, data)?;
        let m = self.moments;
        let a_inv = match self.criterion {
            Criterion::Reml => Some(sol.factor.inverse()),
            Criterion::Ml => None,
        };
        let (mut d_rss, mut d_ln_v, mut d_ln_a) = (0.0, 0.0, 0.0);
        for g in 0..m.ngroups() {
            let w = 1.0 / (1.0 + m.sizes[g] * gamma);
            let s = &m.xt1[g];
            let e_sum = data.sumy[g] - s.dot(&sol.beta);
            d_rss -= (w * e_sum).powi(2);
            d_ln_v += m.sizes[g] * w;
            if let Some(a_inv) = &a_inv {
                d_ln_a -= w * w * s.dot(&a_inv.dot(s));
            }
        }
        let dl_dgamma = -0.5 * (self.scale_df() * d_rss / sol.rss + d_ln_v + d_ln_a);
        Ok(Array1::from_elem(1, gamma * dl_dgamma))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn blocks() -> Vec<Vec<usize>> {
        vec![vec![0, 1, 2], vec![3, 4], vec![5, 6, 7]]
    }

    fn x() -> Array2<f64> {
        array![
            [1.0, 0.5],
            [1.0, -1.0],
            [1.0, 2.0],
            [1.0, 0.0],
            [1.0, 1.5],
            [1.0, -0.5],
            [1.0, 1.0],
            [1.0, 3.0]
        ]
    }

    fn y() -> Array1<f64> {
        array![1.0, 0.2, 2.4, 3.1, 3.9, 0.4, 1.2, 2.8]
    }

    #[test]
    // Purpose
    // -------
    // With γ = 0, V = I and GLS must collapse to OLS.
    //
    // Given
    // -----
    // - An 8×2 design over three blocks.
    //
    // Expect
    // ------
    // - β and the residual sum of squares equal the OLS values; ln|V| = 0.
    fn gls_at_zero_ratio_equals_ols() {
        let moments = GroupMoments::new(&x(), blocks());
        let loc = moments.location(y().view());

        let sol = moments.gls(0.0, &loc).unwrap();

        let ols = crate::estimation::OlsEstimator::from_values(&x()).unwrap();
        let y2 = y().insert_axis(ndarray::Axis(1));
        let fit = ols.fit(&y2).unwrap();
        assert_abs_diff_eq!(sol.beta[0], fit.beta[[0, 0]], epsilon = 1e-10);
        assert_abs_diff_eq!(sol.beta[1], fit.beta[[1, 0]], epsilon = 1e-10);
        assert_abs_diff_eq!(sol.rss, fit.sigma2[0] * 6.0, epsilon = 1e-10);
        assert_abs_diff_eq!(sol.ln_det_v, 0.0, epsilon = 1e-15);
    }

    #[test]
    // Purpose
    // -------
    // The block-sum formulas must equal the dense GLS computation.
    //
    // Given
    // -----
    // - γ = 0.7; V built densely as I + γ ZZᵀ.
    //
    // Expect
    // ------
    // - Identical β, residual quadratic form and ln|V|.
    fn gls_block_sums_match_dense_computation() {
        let gamma = 0.7;
        let moments = GroupMoments::new(&x(), blocks());
        let loc = moments.location(y().view());

        let sol = moments.gls(gamma, &loc).unwrap();

        let n = 8;
        let mut v = Array2::<f64>::eye(n);
        for b in blocks() {
            for &i in &b {
                for &j in &b {
                    v[[i, j]] += gamma;
                }
            }
        }
        let v_factor = SpdFactor::new(&v).unwrap();
        let vinv = v_factor.inverse();
        let xv = x().t().dot(&vinv);
        let a = xv.dot(&x());
        let beta = SpdFactor::new(&a).unwrap().solve(&xv.dot(&y()));
        let r = &y() - &x().dot(&beta);
        let rss = r.dot(&vinv.dot(&r));
        assert_abs_diff_eq!(sol.beta[0], beta[0], epsilon = 1e-10);
        assert_abs_diff_eq!(sol.beta[1], beta[1], epsilon = 1e-10);
        assert_abs_diff_eq!(sol.rss, rss, epsilon = 1e-10);
        assert_abs_diff_eq!(sol.ln_det_v, v_factor.ln_det(), epsilon = 1e-10);
    }

    #[test]
    // Purpose
    // -------
    // The analytic θ-gradient must agree with a central difference of the
    // profile likelihood for both criteria.
    //
    // Given
    // -----
    // - θ ∈ {-1.5, 0.3}, step 1e-5.
    //
    // Expect
    // ------
    // - Agreement to 1e-6.
    fn analytic_gradient_matches_central_difference() {
        let moments = GroupMoments::new(&x(), blocks());
        let loc = moments.location(y().view());
        for criterion in [Criterion::Reml, Criterion::Ml] {
            let lik = ProfileLikelihood { moments: &moments, criterion };
            for t in [-1.5, 0.3] {
                let h = 1e-5;
                let up = lik.value(&array![t + h], &loc).unwrap();
                let down = lik.value(&array![t - h], &loc).unwrap();

                let g = lik.grad(&array![t], &loc).unwrap();

                assert_abs_diff_eq!(g[0], (up - down) / (2.0 * h), epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn evaluate_rejects_exact_fit() {
        let moments = GroupMoments::new(&x(), blocks());
        let loc = moments.location(Array1::<f64>::zeros(8).view());
        let lik = ProfileLikelihood { moments: &moments, criterion: Criterion::Reml };

        let err = lik.evaluate(1.0, &loc).unwrap_err();

        assert!(matches!(err, OptError::DegenerateResidual { .. }));
    }

    #[test]
    fn criterion_parses_case_insensitively() {
        assert_eq!("reml".parse::<Criterion>().unwrap(), Criterion::Reml);
        assert_eq!("ML".parse::<Criterion>().unwrap(), Criterion::Ml);
        assert!(matches!(
            "bayes".parse::<Criterion>(),
            Err(DesignError::UnknownOption { what: "likelihood criterion", .. })
        ));
    }
}
