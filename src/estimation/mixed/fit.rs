//! Per-location mixed-model fitting with a typed failure channel.
use crate::{
    design::{DesignMatrix, GroupLabels},
    estimation::{
        errors::{EstimationError, EstimationResult},
        linalg::symmetric_inverse,
        mixed::{
            MixedOptions,
            model::{GroupMoments, ProfileLikelihood, ratio_from_theta},
        },
    },
    optimization::{errors::OptError, loglik_optimizer::maximize},
};
use ndarray::{Array1, Array2, ArrayView1};
use rayon::prelude::*;

/// Fixed-effect estimates and variance components for one location.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedEffects {
    pub beta: Array1<f64>,
    pub std_err: Array1<f64>,
    /// Wald statistics `β / SE(β)`, intercept first.
    pub tvalues: Array1<f64>,
    pub sigma2_e: f64,
    pub sigma2_u: f64,
    pub loglik: f64,
    pub iterations: usize,
}

/// Why a single location could not be fitted.
#[derive(Debug, Clone, PartialEq)]
pub enum FitFailure {
    /// The optimizer ran out of iterations.
    NotConverged { iterations: usize, status: String },
    /// The optimizer or the likelihood raised an error.
    Optimizer(OptError),
    /// Final estimates are not finite.
    NonFinite,
}

impl std::fmt::Display for FitFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FitFailure::NotConverged { iterations, status } => {
                write!(f, "did not converge after {iterations} iterations ({status})")
            }
            FitFailure::Optimizer(err) => write!(f, "{err}"),
            FitFailure::NonFinite => write!(f, "non-finite fixed-effect estimates"),
        }
    }
}

pub type LocationFit = Result<FixedEffects, FitFailure>;

/// Field-wide result. Failed locations have all-zero statistics in
/// `tvalues` and are listed in `failures` with their column index.
#[derive(Debug, Clone)]
pub struct MixedFieldFit {
    /// k×m Wald statistics.
    pub tvalues: Array2<f64>,
    pub fits: Vec<LocationFit>,
    pub failures: Vec<(usize, FitFailure)>,
}

/// Random-intercept model bound to one design and grouping.
#[derive(Debug, Clone)]
pub struct MixedModel {
    moments: GroupMoments,
    options: MixedOptions,
}

impl MixedModel {
    /// Errors
    /// ------
    /// - `EstimationError::Design` when `groups` does not align with the design.
    /// - `EstimationError::TooFewGroups` for a single block.
    /// - `EstimationError::RankDeficient` for a singular design.
    pub fn new(
        design: &DesignMatrix, groups: &GroupLabels, options: MixedOptions,
    ) -> EstimationResult<Self> {
        groups.check_rows(design.nobs())?;
        let blocks = groups.blocks();
        if blocks.len() < 2 {
            return Err(EstimationError::TooFewGroups { found: blocks.len() });
        }
        let x = design.values();
        symmetric_inverse(&x.t().dot(x))?;
        Ok(Self { moments: GroupMoments::new(x, blocks), options })
    }

    pub fn ncols(&self) -> usize {
        self.moments.ncols()
    }

    pub fn options(&self) -> &MixedOptions {
        &self.options
    }

    /// Fit one outcome column.
    pub fn fit_location(&self, y: ArrayView1<'_, f64>) -> LocationFit {
        let lik = ProfileLikelihood { moments: &self.moments, criterion: self.options.criterion };
        let loc = self.moments.location(y);
        let theta0 = Array1::from_elem(1, self.options.init_log_ratio);
        let outcome =
            maximize(&lik, theta0, &loc, &self.options.mle).map_err(FitFailure::Optimizer)?;
        if outcome.hit_max_iter() {
            return Err(FitFailure::NotConverged {
                iterations: outcome.iterations,
                status: outcome.status,
            });
        }
        let gamma = ratio_from_theta(outcome.theta_hat[0]);
        let (loglik, sol) = lik.evaluate(gamma, &loc).map_err(FitFailure::Optimizer)?;
        let sigma2_e = sol.rss / lik.scale_df();
        let cov_diag = sol.factor.inverse().diag().mapv(|d| d * sigma2_e);
        let std_err = cov_diag.mapv(f64::sqrt);
        let tvalues = &sol.beta / &std_err;
        if tvalues.iter().any(|t| !t.is_finite()) {
            return Err(FitFailure::NonFinite);
        }
        Ok(FixedEffects {
            beta: sol.beta,
            std_err,
            tvalues,
            sigma2_e,
            sigma2_u: gamma * sigma2_e,
            loglik,
            iterations: outcome.iterations,
        })
    }

    /// Fit every column of `y` in parallel.
    ///
    /// A failed location never aborts the field: its statistics are zero,
    /// a `warn!` names its index, and the failure is kept in the result.
    ///
    /// Errors
    /// ------
    /// - `EstimationError::DimensionMismatch` when `y` has the wrong row count.
    pub fn fit_field(&self, y: &Array2<f64>) -> EstimationResult<MixedFieldFit> {
        if y.nrows() != self.moments.nobs() {
            return Err(EstimationError::DimensionMismatch {
                what: "outcome rows",
                expected: self.moments.nobs(),
                found: y.nrows(),
            });
        }
        let fits: Vec<LocationFit> =
            (0..y.ncols()).into_par_iter().map(|l| self.fit_location(y.column(l))).collect();

        let mut tvalues = Array2::<f64>::zeros((self.ncols(), y.ncols()));
        let mut failures = Vec::new();
        for (l, fit) in fits.iter().enumerate() {
            match fit {
                Ok(fe) => tvalues.column_mut(l).assign(&fe.tvalues),
                Err(reason) => {
                    tracing::warn!(location = l, %reason, "mixed-model fit failed; statistics set to zero");
                    failures.push((l, reason.clone()));
                }
            }
        }
        Ok(MixedFieldFit { tvalues, fits, failures })
    }
}
