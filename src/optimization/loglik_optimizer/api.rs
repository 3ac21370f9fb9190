//! `maximize` — the single entry point of the optimizer layer.
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        OptimOutcome, Theta,
        adapter::ArgMinAdapter,
        solver::solve,
        traits::{LogLikelihood, MLEOptions},
    },
};

/// Maximize `ℓ(θ)` with L-BFGS and the line search chosen in `opts`.
///
/// Parameters
/// ----------
/// - `f`: objective implementing [`LogLikelihood`].
/// - `theta0`: starting point, validated with `f.check` before any solver
///   work.
/// - `data`: payload forwarded to `value` / `grad`.
/// - `opts`: tolerances, line search, memory and verbosity.
///
/// Errors
/// ------
/// - Anything returned by `f.check`.
/// - Builder and runtime errors from the solver layer.
///
/// Example
/// -------
/// ```rust
/// use ndarray::array;
/// use tfce_stats::optimization::{errors::OptResult, loglik_optimizer::*};
///
/// struct Quadratic;
/// impl LogLikelihood for Quadratic {
///     type Data = f64;
///     fn value(&self, theta: &Theta, centre: &f64) -> OptResult<f64> {
///         Ok(-(theta[0] - centre).powi(2))
///     }
///     fn check(&self, _: &Theta, _: &f64) -> OptResult<()> {
///         Ok(())
///     }
/// }
///
/// let out = maximize(&Quadratic, array![0.0], &2.5, &MLEOptions::default()).unwrap();
/// assert!((out.theta_hat[0] - 2.5).abs() < 1e-4);
/// ```
pub fn maximize<F: LogLikelihood>(
    f: &F, theta0: Theta, data: &F::Data, opts: &MLEOptions,
) -> OptResult<OptimOutcome> {
    f.check(&theta0, data)?;
    solve(ArgMinAdapter::new(f, data), theta0, opts)
}
