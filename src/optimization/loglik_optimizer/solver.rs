//! L-BFGS assembly and execution for both line searches.
//!
//! The line search is the only generic that differs between the two
//! solvers, so [`solve`] builds the matching `LBFGS` and hands it to one
//! shared executor. Memory and tolerances come from [`MLEOptions`]; the
//! iteration cap is applied on the executor state.
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        adapter::ArgMinAdapter,
        traits::{LineSearcher, LogLikelihood, MLEOptions, OptimOutcome},
        types::{Cost, DEFAULT_LBFGS_MEM, Grad, Theta},
    },
};
use argmin::{
    core::{CostFunction, Executor, IterState, Solver, State},
    solver::{
        linesearch::{HagerZhangLineSearch, MoreThuenteLineSearch},
        quasinewton::LBFGS,
    },
};

type Lbfgs<L> = LBFGS<L, Theta, Grad, Cost>;

/// Run L-BFGS with the line search selected in `opts`.
///
/// Errors
/// ------
/// - `OptError` when argmin rejects a tolerance or fails at runtime (line
///   search breakdown, model error raised inside a cost evaluation).
/// - Validation errors from [`OptimOutcome::new`].
pub fn solve<F: LogLikelihood>(
    problem: ArgMinAdapter<'_, F>, theta0: Theta, opts: &MLEOptions,
) -> OptResult<OptimOutcome> {
    match opts.line_searcher {
        LineSearcher::MoreThuente => {
            let solver = lbfgs(MoreThuenteLineSearch::new(), opts)?;
            execute(problem, solver, theta0, opts)
        }
        LineSearcher::HagerZhang => {
            let solver = lbfgs(HagerZhangLineSearch::new(), opts)?;
            execute(problem, solver, theta0, opts)
        }
    }
}

/// L-BFGS over `linesearch` with memory and optional tolerances applied.
/// A `None` tolerance keeps argmin's default.
fn lbfgs<L>(linesearch: L, opts: &MLEOptions) -> OptResult<Lbfgs<L>> {
    let mut solver = LBFGS::new(linesearch, opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM));
    if let Some(g) = opts.tols.tol_grad {
        solver = solver.with_tolerance_grad(g)?;
    }
    if let Some(c) = opts.tols.tol_cost {
        solver = solver.with_tolerance_cost(c)?;
    }
    Ok(solver)
}

fn execute<'a, F, S>(
    problem: ArgMinAdapter<'a, F>, solver: S, theta0: Theta, opts: &MLEOptions,
) -> OptResult<OptimOutcome>
where
    F: LogLikelihood,
    S: Solver<ArgMinAdapter<'a, F>, IterState<Theta, Grad, (), (), (), Cost>> + Send + 'static,
{
    if opts.verbose {
        let start = -problem.cost(&theta0)?;
        tracing::debug!(theta0 = ?theta0, loglik = start, "Starting variance-component search");
    }
    let mut executor = Executor::new(problem, solver).configure(|state| state.param(theta0));
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        executor = executor.add_observer(
            argmin_observer_slog::SlogLogger::term_noblock(),
            argmin::core::observers::ObserverMode::Always,
        );
    }
    if let Some(cap) = opts.tols.max_iter {
        executor = executor.configure(|state| state.max_iters(cap as u64));
    }

    let mut last = executor.run()?.state().clone();
    let grad = last.take_gradient();
    OptimOutcome::new(
        last.take_best_param(),
        -last.get_best_cost(),
        last.get_termination_status().clone(),
        last.get_iter(),
        last.get_func_counts().clone(),
        grad,
    )
}
