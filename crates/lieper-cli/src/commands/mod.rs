pub mod check;
pub mod run;

use crate::config::{AppConfig, MeanFlowKind};
use crate::error::Result;
use lieper::core::series::PoissonSeries;
use lieper::engine::error::EngineError;
use lieper::engine::progress::ProgressReporter;
use lieper::engine::state::StateDict;
use lieper::engine::strategy::SecularDrift;
use lieper::engine::theory::{BoxedMeanFlow, BoxedSolver, PerturbationTheory};
use lieper::workflows;
use tracing::info;

/// Builds the theory described by `config`, using the configured solver at every order.
fn construct_theory(
    config: &AppConfig,
    reporter: &ProgressReporter,
) -> Result<PerturbationTheory<PoissonSeries>> {
    let solvers: Vec<BoxedSolver<'_, PoissonSeries>> = (0..config.order)
        .map(|_| Box::new(config.solver.clone()) as BoxedSolver<'_, PoissonSeries>)
        .collect();
    let mean_flow: BoxedMeanFlow<PoissonSeries> = match config.mean_flow {
        MeanFlowKind::SecularDrift => Box::new(SecularDrift),
        MeanFlowKind::Frozen => Box::new(
            |init: &StateDict, _t: f64| -> std::result::Result<StateDict, EngineError> {
                Ok(init.clone())
            },
        ),
    };

    info!(order = config.order, "Constructing the perturbation theory...");
    let theory = workflows::construct::run(
        config.hamiltonian.clone(),
        config.core_config.clone(),
        solvers,
        Some(mean_flow),
        reporter,
    )?;
    Ok(theory)
}
