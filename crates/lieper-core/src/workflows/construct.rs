use crate::core::series::Series;
use crate::engine::config::TheoryConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::theory::{BoxedMeanFlow, BoxedSolver, PerturbationTheory};
use tracing::{info, instrument};

#[instrument(skip_all, name = "construct_workflow")]
pub fn run<S: Series>(
    hamiltonian: S,
    config: TheoryConfig,
    solvers: Vec<BoxedSolver<'_, S>>,
    mean_flow: Option<BoxedMeanFlow<S>>,
    reporter: &ProgressReporter,
) -> Result<PerturbationTheory<S>, EngineError> {
    reporter.report(Progress::Message(format!(
        "Constructing a perturbation theory of order {}",
        solvers.len()
    )));
    let mut theory = PerturbationTheory::new(hamiltonian, config, solvers, reporter)?;
    if let Some(flow) = mean_flow {
        theory.set_mean_flow(flow);
    }
    info!(
        order = theory.order(),
        mean_hamiltonian = %theory.mean_hamiltonian(),
        "Theory ready."
    );
    Ok(theory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::series::{PoissonSeries, Truncation};
    use crate::engine::config::TheoryConfigBuilder;
    use crate::engine::solver::IntegratingFactorSolver;
    use crate::engine::state::StateDict;
    use crate::engine::strategy::SecularDrift;

    #[test]
    fn attaches_the_mean_flow() {
        let lam = PoissonSeries::symbol("Lam");
        let h = PoissonSeries::from_ratio(-1, 2) * lam.pow(-2).unwrap()
            + PoissonSeries::symbol("eps") * lam.clone() * PoissonSeries::cos_of("lam");
        let config = TheoryConfigBuilder::new()
            .eps("eps")
            .momenta(["Lam"])
            .coordinates(["lam"])
            .truncation(Truncation::on_symbol("eps", 2))
            .build()
            .unwrap();
        let solver: BoxedSolver<'_, PoissonSeries> =
            Box::new(IntegratingFactorSolver::periodic("lam", lam.pow(3).unwrap()));

        let flow: BoxedMeanFlow<PoissonSeries> = Box::new(SecularDrift);

        let mut theory = run(
            h,
            config,
            vec![solver],
            Some(flow),
            &ProgressReporter::new(),
        )
        .unwrap();

        let init: StateDict = [("Lam", 1.0), ("lam", 0.0), ("eps", 1e-3)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        theory.set_init(&init).unwrap();
        assert!(theory.evaluate(1.0).is_ok());
    }
}
