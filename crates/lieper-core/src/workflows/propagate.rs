use crate::core::series::Series;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::state::StateDict;
use crate::engine::theory::PerturbationTheory;
use tracing::{info, instrument};

/// State of the system at one instant, in the original variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub time: f64,
    pub state: StateDict,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    pub samples: Vec<Sample>,
}

impl Trajectory {
    /// Names of all quantities present in the samples, in sorted order.
    pub fn columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = self
            .samples
            .iter()
            .flat_map(|sample| sample.state.keys().cloned())
            .collect();
        columns.sort();
        columns.dedup();
        columns
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Sets the initial conditions of `theory` and evaluates it at every time in `times`.
#[instrument(skip_all, name = "propagate_workflow")]
pub fn run<S: Series>(
    theory: &mut PerturbationTheory<S>,
    init: &StateDict,
    times: &[f64],
    reporter: &ProgressReporter,
) -> Result<Trajectory, EngineError> {
    reporter.report(Progress::PhaseStart {
        name: "Initial Conditions",
    });
    theory.set_init(init)?;
    reporter.report(Progress::PhaseFinish);

    reporter.report(Progress::PhaseStart { name: "Evaluation" });
    let samples = reporter.task(times.len() as u64, || {
        times
            .iter()
            .map(|&time| {
                let state = theory.evaluate(time)?;
                reporter.report(Progress::TaskIncrement);
                Ok(Sample { time, state })
            })
            .collect::<Result<Vec<_>, EngineError>>()
    })?;
    reporter.report(Progress::PhaseFinish);

    info!(samples = samples.len(), "Trajectory evaluated.");
    Ok(Trajectory { samples })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::series::{PoissonSeries, Truncation};
    use crate::engine::config::TheoryConfigBuilder;
    use crate::engine::solver::IntegratingFactorSolver;
    use crate::engine::strategy::SecularDrift;
    use crate::engine::theory::BoxedSolver;

    fn theory() -> PerturbationTheory<PoissonSeries> {
        let lam = PoissonSeries::symbol("Lam");
        let h = PoissonSeries::from_ratio(-1, 2) * lam.pow(-2).unwrap()
            + PoissonSeries::symbol("eps") * PoissonSeries::symbol("P");
        let config = TheoryConfigBuilder::new()
            .eps("eps")
            .momenta(["Lam"])
            .coordinates(["lam"])
            .truncation(Truncation::on_symbol("eps", 2))
            .build()
            .unwrap();
        let solver: BoxedSolver<'_, PoissonSeries> =
            Box::new(IntegratingFactorSolver::new("lam", lam.pow(3).unwrap()));
        PerturbationTheory::new(h, config, vec![solver], &ProgressReporter::new())
            .unwrap()
            .with_mean_flow(SecularDrift)
    }

    fn init() -> StateDict {
        [("Lam", 1.0), ("lam", 0.0), ("P", 0.2), ("eps", 1e-3)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn evaluates_every_requested_time() {
        let mut theory = theory();
        let trajectory =
            run(&mut theory, &init(), &[0.0, 0.5, 1.0], &ProgressReporter::new()).unwrap();
        assert_eq!(trajectory.len(), 3);
        assert_eq!(trajectory.samples[1].time, 0.5);
        assert_eq!(trajectory.columns(), vec!["Lam", "P", "eps", "lam"]);

        // The mean momentum is conserved, so Lam stays near its initial value.
        for sample in &trajectory.samples {
            assert!((sample.state["Lam"] - 1.0).abs() < 1e-5);
        }
        assert!(trajectory.samples[2].state["lam"] > trajectory.samples[0].state["lam"]);
    }

    #[test]
    fn empty_time_grid_yields_empty_trajectory() {
        let mut theory = theory();
        let trajectory = run(&mut theory, &init(), &[], &ProgressReporter::new()).unwrap();
        assert!(trajectory.is_empty());
        assert!(theory.init_list().is_some());
    }

    #[test]
    fn missing_state_variable_fails_early() {
        let mut theory = theory();
        let mut init = init();
        init.remove("lam");
        let result = run(&mut theory, &init, &[0.0], &ProgressReporter::new());
        assert!(matches!(result, Err(EngineError::MissingVariable { .. })));
    }
}
