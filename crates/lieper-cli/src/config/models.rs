use lieper::core::series::PoissonSeries;
use lieper::engine::config::TheoryConfig;
use lieper::engine::solver::IntegratingFactorSolver;
use lieper::engine::state::StateDict;

/// How the mean variables evolve once the theory is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MeanFlowKind {
    /// Momenta constant, coordinates drifting with `∂H/∂p`.
    #[default]
    SecularDrift,
    /// Mean variables held at their initial values.
    Frozen,
}

pub struct AppConfig {
    pub hamiltonian: PoissonSeries,
    pub core_config: TheoryConfig,
    pub order: usize,
    pub solver: IntegratingFactorSolver<PoissonSeries>,
    pub mean_flow: MeanFlowKind,
    pub initial: StateDict,
    pub times: Vec<f64>,
}
