use super::cache::LieCache;
use super::config::TheoryConfig;
use super::error::EngineError;
use super::progress::{Progress, ProgressReporter};
use super::solver::HomologicalSolver;
use super::state::{InitialConditions, StateDict, Transform};
use super::strategy::MeanFlow;
use crate::core::lie::{PhaseSpace, is_canonical, lie_series};
use crate::core::series::{Series, Truncation, inverse_factorial};
use tracing::{debug, info, instrument};

pub type BoxedSolver<'a, S> = Box<dyn HomologicalSolver<S> + 'a>;
pub type BoxedMeanFlow<S> = Box<dyn MeanFlow<S> + Send + Sync>;

/// A fully constructed Lie-transform perturbation theory.
///
/// Construction runs every order to completion; afterwards the histories are read-only.
/// `hamiltonians[i]` is the Hamiltonian after `i` steps, `generators[i]` the generating
/// function of step `i + 1`, and `direct[m]` / `inverse[m]` map between the variables of
/// levels `m` and `m - 1` (`direct[0]` and `inverse[0]` are the identity).
pub struct PerturbationTheory<S: Series> {
    config: TheoryConfig,
    space: PhaseSpace,
    hamiltonians: Vec<S>,
    generators: Vec<S>,
    direct: Vec<Transform<S>>,
    inverse: Vec<Transform<S>>,
    mean_flow: Option<BoxedMeanFlow<S>>,
    init: Option<InitialConditions>,
}

struct Step<S: Series> {
    hamiltonian: S,
    generator: S,
    direct: Transform<S>,
    inverse: Transform<S>,
}

impl<S: Series> PerturbationTheory<S> {
    /// Builds the theory to order `solvers.len()`, one homological solver per order.
    #[instrument(skip_all, name = "perturbation_theory")]
    pub fn new(
        hamiltonian: S,
        config: TheoryConfig,
        solvers: Vec<BoxedSolver<'_, S>>,
        reporter: &ProgressReporter,
    ) -> Result<Self, EngineError> {
        let order = solvers.len();
        if order == 0 {
            return Err(EngineError::InvalidOrder(
                "at least one homological solver is required".to_string(),
            ));
        }
        let space = config.phase_space()?;
        validate_eps(&hamiltonian, &config, &space)?;

        info!(
            order,
            degrees_of_freedom = space.degrees_of_freedom(),
            "Constructing perturbation theory."
        );
        debug!(hamiltonian = %hamiltonian, "Initial Hamiltonian.");

        let identity = Transform::identity(&space);
        let mut hamiltonians = Vec::with_capacity(order + 1);
        let mut generators = Vec::with_capacity(order);
        let mut direct = Vec::with_capacity(order + 1);
        let mut inverse = Vec::with_capacity(order + 1);
        hamiltonians.push(hamiltonian);
        direct.push(identity.clone());
        inverse.push(identity);

        for (i, solver) in solvers.iter().enumerate() {
            let m = i + 1;
            reporter.report(Progress::OrderStart {
                order: m,
                total: order,
            });
            let step = run_step(
                &hamiltonians[i],
                solver.as_ref(),
                m,
                order,
                &config,
                &space,
                reporter,
            )?;
            debug!(
                order = m,
                generator = %step.generator,
                hamiltonian = %step.hamiltonian,
                "Completed perturbation step."
            );
            hamiltonians.push(step.hamiltonian);
            generators.push(step.generator);
            direct.push(step.direct);
            inverse.push(step.inverse);
            reporter.report(Progress::PhaseFinish);
        }

        info!("Perturbation theory constructed.");
        Ok(Self {
            config,
            space,
            hamiltonians,
            generators,
            direct,
            inverse,
            mean_flow: None,
            init: None,
        })
    }

    pub fn with_mean_flow(mut self, flow: impl MeanFlow<S> + Send + Sync + 'static) -> Self {
        self.mean_flow = Some(Box::new(flow));
        self
    }

    pub fn set_mean_flow(&mut self, flow: BoxedMeanFlow<S>) {
        self.mean_flow = Some(flow);
    }

    pub fn order(&self) -> usize {
        self.generators.len()
    }

    pub fn config(&self) -> &TheoryConfig {
        &self.config
    }

    pub fn phase_space(&self) -> &PhaseSpace {
        &self.space
    }

    pub fn hamiltonians(&self) -> &[S] {
        &self.hamiltonians
    }

    pub fn generators(&self) -> &[S] {
        &self.generators
    }

    pub fn direct(&self) -> &[Transform<S>] {
        &self.direct
    }

    pub fn inverse(&self) -> &[Transform<S>] {
        &self.inverse
    }

    /// The final, averaged Hamiltonian.
    pub fn mean_hamiltonian(&self) -> &S {
        // One entry per level: H_0 plus one per order.
        &self.hamiltonians[self.order()]
    }

    pub fn init_list(&self) -> Option<&InitialConditions> {
        self.init.as_ref()
    }

    /// Maps `init`, given in the original variables, through every inverse transform
    /// and stores the whole chain. Entries that are not state variables, such as the
    /// numerical value of the small parameter, are carried to every level.
    #[instrument(skip_all, name = "set_init")]
    pub fn set_init(&mut self, init: &StateDict) -> Result<(), EngineError> {
        if let Some(name) = self.space.state_variables().find(|v| !init.contains_key(*v)) {
            return Err(EngineError::MissingVariable { name: name.clone() });
        }

        let mut levels = Vec::with_capacity(self.inverse.len());
        let mut current = init.clone();
        for transform in self.inverse.iter().skip(1) {
            let next = transform.apply(&current)?;
            levels.push(std::mem::replace(&mut current, next));
        }
        debug!(mean = ?current, "Initial conditions mapped to mean variables.");
        levels.push(current);

        self.init = Some(InitialConditions::new(levels));
        Ok(())
    }

    /// The state in the original variables at time `t`.
    #[instrument(skip(self), name = "evaluate")]
    pub fn evaluate(&self, t: f64) -> Result<StateDict, EngineError> {
        let init = self.init.as_ref().ok_or(EngineError::UninitializedState)?;
        let flow = self.mean_flow.as_deref().ok_or_else(|| {
            EngineError::UnimplementedStrategy("no mean-flow strategy attached".to_string())
        })?;

        let mut state = flow.solve_last(self.mean_hamiltonian(), &self.space, init.mean(), t)?;
        for transform in self.direct.iter().skip(1).rev() {
            state = transform.apply(&state)?;
        }
        Ok(state)
    }

    /// Checks every direct transform for canonicity up to the order of the theory.
    ///
    /// Returns `(level, a, b)` for each transform whose bracket `{a', b'}` is wrong.
    pub fn canonicity_violations(&self) -> Result<Vec<(usize, String, String)>, EngineError> {
        let truncation = self.check_truncation();
        let mut violations = Vec::new();
        for (level, transform) in self.direct.iter().enumerate() {
            if let Some((a, b)) = is_canonical(&transform.images(), &self.space, &truncation)? {
                violations.push((level, a, b));
            }
        }
        Ok(violations)
    }

    fn check_truncation(&self) -> Truncation {
        match &self.config.truncation {
            Truncation::None => self.config.eps_truncation(self.order()),
            active => active.clone(),
        }
    }
}

fn validate_eps<S: Series>(
    hamiltonian: &S,
    config: &TheoryConfig,
    space: &PhaseSpace,
) -> Result<(), EngineError> {
    let eps = config.eps.as_str();
    if eps.trim().is_empty() {
        return Err(EngineError::ArgumentMismatch(
            "the small parameter needs a name".to_string(),
        ));
    }
    if space.contains(eps) {
        return Err(EngineError::ArgumentMismatch(format!(
            "small parameter '{}' is also a phase-space variable",
            eps
        )));
    }
    if !hamiltonian.is_polynomial_in(eps) {
        return Err(EngineError::TypeMismatch {
            symbol: eps.to_string(),
            reason: "it appears inside a trigonometric argument".to_string(),
        });
    }
    if !hamiltonian.filter_by_degree(eps, |d| d < 0).is_zero() {
        return Err(EngineError::TypeMismatch {
            symbol: eps.to_string(),
            reason: "it appears with a negative exponent".to_string(),
        });
    }
    Ok(())
}

/// One transition `H_{m-1} -> H_m`: decompose, solve, reconstruct, build the transforms.
fn run_step<S: Series>(
    current: &S,
    solver: &dyn HomologicalSolver<S>,
    m: usize,
    order: usize,
    config: &TheoryConfig,
    space: &PhaseSpace,
    reporter: &ProgressReporter,
) -> Result<Step<S>, EngineError> {
    let eps_name = config.eps.as_str();
    let truncation = &config.truncation;
    let eps = S::symbol(eps_name);

    let pieces = (0..=order)
        .map(|j| current.homogeneous_piece(eps_name, j as i32))
        .collect::<Result<Vec<_>, _>>()?;
    let dropped = current.filter_by_degree(eps_name, |d| d > order as i32);
    if !dropped.is_zero() {
        debug!(order = m, "Ignoring terms beyond the order of the theory.");
    }

    let generator = solver.solve(&pieces[m])?;
    if !generator.is_polynomial_in(eps_name)
        || !generator.filter_by_degree(eps_name, |d| d != 0).is_zero()
    {
        return Err(EngineError::UnimplementedStrategy(format!(
            "generator of order {} depends on '{}'",
            m, eps_name
        )));
    }

    // H_m = Σ_j Σ_k eps^(j + m·k) / k! · L^k H_{m-1}[j], for j + m·k <= order
    let mut hamiltonian = S::zero();
    for (j, piece) in pieces.iter().enumerate() {
        if piece.is_zero() {
            continue;
        }
        let mut cache = LieCache::new(&generator, piece.clone(), space, truncation);
        let mut k = 0;
        while j + m * k <= order {
            let derivative = cache.get(k);
            if derivative.is_zero() {
                break;
            }
            let weight = eps.pow((j + m * k) as i32)? * inverse_factorial::<S>(k);
            hamiltonian = (hamiltonian + weight * derivative).truncated(truncation);
            k += 1;
        }
    }

    let eps_m = eps.pow(m as i32)?;
    let s_limit = order / m + 1;
    let inverse_generator = -generator.clone();
    let total_steps = 2 * space.degrees_of_freedom() as u64;
    let (direct, inverse) = reporter.task(total_steps, || -> Result<_, EngineError> {
        let mut direct = Vec::new();
        let mut inverse = Vec::new();
        for var in space.state_variables() {
            let x = S::symbol(var);
            let forward = lie_series(&eps_m, &generator, &x, space, truncation, Some(s_limit))?;
            let backward = lie_series(
                &eps_m,
                &inverse_generator,
                &x,
                space,
                truncation,
                Some(s_limit),
            )?;
            direct.push((var.clone(), forward));
            inverse.push((var.clone(), backward));
            reporter.report(Progress::TaskIncrement);
        }
        Ok((
            Transform::from_images(direct),
            Transform::from_images(inverse),
        ))
    })?;

    Ok(Step {
        hamiltonian,
        generator,
        direct,
        inverse,
    })
}
