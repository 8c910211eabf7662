use super::error::EngineError;
use super::state::StateDict;
use crate::core::lie::PhaseSpace;
use crate::core::series::Series;

/// Propagates the mean variables from their initial values to time `t` under the final,
/// averaged Hamiltonian.
pub trait MeanFlow<S: Series> {
    fn solve_last(
        &self,
        mean_hamiltonian: &S,
        space: &PhaseSpace,
        init: &StateDict,
        t: f64,
    ) -> Result<StateDict, EngineError>;
}

impl<S, F> MeanFlow<S> for F
where
    S: Series,
    F: Fn(&StateDict, f64) -> Result<StateDict, EngineError>,
{
    fn solve_last(
        &self,
        _mean_hamiltonian: &S,
        _space: &PhaseSpace,
        init: &StateDict,
        t: f64,
    ) -> Result<StateDict, EngineError> {
        self(init, t)
    }
}

/// Exact flow of a Hamiltonian that depends on the momenta only: momenta stay constant
/// and each coordinate advances linearly with frequency `∂H/∂p_j`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SecularDrift;

impl<S: Series> MeanFlow<S> for SecularDrift {
    fn solve_last(
        &self,
        mean_hamiltonian: &S,
        space: &PhaseSpace,
        init: &StateDict,
        t: f64,
    ) -> Result<StateDict, EngineError> {
        if let Some(q) = space
            .coordinates()
            .iter()
            .find(|q| !mean_hamiltonian.partial(q).is_zero())
        {
            return Err(EngineError::UnimplementedStrategy(format!(
                "mean Hamiltonian still depends on coordinate '{}'",
                q
            )));
        }

        let mut state = init.clone();
        for (p, q) in space.momenta().iter().zip(space.coordinates()) {
            let frequency = mean_hamiltonian.partial(p).evaluate(init)?;
            let start = init
                .get(q)
                .copied()
                .ok_or_else(|| EngineError::MissingVariable { name: q.clone() })?;
            state.insert(q.clone(), start + t * frequency);
        }
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::series::PoissonSeries;

    fn sym(name: &str) -> PoissonSeries {
        PoissonSeries::symbol(name)
    }

    fn space() -> PhaseSpace {
        PhaseSpace::new(vec!["Lam".to_string()], vec!["lam".to_string()]).unwrap()
    }

    fn dict(entries: &[(&str, f64)]) -> StateDict {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn drift_advances_coordinates_with_the_frequency() {
        // H = -1/(2 Lam^2), dlam/dt = Lam^-3
        let h = PoissonSeries::from_ratio(-1, 2) * sym("Lam").pow(-2).unwrap();
        let init = dict(&[("Lam", 2.0), ("lam", 0.5)]);
        let state = SecularDrift.solve_last(&h, &space(), &init, 4.0).unwrap();
        assert_eq!(state["Lam"], 2.0);
        assert!((state["lam"] - (0.5 + 4.0 / 8.0)).abs() < 1e-12);
    }

    #[test]
    fn drift_rejects_angle_dependent_hamiltonians() {
        let h = sym("Lam") * PoissonSeries::cos_of("lam");
        let init = dict(&[("Lam", 1.0), ("lam", 0.0)]);
        assert!(matches!(
            SecularDrift.solve_last(&h, &space(), &init, 1.0),
            Err(EngineError::UnimplementedStrategy(_))
        ));
    }

    #[test]
    fn closures_act_as_mean_flows() {
        let frozen =
            |init: &StateDict, _t: f64| -> Result<StateDict, EngineError> { Ok(init.clone()) };
        let init = dict(&[("Lam", 1.0), ("lam", 0.0)]);
        let state = MeanFlow::<PoissonSeries>::solve_last(
            &frozen,
            &PoissonSeries::zero(),
            &space(),
            &init,
            3.0,
        )
        .unwrap();
        assert_eq!(state, init);
    }
}
