use super::error::EngineError;
use crate::core::series::{Integrable, Series};

/// Solves the homological equation of one perturbation order.
///
/// Given the eps-free piece `H_i[m]` of the current Hamiltonian, returns the generating
/// function `χ_i` of the step. The returned series must not contain the small
/// parameter.
pub trait HomologicalSolver<S: Series> {
    fn solve(&self, term: &S) -> Result<S, EngineError>;
}

impl<S, F> HomologicalSolver<S> for F
where
    S: Series,
    F: Fn(&S) -> Result<S, EngineError>,
{
    fn solve(&self, term: &S) -> Result<S, EngineError> {
        self(term)
    }
}

/// Generator `factor · ∫ term d(angle)`.
///
/// For an unperturbed Hamiltonian whose frequency along `angle` is `1 / factor`, this
/// removes the whole of `term` from the next Hamiltonian. With `periodic_only` set, the
/// angle average of `term` is left in place and only the periodic part is integrated.
#[derive(Debug, Clone, PartialEq)]
pub struct IntegratingFactorSolver<S: Series> {
    pub angle: String,
    pub factor: S,
    pub periodic_only: bool,
}

impl<S: Series> IntegratingFactorSolver<S> {
    pub fn new(angle: impl Into<String>, factor: S) -> Self {
        Self {
            angle: angle.into(),
            factor,
            periodic_only: false,
        }
    }

    pub fn periodic(angle: impl Into<String>, factor: S) -> Self {
        Self {
            periodic_only: true,
            ..Self::new(angle, factor)
        }
    }
}

impl<S: Integrable> HomologicalSolver<S> for IntegratingFactorSolver<S> {
    fn solve(&self, term: &S) -> Result<S, EngineError> {
        let integrand = if self.periodic_only {
            term.clone() - term.average(&self.angle)
        } else {
            term.clone()
        };
        Ok(self.factor.clone() * integrand.integrate(&self.angle)?)
    }
}
