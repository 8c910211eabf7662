use super::LieError;
use crate::core::series::{Series, Truncation};
use itertools::{Itertools, iproduct};
use std::collections::HashSet;

/// Names of the canonical momenta `p_i` and their conjugate coordinates `q_i`.
///
/// Pairs are matched by position. Construction guarantees equal, non-zero lengths and
/// unique non-empty names across both lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseSpace {
    momenta: Vec<String>,
    coordinates: Vec<String>,
}

impl PhaseSpace {
    pub fn new(momenta: Vec<String>, coordinates: Vec<String>) -> Result<Self, LieError> {
        if momenta.len() != coordinates.len() {
            return Err(LieError::ArgumentMismatch(format!(
                "{} momenta but {} coordinates",
                momenta.len(),
                coordinates.len()
            )));
        }
        if momenta.is_empty() {
            return Err(LieError::ArgumentMismatch(
                "phase space needs at least one degree of freedom".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for name in momenta.iter().chain(coordinates.iter()) {
            if name.trim().is_empty() {
                return Err(LieError::ArgumentMismatch(
                    "phase-space variable names must not be empty".to_string(),
                ));
            }
            if !seen.insert(name.as_str()) {
                return Err(LieError::ArgumentMismatch(format!(
                    "variable '{}' appears more than once",
                    name
                )));
            }
        }

        Ok(Self {
            momenta,
            coordinates,
        })
    }

    pub fn momenta(&self) -> &[String] {
        &self.momenta
    }

    pub fn coordinates(&self) -> &[String] {
        &self.coordinates
    }

    pub fn degrees_of_freedom(&self) -> usize {
        self.momenta.len()
    }

    /// All state variables, momenta first, then coordinates.
    pub fn state_variables(&self) -> impl Iterator<Item = &String> {
        self.momenta.iter().chain(self.coordinates.iter())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.state_variables().any(|v| v == name)
    }

    fn pairs(&self) -> impl Iterator<Item = (&String, &String)> {
        self.momenta.iter().zip(self.coordinates.iter())
    }
}

/// `{s1, s2} = Σ_i ∂s1/∂q_i · ∂s2/∂p_i − ∂s1/∂p_i · ∂s2/∂q_i`, truncated under `truncation`.
pub fn poisson_bracket<S: Series>(
    s1: &S,
    s2: &S,
    space: &PhaseSpace,
    truncation: &Truncation,
) -> S {
    space
        .pairs()
        .fold(S::zero(), |acc, (p, q)| {
            let term = s1.partial(q) * s2.partial(p) - s1.partial(p) * s2.partial(q);
            acc + term.truncated(truncation)
        })
        .truncated(truncation)
}

/// Checks the canonical relations `{q_i, p_j} = δ_ij`, `{q_i, q_j} = 0`, `{p_i, p_j} = 0`
/// for the images of the state variables under a transformation.
///
/// `images` holds one series per state variable, momenta first, in the order of
/// [`PhaseSpace::state_variables`]. Returns the first pair of variable names whose
/// bracket is wrong, or `None` when the transformation is canonical under `truncation`.
pub fn is_canonical<S: Series>(
    images: &[S],
    space: &PhaseSpace,
    truncation: &Truncation,
) -> Result<Option<(String, String)>, LieError> {
    let n = space.degrees_of_freedom();
    if images.len() != 2 * n {
        return Err(LieError::ArgumentMismatch(format!(
            "expected {} images for a phase space of dimension {}, got {}",
            2 * n,
            2 * n,
            images.len()
        )));
    }
    let (p_images, q_images) = images.split_at(n);

    let violation = |a: &S, b: &S, expected: S| {
        !(poisson_bracket(a, b, space, truncation) - expected)
            .truncated(truncation)
            .is_zero()
    };

    for (i, j) in iproduct!(0..n, 0..n) {
        let expected = if i == j { S::one() } else { S::zero() };
        if violation(&q_images[i], &p_images[j], expected) {
            return Ok(Some((
                space.coordinates[i].clone(),
                space.momenta[j].clone(),
            )));
        }
    }
    for (i, j) in (0..n).tuple_combinations() {
        if violation(&q_images[i], &q_images[j], S::zero()) {
            return Ok(Some((
                space.coordinates[i].clone(),
                space.coordinates[j].clone(),
            )));
        }
        if violation(&p_images[i], &p_images[j], S::zero()) {
            return Ok(Some((space.momenta[i].clone(), space.momenta[j].clone())));
        }
    }
    Ok(None)
}
