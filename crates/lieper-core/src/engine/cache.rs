use crate::core::lie::{PhaseSpace, poisson_bracket};
use crate::core::series::{Series, Truncation};
use tracing::trace;

/// Memoized repeated Lie derivatives of a fixed seed under a fixed generator.
///
/// `container[0]` is the seed and `container[k] = {container[k-1], χ}`. The container
/// only grows; each reconstruction step owns its caches and drops them when done.
#[derive(Debug, Clone)]
pub struct LieCache<'a, S: Series> {
    generator: &'a S,
    space: &'a PhaseSpace,
    truncation: &'a Truncation,
    container: Vec<S>,
}

impl<'a, S: Series> LieCache<'a, S> {
    pub fn new(
        generator: &'a S,
        seed: S,
        space: &'a PhaseSpace,
        truncation: &'a Truncation,
    ) -> Self {
        Self {
            generator,
            space,
            truncation,
            container: vec![seed],
        }
    }

    /// The `k`-th Lie derivative of the seed, computing missing entries from the last
    /// cached one.
    pub fn get(&mut self, k: usize) -> S {
        while self.container.len() <= k {
            let last = &self.container[self.container.len() - 1];
            let next = poisson_bracket(last, self.generator, self.space, self.truncation);
            trace!(depth = self.container.len(), "Extended Lie cache.");
            self.container.push(next);
        }
        self.container[k].clone()
    }

    pub fn len(&self) -> usize {
        self.container.len()
    }

    pub fn is_empty(&self) -> bool {
        self.container.is_empty()
    }
}
