use super::error::EngineError;
use crate::core::lie::PhaseSpace;
use crate::core::series::Series;

pub use crate::core::series::StateDict;

/// Images of the state variables under one near-identity canonical transformation,
/// momenta first, then coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform<S: Series> {
    images: Vec<(String, S)>,
}

impl<S: Series> Transform<S> {
    pub fn identity(space: &PhaseSpace) -> Self {
        Self {
            images: space
                .state_variables()
                .map(|name| (name.clone(), S::symbol(name)))
                .collect(),
        }
    }

    pub(crate) fn from_images(images: Vec<(String, S)>) -> Self {
        Self { images }
    }

    pub fn get(&self, name: &str) -> Option<&S> {
        self.images
            .iter()
            .find(|(var, _)| var == name)
            .map(|(_, image)| image)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &S)> {
        self.images.iter().map(|(var, image)| (var, image))
    }

    /// The image series in state-variable order.
    pub fn images(&self) -> Vec<S> {
        self.images.iter().map(|(_, image)| image.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Evaluates every image on `state` simultaneously. Entries that are not state
    /// variables are carried over unchanged.
    pub fn apply(&self, state: &StateDict) -> Result<StateDict, EngineError> {
        let mut next = state.clone();
        for (var, image) in &self.images {
            next.insert(var.clone(), image.evaluate(state)?);
        }
        Ok(next)
    }
}

/// The chain of initial conditions from the original variables (level 0) to the mean
/// variables (last level).
#[derive(Debug, Clone, PartialEq)]
pub struct InitialConditions {
    levels: Vec<StateDict>,
}

impl InitialConditions {
    pub(crate) fn new(levels: Vec<StateDict>) -> Self {
        Self { levels }
    }

    pub fn original(&self) -> &StateDict {
        &self.levels[0]
    }

    pub fn mean(&self) -> &StateDict {
        // Never empty: level 0 is always present.
        &self.levels[self.levels.len() - 1]
    }

    pub fn level(&self, index: usize) -> Option<&StateDict> {
        self.levels.get(index)
    }

    pub fn levels(&self) -> &[StateDict] {
        &self.levels
    }
}
