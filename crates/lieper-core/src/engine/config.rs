use crate::core::lie::{LieError, PhaseSpace};
use crate::core::series::Truncation;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
}

/// Symbols and truncation policy shared by every step of a perturbation theory.
#[derive(Debug, Clone, PartialEq)]
pub struct TheoryConfig {
    /// Name of the small parameter.
    pub eps: String,
    pub momenta: Vec<String>,
    pub coordinates: Vec<String>,
    pub truncation: Truncation,
}

impl TheoryConfig {
    /// Validated phase space built from the configured momenta and coordinates.
    pub fn phase_space(&self) -> Result<PhaseSpace, LieError> {
        PhaseSpace::new(self.momenta.clone(), self.coordinates.clone())
    }

    /// Truncation keeping powers of the small parameter up to `order`.
    pub fn eps_truncation(&self, order: usize) -> Truncation {
        Truncation::on_symbol(&self.eps, order as i32 + 1)
    }
}

#[derive(Default)]
pub struct TheoryConfigBuilder {
    eps: Option<String>,
    momenta: Option<Vec<String>>,
    coordinates: Option<Vec<String>>,
    truncation: Option<Truncation>,
}

impl TheoryConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eps(mut self, name: impl Into<String>) -> Self {
        self.eps = Some(name.into());
        self
    }
    pub fn momenta<I, T>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.momenta = Some(names.into_iter().map(Into::into).collect());
        self
    }
    pub fn coordinates<I, T>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.coordinates = Some(names.into_iter().map(Into::into).collect());
        self
    }
    pub fn truncation(mut self, policy: Truncation) -> Self {
        self.truncation = Some(policy);
        self
    }

    pub fn build(self) -> Result<TheoryConfig, ConfigError> {
        Ok(TheoryConfig {
            eps: self.eps.ok_or(ConfigError::MissingParameter("eps"))?,
            momenta: self
                .momenta
                .ok_or(ConfigError::MissingParameter("momenta"))?,
            coordinates: self
                .coordinates
                .ok_or(ConfigError::MissingParameter("coordinates"))?,
            truncation: self.truncation.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_requires_symbols() {
        let result = TheoryConfigBuilder::new()
            .momenta(["Lam"])
            .coordinates(["lam"])
            .build();
        assert_eq!(result, Err(ConfigError::MissingParameter("eps")));

        let result = TheoryConfigBuilder::new().eps("eps").momenta(["Lam"]).build();
        assert_eq!(result, Err(ConfigError::MissingParameter("coordinates")));
    }

    #[test]
    fn truncation_defaults_to_inactive() {
        let config = TheoryConfigBuilder::new()
            .eps("eps")
            .momenta(["Lam"])
            .coordinates(["lam"])
            .build()
            .unwrap();
        assert_eq!(config.truncation, Truncation::None);
        assert_eq!(config.phase_space().unwrap().degrees_of_freedom(), 1);
        assert_eq!(config.eps_truncation(2), Truncation::on_symbol("eps", 3));
    }
}
