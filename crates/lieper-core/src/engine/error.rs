use super::config::ConfigError;
use crate::core::lie::LieError;
use crate::core::series::SeriesError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("Argument mismatch: {0}")]
    ArgumentMismatch(String),

    #[error("Hamiltonian is not a power series in '{symbol}': {reason}")]
    TypeMismatch { symbol: String, reason: String },

    #[error("Invalid perturbation order: {0}")]
    InvalidOrder(String),

    #[error("No value provided for variable '{name}'")]
    MissingVariable { name: String },

    #[error("Initial conditions have not been set")]
    UninitializedState,

    #[error("Strategy not available: {0}")]
    UnimplementedStrategy(String),

    #[error("Series operation failed: {0}")]
    Series(#[source] SeriesError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl From<SeriesError> for EngineError {
    fn from(err: SeriesError) -> Self {
        match err {
            SeriesError::MissingVariable(name) => EngineError::MissingVariable { name },
            other => EngineError::Series(other),
        }
    }
}

impl From<LieError> for EngineError {
    fn from(err: LieError) -> Self {
        match err {
            LieError::ArgumentMismatch(message) => EngineError::ArgumentMismatch(message),
            LieError::Series(inner) => inner.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_symbol_surfaces_as_missing_variable() {
        let err: EngineError = SeriesError::MissingVariable("lam".to_string()).into();
        assert_eq!(
            err,
            EngineError::MissingVariable {
                name: "lam".to_string()
            }
        );
    }

    #[test]
    fn lie_errors_keep_their_kind() {
        let err: EngineError = LieError::ArgumentMismatch("bad".to_string()).into();
        assert!(matches!(err, EngineError::ArgumentMismatch(_)));

        let err: EngineError =
            LieError::Series(SeriesError::Truncation("inactive".to_string())).into();
        assert!(matches!(err, EngineError::Series(SeriesError::Truncation(_))));
    }
}
