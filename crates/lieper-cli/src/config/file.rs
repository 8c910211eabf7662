use crate::error::{CliError, Result};
use lieper::core::series::{TermSpec, Truncation};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileTheoryConfig {
    pub eps: Option<String>,
    pub momenta: Option<Vec<String>>,
    pub coordinates: Option<Vec<String>>,
    pub order: Option<usize>,
    pub truncation: Option<Truncation>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileSolverConfig {
    pub angle: Option<String>,
    #[serde(default)]
    pub factor: Vec<TermSpec>,
    pub periodic_only: Option<bool>,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FileMeanFlow {
    SecularDrift,
    Frozen,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileTimesConfig {
    pub start: Option<f64>,
    pub stop: Option<f64>,
    pub steps: Option<usize>,
    pub values: Option<Vec<f64>>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileConfig {
    pub theory: Option<FileTheoryConfig>,
    #[serde(default)]
    pub hamiltonian: Vec<TermSpec>,
    pub solver: Option<FileSolverConfig>,
    pub mean_flow: Option<FileMeanFlow>,
    #[serde(default)]
    pub initial: BTreeMap<String, f64>,
    pub times: Option<FileTimesConfig>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Reading theory description from '{}'.", path.display());
        let content = std::fs::read_to_string(path).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }
}
