use crate::error::{CliError, Result};
use serde::Deserialize;
use sorbstat::engine::config::ParameterFile;
use std::path::{Path, PathBuf};
use tracing::debug;

/// On-disk layout of a run configuration.
///
/// ```toml
/// [simulation]
/// temperature = 77.0
/// ensemble = "uvt"
/// pressure = 1.0
///
/// [[simulation.sorbates]]
/// id = "H2"
/// mass = 2.016
///
/// [replay]
/// equilibration_steps = 1000
///
/// [output]
/// precision = 5
/// ```
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub simulation: ParameterFile,
    pub replay: Option<FileReplayConfig>,
    pub output: Option<FileOutputConfig>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileReplayConfig {
    pub equilibration_steps: Option<u64>,
    pub checkpoint_out: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileOutputConfig {
    pub precision: Option<usize>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }
}
