use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::averages::GlobalAverages;
use super::nodestats::RootNodeStats;
use super::sorbates::SorbateAggregator;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("Checkpoint I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Checkpoint JSON error for '{path}': {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
}

/// Serializable root aggregation state.
///
/// Restoring a checkpoint and continuing to fold steps gives the same
/// averages as a run that was never interrupted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Last step folded before the checkpoint was taken; `None` when the
    /// state is empty.
    pub last_step: Option<u64>,
    /// Size of the collective that produced the state.
    pub workers: usize,
    pub averages: GlobalAverages,
    pub sorbates: SorbateAggregator,
    pub node_stats: RootNodeStats,
}

impl Checkpoint {
    pub fn load(path: &Path) -> Result<Self, CheckpointError> {
        let contents = fs::read_to_string(path).map_err(|source| CheckpointError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| CheckpointError::Json {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn store(&self, path: &Path) -> Result<(), CheckpointError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| CheckpointError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| CheckpointError::Json {
            path: path.display().to_string(),
            source,
        })?;
        fs::write(path, json).map_err(|source| CheckpointError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}
