use std::path::PathBuf;
use thiserror::Error;

use super::simulator::SimulatorError;
use crate::config::ConfigError;
use crate::controller::ControllerError;

/// Errors that abort a run. Everything else is logged and the run goes on.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Unable to export archive because results are not set")]
    MissingResults,

    #[error(transparent)]
    Controller(#[from] ControllerError),

    #[error(transparent)]
    Simulator(#[from] SimulatorError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl RunnerError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RunnerError::Io {
            path: path.into(),
            source,
        }
    }
}
