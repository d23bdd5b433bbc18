//! Lifecycle of the simulated O-RU.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

use crate::config::SimulatorConfig;

/// Path of the simulator's own log inside its container.
pub const SIMULATOR_LOG_PATH: &str = "/var/log/pynts.log";

#[derive(Debug, Error)]
pub enum SimulatorError {
    #[error("Failed to launch '{command}': {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{command}' exited with {status}")]
    CommandFailed { command: String, status: String },
}

/// Something that can stand in for a real O-RU during a run.
pub trait Simulator {
    /// Bring the simulator up and wait until it can be reached.
    fn start(&self) -> Result<(), SimulatorError>;

    fn stop(&self) -> Result<(), SimulatorError>;

    /// Copy the simulator's log to `destination`.
    fn collect_logs(&self, destination: &Path) -> Result<(), SimulatorError>;

    /// Short human-readable identity for logs.
    fn describe(&self) -> String;
}

/// Simulator run as a docker compose service.
#[derive(Debug, Clone)]
pub struct ComposeSimulator {
    compose_file: PathBuf,
    service_name: String,
    wait: Duration,
}

impl ComposeSimulator {
    pub fn new(
        compose_file: impl Into<PathBuf>,
        service_name: impl Into<String>,
        wait: Duration,
    ) -> Self {
        Self {
            compose_file: compose_file.into(),
            service_name: service_name.into(),
            wait,
        }
    }

    pub fn from_config(config: &SimulatorConfig) -> Self {
        Self::new(
            config.compose_file.clone(),
            config.service_name.clone(),
            Duration::from_secs(config.wait_seconds),
        )
    }

    fn compose(&self, args: &[&str]) -> Result<(), SimulatorError> {
        let mut command = Command::new("docker");
        command
            .arg("compose")
            .arg("-f")
            .arg(&self.compose_file)
            .args(args);
        let rendered = format!(
            "docker compose -f {} {}",
            self.compose_file.display(),
            args.join(" ")
        );
        debug!(command = %rendered, "Running compose command");

        let status = command.status().map_err(|source| SimulatorError::Launch {
            command: rendered.clone(),
            source,
        })?;
        if !status.success() {
            return Err(SimulatorError::CommandFailed {
                command: rendered,
                status: status.to_string(),
            });
        }
        Ok(())
    }
}

impl Simulator for ComposeSimulator {
    fn start(&self) -> Result<(), SimulatorError> {
        info!(service = %self.service_name, "Starting simulator");
        self.compose(&["up", "-d", &self.service_name])?;
        info!(
            seconds = self.wait.as_secs(),
            "Waiting for simulator to come up"
        );
        std::thread::sleep(self.wait);
        Ok(())
    }

    fn stop(&self) -> Result<(), SimulatorError> {
        info!(service = %self.service_name, "Stopping simulator");
        self.compose(&["down"])
    }

    fn collect_logs(&self, destination: &Path) -> Result<(), SimulatorError> {
        let source = format!("{}:{}", self.service_name, SIMULATOR_LOG_PATH);
        let destination = destination.to_string_lossy();
        self.compose(&["cp", &source, &destination])?;
        info!(path = %destination, "Simulator log collected");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("{} ({})", self.service_name, self.compose_file.display())
    }
}
