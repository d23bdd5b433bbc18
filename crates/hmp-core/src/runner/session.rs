//! Per-run identity, output paths and metadata inputs.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use uuid::Uuid;

/// Timestamp layout used in output file names.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Identity and output locations of one run.
#[derive(Debug, Clone)]
pub struct RunSession {
    pub test_id: String,
    pub started: DateTime<Utc>,
    pub timestamp: String,
    pub output_dir: PathBuf,
}

impl RunSession {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        let started = Utc::now();
        Self {
            test_id: Uuid::new_v4().to_string(),
            started,
            timestamp: started.format(TIMESTAMP_FORMAT).to_string(),
            output_dir: output_dir.into(),
        }
    }

    fn file(&self, prefix: &str, extension: &str) -> PathBuf {
        self.output_dir.join(format!(
            "{prefix}_{}_{}.{extension}",
            self.test_id, self.timestamp
        ))
    }

    /// Runner log, written by the logging layer.
    pub fn log_path(&self) -> PathBuf {
        self.file("log", "log")
    }

    pub fn simulator_log_path(&self) -> PathBuf {
        self.file("pynts-log", "log")
    }

    pub fn restconf_log_path(&self) -> PathBuf {
        self.file("restconf-debug", "json")
    }

    pub fn results_json_path(&self) -> PathBuf {
        self.file("results", "json")
    }

    pub fn archive_path(&self) -> PathBuf {
        self.file("results", "zip")
    }
}

/// File name of `path`, used as its location inside the archive.
pub fn archive_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Read a metadata file, falling back to `T::default()`.
///
/// A missing file is normal. An unreadable or malformed one is logged.
/// `.yaml`/`.yml` files are read as YAML, everything else as JSON.
pub fn load_metadata<T: DeserializeOwned + Default>(path: &Path) -> T {
    if !path.exists() {
        debug!(path = %path.display(), "Metadata file not found, using empty value");
        return T::default();
    }

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read metadata file");
            return T::default();
        }
    };

    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let parsed = if is_yaml {
        serde_yaml::from_str(&content).map_err(|e| e.to_string())
    } else {
        serde_json::from_str(&content).map_err(|e| e.to_string())
    };

    parsed.unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "Invalid metadata format");
        T::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_share_id_and_timestamp() {
        let session = RunSession::new("out");
        let log = session.log_path();
        let name = archive_name(&log);

        assert!(log.starts_with("out"));
        assert!(name.starts_with("log_"));
        assert!(name.contains(&session.test_id));
        assert!(name.ends_with(&format!("{}.log", session.timestamp)));
        assert!(archive_name(&session.archive_path()).starts_with("results_"));
        assert!(archive_name(&session.simulator_log_path()).starts_with("pynts-log_"));
        assert!(archive_name(&session.restconf_log_path()).ends_with(".json"));
    }

    #[test]
    fn test_timestamp_format() {
        let session = RunSession::new("out");
        assert_eq!(session.timestamp.len(), 16);
        assert!(session.timestamp.ends_with('Z'));
        assert_eq!(&session.timestamp[8..9], "T");
    }
}
