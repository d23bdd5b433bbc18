//! Results document output: a zip bundle or a bare JSON file.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::error::RunnerError;
use super::session::archive_name;
use crate::model::Artifact;
use crate::report::TestResultsSummary;

/// Name of the results document inside the archive.
pub const RESULTS_FILE_NAME: &str = "results.json";

#[derive(Debug, Clone)]
struct IncludedFile {
    local: PathBuf,
    within: String,
}

/// Collects the results document and artifact files for one bundle.
#[derive(Debug, Default)]
pub struct ArchiveBuilder {
    results: Option<TestResultsSummary>,
    files: Vec<IncludedFile>,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_results(&mut self, results: TestResultsSummary) {
        self.results = Some(results);
    }

    /// Register `local` to be stored at its file name in the archive.
    ///
    /// Returns the artifact reference to attach to test results.
    pub fn include_artifact(
        &mut self,
        local: impl Into<PathBuf>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Artifact {
        let local = local.into();
        let within = archive_name(&local);
        self.files.push(IncludedFile {
            local,
            within: within.clone(),
        });
        Artifact {
            name: name.into(),
            description: description.into(),
            path: within,
        }
    }

    /// Local paths of every included artifact.
    pub fn included_files(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(|f| f.local.as_path())
    }

    /// Write the archive to `output`.
    ///
    /// Artifacts missing on disk are logged and left out.
    pub fn export_archive(&self, output: &Path) -> Result<(), RunnerError> {
        let results = self.results.as_ref().ok_or(RunnerError::MissingResults)?;
        let document = results.to_json_pretty()?;

        let file = File::create(output).map_err(|e| RunnerError::io(output, e))?;
        let mut zip = ZipWriter::new(file);
        zip.start_file(RESULTS_FILE_NAME, entry_options())?;
        zip.write_all(document.as_bytes())
            .map_err(|e| RunnerError::io(output, e))?;

        for included in &self.files {
            let content = match std::fs::read(&included.local) {
                Ok(content) => content,
                Err(e) => {
                    warn!(
                        path = %included.local.display(),
                        error = %e,
                        "Artifact not readable, leaving it out of the archive"
                    );
                    continue;
                }
            };
            zip.start_file(included.within.as_str(), entry_options())?;
            zip.write_all(&content)
                .map_err(|e| RunnerError::io(output, e))?;
        }

        zip.finish()?;
        info!(path = %output.display(), "Results archive written");
        Ok(())
    }

    /// Delete the included artifact files. Failures are logged.
    pub fn remove_included_files(&self) {
        for path in self.included_files() {
            if !path.exists() {
                continue;
            }
            if let Err(e) = std::fs::remove_file(path) {
                warn!(path = %path.display(), error = %e, "Failed to remove file after archiving");
            }
        }
    }
}

fn entry_options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

/// Write `summary` as pretty JSON to `path`.
pub fn write_results(summary: &TestResultsSummary, path: &Path) -> Result<(), RunnerError> {
    let document = summary.to_json_pretty()?;
    std::fs::write(path, document).map_err(|e| RunnerError::io(path, e))?;
    info!(path = %path.display(), "Results written");
    Ok(())
}
