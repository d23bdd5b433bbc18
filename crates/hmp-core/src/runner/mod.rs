//! One complete harness run: select, execute, report and package.

mod archive;
mod error;
mod session;
mod simulator;

pub use archive::{write_results, ArchiveBuilder, RESULTS_FILE_NAME};
pub use error::RunnerError;
pub use session::{archive_name, load_metadata, RunSession, TIMESTAMP_FORMAT};
pub use simulator::{ComposeSimulator, Simulator, SimulatorError, SIMULATOR_LOG_PATH};

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::config::{Config, TestExecutionConfig};
use crate::controller::Controller;
use crate::discovery::Discovery;
use crate::model::{Artifact, ResultType, TestGroup, TestNote};
use crate::pipeline::ExecutionPipeline;
use crate::report::{
    assemble_report, validate, ReportIssue, ReportMetadata, TestLab, TestMetadata,
    TestResultsSummary, TestSpecification, TestbedComponent,
};

pub const EXECUTION_LOG_ARTIFACT: (&str, &str) =
    ("Execution Log", "Log of the test runner execution");
pub const RESTCONF_LOG_ARTIFACT: (&str, &str) = (
    "RESTCONF Request/Response",
    "Raw RESTCONF exchange with OpenDaylight controller",
);
pub const SIMULATOR_LOG_ARTIFACT: (&str, &str) = (
    "Simulator Log",
    "Log collected from inside the simulator container",
);

/// Title of report notes describing failed setup or teardown hooks.
pub const HOOK_FAILURE_NOTE: &str = "Hook Failure";

/// Which part of the registry a run covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Cases(Vec<String>),
    Categories(Vec<String>),
    Suites(Vec<String>),
    All,
}

impl Selection {
    /// The first non-empty list of `execution` wins: cases, then
    /// categories, then suites. Otherwise everything runs.
    pub fn from_config(execution: Option<&TestExecutionConfig>) -> Self {
        let Some(execution) = execution else {
            return Selection::All;
        };
        let non_empty = |list: &Option<Vec<String>>| list.clone().filter(|l| !l.is_empty());

        if let Some(ids) = non_empty(&execution.test_cases) {
            Selection::Cases(ids)
        } else if let Some(categories) = non_empty(&execution.categories) {
            Selection::Categories(categories)
        } else if let Some(suites) = non_empty(&execution.suites) {
            Selection::Suites(suites)
        } else {
            Selection::All
        }
    }
}

/// Run `selection` and return the resulting groups.
pub fn run_selection(
    pipeline: &ExecutionPipeline<'_>,
    selection: &Selection,
    controller: &Arc<dyn Controller>,
) -> Vec<TestGroup> {
    match selection {
        Selection::Cases(ids) => {
            info!(ids = ?ids, "Running specific test cases");
            vec![pipeline.run_selected(ids.as_slice(), controller)]
        }
        Selection::Categories(categories) => {
            info!(categories = ?categories, "Running test cases in categories");
            categories
                .iter()
                .map(|category| pipeline.run_by_category(category, controller))
                .collect()
        }
        Selection::Suites(suites) => {
            info!(suites = ?suites, "Running test suites");
            suites
                .iter()
                .filter_map(|name| pipeline.run_suite_named(name, controller))
                .collect()
        }
        Selection::All => {
            info!("Running all discovered test cases");
            pipeline.run_all(controller)
        }
    }
}

/// Replace the artifact list of every case in `forest` with `artifacts`.
pub fn attach_artifacts(forest: &mut [TestGroup], artifacts: &[Artifact]) {
    for group in forest.iter_mut() {
        for case in group.cases_mut() {
            case.artifacts = Some(artifacts.to_vec());
        }
    }
}

/// What a finished run produced.
#[derive(Debug)]
pub struct RunOutcome {
    pub result: ResultType,
    pub summary: TestResultsSummary,
    /// The archive, or the bare results file when archiving is skipped.
    pub output_path: PathBuf,
    pub archived: bool,
    pub issues: Vec<ReportIssue>,
}

/// Drives a run from test selection to the written results.
pub struct Runner {
    config: Config,
    session: RunSession,
}

impl Runner {
    pub fn new(config: Config) -> Self {
        let session = RunSession::new(config.paths.output_dir.clone());
        Self::with_session(config, session)
    }

    pub fn with_session(config: Config, session: RunSession) -> Self {
        Self { config, session }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session(&self) -> &RunSession {
        &self.session
    }

    /// Metadata sections read from the configured metadata directory.
    pub fn load_report_metadata(&self) -> ReportMetadata {
        let paths = &self.config.paths;
        let mut metadata = ReportMetadata::new(TestMetadata::new(
            &self.config.test_metadata,
            &self.session.test_id,
        ));
        metadata.testbed_components = load_metadata::<Vec<TestbedComponent>>(&paths.testbed_path());
        // An empty lab file means no lab: `testLab` is then left out of the
        // document rather than written as `{}`.
        metadata.test_lab = load_metadata::<Option<TestLab>>(&paths.testlab_path())
            .filter(|lab| lab.name.is_some() || !lab.attributes.is_empty());
        metadata.test_specifications = load_metadata::<Vec<TestSpecification>>(&paths.specs_path());
        metadata
    }

    /// Execute the configured selection against `controller` and write the
    /// results.
    ///
    /// The controller must already be connected and `simulator`, if any,
    /// already started. An invalid configuration aborts before anything is
    /// written. Failing test cases never make this return an error.
    pub fn run(
        &self,
        discovery: &Discovery,
        controller: Arc<dyn Controller>,
        simulator: Option<&dyn Simulator>,
    ) -> Result<RunOutcome, RunnerError> {
        self.config.validate()?;

        let output_dir = &self.config.paths.output_dir;
        std::fs::create_dir_all(output_dir).map_err(|e| RunnerError::io(output_dir, e))?;

        info!(test_id = %self.session.test_id, "Starting test run");
        let mut metadata = self.load_report_metadata();
        metadata.test_metadata.start_date = Utc::now();

        let settings = Arc::new(self.config.test_cases.clone());
        let mut pipeline = ExecutionPipeline::new(discovery, settings);
        if let Some(simulator) = simulator {
            let described = simulator.describe();
            let setup_label = described.clone();
            pipeline.add_global_setup_hook(move || {
                info!(simulator = %setup_label, "Running against simulator");
                Ok(())
            });
            pipeline.add_global_teardown_hook(move || {
                info!(simulator = %described, "All suites finished against simulator");
                Ok(())
            });
        }

        let selection = Selection::from_config(self.config.test_execution.as_ref());
        let mut forest = run_selection(&pipeline, &selection, &controller);

        let hook_notes: Vec<TestNote> = pipeline
            .take_hook_failures()
            .iter()
            .map(|failure| TestNote::new(HOOK_FAILURE_NOTE, failure.to_string()))
            .collect();
        if !hook_notes.is_empty() {
            warn!(count = hook_notes.len(), "Hooks failed during the run");
            metadata.notes.get_or_insert_with(Vec::new).extend(hook_notes);
        }

        let mut builder = ArchiveBuilder::new();
        let mut artifacts = vec![
            builder.include_artifact(
                self.session.log_path(),
                EXECUTION_LOG_ARTIFACT.0,
                EXECUTION_LOG_ARTIFACT.1,
            ),
            builder.include_artifact(
                self.session.restconf_log_path(),
                RESTCONF_LOG_ARTIFACT.0,
                RESTCONF_LOG_ARTIFACT.1,
            ),
        ];
        if simulator.is_some() {
            artifacts.push(builder.include_artifact(
                self.session.simulator_log_path(),
                SIMULATOR_LOG_ARTIFACT.0,
                SIMULATOR_LOG_ARTIFACT.1,
            ));
        }
        attach_artifacts(&mut forest, &artifacts);

        self.write_restconf_log(controller.as_ref());
        metadata.test_metadata.stop_date = Utc::now();

        if let Some(simulator) = simulator {
            let destination = self.session.simulator_log_path();
            if let Err(e) = simulator.collect_logs(&destination) {
                warn!(error = %e, "Could not collect simulator logs");
            }
            if self.config.simulator.stop_after_run {
                if let Err(e) = simulator.stop() {
                    warn!(error = %e, "Could not stop simulator");
                }
            }
        }

        let summary = assemble_report(&metadata, &forest);
        let issues = validate(&summary);
        for issue in &issues {
            warn!(issue = %issue, "Results document issue");
        }
        let result = summary.test_metadata.result;

        let (output_path, archived) = if self.config.skip_archiving {
            let path = self.session.results_json_path();
            write_results(&summary, &path)?;
            (path, false)
        } else {
            let path = self.session.archive_path();
            builder.set_results(summary.clone());
            builder.export_archive(&path)?;
            builder.remove_included_files();
            (path, true)
        };

        info!(result = %result, path = %output_path.display(), "Tests finished");
        Ok(RunOutcome {
            result,
            summary,
            output_path,
            archived,
            issues,
        })
    }

    fn write_restconf_log(&self, controller: &dyn Controller) {
        let path = self.session.restconf_log_path();
        let written = serde_json::to_string_pretty(&controller.debug_log())
            .map_err(RunnerError::from)
            .and_then(|json| std::fs::write(&path, json).map_err(|e| RunnerError::io(&path, e)));
        if let Err(e) = written {
            warn!(error = %e, "Failed to collect RESTCONF debug log");
        }
    }
}
