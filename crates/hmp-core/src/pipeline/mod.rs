//! Runs discovered test cases and folds their outcomes into result groups.
//!
//! Four selection modes share one aggregation shape: running a suite, a
//! category, an explicit id list, or everything each yields
//! [`TestGroup`]s whose items are the case results in execution order.
//!
//! Execution is sequential. The pipeline borrows the [`Discovery`] it was
//! built from, so the registry cannot change while tests run.

mod guard;

pub use guard::{on_exit, OnExit};

use std::cell::RefCell;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::TestCaseConfig;
use crate::controller::Controller;
use crate::discovery::{
    run_setup_hooks, run_teardown_hooks, Discovery, Hook, HookError, HookResult, TestSuite,
};
use crate::model::{ExecutionResult, Metric, ResultType, TestGroup};
use crate::testcase::TestCaseDescriptor;

const GLOBAL_SCOPE: &str = "global";

pub const SELECTED_GROUP_NAME: &str = "Selected Test Cases";

pub struct ExecutionPipeline<'d> {
    discovery: &'d Discovery,
    settings: Arc<TestCaseConfig>,
    global_setup_hooks: Vec<Hook>,
    global_teardown_hooks: Vec<Hook>,
    hook_failures: RefCell<Vec<HookError>>,
}

impl<'d> ExecutionPipeline<'d> {
    pub fn new(discovery: &'d Discovery, settings: Arc<TestCaseConfig>) -> Self {
        Self {
            discovery,
            settings,
            global_setup_hooks: Vec::new(),
            global_teardown_hooks: Vec::new(),
            hook_failures: RefCell::new(Vec::new()),
        }
    }

    pub fn discovery(&self) -> &'d Discovery {
        self.discovery
    }

    /// Hook run once before any suite in [`ExecutionPipeline::run_all`].
    pub fn add_global_setup_hook(&mut self, hook: impl Fn() -> HookResult + 'static) {
        self.global_setup_hooks.push(Box::new(hook));
    }

    /// Hook run once after every suite in [`ExecutionPipeline::run_all`].
    pub fn add_global_teardown_hook(&mut self, hook: impl Fn() -> HookResult + 'static) {
        self.global_teardown_hooks.push(Box::new(hook));
    }

    /// Drain the setup and teardown failures seen so far, oldest first.
    pub fn take_hook_failures(&self) -> Vec<HookError> {
        self.hook_failures.take()
    }

    fn note_failures(&self, failures: impl IntoIterator<Item = HookError>) {
        self.hook_failures.borrow_mut().extend(failures);
    }

    /// Build and run one test case.
    ///
    /// A panic inside the case is not caught: conforming cases report
    /// faults as FAIL results.
    pub fn run_case(
        &self,
        descriptor: &TestCaseDescriptor,
        controller: &Arc<dyn Controller>,
    ) -> ExecutionResult {
        info!(
            id = descriptor.id(),
            name = descriptor.name(),
            "Running test case"
        );
        let controller = Some(Arc::clone(controller));
        let mut case = descriptor.instantiate(controller, Arc::clone(&self.settings));
        case.run()
    }

    /// Run a suite between its setup and teardown hooks.
    ///
    /// Teardown runs on every exit path. When setup fails no case runs and
    /// each is reported as FAIL with the setup error.
    pub fn run_suite(&self, suite: &TestSuite, controller: &Arc<dyn Controller>) -> TestGroup {
        info!(
            suite = suite.name(),
            cases = suite.len(),
            "Running test suite"
        );

        let teardown = on_exit(|| {
            self.note_failures(suite.run_teardown());
        });

        let results = match suite.run_setup() {
            Ok(()) => suite
                .cases()
                .iter()
                .map(|descriptor| self.run_case(descriptor, controller))
                .collect(),
            Err(err) => {
                error!(
                    suite = suite.name(),
                    error = %err,
                    "Suite setup failed, skipping its cases"
                );
                let blocked = blocked_results(suite.cases(), "Suite setup failed", &err);
                self.note_failures([err]);
                blocked
            }
        };

        drop(teardown);
        TestGroup::of_cases(suite.name(), suite.description(), results)
    }

    /// Look up a suite by name and run it.
    pub fn run_suite_named(
        &self,
        name: &str,
        controller: &Arc<dyn Controller>,
    ) -> Option<TestGroup> {
        match self.discovery.get_suite(name) {
            Some(suite) => Some(self.run_suite(suite, controller)),
            None => {
                warn!(suite = name, "Test suite not found");
                None
            }
        }
    }

    /// Run every suite in registry order between the global hooks.
    ///
    /// Global teardown runs on every exit path. When global setup fails no
    /// suite runs and every case is reported as FAIL with the setup error.
    pub fn run_all(&self, controller: &Arc<dyn Controller>) -> Vec<TestGroup> {
        let suites = self.discovery.all_suites();
        info!(suites = suites.len(), "Running all test suites");

        let teardown = on_exit(|| {
            let failures = run_teardown_hooks(GLOBAL_SCOPE, &self.global_teardown_hooks);
            self.note_failures(failures);
        });

        let groups = match run_setup_hooks(GLOBAL_SCOPE, &self.global_setup_hooks) {
            Ok(()) => suites
                .into_iter()
                .map(|suite| self.run_suite(suite, controller))
                .collect(),
            Err(err) => {
                error!(error = %err, "Global setup failed, skipping all suites");
                let groups: Vec<TestGroup> = suites
                    .into_iter()
                    .map(|suite| {
                        TestGroup::of_cases(
                            suite.name(),
                            suite.description(),
                            blocked_results(suite.cases(), "Global setup failed", &err),
                        )
                    })
                    .collect();
                self.note_failures([err]);
                groups
            }
        };

        drop(teardown);
        groups
    }

    /// Run every case in `category`. Suite hooks do not apply.
    pub fn run_by_category(&self, category: &str, controller: &Arc<dyn Controller>) -> TestGroup {
        let cases = self.discovery.by_category(category);
        if cases.is_empty() {
            warn!(category, "No test cases found in category");
        } else {
            info!(
                category,
                cases = cases.len(),
                "Running test cases in category"
            );
        }

        let results = cases
            .into_iter()
            .map(|descriptor| self.run_case(descriptor, controller))
            .collect();

        TestGroup::of_cases(
            format!("Category: {category}"),
            format!("Test cases in category '{category}'"),
            results,
        )
    }

    /// Run the listed ids in the given order. Unknown ids are logged and skipped.
    pub fn run_selected<S: AsRef<str>>(
        &self,
        ids: &[S],
        controller: &Arc<dyn Controller>,
    ) -> TestGroup {
        let mut results = Vec::with_capacity(ids.len());
        for id in ids {
            let id = id.as_ref();
            match self.discovery.get(id) {
                Some(descriptor) => results.push(self.run_case(descriptor, controller)),
                None => warn!("Test case with ID {id} not found"),
            }
        }

        let joined = ids
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<&str>>()
            .join(", ");
        TestGroup::of_cases(
            SELECTED_GROUP_NAME,
            format!("Test cases with IDs: {joined}"),
            results,
        )
    }
}

/// FAIL results for cases that were never run because `reason` failed.
fn blocked_results(
    cases: &[TestCaseDescriptor],
    reason: &str,
    err: &HookError,
) -> Vec<ExecutionResult> {
    cases
        .iter()
        .map(|descriptor| {
            let mut result = ExecutionResult::placeholder(
                descriptor.id(),
                descriptor.name(),
                descriptor.description(),
            );
            result.result = ResultType::Fail;
            let metric =
                Metric::new(reason, ResultType::Fail).measure_text("Error", err.to_string());
            result.metrics = vec![metric];
            result
        })
        .collect()
}
