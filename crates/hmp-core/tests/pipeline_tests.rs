mod common;

use std::cell::RefCell;
use std::io;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use common::*;
use hmp_core::config::TestCaseConfig;
use hmp_core::controller::Controller;
use hmp_core::discovery::{Discovery, HookPhase, HookResult, Namespace, Unit};
use hmp_core::model::{ExecutionResult, ResultType, TestGroup};
use hmp_core::pipeline::{ExecutionPipeline, SELECTED_GROUP_NAME};
use hmp_core::testcase::TIMEOUT_MESSAGE;
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

type Log = Rc<RefCell<Vec<String>>>;

fn new_log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

fn recording(log: &Log, label: &str, fail: bool) -> impl Fn() -> HookResult + 'static {
    let log = Rc::clone(log);
    let label = label.to_string();
    move || {
        log.borrow_mut().push(label.clone());
        if fail {
            Err(format!("{label} failed").into())
        } else {
            Ok(())
        }
    }
}

fn discover(root: &Namespace) -> Discovery {
    let mut discovery = Discovery::new();
    discovery.discover(root);
    discovery
}

fn pipeline(discovery: &Discovery) -> ExecutionPipeline<'_> {
    ExecutionPipeline::new(discovery, Arc::new(TestCaseConfig::default()))
}

fn controller() -> Arc<dyn Controller> {
    MockController::new().into_arc()
}

fn results(group: &TestGroup) -> Vec<ResultType> {
    group.cases().iter().map(|c| c.result).collect()
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

struct CapturedWriter(Arc<Mutex<Vec<u8>>>);

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CapturedWriter(Arc::clone(&self.0))
    }
}

impl io::Write for CapturedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl CapturedLogs {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

/// Run `f` with every event at any level written to the returned buffer.
fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, CapturedLogs) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_max_level(Level::TRACE)
        .finish();
    let value = tracing::subscriber::with_default(subscriber, f);
    (value, logs)
}

fn assert_failed_with(case: &ExecutionResult, value: &str) {
    assert_eq!(case.result, ResultType::Fail);
    assert_eq!(case.metrics.len(), 1);
    assert_eq!(case.metrics[0].description, FIXTURE_ERROR_DESCRIPTION);
    assert_eq!(case.metrics[0].measurements[0].values, [value]);
}

#[test]
fn test_suite_s_end_to_end() {
    let discovery = discover(&suite_s_namespace());
    let pipeline = pipeline(&discovery);

    let group = pipeline.run_suite(discovery.get_suite("S").unwrap(), &controller());

    assert_eq!(group.name, "S");
    assert_eq!(group.case_ids(), ["A", "B", "C"]);
    assert_eq!(
        results(&group),
        [ResultType::Pass, ResultType::Fail, ResultType::Pass]
    );
    assert_eq!(group.number, "A");
}

#[test]
fn test_group_number_from_first_case() {
    let discovery = discover(&mixed_namespace());
    let pipeline = pipeline(&discovery);

    let group = pipeline.run_suite_named("Dotted", &controller()).unwrap();

    assert_eq!(group.case_ids(), ["004", "004.2"]);
    assert_eq!(group.number, "004");
}

#[test]
fn test_empty_group_number_falls_back() {
    let discovery = discover(&mixed_namespace());
    let pipeline = pipeline(&discovery);

    let group = pipeline.run_by_category("missing", &controller());

    assert!(group.is_empty());
    assert_eq!(group.number, "0");
    assert_eq!(group.name, "Category: missing");
}

#[test]
fn test_unknown_suite_is_none() {
    let discovery = discover(&mixed_namespace());
    let group = pipeline(&discovery).run_suite_named("Nope", &controller());
    assert!(group.is_none());
}

#[test]
fn test_run_selected_keeps_requested_order() {
    let discovery = Discovery::builtin();
    let pipeline = pipeline(&discovery);

    let group = pipeline.run_selected(&["002", "001"], &controller());

    assert_eq!(group.case_ids(), ["002", "001"]);
    assert_eq!(group.name, SELECTED_GROUP_NAME);
    assert_eq!(group.description, "Test cases with IDs: 002, 001");
    assert_eq!(group.number, "002");
}

#[test]
fn test_run_selected_unknown_id_is_empty() {
    let discovery = Discovery::builtin();
    let pipeline = pipeline(&discovery);
    let controller = controller();

    let (group, logs) = capture_logs(|| pipeline.run_selected(&["999"], &controller));

    assert!(group.is_empty());
    assert_eq!(group.number, "0");

    let text = logs.text();
    let warnings: Vec<&str> = text.lines().filter(|l| l.contains("WARN")).collect();
    assert_eq!(warnings.len(), 1, "{text}");
    assert!(warnings[0].contains("Test case with ID 999 not found"));
}

#[test]
fn test_run_selected_skips_only_missing_ids() {
    let discovery = discover(&mixed_namespace());
    let pipeline = pipeline(&discovery);

    let group = pipeline.run_selected(&["C", "999", "A"], &controller());

    assert_eq!(group.case_ids(), ["C", "A"]);
}

#[test]
fn test_teardown_runs_once_whichever_setup_hook_fails() {
    for failing in 1..=3 {
        let log = new_log();
        let mut discovery = discover(&suite_s_namespace());
        let suite = discovery.get_suite_mut("S").unwrap();
        for position in 1..=3 {
            let label = format!("setup{position}");
            suite.add_setup_hook(recording(&log, &label, position == failing));
        }
        suite.add_teardown_hook(recording(&log, "teardown1", false));
        suite.add_teardown_hook(recording(&log, "teardown2", false));

        let pipeline = pipeline(&discovery);
        let group = pipeline.run_suite(discovery.get_suite("S").unwrap(), &controller());

        let mut expected: Vec<String> = (1..=failing).map(|p| format!("setup{p}")).collect();
        expected.push("teardown1".into());
        expected.push("teardown2".into());
        assert_eq!(*log.borrow(), expected);

        assert_eq!(group.case_ids(), ["A", "B", "C"]);
        for case in group.cases() {
            assert_eq!(case.result, ResultType::Fail);
            assert_eq!(case.metrics[0].description, "Suite setup failed");
        }

        let failures = pipeline.take_hook_failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].phase, HookPhase::Setup);
        assert_eq!(failures[0].position, failing);
    }
}

#[test]
fn test_failing_teardown_does_not_stop_the_rest() {
    let log = new_log();
    let mut discovery = discover(&suite_s_namespace());
    let suite = discovery.get_suite_mut("S").unwrap();
    suite.add_teardown_hook(recording(&log, "teardown1", true));
    suite.add_teardown_hook(recording(&log, "teardown2", false));

    let pipeline = pipeline(&discovery);
    let group = pipeline.run_suite(discovery.get_suite("S").unwrap(), &controller());

    assert_eq!(*log.borrow(), ["teardown1", "teardown2"]);
    assert_eq!(
        results(&group),
        [ResultType::Pass, ResultType::Fail, ResultType::Pass]
    );

    let failures = pipeline.take_hook_failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].phase, HookPhase::Teardown);
    assert_eq!(failures[0].scope, "suite 'S'");
    assert!(failures[0].to_string().contains("teardown1 failed"));
    assert!(pipeline.take_hook_failures().is_empty());
}

#[test]
fn test_failing_case_body_fails_through_run_suite() {
    let discovery = discover(&faulty_namespace());
    let pipeline = pipeline(&discovery);

    let suite = discovery.get_suite(FAULTY_SUITE).unwrap();
    let group = pipeline.run_suite(suite, &controller());

    assert_eq!(group.case_ids(), ["901", "902"]);
    let cases = group.cases();
    assert_failed_with(&cases[0], TIMEOUT_MESSAGE);
    assert_failed_with(&cases[1], FAULT_MESSAGE);
    assert!(cases[0].stop_date >= cases[0].start_date);
}

#[test]
fn test_failing_case_body_fails_through_run_all() {
    let root = faulty_namespace().with_namespace(suite_s_namespace());
    let discovery = discover(&root);
    let pipeline = pipeline(&discovery);

    let groups = pipeline.run_all(&controller());

    let names: Vec<&str> = groups.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, [FAULTY_SUITE, "S"]);
    let faulty = groups[0].cases();
    assert_failed_with(&faulty[0], TIMEOUT_MESSAGE);
    assert_failed_with(&faulty[1], FAULT_MESSAGE);
    assert_eq!(
        results(&groups[1]),
        [ResultType::Pass, ResultType::Fail, ResultType::Pass]
    );
    assert!(pipeline.take_hook_failures().is_empty());
}

#[test]
fn test_panicking_case_propagates_and_teardown_still_runs() {
    let log = new_log();
    let root = Namespace::new("fixtures").with_unit(Unit::single::<Panicking>("tc_hmp_panic"));
    let mut discovery = discover(&root);
    discovery
        .get_suite_mut("Broken")
        .unwrap()
        .add_teardown_hook(recording(&log, "teardown", false));

    let pipeline = pipeline(&discovery);
    let controller = controller();
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        pipeline.run_suite(discovery.get_suite("Broken").unwrap(), &controller)
    }));

    let payload = outcome.unwrap_err();
    assert_eq!(
        payload.downcast_ref::<String>().map(String::as_str),
        Some(PANIC_MESSAGE)
    );
    assert_eq!(*log.borrow(), ["teardown"]);
}

#[test]
fn test_panicking_case_still_runs_global_teardown() {
    let log = new_log();
    let root = Namespace::new("fixtures").with_unit(Unit::single::<Panicking>("tc_hmp_panic"));
    let discovery = discover(&root);

    let mut pipeline = pipeline(&discovery);
    pipeline.add_global_teardown_hook(recording(&log, "global teardown", false));
    let controller = controller();
    let outcome = catch_unwind(AssertUnwindSafe(|| pipeline.run_all(&controller)));

    assert!(outcome.is_err());
    assert_eq!(*log.borrow(), ["global teardown"]);
}

#[test]
fn test_run_all_follows_registry_order_between_global_hooks() {
    let log = new_log();
    let mut discovery = discover(&mixed_namespace());
    let suite = discovery.get_suite_mut("S").unwrap();
    suite.add_setup_hook(recording(&log, "S setup", false));
    suite.add_teardown_hook(recording(&log, "S teardown", false));

    let mut pipeline = pipeline(&discovery);
    pipeline.add_global_setup_hook(recording(&log, "global setup", false));
    pipeline.add_global_teardown_hook(recording(&log, "global teardown", false));

    let groups = pipeline.run_all(&controller());

    let names: Vec<&str> = groups.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, ["S", "Dotted", "T"]);
    assert_eq!(
        *log.borrow(),
        ["global setup", "S setup", "S teardown", "global teardown"]
    );
}

#[test]
fn test_global_setup_failure_blocks_every_suite() {
    let log = new_log();
    let mut discovery = discover(&mixed_namespace());
    discovery
        .get_suite_mut("S")
        .unwrap()
        .add_setup_hook(recording(&log, "S setup", false));

    let mut pipeline = pipeline(&discovery);
    pipeline.add_global_setup_hook(recording(&log, "global setup", true));
    pipeline.add_global_teardown_hook(recording(&log, "global teardown", false));

    let groups = pipeline.run_all(&controller());

    assert_eq!(groups.len(), 3);
    for case in groups.iter().flat_map(|g| g.cases()) {
        assert_eq!(case.result, ResultType::Fail);
        assert_eq!(case.metrics[0].description, "Global setup failed");
    }
    assert_eq!(*log.borrow(), ["global setup", "global teardown"]);

    let failures = pipeline.take_hook_failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].phase, HookPhase::Setup);
    assert_eq!(failures[0].scope, "global");
}

#[test]
fn test_category_run_skips_suite_hooks() {
    let log = new_log();
    let mut discovery = discover(&mixed_namespace());
    let suite = discovery.get_suite_mut("S").unwrap();
    suite.add_setup_hook(recording(&log, "S setup", false));
    suite.add_teardown_hook(recording(&log, "S teardown", false));

    let pipeline = pipeline(&discovery);
    let group = pipeline.run_by_category("shared", &controller());

    assert_eq!(group.name, "Category: shared");
    assert_eq!(group.description, "Test cases in category 'shared'");
    assert_eq!(group.case_ids(), ["A", "B", "201"]);
    assert!(log.borrow().is_empty());
}
