//! Named, ordered groups of test cases with lifecycle hooks.

use std::error::Error as StdError;
use std::fmt;

use indexmap::IndexSet;
use thiserror::Error;
use tracing::{debug, error};

use crate::testcase::TestCaseDescriptor;

/// Error type hooks may return.
pub type BoxError = Box<dyn StdError + Send + Sync>;

pub type HookResult = Result<(), BoxError>;

/// A side-effecting setup or teardown callable.
pub type Hook = Box<dyn Fn() -> HookResult>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPhase {
    Setup,
    Teardown,
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookPhase::Setup => write!(f, "setup"),
            HookPhase::Teardown => write!(f, "teardown"),
        }
    }
}

/// A hook that returned an error.
#[derive(Debug, Error)]
#[error("{phase} hook #{position} of {scope} failed: {source}")]
pub struct HookError {
    pub scope: String,
    pub phase: HookPhase,
    /// 1-based registration position.
    pub position: usize,
    #[source]
    pub source: BoxError,
}

/// Run `hooks` in order, stopping at the first failure.
pub fn run_setup_hooks(scope: &str, hooks: &[Hook]) -> Result<(), HookError> {
    for (i, hook) in hooks.iter().enumerate() {
        debug!(scope, position = i + 1, "Running setup hook");
        if let Err(source) = hook() {
            let err = HookError {
                scope: scope.to_string(),
                phase: HookPhase::Setup,
                position: i + 1,
                source,
            };
            error!(error = %err, "Setup hook failed");
            return Err(err);
        }
    }
    Ok(())
}

/// Run every hook in order. Failures are logged and collected; they never
/// stop the remaining hooks.
pub fn run_teardown_hooks(scope: &str, hooks: &[Hook]) -> Vec<HookError> {
    let mut failures = Vec::new();
    for (i, hook) in hooks.iter().enumerate() {
        debug!(scope, position = i + 1, "Running teardown hook");
        if let Err(source) = hook() {
            let err = HookError {
                scope: scope.to_string(),
                phase: HookPhase::Teardown,
                position: i + 1,
                source,
            };
            error!(error = %err, "Teardown hook failed");
            failures.push(err);
        }
    }
    failures
}

/// Ordered collection of test case types sharing setup and teardown hooks.
///
/// Built during discovery and read-only while tests run.
pub struct TestSuite {
    name: String,
    description: String,
    cases: Vec<TestCaseDescriptor>,
    categories: IndexSet<String>,
    setup_hooks: Vec<Hook>,
    teardown_hooks: Vec<Hook>,
}

impl TestSuite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            cases: Vec::new(),
            categories: IndexSet::new(),
            setup_hooks: Vec::new(),
            teardown_hooks: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// Append `descriptor` unless a descriptor of the same type is present.
    ///
    /// Returns whether it was added.
    pub fn add(&mut self, descriptor: TestCaseDescriptor) -> bool {
        if self.cases.iter().any(|c| c.is_same_type(&descriptor)) {
            return false;
        }
        self.cases.push(descriptor);
        true
    }

    pub fn cases(&self) -> &[TestCaseDescriptor] {
        &self.cases
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    pub fn add_category(&mut self, category: impl Into<String>) {
        self.categories.insert(category.into());
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(String::as_str)
    }

    pub fn add_setup_hook(&mut self, hook: impl Fn() -> HookResult + 'static) {
        self.setup_hooks.push(Box::new(hook));
    }

    pub fn add_teardown_hook(&mut self, hook: impl Fn() -> HookResult + 'static) {
        self.teardown_hooks.push(Box::new(hook));
    }

    /// Run setup hooks in registration order. The first failure is returned
    /// and the remaining setup hooks are skipped.
    pub fn run_setup(&self) -> Result<(), HookError> {
        run_setup_hooks(&self.scope(), &self.setup_hooks)
    }

    /// Run all teardown hooks in registration order, collecting failures.
    pub fn run_teardown(&self) -> Vec<HookError> {
        run_teardown_hooks(&self.scope(), &self.teardown_hooks)
    }

    fn scope(&self) -> String {
        format!("suite '{}'", self.name)
    }
}

impl fmt::Debug for TestSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestSuite")
            .field("name", &self.name)
            .field("cases", &self.cases)
            .field("categories", &self.categories)
            .field("setup_hooks", &self.setup_hooks.len())
            .field("teardown_hooks", &self.teardown_hooks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorder() -> (Rc<RefCell<Vec<String>>>, impl Fn(&str, bool) -> Hook) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let make = {
            let log = Rc::clone(&log);
            move |label: &str, fail: bool| -> Hook {
                let log = Rc::clone(&log);
                let label = label.to_string();
                Box::new(move || {
                    log.borrow_mut().push(label.clone());
                    if fail {
                        Err(format!("{label} broke").into())
                    } else {
                        Ok(())
                    }
                })
            }
        };
        (log, make)
    }

    #[test]
    fn test_setup_stops_at_first_failure() {
        let (log, hook) = recorder();
        let hooks = vec![hook("s1", false), hook("s2", true), hook("s3", false)];

        let err = run_setup_hooks("suite 'S'", &hooks).unwrap_err();
        assert_eq!(err.position, 2);
        assert_eq!(err.phase, HookPhase::Setup);
        assert_eq!(*log.borrow(), vec!["s1", "s2"]);
    }

    #[test]
    fn test_teardown_runs_every_hook() {
        let (log, hook) = recorder();
        let hooks = vec![hook("t1", true), hook("t2", false), hook("t3", true)];

        let failures = run_teardown_hooks("suite 'S'", &hooks);
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[1].position, 3);
        assert_eq!(*log.borrow(), vec!["t1", "t2", "t3"]);
    }

    #[test]
    fn test_hook_error_message() {
        let (_, hook) = recorder();
        let err = run_setup_hooks("suite 'S'", &[hook("s1", true)]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "setup hook #1 of suite 'S' failed: s1 broke"
        );
    }
}
