//! The contract every discoverable conformance check implements.
//!
//! A test case is described twice: statically through [`TestCaseType`]
//! (id, name, categories, suite), which discovery reads without building
//! anything, and dynamically through [`TestCase`], the object the pipeline
//! runs.

mod base;
pub mod builtin;
mod error;

pub use base::{TestCaseBase, Verdict};
pub use error::{diagnostic_metric, CaseError, FailureKind, TIMEOUT_MESSAGE};

use std::any::{type_name, TypeId};
use std::fmt;
use std::sync::Arc;

use crate::config::TestCaseConfig;
use crate::controller::Controller;
use crate::model::ExecutionResult;

/// Suite a test case lands in when it does not name one.
pub const DEFAULT_SUITE: &str = "Default";

/// An executable conformance check.
pub trait TestCase {
    /// Dotted numeric id, e.g. "001".
    fn id(&self) -> &str;

    /// Execute the check.
    ///
    /// Must always return a result. Every fault, including controller
    /// timeouts, is converted into a FAIL result carrying a diagnostic
    /// metric. Calling `run` more than once is not supported.
    fn run(&mut self) -> ExecutionResult;
}

/// Class-level metadata and construction for a [`TestCase`] implementation.
///
/// # Example
///
/// ```ignore
/// impl TestCaseType for LinkCheck {
///     const NAME: &'static str = "Link check";
///     const DESCRIPTION: &'static str = "Verifies the link is up";
///     const CATEGORIES: &'static [&'static str] = &["basic"];
///
///     fn create(ctx: CaseContext) -> Self {
///         Self { base: TestCaseBase::new(ctx) }
///     }
/// }
/// ```
pub trait TestCaseType: TestCase + Sized + 'static {
    /// Explicit id. When `None` the id is taken from the unit name.
    const ID: Option<&'static str> = None;
    const NAME: &'static str;
    const DESCRIPTION: &'static str;
    const CATEGORIES: &'static [&'static str] = &[];
    const SUITE: &'static str = DEFAULT_SUITE;

    fn create(ctx: CaseContext) -> Self;
}

/// Everything a test case needs to be built.
///
/// The controller is optional so cases can be built for metadata-only use;
/// a case built without one fails when run instead of panicking.
#[derive(Clone)]
pub struct CaseContext {
    pub id: String,
    pub name: String,
    pub description: String,
    pub controller: Option<Arc<dyn Controller>>,
    pub settings: Arc<TestCaseConfig>,
}

impl CaseContext {
    /// Context with no controller and default settings.
    pub fn detached(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            controller: None,
            settings: Arc::new(TestCaseConfig::default()),
        }
    }
}

/// Registered identity of a test case type. Immutable once built.
#[derive(Clone)]
pub struct TestCaseDescriptor {
    id: String,
    name: String,
    description: String,
    categories: Vec<String>,
    suite: String,
    type_id: TypeId,
    type_name: &'static str,
    factory: fn(CaseContext) -> Box<dyn TestCase>,
}

fn build<T: TestCaseType>(ctx: CaseContext) -> Box<dyn TestCase> {
    Box::new(T::create(ctx))
}

impl TestCaseDescriptor {
    /// Read the metadata of `T`, found in the unit named `unit`.
    ///
    /// Returns the reason when the metadata is unusable.
    pub fn introspect<T: TestCaseType>(unit: &str) -> Result<Self, String> {
        let id = match T::ID.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => id.to_string(),
            None => id_from_unit_name(unit)
                .ok_or_else(|| format!("cannot derive a test case id from unit name '{unit}'"))?,
        };

        if T::NAME.trim().is_empty() {
            return Err(format!("test case {id} has an empty name"));
        }

        let mut categories: Vec<String> = Vec::with_capacity(T::CATEGORIES.len());
        for category in T::CATEGORIES {
            if !categories.iter().any(|c| c == category) {
                categories.push(category.to_string());
            }
        }

        let suite = match T::SUITE.trim() {
            "" => DEFAULT_SUITE.to_string(),
            suite => suite.to_string(),
        };

        Ok(Self {
            id,
            name: T::NAME.to_string(),
            description: T::DESCRIPTION.to_string(),
            categories,
            suite,
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            factory: build::<T>,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn suite(&self) -> &str {
        &self.suite
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether both descriptors were read from the same Rust type.
    pub fn is_same_type(&self, other: &TestCaseDescriptor) -> bool {
        self.type_id == other.type_id
    }

    /// Build a runnable instance.
    pub fn instantiate(
        &self,
        controller: Option<Arc<dyn Controller>>,
        settings: Arc<TestCaseConfig>,
    ) -> Box<dyn TestCase> {
        (self.factory)(CaseContext {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            controller,
            settings,
        })
    }
}

impl fmt::Debug for TestCaseDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCaseDescriptor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("categories", &self.categories)
            .field("suite", &self.suite)
            .field("type", &self.type_name)
            .finish()
    }
}

/// Trailing `_`- or `.`-separated segment of a unit name ("tc_hmp_001" gives "001").
pub fn id_from_unit_name(unit: &str) -> Option<String> {
    unit.rsplit(['_', '.'])
        .next()
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
}
