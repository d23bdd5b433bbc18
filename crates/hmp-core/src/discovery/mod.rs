//! Test case discovery and the registry it builds.
//!
//! [`Discovery::discover`] walks a [`Namespace`] depth-first, loads every
//! unit whose name starts with the discovery prefix and registers each
//! exported test case type by id, category and suite. A unit that fails to
//! load, or a member whose metadata is unusable, is logged and skipped.

mod error;
mod namespace;
mod suite;

pub use error::DiscoveryError;
pub use namespace::{Entry, Member, Namespace, Unit};
pub use suite::{
    run_setup_hooks, run_teardown_hooks, BoxError, Hook, HookError, HookPhase, HookResult,
    TestSuite,
};

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, error, info, warn};

use crate::testcase::{builtin, TestCaseDescriptor};

/// Units whose names start with this prefix are loaded.
pub const DISCOVERY_PREFIX: &str = "tc_hmp_";

/// Id, category and suite indexes. Iteration follows discovery order.
#[derive(Debug, Default)]
struct Registry {
    cases: IndexMap<String, TestCaseDescriptor>,
    categories: IndexMap<String, IndexSet<String>>,
    suites: IndexMap<String, TestSuite>,
}

impl Registry {
    fn register(&mut self, unit: &str, descriptor: TestCaseDescriptor) {
        let id = descriptor.id().to_string();

        if let Some(previous) = self.cases.get(&id) {
            if !previous.is_same_type(&descriptor) {
                warn!(
                    id = %id,
                    previous = previous.type_name(),
                    replacement = descriptor.type_name(),
                    "Test case id registered twice, keeping the last registration"
                );
            }
        }

        for category in descriptor.categories() {
            self.categories
                .entry(category.clone())
                .or_default()
                .insert(id.clone());
        }

        let suite = self
            .suites
            .entry(descriptor.suite().to_string())
            .or_insert_with(|| TestSuite::new(descriptor.suite()));
        for category in descriptor.categories() {
            suite.add_category(category.clone());
        }
        suite.add(descriptor.clone());

        debug!(id = %id, unit, type_name = descriptor.type_name(), "Discovered test case");
        self.cases.insert(id, descriptor);
    }
}

/// Finds test case implementations and answers lookups against the result.
#[derive(Debug)]
pub struct Discovery {
    prefix: String,
    registry: Registry,
}

impl Discovery {
    pub fn new() -> Self {
        Self::with_prefix(DISCOVERY_PREFIX)
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            registry: Registry::default(),
        }
    }

    /// Discovery over the built-in test cases.
    pub fn builtin() -> Self {
        let mut discovery = Self::new();
        discovery.discover(&builtin::namespace());
        discovery
    }

    /// Rebuild the registry from `root`.
    ///
    /// The previous registry is replaced wholesale. Skipped units and
    /// members are returned after being logged.
    pub fn discover(&mut self, root: &Namespace) -> Vec<DiscoveryError> {
        info!(namespace = root.name(), "Discovering test cases");

        let mut registry = Registry::default();
        let mut errors = Vec::new();
        self.walk(root, root.name(), &mut registry, &mut errors);
        self.registry = registry;

        info!(
            cases = self.registry.cases.len(),
            suites = self.registry.suites.len(),
            skipped = errors.len(),
            "Discovery finished"
        );
        errors
    }

    fn walk(
        &self,
        namespace: &Namespace,
        path: &str,
        registry: &mut Registry,
        errors: &mut Vec<DiscoveryError>,
    ) {
        for entry in namespace.entries() {
            match entry {
                Entry::Namespace(child) => {
                    let child_path = format!("{path}.{}", child.name());
                    self.walk(child, &child_path, registry, errors);
                }
                Entry::Unit(unit) if unit.name().starts_with(&self.prefix) => {
                    let unit_path = format!("{path}.{}", unit.name());
                    Self::load_unit(unit, &unit_path, registry, errors);
                }
                Entry::Unit(unit) => {
                    debug!(
                        unit = unit.name(),
                        "Skipping unit outside the discovery pattern"
                    );
                }
            }
        }
    }

    fn load_unit(
        unit: &Unit,
        unit_path: &str,
        registry: &mut Registry,
        errors: &mut Vec<DiscoveryError>,
    ) {
        let members = match unit.load() {
            Ok(members) => members,
            Err(reason) => {
                let err = DiscoveryError::Import {
                    unit: unit_path.to_string(),
                    reason,
                };
                error!(error = %err, "Skipping unit");
                errors.push(err);
                return;
            }
        };

        for member in members {
            match member.introspect(unit.name()) {
                Ok(descriptor) => registry.register(unit_path, descriptor),
                Err(reason) => {
                    let err = DiscoveryError::Introspection {
                        unit: unit_path.to_string(),
                        member: member.type_name().to_string(),
                        reason,
                    };
                    error!(error = %err, "Skipping test case");
                    errors.push(err);
                }
            }
        }
    }

    /// Test case registered under `id`.
    pub fn get(&self, id: &str) -> Option<&TestCaseDescriptor> {
        self.registry.cases.get(id)
    }

    /// Every registered test case, in discovery order.
    pub fn all(&self) -> Vec<&TestCaseDescriptor> {
        self.registry.cases.values().collect()
    }

    pub fn get_suite(&self, name: &str) -> Option<&TestSuite> {
        self.registry.suites.get(name)
    }

    /// Mutable access for attaching hooks before tests are run.
    pub fn get_suite_mut(&mut self, name: &str) -> Option<&mut TestSuite> {
        self.registry.suites.get_mut(name)
    }

    /// Every suite, in the order it was first seen.
    pub fn all_suites(&self) -> Vec<&TestSuite> {
        self.registry.suites.values().collect()
    }

    /// Test cases in `category`, in discovery order. Unknown categories are empty.
    pub fn by_category(&self, category: &str) -> Vec<&TestCaseDescriptor> {
        self.registry
            .categories
            .get(category)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.registry.cases.get(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn all_categories(&self) -> Vec<&str> {
        self.registry
            .categories
            .keys()
            .map(String::as_str)
            .collect()
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl Default for Discovery {
    fn default() -> Self {
        Self::new()
    }
}
