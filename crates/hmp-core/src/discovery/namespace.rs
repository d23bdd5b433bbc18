//! Explicit registration tree walked by discovery.
//!
//! Each test case module contributes a [`Unit`] whose loader yields the
//! test case types it defines. Units are grouped into nested
//! [`Namespace`]s, and only units whose names match the discovery prefix
//! are loaded.

use crate::testcase::{TestCaseDescriptor, TestCaseType};

type Loader = Box<dyn Fn() -> Result<Vec<Member>, String>>;

/// A test case type exported by a unit.
pub struct Member {
    type_name: &'static str,
    introspect: fn(&str) -> Result<TestCaseDescriptor, String>,
}

impl Member {
    pub fn of<T: TestCaseType>() -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            introspect: TestCaseDescriptor::introspect::<T>,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Read the member's descriptor as found in `unit`.
    pub fn introspect(&self, unit: &str) -> Result<TestCaseDescriptor, String> {
        (self.introspect)(unit)
    }
}

/// A loadable module of test cases.
pub struct Unit {
    name: String,
    loader: Loader,
}

impl Unit {
    pub fn new(
        name: impl Into<String>,
        loader: impl Fn() -> Result<Vec<Member>, String> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            loader: Box::new(loader),
        }
    }

    /// A unit exporting exactly `T`.
    pub fn single<T: TestCaseType>(name: impl Into<String>) -> Self {
        Self::new(name, || Ok(vec![Member::of::<T>()]))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn load(&self) -> Result<Vec<Member>, String> {
        (self.loader)()
    }
}

pub enum Entry {
    Unit(Unit),
    Namespace(Namespace),
}

/// Ordered tree of units. Iteration order is registration order.
pub struct Namespace {
    name: String,
    entries: Vec<Entry>,
}

impl Namespace {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    pub fn with_unit(mut self, unit: Unit) -> Self {
        self.entries.push(Entry::Unit(unit));
        self
    }

    pub fn with_namespace(mut self, namespace: Namespace) -> Self {
        self.entries.push(Entry::Namespace(namespace));
        self
    }

    pub fn add_unit(&mut self, unit: Unit) {
        self.entries.push(Entry::Unit(unit));
    }

    pub fn add_namespace(&mut self, namespace: Namespace) {
        self.entries.push(Entry::Namespace(namespace));
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }
}
