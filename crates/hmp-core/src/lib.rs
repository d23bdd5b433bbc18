pub mod config;
pub mod controller;
pub mod discovery;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod runner;
pub mod testcase;

pub use config::{Config, ConfigError};
pub use controller::{Controller, ControllerError, NetconfNode, OpenDaylightController};
pub use discovery::{Discovery, Namespace, TestSuite, Unit};
pub use model::{ExecutionResult, GroupItem, Metric, ResultType, TestGroup, TestStatus};
pub use pipeline::ExecutionPipeline;
pub use report::{assemble_report, ReportMetadata, TestResultsSummary};
pub use runner::{ComposeSimulator, RunOutcome, Runner, RunnerError, Selection, Simulator};
pub use testcase::{CaseContext, TestCase, TestCaseBase, TestCaseDescriptor, TestCaseType};
