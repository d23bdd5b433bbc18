//! Assembly of the results document.
//!
//! [`assemble_report`] is a pure transformation from the result forest plus
//! run metadata into a [`TestResultsSummary`]. Writing it anywhere is the
//! runner's job.

mod metadata;
mod validate;

pub use metadata::{
    ConfigurationParameters, Contact, DeploymentArchitecture, DeploymentRfScenario,
    DeploymentScale, DuplexMode, InterfaceUnderTest, TestLab, TestMetadata, TestSpecification,
    TestType, TestbedComponent,
};
pub use validate::{validate, ReportIssue};

use serde::{Deserialize, Serialize};

use crate::model::{ResultType, TestGroup, TestNote};

/// Version of the document layout below.
pub const SCHEMA_VERSION: u32 = 1;

/// The top-level results document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResultsSummary {
    pub schema_version: u32,
    pub test_metadata: TestMetadata,
    pub testbed_components: Vec<TestbedComponent>,
    /// Left out of the document entirely when no lab was described.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_lab: Option<TestLab>,
    pub test_specifications: Vec<TestSpecification>,
    pub test_results: Vec<TestGroup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<Vec<TestNote>>,
}

impl TestResultsSummary {
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Metadata supplied by the runner.
#[derive(Debug, Clone)]
pub struct ReportMetadata {
    pub test_metadata: TestMetadata,
    pub testbed_components: Vec<TestbedComponent>,
    pub test_lab: Option<TestLab>,
    pub test_specifications: Vec<TestSpecification>,
    pub notes: Option<Vec<TestNote>>,
}

impl ReportMetadata {
    pub fn new(test_metadata: TestMetadata) -> Self {
        Self {
            test_metadata,
            testbed_components: Vec::new(),
            test_lab: None,
            test_specifications: Vec::new(),
            notes: None,
        }
    }
}

/// FAIL if any case anywhere in `forest` failed, PASS otherwise.
pub fn overall_result(forest: &[TestGroup]) -> ResultType {
    let failed = forest
        .iter()
        .flat_map(|group| group.cases())
        .any(|case| !case.passed());
    ResultType::from_bool(!failed)
}

/// Build the document. The metadata result is replaced by the forest's
/// overall result.
pub fn assemble_report(metadata: &ReportMetadata, forest: &[TestGroup]) -> TestResultsSummary {
    let mut test_metadata = metadata.test_metadata.clone();
    test_metadata.result = overall_result(forest);

    TestResultsSummary {
        schema_version: SCHEMA_VERSION,
        test_metadata,
        testbed_components: metadata.testbed_components.clone(),
        test_lab: metadata.test_lab.clone(),
        test_specifications: metadata.test_specifications.clone(),
        test_results: forest.to_vec(),
        notes: metadata.notes.clone(),
    }
}
