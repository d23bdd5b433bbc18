//! Descriptive sections of the results document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::TestMetadataConfig;
use crate::model::ResultType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestType {
    #[serde(rename = "Conformance")]
    Conformance,
    #[serde(rename = "Interoperability")]
    Interoperability,
    #[serde(rename = "Performance")]
    Performance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterfaceUnderTest {
    #[serde(rename = "O-RU FHM")]
    ORuFhm,
    #[serde(rename = "O-DU FHM")]
    ODuFhm,
    #[serde(rename = "O-RU Controller")]
    ORuController,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuplexMode {
    #[serde(rename = "TDD")]
    Tdd,
    #[serde(rename = "FDD")]
    Fdd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentArchitecture {
    Indoor,
    Outdoor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentScale {
    Micro,
    Macro,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentRfScenario {
    Urban,
    Suburban,
    Rural,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub organization: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationParameters {
    pub ipv4: bool,
    pub ipv6: bool,
    pub duplex_mode: DuplexMode,
    pub deployment_architecture: DeploymentArchitecture,
    pub deployment_scale: DeploymentScale,
    pub deployment_rf_scenario: DeploymentRfScenario,
}

impl Default for ConfigurationParameters {
    fn default() -> Self {
        Self {
            ipv4: true,
            ipv6: false,
            duplex_mode: DuplexMode::Tdd,
            deployment_architecture: DeploymentArchitecture::Indoor,
            deployment_scale: DeploymentScale::Micro,
            deployment_rf_scenario: DeploymentRfScenario::Urban,
        }
    }
}

/// Run-level metadata: who tested what, when, and the overall verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestMetadata {
    pub dut_name: String,
    pub test_type: TestType,
    pub interface_under_test: Vec<InterfaceUnderTest>,
    pub start_date: DateTime<Utc>,
    pub stop_date: DateTime<Utc>,
    pub result: ResultType,
    pub test_id: String,
    pub contacts: Vec<Contact>,
    pub configuration_parameters: ConfigurationParameters,
}

impl TestMetadata {
    /// Metadata for a conformance run of the O-RU fronthaul M-plane.
    ///
    /// The result starts as FAIL until the run decides otherwise.
    pub fn new(config: &TestMetadataConfig, test_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            dut_name: config.dut_name.clone(),
            test_type: TestType::Conformance,
            interface_under_test: vec![InterfaceUnderTest::ORuFhm],
            start_date: now,
            stop_date: now,
            result: ResultType::Fail,
            test_id: test_id.into(),
            contacts: vec![Contact {
                first_name: config.contact_first_name.clone(),
                last_name: config.contact_last_name.clone(),
                email: config.contact_email.clone(),
                organization: config.contact_organization.clone(),
                phone: config.contact_phone.clone(),
            }],
            configuration_parameters: ConfigurationParameters::default(),
        }
    }
}

/// A piece of lab equipment. Fields beyond `name` pass through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestbedComponent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// The lab that ran the tests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestLab {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// A specification the tests were written against.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestSpecification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}
