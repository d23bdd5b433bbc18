//! Per-case outcome records: results, metrics and measurements.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Verdict of a case or metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResultType {
    #[serde(rename = "PASS")]
    Pass,
    #[serde(rename = "FAIL")]
    Fail,
}

impl ResultType {
    pub fn from_bool(passed: bool) -> Self {
        if passed {
            ResultType::Pass
        } else {
            ResultType::Fail
        }
    }

    pub fn is_pass(self) -> bool {
        self == ResultType::Pass
    }
}

impl fmt::Display for ResultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultType::Pass => write!(f, "PASS"),
            ResultType::Fail => write!(f, "FAIL"),
        }
    }
}

/// Criticality tag. Descriptive only, never consulted for control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestStatus {
    #[serde(rename = "mandatory")]
    Mandatory,
    #[serde(rename = "conditionally mandatory")]
    ConditionallyMandatory,
    #[serde(rename = "optional")]
    Optional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Units {
    #[serde(rename = "text")]
    Text,
}

/// One named observation. `values` is never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub name: String,
    pub values: Vec<String>,
    pub units: Units,
}

impl Measurement {
    /// Single text value.
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: vec![value.into()],
            units: Units::Text,
        }
    }

    /// Several text values, or `placeholder` alone when there are none.
    pub fn texts<I, S>(name: impl Into<String>, values: I, placeholder: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut values: Vec<String> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            values.push(placeholder.to_string());
        }
        Self {
            name: name.into(),
            values,
            units: Units::Text,
        }
    }
}

/// Evidence supporting a verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub description: String,
    pub result: ResultType,
    pub status: TestStatus,
    pub measurements: Vec<Measurement>,
}

impl Metric {
    /// Start an optional metric with no measurements.
    pub fn new(description: impl Into<String>, result: ResultType) -> Self {
        Self {
            description: description.into(),
            result,
            status: TestStatus::Optional,
            measurements: Vec::new(),
        }
    }

    pub fn with_status(mut self, status: TestStatus) -> Self {
        self.status = status;
        self
    }

    pub fn measure(mut self, measurement: Measurement) -> Self {
        self.measurements.push(measurement);
        self
    }

    pub fn measure_text(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.measure(Measurement::text(name, value))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestNote {
    pub title: String,
    pub body: String,
}

impl TestNote {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

/// A file shipped alongside the report. `path` is relative to the archive root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub name: String,
    pub description: String,
    pub path: String,
}

/// Outcome of running one test case. Serialized as a report "TestCase".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub number: String,
    pub name: String,
    pub description: String,
    pub result: ResultType,
    pub status: TestStatus,
    pub start_date: DateTime<Utc>,
    pub stop_date: DateTime<Utc>,
    pub metrics: Vec<Metric>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<Vec<TestNote>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<Vec<Artifact>>,
}

/// Description of the metric every case starts with.
pub const PLACEHOLDER_METRIC: &str = "Generic metric";

impl ExecutionResult {
    /// A FAIL result with a single placeholder metric.
    ///
    /// Cases start from this and replace the verdict and metrics as they run,
    /// so a result always exists even if the case stops early.
    pub fn placeholder(
        number: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        let metric = Metric::new(PLACEHOLDER_METRIC, ResultType::Fail)
            .measure_text("Generic measurement", "None");
        Self {
            number: number.into(),
            name: name.into(),
            description: description.into(),
            result: ResultType::Fail,
            status: TestStatus::Optional,
            start_date: now,
            stop_date: now,
            metrics: vec![metric],
            notes: None,
            artifacts: None,
        }
    }

    pub fn passed(&self) -> bool {
        self.result.is_pass()
    }

    pub fn add_note(&mut self, note: TestNote) {
        self.notes.get_or_insert_with(Vec::new).push(note);
    }

    pub fn add_artifact(&mut self, artifact: Artifact) {
        self.artifacts.get_or_insert_with(Vec::new).push(artifact);
    }
}
