//! Structural checks on an assembled document.

use thiserror::Error;

use super::{TestResultsSummary, SCHEMA_VERSION};
use crate::model::{ExecutionResult, GroupItem, TestGroup};

/// A structural problem consumers would trip over.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportIssue {
    #[error("schema version {0} is not supported")]
    SchemaVersion(u32),

    #[error("group '{0}' has an empty number")]
    EmptyGroupNumber(String),

    #[error("test case {case} has no metrics")]
    NoMetrics { case: String },

    #[error("measurement '{measurement}' of test case {case} has no values")]
    EmptyMeasurement { case: String, measurement: String },

    #[error("test case {case} stops before it starts")]
    StopBeforeStart { case: String },

    #[error("run stops before it starts")]
    RunStopBeforeStart,
}

/// Every issue found in `summary`. An empty list means the document is sound.
pub fn validate(summary: &TestResultsSummary) -> Vec<ReportIssue> {
    let mut issues = Vec::new();

    if summary.schema_version != SCHEMA_VERSION {
        issues.push(ReportIssue::SchemaVersion(summary.schema_version));
    }
    if summary.test_metadata.stop_date < summary.test_metadata.start_date {
        issues.push(ReportIssue::RunStopBeforeStart);
    }
    for group in &summary.test_results {
        check_group(group, &mut issues);
    }
    issues
}

fn check_group(group: &TestGroup, issues: &mut Vec<ReportIssue>) {
    if group.number.trim().is_empty() {
        issues.push(ReportIssue::EmptyGroupNumber(group.name.clone()));
    }
    for item in &group.group_items {
        match item {
            GroupItem::Group(nested) => check_group(nested, issues),
            GroupItem::Case(case) => check_case(case, issues),
        }
    }
}

fn check_case(case: &ExecutionResult, issues: &mut Vec<ReportIssue>) {
    if case.metrics.is_empty() {
        issues.push(ReportIssue::NoMetrics {
            case: case.number.clone(),
        });
    }
    for metric in &case.metrics {
        for measurement in metric.measurements.iter().filter(|m| m.values.is_empty()) {
            issues.push(ReportIssue::EmptyMeasurement {
                case: case.number.clone(),
                measurement: measurement.name.clone(),
            });
        }
    }
    if case.stop_date < case.start_date {
        issues.push(ReportIssue::StopBeforeStart {
            case: case.number.clone(),
        });
    }
}
