//! Result document model shared by test cases, the pipeline and the report.

mod group;
mod result;

pub use group::{group_number, GroupItem, TestGroup, FALLBACK_GROUP_NUMBER};
pub use result::{
    Artifact, ExecutionResult, Measurement, Metric, ResultType, TestNote, TestStatus, Units,
    PLACEHOLDER_METRIC,
};
