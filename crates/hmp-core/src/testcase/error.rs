use thiserror::Error;

use crate::controller::ControllerError;
use crate::model::{Metric, ResultType};

/// Measurement value recorded for controller timeouts.
pub const TIMEOUT_MESSAGE: &str = "Connection to controller timed out";

/// Faults inside a test case. These never leave [`super::TestCase::run`].
#[derive(Debug, Error)]
pub enum CaseError {
    #[error("Controller request timed out: {0}")]
    Timeout(#[source] ControllerError),

    #[error(transparent)]
    Controller(ControllerError),

    #[error("No controller available to run this test case")]
    NoController,

    #[error("{0}")]
    Unexpected(String),
}

/// Diagnostic classification recorded in the FAIL metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Timeout,
    Generic,
}

impl CaseError {
    pub fn kind(&self) -> FailureKind {
        match self {
            CaseError::Timeout(_) => FailureKind::Timeout,
            _ => FailureKind::Generic,
        }
    }
}

impl From<ControllerError> for CaseError {
    fn from(err: ControllerError) -> Self {
        if err.is_timeout() {
            CaseError::Timeout(err)
        } else {
            CaseError::Controller(err)
        }
    }
}

/// The FAIL metric describing `err`.
///
/// `description` names the step that failed, e.g. "Failed to query NETCONF
/// topology from controller".
pub fn diagnostic_metric(err: &CaseError, description: &str) -> Metric {
    let value = match err.kind() {
        FailureKind::Timeout => TIMEOUT_MESSAGE.to_string(),
        FailureKind::Generic => err.to_string(),
    };
    Metric::new(description, ResultType::Fail).measure_text("Error", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_is_classified() {
        let err: CaseError = ControllerError::Timeout {
            url: "https://odl/rests".into(),
            seconds: 10,
        }
        .into();
        assert_eq!(err.kind(), FailureKind::Timeout);

        let metric = diagnostic_metric(&err, "Failed to query");
        assert_eq!(metric.result, ResultType::Fail);
        assert_eq!(metric.measurements[0].values, vec![TIMEOUT_MESSAGE]);
    }

    #[test]
    fn test_generic_error_keeps_message() {
        let err: CaseError = ControllerError::Http {
            url: "https://odl/rests".into(),
            status: 500,
        }
        .into();
        assert_eq!(err.kind(), FailureKind::Generic);

        let metric = diagnostic_metric(&err, "Failed to query");
        assert!(metric.measurements[0].values[0].contains("500"));
    }
}
