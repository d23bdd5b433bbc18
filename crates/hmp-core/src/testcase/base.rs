//! Shared scaffolding for test case implementations.

use chrono::Utc;
use tracing::{error, info};

use super::{diagnostic_metric, CaseContext, CaseError};
use crate::config::TestCaseConfig;
use crate::controller::Controller;
use crate::model::{ExecutionResult, Metric, ResultType, TestNote, TestStatus};

/// What a test body decided.
#[derive(Debug, Clone)]
pub struct Verdict {
    pub result: ResultType,
    pub metrics: Vec<Metric>,
}

impl Verdict {
    pub fn new(result: ResultType, metrics: Vec<Metric>) -> Self {
        Self { result, metrics }
    }

    /// PASS when every metric passed.
    pub fn from_metrics(metrics: Vec<Metric>) -> Self {
        let result = ResultType::from_bool(metrics.iter().all(|m| m.result.is_pass()));
        Self { result, metrics }
    }
}

/// Holds the context and the result being built for one run.
///
/// The result starts as [`ExecutionResult::placeholder`], so a case that
/// stops early still reports FAIL.
pub struct TestCaseBase {
    ctx: CaseContext,
    result: ExecutionResult,
}

impl TestCaseBase {
    pub fn new(ctx: CaseContext) -> Self {
        let result = ExecutionResult::placeholder(&ctx.id, &ctx.name, &ctx.description);
        Self { ctx, result }
    }

    pub fn id(&self) -> &str {
        &self.ctx.id
    }

    pub fn name(&self) -> &str {
        &self.ctx.name
    }

    pub fn settings(&self) -> &TestCaseConfig {
        &self.ctx.settings
    }

    pub fn set_status(&mut self, status: TestStatus) {
        self.result.status = status;
    }

    /// The injected controller, or [`CaseError::NoController`].
    pub fn controller(&self) -> Result<&dyn Controller, CaseError> {
        self.ctx
            .controller
            .as_deref()
            .ok_or(CaseError::NoController)
    }

    /// Stamp the start time and attach the case's note.
    pub fn begin(&mut self, note: TestNote) {
        info!(id = %self.ctx.id, name = %self.ctx.name, "Started running test case");
        self.result.start_date = Utc::now();
        self.result.notes = Some(vec![note]);
    }

    /// Record the outcome of the body and return the finished result.
    ///
    /// Errors become a FAIL with one diagnostic metric described by
    /// `error_description`.
    pub fn conclude(
        &mut self,
        outcome: Result<Verdict, CaseError>,
        error_description: &str,
    ) -> ExecutionResult {
        match outcome {
            Ok(verdict) => {
                self.result.result = verdict.result;
                self.result.metrics = verdict.metrics;
            }
            Err(err) => {
                error!(id = %self.ctx.id, error = %err, "Test case failed");
                self.result.result = ResultType::Fail;
                self.result.metrics = vec![diagnostic_metric(&err, error_description)];
            }
        }
        self.result.stop_date = Utc::now();
        info!(
            id = %self.ctx.id,
            result = %self.result.result,
            "Finished running test case"
        );
        self.result.clone()
    }
}
