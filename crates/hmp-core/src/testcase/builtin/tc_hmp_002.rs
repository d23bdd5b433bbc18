//! Read-only data retrieval through the controller's mountpoint.

use serde_json::Value;
use tracing::{error, info};

use super::{fetch_tolerating, has_data};
use crate::model::{ExecutionResult, Metric, ResultType, TestNote, TestStatus};
use crate::testcase::{CaseContext, CaseError, TestCase, TestCaseBase, TestCaseType, Verdict};

const ERROR_DESCRIPTION: &str = "Failed to query RESTCONF data from controller";

/// Request Entity Too Large, acceptable for an unfiltered read.
const TOO_BIG: u16 = 413;

/// Unfiltered, subtree-filtered and config-only reads of the DUT datastore.
pub struct DataRetrieval {
    base: TestCaseBase,
}

impl TestCaseType for DataRetrieval {
    const ID: Option<&'static str> = Some("002");
    const NAME: &'static str = "Read-Only Data Retrieval (Unfiltered, Filtered, and Config-Only)";
    const DESCRIPTION: &'static str = "Verify that the O-RU exposes operational and configuration data via NETCONF and that the O-RU Controller retrieves and exposes this data using RESTCONF in JSON format.";
    const CATEGORIES: &'static [&'static str] = &["basic", "data", "restconf"];
    const SUITE: &'static str = "Data Retrieval";

    fn create(ctx: CaseContext) -> Self {
        let mut base = TestCaseBase::new(ctx);
        base.set_status(TestStatus::ConditionallyMandatory);
        Self { base }
    }
}

/// One retrieval step and what it returned.
struct Retrieval {
    status: u16,
    data: Value,
    path: Option<(&'static str, String)>,
}

impl DataRetrieval {
    fn execute(&self) -> Result<Verdict, CaseError> {
        let controller = self.base.controller()?;
        let settings = self.base.settings();
        let mountpoint = settings.dut_mountpoint_name.as_str();

        let unfiltered_url = controller.mount_url(mountpoint, "");
        let (status, data) = fetch_tolerating(controller, &unfiltered_url, &[TOO_BIG])?;
        let unfiltered = Retrieval {
            status,
            data,
            path: None,
        };
        let unfiltered_ok = match unfiltered.status {
            200 => has_data(&unfiltered.data),
            TOO_BIG => {
                info!("Unfiltered retrieval returned 'too-big' (HTTP 413), which is acceptable");
                true
            }
            _ => false,
        };

        let filter_path = settings.tc_002_filter_path.clone();
        let (status, data) = controller.fetch(&controller.mount_url(mountpoint, &filter_path))?;
        let filtered = Retrieval {
            status,
            data,
            path: Some(("Filter Path", filter_path)),
        };
        let filtered_ok = filtered.status == 200 && has_data(&filtered.data);

        let config_path = settings.tc_002_config_path.clone();
        let config_url = format!(
            "{}?content=config",
            controller.mount_url(mountpoint, &config_path)
        );
        let (status, data) = controller.fetch(&config_url)?;
        let config_only = Retrieval {
            status,
            data,
            path: Some(("Config Path", config_path)),
        };
        let config_ok = config_only.status == 200 && has_data(&config_only.data);

        let metrics = vec![
            retrieval_metric(
                "Unfiltered Data Retrieval",
                &unfiltered,
                unfiltered_ok,
                mountpoint,
            ),
            retrieval_metric(
                "Subtree-Filtered Data Retrieval",
                &filtered,
                filtered_ok,
                mountpoint,
            ),
            retrieval_metric(
                "Configuration-Only Data Retrieval",
                &config_only,
                config_ok,
                mountpoint,
            ),
        ];
        Ok(Verdict::new(
            ResultType::from_bool(unfiltered_ok && filtered_ok && config_ok),
            metrics,
        ))
    }
}

fn retrieval_metric(
    description: &str,
    step: &Retrieval,
    success: bool,
    mountpoint: &str,
) -> Metric {
    if !success {
        error!(
            step = description,
            status = step.status,
            "Data retrieval check failed"
        );
    }
    let mut metric = Metric::new(description, ResultType::from_bool(success))
        .measure_text("Status Code", step.status.to_string())
        .measure_text("Mountpoint Name", mountpoint);
    if let Some((label, path)) = &step.path {
        metric = metric.measure_text(*label, path.clone());
    }
    metric
}

impl TestCase for DataRetrieval {
    fn id(&self) -> &str {
        self.base.id()
    }

    fn run(&mut self) -> ExecutionResult {
        self.base.begin(TestNote::new(
            "Test Case Description",
            "This test verifies that the O-RU supports NETCONF `get` and `get-config` operations for unfiltered and subtree-filtered retrievals, and that the O-RU Controller makes this data available via RESTCONF in JSON format.",
        ));
        let outcome = self.execute();
        self.base.conclude(outcome, ERROR_DESCRIPTION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_retrieval_metric_measurements() {
        let step = Retrieval {
            status: 200,
            data: json!({"a": 1}),
            path: Some(("Filter Path", "x:y".to_string())),
        };
        let metric = retrieval_metric("Subtree-Filtered Data Retrieval", &step, true, "dut");
        let names: Vec<&str> = metric
            .measurements
            .iter()
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(names, ["Status Code", "Mountpoint Name", "Filter Path"]);
        assert_eq!(metric.result, ResultType::Pass);
    }
}
