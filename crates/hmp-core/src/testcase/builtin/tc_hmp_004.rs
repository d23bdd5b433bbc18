//! Positive configurability check on `o-ran-operations:operational-info`.

use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use crate::controller::Controller;
use crate::model::{ExecutionResult, Metric, ResultType, TestNote, TestStatus};
use crate::testcase::{CaseContext, CaseError, TestCase, TestCaseBase, TestCaseType, Verdict};

const CONFIG_KEY: &str = "o-ran-operations:operational-info";
const RE_CALL_HOME_TIMER: &str = "re-call-home-no-ssh-timer";
const MAX_CALL_HOME_ATTEMPTS: &str = "max-call-home-attempts";
const EXPECTED_TIMER_VALUE: u64 = 90;
const EXPECTED_ATTEMPTS_VALUE: u64 = 10;
const NOTIFICATION_KEY: &str = "ietf-netconf-notifications:netconf-config-change";

pub struct Configurability {
    base: TestCaseBase,
}

impl TestCaseType for Configurability {
    const ID: Option<&'static str> = Some("004");
    const NAME: &'static str = "O-RU Configurability Test (Positive Case)";
    const DESCRIPTION: &'static str = "Verify that the O-RU accepts valid operational-info configuration and that the O-RU Controller applies it via RESTCONF.";
    const CATEGORIES: &'static [&'static str] = &["configuration", "operational-info", "restconf"];
    const SUITE: &'static str = "O-RU Configuration";

    fn create(ctx: CaseContext) -> Self {
        let mut base = TestCaseBase::new(ctx);
        base.set_status(TestStatus::ConditionallyMandatory);
        Self { base }
    }
}

fn payload() -> Value {
    json!({
        CONFIG_KEY: {
            RE_CALL_HOME_TIMER: EXPECTED_TIMER_VALUE,
            MAX_CALL_HOME_ATTEMPTS: EXPECTED_ATTEMPTS_VALUE
        }
    })
}

/// Both values present and as written. Returns the first problem found.
fn check_applied(data: &Value) -> Result<(), String> {
    let info = data
        .get(CONFIG_KEY)
        .filter(|v| v.as_object().is_some_and(|o| !o.is_empty()))
        .ok_or_else(|| format!("missing '{CONFIG_KEY}' in configuration data"))?;

    for (key, expected) in [
        (RE_CALL_HOME_TIMER, EXPECTED_TIMER_VALUE),
        (MAX_CALL_HOME_ATTEMPTS, EXPECTED_ATTEMPTS_VALUE),
    ] {
        match info.get(key) {
            None => return Err(format!("missing key '{key}' in configuration data")),
            Some(value) if value.as_u64() != Some(expected) => {
                return Err(format!("key '{key}' is {value}, expected {expected}"))
            }
            Some(_) => {}
        }
    }
    Ok(())
}

/// Whether any notification reports an edit under [`CONFIG_KEY`].
fn reports_config_change(notifications: &[Value]) -> bool {
    notifications
        .iter()
        .filter_map(|n| n.get(NOTIFICATION_KEY))
        .filter_map(|change| change.get("edit").and_then(Value::as_array))
        .flatten()
        .filter_map(|edit| edit.get("target").and_then(Value::as_str))
        .any(|target| target.contains(CONFIG_KEY))
}

/// Optional step: never part of the verdict, and skipped when the controller
/// does not relay notifications.
fn notification_metric(controller: &dyn Controller, mountpoint: &str) -> Option<Metric> {
    let notifications = match controller.config_change_notifications(mountpoint) {
        Ok(Some(notifications)) => notifications,
        Ok(None) => {
            debug!("Controller does not relay notifications, skipping notification check");
            return None;
        }
        Err(e) => {
            warn!(error = %e, "Could not read configuration change notifications");
            return None;
        }
    };

    let observed = reports_config_change(&notifications);
    if observed {
        info!("Configuration change notification received");
    } else {
        warn!(
            count = notifications.len(),
            "No configuration change notification for operational-info"
        );
    }
    let result = ResultType::from_bool(observed);
    let metric = Metric::new("Configuration Change Notification", result)
        .measure_text("Notifications Received", notifications.len().to_string())
        .measure_text("Expected Target", CONFIG_KEY);
    Some(metric)
}

impl Configurability {
    fn execute(&self) -> Result<Verdict, CaseError> {
        let controller = self.base.controller()?;
        let mountpoint = self.base.settings().dut_mountpoint_name.as_str();
        let url = controller.mount_url(mountpoint, CONFIG_KEY);
        let body = payload();

        let payload_metric = Metric::new("Configuration Payload", ResultType::Pass)
            .measure_text(
                "Configuration Payload",
                serde_json::to_string_pretty(&body).unwrap_or_else(|_| body.to_string()),
            )
            .measure_text("Mountpoint Name", mountpoint);

        let (put_status, _) = controller.put(&url, &body)?;
        let applied = matches!(put_status, 200 | 204);
        if applied {
            info!("Configuration applied successfully");
        } else {
            error!(status = put_status, "Failed to apply configuration");
        }
        let apply_metric = Metric::new("Apply Configuration", ResultType::from_bool(applied))
            .measure_text("Status Code", put_status.to_string())
            .measure_text("URL", url.clone());

        let (get_status, data) = controller.fetch(&url)?;
        let validated = if get_status != 200 {
            error!(status = get_status, "Failed to retrieve configuration");
            false
        } else if let Err(problem) = check_applied(&data) {
            error!(%problem, "Configuration validation failed");
            false
        } else {
            info!("Configuration validation successful");
            true
        };
        let validate_result = ResultType::from_bool(validated);
        let mut validate_metric = Metric::new("Validate Configuration", validate_result)
            .measure_text("Status Code", get_status.to_string())
            .measure_text("URL", url);
        if super::has_data(&data) {
            validate_metric = validate_metric.measure_text(
                "Retrieved Configuration",
                serde_json::to_string_pretty(&data).unwrap_or_else(|_| data.to_string()),
            );
        }

        let mut metrics = vec![payload_metric, apply_metric, validate_metric];
        metrics.extend(notification_metric(controller, mountpoint));
        Ok(Verdict::new(ResultType::from_bool(applied && validated), metrics))
    }
}

impl TestCase for Configurability {
    fn id(&self) -> &str {
        self.base.id()
    }

    fn run(&mut self) -> ExecutionResult {
        self.base.begin(TestNote::new(
            "Test Case Description",
            "This test verifies that the O-RU accepts valid configuration for operational-info and that the configuration can be successfully applied through the O-RU Controller using RESTCONF.",
        ));
        let outcome = self.execute();
        self.base.conclude(outcome, "Failed to execute test case")
    }
}
