//! NETCONF session count on the O-RU.

use serde_json::Value;
use tracing::{error, info};

use super::has_data;
use crate::model::{ExecutionResult, Measurement, Metric, ResultType, TestNote, TestStatus};
use crate::testcase::{CaseContext, CaseError, TestCase, TestCaseBase, TestCaseType, Verdict};

const ERROR_DESCRIPTION: &str = "Failed to query RESTCONF data from controller";
const SESSIONS_PATH: &str = "ietf-netconf-monitoring:netconf-state/sessions?content=nonconfig";
const SESSIONS_KEY: &str = "ietf-netconf-monitoring:sessions";

/// One session towards the controller and one towards the O-DU.
const MIN_SESSIONS: usize = 2;

pub struct NetconfSessions {
    base: TestCaseBase,
}

impl TestCaseType for NetconfSessions {
    const ID: Option<&'static str> = Some("003");
    const NAME: &'static str = "NETCONF Sessions Verification";
    const DESCRIPTION: &'static str = "Verify that the O-RU has at least two active NETCONF sessions (one towards the O-RU Controller and another towards the O-DU).";
    const CATEGORIES: &'static [&'static str] = &["basic", "netconf", "sessions"];
    const SUITE: &'static str = "NETCONF Sessions";

    fn create(ctx: CaseContext) -> Self {
        let mut base = TestCaseBase::new(ctx);
        base.set_status(TestStatus::ConditionallyMandatory);
        Self { base }
    }
}

impl NetconfSessions {
    fn execute(&self) -> Result<Verdict, CaseError> {
        let controller = self.base.controller()?;
        let mountpoint = self.base.settings().dut_mountpoint_name.as_str();

        let (status, data) = controller.fetch(&controller.mount_url(mountpoint, SESSIONS_PATH))?;
        let sessions = session_list(&data);
        let success = status == 200 && has_data(&data) && sessions.len() >= MIN_SESSIONS;

        if success {
            info!(count = sessions.len(), "Found enough NETCONF sessions");
        } else {
            error!(
                status,
                count = sessions.len(),
                "Expected at least {MIN_SESSIONS} NETCONF sessions"
            );
        }

        let result = ResultType::from_bool(success);
        let mut metric = Metric::new("NETCONF Sessions Verification", result)
            .measure_text("Status Code", status.to_string())
            .measure_text("Mountpoint Name", mountpoint);
        if status == 200 {
            metric = metric.measure_text("Session Count", sessions.len().to_string());
            for (i, session) in sessions.iter().enumerate() {
                metric = metric.measure(Measurement::text(
                    format!("Session {} Details", i + 1),
                    session_details(session),
                ));
            }
        }

        Ok(Verdict::new(result, vec![metric]))
    }
}

/// Entries of `ietf-netconf-monitoring:sessions/session`, empty if absent.
fn session_list(data: &Value) -> Vec<Value> {
    data.get(SESSIONS_KEY)
        .and_then(|sessions| sessions.get("session"))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

fn session_details(session: &Value) -> String {
    let field = |key: &str| match session.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "N/A".to_string(),
        Some(other) => other.to_string(),
    };
    format!(
        "ID: {}, User: {}, Host: {}, Transport: {}",
        field("session-id"),
        field("username"),
        field("source-host"),
        field("transport")
    )
}

impl TestCase for NetconfSessions {
    fn id(&self) -> &str {
        self.base.id()
    }

    fn run(&mut self) -> ExecutionResult {
        self.base.begin(TestNote::new(
            "Test Case Description",
            "This test verifies that the O-RU has at least two active NETCONF sessions by checking the ietf-netconf-monitoring YANG model exposed by the O-RU.",
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
    fn test_session_details_format() {
        let session = json!({
            "session-id": 12,
            "username": "oranuser",
            "source-host": "10.0.0.1",
            "transport": "ietf-netconf-monitoring:netconf-tls"
        });
        assert_eq!(
            session_details(&session),
            "ID: 12, User: oranuser, Host: 10.0.0.1, Transport: ietf-netconf-monitoring:netconf-tls"
        );
        assert!(session_details(&json!({})).starts_with("ID: N/A"));
    }

    #[test]
    fn test_session_list_missing_sections() {
        assert!(session_list(&json!({})).is_empty());
        assert!(session_list(&json!({SESSIONS_KEY: {}})).is_empty());
        assert_eq!(
            session_list(&json!({SESSIONS_KEY: {"session": [{}, {}]}})).len(),
            2
        );
    }
}
