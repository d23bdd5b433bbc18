//! Transport and handshake over CallHome TLS/IPv4.

use std::collections::HashSet;

use tracing::debug;

use crate::controller::NetconfNode;
use crate::model::{ExecutionResult, Measurement, Metric, ResultType, TestNote, TestStatus};
use crate::testcase::{CaseContext, CaseError, TestCase, TestCaseBase, TestCaseType, Verdict};

const ERROR_DESCRIPTION: &str = "Failed to query NETCONF topology from controller";

/// Passes when a NETCONF connection that appeared after start-up belongs to
/// the DUT, is connected, advertises the expected capability and came in
/// over CallHome TLS on IPv4.
pub struct TransportHandshake {
    base: TestCaseBase,
}

impl TestCaseType for TransportHandshake {
    const ID: Option<&'static str> = Some("001");
    const NAME: &'static str = "Transport and Handshake in IPv4/TLS Environment";
    const DESCRIPTION: &'static str = "Runs basic scenario";
    const CATEGORIES: &'static [&'static str] = &["basic", "connectivity", "transport"];
    const SUITE: &'static str = "Basic Connectivity";

    fn create(ctx: CaseContext) -> Self {
        let mut base = TestCaseBase::new(ctx);
        base.set_status(TestStatus::ConditionallyMandatory);
        Self { base }
    }
}

impl TransportHandshake {
    fn execute(&self) -> Result<Verdict, CaseError> {
        let controller = self.base.controller()?;
        let settings = self.base.settings();

        let before: Vec<&NetconfNode> = controller.initial_connections().iter().collect();
        let previous_ids: HashSet<&str> = before.iter().map(|n| n.node_id.as_str()).collect();

        let current = controller.netconf_connections()?;
        let new_connections: Vec<&NetconfNode> = current
            .iter()
            .filter(|n| !previous_ids.contains(n.node_id.as_str()))
            .collect();
        debug!(count = new_connections.len(), "New NETCONF connections");

        let mut passed = false;
        for node in &new_connections {
            let valid = node.is_valid(
                &settings.dut_mountpoint_name,
                &settings.tc_001_expected_status,
                &settings.tc_001_expected_capability,
            );
            if valid && controller.is_tls_ipv4(&node.node_id)? {
                passed = true;
                break;
            }
        }

        let result = ResultType::from_bool(passed);
        let current_refs: Vec<&NetconfNode> = current.iter().collect();
        let metric = Metric::new("NETCONF connection change observed", result)
            .measure(connection_measurement("Connections Before", &before, "No connections"))
            .measure(connection_measurement("Connections After", &current_refs, "No connections"))
            .measure(connection_measurement(
                "New Connections",
                &new_connections,
                "No new connections observed",
            ));

        Ok(Verdict::new(result, vec![metric]))
    }
}

fn connection_measurement(name: &str, nodes: &[&NetconfNode], placeholder: &str) -> Measurement {
    let mut sorted = nodes.to_vec();
    sorted.sort_by(|a, b| a.node_id.cmp(&b.node_id));
    Measurement::texts(name, sorted.iter().map(|n| n.summary()), placeholder)
}

impl TestCase for TransportHandshake {
    fn id(&self) -> &str {
        self.base.id()
    }

    fn run(&mut self) -> ExecutionResult {
        self.base.begin(TestNote::new(
            "Test Case Description",
            "Checks that the O-RU called home to the controller over TLS on IPv4 and completed the NETCONF handshake.",
        ));
        let outcome = self.execute();
        self.base.conclude(outcome, ERROR_DESCRIPTION)
    }
}
