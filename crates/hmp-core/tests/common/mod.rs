#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use serde_json::{json, Value};

use hmp_core::controller::{Controller, ControllerError, DebugEntry, NetconfNode};
use hmp_core::discovery::{Namespace, Unit};
use hmp_core::model::{ExecutionResult, Metric, ResultType, TestNote};
use hmp_core::testcase::{CaseContext, CaseError, TestCase, TestCaseBase, TestCaseType, Verdict};

pub const MOCK_BASE_URL: &str = "https://odl.test";
/// Description of the diagnostic metric fixtures record on error.
pub const FIXTURE_ERROR_DESCRIPTION: &str = "Fixture failed";
pub const FAULT_MESSAGE: &str = "scripted fault";
pub const FAULTY_SUITE: &str = "Faulty";

/// Scripted reply for URLs ending with a given suffix.
#[derive(Debug, Clone)]
pub enum Reply {
    Json(u16, Value),
    Status(u16),
    Timeout,
}

/// In-memory controller. PUT bodies are served back by later GETs of the
/// same URL.
pub struct MockController {
    initial: Vec<NetconfNode>,
    current: Vec<NetconfNode>,
    tls_nodes: Vec<String>,
    replies: Vec<(String, Reply)>,
    put_status: u16,
    topology_timeout: bool,
    notifications: Option<Vec<Value>>,
    stored: Mutex<Vec<(String, Value)>>,
    requests: Mutex<Vec<DebugEntry>>,
}

impl MockController {
    pub fn new() -> Self {
        Self {
            initial: Vec::new(),
            current: Vec::new(),
            tls_nodes: Vec::new(),
            replies: Vec::new(),
            put_status: 204,
            topology_timeout: false,
            notifications: None,
            stored: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_initial(mut self, nodes: Vec<NetconfNode>) -> Self {
        self.initial = nodes;
        self
    }

    pub fn with_current(mut self, nodes: Vec<NetconfNode>) -> Self {
        self.current = nodes;
        self
    }

    pub fn with_tls(mut self, node_id: &str) -> Self {
        self.tls_nodes.push(node_id.to_string());
        self
    }

    /// First matching suffix wins.
    pub fn reply(mut self, url_suffix: &str, reply: Reply) -> Self {
        self.replies.push((url_suffix.to_string(), reply));
        self
    }

    pub fn with_put_status(mut self, status: u16) -> Self {
        self.put_status = status;
        self
    }

    pub fn timing_out_topology(mut self) -> Self {
        self.topology_timeout = true;
        self
    }

    /// Relay `notifications` as received config-change notifications.
    pub fn with_notifications(mut self, notifications: Vec<Value>) -> Self {
        self.notifications = Some(notifications);
        self
    }

    pub fn into_arc(self) -> Arc<dyn Controller> {
        Arc::new(self)
    }

    fn record(&self, method: &str, url: &str, status: Option<u16>) {
        self.requests.lock().unwrap().push(DebugEntry {
            timestamp: chrono::Utc::now(),
            method: method.to_string(),
            url: url.to_string(),
            headers: Vec::new(),
            status_code: status,
            response_body: None,
            error: None,
        });
    }
}

impl Controller for MockController {
    fn base_url(&self) -> &str {
        MOCK_BASE_URL
    }

    fn fetch(&self, url: &str) -> Result<(u16, Value), ControllerError> {
        if let Some((_, body)) = self.stored.lock().unwrap().iter().find(|(u, _)| u == url) {
            self.record("GET", url, Some(200));
            return Ok((200, body.clone()));
        }

        let reply = self
            .replies
            .iter()
            .find(|(suffix, _)| url.ends_with(suffix.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or(Reply::Status(404));

        match reply {
            Reply::Json(status, body) => {
                self.record("GET", url, Some(status));
                Ok((status, body))
            }
            Reply::Status(409) => {
                self.record("GET", url, Some(409));
                Ok((409, json!({})))
            }
            Reply::Status(status) if status >= 400 => {
                self.record("GET", url, Some(status));
                Err(ControllerError::Http {
                    url: url.to_string(),
                    status,
                })
            }
            Reply::Status(status) => {
                self.record("GET", url, Some(status));
                Ok((status, json!({})))
            }
            Reply::Timeout => {
                self.record("GET", url, None);
                Err(ControllerError::Timeout {
                    url: url.to_string(),
                    seconds: 10,
                })
            }
        }
    }

    fn put(&self, url: &str, body: &Value) -> Result<(u16, Value), ControllerError> {
        self.record("PUT", url, Some(self.put_status));
        if matches!(self.put_status, 200 | 204) {
            let mut stored = self.stored.lock().unwrap();
            stored.push((url.to_string(), body.clone()));
        }
        Ok((self.put_status, json!({})))
    }

    fn initial_connections(&self) -> &[NetconfNode] {
        &self.initial
    }

    fn netconf_connections(&self) -> Result<Vec<NetconfNode>, ControllerError> {
        if self.topology_timeout {
            return Err(ControllerError::Timeout {
                url: self.topology_url(),
                seconds: 10,
            });
        }
        Ok(self.current.clone())
    }

    fn is_tls_ipv4(&self, node_id: &str) -> Result<bool, ControllerError> {
        Ok(self.tls_nodes.iter().any(|id| id == node_id))
    }

    fn debug_log(&self) -> Vec<DebugEntry> {
        self.requests.lock().unwrap().clone()
    }

    fn config_change_notifications(
        &self,
        _mountpoint: &str,
    ) -> Result<Option<Vec<Value>>, ControllerError> {
        Ok(self.notifications.clone())
    }
}

pub fn node(id: &str, status: &str, capabilities: &[&str]) -> NetconfNode {
    NetconfNode {
        node_id: id.to_string(),
        connection_status: status.to_string(),
        host: Some("10.20.30.40".to_string()),
        port: Some(4335),
        available_capabilities: capabilities.iter().map(|c| c.to_string()).collect(),
    }
}

fn conclude_with(base: &mut TestCaseBase, result: ResultType) -> ExecutionResult {
    base.begin(TestNote::new("Fixture", "Scripted outcome"));
    let metric = Metric::new("Scripted check", result).measure_text("Outcome", result.to_string());
    let verdict = Verdict::new(result, vec![metric]);
    base.conclude(Ok(verdict), FIXTURE_ERROR_DESCRIPTION)
}

/// Declare a test case whose run returns a fixed result.
macro_rules! scripted_case {
    ($ty:ident, $id:expr, $name:literal, $result:expr, [$($category:expr),*], $suite:expr) => {
        pub struct $ty {
            base: TestCaseBase,
        }

        impl TestCaseType for $ty {
            const ID: Option<&'static str> = $id;
            const NAME: &'static str = $name;
            const DESCRIPTION: &'static str = concat!("Scripted case ", $name);
            const CATEGORIES: &'static [&'static str] = &[$($category),*];
            const SUITE: &'static str = $suite;

            fn create(ctx: CaseContext) -> Self {
                Self {
                    base: TestCaseBase::new(ctx),
                }
            }
        }

        impl TestCase for $ty {
            fn id(&self) -> &str {
                self.base.id()
            }

            fn run(&mut self) -> ExecutionResult {
                conclude_with(&mut self.base, $result)
            }
        }
    };
}

scripted_case!(
    CaseA,
    Some("A"),
    "Case A",
    ResultType::Pass,
    ["alpha", "shared"],
    "S"
);
scripted_case!(
    CaseB,
    Some("B"),
    "Case B",
    ResultType::Fail,
    ["shared"],
    "S"
);
scripted_case!(CaseC, Some("C"), "Case C", ResultType::Pass, [], "S");
scripted_case!(
    FirstOfFour,
    Some("004"),
    "First of four",
    ResultType::Pass,
    ["dotted"],
    "Dotted"
);
scripted_case!(
    SecondOfFour,
    Some("004.2"),
    "Second of four",
    ResultType::Pass,
    ["dotted"],
    "Dotted"
);
scripted_case!(
    Other,
    Some("201"),
    "Other suite",
    ResultType::Pass,
    ["shared"],
    "T"
);
scripted_case!(
    ReplacementA,
    Some("A"),
    "Replacement A",
    ResultType::Fail,
    [],
    "S"
);
scripted_case!(UnitNamed, None, "Id from unit", ResultType::Pass, [], "");
scripted_case!(Nameless, Some("777"), "", ResultType::Pass, [], "S");

/// Declare a test case whose body fails with `$error`.
macro_rules! faulty_case {
    ($ty:ident, $id:literal, $error:expr) => {
        pub struct $ty {
            base: TestCaseBase,
        }

        impl TestCaseType for $ty {
            const ID: Option<&'static str> = Some($id);
            const NAME: &'static str = concat!("Faulty ", $id);
            const DESCRIPTION: &'static str = "Body returns an error";
            const SUITE: &'static str = FAULTY_SUITE;

            fn create(ctx: CaseContext) -> Self {
                Self {
                    base: TestCaseBase::new(ctx),
                }
            }
        }

        impl TestCase for $ty {
            fn id(&self) -> &str {
                self.base.id()
            }

            fn run(&mut self) -> ExecutionResult {
                self.base.begin(TestNote::new("Fixture", "Scripted fault"));
                self.base.conclude(Err($error), FIXTURE_ERROR_DESCRIPTION)
            }
        }
    };
}

faulty_case!(
    TimingOut,
    "901",
    CaseError::from(ControllerError::Timeout {
        url: format!("{MOCK_BASE_URL}/slow"),
        seconds: 10,
    })
);
faulty_case!(
    Erroring,
    "902",
    CaseError::Unexpected(FAULT_MESSAGE.to_string())
);

/// Violates the run contract by panicking.
pub struct Panicking {
    base: TestCaseBase,
}

pub const PANIC_MESSAGE: &str = "fixture panicked";

impl TestCaseType for Panicking {
    const ID: Option<&'static str> = Some("P");
    const NAME: &'static str = "Panicking case";
    const DESCRIPTION: &'static str = "Panics instead of returning a result";
    const SUITE: &'static str = "Broken";

    fn create(ctx: CaseContext) -> Self {
        Self {
            base: TestCaseBase::new(ctx),
        }
    }
}

impl TestCase for Panicking {
    fn id(&self) -> &str {
        self.base.id()
    }

    fn run(&mut self) -> ExecutionResult {
        panic!("{}", PANIC_MESSAGE);
    }
}

/// Suite "S" with A, B, C in that order.
pub fn suite_s_namespace() -> Namespace {
    Namespace::new("fixtures")
        .with_unit(Unit::single::<CaseA>("tc_hmp_a"))
        .with_unit(Unit::single::<CaseB>("tc_hmp_b"))
        .with_unit(Unit::single::<CaseC>("tc_hmp_c"))
}

/// Suite "Faulty": 901 times out, 902 fails with [`FAULT_MESSAGE`].
pub fn faulty_namespace() -> Namespace {
    Namespace::new("faulty")
        .with_unit(Unit::single::<TimingOut>("tc_hmp_901"))
        .with_unit(Unit::single::<Erroring>("tc_hmp_902"))
}

/// Every well-formed fixture across suites "S", "Dotted" and "T".
pub fn mixed_namespace() -> Namespace {
    suite_s_namespace()
        .with_namespace(
            Namespace::new("dotted")
                .with_unit(Unit::single::<FirstOfFour>("tc_hmp_004"))
                .with_unit(Unit::single::<SecondOfFour>("tc_hmp_004_2")),
        )
        .with_unit(Unit::single::<Other>("tc_hmp_201"))
}
