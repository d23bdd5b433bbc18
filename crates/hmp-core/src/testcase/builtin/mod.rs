//! Built-in hybrid M-plane conformance checks.

mod tc_hmp_001;
mod tc_hmp_002;
mod tc_hmp_003;
mod tc_hmp_004;

pub use tc_hmp_001::TransportHandshake;
pub use tc_hmp_002::DataRetrieval;
pub use tc_hmp_003::NetconfSessions;
pub use tc_hmp_004::Configurability;

use serde_json::{json, Value};

use crate::controller::{Controller, ControllerError};
use crate::discovery::{Namespace, Unit};

/// Namespace holding one unit per built-in test case.
pub fn namespace() -> Namespace {
    Namespace::new("testcase")
        .with_unit(Unit::single::<TransportHandshake>("tc_hmp_001"))
        .with_unit(Unit::single::<DataRetrieval>("tc_hmp_002"))
        .with_unit(Unit::single::<NetconfSessions>("tc_hmp_003"))
        .with_unit(Unit::single::<Configurability>("tc_hmp_004"))
}

/// Whether a response body carries anything.
pub(crate) fn has_data(data: &Value) -> bool {
    match data {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// GET that reports the listed HTTP error statuses as `(status, {})`
/// instead of failing.
pub(crate) fn fetch_tolerating(
    controller: &dyn Controller,
    url: &str,
    tolerated: &[u16],
) -> Result<(u16, Value), ControllerError> {
    match controller.fetch(url) {
        Err(ControllerError::Http { status, .. }) if tolerated.contains(&status) => {
            Ok((status, json!({})))
        }
        other => other,
    }
}
