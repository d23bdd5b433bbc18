//! O-RU controller collaborator.
//!
//! Test cases reach the network only through the [`Controller`] trait. The
//! pipeline passes the controller through untouched.

mod error;
mod opendaylight;

pub use error::ControllerError;
pub use opendaylight::OpenDaylightController;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// RESTCONF path of the NETCONF topology.
pub const TOPOLOGY_PATH: &str =
    "rests/data/network-topology:network-topology/topology=topology-netconf";

/// RESTCONF path of the devices allowed to call home.
pub const CALLHOME_DEVICES_PATH: &str =
    "rests/data/odl-netconf-callhome-server:netconf-callhome-server/allowed-devices?content=nonconfig";

pub const YANG_JSON: &str = "application/yang-data+json";

const CAPABILITIES_POINTER: &str =
    "/netconf-node-topology:available-capabilities/available-capability";

/// Access to an O-RU controller's RESTCONF API.
///
/// Every call blocks until the controller answers or the configured
/// per-request timeout elapses.
pub trait Controller: Send + Sync {
    /// Base URL without a trailing slash.
    fn base_url(&self) -> &str;

    /// GET `url` and return the status code with the decoded JSON body.
    ///
    /// A 409 Conflict is returned as `(409, {})`. Other error statuses are
    /// errors.
    fn fetch(&self, url: &str) -> Result<(u16, Value), ControllerError>;

    /// PUT `body` to `url`.
    ///
    /// Error statuses are returned rather than raised, so callers can record
    /// them as evidence.
    fn put(&self, url: &str, body: &Value) -> Result<(u16, Value), ControllerError>;

    /// NETCONF nodes present when the controller was connected.
    fn initial_connections(&self) -> &[NetconfNode];

    /// NETCONF nodes present now.
    fn netconf_connections(&self) -> Result<Vec<NetconfNode>, ControllerError>;

    /// Whether `node_id` is connected through CallHome over TLS/IPv4.
    fn is_tls_ipv4(&self, node_id: &str) -> Result<bool, ControllerError>;

    /// Every request made so far, oldest first.
    fn debug_log(&self) -> Vec<DebugEntry> {
        Vec::new()
    }

    /// `netconf-config-change` notifications relayed from `mountpoint` since
    /// connecting, oldest first.
    ///
    /// `None` when the controller does not relay NETCONF notifications.
    fn config_change_notifications(
        &self,
        _mountpoint: &str,
    ) -> Result<Option<Vec<Value>>, ControllerError> {
        Ok(None)
    }

    /// URL of `path` inside the mounted datastore of `mountpoint`.
    fn mount_url(&self, mountpoint: &str, path: &str) -> String {
        format!(
            "{}/{}/node={}/yang-ext:mount/{}",
            self.base_url(),
            TOPOLOGY_PATH,
            mountpoint,
            path
        )
    }

    fn topology_url(&self) -> String {
        format!("{}/{}", self.base_url(), TOPOLOGY_PATH)
    }

    fn callhome_devices_url(&self) -> String {
        format!("{}/{}", self.base_url(), CALLHOME_DEVICES_PATH)
    }
}

/// One recorded RESTCONF exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugEntry {
    pub timestamp: DateTime<Utc>,
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_body: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A node of the controller's NETCONF topology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetconfNode {
    pub node_id: String,
    pub connection_status: String,
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Capability strings from `available-capability[].capability`.
    pub available_capabilities: Vec<String>,
}

impl NetconfNode {
    /// Parse one entry of `topology[0].node`.
    pub fn from_raw(data: &Value) -> Result<Self, ControllerError> {
        let node_id = data
            .get("node-id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ControllerError::Parse("missing node-id in NETCONF node data".into()))?;

        let connection_status = data
            .get("netconf-node-topology:connection-status")
            .and_then(Value::as_str)
            .unwrap_or("unknown");

        let host = data
            .get("netconf-node-topology:host")
            .and_then(Value::as_str)
            .map(str::to_string);

        let port = data
            .get("netconf-node-topology:port")
            .and_then(Value::as_u64)
            .and_then(|p| u16::try_from(p).ok());

        let available_capabilities = data
            .pointer(CAPABILITIES_POINTER)
            .and_then(Value::as_array)
            .map(|caps| {
                caps.iter()
                    .filter_map(|c| c.get("capability").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            node_id: node_id.to_string(),
            connection_status: connection_status.to_string(),
            host,
            port,
            available_capabilities,
        })
    }

    /// Parse the node list of a topology document. Missing sections mean no nodes.
    pub fn from_topology(data: &Value) -> Result<Vec<Self>, ControllerError> {
        let nodes = data
            .get("network-topology:topology")
            .and_then(Value::as_array)
            .and_then(|topologies| topologies.first())
            .and_then(|topology| topology.get("node"))
            .and_then(Value::as_array);

        match nodes {
            Some(nodes) => nodes.iter().map(Self::from_raw).collect(),
            None => Ok(Vec::new()),
        }
    }

    /// Matches the expected id and status and advertises `required_capability`.
    pub fn is_valid(
        &self,
        expected_name: &str,
        expected_status: &str,
        required_capability: &str,
    ) -> bool {
        self.node_id == expected_name
            && self.connection_status == expected_status
            && self
                .available_capabilities
                .iter()
                .any(|cap| cap.contains(required_capability))
    }

    /// One-line description used in measurements.
    pub fn summary(&self) -> String {
        let host = self.host.as_deref().unwrap_or("-");
        let port = self
            .port
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".into());
        format!(
            "{} ({}) at {}:{}, {} capabilities",
            self.node_id,
            self.connection_status,
            host,
            port,
            self.available_capabilities.len()
        )
    }
}

/// Whether any allowed CallHome device is `node_id`, CONNECTED and TLS.
pub fn callhome_tls_connected(devices: &Value, node_id: &str) -> bool {
    devices
        .pointer("/odl-netconf-callhome-server:allowed-devices/device")
        .and_then(Value::as_array)
        .map(|devices| {
            devices.iter().any(|device| {
                let field = |key: &str| device.get(key).and_then(Value::as_str);
                field("unique-id") == Some(node_id)
                    && field("callhome-status:device-status") == Some("CONNECTED")
                    && device.get("tls-client-params").is_some()
            })
        })
        .unwrap_or(false)
}
