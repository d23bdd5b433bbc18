//! OpenDaylight RESTCONF client.

use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::{
    callhome_tls_connected, Controller, ControllerError, DebugEntry, NetconfNode, YANG_JSON,
};
use crate::config::ControllerConfig;

/// A decoded response: status, JSON body and what goes into the debug log.
struct Received {
    status: u16,
    data: Value,
    recorded: Value,
}

/// Blocking client for an OpenDaylight controller.
///
/// Certificate verification is disabled: lab controllers run with
/// self-signed certificates.
pub struct OpenDaylightController {
    client: Client,
    base_url: String,
    username: String,
    password: String,
    timeout_seconds: u64,
    initial_connections: Vec<NetconfNode>,
    debug_entries: Mutex<Vec<DebugEntry>>,
}

impl OpenDaylightController {
    /// Build the client and snapshot the NETCONF connections present right now.
    pub fn connect(config: &ControllerConfig) -> Result<Self, ControllerError> {
        let mut controller = Self::unconnected(config)?;
        controller.initial_connections = controller.netconf_connections()?;
        info!(
            count = controller.initial_connections.len(),
            "Recorded initial NETCONF connections"
        );
        Ok(controller)
    }

    fn unconnected(config: &ControllerConfig) -> Result<Self, ControllerError> {
        let client = Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .map_err(|e| ControllerError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.odl_url.trim_end_matches('/').to_string(),
            username: config.odl_username.clone(),
            password: config.odl_password.clone(),
            timeout_seconds: config.timeout,
            initial_connections: Vec::new(),
            debug_entries: Mutex::new(Vec::new()),
        })
    }

    fn record(&self, entry: DebugEntry) {
        self.debug_entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(entry);
    }

    fn entry(&self, method: &str, url: &str, content_type: bool) -> DebugEntry {
        let mut headers = vec![("Accept".to_string(), YANG_JSON.to_string())];
        if content_type {
            headers.push(("Content-Type".to_string(), YANG_JSON.to_string()));
        }
        DebugEntry {
            timestamp: Utc::now(),
            method: method.to_string(),
            url: url.to_string(),
            headers,
            status_code: None,
            response_body: None,
            error: None,
        }
    }

    /// Status plus JSON body. Non-JSON or empty bodies decode to `{}`, and the
    /// raw text is kept for the debug log.
    fn read_body(&self, url: &str, response: Response) -> Result<Received, ControllerError> {
        let status = response.status().as_u16();
        let text = response.text().map_err(|e| self.transport_error(url, e))?;
        let parsed: Option<Value> = serde_json::from_str(&text).ok();
        let recorded = parsed.clone().unwrap_or_else(|| Value::String(text));
        Ok(Received {
            status,
            data: parsed.unwrap_or_else(|| json!({})),
            recorded,
        })
    }

    fn transport_error(&self, url: &str, err: reqwest::Error) -> ControllerError {
        ControllerError::from_reqwest(url, self.timeout_seconds, err)
    }

    /// Record `err` against `entry` and hand it back.
    fn failed(&self, mut entry: DebugEntry, err: ControllerError) -> ControllerError {
        entry.error = Some(err.to_string());
        self.record(entry);
        err
    }

    fn get_callhome_devices(&self) -> Result<Value, ControllerError> {
        let (status, data) = self.fetch(&self.callhome_devices_url())?;
        if status == StatusCode::CONFLICT.as_u16() {
            warn!("Received 409 Conflict, assuming no CallHome devices yet");
        }
        Ok(data)
    }
}

impl Controller for OpenDaylightController {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn fetch(&self, url: &str) -> Result<(u16, Value), ControllerError> {
        let mut entry = self.entry("GET", url, false);
        info!(url, "Querying controller");

        let sent = self
            .client
            .get(url)
            .basic_auth(&self.username, Some(&self.password))
            .header(ACCEPT, YANG_JSON)
            .send();

        let received = match sent {
            Ok(response) => self.read_body(url, response),
            Err(e) => Err(self.transport_error(url, e)),
        };
        let Received {
            status,
            data,
            recorded,
        } = match received {
            Ok(received) => received,
            Err(err) => return Err(self.failed(entry, err)),
        };
        entry.status_code = Some(status);
        entry.response_body = Some(recorded);

        if status == StatusCode::CONFLICT.as_u16() {
            warn!(url, "Received 409 Conflict, assuming no data available");
            self.record(entry);
            return Ok((status, json!({})));
        }

        if status >= 400 {
            let err = ControllerError::Http {
                url: url.to_string(),
                status,
            };
            return Err(self.failed(entry, err));
        }

        self.record(entry);
        Ok((status, data))
    }

    fn put(&self, url: &str, body: &Value) -> Result<(u16, Value), ControllerError> {
        let mut entry = self.entry("PUT", url, true);
        info!(url, "Sending RESTCONF PUT");
        debug!(%body, "PUT payload");

        let sent = self
            .client
            .put(url)
            .basic_auth(&self.username, Some(&self.password))
            .header(ACCEPT, YANG_JSON)
            .header(CONTENT_TYPE, YANG_JSON)
            .body(body.to_string())
            .send();

        let received = match sent {
            Ok(response) => self.read_body(url, response),
            Err(e) => Err(self.transport_error(url, e)),
        };
        let Received {
            status,
            data,
            recorded,
        } = match received {
            Ok(received) => received,
            Err(err) => return Err(self.failed(entry, err)),
        };

        if !(200..300).contains(&status) {
            warn!(url, status, "RESTCONF PUT rejected");
        }
        entry.status_code = Some(status);
        entry.response_body = Some(recorded);
        self.record(entry);
        Ok((status, data))
    }

    fn initial_connections(&self) -> &[NetconfNode] {
        &self.initial_connections
    }

    fn netconf_connections(&self) -> Result<Vec<NetconfNode>, ControllerError> {
        let (status, data) = self.fetch(&self.topology_url())?;
        if status == StatusCode::CONFLICT.as_u16() {
            warn!("Received 409 Conflict, assuming no NETCONF connections yet");
            return Ok(Vec::new());
        }
        let nodes = NetconfNode::from_topology(&data)?;
        debug!(count = nodes.len(), "Parsed NETCONF topology");
        Ok(nodes)
    }

    fn is_tls_ipv4(&self, node_id: &str) -> Result<bool, ControllerError> {
        let devices = self.get_callhome_devices()?;
        let found = callhome_tls_connected(&devices, node_id);
        debug!(node_id, found, "Checked CallHome TLS status");
        Ok(found)
    }

    fn debug_log(&self) -> Vec<DebugEntry> {
        self.debug_entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serve one request: send `head`, then hold the connection open for `hold`.
    fn stalling_server(head: &'static str, hold: Duration) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            while reader.read_line(&mut line).unwrap_or(0) > 0 && line != "\r\n" {
                line.clear();
            }
            stream.write_all(head.as_bytes()).unwrap();
            stream.flush().unwrap();
            thread::sleep(hold);
        });
        format!("http://{addr}")
    }

    fn controller_for(base_url: &str) -> OpenDaylightController {
        let config = ControllerConfig {
            odl_url: base_url.to_string(),
            timeout: 1,
            ..ControllerConfig::default()
        };
        OpenDaylightController::unconnected(&config).unwrap()
    }

    #[test]
    fn test_body_timeout_is_reported_as_timeout() {
        let head = "HTTP/1.1 200 OK\r\nContent-Length: 64\r\n\r\n{";
        let base = stalling_server(head, Duration::from_secs(3));
        let controller = controller_for(&base);

        let err = controller.fetch(&controller.topology_url()).unwrap_err();

        assert!(err.is_timeout(), "unexpected error: {err}");
        let log = controller.debug_log();
        assert_eq!(log.len(), 1);
        assert!(log[0].error.is_some());
        assert!(log[0].status_code.is_none());
    }

    #[test]
    fn test_put_body_timeout_is_an_error() {
        let head = "HTTP/1.1 200 OK\r\nContent-Length: 8\r\n\r\n";
        let base = stalling_server(head, Duration::from_secs(3));
        let controller = controller_for(&base);

        let url = controller.mount_url("dut", "o-ran-operations:operational-info");
        let err = controller.put(&url, &json!({})).unwrap_err();

        assert!(err.is_timeout(), "unexpected error: {err}");
        assert_eq!(controller.debug_log()[0].method, "PUT");
    }
}
