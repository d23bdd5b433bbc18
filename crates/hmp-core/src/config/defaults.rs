//! Default values for the test runner configuration.
//!
//! All hardcoded defaults are centralized here for easy maintenance.

// ============================================================================
// Path Defaults
// ============================================================================

/// Directory holding testbed, test lab and specification metadata.
pub const DEFAULT_METADATA_DIR: &str = "metadata";

/// Directory receiving logs, debug dumps and the results archive.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

pub const DEFAULT_TESTBED_FILE: &str = "testbed.json";
pub const DEFAULT_TESTLAB_FILE: &str = "testlab.json";
pub const DEFAULT_SPECS_FILE: &str = "specs.json";

// ============================================================================
// Test Metadata Defaults
// ============================================================================

pub const DEFAULT_DUT_NAME: &str = "PyNTS O-RU";
pub const DEFAULT_CONTACT_FIRST_NAME: &str = "Alice";
pub const DEFAULT_CONTACT_LAST_NAME: &str = "Tester";
pub const DEFAULT_CONTACT_EMAIL: &str = "alice@example.org";
pub const DEFAULT_CONTACT_ORGANIZATION: &str = "ExampleOrg";
pub const DEFAULT_CONTACT_PHONE: &str = "+123456789";

// ============================================================================
// Test Case Defaults
// ============================================================================

/// Mountpoint under which the device under test appears in the controller.
pub const DEFAULT_DUT_MOUNTPOINT_NAME: &str = "pynts-o-ru-hybrid";

pub const DEFAULT_EXPECTED_CONNECTION_STATUS: &str = "connected";

/// Capability the O-RU must advertise once its NETCONF session is up.
pub const DEFAULT_EXPECTED_CAPABILITY: &str = "o-ran-uplane-conf";

pub const DEFAULT_FILTER_PATH: &str =
    "network-topology:network-topology/topology=topology-netconf";
pub const DEFAULT_CONFIG_PATH: &str =
    "network-topology:network-topology/topology=topology-netconf";

// ============================================================================
// Controller Defaults
// ============================================================================

pub const DEFAULT_ODL_URL: &str = "https://odlux.oam.smo.o-ran-sc.org";
pub const DEFAULT_ODL_USERNAME: &str = "admin";
pub const DEFAULT_ODL_PASSWORD: &str = "Kp8bJ4SXszM0WXlhak3eHlcse2gAw84vaoGGmJvUy2U";

/// Per-request timeout in seconds.
pub const DEFAULT_CONTROLLER_TIMEOUT: u64 = 10;

// ============================================================================
// Simulator Defaults
// ============================================================================

pub const DEFAULT_USE_SIMULATOR: bool = true;
pub const DEFAULT_SIMULATOR_COMPOSE_FILE: &str = "tools/simulator/docker-compose.yaml";
pub const DEFAULT_SIMULATOR_SERVICE_NAME: &str = "pynts-o-ru-hybrid";

/// Seconds to wait after start-up so the simulator can call home.
pub const DEFAULT_SIMULATOR_WAIT_SECONDS: u64 = 5;

// ============================================================================
// Runner Defaults
// ============================================================================

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Levels accepted by `log_level`, compared case-insensitively.
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "warning", "error"];

/// Prefix of every environment variable override.
pub const ENV_PREFIX: &str = "HMP_";
