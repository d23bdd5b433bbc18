//! Configuration management for the test runner.
//!
//! Configuration is loaded from multiple sources with the following priority:
//! 1. Environment variables prefixed with `HMP_` (highest priority)
//! 2. Project-local `hmp.toml` or `config/default.toml`
//! 3. User config `~/.config/hmp/config.toml`
//! 4. Built-in defaults (lowest priority)
//!
//! The loaded value is built once by the entry point and handed to every
//! component that needs it. Nothing in the crate reads configuration from a
//! global.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

mod defaults;

pub use defaults::*;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log filter, e.g. "info" or "hmp_core=debug".
    pub log_level: String,

    /// Write the bare results JSON instead of a zip archive.
    pub skip_archiving: bool,

    /// Locations of metadata inputs and run outputs.
    pub paths: PathsConfig,

    /// Descriptive fields copied into the report's test metadata.
    pub test_metadata: TestMetadataConfig,

    /// Expected values consumed by the built-in test cases.
    pub test_cases: TestCaseConfig,

    /// OpenDaylight controller connection.
    pub controller: ControllerConfig,

    /// Simulated O-RU lifecycle.
    pub simulator: SimulatorConfig,

    /// Which tests to run. `None` runs every suite.
    pub test_execution: Option<TestExecutionConfig>,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// Searches for config in order:
    /// 1. `./hmp.toml` (project local)
    /// 2. `./config/default.toml` (project local)
    /// 3. `~/.config/hmp/config.toml` (user config)
    /// 4. Falls back to defaults
    ///
    /// Environment overrides are applied in every case.
    pub fn load() -> Result<Self, ConfigError> {
        for local in ["hmp.toml", "config/default.toml"] {
            if Path::new(local).exists() {
                return Self::from_file(local);
            }
        }

        if let Some(path) = Self::user_config_path() {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        let mut config = Self::default();
        config.apply_env_overrides();
        Ok(config)
    }

    /// Location of the per-user configuration file, if the platform has one.
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("hmp").join("config.toml"))
    }

    /// Load configuration from a specific file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides();

        Ok(config)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// Keys are full variable names such as `HMP_CONTROLLER_TIMEOUT`.
    /// Values that fail to parse as the target type are ignored.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        // Controller overrides
        if let Some(url) = var("CONTROLLER_ODL_URL") {
            self.controller.odl_url = url;
        }
        if let Some(user) = var("CONTROLLER_ODL_USERNAME") {
            self.controller.odl_username = user;
        }
        if let Some(password) = var("CONTROLLER_ODL_PASSWORD") {
            self.controller.odl_password = password;
        }
        if let Some(timeout) = var("CONTROLLER_TIMEOUT") {
            if let Ok(n) = timeout.parse() {
                self.controller.timeout = n;
            }
        }

        // Path overrides
        if let Some(dir) = var("PATHS_OUTPUT_DIR") {
            self.paths.output_dir = PathBuf::from(dir);
        }
        if let Some(dir) = var("PATHS_METADATA_DIR") {
            self.paths.metadata_dir = PathBuf::from(dir);
        }

        // Simulator overrides
        if let Some(flag) = var("SIMULATOR_USE_SIMULATOR") {
            if let Some(b) = parse_flag(&flag) {
                self.simulator.use_simulator = b;
            }
        }

        // Test case overrides
        if let Some(name) = var("TEST_CASES_DUT_MOUNTPOINT_NAME") {
            self.test_cases.dut_mountpoint_name = name;
        }

        // Runner overrides
        if let Some(level) = var("LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(flag) = var("SKIP_ARCHIVING") {
            if let Some(b) = parse_flag(&flag) {
                self.skip_archiving = b;
            }
        }
    }

    /// Check values that would otherwise fail later and less clearly.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.controller.odl_url.trim().is_empty() {
            return Err(ConfigError::Invalid("controller.odl_url must not be empty".into()));
        }
        if self.controller.timeout == 0 {
            return Err(ConfigError::Invalid("controller.timeout must be at least 1 second".into()));
        }
        let level = self.log_level.to_ascii_lowercase();
        // Directive strings ("hmp_core=debug") are left to the subscriber.
        if !level.contains('=') && !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::Invalid(format!("unknown log_level '{}'", self.log_level)));
        }
        Ok(())
    }

    /// Create a default config file content as a string.
    pub fn default_config_string() -> String {
        Config::default().to_toml_string()
    }

    /// This configuration as TOML. The controller password is omitted.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// File and directory locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub metadata_dir: PathBuf,
    pub output_dir: PathBuf,

    /// File names relative to `metadata_dir`. A `.yaml`/`.yml` extension
    /// selects YAML, anything else is read as JSON.
    pub testbed_file: String,
    pub testlab_file: String,
    pub specs_file: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            metadata_dir: PathBuf::from(DEFAULT_METADATA_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            testbed_file: DEFAULT_TESTBED_FILE.to_string(),
            testlab_file: DEFAULT_TESTLAB_FILE.to_string(),
            specs_file: DEFAULT_SPECS_FILE.to_string(),
        }
    }
}

impl PathsConfig {
    pub fn testbed_path(&self) -> PathBuf {
        self.metadata_dir.join(&self.testbed_file)
    }

    pub fn testlab_path(&self) -> PathBuf {
        self.metadata_dir.join(&self.testlab_file)
    }

    pub fn specs_path(&self) -> PathBuf {
        self.metadata_dir.join(&self.specs_file)
    }
}

/// Descriptive report fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TestMetadataConfig {
    pub dut_name: String,
    pub contact_first_name: String,
    pub contact_last_name: String,
    pub contact_email: String,
    pub contact_organization: String,
    pub contact_phone: String,
}

impl Default for TestMetadataConfig {
    fn default() -> Self {
        Self {
            dut_name: DEFAULT_DUT_NAME.to_string(),
            contact_first_name: DEFAULT_CONTACT_FIRST_NAME.to_string(),
            contact_last_name: DEFAULT_CONTACT_LAST_NAME.to_string(),
            contact_email: DEFAULT_CONTACT_EMAIL.to_string(),
            contact_organization: DEFAULT_CONTACT_ORGANIZATION.to_string(),
            contact_phone: DEFAULT_CONTACT_PHONE.to_string(),
        }
    }
}

/// Expected values for the built-in test cases.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TestCaseConfig {
    /// Mountpoint (node id) of the device under test.
    pub dut_mountpoint_name: String,

    /// Connection status a new NETCONF node must report.
    pub tc_001_expected_status: String,

    /// Capability substring a new NETCONF node must advertise.
    pub tc_001_expected_capability: String,

    /// Datastore path used for the subtree-filtered retrieval.
    pub tc_002_filter_path: String,

    /// Datastore path used for the config-only retrieval.
    pub tc_002_config_path: String,
}

impl Default for TestCaseConfig {
    fn default() -> Self {
        Self {
            dut_mountpoint_name: DEFAULT_DUT_MOUNTPOINT_NAME.to_string(),
            tc_001_expected_status: DEFAULT_EXPECTED_CONNECTION_STATUS.to_string(),
            tc_001_expected_capability: DEFAULT_EXPECTED_CAPABILITY.to_string(),
            tc_002_filter_path: DEFAULT_FILTER_PATH.to_string(),
            tc_002_config_path: DEFAULT_CONFIG_PATH.to_string(),
        }
    }
}

/// OpenDaylight connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub odl_url: String,
    pub odl_username: String,

    /// Never written back out by `default_config_string`.
    #[serde(skip_serializing)]
    pub odl_password: String,

    /// Per-request timeout in seconds.
    pub timeout: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            odl_url: DEFAULT_ODL_URL.to_string(),
            odl_username: DEFAULT_ODL_USERNAME.to_string(),
            odl_password: DEFAULT_ODL_PASSWORD.to_string(),
            timeout: DEFAULT_CONTROLLER_TIMEOUT,
        }
    }
}

/// Simulated O-RU settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub use_simulator: bool,
    pub compose_file: PathBuf,
    pub service_name: String,
    pub wait_seconds: u64,

    /// Bring the simulator down once the run has finished.
    pub stop_after_run: bool,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            use_simulator: DEFAULT_USE_SIMULATOR,
            compose_file: PathBuf::from(DEFAULT_SIMULATOR_COMPOSE_FILE),
            service_name: DEFAULT_SIMULATOR_SERVICE_NAME.to_string(),
            wait_seconds: DEFAULT_SIMULATOR_WAIT_SECONDS,
            stop_after_run: false,
        }
    }
}

/// Test selection. The first non-empty list wins, in field order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TestExecutionConfig {
    pub test_cases: Option<Vec<String>>,
    pub categories: Option<Vec<String>>,
    pub suites: Option<Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            test_metadata: TestMetadataConfig::default(),
            test_cases: TestCaseConfig::default(),
            controller: ControllerConfig::default(),
            simulator: SimulatorConfig::default(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            skip_archiving: false,
            test_execution: None,
        }
    }
}
