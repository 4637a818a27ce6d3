//! Configuration for the chassis diagnostic client, loaded with Figment.
//!
//! Configuration is layered in this order of precedence (highest to lowest):
//! 1. Command-line overrides (applied by the binary after loading)
//! 2. Environment variables prefixed with `KTCHASSIS_`
//! 3. TOML configuration file (default: `config/chassis.toml`, optional)
//! 4. Built-in defaults
//!
//! # Environment Variable Overrides
//!
//! Nested keys are separated by a double underscore:
//!
//! ```text
//! KTCHASSIS_LOG_LEVEL=debug
//! KTCHASSIS_SESSION__RESOURCE_NAME="PXI0::1::INSTR"
//! KTCHASSIS_SESSION__OPTIONS__SIMULATE=true
//! ```

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppResult, ChassisError};

/// Configuration file read when no `--config` is given.
pub const DEFAULT_CONFIG_PATH: &str = "config/chassis.toml";
/// Prefix of environment variable overrides.
pub const ENV_PREFIX: &str = "KTCHASSIS_";

const MAX_BUFFER_SIZE: usize = 65536;
const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChassisConfig {
    /// Logging level used when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Driver session parameters
    #[serde(default)]
    pub session: SessionConfig,
    /// Report contents
    #[serde(default)]
    pub report: ReportConfig,
}

/// Arguments to `InitWithOptions` plus buffer sizes for string reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// VISA resource name of the chassis
    pub resource_name: String,
    /// Verify the instrument identity during init
    #[serde(default = "default_true")]
    pub id_query: bool,
    /// Reset the instrument during init
    #[serde(default = "default_true")]
    pub reset: bool,
    /// Buffer size for fan, sensor and rail names
    #[serde(default = "default_name_buffer_size")]
    pub name_buffer_size: usize,
    /// Buffer size for string attributes
    #[serde(default = "default_string_buffer_size")]
    pub string_buffer_size: usize,
    /// Inherent driver options for the init option string
    #[serde(default)]
    pub options: DriverOptions,
}

/// IVI inherent options passed in the init option string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverOptions {
    /// `Simulate`
    #[serde(default)]
    pub simulate: bool,
    /// `RangeCheck`
    #[serde(default = "default_true")]
    pub range_check: bool,
    /// `QueryInstrStatus`
    #[serde(default = "default_true")]
    pub query_instr_status: bool,
    /// `Cache`
    #[serde(default = "default_true")]
    pub cache: bool,
}

/// Optional report sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Also read FAN_ALARM_OCCURRED at chassis level
    #[serde(default)]
    pub read_fan_alarm: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_name_buffer_size() -> usize {
    1024
}

fn default_string_buffer_size() -> usize {
    128
}

impl Default for ChassisConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            session: SessionConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            resource_name: "PXI10::4C0BC2E482DCC7E0::INSTR".to_string(),
            id_query: true,
            reset: true,
            name_buffer_size: default_name_buffer_size(),
            string_buffer_size: default_string_buffer_size(),
            options: DriverOptions::default(),
        }
    }
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            simulate: false,
            range_check: true,
            query_instr_status: true,
            cache: true,
        }
    }
}

impl DriverOptions {
    /// Render as the IVI option string, e.g. `Simulate=0,RangeCheck=1,QueryInstrStatus=1,Cache=1`.
    pub fn option_string(&self) -> String {
        let flag = |b: bool| if b { 1 } else { 0 };
        format!(
            "Simulate={},RangeCheck={},QueryInstrStatus={},Cache={}",
            flag(self.simulate),
            flag(self.range_check),
            flag(self.query_instr_status),
            flag(self.cache)
        )
    }
}

impl ChassisConfig {
    /// Load from a specific file path. A missing file falls back to defaults.
    pub fn load_from<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let config: Self = Self::figment(path).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// The provider stack, exposed so callers can inspect where values came from.
    pub fn figment<P: AsRef<Path>>(path: P) -> Figment {
        Figment::from(Serialized::defaults(ChassisConfig::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Validate configuration after loading or after applying overrides.
    pub fn validate(&self) -> AppResult<()> {
        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ChassisError::Configuration(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                VALID_LOG_LEVELS.join(", ")
            )));
        }

        if self.session.resource_name.trim().is_empty() {
            return Err(ChassisError::Configuration(
                "session.resource_name cannot be empty".to_string(),
            ));
        }

        for (key, size) in [
            ("name_buffer_size", self.session.name_buffer_size),
            ("string_buffer_size", self.session.string_buffer_size),
        ] {
            if size == 0 || size > MAX_BUFFER_SIZE {
                return Err(ChassisError::Configuration(format!(
                    "Invalid session.{} {}. Must be 1-{}",
                    key, size, MAX_BUFFER_SIZE
                )));
            }
        }

        Ok(())
    }

    /// Serialize the effective configuration as TOML.
    pub fn to_toml(&self) -> AppResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
