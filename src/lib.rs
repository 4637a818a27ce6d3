//! Diagnostic client for Keysight PXIe/USB chassis controllers.
//!
//! This library opens a session through the vendor `KtPUsbChassis` IVI-C
//! driver, reads the chassis identity, fan, temperature and voltage rail
//! attributes, and renders them as a text or JSON report. It is used by the
//! `ktchassis` binary.

pub mod attributes;
pub mod config;
pub mod driver;
pub mod error;
pub mod logging;
pub mod report;
pub mod session;

pub use attributes::{Attribute, ValueType};
pub use config::ChassisConfig;
pub use driver::{ChassisDriver, KtPUsbChassisDriver, MockChassis};
pub use error::{AppResult, ChassisError, DriverStatus};
pub use report::{collect, collect_into, ChassisReport, CollectOptions};
pub use session::ChassisSession;
