//! Custom error types for the chassis diagnostic client.
//!
//! This module defines the primary error type, `ChassisError`. Using the
//! `thiserror` crate, it provides a single place for everything that can go
//! wrong between loading the configuration and printing the report.
//!
//! ## Error Hierarchy
//!
//! - **`Driver`**: The vendor driver returned a non-zero status. Carries the
//!   operation that failed and the raw status (plus the driver's own message
//!   when one could be retrieved). Always fatal.
//! - **`TypeMismatch`**: An attribute was requested with a value type other
//!   than the one the driver defines for it. Raised before any driver call.
//! - **`InvalidString`**: A resource name, option string or repcap contained an
//!   interior NUL byte and cannot be passed to the driver.
//! - **`Config`** / **`Configuration`**: Figment load failures and semantic
//!   validation failures respectively.
//! - **`FeatureNotEnabled`**: The hardware driver was requested in a build
//!   without the `hardware` feature.
//! - **`Io`**: Writing a report line failed.

use std::fmt;

use thiserror::Error;

use crate::attributes::{Attribute, ValueType};

/// Convenience alias for results using the application error type.
pub type AppResult<T> = std::result::Result<T, ChassisError>;

/// A non-zero status returned by the vendor driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverStatus {
    /// Raw `ViStatus` value
    pub code: i32,
    /// Text from the driver's `error_message` lookup, if available
    pub message: Option<String>,
}

impl DriverStatus {
    /// A bare status with no driver text.
    pub fn new(code: i32) -> Self {
        Self {
            code,
            message: None,
        }
    }

    /// Attach driver text. Surrounding whitespace is trimmed and blank text ignored.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        let message = message.into();
        if !message.trim().is_empty() {
            self.message = Some(message.trim().to_string());
        }
        self
    }

    /// IVI uses negative codes for errors and positive codes for warnings.
    pub fn is_warning(&self) -> bool {
        self.code > 0
    }
}

impl fmt::Display for DriverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:08X})", self.code, self.code as u32)?;
        if let Some(message) = &self.message {
            write!(f, ": {}", message)?;
        }
        Ok(())
    }
}

/// Everything that can go wrong in the diagnostic client.
#[derive(Error, Debug)]
pub enum ChassisError {
    /// A driver call returned a non-zero status
    #[error("{operation} failed with driver status {status}")]
    Driver {
        /// Driver function and its arguments, e.g. `GetFanName(2)`
        operation: String,
        /// Status returned by the call
        status: DriverStatus,
    },

    /// An attribute was requested through the wrong typed getter
    #[error("Attribute {attribute} is {actual}, requested as {requested}")]
    TypeMismatch {
        /// Attribute that was requested
        attribute: Attribute,
        /// Type of the getter that was called
        requested: ValueType,
        /// Type the driver stores the attribute as
        actual: ValueType,
    },

    /// A string could not be converted to a C string
    #[error("String passed to the driver contains a NUL byte: {0:?}")]
    InvalidString(String),

    /// Figment could not load or extract the configuration
    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    /// The loaded configuration failed validation
    #[error("Configuration validation error: {0}")]
    Configuration(String),

    /// The requested functionality needs a cargo feature this build lacks
    #[error("Feature '{0}' is not enabled. Please build with --features {0}")]
    FeatureNotEnabled(String),

    /// Report serialization failed
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration serialization failed
    #[error("TOML serialization error: {0}")]
    Toml(#[from] toml::ser::Error),

    /// Writing the report failed
    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ChassisError {
    fn from(err: figment::Error) -> Self {
        ChassisError::Config(Box::new(err))
    }
}

impl ChassisError {
    /// Driver failure for `operation`.
    pub fn driver(operation: impl Into<String>, status: DriverStatus) -> Self {
        ChassisError::Driver {
            operation: operation.into(),
            status,
        }
    }

    /// Raw driver status, if this error came from the driver.
    pub fn status_code(&self) -> Option<i32> {
        match self {
            ChassisError::Driver { status, .. } => Some(status.code),
            _ => None,
        }
    }
}
