//! Session-scoped attribute reader.
//!
//! A [`ChassisSession`] owns one open driver session. Each getter checks that
//! the attribute is being read with its declared [`ValueType`] before calling
//! the driver, and converts any non-zero status into [`ChassisError::Driver`],
//! attaching the driver's own description of the status when it has one.
//!
//! The session is closed when dropped.

use std::ffi::{CStr, CString};

use ktpusbchassis_sys::ViSession;
use tracing::{debug, info, warn};

use crate::attributes::{Attribute, ValueType};
use crate::config::SessionConfig;
use crate::driver::{ChassisDriver, DriverResult};
use crate::error::{AppResult, ChassisError, DriverStatus};

/// Repcap addressing the chassis itself.
const CHASSIS: &CStr = c"";

fn c_string(value: &str) -> AppResult<CString> {
    CString::new(value).map_err(|_| ChassisError::InvalidString(value.to_string()))
}

/// An open KtPUsbChassis session.
#[derive(Debug)]
pub struct ChassisSession<D: ChassisDriver> {
    driver: D,
    vi: ViSession,
    resource_name: String,
    name_buffer_size: usize,
    string_buffer_size: usize,
}

impl<D: ChassisDriver> ChassisSession<D> {
    /// Open a session with `InitWithOptions`. A non-zero status is fatal.
    pub fn open(driver: D, config: &SessionConfig) -> AppResult<Self> {
        let option_string = config.options.option_string();
        let resource = c_string(&config.resource_name)?;
        let options = c_string(&option_string)?;

        info!(
            resource = %config.resource_name,
            options = %option_string,
            "Opening chassis session"
        );

        let vi = driver
            .init_with_options(&resource, config.id_query, config.reset, &options)
            .map_err(|status| {
                // No session exists yet, so ask the driver with a null handle.
                let status = describe(&driver, ktpusbchassis_sys::VI_NULL, status);
                ChassisError::driver(format!("InitWithOptions({})", config.resource_name), status)
            })?;

        debug!(vi, "Session opened");
        Ok(Self {
            driver,
            vi,
            resource_name: config.resource_name.clone(),
            name_buffer_size: config.name_buffer_size,
            string_buffer_size: config.string_buffer_size,
        })
    }

    /// VISA resource the session was opened on.
    pub fn resource_name(&self) -> &str {
        &self.resource_name
    }

    /// Raw driver session handle.
    pub fn handle(&self) -> ViSession {
        self.vi
    }

    /// The driver this session calls through.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Read a chassis-level string attribute.
    pub fn get_string(&self, attribute: Attribute) -> AppResult<String> {
        expect_type(attribute, ValueType::String)?;
        let value = self.call(format!("GetAttributeViString({})", attribute), |d| {
            d.get_attribute_vi_string(
                self.vi,
                Some(CHASSIS),
                attribute.code(),
                self.string_buffer_size,
            )
        })?;
        debug!(attribute = attribute.name(), %value, "Read string attribute");
        Ok(value)
    }

    /// Read a chassis-level boolean attribute.
    pub fn get_boolean(&self, attribute: Attribute) -> AppResult<bool> {
        expect_type(attribute, ValueType::Boolean)?;
        let value = self.call(format!("GetAttributeViBoolean({})", attribute), |d| {
            d.get_attribute_vi_boolean(self.vi, Some(CHASSIS), attribute.code())
        })?;
        debug!(attribute = attribute.name(), value, "Read boolean attribute");
        Ok(value)
    }

    /// Read an integer attribute. Counts are queried with a null repcap.
    pub fn get_int32(&self, attribute: Attribute) -> AppResult<i32> {
        expect_type(attribute, ValueType::Int32)?;
        let value = self.call(format!("GetAttributeViInt32({})", attribute), |d| {
            d.get_attribute_vi_int32(self.vi, None, attribute.code())
        })?;
        debug!(attribute = attribute.name(), value, "Read int32 attribute");
        Ok(value)
    }

    /// Read a real attribute of the fan, sensor or rail named `repcap`.
    pub fn get_real64_for(&self, repcap: &str, attribute: Attribute) -> AppResult<f64> {
        expect_type(attribute, ValueType::Real64)?;
        let selector = c_string(repcap)?;
        let value = self.call(
            format!("GetAttributeViReal64({}, \"{}\")", attribute, repcap),
            |d| d.get_attribute_vi_real64(self.vi, Some(selector.as_c_str()), attribute.code()),
        )?;
        debug!(attribute = attribute.name(), repcap, value, "Read real64 attribute");
        Ok(value)
    }

    /// Name of the fan at 1-based `index`.
    pub fn fan_name(&self, index: i32) -> AppResult<String> {
        self.call(format!("GetFanName({})", index), |d| {
            d.get_fan_name(self.vi, index, self.name_buffer_size)
        })
    }

    /// Name of the temperature sensor at 1-based `index`.
    pub fn temperature_sensor_name(&self, index: i32) -> AppResult<String> {
        self.call(format!("GetTemperatureSensorName({})", index), |d| {
            d.get_temperature_sensor_name(self.vi, index, self.name_buffer_size)
        })
    }

    /// Name of the voltage rail at 1-based `index`.
    pub fn voltage_rail_name(&self, index: i32) -> AppResult<String> {
        self.call(format!("GetVoltageRailName({})", index), |d| {
            d.get_voltage_rail_name(self.vi, index, self.name_buffer_size)
        })
    }

    fn call<T>(
        &self,
        operation: String,
        f: impl FnOnce(&D) -> DriverResult<T>,
    ) -> AppResult<T> {
        f(&self.driver).map_err(|status| {
            let status = describe(&self.driver, self.vi, status);
            ChassisError::driver(operation, status)
        })
    }
}

impl<D: ChassisDriver> Drop for ChassisSession<D> {
    fn drop(&mut self) {
        match self.driver.close(self.vi) {
            Ok(()) => info!(resource = %self.resource_name, "Chassis session closed"),
            Err(status) => warn!(
                resource = %self.resource_name,
                status = %status,
                "Failed to close chassis session"
            ),
        }
    }
}

fn expect_type(attribute: Attribute, requested: ValueType) -> AppResult<()> {
    let actual = attribute.value_type();
    if actual == requested {
        Ok(())
    } else {
        Err(ChassisError::TypeMismatch {
            attribute,
            requested,
            actual,
        })
    }
}

/// Attach the driver's text for `status`; lookup failures leave it bare.
fn describe<D: ChassisDriver>(driver: &D, vi: ViSession, status: DriverStatus) -> DriverStatus {
    if status.is_warning() {
        warn!(status = status.code, "Driver returned a warning status, treating it as a failure");
    }
    match driver.error_message(vi, status.code) {
        Ok(message) => status.with_message(message),
        Err(lookup) => {
            debug!(status = status.code, lookup = lookup.code, "No driver message for status");
            status
        }
    }
}
