//! Vendor driver seam.
//!
//! [`ChassisDriver`] mirrors the KtPUsbChassis exported functions one-to-one.
//! Every method returns the decoded value on `VI_SUCCESS` and the raw status
//! otherwise; interpreting that status is left to the session layer.
//!
//! Two implementations exist:
//! - [`KtPUsbChassisDriver`] calls the vendor library (requires the `hardware` feature)
//! - [`MockChassis`] is an in-memory chassis for tests and dry runs

pub mod ktpusbchassis;
pub mod mock;

pub use ktpusbchassis::KtPUsbChassisDriver;
pub use mock::{CallLog, DriverCall, MockChassis};

use std::ffi::CStr;

use ktpusbchassis_sys::{ViAttr, ViSession, ViStatus};

use crate::error::DriverStatus;

/// Result of a single driver call.
pub type DriverResult<T> = Result<T, DriverStatus>;

/// Map a raw `ViStatus` to a driver result. Any non-zero status is a failure.
pub fn check_status(status: ViStatus) -> DriverResult<()> {
    if status == ktpusbchassis_sys::VI_SUCCESS {
        Ok(())
    } else {
        Err(DriverStatus::new(status))
    }
}

/// The subset of the KtPUsbChassis C API used by the diagnostic client.
///
/// `repcap` selects a repeated capability: `None` passes a null pointer,
/// `Some(c"")` addresses the chassis itself, and any other name addresses the
/// fan, sensor or rail the driver returned that name for.
pub trait ChassisDriver {
    /// `KtPUsbChassis_InitWithOptions`: open a session on `resource_name`.
    fn init_with_options(
        &self,
        resource_name: &CStr,
        id_query: bool,
        reset: bool,
        option_string: &CStr,
    ) -> DriverResult<ViSession>;

    /// `KtPUsbChassis_close`
    fn close(&self, vi: ViSession) -> DriverResult<()>;

    /// `KtPUsbChassis_GetAttributeViString`, read into a `buffer_size` buffer.
    fn get_attribute_vi_string(
        &self,
        vi: ViSession,
        repcap: Option<&CStr>,
        attribute: ViAttr,
        buffer_size: usize,
    ) -> DriverResult<String>;

    /// `KtPUsbChassis_GetAttributeViBoolean`
    fn get_attribute_vi_boolean(
        &self,
        vi: ViSession,
        repcap: Option<&CStr>,
        attribute: ViAttr,
    ) -> DriverResult<bool>;

    /// `KtPUsbChassis_GetAttributeViInt32`
    fn get_attribute_vi_int32(
        &self,
        vi: ViSession,
        repcap: Option<&CStr>,
        attribute: ViAttr,
    ) -> DriverResult<i32>;

    /// `KtPUsbChassis_GetAttributeViReal64`
    fn get_attribute_vi_real64(
        &self,
        vi: ViSession,
        repcap: Option<&CStr>,
        attribute: ViAttr,
    ) -> DriverResult<f64>;

    /// `KtPUsbChassis_GetFanName` for the 1-based `index`.
    fn get_fan_name(&self, vi: ViSession, index: i32, buffer_size: usize) -> DriverResult<String>;

    /// `KtPUsbChassis_GetTemperatureSensorName` for the 1-based `index`.
    fn get_temperature_sensor_name(
        &self,
        vi: ViSession,
        index: i32,
        buffer_size: usize,
    ) -> DriverResult<String>;

    /// `KtPUsbChassis_GetVoltageRailName` for the 1-based `index`.
    fn get_voltage_rail_name(
        &self,
        vi: ViSession,
        index: i32,
        buffer_size: usize,
    ) -> DriverResult<String>;

    /// Translate a status code into the driver's own description.
    fn error_message(&self, vi: ViSession, status: ViStatus) -> DriverResult<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_status() {
        assert!(check_status(0).is_ok());
        assert_eq!(check_status(-1074135024).unwrap_err().code, -1074135024);
        // Warnings are treated as failures too
        assert!(check_status(1).is_err());
    }
}
