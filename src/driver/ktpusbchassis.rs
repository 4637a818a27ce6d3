//! KtPUsbChassis IVI-C driver binding.
//!
//! Calls the functions declared in `ktpusbchassis-sys`. String results are read
//! into caller-sized `ViChar` buffers and decoded up to the first NUL.
//!
//! Without the `hardware` feature the type still exists so the rest of the
//! crate compiles, but [`KtPUsbChassisDriver::new`] always fails with
//! `FeatureNotEnabled`.

#![allow(unsafe_code)]

use std::ffi::CStr;
use std::os::raw::c_char;

use ktpusbchassis_sys::{ViAttr, ViSession, ViStatus};

#[cfg(feature = "hardware")]
use super::check_status;
use super::{ChassisDriver, DriverResult};
use crate::error::AppResult;
#[cfg(not(feature = "hardware"))]
use crate::error::ChassisError;

/// Decode a NUL-terminated driver buffer into an owned string.
///
/// Bytes after the first NUL are ignored; a buffer with no NUL is taken whole.
/// Invalid UTF-8 (the driver reports in the system code page) is replaced.
pub fn decode_buffer(buffer: &[c_char]) -> String {
    let bytes: Vec<u8> = buffer
        .iter()
        .take_while(|&&c| c != 0)
        .map(|&c| c as u8)
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Any non-zero `ViBoolean` is true.
pub fn vi_boolean(value: ktpusbchassis_sys::ViBoolean) -> bool {
    value != ktpusbchassis_sys::VI_FALSE
}

/// Clamp a buffer length to the `ViInt32` the driver expects.
pub fn buffer_len_arg(len: usize) -> i32 {
    i32::try_from(len).unwrap_or(i32::MAX)
}

/// Driver backed by the installed KtPUsbChassis library.
#[derive(Debug)]
pub struct KtPUsbChassisDriver {
    #[cfg(not(feature = "hardware"))]
    never: std::convert::Infallible,
    #[cfg(feature = "hardware")]
    _linked: (),
}

#[cfg(feature = "hardware")]
impl KtPUsbChassisDriver {
    /// The library is linked at build time, so there is nothing to load.
    pub fn new() -> AppResult<Self> {
        Ok(Self { _linked: () })
    }

    fn read_name(
        &self,
        buffer_size: usize,
        call: impl FnOnce(i32, *mut c_char) -> ViStatus,
    ) -> DriverResult<String> {
        let mut buffer: Vec<c_char> = vec![0; buffer_size.max(1)];
        check_status(call(buffer_len_arg(buffer.len()), buffer.as_mut_ptr()))?;
        Ok(decode_buffer(&buffer))
    }
}

#[cfg(feature = "hardware")]
fn repcap_ptr(repcap: Option<&CStr>) -> *const c_char {
    repcap.map_or(std::ptr::null(), CStr::as_ptr)
}

#[cfg(feature = "hardware")]
impl ChassisDriver for KtPUsbChassisDriver {
    fn init_with_options(
        &self,
        resource_name: &CStr,
        id_query: bool,
        reset: bool,
        option_string: &CStr,
    ) -> DriverResult<ViSession> {
        use ktpusbchassis_sys::{VI_FALSE, VI_NULL, VI_TRUE};

        let flag = |b: bool| if b { VI_TRUE } else { VI_FALSE };
        let mut vi: ViSession = VI_NULL;
        // SAFETY: both strings are NUL-terminated and outlive the call; `vi` is a
        // valid out-pointer.
        let status = unsafe {
            ktpusbchassis_sys::KtPUsbChassis_InitWithOptions(
                resource_name.as_ptr(),
                flag(id_query),
                flag(reset),
                option_string.as_ptr(),
                &mut vi,
            )
        };
        check_status(status)?;
        Ok(vi)
    }

    fn close(&self, vi: ViSession) -> DriverResult<()> {
        // SAFETY: plain value call on a session handle returned by the driver.
        check_status(unsafe { ktpusbchassis_sys::KtPUsbChassis_close(vi) })
    }

    fn get_attribute_vi_string(
        &self,
        vi: ViSession,
        repcap: Option<&CStr>,
        attribute: ViAttr,
        buffer_size: usize,
    ) -> DriverResult<String> {
        let repcap = repcap_ptr(repcap);
        self.read_name(buffer_size, |len, buf| {
            // SAFETY: `buf` points to `len` writable ViChars; repcap is null or NUL-terminated.
            unsafe {
                ktpusbchassis_sys::KtPUsbChassis_GetAttributeViString(
                    vi, repcap, attribute, len, buf,
                )
            }
        })
    }

    fn get_attribute_vi_boolean(
        &self,
        vi: ViSession,
        repcap: Option<&CStr>,
        attribute: ViAttr,
    ) -> DriverResult<bool> {
        let mut value = ktpusbchassis_sys::VI_FALSE;
        // SAFETY: repcap is null or NUL-terminated; `value` is a valid out-pointer.
        let status = unsafe {
            ktpusbchassis_sys::KtPUsbChassis_GetAttributeViBoolean(
                vi,
                repcap_ptr(repcap),
                attribute,
                &mut value,
            )
        };
        check_status(status)?;
        Ok(vi_boolean(value))
    }

    fn get_attribute_vi_int32(
        &self,
        vi: ViSession,
        repcap: Option<&CStr>,
        attribute: ViAttr,
    ) -> DriverResult<i32> {
        let mut value: i32 = 0;
        // SAFETY: repcap is null or NUL-terminated; `value` is a valid out-pointer.
        let status = unsafe {
            ktpusbchassis_sys::KtPUsbChassis_GetAttributeViInt32(
                vi,
                repcap_ptr(repcap),
                attribute,
                &mut value,
            )
        };
        check_status(status)?;
        Ok(value)
    }

    fn get_attribute_vi_real64(
        &self,
        vi: ViSession,
        repcap: Option<&CStr>,
        attribute: ViAttr,
    ) -> DriverResult<f64> {
        let mut value: f64 = 0.0;
        // SAFETY: repcap is null or NUL-terminated; `value` is a valid out-pointer.
        let status = unsafe {
            ktpusbchassis_sys::KtPUsbChassis_GetAttributeViReal64(
                vi,
                repcap_ptr(repcap),
                attribute,
                &mut value,
            )
        };
        check_status(status)?;
        Ok(value)
    }

    fn get_fan_name(&self, vi: ViSession, index: i32, buffer_size: usize) -> DriverResult<String> {
        self.read_name(buffer_size, |len, buf| {
            // SAFETY: `buf` points to `len` writable ViChars.
            unsafe { ktpusbchassis_sys::KtPUsbChassis_GetFanName(vi, index, len, buf) }
        })
    }

    fn get_temperature_sensor_name(
        &self,
        vi: ViSession,
        index: i32,
        buffer_size: usize,
    ) -> DriverResult<String> {
        self.read_name(buffer_size, |len, buf| {
            // SAFETY: `buf` points to `len` writable ViChars.
            unsafe {
                ktpusbchassis_sys::KtPUsbChassis_GetTemperatureSensorName(vi, index, len, buf)
            }
        })
    }

    fn get_voltage_rail_name(
        &self,
        vi: ViSession,
        index: i32,
        buffer_size: usize,
    ) -> DriverResult<String> {
        self.read_name(buffer_size, |len, buf| {
            // SAFETY: `buf` points to `len` writable ViChars.
            unsafe { ktpusbchassis_sys::KtPUsbChassis_GetVoltageRailName(vi, index, len, buf) }
        })
    }

    fn error_message(&self, vi: ViSession, status: ViStatus) -> DriverResult<String> {
        // error_message takes no size argument; the driver writes at most 256 bytes.
        self.read_name(
            ktpusbchassis_sys::ERROR_MESSAGE_BUFFER_SIZE,
            |_len, buf| {
                // SAFETY: `buf` holds ERROR_MESSAGE_BUFFER_SIZE writable ViChars.
                unsafe { ktpusbchassis_sys::KtPUsbChassis_error_message(vi, status, buf) }
            },
        )
    }
}

#[cfg(not(feature = "hardware"))]
impl KtPUsbChassisDriver {
    /// Always fails: this build does not link the driver.
    pub fn new() -> AppResult<Self> {
        Err(ChassisError::FeatureNotEnabled("hardware".to_string()))
    }
}

// An instance cannot exist without the `hardware` feature, so every method is unreachable.
#[cfg(not(feature = "hardware"))]
impl ChassisDriver for KtPUsbChassisDriver {
    fn init_with_options(&self, _: &CStr, _: bool, _: bool, _: &CStr) -> DriverResult<ViSession> {
        match self.never {}
    }

    fn close(&self, _: ViSession) -> DriverResult<()> {
        match self.never {}
    }

    fn get_attribute_vi_string(
        &self,
        _: ViSession,
        _: Option<&CStr>,
        _: ViAttr,
        _: usize,
    ) -> DriverResult<String> {
        match self.never {}
    }

    fn get_attribute_vi_boolean(
        &self,
        _: ViSession,
        _: Option<&CStr>,
        _: ViAttr,
    ) -> DriverResult<bool> {
        match self.never {}
    }

    fn get_attribute_vi_int32(&self, _: ViSession, _: Option<&CStr>, _: ViAttr) -> DriverResult<i32> {
        match self.never {}
    }

    fn get_attribute_vi_real64(
        &self,
        _: ViSession,
        _: Option<&CStr>,
        _: ViAttr,
    ) -> DriverResult<f64> {
        match self.never {}
    }

    fn get_fan_name(&self, _: ViSession, _: i32, _: usize) -> DriverResult<String> {
        match self.never {}
    }

    fn get_temperature_sensor_name(&self, _: ViSession, _: i32, _: usize) -> DriverResult<String> {
        match self.never {}
    }

    fn get_voltage_rail_name(&self, _: ViSession, _: i32, _: usize) -> DriverResult<String> {
        match self.never {}
    }

    fn error_message(&self, _: ViSession, _: ViStatus) -> DriverResult<String> {
        match self.never {}
    }
}
