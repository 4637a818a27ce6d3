//! Raw FFI declarations for the Keysight `KtPUsbChassis` IVI-C driver.
//!
//! Only the subset of the driver used for chassis diagnostics is declared:
//! session setup and teardown, typed attribute getters, the fan, temperature
//! sensor and voltage rail name lookups, and error message translation.
//!
//! The functions are only linked when the `ktpusbchassis-sdk` feature is
//! enabled. The type aliases and attribute constants are always available.

#![allow(non_camel_case_types, non_upper_case_globals)]

use std::os::raw::c_char;

pub type ViChar = c_char;
pub type ViInt8 = i8;
pub type ViInt16 = i16;
pub type ViUInt16 = u16;
pub type ViInt32 = i32;
pub type ViUInt32 = u32;
pub type ViInt64 = i64;
pub type ViReal32 = f32;
pub type ViReal64 = f64;

pub type ViBoolean = ViUInt16;
pub type ViStatus = ViInt32;
pub type ViSession = ViUInt32;
pub type ViAttr = ViUInt32;
pub type ViString = *mut ViChar;
pub type ViConstString = *const ViChar;
pub type ViRsrc = *const ViChar;

pub const VI_TRUE: ViBoolean = 1;
pub const VI_FALSE: ViBoolean = 0;
pub const VI_SUCCESS: ViStatus = 0;
pub const VI_NULL: ViSession = 0;

/// Buffer size the driver expects for `KtPUsbChassis_error_message`.
pub const ERROR_MESSAGE_BUFFER_SIZE: usize = 256;

// Inherent IVI attributes
pub const KTPUSBCHASSIS_ATTR_SPECIFIC_DRIVER_PREFIX: ViAttr = 1050302;
pub const KTPUSBCHASSIS_ATTR_SPECIFIC_DRIVER_REVISION: ViAttr = 1050551;
pub const KTPUSBCHASSIS_ATTR_SPECIFIC_DRIVER_VENDOR: ViAttr = 1050513;
pub const KTPUSBCHASSIS_ATTR_SPECIFIC_DRIVER_DESCRIPTION: ViAttr = 1050514;
pub const KTPUSBCHASSIS_ATTR_INSTRUMENT_MODEL: ViAttr = 1050512;
pub const KTPUSBCHASSIS_ATTR_INSTRUMENT_FIRMWARE_REVISION: ViAttr = 1050510;
pub const KTPUSBCHASSIS_ATTR_SIMULATE: ViAttr = 1050005;

// Instrument-specific attributes
pub const KTPUSBCHASSIS_ATTR_SYSTEM_SERIAL_NUMBER: ViAttr = 1150003;
pub const KTPUSBCHASSIS_ATTR_FW_UP_TO_DATE: ViAttr = 1150021;

pub const KTPUSBCHASSIS_ATTR_FAN_COUNT: ViAttr = 1150010;
pub const KTPUSBCHASSIS_ATTR_FAN_ALARM_OCCURRED: ViAttr = 1150011;
pub const KTPUSBCHASSIS_ATTR_FAN_RPM: ViAttr = 1150013;

pub const KTPUSBCHASSIS_ATTR_TEMPERATURE_SENSOR_COUNT: ViAttr = 1150017;
pub const KTPUSBCHASSIS_ATTR_TEMPERATURE: ViAttr = 1150018;

pub const KTPUSBCHASSIS_ATTR_VOLTAGE_RAIL_COUNT: ViAttr = 1150022;
pub const KTPUSBCHASSIS_ATTR_VOLTAGE: ViAttr = 1150024;

#[cfg(feature = "ktpusbchassis-sdk")]
extern "C" {
    pub fn KtPUsbChassis_InitWithOptions(
        resource_name: ViRsrc,
        id_query: ViBoolean,
        reset: ViBoolean,
        option_string: ViConstString,
        vi: *mut ViSession,
    ) -> ViStatus;

    pub fn KtPUsbChassis_close(vi: ViSession) -> ViStatus;

    pub fn KtPUsbChassis_GetAttributeViString(
        vi: ViSession,
        rep_cap_identifier: ViConstString,
        attribute_id: ViAttr,
        attribute_value_buffer_size: ViInt32,
        attribute_value: *mut ViChar,
    ) -> ViStatus;

    pub fn KtPUsbChassis_GetAttributeViBoolean(
        vi: ViSession,
        rep_cap_identifier: ViConstString,
        attribute_id: ViAttr,
        attribute_value: *mut ViBoolean,
    ) -> ViStatus;

    pub fn KtPUsbChassis_GetAttributeViInt32(
        vi: ViSession,
        rep_cap_identifier: ViConstString,
        attribute_id: ViAttr,
        attribute_value: *mut ViInt32,
    ) -> ViStatus;

    pub fn KtPUsbChassis_GetAttributeViReal64(
        vi: ViSession,
        rep_cap_identifier: ViConstString,
        attribute_id: ViAttr,
        attribute_value: *mut ViReal64,
    ) -> ViStatus;

    pub fn KtPUsbChassis_GetFanName(
        vi: ViSession,
        index: ViInt32,
        name_buffer_size: ViInt32,
        name: *mut ViChar,
    ) -> ViStatus;

    pub fn KtPUsbChassis_GetTemperatureSensorName(
        vi: ViSession,
        index: ViInt32,
        name_buffer_size: ViInt32,
        name: *mut ViChar,
    ) -> ViStatus;

    pub fn KtPUsbChassis_GetVoltageRailName(
        vi: ViSession,
        index: ViInt32,
        name_buffer_size: ViInt32,
        name: *mut ViChar,
    ) -> ViStatus;

    pub fn KtPUsbChassis_error_message(
        vi: ViSession,
        error_code: ViStatus,
        error_message: *mut ViChar,
    ) -> ViStatus;
}
