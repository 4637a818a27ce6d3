//! Attribute code table for the KtPUsbChassis driver.
//!
//! Each [`Attribute`] maps to the vendor's integer code and to the value type
//! the driver stores it as. The codes are authoritative and must match the
//! driver exactly.

use std::fmt;

use ktpusbchassis_sys as sys;
use serde::Serialize;

/// Value type of a driver attribute, matching the typed getter used to read it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// Read with `GetAttributeViString`
    String,
    /// Read with `GetAttributeViBoolean`
    Boolean,
    /// Read with `GetAttributeViInt32`
    Int32,
    /// Read with `GetAttributeViReal64`
    Real64,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::String => "string",
            ValueType::Boolean => "boolean",
            ValueType::Int32 => "int32",
            ValueType::Real64 => "real64",
        };
        f.write_str(name)
    }
}

/// Chassis attributes queried by the diagnostic report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Attribute {
    /// Driver prefix used in function names
    SpecificDriverPrefix,
    /// Driver software revision
    SpecificDriverRevision,
    /// Driver vendor
    SpecificDriverVendor,
    /// Driver description
    SpecificDriverDescription,
    /// Chassis model number
    InstrumentModel,
    /// Chassis firmware revision
    InstrumentFirmwareRevision,
    /// Chassis serial number
    SystemSerialNumber,
    /// Whether the driver simulates the instrument
    Simulate,
    /// Whether the chassis firmware is current
    FwUpToDate,
    /// Number of fans
    FanCount,
    /// Speed of the fan named by the repcap
    FanRpm,
    /// Whether a fan alarm has been raised
    FanAlarmOccurred,
    /// Number of temperature sensors
    TemperatureSensorCount,
    /// Temperature of the sensor named by the repcap, in °C
    Temperature,
    /// Number of voltage rails
    VoltageRailCount,
    /// Voltage of the rail named by the repcap
    Voltage,
}

impl Attribute {
    /// Every known attribute, in driver documentation order.
    pub const ALL: [Attribute; 16] = [
        Attribute::SpecificDriverPrefix,
        Attribute::SpecificDriverRevision,
        Attribute::SpecificDriverVendor,
        Attribute::SpecificDriverDescription,
        Attribute::InstrumentModel,
        Attribute::InstrumentFirmwareRevision,
        Attribute::SystemSerialNumber,
        Attribute::Simulate,
        Attribute::FwUpToDate,
        Attribute::FanCount,
        Attribute::FanRpm,
        Attribute::FanAlarmOccurred,
        Attribute::TemperatureSensorCount,
        Attribute::Temperature,
        Attribute::VoltageRailCount,
        Attribute::Voltage,
    ];

    /// Vendor attribute code.
    pub const fn code(self) -> sys::ViAttr {
        match self {
            Attribute::SpecificDriverPrefix => sys::KTPUSBCHASSIS_ATTR_SPECIFIC_DRIVER_PREFIX,
            Attribute::SpecificDriverRevision => sys::KTPUSBCHASSIS_ATTR_SPECIFIC_DRIVER_REVISION,
            Attribute::SpecificDriverVendor => sys::KTPUSBCHASSIS_ATTR_SPECIFIC_DRIVER_VENDOR,
            Attribute::SpecificDriverDescription => {
                sys::KTPUSBCHASSIS_ATTR_SPECIFIC_DRIVER_DESCRIPTION
            }
            Attribute::InstrumentModel => sys::KTPUSBCHASSIS_ATTR_INSTRUMENT_MODEL,
            Attribute::InstrumentFirmwareRevision => {
                sys::KTPUSBCHASSIS_ATTR_INSTRUMENT_FIRMWARE_REVISION
            }
            Attribute::SystemSerialNumber => sys::KTPUSBCHASSIS_ATTR_SYSTEM_SERIAL_NUMBER,
            Attribute::Simulate => sys::KTPUSBCHASSIS_ATTR_SIMULATE,
            Attribute::FwUpToDate => sys::KTPUSBCHASSIS_ATTR_FW_UP_TO_DATE,
            Attribute::FanCount => sys::KTPUSBCHASSIS_ATTR_FAN_COUNT,
            Attribute::FanRpm => sys::KTPUSBCHASSIS_ATTR_FAN_RPM,
            Attribute::FanAlarmOccurred => sys::KTPUSBCHASSIS_ATTR_FAN_ALARM_OCCURRED,
            Attribute::TemperatureSensorCount => sys::KTPUSBCHASSIS_ATTR_TEMPERATURE_SENSOR_COUNT,
            Attribute::Temperature => sys::KTPUSBCHASSIS_ATTR_TEMPERATURE,
            Attribute::VoltageRailCount => sys::KTPUSBCHASSIS_ATTR_VOLTAGE_RAIL_COUNT,
            Attribute::Voltage => sys::KTPUSBCHASSIS_ATTR_VOLTAGE,
        }
    }

    /// Type the driver stores this attribute as.
    pub const fn value_type(self) -> ValueType {
        match self {
            Attribute::SpecificDriverPrefix
            | Attribute::SpecificDriverRevision
            | Attribute::SpecificDriverVendor
            | Attribute::SpecificDriverDescription
            | Attribute::InstrumentModel
            | Attribute::InstrumentFirmwareRevision
            | Attribute::SystemSerialNumber => ValueType::String,
            Attribute::Simulate | Attribute::FwUpToDate | Attribute::FanAlarmOccurred => {
                ValueType::Boolean
            }
            Attribute::FanCount
            | Attribute::TemperatureSensorCount
            | Attribute::VoltageRailCount => ValueType::Int32,
            Attribute::FanRpm | Attribute::Temperature | Attribute::Voltage => ValueType::Real64,
        }
    }

    /// Symbolic name without the `KTPUSBCHASSIS_ATTR_` prefix.
    pub const fn name(self) -> &'static str {
        match self {
            Attribute::SpecificDriverPrefix => "SPECIFIC_DRIVER_PREFIX",
            Attribute::SpecificDriverRevision => "SPECIFIC_DRIVER_REVISION",
            Attribute::SpecificDriverVendor => "SPECIFIC_DRIVER_VENDOR",
            Attribute::SpecificDriverDescription => "SPECIFIC_DRIVER_DESCRIPTION",
            Attribute::InstrumentModel => "INSTRUMENT_MODEL",
            Attribute::InstrumentFirmwareRevision => "INSTRUMENT_FIRMWARE_REVISION",
            Attribute::SystemSerialNumber => "SYSTEM_SERIAL_NUMBER",
            Attribute::Simulate => "SIMULATE",
            Attribute::FwUpToDate => "FW_UP_TO_DATE",
            Attribute::FanCount => "FAN_COUNT",
            Attribute::FanRpm => "FAN_RPM",
            Attribute::FanAlarmOccurred => "FAN_ALARM_OCCURRED",
            Attribute::TemperatureSensorCount => "TEMPERATURE_SENSOR_COUNT",
            Attribute::Temperature => "TEMPERATURE",
            Attribute::VoltageRailCount => "VOLTAGE_RAIL_COUNT",
            Attribute::Voltage => "VOLTAGE",
        }
    }

    /// Look up a known attribute by its vendor code.
    pub fn from_code(code: sys::ViAttr) -> Option<Attribute> {
        Self::ALL.into_iter().find(|attr| attr.code() == code)
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_vendor_codes() {
        assert_eq!(Attribute::SpecificDriverPrefix.code(), 1050302);
        assert_eq!(Attribute::SpecificDriverRevision.code(), 1050551);
        assert_eq!(Attribute::SpecificDriverVendor.code(), 1050513);
        assert_eq!(Attribute::SpecificDriverDescription.code(), 1050514);
        assert_eq!(Attribute::InstrumentModel.code(), 1050512);
        assert_eq!(Attribute::InstrumentFirmwareRevision.code(), 1050510);
        assert_eq!(Attribute::SystemSerialNumber.code(), 1150003);
        assert_eq!(Attribute::Simulate.code(), 1050005);
        assert_eq!(Attribute::FwUpToDate.code(), 1150021);
        assert_eq!(Attribute::FanCount.code(), 1150010);
        assert_eq!(Attribute::FanRpm.code(), 1150013);
        assert_eq!(Attribute::FanAlarmOccurred.code(), 1150011);
        assert_eq!(Attribute::TemperatureSensorCount.code(), 1150017);
        assert_eq!(Attribute::Temperature.code(), 1150018);
        assert_eq!(Attribute::VoltageRailCount.code(), 1150022);
        assert_eq!(Attribute::Voltage.code(), 1150024);
    }

    #[test]
    fn test_codes_are_unique() {
        let codes: HashSet<_> = Attribute::ALL.iter().map(|a| a.code()).collect();
        assert_eq!(codes.len(), Attribute::ALL.len());
    }

    #[test]
    fn test_value_types() {
        assert_eq!(Attribute::SystemSerialNumber.value_type(), ValueType::String);
        assert_eq!(Attribute::Simulate.value_type(), ValueType::Boolean);
        assert_eq!(Attribute::FanAlarmOccurred.value_type(), ValueType::Boolean);
        assert_eq!(Attribute::VoltageRailCount.value_type(), ValueType::Int32);
        assert_eq!(Attribute::Temperature.value_type(), ValueType::Real64);
    }

    #[test]
    fn test_from_code() {
        assert_eq!(Attribute::from_code(1150013), Some(Attribute::FanRpm));
        assert_eq!(Attribute::from_code(1150002), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Attribute::Voltage.to_string(), "VOLTAGE (1150024)");
        assert_eq!(ValueType::Real64.to_string(), "real64");
    }
}
