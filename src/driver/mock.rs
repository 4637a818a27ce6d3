//! In-memory chassis that answers the KtPUsbChassis calls.
//!
//! Used by the test suite and by `ktchassis --mock` to exercise the full
//! report path without the vendor driver. Every call is appended to a shared
//! [`CallLog`] so tests can assert on the exact call sequence, and any call can
//! be made to fail with a chosen status.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::ffi::CStr;
use std::rc::Rc;

use ktpusbchassis_sys::{ViAttr, ViSession, ViStatus};
use tracing::trace;

use super::{ChassisDriver, DriverResult};
use crate::attributes::Attribute;
use crate::error::DriverStatus;

/// `VI_ERROR_INV_OBJECT`: the session handle is not open.
pub const ERROR_INVALID_SESSION: ViStatus = 0xBFFF_000E_u32 as ViStatus;
/// `IVI_ERROR_ATTRIBUTE_NOT_SUPPORTED`
pub const ERROR_ATTRIBUTE_NOT_SUPPORTED: ViStatus = 0xBFFA_0012_u32 as ViStatus;
/// `IVI_ERROR_INVALID_VALUE`, used for out-of-range indices and unknown repcaps.
pub const ERROR_INVALID_VALUE: ViStatus = 0xBFFA_0010_u32 as ViStatus;

const MOCK_SESSION: ViSession = 1;

/// One recorded driver call.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum DriverCall {
    Init {
        resource_name: String,
        id_query: bool,
        reset: bool,
        option_string: String,
    },
    Close,
    GetString {
        repcap: Option<String>,
        attribute: ViAttr,
    },
    GetBoolean {
        repcap: Option<String>,
        attribute: ViAttr,
    },
    GetInt32 {
        repcap: Option<String>,
        attribute: ViAttr,
    },
    GetReal64 {
        repcap: Option<String>,
        attribute: ViAttr,
    },
    FanName(i32),
    TemperatureSensorName(i32),
    VoltageRailName(i32),
    ErrorMessage(ViStatus),
}

impl DriverCall {
    /// Chassis-level string read, as issued by the session.
    pub fn get_string(attribute: Attribute) -> Self {
        DriverCall::GetString {
            repcap: Some(String::new()),
            attribute: attribute.code(),
        }
    }

    /// Chassis-level boolean read.
    pub fn get_boolean(attribute: Attribute) -> Self {
        DriverCall::GetBoolean {
            repcap: Some(String::new()),
            attribute: attribute.code(),
        }
    }

    /// Count read with a null repcap.
    pub fn get_count(attribute: Attribute) -> Self {
        DriverCall::GetInt32 {
            repcap: None,
            attribute: attribute.code(),
        }
    }

    /// Real read for the fan, sensor or rail named `repcap`.
    pub fn get_real64(repcap: &str, attribute: Attribute) -> Self {
        DriverCall::GetReal64 {
            repcap: Some(repcap.to_string()),
            attribute: attribute.code(),
        }
    }
}

/// Shared handle to the calls a [`MockChassis`] has received.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Rc<RefCell<Vec<DriverCall>>>);

impl CallLog {
    /// Snapshot of every call so far.
    pub fn calls(&self) -> Vec<DriverCall> {
        self.0.borrow().clone()
    }

    /// Number of calls so far.
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    /// True before the first call.
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Most recent call.
    pub fn last(&self) -> Option<DriverCall> {
        self.0.borrow().last().cloned()
    }

    fn push(&self, call: DriverCall) {
        self.0.borrow_mut().push(call);
    }
}

/// A named reading source (fan, sensor or rail).
#[derive(Debug, Clone)]
struct Channel {
    name: String,
    value: f64,
}

/// Mock KtPUsbChassis driver.
#[derive(Debug)]
pub struct MockChassis {
    strings: HashMap<ViAttr, String>,
    booleans: HashMap<ViAttr, bool>,
    fans: Vec<Channel>,
    sensors: Vec<Channel>,
    rails: Vec<Channel>,
    failures: Vec<(DriverCall, ViStatus)>,
    messages: HashMap<ViStatus, String>,
    open: Cell<Option<ViSession>>,
    log: CallLog,
}

impl Default for MockChassis {
    fn default() -> Self {
        Self::new()
    }
}

impl MockChassis {
    /// A three-slot chassis with two fans, two sensors and four rails.
    pub fn new() -> Self {
        let strings = [
            (Attribute::SpecificDriverPrefix, "KtPUsbChassis"),
            (Attribute::SpecificDriverRevision, "1.6.14.0"),
            (Attribute::SpecificDriverVendor, "Keysight Technologies"),
            (
                Attribute::SpecificDriverDescription,
                "IVI Driver for Keysight PXIe/USB chassis",
            ),
            (Attribute::InstrumentModel, "P5024A"),
            (Attribute::InstrumentFirmwareRevision, "2.1.0.12"),
            (Attribute::SystemSerialNumber, "MY63210042"),
        ]
        .into_iter()
        .map(|(attr, value)| (attr.code(), value.to_string()))
        .collect();

        let booleans = [
            (Attribute::Simulate, false),
            (Attribute::FwUpToDate, true),
            (Attribute::FanAlarmOccurred, false),
        ]
        .into_iter()
        .map(|(attr, value)| (attr.code(), value))
        .collect();

        Self {
            strings,
            booleans,
            fans: channels(&[("Fan1", 2412.5), ("Fan2", 2398.0)]),
            sensors: channels(&[("Inlet", 27.25), ("Backplane", 38.5)]),
            rails: channels(&[("+3.3V", 3.302), ("+5V", 5.011), ("+12V", 12.043), ("-12V", -11.987)]),
            failures: Vec::new(),
            messages: HashMap::new(),
            open: Cell::new(None),
            log: CallLog::default(),
        }
    }

    /// Override a string attribute.
    pub fn with_string(mut self, attribute: Attribute, value: &str) -> Self {
        self.strings.insert(attribute.code(), value.to_string());
        self
    }

    /// Override a boolean attribute.
    pub fn with_boolean(mut self, attribute: Attribute, value: bool) -> Self {
        self.booleans.insert(attribute.code(), value);
        self
    }

    /// Replace the fans with `(name, rpm)` pairs.
    pub fn with_fans(mut self, fans: &[(&str, f64)]) -> Self {
        self.fans = channels(fans);
        self
    }

    /// Replace the sensors with `(name, celsius)` pairs.
    pub fn with_temperature_sensors(mut self, sensors: &[(&str, f64)]) -> Self {
        self.sensors = channels(sensors);
        self
    }

    /// Replace the rails with `(name, volts)` pairs.
    pub fn with_voltage_rails(mut self, rails: &[(&str, f64)]) -> Self {
        self.rails = channels(rails);
        self
    }

    /// Make `call` return `status` instead of succeeding.
    pub fn fail_on(mut self, call: DriverCall, status: ViStatus) -> Self {
        self.failures.push((call, status));
        self
    }

    /// Text returned by `error_message` for `status`.
    pub fn with_error_message(mut self, status: ViStatus, message: &str) -> Self {
        self.messages.insert(status, message.to_string());
        self
    }

    /// Handle to the call log, usable after the mock moves into a session.
    pub fn call_log(&self) -> CallLog {
        self.log.clone()
    }

    /// Whether a session is currently open.
    pub fn is_open(&self) -> bool {
        self.open.get().is_some()
    }

    fn record(&self, call: DriverCall) -> DriverResult<()> {
        trace!(?call, "mock driver call");
        let failure = self
            .failures
            .iter()
            .find(|(failing, _)| *failing == call)
            .map(|(_, status)| *status);
        self.log.push(call);
        match failure {
            Some(status) => Err(DriverStatus::new(status)),
            None => Ok(()),
        }
    }

    fn check_session(&self, vi: ViSession) -> DriverResult<()> {
        if self.open.get() == Some(vi) {
            Ok(())
        } else {
            Err(DriverStatus::new(ERROR_INVALID_SESSION))
        }
    }

    fn channel_name(channels: &[Channel], index: i32, buffer_size: usize) -> DriverResult<String> {
        let slot = usize::try_from(index)
            .ok()
            .and_then(|i| i.checked_sub(1))
            .and_then(|i| channels.get(i))
            .ok_or_else(|| DriverStatus::new(ERROR_INVALID_VALUE))?;
        Ok(truncate(&slot.name, buffer_size))
    }

    fn channel_value(&self, repcap: &str, attribute: ViAttr) -> Option<f64> {
        let channels = match Attribute::from_code(attribute)? {
            Attribute::FanRpm => &self.fans,
            Attribute::Temperature => &self.sensors,
            Attribute::Voltage => &self.rails,
            _ => return None,
        };
        channels.iter().find(|c| c.name == repcap).map(|c| c.value)
    }
}

fn channels(entries: &[(&str, f64)]) -> Vec<Channel> {
    entries
        .iter()
        .map(|&(name, value)| Channel {
            name: name.to_string(),
            value,
        })
        .collect()
}

fn repcap_string(repcap: Option<&CStr>) -> Option<String> {
    repcap.map(|r| r.to_string_lossy().into_owned())
}

/// The driver writes at most `buffer_size - 1` characters plus the terminator.
fn truncate(value: &str, buffer_size: usize) -> String {
    value
        .chars()
        .take(buffer_size.saturating_sub(1))
        .collect()
}

impl ChassisDriver for MockChassis {
    fn init_with_options(
        &self,
        resource_name: &CStr,
        id_query: bool,
        reset: bool,
        option_string: &CStr,
    ) -> DriverResult<ViSession> {
        self.record(DriverCall::Init {
            resource_name: resource_name.to_string_lossy().into_owned(),
            id_query,
            reset,
            option_string: option_string.to_string_lossy().into_owned(),
        })?;
        self.open.set(Some(MOCK_SESSION));
        Ok(MOCK_SESSION)
    }

    fn close(&self, vi: ViSession) -> DriverResult<()> {
        self.record(DriverCall::Close)?;
        self.check_session(vi)?;
        self.open.set(None);
        Ok(())
    }

    fn get_attribute_vi_string(
        &self,
        vi: ViSession,
        repcap: Option<&CStr>,
        attribute: ViAttr,
        buffer_size: usize,
    ) -> DriverResult<String> {
        self.record(DriverCall::GetString {
            repcap: repcap_string(repcap),
            attribute,
        })?;
        self.check_session(vi)?;
        self.strings
            .get(&attribute)
            .map(|value| truncate(value, buffer_size))
            .ok_or_else(|| DriverStatus::new(ERROR_ATTRIBUTE_NOT_SUPPORTED))
    }

    fn get_attribute_vi_boolean(
        &self,
        vi: ViSession,
        repcap: Option<&CStr>,
        attribute: ViAttr,
    ) -> DriverResult<bool> {
        self.record(DriverCall::GetBoolean {
            repcap: repcap_string(repcap),
            attribute,
        })?;
        self.check_session(vi)?;
        self.booleans
            .get(&attribute)
            .copied()
            .ok_or_else(|| DriverStatus::new(ERROR_ATTRIBUTE_NOT_SUPPORTED))
    }

    fn get_attribute_vi_int32(
        &self,
        vi: ViSession,
        repcap: Option<&CStr>,
        attribute: ViAttr,
    ) -> DriverResult<i32> {
        self.record(DriverCall::GetInt32 {
            repcap: repcap_string(repcap),
            attribute,
        })?;
        self.check_session(vi)?;
        let count = match Attribute::from_code(attribute) {
            Some(Attribute::FanCount) => self.fans.len(),
            Some(Attribute::TemperatureSensorCount) => self.sensors.len(),
            Some(Attribute::VoltageRailCount) => self.rails.len(),
            _ => return Err(DriverStatus::new(ERROR_ATTRIBUTE_NOT_SUPPORTED)),
        };
        Ok(i32::try_from(count).unwrap_or(i32::MAX))
    }

    fn get_attribute_vi_real64(
        &self,
        vi: ViSession,
        repcap: Option<&CStr>,
        attribute: ViAttr,
    ) -> DriverResult<f64> {
        let repcap = repcap_string(repcap);
        self.record(DriverCall::GetReal64 {
            repcap: repcap.clone(),
            attribute,
        })?;
        self.check_session(vi)?;
        if !matches!(
            Attribute::from_code(attribute),
            Some(Attribute::FanRpm | Attribute::Temperature | Attribute::Voltage)
        ) {
            return Err(DriverStatus::new(ERROR_ATTRIBUTE_NOT_SUPPORTED));
        }
        repcap
            .and_then(|name| self.channel_value(&name, attribute))
            .ok_or_else(|| DriverStatus::new(ERROR_INVALID_VALUE))
    }

    fn get_fan_name(&self, vi: ViSession, index: i32, buffer_size: usize) -> DriverResult<String> {
        self.record(DriverCall::FanName(index))?;
        self.check_session(vi)?;
        Self::channel_name(&self.fans, index, buffer_size)
    }

    fn get_temperature_sensor_name(
        &self,
        vi: ViSession,
        index: i32,
        buffer_size: usize,
    ) -> DriverResult<String> {
        self.record(DriverCall::TemperatureSensorName(index))?;
        self.check_session(vi)?;
        Self::channel_name(&self.sensors, index, buffer_size)
    }

    fn get_voltage_rail_name(
        &self,
        vi: ViSession,
        index: i32,
        buffer_size: usize,
    ) -> DriverResult<String> {
        self.record(DriverCall::VoltageRailName(index))?;
        self.check_session(vi)?;
        Self::channel_name(&self.rails, index, buffer_size)
    }

    fn error_message(&self, _vi: ViSession, status: ViStatus) -> DriverResult<String> {
        self.record(DriverCall::ErrorMessage(status))?;
        self.messages
            .get(&status)
            .cloned()
            .ok_or_else(|| DriverStatus::new(ERROR_INVALID_VALUE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_one_based() {
        let mock = MockChassis::new();
        let vi = mock.init_with_options(c"PXI0::1::INSTR", true, true, c"").unwrap();
        assert_eq!(mock.get_fan_name(vi, 1, 1024).unwrap(), "Fan1");
        assert_eq!(mock.get_fan_name(vi, 2, 1024).unwrap(), "Fan2");
        assert_eq!(
            mock.get_fan_name(vi, 0, 1024).unwrap_err().code,
            ERROR_INVALID_VALUE
        );
        assert_eq!(
            mock.get_fan_name(vi, 3, 1024).unwrap_err().code,
            ERROR_INVALID_VALUE
        );
    }

    #[test]
    fn test_names_truncate_to_buffer() {
        let mock = MockChassis::new().with_voltage_rails(&[("+3.3V_AUX", 3.3)]);
        let vi = mock.init_with_options(c"PXI0::1::INSTR", true, true, c"").unwrap();
        assert_eq!(mock.get_voltage_rail_name(vi, 1, 5).unwrap(), "+3.3");
    }

    #[test]
    fn test_calls_require_open_session() {
        let mock = MockChassis::new();
        let err = mock
            .get_attribute_vi_int32(1, None, Attribute::FanCount.code())
            .unwrap_err();
        assert_eq!(err.code, ERROR_INVALID_SESSION);
    }

    #[test]
    fn test_real64_by_repcap() {
        let mock = MockChassis::new();
        let vi = mock.init_with_options(c"PXI0::1::INSTR", true, true, c"").unwrap();
        let rpm = mock
            .get_attribute_vi_real64(vi, Some(c"Fan2"), Attribute::FanRpm.code())
            .unwrap();
        assert_eq!(rpm, 2398.0);

        // A fan name is not a valid temperature repcap
        let err = mock
            .get_attribute_vi_real64(vi, Some(c"Fan2"), Attribute::Temperature.code())
            .unwrap_err();
        assert_eq!(err.code, ERROR_INVALID_VALUE);
    }

    #[test]
    fn test_injected_failure_is_logged() {
        let mock = MockChassis::new().fail_on(DriverCall::get_count(Attribute::FanCount), -42);
        let log = mock.call_log();
        let vi = mock.init_with_options(c"PXI0::1::INSTR", true, true, c"").unwrap();
        let err = mock
            .get_attribute_vi_int32(vi, None, Attribute::FanCount.code())
            .unwrap_err();
        assert_eq!(err.code, -42);
        assert_eq!(log.len(), 2);
        assert_eq!(log.last(), Some(DriverCall::get_count(Attribute::FanCount)));
    }
}
