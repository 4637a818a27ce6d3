//! Chassis diagnostic report.
//!
//! [`collect_into`] runs the fixed read sequence against an open session:
//! identity strings, the simulate and firmware flags, then each fan,
//! temperature sensor and voltage rail by 1-based index. Each text line is
//! written as soon as its value has been read, so a failure partway through
//! leaves everything read before it on the output. The first failure aborts
//! collection.

use std::fmt;
use std::io::{self, Write};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::attributes::Attribute;
use crate::driver::ChassisDriver;
use crate::error::AppResult;
use crate::session::ChassisSession;

/// Labels are padded so values line up in one column.
const LABEL_WIDTH: usize = 21;

/// Identity strings in read order, with their report labels.
const IDENTITY_FIELDS: [(&str, Attribute); 7] = [
    ("DRIVER_PREFIX", Attribute::SpecificDriverPrefix),
    ("DRIVER_REVISION", Attribute::SpecificDriverRevision),
    ("DRIVER_VENDOR", Attribute::SpecificDriverVendor),
    ("DRIVER_DESCRIPTION", Attribute::SpecificDriverDescription),
    ("INSTRUMENT_MODEL", Attribute::InstrumentModel),
    ("FIRMWARE_REVISION", Attribute::InstrumentFirmwareRevision),
    ("SERIAL_NUMBER", Attribute::SystemSerialNumber),
];

const FANS_HEADER: &str = "Chassis Fans:";
const SENSORS_HEADER: &str = "Temperature sensors:";

/// Identity and status attributes read at chassis level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identity {
    /// `SPECIFIC_DRIVER_PREFIX`
    pub driver_prefix: String,
    /// `SPECIFIC_DRIVER_REVISION`
    pub driver_revision: String,
    /// `SPECIFIC_DRIVER_VENDOR`
    pub driver_vendor: String,
    /// `SPECIFIC_DRIVER_DESCRIPTION`
    pub driver_description: String,
    /// `INSTRUMENT_MODEL`
    pub instrument_model: String,
    /// `INSTRUMENT_FIRMWARE_REVISION`
    pub firmware_revision: String,
    /// `SYSTEM_SERIAL_NUMBER`
    pub serial_number: String,
    /// Whether the driver is simulating the instrument
    pub simulate: bool,
    /// `FW_UP_TO_DATE`
    pub firmware_up_to_date: bool,
    /// Only read when requested through [`CollectOptions`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fan_alarm_occurred: Option<bool>,
}

impl Identity {
    /// String values in [`IDENTITY_FIELDS`] order.
    fn string_values(&self) -> [&str; 7] {
        [
            self.driver_prefix.as_str(),
            self.driver_revision.as_str(),
            self.driver_vendor.as_str(),
            self.driver_description.as_str(),
            self.instrument_model.as_str(),
            self.firmware_revision.as_str(),
            self.serial_number.as_str(),
        ]
    }
}

/// One fan, by 1-based index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FanReading {
    /// 1-based driver index
    pub index: i32,
    /// Name reported by the driver, also used as the repcap
    pub name: String,
    /// Fan speed
    pub rpm: f64,
}

/// One temperature sensor, by 1-based index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemperatureReading {
    /// 1-based driver index
    pub index: i32,
    /// Name reported by the driver, also used as the repcap
    pub name: String,
    /// Temperature in degrees Celsius
    pub celsius: f64,
}

/// One voltage rail, by 1-based index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoltageReading {
    /// 1-based driver index
    pub index: i32,
    /// Name reported by the driver, also used as the repcap
    pub name: String,
    /// Rail voltage
    pub volts: f64,
}

impl fmt::Display for FanReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} - {:.2} RPM", self.index, self.name, self.rpm)
    }
}

impl fmt::Display for TemperatureReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} {:.2} °C", self.index, self.name, self.celsius)
    }
}

impl fmt::Display for VoltageReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} - {:.3} V", self.index, self.name, self.volts)
    }
}

/// Everything read from the chassis in one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChassisReport {
    /// When collection finished
    pub captured_at: DateTime<Utc>,
    /// VISA resource the session was opened on
    pub resource_name: String,
    /// Chassis-level attributes
    pub identity: Identity,
    /// Fans in index order
    pub fans: Vec<FanReading>,
    /// Temperature sensors in index order
    pub temperature_sensors: Vec<TemperatureReading>,
    /// Voltage rails in index order
    pub voltage_rails: Vec<VoltageReading>,
}

/// What to read beyond the fixed sequence.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectOptions {
    /// Also read `FAN_ALARM_OCCURRED` after the firmware status
    pub read_fan_alarm: bool,
}

/// Read the full report from an open session without writing any text.
pub fn collect<D: ChassisDriver>(
    session: &ChassisSession<D>,
    options: CollectOptions,
) -> AppResult<ChassisReport> {
    collect_into(session, options, &mut io::sink())
}

/// Read the full report, writing each text line to `out` as soon as it is read.
///
/// On failure the lines for everything read so far have already been written.
pub fn collect_into<D: ChassisDriver, W: Write>(
    session: &ChassisSession<D>,
    options: CollectOptions,
    out: &mut W,
) -> AppResult<ChassisReport> {
    let identity = read_identity(session, options, out)?;

    let fans = read_indexed(
        session,
        Attribute::FanCount,
        out,
        |_| FANS_HEADER.to_string(),
        |index| {
            let name = session.fan_name(index)?;
            let rpm = session.get_real64_for(&name, Attribute::FanRpm)?;
            Ok(FanReading { index, name, rpm })
        },
    )?;

    let temperature_sensors = read_indexed(
        session,
        Attribute::TemperatureSensorCount,
        out,
        |_| SENSORS_HEADER.to_string(),
        |index| {
            let name = session.temperature_sensor_name(index)?;
            let celsius = session.get_real64_for(&name, Attribute::Temperature)?;
            Ok(TemperatureReading {
                index,
                name,
                celsius,
            })
        },
    )?;

    let voltage_rails = read_indexed(
        session,
        Attribute::VoltageRailCount,
        out,
        rails_header,
        |index| {
            let name = session.voltage_rail_name(index)?;
            let volts = session.get_real64_for(&name, Attribute::Voltage)?;
            Ok(VoltageReading { index, name, volts })
        },
    )?;

    info!(
        fans = fans.len(),
        temperature_sensors = temperature_sensors.len(),
        voltage_rails = voltage_rails.len(),
        "Chassis report collected"
    );

    Ok(ChassisReport {
        captured_at: Utc::now(),
        resource_name: session.resource_name().to_string(),
        identity,
        fans,
        temperature_sensors,
        voltage_rails,
    })
}

fn read_identity<D: ChassisDriver, W: Write>(
    session: &ChassisSession<D>,
    options: CollectOptions,
    out: &mut W,
) -> AppResult<Identity> {
    let mut strings: [String; 7] = Default::default();
    for (slot, (label, attribute)) in strings.iter_mut().zip(IDENTITY_FIELDS) {
        *slot = session.get_string(attribute)?;
        emit(out, field_line(label, slot.as_str()))?;
    }
    let [
        driver_prefix,
        driver_revision,
        driver_vendor,
        driver_description,
        instrument_model,
        firmware_revision,
        serial_number,
    ] = strings;

    let simulate = session.get_boolean(Attribute::Simulate)?;
    emit(out, simulate_line(simulate))?;

    let firmware_up_to_date = session.get_boolean(Attribute::FwUpToDate)?;
    emit(out, firmware_line(firmware_up_to_date))?;

    let fan_alarm_occurred = if options.read_fan_alarm {
        let alarm = session.get_boolean(Attribute::FanAlarmOccurred)?;
        emit(out, fan_alarm_line(alarm))?;
        Some(alarm)
    } else {
        None
    };

    Ok(Identity {
        driver_prefix,
        driver_revision,
        driver_vendor,
        driver_description,
        instrument_model,
        firmware_revision,
        serial_number,
        simulate,
        firmware_up_to_date,
        fan_alarm_occurred,
    })
}

/// Read `count_attribute` and write `header(count)`, then call `read` for each
/// index in `1..=count`, writing every reading as it arrives.
/// A zero or negative count yields no readings.
fn read_indexed<D, W, T>(
    session: &ChassisSession<D>,
    count_attribute: Attribute,
    out: &mut W,
    header: impl FnOnce(i32) -> String,
    mut read: impl FnMut(i32) -> AppResult<T>,
) -> AppResult<Vec<T>>
where
    D: ChassisDriver,
    W: Write,
    T: fmt::Display,
{
    let count = session.get_int32(count_attribute)?;
    emit(out, header(count))?;

    let mut readings = Vec::new();
    for index in 1..=count {
        let reading = read(index)?;
        emit(out, &reading)?;
        readings.push(reading);
    }
    Ok(readings)
}

fn emit<W: Write>(out: &mut W, line: impl fmt::Display) -> AppResult<()> {
    writeln!(out, "{}", line)?;
    Ok(())
}

fn field_line(label: &str, value: &str) -> String {
    format!("{:<width$}{}", format!("{}:", label), value, width = LABEL_WIDTH)
}

fn simulate_line(simulate: bool) -> String {
    field_line("SIMULATE", if simulate { "True" } else { "False" })
}

fn firmware_line(up_to_date: bool) -> String {
    let status = if up_to_date {
        "Chassis firmware is up-to-date"
    } else {
        "Please update chassis firmware."
    };
    field_line("Firmware Status", status)
}

fn fan_alarm_line(alarm: bool) -> String {
    field_line("Fan Alarm", if alarm { "Yes" } else { "No" })
}

fn rails_header(count: i32) -> String {
    format!("Number of Voltage Rails: {}", count)
}

impl ChassisReport {
    /// Pretty-printed JSON form of the report.
    pub fn to_json(&self) -> AppResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for ChassisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = &self.identity;
        for ((label, _), value) in IDENTITY_FIELDS.iter().zip(id.string_values()) {
            writeln!(f, "{}", field_line(label, value))?;
        }
        writeln!(f, "{}", simulate_line(id.simulate))?;
        writeln!(f, "{}", firmware_line(id.firmware_up_to_date))?;
        if let Some(alarm) = id.fan_alarm_occurred {
            writeln!(f, "{}", fan_alarm_line(alarm))?;
        }

        writeln!(f, "{}", FANS_HEADER)?;
        for fan in &self.fans {
            writeln!(f, "{}", fan)?;
        }

        writeln!(f, "{}", SENSORS_HEADER)?;
        for sensor in &self.temperature_sensors {
            writeln!(f, "{}", sensor)?;
        }

        let rails = i32::try_from(self.voltage_rails.len()).unwrap_or(i32::MAX);
        writeln!(f, "{}", rails_header(rails))?;
        for rail in &self.voltage_rails {
            writeln!(f, "{}", rail)?;
        }
        Ok(())
    }
}

/// Render the attribute code table for `ktchassis attributes`.
pub fn attribute_table() -> String {
    let mut out = format!("{:<30} {:>8}  {}\n", "ATTRIBUTE", "CODE", "TYPE");
    for attribute in Attribute::ALL {
        out.push_str(&format!(
            "{:<30} {:>8}  {}\n",
            attribute.name(),
            attribute.code(),
            attribute.value_type()
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> ChassisReport {
        ChassisReport {
            captured_at: DateTime::parse_from_rfc3339("2025-06-30T12:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            resource_name: "PXI10::4C0BC2E482DCC7E0::INSTR".to_string(),
            identity: Identity {
                driver_prefix: "KtPUsbChassis".to_string(),
                driver_revision: "1.6.14.0".to_string(),
                driver_vendor: "Keysight Technologies".to_string(),
                driver_description: "IVI Driver for Keysight PXIe/USB chassis".to_string(),
                instrument_model: "P5024A".to_string(),
                firmware_revision: "2.1.0.12".to_string(),
                serial_number: "MY63210042".to_string(),
                simulate: false,
                firmware_up_to_date: false,
                fan_alarm_occurred: None,
            },
            fans: vec![FanReading {
                index: 1,
                name: "Fan1".to_string(),
                rpm: 2412.456,
            }],
            temperature_sensors: vec![TemperatureReading {
                index: 1,
                name: "Inlet".to_string(),
                celsius: 27.254,
            }],
            voltage_rails: vec![
                VoltageReading {
                    index: 1,
                    name: "+3.3V".to_string(),
                    volts: 3.30249,
                },
                VoltageReading {
                    index: 2,
                    name: "-12V".to_string(),
                    volts: -11.9871,
                },
            ],
        }
    }

    #[test]
    fn test_text_layout() {
        let expected = "\
DRIVER_PREFIX:       KtPUsbChassis
DRIVER_REVISION:     1.6.14.0
DRIVER_VENDOR:       Keysight Technologies
DRIVER_DESCRIPTION:  IVI Driver for Keysight PXIe/USB chassis
INSTRUMENT_MODEL:    P5024A
FIRMWARE_REVISION:   2.1.0.12
SERIAL_NUMBER:       MY63210042
SIMULATE:            False
Firmware Status:     Please update chassis firmware.
Chassis Fans:
1: Fan1 - 2412.46 RPM
Temperature sensors:
1: Inlet 27.25 °C
Number of Voltage Rails: 2
1: +3.3V - 3.302 V
2: -12V - -11.987 V
";
        assert_eq!(sample_report().to_string(), expected);
    }

    #[test]
    fn test_fan_alarm_line() {
        let mut report = sample_report();
        report.identity.fan_alarm_occurred = Some(true);
        let text = report.to_string();
        assert!(text.contains(
            "Firmware Status:     Please update chassis firmware.\nFan Alarm:           Yes\n"
        ));
    }

    #[test]
    fn test_json_shape() {
        let json: serde_json::Value =
            serde_json::from_str(&sample_report().to_json().unwrap()).unwrap();
        assert_eq!(json["identity"]["instrument_model"], "P5024A");
        assert_eq!(json["voltage_rails"][1]["name"], "-12V");
        assert_eq!(json["captured_at"], "2025-06-30T12:00:00Z");
        assert!(json["identity"].get("fan_alarm_occurred").is_none());
    }

    #[test]
    fn test_attribute_table_lists_every_code() {
        let table = attribute_table();
        assert_eq!(table.lines().count(), Attribute::ALL.len() + 1);
        assert!(table.contains("TEMPERATURE_SENSOR_COUNT"));
        assert!(table.contains("1150024  real64"));
    }
}
