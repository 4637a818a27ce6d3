//! End-to-end report collection against the mock chassis.

use std::io::Write;

use ktchassis::config::{ChassisConfig, SessionConfig};
use ktchassis::driver::mock::ERROR_INVALID_VALUE;
use ktchassis::driver::{DriverCall, MockChassis};
use ktchassis::{collect, collect_into, Attribute, ChassisError, ChassisSession, CollectOptions};

const STATUS_FAILED: i32 = -1074135024;

fn default_options() -> CollectOptions {
    CollectOptions::default()
}

#[test]
fn test_full_call_sequence() {
    let mock = MockChassis::new()
        .with_fans(&[("Fan1", 2400.0)])
        .with_temperature_sensors(&[("Inlet", 25.0)])
        .with_voltage_rails(&[("+5V", 5.0)]);
    let log = mock.call_log();

    {
        let session = ChassisSession::open(mock, &SessionConfig::default()).unwrap();
        collect(&session, default_options()).unwrap();
    }

    let mut expected = vec![DriverCall::Init {
        resource_name: "PXI10::4C0BC2E482DCC7E0::INSTR".to_string(),
        id_query: true,
        reset: true,
        option_string: "Simulate=0,RangeCheck=1,QueryInstrStatus=1,Cache=1".to_string(),
    }];
    expected.extend(
        [
            Attribute::SpecificDriverPrefix,
            Attribute::SpecificDriverRevision,
            Attribute::SpecificDriverVendor,
            Attribute::SpecificDriverDescription,
            Attribute::InstrumentModel,
            Attribute::InstrumentFirmwareRevision,
            Attribute::SystemSerialNumber,
        ]
        .into_iter()
        .map(DriverCall::get_string),
    );
    expected.extend([
        DriverCall::get_boolean(Attribute::Simulate),
        DriverCall::get_boolean(Attribute::FwUpToDate),
        DriverCall::get_count(Attribute::FanCount),
        DriverCall::FanName(1),
        DriverCall::get_real64("Fan1", Attribute::FanRpm),
        DriverCall::get_count(Attribute::TemperatureSensorCount),
        DriverCall::TemperatureSensorName(1),
        DriverCall::get_real64("Inlet", Attribute::Temperature),
        DriverCall::get_count(Attribute::VoltageRailCount),
        DriverCall::VoltageRailName(1),
        DriverCall::get_real64("+5V", Attribute::Voltage),
        DriverCall::Close,
    ]);

    assert_eq!(log.calls(), expected);
}

#[test]
fn test_report_contents() {
    let session = ChassisSession::open(MockChassis::new(), &SessionConfig::default()).unwrap();
    let report = collect(&session, default_options()).unwrap();

    assert_eq!(report.identity.instrument_model, "P5024A");
    assert!(report.identity.firmware_up_to_date);
    assert_eq!(report.identity.fan_alarm_occurred, None);
    assert_eq!(report.fans.len(), 2);
    assert_eq!(report.fans[1].index, 2);
    assert_eq!(report.fans[1].name, "Fan2");
    assert_eq!(report.temperature_sensors[0].celsius, 27.25);
    assert_eq!(report.voltage_rails.len(), 4);
    assert_eq!(report.voltage_rails[3].volts, -11.987);

    let text = report.to_string();
    assert!(text.contains("Firmware Status:     Chassis firmware is up-to-date\n"));
    assert!(text.contains("2: Fan2 - 2398.00 RPM\n"));
    assert!(text.contains("Number of Voltage Rails: 4\n"));
    assert!(text.ends_with("4: -12V - -11.987 V\n"));
}

#[test]
fn test_failure_halts_sequence() {
    let mock = MockChassis::new()
        .fail_on(DriverCall::FanName(2), STATUS_FAILED)
        .with_error_message(STATUS_FAILED, "Fan not present");
    let log = mock.call_log();

    let session = ChassisSession::open(mock, &SessionConfig::default()).unwrap();
    let err = collect(&session, default_options()).unwrap_err();
    drop(session);

    match &err {
        ChassisError::Driver { operation, status } => {
            assert_eq!(operation, "GetFanName(2)");
            assert_eq!(status.code, STATUS_FAILED);
            assert_eq!(status.message.as_deref(), Some("Fan not present"));
        }
        other => panic!("unexpected error: {other}"),
    }

    let calls = log.calls();
    let failed_at = calls
        .iter()
        .position(|c| *c == DriverCall::FanName(2))
        .unwrap();
    // Only the message lookup and the close on drop follow the failing call
    assert_eq!(
        &calls[failed_at + 1..],
        &[DriverCall::ErrorMessage(STATUS_FAILED), DriverCall::Close]
    );
}

#[test]
fn test_lines_read_before_failure_are_written() {
    let mock = MockChassis::new().fail_on(DriverCall::FanName(2), STATUS_FAILED);
    let session = ChassisSession::open(mock, &SessionConfig::default()).unwrap();

    let mut out = Vec::new();
    let err = collect_into(&session, default_options(), &mut out).unwrap_err();
    assert_eq!(err.status_code(), Some(STATUS_FAILED));

    let text = String::from_utf8(out).unwrap();
    let expected = "\
DRIVER_PREFIX:       KtPUsbChassis
DRIVER_REVISION:     1.6.14.0
DRIVER_VENDOR:       Keysight Technologies
DRIVER_DESCRIPTION:  IVI Driver for Keysight PXIe/USB chassis
INSTRUMENT_MODEL:    P5024A
FIRMWARE_REVISION:   2.1.0.12
SERIAL_NUMBER:       MY63210042
SIMULATE:            False
Firmware Status:     Chassis firmware is up-to-date
Chassis Fans:
1: Fan1 - 2412.50 RPM
";
    assert_eq!(text, expected);
}

#[test]
fn test_identity_lines_written_up_to_failure() {
    let mock = MockChassis::new().fail_on(DriverCall::get_boolean(Attribute::FwUpToDate), -7);
    let session = ChassisSession::open(mock, &SessionConfig::default()).unwrap();

    let mut out = Vec::new();
    collect_into(&session, default_options(), &mut out).unwrap_err();

    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.lines().count(), 8);
    assert!(text.ends_with("SIMULATE:            False\n"));
}

#[test]
fn test_written_lines_match_report_text() {
    let session = ChassisSession::open(
        MockChassis::new().with_boolean(Attribute::FanAlarmOccurred, true),
        &SessionConfig::default(),
    )
    .unwrap();
    let options = CollectOptions {
        read_fan_alarm: true,
    };

    let mut out = Vec::new();
    let report = collect_into(&session, options, &mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), report.to_string());
}

#[test]
fn test_identity_failure_halts_before_enumeration() {
    let mock = MockChassis::new().fail_on(DriverCall::get_boolean(Attribute::FwUpToDate), -7);
    let log = mock.call_log();

    let session = ChassisSession::open(mock, &SessionConfig::default()).unwrap();
    let err = collect(&session, default_options()).unwrap_err();
    assert_eq!(err.status_code(), Some(-7));
    // No message registered for -7, so the status stays bare
    assert!(err.to_string().ends_with("-7 (0xFFFFFFF9)"));

    assert!(!log
        .calls()
        .contains(&DriverCall::get_count(Attribute::FanCount)));
}

#[test]
fn test_init_failure_is_fatal() {
    let mock = MockChassis::new().fail_on(
        DriverCall::Init {
            resource_name: "PXI0::9::INSTR".to_string(),
            id_query: true,
            reset: true,
            option_string: "Simulate=0,RangeCheck=1,QueryInstrStatus=1,Cache=1".to_string(),
        },
        STATUS_FAILED,
    );
    let log = mock.call_log();

    let config = SessionConfig {
        resource_name: "PXI0::9::INSTR".to_string(),
        ..Default::default()
    };
    let err = ChassisSession::open(mock, &config).unwrap_err();
    assert!(err
        .to_string()
        .starts_with("InitWithOptions(PXI0::9::INSTR) failed"));

    // The session never opened, so it is not closed either
    assert!(!log.calls().contains(&DriverCall::Close));
}

#[test]
fn test_empty_enumerations() {
    let mock = MockChassis::new()
        .with_fans(&[])
        .with_temperature_sensors(&[])
        .with_voltage_rails(&[]);
    let session = ChassisSession::open(mock, &SessionConfig::default()).unwrap();
    let report = collect(&session, default_options()).unwrap();

    assert!(report.fans.is_empty());
    let text = report.to_string();
    assert!(text.ends_with(
        "Chassis Fans:\nTemperature sensors:\nNumber of Voltage Rails: 0\n"
    ));
}

#[test]
fn test_fan_alarm_is_opt_in() {
    let mock = MockChassis::new().with_boolean(Attribute::FanAlarmOccurred, true);
    let log = mock.call_log();
    let session = ChassisSession::open(mock, &SessionConfig::default()).unwrap();

    let report = collect(
        &session,
        CollectOptions {
            read_fan_alarm: true,
        },
    )
    .unwrap();

    assert_eq!(report.identity.fan_alarm_occurred, Some(true));
    assert!(report.to_string().contains("Fan Alarm:           Yes\n"));
    assert!(log
        .calls()
        .contains(&DriverCall::get_boolean(Attribute::FanAlarmOccurred)));
}

#[test]
fn test_session_closes_on_drop() {
    let mock = MockChassis::new();
    let log = mock.call_log();
    let session = ChassisSession::open(mock, &SessionConfig::default()).unwrap();
    assert!(session.driver().is_open());
    assert_eq!(session.handle(), 1);

    drop(session);
    assert_eq!(log.last(), Some(DriverCall::Close));
}

#[test]
fn test_unknown_repcap_reports_invalid_value() {
    let session = ChassisSession::open(MockChassis::new(), &SessionConfig::default()).unwrap();
    let err = session
        .get_real64_for("Fan9", Attribute::FanRpm)
        .unwrap_err();
    assert_eq!(err.status_code(), Some(ERROR_INVALID_VALUE));
}

#[test]
fn test_config_file_drives_session() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[session]
resource_name = "PXI3::0::INSTR"
reset = false

[session.options]
simulate = true
"#
    )
    .unwrap();

    let config = ChassisConfig::load_from(file.path()).unwrap();
    let mock = MockChassis::new();
    let log = mock.call_log();
    let _session = ChassisSession::open(mock, &config.session).unwrap();

    assert_eq!(
        log.calls()[0],
        DriverCall::Init {
            resource_name: "PXI3::0::INSTR".to_string(),
            id_query: true,
            reset: false,
            option_string: "Simulate=1,RangeCheck=1,QueryInstrStatus=1,Cache=1".to_string(),
        }
    );
}
