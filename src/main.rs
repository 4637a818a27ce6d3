//! `ktchassis`: read identity, fan, temperature and voltage status from a
//! Keysight PXIe/USB chassis through the KtPUsbChassis driver.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use ktchassis::config::{ChassisConfig, DEFAULT_CONFIG_PATH};
use ktchassis::report::{self, CollectOptions};
use ktchassis::{logging, ChassisDriver, ChassisSession, KtPUsbChassisDriver, MockChassis};

#[derive(Debug, Parser)]
#[command(name = "ktchassis", version, about = "Keysight PXIe/USB chassis diagnostics")]
struct Cli {
    /// Configuration file (missing file falls back to defaults)
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// VISA resource name, overrides session.resource_name
    #[arg(short, long, global = true)]
    resource: Option<String>,

    /// Ask the driver to simulate the instrument (Simulate=1)
    #[arg(long, global = true)]
    simulate: bool,

    /// Also read the chassis fan alarm flag
    #[arg(long, global = true)]
    fan_alarm: bool,

    /// Print the report as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Use the built-in mock chassis instead of the vendor driver
    #[arg(long, global = true)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Read and print the full chassis report (default)
    Report,
    /// Print the attribute code table
    Attributes,
    /// Print the effective configuration as TOML
    Config,
}

impl Cli {
    fn load_config(&self) -> Result<ChassisConfig> {
        let mut config = ChassisConfig::load_from(&self.config)
            .with_context(|| format!("Failed to load {}", self.config.display()))?;
        if let Some(resource) = &self.resource {
            config.session.resource_name = resource.clone();
        }
        if self.simulate {
            config.session.options.simulate = true;
        }
        if self.fan_alarm {
            config.report.read_fan_alarm = true;
        }
        config.validate()?;
        Ok(config)
    }
}

fn run_report<D: ChassisDriver>(driver: D, config: &ChassisConfig, json: bool) -> Result<()> {
    let session = ChassisSession::open(driver, &config.session)?;
    let options = CollectOptions {
        read_fan_alarm: config.report.read_fan_alarm,
    };
    if json {
        let report = report::collect(&session, options)?;
        println!("{}", report.to_json()?);
    } else {
        // Lines read before a failure stay on stdout ahead of the error.
        report::collect_into(&session, options, &mut io::stdout().lock())?;
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    match cli.command.as_ref().unwrap_or(&Command::Report) {
        Command::Attributes => {
            print!("{}", report::attribute_table());
            Ok(())
        }
        Command::Config => {
            let config = cli.load_config()?;
            print!("{}", config.to_toml()?);
            Ok(())
        }
        Command::Report => {
            let config = cli.load_config()?;
            logging::init(&config.log_level);
            if cli.mock {
                run_report(MockChassis::new(), &config, cli.json)
            } else {
                run_report(KtPUsbChassisDriver::new()?, &config, cli.json)
            }
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_command_is_report() {
        let cli = Cli::parse_from(["ktchassis"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_PATH));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "ktchassis",
            "report",
            "--resource",
            "PXI0::3::INSTR",
            "--simulate",
            "--json",
        ]);
        assert!(matches!(cli.command, Some(Command::Report)));
        assert_eq!(cli.resource.as_deref(), Some("PXI0::3::INSTR"));
        assert!(cli.simulate);
        assert!(cli.json);
    }
}
