use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use futures::StreamExt;
use serde::Serialize;
use tracing::debug;

use powerline_core::prelude::{init_with_config, Config, ConfigBuilder};
use powerline_devices::{
    api, DeviceId, DeviceInfo, LightCommand, LightRequest, LinkDatabase, LinkRecord, PowerState,
    ScanSummary,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(&cli)?;
    init_with_config(&config.logging).context("failed to initialize logging")?;
    debug!("Effective configuration: {:?}", config);

    handle_cli(cli, config).await
}

/// Command line interface for a powerline modem
#[derive(Parser)]
#[clap(name = "powerline", about = "Enumerates and controls Insteon/X10 powerline devices", version)]
pub struct Cli {
    /// Configuration file (TOML)
    #[clap(short, long, default_value = "powerline.toml")]
    pub config: PathBuf,

    /// Modem port, overrides `modem.port`
    #[clap(short, long)]
    pub port: Option<String>,

    /// Log filter, overrides `logging.level`
    #[clap(long)]
    pub log_level: Option<String>,

    /// Output format
    #[clap(short, long, value_enum, default_value_t = OutputFormat::Plaintext)]
    pub output: OutputFormat,

    #[clap(subcommand)]
    pub command: Commands,
}

/// Supported output formats
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain text format.
    Plaintext,
    /// JSON format.
    Json,
}

/// Subcommands available for the CLI
#[derive(Subcommand)]
pub enum Commands {
    /// Lists the modem's all-link database
    #[clap(name = "database")]
    Database,

    /// Connects every device in the all-link database
    #[clap(name = "devices")]
    Devices {
        /// Exit with an error if any device could not be connected
        #[clap(long)]
        strict: bool,
    },

    /// Connects a single device
    #[clap(name = "device")]
    Device {
        /// Device address, e.g. 1A.2B.3C
        id: String,
    },

    /// Switches or ramps a light
    #[clap(name = "light")]
    Light {
        /// Device address, e.g. 1A.2B.3C
        id: String,

        /// Target state (on, off)
        state: PowerState,

        /// Ramp instead of switching at once (dimmable devices only)
        #[clap(long)]
        ramp: bool,

        /// Ramp level 1-255, defaults to `lighting.default_ramp_level`
        #[clap(long, allow_hyphen_values = true)]
        level: Option<i32>,
    },

    /// Prints the effective configuration
    #[clap(name = "config")]
    ShowConfig,
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut builder = ConfigBuilder::new()
        .with_config_file(&cli.config)
        .with_environment_prefix("POWERLINE");
    if let Some(port) = &cli.port {
        builder = builder.with_override("modem.port", port);
    }
    if let Some(level) = &cli.log_level {
        builder = builder.with_override("logging.level", level);
    }
    builder.build().context("failed to load configuration")
}

#[derive(Serialize)]
struct DeviceRow {
    id: DeviceId,
    #[serde(skip_serializing_if = "Option::is_none")]
    device: Option<DeviceInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl DeviceRow {
    fn plaintext(&self) -> String {
        match (&self.device, &self.error) {
            (Some(info), _) => match &info.description {
                Some(description) => format!("{}\t{}\t{}", self.id, info.capability, description),
                None => format!("{}\t{}", self.id, info.capability),
            },
            (None, Some(error)) => format!("{}\terror\t{}", self.id, error),
            (None, None) => format!("{}", self.id),
        }
    }
}

#[derive(Serialize)]
struct LightResult<'a> {
    id: &'a DeviceId,
    command: LightCommand,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn handle_cli(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::ShowConfig => {
            print!("{}", toml::to_string_pretty(&config)?);
        }
        Commands::Database => {
            let modem = api::open_configured(&config).await?;
            let database = modem.link_database().await?;
            match cli.output {
                OutputFormat::Plaintext => {
                    println!("{}", database_header(&database));
                    for record in database.records() {
                        println!("{}", record_line(record));
                    }
                }
                OutputFormat::Json => print_json(&database)?,
            }
        }
        Commands::Devices { strict } => {
            let modem = api::open_configured(&config).await?;
            let outcomes = api::get_devices(&modem).await?;
            futures::pin_mut!(outcomes);

            let mut summary = ScanSummary::default();
            let mut rows = Vec::new();
            while let Some((id, outcome)) = outcomes.next().await {
                summary.record(&outcome);
                let row = match outcome {
                    Ok(device) => DeviceRow {
                        id,
                        device: Some(device.info().clone()),
                        error: None,
                    },
                    Err(err) => DeviceRow {
                        id,
                        device: None,
                        error: Some(err.diagnostic().map_or_else(|| err.to_string(), str::to_string)),
                    },
                };
                if cli.output == OutputFormat::Plaintext {
                    println!("{}", row.plaintext());
                }
                rows.push(row);
            }

            if cli.output == OutputFormat::Json {
                print_json(&rows)?;
            }
            eprintln!(
                "{} connected, {} failed on {}",
                summary.connected,
                summary.failed,
                modem.port()
            );
            if strict && summary.failed > 0 {
                bail!("{} of {} devices could not be connected", summary.failed, summary.total());
            }
        }
        Commands::Device { id } => {
            let modem = api::open_configured(&config).await?;
            let id = DeviceId::from(id);
            let device = api::get_device(&modem, &id).await?;
            let row = DeviceRow {
                id,
                device: Some(device.info().clone()),
                error: None,
            };
            match cli.output {
                OutputFormat::Plaintext => println!("{}", row.plaintext()),
                OutputFormat::Json => print_json(&row)?,
            }
        }
        Commands::Light {
            id,
            state,
            ramp,
            level,
        } => {
            let modem = api::open_configured(&config).await?;
            let id = DeviceId::from(id);
            let device = api::get_device(&modem, &id).await?;
            let level = match level {
                Some(level) => level,
                None => i32::from(config.lighting.ramp_level()?),
            };
            let command = LightRequest::new(state, ramp, level).apply(&device).await?;
            match cli.output {
                OutputFormat::Plaintext => println!("{}\t{}", id, command),
                OutputFormat::Json => print_json(&LightResult { id: &id, command })?,
            }
        }
    }
    Ok(())
}

fn database_header(database: &LinkDatabase) -> String {
    format!(
        "# {}: {} record(s) read at {}",
        database.port(),
        database.len(),
        database.fetched_at().to_rfc3339()
    )
}

fn record_line(record: &LinkRecord) -> String {
    let role = if record.controller { "controller" } else { "responder" };
    match record.group {
        Some(group) => format!("{}\t{}\tgroup {}", record.device_id, role, group),
        None => format!("{}\t{}", record.device_id, role),
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
    fn test_parse_light_command() {
        let cli = Cli::parse_from(["powerline", "--port", "COM3", "light", "1A.2B.3C", "on", "--ramp", "--level", "200"]);
        assert_eq!(cli.port.as_deref(), Some("COM3"));
        match cli.command {
            Commands::Light { id, state, ramp, level } => {
                assert_eq!(id, "1A.2B.3C");
                assert_eq!(state, PowerState::On);
                assert!(ramp);
                assert_eq!(level, Some(200));
            }
            _ => panic!("expected light command"),
        }
    }

    #[test]
    fn test_record_line() {
        let record = LinkRecord::new("1A.2B.3C").with_group(1).as_controller();
        assert_eq!(record_line(&record), "1A.2B.3C\tcontroller\tgroup 1");
    }

    #[test]
    fn test_database_header() {
        let database = LinkDatabase::new("COM4", vec![LinkRecord::new("1A.2B.3C")]);
        let header = database_header(&database);
        assert!(header.starts_with("# COM4: 1 record(s) read at "));
        assert!(header.ends_with(&database.fetched_at().to_rfc3339()));
    }
}
