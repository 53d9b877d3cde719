use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use omron_env_cli::{Bridge, BridgeConfig, BridgeResult, MessageFormat};
use omron_env_protocol::{ColorInput, LedSettings};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "envsensor")]
#[command(about = "Build request frames for and decode response frames from the Omron 2JCIE-BU sensor", long_about = None)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the request frame for a topic as hex
    Build {
        /// getLatestSensorData, getMountingOrientation, getDeviceInformation or setLED
        topic: String,

        /// LED display rule for setLED (e.g. "ON", "Temperature")
        #[arg(long)]
        display_rule: Option<String>,

        /// LED color for the ON rule (e.g. "#0D58C1")
        #[arg(long)]
        color: Option<String>,
    },

    /// Decode hex chunks received from the sensor, in arrival order
    Parse {
        /// Staleness timeout for partial frames in milliseconds (0 disables)
        #[arg(long)]
        ttl_ms: Option<u64>,

        /// Output message format
        #[arg(long, value_enum)]
        format: Option<MessageFormat>,

        /// Hex encoded chunks; read one per line from stdin when omitted
        chunks: Vec<String>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> BridgeResult<()> {
    let mut config = match &cli.config {
        Some(path) => {
            info!("loading configuration from {}", path.display());
            BridgeConfig::load(path)?
        }
        None => BridgeConfig::default(),
    };

    match cli.command {
        Commands::Build {
            topic,
            display_rule,
            color,
        } => {
            if let Some(rule) = display_rule {
                config.led.display_rule = rule;
            }
            if let Some(color) = color {
                config.led.color = ColorInput::Text(color);
            }
            let bridge = Bridge::new(&config);
            let led = LedSettings::from(&config.led);
            let frame = bridge.on_command(&topic, Some(&led))?;
            println!("{}", hex::encode(frame));
        }

        Commands::Parse {
            ttl_ms,
            format,
            chunks,
        } => {
            if let Some(ttl_ms) = ttl_ms {
                config.ttl_ms = Some(ttl_ms);
            }
            if let Some(format) = format {
                config.message_format = format;
            }
            let mut bridge = Bridge::new(&config);

            if chunks.is_empty() {
                for line in io::stdin().lock().lines() {
                    let line = line?;
                    let line = line.trim();
                    if !line.is_empty() {
                        feed(&mut bridge, line)?;
                    }
                }
            } else {
                for chunk in &chunks {
                    feed(&mut bridge, chunk)?;
                }
            }
        }
    }

    Ok(())
}

/// Feed one hex chunk and print any completed messages as JSON lines.
///
/// Protocol errors are reported and parsing continues with the next chunk.
fn feed(bridge: &mut Bridge, chunk_hex: &str) -> BridgeResult<()> {
    let chunk = hex::decode(chunk_hex)?;
    match bridge.on_input(chunk) {
        Ok(messages) => {
            for message in messages {
                println!("{}", serde_json::to_string(&message)?);
            }
        }
        Err(e) => warn!("{}", e),
    }
    Ok(())
}
