/*!
# CAN Telemetry Gateway

Listens on a SocketCAN interface for Haltech v2 broadcast frames, keeps the
latest payload of every tracked identifier in a process image, and
republishes the decoded engine channels as UDP text records at a fixed
cadence.

## Features

- Background ingestion thread filtering frames by tracked identifier
- Fixed-cadence transmission loop, one datagram per channel per pass
- Either task failing stops the other; Ctrl+C stops both cleanly
- TOML configuration with command-line overrides

## Usage

### Run with defaults (can0 → 127.0.0.1:45454)
```bash
cangateway
```

### Override the interface and destination
```bash
cangateway run --interface vcan0 --dest 192.168.1.255 --port 45454
```

### List the compiled-in channel table
```bash
cangateway channels --json
```

## Wire format

One datagram per channel: `"<point id>,<value>\n"`, with three decimals for
numeric channels and a bare `0`/`1` for flags.
*/

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use telemetry::{haltech, Encoding};
use tracing::{info, Level};

mod bus;
mod config;
mod gateway;
mod ingest;
mod shutdown;
mod sink;
#[cfg(test)]
mod testing;
mod transmit;

use bus::CanBus;
use config::{AppConfig, GatewayConfig};
use gateway::{current_thread_runtime, Gateway};
use sink::UdpTelemetry;

#[derive(Parser)]
#[command(name = "cangateway")]
#[command(about = "SocketCAN engine telemetry to UDP text gateway")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long, default_value = "cangateway.toml")]
    config: PathBuf,

    /// Log per-channel values and dropped frames
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the gateway (default)
    Run {
        #[command(flatten)]
        overrides: RunOverrides,
    },

    /// Generate configuration file
    Config {
        /// Output path for configuration file
        #[arg(short, long, default_value = "cangateway.toml")]
        output: PathBuf,
    },

    /// Print the compiled-in channel table
    Channels {
        /// Print as JSON instead of a text table
        #[arg(long)]
        json: bool,
    },
}

/// Command-line settings that take precedence over the config file
#[derive(clap::Args, Debug, Default)]
struct RunOverrides {
    /// SocketCAN interface
    #[arg(short, long)]
    interface: Option<String>,

    /// Telemetry destination address
    #[arg(short, long)]
    dest: Option<String>,

    /// Telemetry destination port
    #[arg(short, long)]
    port: Option<u16>,

    /// Pause between passes, in milliseconds
    #[arg(long)]
    cadence_ms: Option<u64>,
}

impl RunOverrides {
    fn apply(self, config: &mut GatewayConfig) {
        if let Some(interface) = self.interface {
            config.can_interface = interface;
        }
        if let Some(dest) = self.dest {
            config.udp_dest_addr = dest;
        }
        if let Some(port) = self.port {
            config.udp_port = port;
        }
        if let Some(cadence_ms) = self.cadence_ms {
            config.cadence_ms = cadence_ms;
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout is reserved for command output
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    match cli.command {
        Some(Commands::Run { overrides }) => run_gateway(cli.config, overrides),
        None => run_gateway(cli.config, RunOverrides::default()),
        Some(Commands::Config { output }) => generate_config_file(output),
        Some(Commands::Channels { json }) => list_channels(json),
    }
}

/// Set up both sockets, then run until Ctrl+C or a fatal error
fn run_gateway(config_path: PathBuf, overrides: RunOverrides) -> Result<()> {
    let mut config = AppConfig::load_or_default(&config_path)?;
    overrides.apply(&mut config.gateway);
    let settings = config.gateway;

    let destination = settings.destination()?;
    let cadence = settings.cadence()?;

    info!("🚀 Starting CAN telemetry gateway");
    let gateway = Gateway::haltech(cadence).context("Invalid channel table")?;

    // Each socket is registered with the runtime that will drive it
    let worker_runtime = current_thread_runtime().context("Failed to build worker runtime")?;
    let bus = {
        let _ctx = worker_runtime.enter();
        CanBus::open(&settings.can_interface)
            .with_context(|| format!("Failed to set up CAN interface {}", settings.can_interface))?
    };
    info!("📥 Listening on {}", bus.interface());

    let runtime = current_thread_runtime().context("Failed to build transmit runtime")?;
    let sink = {
        let _ctx = runtime.enter();
        UdpTelemetry::open(destination)
            .with_context(|| format!("Failed to set up telemetry socket for {}", destination))?
    };

    let shutdown = gateway.shutdown();
    ctrlc::set_handler(move || {
        info!("🛑 Received Ctrl+C, shutting down gracefully...");
        shutdown.trigger();
    })
    .context("Failed to install Ctrl+C handler")?;

    let report = gateway.run(worker_runtime, bus, &runtime, &sink)?;

    info!(
        "✅ Gateway stopped: {} frames stored, {} records sent over {} passes",
        report.ingest.frames_stored, report.transmit.records_sent, report.transmit.passes
    );
    Ok(())
}

/// Generate a default configuration file
fn generate_config_file(output_path: PathBuf) -> Result<()> {
    let config = AppConfig::new();
    config.save_to_file(&output_path)?;

    println!("✅ Generated configuration file: {}", output_path.display());
    println!("📝 Edit the file to customize settings, then run:");
    println!("   cangateway --config {}", output_path.display());

    Ok(())
}

/// Print the channel table in transmission order
fn list_channels(json: bool) -> Result<()> {
    if json {
        let listing = serde_json::to_string_pretty(&haltech::CHANNELS)
            .context("Failed to serialize channel table")?;
        println!("{}", listing);
        return Ok(());
    }

    println!(
        "{:<20} {:>6}  {:<10} {:>7} {:>8} {:<5} {:>5}",
        "CHANNEL", "CAN ID", "LAYOUT", "SCALE", "OFFSET", "UNIT", "POINT"
    );
    for channel in haltech::CHANNELS.iter() {
        let layout = match channel.encoding {
            Encoding::SignedWord { high, low } => format!("word {},{}", high, low),
            Encoding::Flag { byte, bit } => format!("bit {}.{}", byte, bit),
        };
        println!(
            "{:<20} 0x{:04X}  {:<10} {:>7} {:>8} {:<5} {:>5}",
            channel.label,
            channel.can_id,
            layout,
            channel.scale,
            channel.offset,
            channel.unit.unwrap_or("-"),
            channel.point_id
        );
    }

    Ok(())
}
