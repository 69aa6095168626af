//! Shared plumbing for the `scbs-master` and `scbs-spammer` binaries:
//! command line options, logging setup and config resolution.

use anyhow::{Context, Result};
use clap::Args;
use scbs_core::config::MasterConfig;
use scbs_core::protocol::list_ports;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Serial line options common to both binaries
#[derive(Args, Debug, Clone, Default)]
pub struct LineArgs {
    /// Serial port to use (e.g. 'COM3' or '/dev/ttyUSB0')
    #[arg(required_unless_present = "list_ports")]
    pub serial_port: Option<String>,

    /// Baud rate, overriding the config file
    #[arg(short, long)]
    pub baud: Option<u32>,

    /// Response timeout in milliseconds, overriding the config file
    #[arg(short, long)]
    pub timeout_ms: Option<u64>,

    /// JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print available serial ports and exit
    #[arg(long)]
    pub list_ports: bool,

    /// Enable debug logging (frames on the wire)
    #[arg(short, long)]
    pub verbose: bool,
}

impl LineArgs {
    /// Build the session config: `defaults`, then the config file, then flags
    pub fn resolve(&self, defaults: MasterConfig) -> Result<MasterConfig> {
        let mut config = match &self.config {
            Some(path) => MasterConfig::from_file(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => defaults,
        };

        if let Some(port) = &self.serial_port {
            config.serial.port_name = port.clone();
        }
        if let Some(baud) = self.baud {
            config.serial.baud_rate = baud;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.serial.timeout_ms = timeout_ms;
        }

        anyhow::ensure!(
            !config.serial.port_name.is_empty(),
            "no serial port given on the command line or in the config file"
        );
        Ok(config)
    }
}

/// Install a stderr subscriber honouring `RUST_LOG`
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("scbs_core={default_level},{default_level}")));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .ok();
}

/// Print detected serial ports, one per line
pub fn print_ports() {
    let ports = list_ports();
    if ports.is_empty() {
        println!("No serial ports found.");
    }
    for port in ports {
        match (port.vid, port.pid) {
            (Some(vid), Some(pid)) => println!(
                "{} [{:04x}:{:04x}] {}",
                port.name,
                vid,
                pid,
                port.product.unwrap_or_default()
            ),
            _ => println!("{}", port.name),
        }
    }
}
