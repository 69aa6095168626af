//! SCBS Master Utility
//!
//! Interactive prompt that sends one command at a time to the cell bus and
//! prints the raw response.
//!
//! Usage:
//!   scbs-master [OPTIONS] <SERIAL_PORT>

use anyhow::{Context, Result};
use clap::Parser;
use scbs_core::config::MasterConfig;
use scbs_core::protocol::SerialTransport;
use scbs_core::session::Session;
use scbs_master::{init_logging, print_ports, LineArgs};

/// Command line arguments for the interactive master
#[derive(Parser, Debug)]
#[command(name = "scbs-master")]
#[command(about = "SCBS master utility.")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    line: LineArgs,

    /// Decode every response as a cell frame and report checksum errors
    #[arg(long)]
    verify: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.line.verbose);

    if cli.line.list_ports {
        print_ports();
        return Ok(());
    }

    let mut config = cli.line.resolve(MasterConfig::default())?;
    config.verify_responses |= cli.verify;

    let transport = SerialTransport::open(&config.serial)
        .with_context(|| format!("failed to open {}", config.serial.port_name))?;
    tracing::info!(
        port = %config.serial.port_name,
        baud = config.serial.baud_rate,
        "port open"
    );

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    Session::new(transport, &config)
        .run(stdin.lock(), stdout.lock())
        .context("session ended with a transport error")?;

    Ok(())
}
