//! SCBS bus spammer
//!
//! Repeatedly broadcasts `MWR 1000 2.5` and prints whatever comes back.
//! Handy for watching the line with a scope or logic analyser.

use anyhow::{Context, Result};
use clap::Parser;
use scbs_core::config::MasterConfig;
use scbs_core::protocol::{Dispatcher, Request, SerialTransport};
use scbs_master::{init_logging, print_ports, LineArgs};

/// Command line arguments for the spammer
#[derive(Parser, Debug)]
#[command(name = "scbs-spammer")]
#[command(about = "SCBS master utilities.")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    line: LineArgs,

    /// Stop after this many frames (default: run forever)
    #[arg(short = 'n', long)]
    count: Option<u64>,

    /// Register address to write
    #[arg(long, default_value = "1000")]
    reg_addr: String,

    /// Value to write
    #[arg(long, default_value = "2.5")]
    value: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.line.verbose);

    if cli.line.list_ports {
        print_ports();
        return Ok(());
    }

    let port_name = cli.line.serial_port.clone().unwrap_or_default();
    let config = cli.line.resolve(MasterConfig::for_spammer(port_name))?;

    let request = Request::new("MWR", &[cli.reg_addr.as_str(), cli.value.as_str()])?;

    let transport = SerialTransport::open(&config.serial)
        .with_context(|| format!("failed to open {}", config.serial.port_name))?;
    let mut dispatcher = Dispatcher::new(transport);
    let mut sent = 0u64;
    while cli.count.map_or(true, |count| sent < count) {
        print!("\tSending: {}", request.frame());
        let response = dispatcher.send(&request)?;
        println!("\tResponse: {response}");
        sent += 1;
    }

    let (tx_bytes, rx_bytes, tx_frames, rx_frames) = dispatcher.counters();
    tracing::info!(tx_bytes, rx_bytes, tx_frames, rx_frames, "done");
    Ok(())
}
