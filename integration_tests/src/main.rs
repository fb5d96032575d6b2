//! Serial loopback tests for the USB-UART bridge.
//!
//! Run after flashing the firmware with the bridge's UART TX and RX pins
//! jumpered together. Everything written to the CDC port must come back.

mod device;
mod harness;
mod ids;

use clap::Parser;
use colored::Colorize;

use device::{resolve_port, BridgeClient};
use harness::print_results;
use tests::run_all_tests;

#[derive(Parser)]
#[command(name = "integration-tests")]
#[command(about = "Serial loopback tests for the USB-UART bridge (TX jumpered to RX)")]
struct Args {
    /// Serial port for the device (use "auto" to auto-detect)
    #[arg(short, long, default_value = "auto")]
    port: String,

    /// Baud rate
    #[arg(short, long, default_value = "115200")]
    baud: u32,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Resolve port (auto-detect if "auto")
    let port = resolve_port(&args.port)?;

    println!("{}", "USB-UART Bridge Loopback Tests".bold());
    println!("Port: {}", port);
    println!("Baud: {}", args.baud);
    println!();

    println!("Connecting to device...");
    let mut device = BridgeClient::new(&port, args.baud)?;

    // Let the line coding settle, then clear anything left over
    std::thread::sleep(std::time::Duration::from_millis(200));
    device.drain_buffer()?;
    println!("{}", "Connected!".green());

    println!("\nRunning tests...\n");

    let results = run_all_tests(&mut device);
    print_results(&results);

    // Exit with error code if any tests failed
    let failed = results.iter().filter(|r| !r.passed).count();
    if failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}
