//! Station Example
//!
//! This example runs the programmer/reader station:
//! - Interactive selection of the antenna and operator ports (or command-line arguments)
//! - Operator prompts on this terminal, or on a second serial port
//! - Each successful readout is echoed as JSON
//!
//! Usage:
//!   cargo run --example station                              # Interactive mode
//!   cargo run --example station -- /dev/ttyUSB1              # Antenna port, console operator
//!   cargo run --example station -- /dev/ttyUSB1 /dev/ttyUSB0 # Antenna and operator ports
//!
//! Set RUST_LOG environment variable to control logging:
//!   RUST_LOG=debug cargo run --example station
//!   RUST_LOG=info cargo run --example station

use antenna_station::{ByteChannel, PowerControl, Result, Station, StationConfig, StationError};
use inquire::{Confirm, Select};
use log::{error, info};
use serialport::{SerialPortInfo, SerialPortType};
use std::fmt;
use std::io;

/// Picker entry; USB adapters show their ids and product name
struct PortChoice(SerialPortInfo);

impl fmt::Display for PortChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.port_type {
            SerialPortType::UsbPort(usb) => write!(
                f,
                "{} [{:04x}:{:04x}] {}",
                self.0.port_name,
                usb.vid,
                usb.pid,
                usb.product.as_deref().unwrap_or("USB serial")
            ),
            other => write!(f, "{} ({:?})", self.0.port_name, other),
        }
    }
}

fn prompt_error(e: inquire::InquireError) -> StationError {
    io::Error::other(format!("Selection cancelled: {}", e)).into()
}

/// Interactive serial port selection, skipping a port already in use
fn select_port(message: &str, taken: Option<&str>) -> Result<String> {
    let choices: Vec<PortChoice> = Station::list_ports()?
        .into_iter()
        .filter(|p| Some(p.port_name.as_str()) != taken)
        .map(PortChoice)
        .collect();

    if choices.is_empty() {
        return Err(io::Error::new(io::ErrorKind::NotFound, "No serial ports found").into());
    }

    let choice = Select::new(message, choices).prompt().map_err(prompt_error)?;
    Ok(choice.0.port_name)
}

fn select_operator_port(remote_port: &str) -> Result<Option<String>> {
    let on_console = Confirm::new("Take operator input on this terminal?")
        .with_default(true)
        .prompt()
        .map_err(prompt_error)?;
    if on_console {
        return Ok(None);
    }
    select_port("Select the operator serial port:", Some(remote_port)).map(Some)
}

fn serve<O, R>(mut station: Station<O, R>) -> Result<()>
where
    O: ByteChannel,
    R: ByteChannel + PowerControl,
{
    loop {
        match station.transaction() {
            Ok(Some(readout)) => match serde_json::to_string_pretty(readout) {
                Ok(json) => info!("Readout:\n{}", json),
                Err(e) => error!("Could not serialize readout: {}", e),
            },
            Ok(None) => {}
            Err(StationError::ChannelClosed) => {
                info!("Operator input closed");
                return Ok(());
            }
            Err(e) => return Err(e),
        }
    }
}

fn main() -> Result<()> {
    // Initialize logger with default info level if RUST_LOG is not set
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let (remote_port, operator_port) = match args.next() {
        Some(port) => (port, args.next()),
        None => {
            let remote = select_port("Select the antenna serial port:", None)?;
            let operator = select_operator_port(&remote)?;
            (remote, operator)
        }
    };

    let config = StationConfig::default();
    info!(
        "Antenna link {} at {} baud, readout timeout {:?}",
        remote_port, config.remote_baud_rate, config.readout_timeout
    );

    match operator_port {
        Some(operator_port) => serve(Station::open(&operator_port, &remote_port, config)?),
        None => serve(Station::with_console(&remote_port, config)?),
    }
}
