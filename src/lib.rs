//! # Antenna Station Library
//!
//! A Rust library for the programmer/reader station that writes calibration
//! records to an Antenna MCU and reads them back over a serial link, driven
//! by an operator on a second link.
//!
//! ## Features
//!
//! - Prompt the operator for a six field record (G1, G2, E5, serial number,
//!   manufacturer code, miscellaneous data)
//! - Pack the 38 hex characters into a 19 byte packet and send it to the antenna
//! - Read a packet back with a readout timeout and report the decoded fields
//! - Power the antenna through a control line around each transaction
//! - Word-aligned persistent byte store with an echo check
//! - An in-process Antenna MCU that stores, echoes and replays packets
//!
//! ## Example
//!
//! ```no_run
//! use antenna_station::{Station, StationConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut station = Station::open("/dev/ttyUSB0", "/dev/ttyUSB1", StationConfig::default())?;
//!     if let Some(readout) = station.transaction()? {
//!         println!("Serial number: {}", readout.serial_number);
//!     }
//!     Ok(())
//! }
//! ```

pub mod antenna;
pub mod channel;
pub mod codec;
pub mod config;
pub mod constants;
pub mod error;
pub mod protocol;
pub mod session;
pub mod store;
pub mod timeout;
pub mod types;

pub use antenna::Antenna;
pub use channel::{ByteChannel, ConsoleChannel, PowerControl, SerialChannel};
pub use config::StationConfig;
pub use error::{Result, StationError};
pub use protocol::Station;
pub use session::Session;
pub use store::{ByteStore, MemoryStore};
pub use types::*;
