//! Protocol constants for the programmer/reader station.
//!
//! This module defines the framing bytes, record geometry, serial link
//! parameters, timing defaults and the operator-facing text of the protocol.

/// Number of payload bytes in a packed packet
pub const PACKET_LENGTH: usize = 19;

/// Number of ASCII hex characters in a record (two per packet byte)
pub const RECORD_LENGTH: usize = PACKET_LENGTH * 2;

/// Byte marking the start of a packet on the remote link
pub const DELIMITER: u8 = b'\r';

/// Terminator of every operator line
pub const LINE_TERMINATOR: u8 = b'\n';

/// Operator link baud rate (UART0)
pub const OPERATOR_BAUD_RATE: u32 = 115_200;

/// Remote link baud rate (UART1). Some builds of the antenna run at 115200.
pub const REMOTE_BAUD_RATE: u32 = 9_600;

/// Both links use 8 data bits
pub const DATA_BITS: serialport::DataBits = serialport::DataBits::Eight;

/// Both links run without parity
pub const PARITY: serialport::Parity = serialport::Parity::None;

/// Both links use a single stop bit
pub const STOP_BITS: serialport::StopBits = serialport::StopBits::One;

/// Time the antenna needs to boot after power enable is asserted
pub const POWER_SETTLE_DELAY_MS: u64 = 100;

/// Time power stays on after a programming message was sent
pub const POWER_HOLD_DELAY_MS: u64 = 500;

/// Readout timeout guarding the receive phase
pub const READOUT_TIMEOUT_MS: u64 = 1000;

/// Slice used when a blocking read is emulated on top of a timed port read
pub const POLL_INTERVAL_MS: u64 = 50;

/// Size of the persistent byte store (EEPROM)
pub const STORE_SIZE: usize = 2048;

/// Program/read granularity of the persistent byte store
pub const STORE_WORD_SIZE: usize = 4;

/// Address the antenna keeps its programmed packet at
pub const ANTENNA_RECORD_ADDRESS: usize = 0x500;

/// Top-level prompt
pub const PROMPT_COMMAND: &str = "Program or Readout? (P/R): ";
/// Acknowledges `P`
pub const MSG_PROGRAM_MODE: &str = "Entering Programming Mode: \n";
/// Acknowledges `R`
pub const MSG_READOUT_MODE: &str = "Entering Readout Mode: \n";
/// Any other command
pub const MSG_INVALID_INPUT: &str = "Invalid Input\n";
/// A packet went out to the antenna
pub const MSG_MESSAGE_SENT: &str = "Programming Message Sent\n";
/// The readout timed out
pub const MSG_NO_MESSAGE: &str = "No message received.\n";
/// Printed before the labelled fields
pub const MSG_READOUT_HEADER: &str = "Data Readout:\n";
/// Printed after the labelled fields
pub const MSG_READOUT_COMPLETE: &str = "Data Readout Complete\n";

/// Antenna console line announcing a programmed packet
pub const MSG_ANTENNA_RECEIVED: &str = "Received message: ";
