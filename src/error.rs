//! Error types for station operations.

use crate::types::Field;
use thiserror::Error;

/// Result type alias for station operations.
pub type Result<T> = std::result::Result<T, StationError>;

/// Error types for the programmer/reader station.
///
/// Protocol-level failures (readout timeout, unknown command, malformed hex)
/// are recovered inside the session and never show up here.
#[derive(Error, Debug)]
pub enum StationError {
    /// Serial port communication error
    #[error("Serial port error: {0}")]
    SerialPort(#[from] serialport::Error),

    /// General I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A channel reached end of input
    #[error("Channel closed")]
    ChannelClosed,

    /// Operator entry rejected by field validation
    #[error("Invalid {field}: {reason}")]
    InvalidField {
        /// Field the entry was meant for
        field: Field,
        /// Why the entry was rejected
        reason: String,
    },

    /// Store access past the end of the device
    #[error("Store access out of range: {address:#06x} + {length}")]
    StoreOutOfRange {
        /// Start address of the access
        address: usize,
        /// Length of the access in bytes
        length: usize,
    },

    /// Store access not aligned to a word boundary
    #[error("Store access not word aligned: {address:#06x} + {length}")]
    StoreUnaligned {
        /// Start address of the access
        address: usize,
        /// Length of the access in bytes
        length: usize,
    },
}
