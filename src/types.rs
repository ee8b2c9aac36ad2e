use crate::constants::{PACKET_LENGTH, RECORD_LENGTH};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fields of a record, in wire order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    G1,
    G2,
    E5,
    SerialNumber,
    ManufacturerCode,
    MiscData,
}

impl Field {
    /// All fields in the order they are prompted and packed
    pub const ALL: [Field; 6] = [
        Field::G1,
        Field::G2,
        Field::E5,
        Field::SerialNumber,
        Field::ManufacturerCode,
        Field::MiscData,
    ];

    /// Offset of the field within the ASCII record
    pub fn offset(self) -> usize {
        match self {
            Field::G1 => 0,
            Field::G2 => 4,
            Field::E5 => 8,
            Field::SerialNumber => 12,
            Field::ManufacturerCode => 18,
            Field::MiscData => 22,
        }
    }

    /// Number of ASCII hex characters in the field
    pub fn width(self) -> usize {
        match self {
            Field::G1 | Field::G2 | Field::E5 | Field::ManufacturerCode => 4,
            Field::SerialNumber => 6,
            Field::MiscData => 16,
        }
    }

    /// Label used in readout reports
    pub fn label(self) -> &'static str {
        match self {
            Field::G1 => "G1",
            Field::G2 => "G2",
            Field::E5 => "E5",
            Field::SerialNumber => "Serial Number",
            Field::ManufacturerCode => "Manufacturer Code",
            Field::MiscData => "Miscellaneous Data",
        }
    }

    /// Prompt shown to the operator when programming
    pub fn prompt(self) -> &'static str {
        match self {
            Field::G1 => "\nEnter Group Delay G1: ",
            Field::G2 => "\nEnter Group Delay G2: ",
            Field::E5 => "\nEnter Group Delay E5: ",
            Field::SerialNumber => "\nEnter Serial Number: ",
            Field::ManufacturerCode => "\nEnter Manufacturer Code: ",
            Field::MiscData => "\nEnter Miscellaneous Data: ",
        }
    }

    fn range(self) -> std::ops::Range<usize> {
        self.offset()..self.offset() + self.width()
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Operator-facing ASCII form of a record.
///
/// Bytes are kept as entered; anything outside `0-9A-F` is coerced to zero
/// only when the record is packed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record([u8; RECORD_LENGTH]);

impl Record {
    /// Build a record from raw ASCII, truncating or zero padding to 38 bytes
    pub fn from_ascii(ascii: &[u8]) -> Self {
        let mut bytes = [0u8; RECORD_LENGTH];
        let len = ascii.len().min(RECORD_LENGTH);
        bytes[..len].copy_from_slice(&ascii[..len]);
        Record(bytes)
    }

    /// Wrap 38 raw bytes
    pub fn from_bytes(bytes: [u8; RECORD_LENGTH]) -> Self {
        Record(bytes)
    }

    /// Raw ASCII bytes
    pub fn as_bytes(&self) -> &[u8; RECORD_LENGTH] {
        &self.0
    }

    /// Raw bytes of one field
    pub fn field(&self, field: Field) -> &[u8] {
        &self.0[field.range()]
    }

    /// Overwrite one field. Short entries leave the tail zeroed, long ones are cut.
    pub fn set_field(&mut self, field: Field, entry: &[u8]) {
        let slot = &mut self.0[field.range()];
        slot.fill(0);
        let len = entry.len().min(slot.len());
        slot[..len].copy_from_slice(&entry[..len]);
    }

    /// Printable text of a field; a null byte ends the field early
    pub fn field_text(&self, field: Field) -> String {
        let raw = self.field(field);
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        String::from_utf8_lossy(&raw[..end]).to_string()
    }
}

impl Default for Record {
    fn default() -> Self {
        Record([0u8; RECORD_LENGTH])
    }
}

/// Packed wire form of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Packet([u8; PACKET_LENGTH]);

impl Packet {
    /// Wrap 19 packed bytes
    pub fn from_bytes(bytes: [u8; PACKET_LENGTH]) -> Self {
        Packet(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; PACKET_LENGTH] {
        &self.0
    }

    /// Mutable access used while a packet is being received
    pub fn as_mut_bytes(&mut self) -> &mut [u8; PACKET_LENGTH] {
        &mut self.0
    }
}

/// Session states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum State {
    #[default]
    Initial,
    Transmit,
    Receive,
    Report,
}

/// Top-level operator command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Program,
    Readout,
    Invalid,
}

impl Command {
    /// Interpret an operator line; only its first byte matters
    pub fn parse(line: &[u8]) -> Self {
        match line.first() {
            Some(b'P') => Command::Program,
            Some(b'R') => Command::Readout,
            _ => Command::Invalid,
        }
    }
}

/// Decoded result of a successful readout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Readout {
    pub timestamp: DateTime<Utc>,
    pub g1: String,
    pub g2: String,
    pub e5: String,
    pub serial_number: String,
    pub manufacturer_code: String,
    pub misc_data: String,
}

impl Readout {
    /// Snapshot a decoded record, timestamped now
    pub fn from_record(record: &Record) -> Self {
        Readout {
            timestamp: Utc::now(),
            g1: record.field_text(Field::G1),
            g2: record.field_text(Field::G2),
            e5: record.field_text(Field::E5),
            serial_number: record.field_text(Field::SerialNumber),
            manufacturer_code: record.field_text(Field::ManufacturerCode),
            misc_data: record.field_text(Field::MiscData),
        }
    }
}
