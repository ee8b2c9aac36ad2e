//! Conversion between the ASCII hex record and its packed packet.
//!
//! Two hex digits pack into one byte, high nibble first. The codec never
//! fails: characters outside `0-9A-F` pack as a zero nibble, and a nibble
//! without a hex digit unpacks as a null byte.

use crate::constants::PACKET_LENGTH;
use crate::error::{Result, StationError};
use crate::types::{Field, Packet, Record};

/// Map an ASCII hex digit to its nibble value, `0` for anything else
pub fn ascii_to_nibble(byte: u8) -> u8 {
    match byte {
        b'0'..=b'9' => byte - b'0',
        b'A'..=b'F' => byte - b'A' + 10,
        _ => 0,
    }
}

/// Map a nibble value to its ASCII hex digit, `0` (null) for anything else
pub fn nibble_to_ascii(nibble: u8) -> u8 {
    match nibble {
        0..=9 => b'0' + nibble,
        10..=15 => b'A' + nibble - 10,
        _ => 0,
    }
}

/// Pack a 38 character record into a 19 byte packet
pub fn encode(record: &Record) -> Packet {
    let ascii = record.as_bytes();
    let mut packet = [0u8; PACKET_LENGTH];
    for (i, byte) in packet.iter_mut().enumerate() {
        *byte = (ascii_to_nibble(ascii[2 * i]) << 4) | ascii_to_nibble(ascii[2 * i + 1]);
    }
    Packet::from_bytes(packet)
}

/// Unpack a 19 byte packet into a 38 character record.
///
/// The first packet byte yields the first two characters, high nibble first.
pub fn decode(packet: &Packet) -> Record {
    let mut ascii = [0u8; PACKET_LENGTH * 2];
    for (i, &byte) in packet.as_bytes().iter().enumerate() {
        ascii[2 * i] = nibble_to_ascii(byte >> 4);
        ascii[2 * i + 1] = nibble_to_ascii(byte & 0x0F);
    }
    Record::from_bytes(ascii)
}

/// Check one operator entry against its field.
///
/// The entry (line terminators already stripped) must be exactly the field
/// width and consist of uppercase hex digits only.
pub fn validate_field(field: Field, entry: &[u8]) -> Result<()> {
    if entry.len() != field.width() {
        return Err(StationError::InvalidField {
            field,
            reason: format!("expected {} characters, got {}", field.width(), entry.len()),
        });
    }

    if let Some(&bad) = entry
        .iter()
        .find(|&&b| !matches!(b, b'0'..=b'9' | b'A'..=b'F'))
    {
        return Err(StationError::InvalidField {
            field,
            reason: format!("{:?} is not an uppercase hex digit", bad as char),
        });
    }

    Ok(())
}
