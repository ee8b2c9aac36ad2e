//! Antenna MCU side of the remote link.
//!
//! The antenna keeps the last packet it was programmed with in its byte store
//! at [`ANTENNA_RECORD_ADDRESS`]. While powered it echoes every packet it
//! stores, and on power up it sends the stored packet so a readout can
//! collect it.

use crate::channel::{hex_dump, ByteChannel};
use crate::constants::*;
use crate::error::Result;
use crate::store::{echo_test, ByteStore};
use crate::types::Packet;
use log::{debug, info, warn};

/// Store slot holding one packet, padded to whole words
const SLOT_LENGTH: usize = PACKET_LENGTH.div_ceil(STORE_WORD_SIZE) * STORE_WORD_SIZE;

/// Value of an erased store cell
const ERASED: u8 = 0xFF;

/// Antenna device state: its store plus the frame being received
pub struct Antenna<S> {
    store: S,
    frame: Packet,
    index: usize,
    in_frame: bool,
}

impl<S: ByteStore> Antenna<S> {
    pub fn new(store: S) -> Self {
        Antenna {
            store,
            frame: Packet::default(),
            index: 0,
            in_frame: false,
        }
    }

    /// Backing store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Packet kept in the store, `None` while the slot is blank
    pub fn stored_packet(&self) -> Result<Option<Packet>> {
        let slot = self.read_slot()?;
        // The pad byte is written as zero, so it marks a programmed slot
        if slot[PACKET_LENGTH] == ERASED {
            return Ok(None);
        }
        Ok(Some(packet_from_slot(&slot)))
    }

    /// Power up: drop any partial frame and return the bytes to send
    pub fn boot(&mut self) -> Result<Vec<u8>> {
        self.in_frame = false;
        self.index = 0;

        match self.stored_packet()? {
            Some(packet) => {
                debug!("Antenna boot, sending {}", hex_dump(packet.as_bytes()));
                Ok(frame(&packet))
            }
            None => {
                debug!("Antenna boot with a blank store");
                Ok(Vec::new())
            }
        }
    }

    /// Take one byte from the link.
    ///
    /// Bytes before the delimiter are ignored; inside a frame `\n` and `\r`
    /// are skipped. Once 19 payload bytes are in, the packet is stored and
    /// the framed read-back is returned as the echo.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Vec<u8>>> {
        if !self.in_frame {
            if byte == DELIMITER {
                self.in_frame = true;
                self.index = 0;
            }
            return Ok(None);
        }

        if byte == b'\n' || byte == b'\r' {
            return Ok(None);
        }

        self.frame.as_mut_bytes()[self.index] = byte;
        self.index += 1;
        if self.index < PACKET_LENGTH {
            return Ok(None);
        }

        self.in_frame = false;
        let stored = self.store_packet()?;
        Ok(Some(frame(&stored)))
    }

    /// Serve the link until it fails.
    ///
    /// Every stored packet is echoed on `link` and announced on `console`.
    pub fn run<L, C>(&mut self, link: &mut L, console: &mut C) -> Result<()>
    where
        L: ByteChannel + ?Sized,
        C: ByteChannel + ?Sized,
    {
        let greeting = self.boot()?;
        if !greeting.is_empty() {
            link.send(&greeting)?;
        }

        loop {
            let Some(byte) = link.receive_byte(None)? else {
                continue;
            };
            if let Some(echo) = self.feed(byte)? {
                link.send(&echo)?;
                console.send_str(&format!(
                    "{}{}\n",
                    MSG_ANTENNA_RECEIVED,
                    hex_dump(&echo[1..])
                ))?;
            }
        }
    }

    fn store_packet(&mut self) -> Result<Packet> {
        let mut slot = [0u8; SLOT_LENGTH];
        slot[..PACKET_LENGTH].copy_from_slice(self.frame.as_bytes());

        if !echo_test(&mut self.store, ANTENNA_RECORD_ADDRESS, &slot)? {
            warn!("Antenna store read back differs from the programmed packet");
        }

        let stored = packet_from_slot(&self.read_slot()?);
        info!("Antenna stored {}", hex_dump(stored.as_bytes()));
        Ok(stored)
    }

    fn read_slot(&self) -> Result<[u8; SLOT_LENGTH]> {
        let mut slot = [0u8; SLOT_LENGTH];
        self.store.read(&mut slot, ANTENNA_RECORD_ADDRESS)?;
        Ok(slot)
    }
}

fn packet_from_slot(slot: &[u8; SLOT_LENGTH]) -> Packet {
    let mut bytes = [0u8; PACKET_LENGTH];
    bytes.copy_from_slice(&slot[..PACKET_LENGTH]);
    Packet::from_bytes(bytes)
}

fn frame(packet: &Packet) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(PACKET_LENGTH + 1);
    bytes.push(DELIMITER);
    bytes.extend_from_slice(packet.as_bytes());
    bytes
}
