//! Persistent byte store.
//!
//! Models the word-addressed EEPROM the antenna keeps its packet in.
//! [`echo_test`] checks that a program followed by a read at the same
//! address returns the written bytes.

use crate::constants::{STORE_SIZE, STORE_WORD_SIZE};
use crate::error::{Result, StationError};
use log::{debug, warn};

/// Word-addressed persistent storage
pub trait ByteStore {
    /// Write `data` starting at `address`
    fn program(&mut self, data: &[u8], address: usize) -> Result<()>;

    /// Fill `buf` from `address`
    fn read(&self, buf: &mut [u8], address: usize) -> Result<()>;

    /// Capacity in bytes
    fn size(&self) -> usize;
}

fn check_access(address: usize, length: usize, size: usize) -> Result<()> {
    if address % STORE_WORD_SIZE != 0 || length % STORE_WORD_SIZE != 0 {
        return Err(StationError::StoreUnaligned { address, length });
    }
    match address.checked_add(length) {
        Some(end) if end <= size => Ok(()),
        _ => Err(StationError::StoreOutOfRange { address, length }),
    }
}

/// In-memory store, erased to `0xFF` like a blank EEPROM
#[derive(Debug, Clone)]
pub struct MemoryStore {
    cells: Vec<u8>,
}

impl MemoryStore {
    /// Blank store of `size` bytes
    pub fn new(size: usize) -> Self {
        MemoryStore {
            cells: vec![0xFF; size],
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(STORE_SIZE)
    }
}

impl ByteStore for MemoryStore {
    fn program(&mut self, data: &[u8], address: usize) -> Result<()> {
        check_access(address, data.len(), self.cells.len())?;
        self.cells[address..address + data.len()].copy_from_slice(data);
        Ok(())
    }

    fn read(&self, buf: &mut [u8], address: usize) -> Result<()> {
        check_access(address, buf.len(), self.cells.len())?;
        buf.copy_from_slice(&self.cells[address..address + buf.len()]);
        Ok(())
    }

    fn size(&self) -> usize {
        self.cells.len()
    }
}

/// Program `data` at `address`, read it back and compare
pub fn echo_test<S: ByteStore + ?Sized>(store: &mut S, address: usize, data: &[u8]) -> Result<bool> {
    store.program(data, address)?;
    let mut readback = vec![0u8; data.len()];
    store.read(&mut readback, address)?;

    let matches = readback == data;
    if matches {
        debug!("Store echo at {:#06x} ok ({} bytes)", address, data.len());
    } else {
        warn!("Store echo mismatch at {:#06x}", address);
    }
    Ok(matches)
}
