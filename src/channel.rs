//! Byte channels connecting the station to the operator and the antenna.

use crate::config::StationConfig;
use crate::constants::*;
use crate::error::{Result, StationError};
use log::debug;
use serialport::SerialPort;
use std::io::{self, Read, Write};
use std::time::Duration;

/// Blocking byte transport
pub trait ByteChannel {
    /// Write all bytes
    fn send(&mut self, bytes: &[u8]) -> Result<()>;

    /// Read one byte.
    ///
    /// With `timeout` set to `None` this blocks until a byte arrives. With
    /// `Some(t)` it returns `Ok(None)` if nothing arrived within `t`.
    fn receive_byte(&mut self, timeout: Option<Duration>) -> Result<Option<u8>>;

    /// Whether a byte can be read without waiting
    fn bytes_available(&mut self) -> Result<bool>;

    /// Write a text message
    fn send_str(&mut self, text: &str) -> Result<()> {
        self.send(text.as_bytes())
    }

    /// Read one line, terminator included
    fn receive_line(&mut self) -> Result<Vec<u8>> {
        let mut line = Vec::new();
        loop {
            if let Some(byte) = self.receive_byte(None)? {
                line.push(byte);
                if byte == LINE_TERMINATOR {
                    return Ok(line);
                }
            }
        }
    }

    /// Discard whatever is waiting; returns the number of bytes dropped
    fn drain(&mut self) -> Result<usize> {
        let mut dropped = 0;
        while self.bytes_available()? {
            match self.receive_byte(Some(Duration::ZERO))? {
                Some(_) => dropped += 1,
                None => break,
            }
        }
        Ok(dropped)
    }

    /// Drop stale input before a new exchange
    fn clear_input(&mut self) -> Result<()> {
        self.drain().map(|_| ())
    }
}

/// Control of the antenna's power enable line
pub trait PowerControl {
    /// Drive the power enable line
    fn set_power_enable(&mut self, enabled: bool) -> Result<()>;
}

/// Strip a trailing `\n` and any `\r` before it
pub fn trim_line(line: &[u8]) -> &[u8] {
    let mut end = line.len();
    while end > 0 && matches!(line[end - 1], b'\n' | b'\r') {
        end -= 1;
    }
    &line[..end]
}

/// Format bytes as space separated hex for debug output
pub fn hex_dump(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// List available serial ports
pub fn list_ports() -> Result<Vec<serialport::SerialPortInfo>> {
    Ok(serialport::available_ports()?)
}

/// Serial port backed channel.
///
/// When used as the remote link the DTR line doubles as the antenna's power
/// enable.
pub struct SerialChannel {
    port: Box<dyn SerialPort>,
    name: String,
}

impl SerialChannel {
    /// Open a port with the station's 8-N-1 framing
    pub fn open(port_name: &str, baud_rate: u32) -> Result<Self> {
        let port = serialport::new(port_name, baud_rate)
            .data_bits(DATA_BITS)
            .parity(PARITY)
            .stop_bits(STOP_BITS)
            .flow_control(serialport::FlowControl::None)
            .timeout(Duration::from_millis(POLL_INTERVAL_MS))
            .open()?;

        debug!("Opened {} at {} baud", port_name, baud_rate);
        Ok(Self::from_port(port))
    }

    /// Open the operator link (UART0)
    pub fn open_operator(port_name: &str, config: &StationConfig) -> Result<Self> {
        Self::open(port_name, config.operator_baud_rate)
    }

    /// Open the remote link (UART1) with power enable deasserted
    pub fn open_remote(port_name: &str, config: &StationConfig) -> Result<Self> {
        let mut channel = Self::open(port_name, config.remote_baud_rate)?;
        channel.set_power_enable(false)?;
        Ok(channel)
    }

    /// Wrap an already opened port
    pub fn from_port(port: Box<dyn SerialPort>) -> Self {
        let name = port.name().unwrap_or_else(|| "serial".to_string());
        SerialChannel { port, name }
    }
}

impl ByteChannel for SerialChannel {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        debug!("{} sending:  {}", self.name, hex_dump(bytes));
        self.port.write_all(bytes)?;
        self.port.flush()?;
        Ok(())
    }

    fn receive_byte(&mut self, timeout: Option<Duration>) -> Result<Option<u8>> {
        let wait = timeout.unwrap_or(Duration::from_millis(POLL_INTERVAL_MS));
        if self.port.timeout() != wait {
            self.port.set_timeout(wait)?;
        }

        let mut byte = [0u8; 1];
        loop {
            match self.port.read(&mut byte) {
                Ok(1) => {
                    debug!("{} received: {:02X}", self.name, byte[0]);
                    return Ok(Some(byte[0]));
                }
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::TimedOut => {}
                Err(e) => return Err(e.into()),
            }
            if timeout.is_some() {
                return Ok(None);
            }
        }
    }

    fn bytes_available(&mut self) -> Result<bool> {
        Ok(self.port.bytes_to_read()? > 0)
    }

    fn clear_input(&mut self) -> Result<()> {
        self.port.clear(serialport::ClearBuffer::Input)?;
        Ok(())
    }
}

impl PowerControl for SerialChannel {
    fn set_power_enable(&mut self, enabled: bool) -> Result<()> {
        debug!("{} power enable {}", self.name, if enabled { "on" } else { "off" });
        self.port.write_data_terminal_ready(enabled)?;
        Ok(())
    }
}

/// Operator channel on the process's stdin/stdout
#[derive(Debug, Default)]
pub struct ConsoleChannel;

impl ConsoleChannel {
    /// Attach to stdin/stdout
    pub fn new() -> Self {
        ConsoleChannel
    }
}

impl ByteChannel for ConsoleChannel {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(bytes)?;
        stdout.flush()?;
        Ok(())
    }

    // stdin cannot be read with a deadline, so `timeout` is ignored
    fn receive_byte(&mut self, _timeout: Option<Duration>) -> Result<Option<u8>> {
        let mut byte = [0u8; 1];
        match io::stdin().lock().read(&mut byte)? {
            0 => Err(StationError::ChannelClosed),
            _ => Ok(Some(byte[0])),
        }
    }

    fn bytes_available(&mut self) -> Result<bool> {
        Ok(false)
    }
}
