//! Command/response state machine.
//!
//! A [`Session`] owns the record and packet buffers and the readout timeout.
//! The operator and remote channels are borrowed for the duration of one
//! [`Session::step`] call only.

use crate::channel::{hex_dump, trim_line, ByteChannel, PowerControl};
use crate::codec;
use crate::config::StationConfig;
use crate::constants::*;
use crate::error::Result;
use crate::timeout::TimeoutGuard;
use crate::types::*;
use log::{debug, info, trace, warn};
use std::thread;
use std::time::Instant;

/// Station state machine and its buffers
pub struct Session {
    config: StationConfig,
    state: State,
    record: Record,
    packet: Packet,
    rx_index: usize,
    guard: TimeoutGuard,
    last_readout: Option<Readout>,
}

impl Session {
    /// New session waiting in [`State::Initial`]
    pub fn new(config: StationConfig) -> Self {
        let guard = TimeoutGuard::new(config.readout_timeout);
        Session {
            config,
            state: State::Initial,
            record: Record::default(),
            packet: Packet::default(),
            rx_index: 0,
            guard,
            last_readout: None,
        }
    }

    /// State the next [`Session::step`] will run
    pub fn state(&self) -> State {
        self.state
    }

    /// Packet most recently encoded or received
    pub fn packet(&self) -> &Packet {
        &self.packet
    }

    /// Result of the last transaction, if it was a successful readout
    pub fn last_readout(&self) -> Option<&Readout> {
        self.last_readout.as_ref()
    }

    /// Readout timeout guard
    pub fn guard(&self) -> &TimeoutGuard {
        &self.guard
    }

    /// Run the current state's handler and move to the next state.
    ///
    /// The state only changes once the handler has finished all its side
    /// effects. Errors are transport failures; protocol failures are
    /// reported to the operator and end in [`State::Initial`]. On error the
    /// antenna is powered down before returning.
    pub fn step<O, R>(&mut self, operator: &mut O, remote: &mut R) -> Result<State>
    where
        O: ByteChannel + ?Sized,
        R: ByteChannel + PowerControl + ?Sized,
    {
        let result = match self.state {
            State::Initial => self.initial(operator, remote),
            State::Transmit => self.transmit(operator, remote),
            State::Receive => self.receive(operator, remote),
            State::Report => self.report(operator, remote),
        };

        let next = match result {
            Ok(next) => next,
            Err(e) => {
                warn!("{:?} failed: {}", self.state, e);
                let _ = remote.set_power_enable(false);
                return Err(e);
            }
        };

        trace!("{:?} -> {:?}", self.state, next);
        self.state = next;
        Ok(next)
    }

    /// Step until the session is back in [`State::Initial`]
    pub fn run_transaction<O, R>(&mut self, operator: &mut O, remote: &mut R) -> Result<()>
    where
        O: ByteChannel + ?Sized,
        R: ByteChannel + PowerControl + ?Sized,
    {
        while self.step(operator, remote)? != State::Initial {}
        Ok(())
    }

    fn reset_buffers(&mut self) {
        self.record = Record::default();
        self.packet = Packet::default();
        self.rx_index = 0;
        self.last_readout = None;
    }

    fn initial<O, R>(&mut self, operator: &mut O, remote: &mut R) -> Result<State>
    where
        O: ByteChannel + ?Sized,
        R: ByteChannel + PowerControl + ?Sized,
    {
        remote.set_power_enable(false)?;
        self.reset_buffers();

        operator.send_str(PROMPT_COMMAND)?;
        let line = operator.receive_line()?;

        match Command::parse(&line) {
            Command::Program => {
                info!("Entering programming mode");
                operator.send_str(MSG_PROGRAM_MODE)?;
                self.collect_record(operator)?;
                self.packet = codec::encode(&self.record);
                debug!("Encoded packet: {}", hex_dump(self.packet.as_bytes()));
                Ok(State::Transmit)
            }
            Command::Readout => {
                info!("Entering readout mode");
                operator.send_str(MSG_READOUT_MODE)?;
                self.guard.arm();
                Ok(State::Receive)
            }
            Command::Invalid => {
                warn!("Invalid command: {:?}", String::from_utf8_lossy(trim_line(&line)));
                operator.send_str(MSG_INVALID_INPUT)?;
                Ok(State::Initial)
            }
        }
    }

    fn collect_record<O: ByteChannel + ?Sized>(&mut self, operator: &mut O) -> Result<()> {
        for field in Field::ALL {
            loop {
                operator.send_str(field.prompt())?;
                let line = operator.receive_line()?;
                let entry = trim_line(&line);

                if self.config.validate_input {
                    if let Err(e) = codec::validate_field(field, entry) {
                        warn!("{}", e);
                        operator.send_str(&format!("{}\n", e))?;
                        continue;
                    }
                }

                self.record.set_field(field, entry);
                break;
            }
        }
        Ok(())
    }

    fn transmit<O, R>(&mut self, operator: &mut O, remote: &mut R) -> Result<State>
    where
        O: ByteChannel + ?Sized,
        R: ByteChannel + PowerControl + ?Sized,
    {
        remote.set_power_enable(true)?;
        thread::sleep(self.config.power_settle_delay);

        remote.send(&[DELIMITER])?;
        remote.send(self.packet.as_bytes())?;
        let hold_until = Instant::now() + self.config.power_hold_delay;

        let mut echoed = remote.drain()?;
        operator.send_str(MSG_MESSAGE_SENT)?;
        info!("Programming message sent");

        // Echo can keep arriving until power is dropped
        loop {
            let left = hold_until.saturating_duration_since(Instant::now());
            if left.is_zero() {
                break;
            }
            if remote.receive_byte(Some(left))?.is_some() {
                echoed += 1;
            }
        }
        echoed += remote.drain()?;
        if echoed > 0 {
            debug!("Discarded {} echoed bytes", echoed);
        }

        remote.set_power_enable(false)?;
        Ok(State::Initial)
    }

    fn receive<O, R>(&mut self, operator: &mut O, remote: &mut R) -> Result<State>
    where
        O: ByteChannel + ?Sized,
        R: ByteChannel + PowerControl + ?Sized,
    {
        remote.clear_input()?;
        remote.set_power_enable(true)?;
        self.packet = Packet::default();
        self.rx_index = 0;

        // Anything ahead of the delimiter is noise
        loop {
            match self.next_remote_byte(remote)? {
                Some(DELIMITER) => break,
                Some(_) => {}
                None => return self.abort_receive(operator, remote),
            }
        }

        while self.rx_index < PACKET_LENGTH {
            match self.next_remote_byte(remote)? {
                Some(b'\n') | Some(b'\r') => {}
                Some(byte) => {
                    self.packet.as_mut_bytes()[self.rx_index] = byte;
                    self.rx_index += 1;
                }
                None => return self.abort_receive(operator, remote),
            }
        }

        debug!("Received packet: {}", hex_dump(self.packet.as_bytes()));
        Ok(State::Report)
    }

    /// Next byte from the antenna, or `None` once the readout timeout fires
    fn next_remote_byte<R>(&mut self, remote: &mut R) -> Result<Option<u8>>
    where
        R: ByteChannel + ?Sized,
    {
        loop {
            if self.guard.poll_expired() {
                return Ok(None);
            }
            if let Some(byte) = remote.receive_byte(self.guard.remaining())? {
                return Ok(Some(byte));
            }
        }
    }

    fn abort_receive<O, R>(&mut self, operator: &mut O, remote: &mut R) -> Result<State>
    where
        O: ByteChannel + ?Sized,
        R: ByteChannel + PowerControl + ?Sized,
    {
        warn!("Readout timed out after {} of {} bytes", self.rx_index, PACKET_LENGTH);
        remote.set_power_enable(false)?;
        operator.send_str(MSG_NO_MESSAGE)?;
        Ok(State::Initial)
    }

    fn report<O, R>(&mut self, operator: &mut O, remote: &mut R) -> Result<State>
    where
        O: ByteChannel + ?Sized,
        R: ByteChannel + PowerControl + ?Sized,
    {
        remote.set_power_enable(false)?;
        self.guard.disarm();

        self.record = codec::decode(&self.packet);

        let mut text = String::from(MSG_READOUT_HEADER);
        for field in Field::ALL {
            text.push_str(&format!("{}: {}\n", field.label(), self.record.field_text(field)));
        }
        text.push_str(MSG_READOUT_COMPLETE);
        operator.send_str(&text)?;

        let readout = Readout::from_record(&self.record);
        info!("Readout complete: serial number {}", readout.serial_number);
        self.last_readout = Some(readout);
        Ok(State::Initial)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(StationConfig::default())
    }
}
