use crate::channel::{self, ByteChannel, ConsoleChannel, PowerControl, SerialChannel};
use crate::config::StationConfig;
use crate::error::Result;
use crate::session::Session;
use crate::types::{Readout, State};
use log::info;

/// Main station interface: an operator link, an antenna link and the
/// session driving them
pub struct Station<O, R> {
    operator: O,
    remote: R,
    session: Session,
}

impl Station<SerialChannel, SerialChannel> {
    /// Open both serial links
    pub fn open(operator_port: &str, remote_port: &str, config: StationConfig) -> Result<Self> {
        let operator = SerialChannel::open_operator(operator_port, &config)?;
        let remote = SerialChannel::open_remote(remote_port, &config)?;
        info!("Station on {} (operator) and {} (antenna)", operator_port, remote_port);
        Ok(Station::new(operator, remote, config))
    }

    /// List available serial ports
    pub fn list_ports() -> Result<Vec<serialport::SerialPortInfo>> {
        channel::list_ports()
    }
}

impl Station<ConsoleChannel, SerialChannel> {
    /// Use the terminal as the operator link
    pub fn with_console(remote_port: &str, config: StationConfig) -> Result<Self> {
        let remote = SerialChannel::open_remote(remote_port, &config)?;
        info!("Station on console (operator) and {} (antenna)", remote_port);
        Ok(Station::new(ConsoleChannel::new(), remote, config))
    }
}

impl<O, R> Station<O, R>
where
    O: ByteChannel,
    R: ByteChannel + PowerControl,
{
    /// Build a station over existing channels
    pub fn new(operator: O, remote: R, config: StationConfig) -> Self {
        Station {
            operator,
            remote,
            session: Session::new(config),
        }
    }

    /// Run one state machine iteration
    pub fn step(&mut self) -> Result<State> {
        self.session.step(&mut self.operator, &mut self.remote)
    }

    /// Run one full transaction, from the command prompt back to it
    pub fn transaction(&mut self) -> Result<Option<&Readout>> {
        self.session
            .run_transaction(&mut self.operator, &mut self.remote)?;
        Ok(self.session.last_readout())
    }

    /// Serve the operator until a link fails or the operator input ends
    pub fn run(&mut self) -> Result<()> {
        loop {
            self.step()?;
        }
    }

    /// Session state and last readout
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Give back the channels and the session
    pub fn into_parts(self) -> (O, R, Session) {
        (self.operator, self.remote, self.session)
    }
}
