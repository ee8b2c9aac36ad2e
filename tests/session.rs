//! End-to-end tests driving the session with scripted channels.

use antenna_station::codec;
use antenna_station::{
    ByteChannel, PowerControl, Record, Result, Session, State, Station, StationConfig,
    StationError,
};
use std::collections::VecDeque;
use std::io;
use std::thread;
use std::time::{Duration, Instant};

const SAMPLE: &[u8] = b"ABCDEF012345ABCDEF12341234567890ABCDEF";
const PROGRAM_SCRIPT: &[u8] = b"P\nABCD\nEF01\n2345\nABCDEF\n1234\n1234567890ABCDEF\n";

// --- Mock channel shared by the operator and the antenna side ---
struct MockChannel {
    rx: VecDeque<u8>,
    tx: Vec<u8>,
    power: Vec<bool>,
    // Released into `rx` when power goes on, like an antenna answering after boot
    reply: Vec<u8>,
    // Bytes written come back after this delay
    echo_after: Option<Duration>,
    in_flight: VecDeque<(Instant, u8)>,
    fail_sends: bool,
}

impl MockChannel {
    fn new(input: &[u8]) -> Self {
        Self {
            rx: input.iter().copied().collect(),
            tx: Vec::new(),
            power: Vec::new(),
            reply: Vec::new(),
            echo_after: None,
            in_flight: VecDeque::new(),
            fail_sends: false,
        }
    }

    fn antenna(reply: &[u8]) -> Self {
        Self {
            reply: reply.to_vec(),
            ..Self::new(&[])
        }
    }

    fn echoing(delay: Duration) -> Self {
        Self {
            echo_after: Some(delay),
            ..Self::new(&[])
        }
    }

    fn output(&self) -> String {
        String::from_utf8_lossy(&self.tx).to_string()
    }

    fn deliver(&mut self) {
        let now = Instant::now();
        while let Some(&(at, byte)) = self.in_flight.front() {
            if at > now {
                break;
            }
            self.rx.push_back(byte);
            self.in_flight.pop_front();
        }
    }
}

impl ByteChannel for MockChannel {
    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        if self.fail_sends {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "link down").into());
        }
        self.tx.extend_from_slice(bytes);
        if let Some(delay) = self.echo_after {
            let at = Instant::now() + delay;
            self.in_flight.extend(bytes.iter().map(|&b| (at, b)));
        }
        Ok(())
    }

    fn receive_byte(&mut self, timeout: Option<Duration>) -> Result<Option<u8>> {
        self.deliver();
        if let Some(byte) = self.rx.pop_front() {
            return Ok(Some(byte));
        }
        match timeout {
            Some(wait) => {
                thread::sleep(wait.min(Duration::from_millis(2)));
                Ok(None)
            }
            None if !self.in_flight.is_empty() => {
                thread::sleep(Duration::from_millis(2));
                Ok(None)
            }
            // Nothing left to script: a blocking read would hang forever
            None => Err(StationError::ChannelClosed),
        }
    }

    fn bytes_available(&mut self) -> Result<bool> {
        self.deliver();
        Ok(!self.rx.is_empty())
    }
}

impl PowerControl for MockChannel {
    fn set_power_enable(&mut self, enabled: bool) -> Result<()> {
        if enabled && self.power.last() != Some(&true) {
            self.rx.extend(self.reply.drain(..));
        }
        self.power.push(enabled);
        Ok(())
    }
}

fn test_config() -> StationConfig {
    StationConfig::default()
        .power_settle_delay(Duration::ZERO)
        .power_hold_delay(Duration::ZERO)
        .readout_timeout(Some(Duration::from_millis(50)))
}

fn framed(payload: &[u8]) -> Vec<u8> {
    let mut bytes = vec![b'\r'];
    bytes.extend_from_slice(payload);
    bytes
}

fn sample_packet() -> Vec<u8> {
    codec::encode(&Record::from_ascii(SAMPLE)).as_bytes().to_vec()
}

#[test]
fn test_program_sends_framed_packet() {
    let mut operator = MockChannel::new(PROGRAM_SCRIPT);
    let mut remote = MockChannel::new(&[]);
    let mut session = Session::new(test_config());

    assert_eq!(session.state(), State::Initial);
    assert_eq!(session.step(&mut operator, &mut remote).unwrap(), State::Transmit);
    assert_eq!(session.step(&mut operator, &mut remote).unwrap(), State::Initial);

    assert_eq!(remote.tx, framed(&sample_packet()));
    assert_eq!(remote.power, vec![false, true, false]);

    let output = operator.output();
    assert!(output.starts_with("Program or Readout? (P/R): Entering Programming Mode: \n"));
    assert!(output.contains("\nEnter Group Delay G1: "));
    assert!(output.contains("\nEnter Miscellaneous Data: "));
    assert!(output.ends_with("Programming Message Sent\n"));
}

#[test]
fn test_program_discards_antenna_echo() {
    let mut operator = MockChannel::new(PROGRAM_SCRIPT);
    let mut remote = MockChannel::new(&framed(&sample_packet()));
    let mut session = Session::new(test_config());

    session.run_transaction(&mut operator, &mut remote).unwrap();

    assert!(remote.rx.is_empty());
    assert_eq!(remote.tx.len(), 20);
    assert_eq!(session.state(), State::Initial);
}

#[test]
fn test_program_coerces_malformed_fields() {
    let mut operator = MockChannel::new(b"P\nA\nzz\n12345\n\n1234\n1234567890ABCDEF\n");
    let mut remote = MockChannel::new(&[]);
    let mut session = Session::new(test_config());

    session.run_transaction(&mut operator, &mut remote).unwrap();

    let packet = &remote.tx[1..];
    assert_eq!(packet.len(), 19);
    // "A" pads to A000, "zz" to zero, "12345" is cut to 1234
    assert_eq!(&packet[..6], &[0xA0, 0x00, 0x00, 0x00, 0x12, 0x34]);
    assert_eq!(&packet[6..9], &[0x00, 0x00, 0x00]);
    assert_eq!(packet[9], 0x12);
}

#[test]
fn test_program_with_validation_reprompts() {
    let mut operator =
        MockChannel::new(b"P\nAB\nabcd\nABCD\nEF01\n2345\nABCDEF\n1234\n1234567890ABCDEF\n");
    let mut remote = MockChannel::new(&[]);
    let mut session = Session::new(test_config().validate_input(true));

    session.run_transaction(&mut operator, &mut remote).unwrap();

    assert_eq!(remote.tx, framed(&sample_packet()));
    let output = operator.output();
    assert_eq!(output.matches("\nEnter Group Delay G1: ").count(), 3);
    assert_eq!(output.matches("Invalid G1").count(), 2);
}

#[test]
fn test_readout_reports_fields() {
    let mut operator = MockChannel::new(b"R\n");
    let mut remote = MockChannel::antenna(&framed(&sample_packet()));
    let mut session = Session::new(test_config());

    assert_eq!(session.step(&mut operator, &mut remote).unwrap(), State::Receive);
    assert!(session.guard().is_armed());
    assert_eq!(session.step(&mut operator, &mut remote).unwrap(), State::Report);
    assert_eq!(session.step(&mut operator, &mut remote).unwrap(), State::Initial);
    assert!(!session.guard().is_armed());

    let output = operator.output();
    assert!(output.contains("Entering Readout Mode: \n"));
    assert!(output.ends_with(
        "Data Readout:\n\
         G1: ABCD\n\
         G2: EF01\n\
         E5: 2345\n\
         Serial Number: ABCDEF\n\
         Manufacturer Code: 1234\n\
         Miscellaneous Data: 1234567890ABCDEF\n\
         Data Readout Complete\n"
    ));
    assert_eq!(remote.power, vec![false, true, false]);

    let readout = session.last_readout().unwrap();
    assert_eq!(readout.serial_number, "ABCDEF");
    assert_eq!(readout.misc_data, "1234567890ABCDEF");
}

#[test]
fn test_readout_skips_noise_and_line_breaks() {
    let payload = sample_packet();
    let mut wire = vec![0x55, 0xAA, b'\n', b'\r'];
    for (i, byte) in payload.iter().enumerate() {
        if i % 5 == 0 {
            wire.push(b'\n');
        }
        wire.push(*byte);
        if i == 10 {
            wire.push(b'\r');
        }
    }

    let mut operator = MockChannel::new(b"R\n");
    let mut remote = MockChannel::antenna(&wire);
    let mut session = Session::new(test_config());

    session.run_transaction(&mut operator, &mut remote).unwrap();

    assert_eq!(session.packet().as_bytes().to_vec(), payload);
    assert_eq!(session.last_readout().unwrap().g1, "ABCD");
    assert!(remote.rx.is_empty());
}

#[test]
fn test_readout_arbitrary_bytes() {
    let payload: Vec<u8> = (0..19u8).map(|i| i.wrapping_mul(37).wrapping_add(0x11)).collect();
    assert!(!payload.contains(&b'\n') && !payload.contains(&b'\r'));

    let mut operator = MockChannel::new(b"R\n");
    let mut remote = MockChannel::antenna(&framed(&payload));
    let mut session = Session::new(test_config());

    session.run_transaction(&mut operator, &mut remote).unwrap();

    let expected = payload
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<String>();
    let readout = session.last_readout().unwrap();
    assert_eq!(readout.g1, expected[0..4]);
    assert_eq!(readout.manufacturer_code, expected[18..22]);
    assert_eq!(readout.misc_data, expected[22..38]);
}

#[test]
fn test_readout_timeout_returns_to_initial() {
    let mut operator = MockChannel::new(b"R\n");
    let mut remote = MockChannel::new(&[]);
    let mut session = Session::new(test_config());

    assert_eq!(session.step(&mut operator, &mut remote).unwrap(), State::Receive);
    assert_eq!(session.step(&mut operator, &mut remote).unwrap(), State::Initial);

    let output = operator.output();
    assert!(output.ends_with("No message received.\n"));
    assert!(!output.contains("Data Readout"));
    assert!(session.last_readout().is_none());
    assert!(!session.guard().is_armed());
    assert_eq!(remote.power, vec![false, true, false]);
}

#[test]
fn test_readout_timeout_on_partial_packet() {
    let mut operator = MockChannel::new(b"R\n");
    let mut remote = MockChannel::antenna(&framed(&[0x12, 0x34, 0x56]));
    let mut session = Session::new(test_config());

    session.run_transaction(&mut operator, &mut remote).unwrap();

    assert!(operator.output().ends_with("No message received.\n"));
    assert!(session.last_readout().is_none());
}

#[test]
fn test_unbounded_readout_waits_for_antenna() {
    let mut operator = MockChannel::new(b"R\n");
    let mut remote = MockChannel::new(&[]);
    let mut session = Session::new(test_config().readout_timeout(None));

    session.step(&mut operator, &mut remote).unwrap();
    let err = session.step(&mut operator, &mut remote).unwrap_err();
    assert!(matches!(err, StationError::ChannelClosed));
    assert_eq!(session.state(), State::Receive);
    assert_eq!(remote.power.last(), Some(&false));
}

#[test]
fn test_invalid_command() {
    for script in [&b"X\n"[..], &b"p\n"[..], &b"\n"[..]] {
        let mut operator = MockChannel::new(script);
        let mut remote = MockChannel::new(&[]);
        let mut session = Session::new(test_config());

        assert_eq!(session.step(&mut operator, &mut remote).unwrap(), State::Initial);
        assert!(operator.output().ends_with("Invalid Input\n"));
        assert!(remote.tx.is_empty());
        assert_eq!(remote.power, vec![false]);
    }
}

#[test]
fn test_station_runs_until_operator_closes() {
    let mut script = b"X\nR\n".to_vec();
    script.extend_from_slice(PROGRAM_SCRIPT);

    let operator = MockChannel::new(&script);
    let remote = MockChannel::antenna(&framed(&sample_packet()));
    let mut station = Station::new(operator, remote, test_config());

    let err = station.run().unwrap_err();
    assert!(matches!(err, StationError::ChannelClosed));

    let (operator, remote, session) = station.into_parts();
    let output = operator.output();
    assert_eq!(output.matches("Program or Readout? (P/R): ").count(), 4);
    assert!(output.contains("Invalid Input\n"));
    assert!(output.contains("Data Readout Complete\n"));
    assert!(output.contains("Programming Message Sent\n"));
    assert_eq!(remote.tx, framed(&sample_packet()));
    assert_eq!(session.state(), State::Initial);
}

#[test]
fn test_station_transaction_returns_readout() {
    let operator = MockChannel::new(b"R\n");
    let remote = MockChannel::antenna(&framed(&sample_packet()));
    let mut station = Station::new(operator, remote, test_config());

    let readout = station.transaction().unwrap().cloned().unwrap();
    assert_eq!(readout.g2, "EF01");

    let json = serde_json::to_string(&readout).unwrap();
    assert!(json.contains("\"manufacturer_code\":\"1234\""));
}

#[test]
fn test_readout_ignores_stale_input() {
    // A complete frame already waiting before power on is left over from
    // an earlier exchange and must not be reported
    let mut operator = MockChannel::new(b"R\n");
    let mut remote = MockChannel::new(&framed(&sample_packet()));
    let mut session = Session::new(test_config());

    session.run_transaction(&mut operator, &mut remote).unwrap();

    assert!(operator.output().ends_with("No message received.\n"));
    assert!(session.last_readout().is_none());
}

#[test]
fn test_late_echo_is_not_read_back() {
    let mut script = PROGRAM_SCRIPT.to_vec();
    script.extend_from_slice(b"R\n");

    let mut operator = MockChannel::new(&script);
    let mut remote = MockChannel::echoing(Duration::from_millis(5));
    let mut session = Session::new(test_config().power_hold_delay(Duration::from_millis(30)));

    session.run_transaction(&mut operator, &mut remote).unwrap();
    assert!(operator.output().ends_with("Programming Message Sent\n"));
    assert!(remote.in_flight.is_empty());

    session.run_transaction(&mut operator, &mut remote).unwrap();
    assert!(operator.output().ends_with("No message received.\n"));
    assert!(session.last_readout().is_none());
}

#[test]
fn test_transmit_failure_drops_power() {
    let mut operator = MockChannel::new(PROGRAM_SCRIPT);
    let mut remote = MockChannel::new(&[]);
    remote.fail_sends = true;
    let mut session = Session::new(test_config());

    assert_eq!(session.step(&mut operator, &mut remote).unwrap(), State::Transmit);
    let err = session.step(&mut operator, &mut remote).unwrap_err();

    assert!(matches!(err, StationError::Io(_)));
    assert_eq!(remote.power, vec![false, true, false]);
    assert_eq!(session.state(), State::Transmit);
    assert!(!operator.output().contains("Programming Message Sent"));
}
