//! Station configuration.

use crate::constants::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunable link and timing parameters.
///
/// `Default` reproduces the built-in constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationConfig {
    /// Operator link baud rate
    pub operator_baud_rate: u32,
    /// Remote link baud rate
    pub remote_baud_rate: u32,
    /// Wait after asserting power enable before talking to the antenna
    pub power_settle_delay: Duration,
    /// Wait after a programming message before power enable is dropped
    pub power_hold_delay: Duration,
    /// Readout timeout; `None` waits forever
    pub readout_timeout: Option<Duration>,
    /// Re-prompt fields that are not exact-width uppercase hex
    pub validate_input: bool,
}

impl Default for StationConfig {
    fn default() -> Self {
        StationConfig {
            operator_baud_rate: OPERATOR_BAUD_RATE,
            remote_baud_rate: REMOTE_BAUD_RATE,
            power_settle_delay: Duration::from_millis(POWER_SETTLE_DELAY_MS),
            power_hold_delay: Duration::from_millis(POWER_HOLD_DELAY_MS),
            readout_timeout: Some(Duration::from_millis(READOUT_TIMEOUT_MS)),
            validate_input: false,
        }
    }
}

impl StationConfig {
    /// Set the operator link baud rate
    pub fn operator_baud_rate(mut self, baud_rate: u32) -> Self {
        self.operator_baud_rate = baud_rate;
        self
    }

    /// Set the remote link baud rate
    pub fn remote_baud_rate(mut self, baud_rate: u32) -> Self {
        self.remote_baud_rate = baud_rate;
        self
    }

    /// Set the boot wait after power on
    pub fn power_settle_delay(mut self, delay: Duration) -> Self {
        self.power_settle_delay = delay;
        self
    }

    /// Set how long power stays on after a programming message
    pub fn power_hold_delay(mut self, delay: Duration) -> Self {
        self.power_hold_delay = delay;
        self
    }

    /// Set the readout timeout, `None` to wait forever
    pub fn readout_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.readout_timeout = timeout;
        self
    }

    /// Enable field validation with re-prompting
    pub fn validate_input(mut self, enabled: bool) -> Self {
        self.validate_input = enabled;
        self
    }
}
