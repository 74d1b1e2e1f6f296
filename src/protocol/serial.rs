// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! RS-232 transport backed by the `serialport` crate.

use std::io::{self, Read, Write};
use std::time::{Duration, Instant};

use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};

use crate::error::TransportError;
use crate::protocol::Transport;
use crate::protocol::codec::REPLY_END;

/// Serial port settings.
///
/// LG sets talk 8N1 without flow control; only the port path, baud rate and
/// read timeout vary between installations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// Device path, e.g. `/dev/ttyUSB0` or `COM3`.
    pub path: String,
    /// Baud rate. LG sets default to 9600.
    pub baud_rate: u32,
    /// Upper bound for waiting on a reply.
    pub read_timeout: Duration,
}

impl SerialConfig {
    /// Default LG baud rate.
    pub const DEFAULT_BAUD_RATE: u32 = 9600;

    /// Default reply timeout.
    pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);

    /// Creates settings for the given port with default line parameters.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            baud_rate: Self::DEFAULT_BAUD_RATE,
            read_timeout: Self::DEFAULT_READ_TIMEOUT,
        }
    }
}

/// A serial port speaking the LG line discipline.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
}

impl SerialTransport {
    /// Opens the port described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Serial`] if the port cannot be opened.
    pub fn open(config: &SerialConfig) -> Result<Self, TransportError> {
        tracing::info!(
            path = %config.path,
            baud_rate = config.baud_rate,
            "Opening serial port"
        );

        let port = serialport::new(&config.path, config.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(config.read_timeout)
            .open()?;

        Ok(Self { port })
    }
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("port", &self.port.name())
            .finish()
    }
}

impl Transport for SerialTransport {
    fn write_frame(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        // Drop anything left over from an earlier exchange that timed out.
        self.port.clear(ClearBuffer::Input)?;
        self.port.write_all(frame)?;
        self.port.flush()?;
        tracing::trace!(frame = %String::from_utf8_lossy(frame).trim_end(), "Wrote frame");
        Ok(())
    }

    fn read_line(&mut self, timeout: Duration) -> Result<String, TransportError> {
        let deadline = Instant::now() + timeout;
        let mut line = Vec::with_capacity(16);
        let mut byte = [0u8; 1];

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(TransportError::timeout(timeout));
            }
            self.port.set_timeout(remaining)?;

            match self.port.read(&mut byte) {
                Ok(0) => {}
                Ok(_) => match byte[0] {
                    b'\r' | b'\n' if line.is_empty() => {}
                    b'\r' | b'\n' => break,
                    b => {
                        line.push(b);
                        if char::from(b) == REPLY_END {
                            break;
                        }
                    }
                },
                Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                    return Err(TransportError::timeout(timeout));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }

        let line = String::from_utf8(line).map_err(|_| TransportError::InvalidEncoding)?;
        tracing::trace!(line = %line, "Read reply");
        Ok(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_config_defaults() {
        let config = SerialConfig::new("/dev/ttyUSB0");
        assert_eq!(config.path, "/dev/ttyUSB0");
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.read_timeout, Duration::from_secs(1));
    }

    #[test]
    fn open_missing_port_fails() {
        let config = SerialConfig::new("/dev/lgtv-bridge-does-not-exist");
        assert!(matches!(
            SerialTransport::open(&config),
            Err(TransportError::Serial(_))
        ));
    }
}
