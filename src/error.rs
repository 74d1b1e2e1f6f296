// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the bridge.
//!
//! Failures are classified by where they happen so callers can tell an
//! expected no-op (a TV that did not answer a poll) from a real bug:
//! serial transport failures, protocol failures (bad replies, unknown
//! commands), value validation, configuration, and message bus errors.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// The serial link failed or timed out.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A reply or a command could not be interpreted.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// A value could not be resolved to a known state.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The message bus client failed.
    #[cfg(feature = "mqtt")]
    #[error("bus error: {0}")]
    Bus(#[from] BusError),

    /// A blocking link task panicked or was cancelled.
    #[error("link worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Errors raised by the serial transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Reading from or writing to the link failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The serial port could not be opened or configured.
    #[cfg(feature = "serial")]
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// No complete reply arrived in time.
    #[error("read timed out after {0} ms")]
    Timeout(u64),

    /// The reply was not valid UTF-8.
    #[error("reply is not valid UTF-8")]
    InvalidEncoding,
}

impl TransportError {
    /// Creates a [`TransportError::Timeout`] for the given wait.
    #[must_use]
    pub fn timeout(after: std::time::Duration) -> Self {
        Self::Timeout(u64::try_from(after.as_millis()).unwrap_or(u64::MAX))
    }

    /// Returns `true` if this is a read timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

/// Errors related to the LG serial protocol.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The command name does not map to a known command.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// The reply line could not be decoded.
    #[error("malformed reply: {0:?}")]
    MalformedReply(String),

    /// The TV answered with `NG`.
    #[error("command rejected by the device (opcode {opcode:?}, data {data:#04x})")]
    Rejected {
        /// Opcode the device answered for.
        opcode: char,
        /// Data byte carried by the rejection.
        data: u8,
    },

    /// The reply belongs to a different command than the one sent.
    #[error("unexpected reply for opcode {0:?}")]
    UnexpectedReply(char),
}

/// Errors related to value validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// The string is neither a state name nor a number.
    #[error("invalid power state: {0}")]
    InvalidPowerState(String),

    /// The number does not map to a power state.
    #[error("no power state has value {0}")]
    UnknownStateValue(u8),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A frame was encoded without a data value.
    #[error("no data value supplied for command {0:?}")]
    MissingData(char),

    /// A configuration value is out of its allowed range.
    #[error("invalid value for {field}: {message}")]
    InvalidValue {
        /// The offending field.
        field: String,
        /// Why the value was rejected.
        message: String,
    },

    /// The configuration file could not be read.
    #[error("cannot read {path}: {source}")]
    Read {
        /// Path of the configuration file.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for this schema.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Errors raised by the MQTT bus client.
#[cfg(feature = "mqtt")]
#[derive(Debug, Error)]
pub enum BusError {
    /// The MQTT client rejected a request.
    #[error("MQTT error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    /// A topic segment was empty or contained wildcards.
    #[error("invalid topic: {0}")]
    InvalidTopic(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_error_display() {
        let err = ValueError::InvalidPowerState("banana".to_string());
        assert_eq!(err.to_string(), "invalid power state: banana");
    }

    #[test]
    fn error_from_protocol_error() {
        let err: Error = ProtocolError::UnknownCommand("volume".to_string()).into();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::UnknownCommand(ref name)) if name == "volume"
        ));
    }

    #[test]
    fn transport_timeout_display() {
        let err = TransportError::Timeout(1000);
        assert_eq!(err.to_string(), "read timed out after 1000 ms");
    }

    #[test]
    fn rejected_display() {
        let err = ProtocolError::Rejected {
            opcode: 'a',
            data: 1,
        };
        assert_eq!(
            err.to_string(),
            "command rejected by the device (opcode 'a', data 0x01)"
        );
    }

    #[test]
    fn missing_data_display() {
        let err = ConfigError::MissingData('a');
        assert_eq!(err.to_string(), "no data value supplied for command 'a'");
    }
}
