// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wire-level plumbing: the LG frame codec, the serial link, and the MQTT
//! bus client.
//!
//! # Serial side
//!
//! - [`codec`]: pure encode/decode of LG frames
//! - [`Transport`]: the byte channel to the TV, implemented by
//!   [`SerialTransport`] for real hardware
//! - [`Link`]: a transport plus its read timeout, exposing one request and
//!   its reply as a single unit of work
//!
//! # Bus side
//!
//! - [`BusClient`]: MQTT connection using the
//!   `<base>/<cmnd|stat>/<device>/<suffix>` topic layout

pub mod codec;
mod link;
#[cfg(feature = "mqtt")]
mod mqtt;
#[cfg(feature = "serial")]
mod serial;
mod topic;

pub use link::Link;
#[cfg(feature = "mqtt")]
pub use mqtt::{BusClient, BusClientBuilder, InboundMessage};
#[cfg(feature = "serial")]
pub use serial::{SerialConfig, SerialTransport};
pub use topic::{TopicKind, TopicScheme};

use std::time::Duration;

use crate::error::TransportError;

/// A half-duplex byte channel to the TV.
///
/// Implementations are blocking; the device runs them on tokio's blocking
/// pool.
pub trait Transport: Send + 'static {
    /// Writes a complete frame.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the frame cannot be written.
    fn write_frame(&mut self, frame: &[u8]) -> Result<(), TransportError>;

    /// Reads one reply line, waiting at most `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Timeout`] if no complete line arrives in
    /// time, or another `TransportError` if the read fails.
    fn read_line(&mut self, timeout: Duration) -> Result<String, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write_frame(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        (**self).write_frame(frame)
    }

    fn read_line(&mut self, timeout: Duration) -> Result<String, TransportError> {
        (**self).read_line(timeout)
    }
}
