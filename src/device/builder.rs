// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! TV device builder.

use std::sync::Arc;
use std::time::Duration;

use super::{Shared, TvDevice, poller};
use crate::error::{ConfigError, Error};
use crate::protocol::{Link, Transport};
#[cfg(feature = "serial")]
use crate::protocol::{SerialConfig, SerialTransport};

/// Builder for [`TvDevice`].
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
///
/// use lgtv_bridge::TvDevice;
/// use lgtv_bridge::protocol::SerialConfig;
///
/// # async fn example() -> lgtv_bridge::Result<()> {
/// let device = TvDevice::builder()
///     .poll_interval(Duration::from_secs(5))
///     .offline_after(2)
///     .open_serial(&SerialConfig::new("/dev/ttyUSB0"))?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TvDeviceBuilder {
    poll_interval: Duration,
    read_timeout: Duration,
    offline_after: u32,
    background_polling: bool,
}

impl TvDeviceBuilder {
    /// Default time between two status polls.
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

    /// Default time to wait for a reply.
    pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);

    /// Default number of consecutive failed polls before going offline.
    pub const DEFAULT_OFFLINE_AFTER: u32 = 3;

    /// Creates a builder with default timing.
    #[must_use]
    pub fn new() -> Self {
        Self {
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            read_timeout: Self::DEFAULT_READ_TIMEOUT,
            offline_after: Self::DEFAULT_OFFLINE_AFTER,
            background_polling: true,
        }
    }

    /// Sets the time between two status polls.
    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets how long a poll or command waits for the TV to answer.
    #[must_use]
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Sets how many polls in a row must fail before the TV is reported
    /// offline.
    #[must_use]
    pub fn offline_after(mut self, polls: u32) -> Self {
        self.offline_after = polls;
        self
    }

    /// Does not start the background poller.
    ///
    /// The caller is then responsible for calling
    /// [`TvDevice::refresh`] on its own schedule.
    #[must_use]
    pub fn without_background_polling(mut self) -> Self {
        self.background_polling = false;
        self
    }

    /// Builds the device on top of an already opened transport and starts
    /// polling.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if the poll interval or read
    /// timeout is zero.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime while background polling is
    /// enabled.
    pub fn build<T: Transport>(self, transport: T) -> Result<TvDevice<T>, Error> {
        self.validate()?;

        let link = Link::new(transport, self.read_timeout);
        let shared = Arc::new(Shared::new(link, self.offline_after));

        let poller = self
            .background_polling
            .then(|| poller::spawn(Arc::clone(&shared), self.poll_interval));

        Ok(TvDevice::new(shared, poller))
    }

    /// Opens a serial port and builds the device on it.
    ///
    /// The read timeout configured on the port replaces the builder's.
    ///
    /// # Errors
    ///
    /// Returns an error if the timing is invalid or the port cannot be
    /// opened.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime while background polling is
    /// enabled.
    #[cfg(feature = "serial")]
    pub fn open_serial(self, config: &SerialConfig) -> Result<TvDevice<SerialTransport>, Error> {
        let builder = self.read_timeout(config.read_timeout);
        builder.validate()?;
        let transport = SerialTransport::open(config)?;
        builder.build(transport)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("poll_interval", self.poll_interval),
            ("read_timeout", self.read_timeout),
        ] {
            if value.is_zero() {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: "must be greater than zero".to_string(),
                });
            }
        }
        Ok(())
    }
}

impl Default for TvDeviceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;

    struct Silent;

    impl Transport for Silent {
        fn write_frame(&mut self, _frame: &[u8]) -> Result<(), TransportError> {
            Ok(())
        }

        fn read_line(&mut self, timeout: Duration) -> Result<String, TransportError> {
            Err(TransportError::timeout(timeout))
        }
    }

    #[test]
    fn builder_defaults() {
        let builder = TvDeviceBuilder::new();
        assert_eq!(builder.poll_interval, Duration::from_secs(2));
        assert_eq!(builder.read_timeout, Duration::from_secs(1));
        assert_eq!(builder.offline_after, 3);
        assert!(builder.background_polling);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let result = TvDeviceBuilder::new()
            .poll_interval(Duration::ZERO)
            .without_background_polling()
            .build(Silent);
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::InvalidValue { ref field, .. })) if field == "poll_interval"
        ));
    }

    #[test]
    fn build_without_polling_needs_no_runtime() {
        let device = TvDeviceBuilder::new()
            .without_background_polling()
            .build(Silent)
            .unwrap();
        assert!(!device.is_polling());
    }

    #[tokio::test]
    async fn build_starts_poller() {
        let device = TvDeviceBuilder::new().build(Silent).unwrap();
        assert!(device.is_polling());
    }
}
