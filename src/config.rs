// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! TOML configuration for the bridge binary.
//!
//! Every field has a default, so an empty file is a valid configuration:
//!
//! ```toml
//! [serial]
//! port = "/dev/ttyUSB0"
//! baud_rate = 9600
//! read_timeout_ms = 1000
//!
//! [mqtt]
//! host = "mqtt-server"
//! port = 1883
//! base_topic = "gBridge/u2942/"
//! device_name = "lg-tv"
//! command_topics = ["power"]
//!
//! [poll]
//! interval_ms = 2000
//! offline_after = 3
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::device::TvDeviceBuilder;
use crate::error::ConfigError;
#[cfg(feature = "mqtt")]
use crate::protocol::BusClientBuilder;
#[cfg(feature = "serial")]
use crate::protocol::SerialConfig;

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    /// Serial link to the TV.
    pub serial: SerialSection,
    /// MQTT broker and topics.
    pub mqtt: MqttSection,
    /// Status polling.
    pub poll: PollSection,
}

/// `[serial]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SerialSection {
    /// Device path, e.g. `/dev/ttyUSB0` or `COM3`.
    pub port: String,
    pub baud_rate: u32,
    /// How long to wait for the TV to answer.
    pub read_timeout_ms: u64,
}

impl Default for SerialSection {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: 9600,
            read_timeout_ms: 1000,
        }
    }
}

/// `[mqtt]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MqttSection {
    pub host: String,
    pub port: u16,
    /// Topic prefix; a trailing `/` is ignored.
    pub base_topic: String,
    /// Device segment of every topic.
    pub device_name: String,
    /// Generated when absent.
    pub client_id: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Command topic suffixes to subscribe to.
    pub command_topics: Vec<String>,
    pub keep_alive_secs: u64,
    /// Pause between reconnection attempts.
    pub reconnect_delay_ms: u64,
}

impl Default for MqttSection {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            base_topic: String::new(),
            device_name: "lg-tv".to_string(),
            client_id: None,
            username: None,
            password: None,
            command_topics: vec!["power".to_string()],
            keep_alive_secs: 30,
            reconnect_delay_ms: 5000,
        }
    }
}

/// `[poll]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PollSection {
    pub interval_ms: u64,
    /// Consecutive failed polls before the TV is reported offline.
    pub offline_after: u32,
}

impl Default for PollSection {
    fn default() -> Self {
        Self {
            interval_ms: 2000,
            offline_after: 3,
        }
    }
}

impl BridgeConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for invalid TOML or unknown keys.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read, or
    /// [`ConfigError::Parse`] if it is not a valid configuration.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "Loaded configuration file");
        Self::from_toml_str(&text)
    }

    /// Returns the serial port settings.
    #[cfg(feature = "serial")]
    #[must_use]
    pub fn serial_config(&self) -> SerialConfig {
        SerialConfig {
            path: self.serial.port.clone(),
            baud_rate: self.serial.baud_rate,
            read_timeout: Duration::from_millis(self.serial.read_timeout_ms),
        }
    }

    /// Returns a device builder with the configured timing.
    #[must_use]
    pub fn device_builder(&self) -> TvDeviceBuilder {
        TvDeviceBuilder::new()
            .poll_interval(Duration::from_millis(self.poll.interval_ms))
            .read_timeout(Duration::from_millis(self.serial.read_timeout_ms))
            .offline_after(self.poll.offline_after)
    }

    /// Returns a bus client builder with the configured broker and topics.
    #[cfg(feature = "mqtt")]
    #[must_use]
    pub fn bus_builder(&self) -> BusClientBuilder {
        let mqtt = &self.mqtt;
        let mut builder = BusClientBuilder::new()
            .host(&mqtt.host)
            .port(mqtt.port)
            .base_topic(&mqtt.base_topic)
            .device_name(&mqtt.device_name)
            .command_topics(mqtt.command_topics.iter().cloned())
            .keep_alive(Duration::from_secs(mqtt.keep_alive_secs))
            .reconnect_delay(Duration::from_millis(mqtt.reconnect_delay_ms));

        if let Some(id) = &mqtt.client_id {
            builder = builder.client_id(id);
        }
        if let (Some(username), Some(password)) = (&mqtt.username, &mqtt.password) {
            builder = builder.credentials(username, password);
        }
        builder
    }
}
