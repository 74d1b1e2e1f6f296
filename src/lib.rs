// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `lgtv_bridge` - Control an LG television over RS-232 from MQTT.
//!
//! The TV speaks a line-based serial protocol (`ka 01 1\r` to switch it on,
//! `a 01 OK01x` as the answer). This crate polls the TV's power state,
//! publishes confirmed changes to an MQTT broker, and executes commands
//! received from the broker.
//!
//! # Layers
//!
//! - [`protocol::codec`]: encode request frames and decode replies
//! - [`TvDevice`]: serial link, power state, background poller and
//!   observers
//! - [`protocol::BusClient`]: MQTT connection with the
//!   `<base>/<cmnd|stat>/<device>/<suffix>` topic layout
//! - [`bridge::Bridge`]: connects the two
//!
//! # Fire-and-poll
//!
//! Commands are not confirmed by their own reply. A command only reaches
//! observers (and the broker) once a later status poll sees the TV in the
//! new state.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use lgtv_bridge::TvDevice;
//! use lgtv_bridge::bridge::Bridge;
//! use lgtv_bridge::protocol::{BusClient, SerialConfig};
//!
//! #[tokio::main]
//! async fn main() -> lgtv_bridge::Result<()> {
//!     let device = TvDevice::builder().open_serial(&SerialConfig::new("/dev/ttyUSB0"))?;
//!     let (bus, inbound) = BusClient::builder()
//!         .host("mqtt-server")
//!         .base_topic("gBridge/u2942/")
//!         .device_name("lg-tv")
//!         .build()?;
//!
//!     Bridge::new(Arc::new(device), bus).run(inbound).await;
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `serial` (default): [`protocol::SerialTransport`] on top of `serialport`
//! - `mqtt` (default): the bus client and [`bridge`]

#[cfg(feature = "mqtt")]
pub mod bridge;
pub mod command;
pub mod config;
mod device;
pub mod error;
pub mod protocol;
pub mod state;
pub mod subscription;
pub mod types;

pub use command::Command;
pub use config::BridgeConfig;
pub use device::{TvDevice, TvDeviceBuilder};
pub use error::{ConfigError, Error, ProtocolError, Result, TransportError, ValueError};
pub use state::{DeviceState, StateChange};
pub use subscription::{CallbackRegistry, Subscribable, SubscriptionId};
pub use types::{Availability, PowerState};
