// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wiring between a [`TvDevice`] and the MQTT bus.
//!
//! Confirmed state changes go out on the status topics; messages on the
//! command topics are handed to [`TvDevice::execute`].

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::TvDevice;
use crate::protocol::{BusClient, InboundMessage, Transport};
use crate::state::StateChange;
use crate::subscription::{Subscribable, SubscriptionId};
use crate::types::Availability;

/// Connects one TV to one bus client.
///
/// Dropping the bridge stops publishing state changes.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
///
/// use lgtv_bridge::TvDevice;
/// use lgtv_bridge::bridge::Bridge;
/// use lgtv_bridge::protocol::{BusClient, SerialConfig};
///
/// # async fn example() -> lgtv_bridge::Result<()> {
/// let device = Arc::new(TvDevice::builder().open_serial(&SerialConfig::new("/dev/ttyUSB0"))?);
/// let (bus, inbound) = BusClient::builder()
///     .base_topic("gBridge/u2942")
///     .device_name("lg-tv")
///     .build()?;
///
/// Bridge::new(device, bus).run(inbound).await;
/// # Ok(())
/// # }
/// ```
pub struct Bridge<T: Transport> {
    device: Arc<TvDevice<T>>,
    bus: BusClient,
    subscription: SubscriptionId,
}

impl<T: Transport> Bridge<T> {
    /// Subscribes to the device's state changes and publishes the current
    /// availability.
    pub fn new(device: Arc<TvDevice<T>>, bus: BusClient) -> Self {
        let publisher = bus.clone();
        let subscription = device.on_state_changed(move |change| publish_change(&publisher, change));

        // The poller may have settled before this subscription existed.
        if let Err(e) = bus.try_publish_availability(device.availability()) {
            tracing::warn!(error = %e, "Failed to publish availability");
        }

        Self {
            device,
            bus,
            subscription,
        }
    }

    /// Returns the bridged device.
    #[must_use]
    pub fn device(&self) -> &Arc<TvDevice<T>> {
        &self.device
    }

    /// Returns the bus client.
    #[must_use]
    pub fn bus(&self) -> &BusClient {
        &self.bus
    }

    /// Forwards inbound messages to the device until the channel closes.
    ///
    /// Every message is executed in its own task, so a slow serial exchange
    /// does not hold up the next message. Failures are logged.
    pub async fn run(&self, mut inbound: mpsc::Receiver<InboundMessage>) {
        tracing::info!(
            base = %self.bus.topics().base(),
            device = %self.bus.topics().device(),
            "Bridge running"
        );
        while let Some(message) = inbound.recv().await {
            self.dispatch(message);
        }
        tracing::info!("Inbound channel closed, bridge stopping");
    }

    /// Marks the TV `Offline` on the broker and disconnects.
    ///
    /// A clean disconnect does not fire the last will, so the retained
    /// availability is replaced explicitly.
    ///
    /// # Errors
    ///
    /// Returns [`BusError`](crate::error::BusError) if the requests cannot
    /// be queued.
    pub async fn shutdown(&self) -> Result<(), crate::error::BusError> {
        self.device.unsubscribe(self.subscription);
        self.bus.try_publish_availability(Availability::Offline)?;
        self.bus.disconnect().await
    }

    /// Starts executing one inbound message.
    ///
    /// Returns `None` if the topic is not a command topic of this device.
    pub fn dispatch(&self, message: InboundMessage) -> Option<JoinHandle<()>> {
        let Some(command) = self.bus.topics().command_suffix(&message.topic) else {
            tracing::debug!(topic = %message.topic, "Ignoring message on foreign topic");
            return None;
        };
        let command = command.to_string();
        let device = Arc::clone(&self.device);

        Some(tokio::spawn(async move {
            let value = message.payload.trim();
            match device.execute(&command, value).await {
                Ok(()) => tracing::debug!(%command, %value, "Command executed"),
                Err(e) => tracing::warn!(%command, %value, error = %e, "Command failed"),
            }
        }))
    }
}

impl<T: Transport> Drop for Bridge<T> {
    fn drop(&mut self) {
        self.device.unsubscribe(self.subscription);
    }
}

impl<T: Transport> std::fmt::Debug for Bridge<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("device", &self.device)
            .field("topics", self.bus.topics())
            .finish_non_exhaustive()
    }
}

fn publish_change(bus: &BusClient, change: &StateChange) {
    let result = match *change {
        StateChange::Availability(availability) => bus.try_publish_availability(availability),
        StateChange::Power(_) => bus.try_publish(change.topic_suffix(), change.payload(), false),
    };
    if let Err(e) = result {
        tracing::warn!(?change, error = %e, "Failed to publish state change");
    }
}
