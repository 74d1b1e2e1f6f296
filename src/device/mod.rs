// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The TV adapter.
//!
//! [`TvDevice`] owns the serial link, the last known state, the observer
//! registry and the background poller.
//!
//! # Fire-and-poll
//!
//! Commands are sent without waiting for the TV to confirm them. The
//! poller queries the power state every couple of seconds, and only a poll
//! that observes a new state updates [`DeviceState`] and notifies
//! observers. Turning the TV on therefore shows up as an `ON` notification
//! on the first poll after the TV finished switching.
//!
//! # Link discipline
//!
//! The RS-232 link is half-duplex: every request must be followed by
//! reading its reply before the next request goes out. Polls and commands
//! hold the link lock for the whole write-then-read exchange, and run it on
//! tokio's blocking pool. A poll applies its reply before releasing the
//! link, then notifies observers once the lock is released. Observers run
//! on the blocking pool thread of the poll that produced the change; they
//! may spawn further commands but should not block.

mod builder;
mod poller;

pub use builder::TvDeviceBuilder;

use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::command::Command;
use crate::error::{Error, ProtocolError};
use crate::protocol::codec::{self, Reply, ReplyStatus};
use crate::protocol::{Link, Transport};
use crate::state::{DeviceState, StateChange};
use crate::subscription::{CallbackRegistry, Subscribable, SubscriptionId};
use crate::types::{Availability, PowerState};

/// An LG TV reachable over a serial link.
///
/// Created with [`TvDevice::builder`]. Dropping the device stops its
/// poller.
///
/// # Examples
///
/// ```no_run
/// use lgtv_bridge::TvDevice;
/// use lgtv_bridge::protocol::SerialConfig;
/// use lgtv_bridge::subscription::Subscribable;
///
/// # async fn example() -> lgtv_bridge::Result<()> {
/// let device = TvDevice::builder().open_serial(&SerialConfig::new("/dev/ttyUSB0"))?;
///
/// device.on_power_changed(|state| println!("TV is now {state}"));
///
/// // Returns once the command is on the wire; the notification above
/// // fires when a later poll sees the TV on.
/// device.execute("power", "on").await?;
/// # Ok(())
/// # }
/// ```
pub struct TvDevice<T: Transport> {
    shared: Arc<Shared<T>>,
    poller: Option<JoinHandle<()>>,
}

impl TvDevice<Box<dyn Transport>> {
    /// Returns a builder with default timing.
    #[must_use]
    pub fn builder() -> TvDeviceBuilder {
        TvDeviceBuilder::new()
    }
}

impl<T: Transport> TvDevice<T> {
    pub(crate) fn new(shared: Arc<Shared<T>>, poller: Option<JoinHandle<()>>) -> Self {
        Self { shared, poller }
    }

    /// Executes a textual command, as received from the message bus.
    ///
    /// `command_name` is matched case-insensitively against the known
    /// commands (`"power"`). `state_value` is a state name (`"on"`, `"OFF"`,
    /// `"status"`) or its decimal value (`"1"`, `"0"`, `"255"`).
    ///
    /// Setting a state is fire-and-poll: this returns once the frame was
    /// written and its acknowledgement drained, without interpreting it.
    /// The state change is confirmed, and observers notified, by the next
    /// poll. Requesting `status` runs a poll immediately instead.
    ///
    /// # Errors
    ///
    /// - [`Error::Protocol`] for an unknown command name
    /// - [`Error::Value`] for an unknown state name or value
    /// - [`Error::Transport`] if the link fails
    ///
    /// Name resolution failures never touch the link.
    pub async fn execute(&self, command_name: &str, state_value: &str) -> Result<(), Error> {
        let command: Command = command_name.parse()?;
        let state: PowerState = state_value.parse()?;

        match command {
            Command::Power => self.set_power(state).await,
        }
    }

    /// Sends a power command, or polls immediately for `PowerState::Status`.
    ///
    /// # Errors
    ///
    /// Returns an error if the link fails.
    pub async fn set_power(&self, state: PowerState) -> Result<(), Error> {
        if state.is_query() {
            return self.shared.refresh().await.map(|_| ());
        }
        self.shared.send(Command::Power, state).await
    }

    /// Switches the TV on (fire-and-poll).
    ///
    /// # Errors
    ///
    /// Returns an error if the link fails.
    pub async fn power_on(&self) -> Result<(), Error> {
        self.set_power(PowerState::On).await
    }

    /// Switches the TV off (fire-and-poll).
    ///
    /// # Errors
    ///
    /// Returns an error if the link fails.
    pub async fn power_off(&self) -> Result<(), Error> {
        self.set_power(PowerState::Off).await
    }

    /// Runs one poll: queries the power state, applies the answer, and
    /// notifies observers of any change.
    ///
    /// The background poller calls this on every tick.
    ///
    /// # Errors
    ///
    /// Returns the reason the poll produced no state. The stored state is
    /// left untouched in that case.
    pub async fn refresh(&self) -> Result<PowerState, Error> {
        self.shared.refresh().await
    }

    /// Returns the last confirmed power state.
    #[must_use]
    pub fn power_state(&self) -> PowerState {
        self.shared.state.lock().power()
    }

    /// Returns whether the TV answered recent polls.
    #[must_use]
    pub fn availability(&self) -> Availability {
        self.shared.state.lock().availability()
    }

    /// Returns a copy of the full device state.
    #[must_use]
    pub fn state(&self) -> DeviceState {
        self.shared.state.lock().clone()
    }

    /// Returns `true` while the background poller is running.
    #[must_use]
    pub fn is_polling(&self) -> bool {
        self.poller.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}

impl<T: Transport> Subscribable for TvDevice<T> {
    fn on_power_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(PowerState) + Send + Sync + 'static,
    {
        self.shared.callbacks.on_power_changed(callback)
    }

    fn on_availability_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(Availability) + Send + Sync + 'static,
    {
        self.shared.callbacks.on_availability_changed(callback)
    }

    fn on_state_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&StateChange) + Send + Sync + 'static,
    {
        self.shared.callbacks.on_state_changed(callback)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.callbacks.unsubscribe(id)
    }
}

impl<T: Transport> Drop for TvDevice<T> {
    fn drop(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.abort();
        }
    }
}

impl<T: Transport> std::fmt::Debug for TvDevice<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TvDevice")
            .field("state", &*self.shared.state.lock())
            .field("callbacks", &self.shared.callbacks)
            .field("polling", &self.is_polling())
            .finish_non_exhaustive()
    }
}

/// State shared between the device handle and its poller.
pub(crate) struct Shared<T> {
    link: Mutex<Link<T>>,
    state: Mutex<DeviceState>,
    callbacks: CallbackRegistry,
    /// Taken before the link is released, so observers see changes in
    /// the order the replies were read.
    notify: Mutex<()>,
    offline_after: u32,
}

impl<T: Transport> Shared<T> {
    pub(crate) fn new(link: Link<T>, offline_after: u32) -> Self {
        Self {
            link: Mutex::new(link),
            state: Mutex::new(DeviceState::new()),
            callbacks: CallbackRegistry::new(),
            notify: Mutex::new(()),
            offline_after,
        }
    }

    async fn send(self: &Arc<Self>, command: Command, state: PowerState) -> Result<(), Error> {
        let frame = command.frame(state);
        tracing::info!(%command, %state, "Sending command");

        let shared = Arc::clone(self);
        let ack = tokio::task::spawn_blocking(move || shared.link.lock().send(&frame)).await??;
        match ack.as_deref().map(codec::decode_reply) {
            Some(Some(reply)) => tracing::debug!(?reply, "Command answered"),
            Some(None) => tracing::debug!(line = ?ack, "Command answered with unreadable reply"),
            None => tracing::debug!("Command not answered"),
        }
        Ok(())
    }

    pub(crate) async fn refresh(self: &Arc<Self>) -> Result<PowerState, Error> {
        let shared = Arc::clone(self);
        tokio::task::spawn_blocking(move || shared.poll()).await?
    }

    /// Runs one poll on the calling thread.
    ///
    /// The reply is applied to the state while the link is still held, so
    /// the stored state always reflects the last reply read from the wire.
    fn poll(&self) -> Result<PowerState, Error> {
        let frame = Command::Power.frame(PowerState::Status);

        let mut link = self.link.lock();
        let (observed, changes) = match link.query(&frame) {
            Ok(line) => self.apply_reply(&line),
            Err(e) => (Err(e.into()), self.record_failure()),
        };
        let _order = self.notify.lock();
        drop(link);

        for change in &changes {
            tracing::info!(change = ?change, "State changed");
            self.callbacks.dispatch(change);
        }
        observed
    }

    fn apply_reply(&self, line: &str) -> (Result<PowerState, Error>, Vec<StateChange>) {
        let Some(reply) = codec::decode_reply(line) else {
            let error = ProtocolError::MalformedReply(line.to_string()).into();
            return (Err(error), self.record_failure());
        };

        let observed = power_from_reply(&reply);
        let mut state = self.state.lock();
        let mut changes: Vec<StateChange> = state.record_success(Utc::now()).into_iter().collect();
        if let Ok(power) = &observed {
            changes.extend(state.apply_power(*power));
        }
        (observed.map_err(Error::from), changes)
    }

    fn record_failure(&self) -> Vec<StateChange> {
        self.state
            .lock()
            .record_failure(self.offline_after)
            .into_iter()
            .collect()
    }
}

/// Extracts the power state from a reply to a power query.
fn power_from_reply(reply: &Reply) -> Result<PowerState, ProtocolError> {
    if reply.command() != Some(Command::Power) {
        return Err(ProtocolError::UnexpectedReply(reply.opcode));
    }
    match reply.status {
        ReplyStatus::Acknowledged => Ok(PowerState::from_reply_data(reply.data)),
        ReplyStatus::Rejected => Err(ProtocolError::Rejected {
            opcode: reply.opcode,
            data: reply.data,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(line: &str) -> Reply {
        codec::decode_reply(line).unwrap()
    }

    #[test]
    fn power_from_acknowledged_reply() {
        assert_eq!(power_from_reply(&reply("a 01 OK01x")), Ok(PowerState::On));
        assert_eq!(power_from_reply(&reply("a 01 00x")), Ok(PowerState::Off));
        assert_eq!(power_from_reply(&reply("a 01 OK05x")), Ok(PowerState::On));
    }

    #[test]
    fn power_from_rejected_reply() {
        assert_eq!(
            power_from_reply(&reply("a 01 NG01x")),
            Err(ProtocolError::Rejected {
                opcode: 'a',
                data: 1
            })
        );
    }

    #[test]
    fn power_from_foreign_reply() {
        assert_eq!(
            power_from_reply(&reply("f 01 OK10x")),
            Err(ProtocolError::UnexpectedReply('f'))
        );
    }
}
