// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscribable trait for types that emit state changes.

use crate::state::StateChange;
use crate::subscription::SubscriptionId;
use crate::types::{Availability, PowerState};

/// Trait for types that support state change subscriptions.
///
/// Callbacks only fire for confirmed changes: observing the state that is
/// already stored never notifies.
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
/// let sub_id = device.on_power_changed(|state| {
///     println!("TV is now {state}");
/// });
///
/// device.unsubscribe(sub_id);
/// # Ok(())
/// # }
/// ```
pub trait Subscribable {
    /// Subscribes to power state changes.
    fn on_power_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(PowerState) + Send + Sync + 'static;

    /// Subscribes to availability changes.
    fn on_availability_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(Availability) + Send + Sync + 'static;

    /// Subscribes to all state changes.
    fn on_state_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&StateChange) + Send + Sync + 'static;

    /// Unsubscribes a callback by its subscription ID.
    ///
    /// Returns `true` if the subscription was found and removed.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}
