// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! State tracking for the TV.
//!
//! [`DeviceState`] holds the last confirmed power state and link health.
//! Every mutation returns an optional [`StateChange`]; `None` means the
//! value was already stored and nobody should be notified.
//!
//! ```
//! use lgtv_bridge::state::{DeviceState, StateChange};
//! use lgtv_bridge::types::PowerState;
//!
//! let mut state = DeviceState::new();
//! let change = state.apply_power(PowerState::On);
//! assert_eq!(change, Some(StateChange::Power(PowerState::On)));
//! ```

mod device_state;
mod state_change;

pub use device_state::DeviceState;
pub use state_change::StateChange;
