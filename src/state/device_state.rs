// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device state tracking.

use chrono::{DateTime, Utc};

use crate::types::{Availability, PowerState};

use super::StateChange;

/// Last known state of the TV.
///
/// The power state is always `On` or `Off`; the `Status` query marker is
/// never stored. Alongside it the state tracks link health so a TV that
/// stopped answering can be reported as offline.
///
/// # Examples
///
/// ```
/// use lgtv_bridge::state::{DeviceState, StateChange};
/// use lgtv_bridge::types::PowerState;
///
/// let mut state = DeviceState::new();
/// assert_eq!(state.power(), PowerState::Off);
///
/// // Applying a new value returns the change
/// assert_eq!(
///     state.apply_power(PowerState::On),
///     Some(StateChange::Power(PowerState::On))
/// );
///
/// // Applying the same value again is a no-op
/// assert_eq!(state.apply_power(PowerState::On), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceState {
    power: PowerState,
    availability: Availability,
    last_seen: Option<DateTime<Utc>>,
    failed_polls: u32,
}

impl DeviceState {
    /// Creates the initial state: power off, link offline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current power state.
    #[must_use]
    pub fn power(&self) -> PowerState {
        self.power
    }

    /// Returns whether the TV currently answers polls.
    #[must_use]
    pub fn availability(&self) -> Availability {
        self.availability
    }

    /// Returns the time of the last successful poll.
    #[must_use]
    pub fn last_seen(&self) -> Option<DateTime<Utc>> {
        self.last_seen
    }

    /// Returns the number of polls that failed since the last success.
    #[must_use]
    pub fn failed_polls(&self) -> u32 {
        self.failed_polls
    }

    /// Stores an observed power state.
    ///
    /// Returns `None` when `candidate` equals the stored state, or when it
    /// is the `Status` query marker.
    pub fn apply_power(&mut self, candidate: PowerState) -> Option<StateChange> {
        if candidate.is_query() || candidate == self.power {
            return None;
        }
        self.power = candidate;
        Some(StateChange::Power(candidate))
    }

    /// Records a poll the TV answered.
    ///
    /// Returns a change when the link comes back online.
    pub fn record_success(&mut self, at: DateTime<Utc>) -> Option<StateChange> {
        self.failed_polls = 0;
        self.last_seen = Some(at);
        self.set_availability(Availability::Online)
    }

    /// Records a poll the TV did not answer.
    ///
    /// Returns a change when this failure is the `offline_after`-th in a
    /// row. An `offline_after` of zero is treated as one.
    pub fn record_failure(&mut self, offline_after: u32) -> Option<StateChange> {
        self.failed_polls = self.failed_polls.saturating_add(1);
        if self.failed_polls >= offline_after.max(1) {
            self.set_availability(Availability::Offline)
        } else {
            None
        }
    }

    fn set_availability(&mut self, availability: Availability) -> Option<StateChange> {
        if self.availability == availability {
            return None;
        }
        self.availability = availability;
        Some(StateChange::Availability(availability))
    }
}
