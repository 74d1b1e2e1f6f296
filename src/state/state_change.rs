// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Confirmed state changes.

use crate::types::{Availability, PowerState};

/// A change that [`DeviceState`](super::DeviceState) actually applied.
///
/// Changes are only produced when a value differs from the stored one, so
/// every `StateChange` corresponds to exactly one observer notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChange {
    /// The TV switched on or off.
    Power(PowerState),

    /// The TV started or stopped answering polls.
    Availability(Availability),
}

impl StateChange {
    /// Returns the name of the status topic this change is published on.
    #[must_use]
    pub const fn topic_suffix(&self) -> &'static str {
        match self {
            Self::Power(_) => "POWER",
            Self::Availability(_) => "LWT",
        }
    }

    /// Returns the payload published for this change.
    #[must_use]
    pub const fn payload(&self) -> &'static str {
        match self {
            Self::Power(state) => state.as_str(),
            Self::Availability(availability) => availability.as_str(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_change_payload() {
        let change = StateChange::Power(PowerState::On);
        assert_eq!(change.topic_suffix(), "POWER");
        assert_eq!(change.payload(), "ON");
    }

    #[test]
    fn availability_change_payload() {
        let change = StateChange::Availability(Availability::Offline);
        assert_eq!(change.topic_suffix(), "LWT");
        assert_eq!(change.payload(), "Offline");
    }
}
