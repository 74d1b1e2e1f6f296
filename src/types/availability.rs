// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Link availability.

use std::fmt;

/// Whether the TV currently answers status polls.
///
/// The names follow the Tasmota `LWT` convention so home automation
/// controllers can treat the TV like any other MQTT device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Availability {
    /// The TV answered the most recent poll.
    Online,
    /// The TV has not answered for several polls, or never did.
    #[default]
    Offline,
}

impl Availability {
    /// Returns the payload published on the `LWT` topic.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "Online",
            Self::Offline => "Offline",
        }
    }

    /// Returns `true` when the TV is reachable.
    #[must_use]
    pub const fn is_online(&self) -> bool {
        matches!(self, Self::Online)
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
