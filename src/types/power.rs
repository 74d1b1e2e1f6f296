// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Power state of the television.

use std::fmt;
use std::str::FromStr;

use crate::error::ValueError;

/// Represents the power state of the TV, or a request for it.
///
/// `On` and `Off` are states the TV can be in. `Status` is only ever sent
/// to the TV as a query value and is never stored as the current state.
///
/// # Examples
///
/// ```
/// use lgtv_bridge::types::PowerState;
///
/// assert_eq!(PowerState::On.as_str(), "ON");
/// assert_eq!(PowerState::Status.as_num(), 0xFF);
/// assert_eq!("off".parse::<PowerState>().unwrap(), PowerState::Off);
/// assert_eq!("1".parse::<PowerState>().unwrap(), PowerState::On);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PowerState {
    /// The TV is in standby.
    #[default]
    Off,
    /// The TV is on.
    On,
    /// Query marker asking the TV to report its power state.
    Status,
}

impl PowerState {
    /// Returns the textual name used on the message bus.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::On => "ON",
            Self::Status => "STATUS",
        }
    }

    /// Returns the data byte sent to the TV.
    #[must_use]
    pub const fn as_num(&self) -> u8 {
        match self {
            Self::Off => 0x00,
            Self::On => 0x01,
            Self::Status => 0xFF,
        }
    }

    /// Returns `true` for the query marker.
    #[must_use]
    pub const fn is_query(&self) -> bool {
        matches!(self, Self::Status)
    }

    /// Interprets the data byte of a power reply.
    ///
    /// Zero is `Off`; every other value is treated as `On`. Values outside
    /// `{0, 1}` are accepted on purpose, the TV has only ever been observed
    /// to answer 0 or 1.
    #[must_use]
    pub const fn from_reply_data(data: u8) -> Self {
        if data == 0 { Self::Off } else { Self::On }
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<u8> for PowerState {
    type Error = ValueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(Self::Off),
            0x01 => Ok(Self::On),
            0xFF => Ok(Self::Status),
            other => Err(ValueError::UnknownStateValue(other)),
        }
    }
}

impl FromStr for PowerState {
    type Err = ValueError;

    /// Parses a state name (case-insensitive) or its decimal value.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
            let value: u8 = s
                .parse()
                .map_err(|_| ValueError::InvalidPowerState(s.to_string()))?;
            return Self::try_from(value);
        }

        match s.to_uppercase().as_str() {
            "OFF" => Ok(Self::Off),
            "ON" => Ok(Self::On),
            "STATUS" => Ok(Self::Status),
            _ => Err(ValueError::InvalidPowerState(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_state_as_str() {
        assert_eq!(PowerState::Off.as_str(), "OFF");
        assert_eq!(PowerState::On.as_str(), "ON");
        assert_eq!(PowerState::Status.as_str(), "STATUS");
    }

    #[test]
    fn power_state_from_name() {
        assert_eq!("ON".parse::<PowerState>().unwrap(), PowerState::On);
        assert_eq!("off".parse::<PowerState>().unwrap(), PowerState::Off);
        assert_eq!("Status".parse::<PowerState>().unwrap(), PowerState::Status);
    }

    #[test]
    fn power_state_from_number() {
        assert_eq!("0".parse::<PowerState>().unwrap(), PowerState::Off);
        assert_eq!("1".parse::<PowerState>().unwrap(), PowerState::On);
        assert_eq!("255".parse::<PowerState>().unwrap(), PowerState::Status);
        assert_eq!("001".parse::<PowerState>().unwrap(), PowerState::On);
    }

    #[test]
    fn power_state_unmapped_number() {
        assert_eq!(
            "7".parse::<PowerState>().unwrap_err(),
            ValueError::UnknownStateValue(7)
        );
        assert!(matches!(
            "300".parse::<PowerState>().unwrap_err(),
            ValueError::InvalidPowerState(_)
        ));
    }

    #[test]
    fn power_state_invalid_name() {
        for input in ["banana", "", "true", "-1", "1.0"] {
            assert!(
                input.parse::<PowerState>().is_err(),
                "{input:?} should not parse"
            );
        }
    }

    #[test]
    fn reply_data_is_lax() {
        assert_eq!(PowerState::from_reply_data(0), PowerState::Off);
        assert_eq!(PowerState::from_reply_data(1), PowerState::On);
        assert_eq!(PowerState::from_reply_data(0x42), PowerState::On);
    }

    #[test]
    fn default_is_off() {
        assert_eq!(PowerState::default(), PowerState::Off);
    }
}
