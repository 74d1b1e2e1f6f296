// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! LG serial command definitions.
//!
//! Every LG RS-232 command is addressed by two characters: a command group
//! (the base character) and an opcode within that group. The power
//! command, for instance, is `k` + `a`.
//!
//! | Command | Base | Opcode | Data |
//! |---------|------|--------|------|
//! | [`Command::Power`] | `k` | `a` | `0` off, `1` on, `FF` query |
//!
//! # Examples
//!
//! ```
//! use lgtv_bridge::command::Command;
//! use lgtv_bridge::types::PowerState;
//!
//! let cmd: Command = "power".parse().unwrap();
//! assert_eq!(cmd.opcode(), 'a');
//! assert_eq!(cmd.frame(PowerState::On), b"ka 01 1\r");
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::ProtocolError;
use crate::protocol::codec;
use crate::types::PowerState;

/// A command the TV understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Switch the TV on or off, or query its power state.
    Power,
}

impl Command {
    /// All supported commands.
    pub const ALL: [Self; 1] = [Self::Power];

    /// Returns the command name used on the message bus.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Power => "POWER",
        }
    }

    /// Returns the command group character.
    #[must_use]
    pub const fn base(&self) -> char {
        match self {
            Self::Power => 'k',
        }
    }

    /// Returns the opcode character, which the TV echoes in its replies.
    #[must_use]
    pub const fn opcode(&self) -> char {
        match self {
            Self::Power => 'a',
        }
    }

    /// Looks up the command a reply opcode belongs to.
    #[must_use]
    pub fn from_opcode(opcode: char) -> Option<Self> {
        Self::ALL.into_iter().find(|cmd| cmd.opcode() == opcode)
    }

    /// Encodes this command with the given data value.
    #[must_use]
    pub fn frame(&self, state: PowerState) -> Vec<u8> {
        codec::format_frame(self.base(), *self, state)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Command {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|cmd| cmd.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ProtocolError::UnknownCommand(s.to_string()))
    }
}
