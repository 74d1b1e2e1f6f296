// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Encoding and decoding of LG RS-232 frames.
//!
//! Requests and replies use different shapes:
//!
//! ```text
//! request:  ka 01 1\r        <base><opcode> <set id> <hex data>CR
//! reply:    a 01 OK01x       <opcode> <set id> [OK|NG]<hex data>x
//! ```
//!
//! Some firmwares omit the `OK` marker and answer `a 01 01x`; both forms
//! are accepted. Nothing here performs I/O.

use crate::command::Command;
use crate::error::ConfigError;
use crate::types::PowerState;

/// Set ID addressed by every request.
pub const SET_ID: &str = "01";

/// Character closing every reply.
pub const REPLY_END: char = 'x';

/// Character closing every request.
pub const REQUEST_END: char = '\r';

/// Offset of the opcode character in an encoded request.
pub const OPCODE_OFFSET: usize = 1;

/// Encodes a request frame.
///
/// # Errors
///
/// Returns [`ConfigError::MissingData`] when `data` is `None`. Queries must
/// pass [`PowerState::Status`] explicitly.
///
/// # Examples
///
/// ```
/// use lgtv_bridge::command::Command;
/// use lgtv_bridge::protocol::codec::encode_command;
/// use lgtv_bridge::types::PowerState;
///
/// let frame = encode_command('k', Command::Power, Some(PowerState::Status)).unwrap();
/// assert_eq!(frame, b"ka 01 FF\r");
/// assert!(encode_command('k', Command::Power, None).is_err());
/// ```
pub fn encode_command(
    base: char,
    command: Command,
    data: Option<PowerState>,
) -> Result<Vec<u8>, ConfigError> {
    let data = data.ok_or(ConfigError::MissingData(command.opcode()))?;
    Ok(format_frame(base, command, data))
}

pub(crate) fn format_frame(base: char, command: Command, data: PowerState) -> Vec<u8> {
    format!(
        "{base}{opcode} {SET_ID} {data:X}{REQUEST_END}",
        opcode = command.opcode(),
        data = data.as_num()
    )
    .into_bytes()
}

/// Whether the TV accepted the request a reply answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyStatus {
    /// `OK` marker, or no marker at all.
    Acknowledged,
    /// `NG` marker.
    Rejected,
}

/// A decoded reply line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Opcode of the command the reply belongs to.
    pub opcode: char,
    /// Set ID the TV reported.
    pub set_id: String,
    /// Acknowledgement marker.
    pub status: ReplyStatus,
    /// Data byte.
    pub data: u8,
}

impl Reply {
    /// Returns the command this reply answers, if it is a known one.
    #[must_use]
    pub fn command(&self) -> Option<Command> {
        Command::from_opcode(self.opcode)
    }

    /// Returns `true` if the TV accepted the request.
    #[must_use]
    pub fn is_acknowledged(&self) -> bool {
        self.status == ReplyStatus::Acknowledged
    }
}

/// Decodes a reply line.
///
/// Returns `None` for anything that is not a well-formed reply; this
/// function never panics. A trailing line break is ignored.
///
/// # Examples
///
/// ```
/// use lgtv_bridge::protocol::codec::decode_reply;
///
/// let reply = decode_reply("a 01 OK01x").unwrap();
/// assert_eq!(reply.opcode, 'a');
/// assert_eq!(reply.data, 1);
///
/// assert!(decode_reply("a 01 OK01").is_none());
/// assert!(decode_reply("a x").is_none());
/// ```
#[must_use]
pub fn decode_reply(line: &str) -> Option<Reply> {
    let body = line
        .trim_end_matches(['\r', '\n'])
        .strip_suffix(REPLY_END)?;

    let mut tokens = body.split_whitespace();
    let opcode = single_char(tokens.next()?)?;
    let set_id = tokens.next()?;
    let payload = tokens.next()?;

    let (status, hex) = if let Some(rest) = payload.strip_prefix("OK") {
        (ReplyStatus::Acknowledged, rest)
    } else if let Some(rest) = payload.strip_prefix("NG") {
        (ReplyStatus::Rejected, rest)
    } else {
        (ReplyStatus::Acknowledged, payload)
    };

    let hex = hex.get(..2).unwrap_or(hex);
    if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let data = u8::from_str_radix(hex, 16).ok()?;

    Some(Reply {
        opcode,
        set_id: set_id.to_string(),
        status,
        data,
    })
}

fn single_char(token: &str) -> Option<char> {
    let mut chars = token.chars();
    let c = chars.next()?;
    chars.next().is_none().then_some(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_power_frames() {
        let on = encode_command('k', Command::Power, Some(PowerState::On)).unwrap();
        assert_eq!(on, b"ka 01 1\r");

        let off = encode_command('k', Command::Power, Some(PowerState::Off)).unwrap();
        assert_eq!(off, b"ka 01 0\r");

        let query = encode_command('k', Command::Power, Some(PowerState::Status)).unwrap();
        assert_eq!(query, b"ka 01 FF\r");
    }

    #[test]
    fn encode_without_data_fails() {
        let err = encode_command('k', Command::Power, None).unwrap_err();
        assert!(matches!(err, ConfigError::MissingData('a')));
    }

    #[test]
    fn encoded_frame_shape() {
        for state in [PowerState::On, PowerState::Off, PowerState::Status] {
            let frame = encode_command('k', Command::Power, Some(state)).unwrap();
            assert_eq!(frame.last(), Some(&b'\r'));
            assert_eq!(frame[OPCODE_OFFSET], b'a');
        }
    }

    #[test]
    fn decode_bare_data() {
        let reply = decode_reply("a 01 01x").unwrap();
        assert_eq!(reply.opcode, 'a');
        assert_eq!(reply.set_id, "01");
        assert_eq!(reply.status, ReplyStatus::Acknowledged);
        assert_eq!(reply.data, 1);
        assert_eq!(reply.command(), Some(Command::Power));
    }

    #[test]
    fn decode_acknowledged() {
        let reply = decode_reply("a 01 OK00x").unwrap();
        assert!(reply.is_acknowledged());
        assert_eq!(reply.data, 0);
    }

    #[test]
    fn decode_rejected() {
        let reply = decode_reply("a 01 NG01x").unwrap();
        assert_eq!(reply.status, ReplyStatus::Rejected);
        assert_eq!(reply.data, 1);
    }

    #[test]
    fn decode_hex_data() {
        assert_eq!(decode_reply("f 01 OK1Ax").unwrap().data, 0x1A);
        assert_eq!(decode_reply("a 01 OK1x").unwrap().data, 1);
    }

    #[test]
    fn decode_ignores_line_break() {
        assert!(decode_reply("a 01 OK01x\r\n").is_some());
    }

    #[test]
    fn decode_rejects_garbage() {
        let inputs = [
            "",
            "x",
            "a 01 OK01",
            "a x",
            "a 01x",
            "ab 01 OK01x",
            "a 01 OKx",
            "a 01 OKzzx",
            "a 01 +1x",
            "a 01 é1x",
            "   x",
        ];
        for input in inputs {
            assert!(decode_reply(input).is_none(), "{input:?} should not decode");
        }
    }

    #[test]
    fn decode_unknown_opcode() {
        let reply = decode_reply("q 01 OK01x").unwrap();
        assert_eq!(reply.command(), None);
    }
}
