// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MQTT topic layout.
//!
//! ```text
//! gBridge/u2942/cmnd/lg-tv/power   ← commands for the TV
//! gBridge/u2942/stat/lg-tv/POWER   → confirmed TV state
//! gBridge/u2942/stat/lg-tv/LWT     → Online / Offline
//! ```

use std::fmt;

use crate::error::ConfigError;

/// Message-type segment of a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopicKind {
    /// Topics the bridge receives commands on.
    Command,
    /// Topics the bridge publishes state to.
    Status,
}

impl TopicKind {
    /// Returns the topic segment.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Command => "cmnd",
            Self::Status => "stat",
        }
    }
}

impl fmt::Display for TopicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds and parses topics of the form
/// `<base>/<cmnd|stat>/<device>/<suffix>`.
///
/// # Examples
///
/// ```
/// use lgtv_bridge::protocol::{TopicKind, TopicScheme};
///
/// let scheme = TopicScheme::new("gBridge/u2942/", "lg-tv").unwrap();
/// assert_eq!(
///     scheme.topic(TopicKind::Status, "POWER"),
///     "gBridge/u2942/stat/lg-tv/POWER"
/// );
/// assert_eq!(
///     scheme.command_suffix("gBridge/u2942/cmnd/lg-tv/power"),
///     Some("power")
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicScheme {
    base: String,
    device: String,
}

impl TopicScheme {
    /// Creates a topic scheme.
    ///
    /// A trailing `/` on `base` is ignored and an empty base is allowed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if the device name is empty or
    /// either part contains MQTT wildcards.
    pub fn new(base: impl Into<String>, device: impl Into<String>) -> Result<Self, ConfigError> {
        let base = base.into().trim_end_matches('/').to_string();
        let device = device.into();

        if device.is_empty() || device.contains('/') {
            return Err(ConfigError::InvalidValue {
                field: "device_name".to_string(),
                message: format!("{device:?} must be a single non-empty topic segment"),
            });
        }
        for (field, value) in [("base_topic", &base), ("device_name", &device)] {
            if value.contains(['+', '#']) {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: format!("{value:?} must not contain MQTT wildcards"),
                });
            }
        }

        Ok(Self { base, device })
    }

    /// Returns the base topic without trailing slash.
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Returns the device name segment.
    #[must_use]
    pub fn device(&self) -> &str {
        &self.device
    }

    /// Builds a full topic.
    #[must_use]
    pub fn topic(&self, kind: TopicKind, suffix: &str) -> String {
        format!("{}{suffix}", self.prefix(kind))
    }

    /// Extracts the suffix of a command topic belonging to this device.
    ///
    /// Returns `None` for status topics, other devices, and nested suffixes.
    #[must_use]
    pub fn command_suffix<'a>(&self, topic: &'a str) -> Option<&'a str> {
        let suffix = topic.strip_prefix(&self.prefix(TopicKind::Command))?;
        (!suffix.is_empty() && !suffix.contains('/')).then_some(suffix)
    }

    fn prefix(&self, kind: TopicKind) -> String {
        if self.base.is_empty() {
            format!("{kind}/{}/", self.device)
        } else {
            format!("{}/{kind}/{}/", self.base, self.device)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheme() -> TopicScheme {
        TopicScheme::new("gBridge/u2942/", "lg-tv").unwrap()
    }

    #[test]
    fn builds_command_and_status_topics() {
        let scheme = scheme();
        assert_eq!(
            scheme.topic(TopicKind::Command, "power"),
            "gBridge/u2942/cmnd/lg-tv/power"
        );
        assert_eq!(
            scheme.topic(TopicKind::Status, "POWER"),
            "gBridge/u2942/stat/lg-tv/POWER"
        );
    }

    #[test]
    fn empty_base() {
        let scheme = TopicScheme::new("", "tv").unwrap();
        assert_eq!(scheme.topic(TopicKind::Status, "POWER"), "stat/tv/POWER");
    }

    #[test]
    fn parses_command_suffix() {
        let scheme = scheme();
        assert_eq!(
            scheme.command_suffix("gBridge/u2942/cmnd/lg-tv/POWER"),
            Some("POWER")
        );
        assert_eq!(scheme.command_suffix("gBridge/u2942/stat/lg-tv/POWER"), None);
        assert_eq!(scheme.command_suffix("gBridge/u2942/cmnd/other/power"), None);
        assert_eq!(scheme.command_suffix("gBridge/u2942/cmnd/lg-tv/"), None);
        assert_eq!(scheme.command_suffix("gBridge/u2942/cmnd/lg-tv/a/b"), None);
    }

    #[test]
    fn rejects_invalid_segments() {
        assert!(TopicScheme::new("home", "").is_err());
        assert!(TopicScheme::new("home", "living/tv").is_err());
        assert!(TopicScheme::new("home/#", "tv").is_err());
        assert!(TopicScheme::new("home", "tv+").is_err());
    }
}
