// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Request/reply exchanges over a transport.

use std::time::Duration;

use crate::error::TransportError;
use crate::protocol::Transport;

/// A transport bound to its read timeout.
///
/// Each method is one complete exchange: a write followed by reading the
/// reply to that write. Callers hold the link's lock for the whole call so
/// exchanges never interleave on the wire.
#[derive(Debug)]
pub struct Link<T> {
    transport: T,
    read_timeout: Duration,
}

impl<T: Transport> Link<T> {
    /// Wraps a transport.
    pub fn new(transport: T, read_timeout: Duration) -> Self {
        Self {
            transport,
            read_timeout,
        }
    }

    /// Writes a frame and returns the reply line.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the write fails or no reply arrives
    /// within the read timeout.
    pub fn query(&mut self, frame: &[u8]) -> Result<String, TransportError> {
        self.transport.write_frame(frame)?;
        self.transport.read_line(self.read_timeout)
    }

    /// Writes a frame and discards its reply.
    ///
    /// A missing reply is not an error: some firmwares do not acknowledge
    /// set commands. Reading it here keeps a late acknowledgement from
    /// being mistaken for the answer to the next query.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the write fails, or if reading fails
    /// for a reason other than a timeout.
    pub fn send(&mut self, frame: &[u8]) -> Result<Option<String>, TransportError> {
        self.transport.write_frame(frame)?;
        match self.transport.read_line(self.read_timeout) {
            Ok(line) => Ok(Some(line)),
            Err(e) if e.is_timeout() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;

    #[derive(Default)]
    struct Scripted {
        written: Vec<Vec<u8>>,
        replies: VecDeque<Result<String, TransportError>>,
    }

    impl Transport for Scripted {
        fn write_frame(&mut self, frame: &[u8]) -> Result<(), TransportError> {
            self.written.push(frame.to_vec());
            Ok(())
        }

        fn read_line(&mut self, timeout: Duration) -> Result<String, TransportError> {
            self.replies
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::timeout(timeout)))
        }
    }

    #[test]
    fn query_returns_reply() {
        let mut transport = Scripted::default();
        transport.replies.push_back(Ok("a 01 OK01x".to_string()));
        let mut link = Link::new(transport, Duration::from_millis(10));

        assert_eq!(link.query(b"ka 01 FF\r").unwrap(), "a 01 OK01x");
        assert_eq!(link.transport.written, vec![b"ka 01 FF\r".to_vec()]);
    }

    #[test]
    fn query_times_out() {
        let mut link = Link::new(Scripted::default(), Duration::from_millis(10));
        assert!(matches!(
            link.query(b"ka 01 FF\r"),
            Err(TransportError::Timeout(10))
        ));
    }

    #[test]
    fn send_tolerates_missing_ack() {
        let mut link = Link::new(Scripted::default(), Duration::from_millis(10));
        assert_eq!(link.send(b"ka 01 1\r").unwrap(), None);
    }

    #[test]
    fn send_consumes_ack() {
        let mut transport = Scripted::default();
        transport.replies.push_back(Ok("a 01 OK01x".to_string()));
        transport.replies.push_back(Ok("a 01 OK00x".to_string()));
        let mut link = Link::new(transport, Duration::from_millis(10));

        assert_eq!(link.send(b"ka 01 1\r").unwrap().as_deref(), Some("a 01 OK01x"));
        assert_eq!(link.query(b"ka 01 FF\r").unwrap(), "a 01 OK00x");
    }

    #[test]
    fn send_propagates_io_errors() {
        let mut transport = Scripted::default();
        transport.replies.push_back(Err(TransportError::InvalidEncoding));
        let mut link = Link::new(transport, Duration::from_millis(10));

        assert!(matches!(
            link.send(b"ka 01 1\r"),
            Err(TransportError::InvalidEncoding)
        ));
    }
}
