// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Background status polling.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::Shared;
use crate::protocol::Transport;

/// Spawns the poller. The first poll runs immediately.
///
/// A failed poll is logged and otherwise ignored; the next tick tries
/// again.
pub(crate) fn spawn<T: Transport>(shared: Arc<Shared<T>>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // A slow TV delays the schedule instead of causing a burst of polls.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::debug!(?interval, "Poller started");
        loop {
            ticker.tick().await;
            match shared.refresh().await {
                Ok(state) => tracing::trace!(%state, "Poll succeeded"),
                Err(e) => tracing::debug!(error = %e, "Poll failed"),
            }
        }
    })
}
