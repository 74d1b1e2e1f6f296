// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Callback management for state change subscriptions.
//!
//! - [`SubscriptionId`] - Unique identifier for unsubscribing
//! - [`CallbackRegistry`] - Ordered registry that stores and dispatches callbacks

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::state::StateChange;
use crate::types::{Availability, PowerState};

/// Unique identifier for a subscription.
///
/// Returned when registering a callback; pass it to `unsubscribe` to remove
/// the callback again. IDs are unique within a registry's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    #[must_use]
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sub({})", self.0)
    }
}

type PowerCallback = Arc<dyn Fn(PowerState) + Send + Sync>;

type AvailabilityCallback = Arc<dyn Fn(Availability) + Send + Sync>;

type StateChangedCallback = Arc<dyn Fn(&StateChange) + Send + Sync>;

/// Callbacks of one kind, kept in registration order.
struct CallbackList<C> {
    entries: RwLock<Vec<(SubscriptionId, C)>>,
}

impl<C: Clone> CallbackList<C> {
    fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    fn push(&self, id: SubscriptionId, callback: C) {
        self.entries.write().push((id, callback));
    }

    fn remove(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    /// Copies the callbacks so none of the locks is held while they run.
    fn snapshot(&self) -> Vec<C> {
        self.entries.read().iter().map(|(_, cb)| cb.clone()).collect()
    }

    fn len(&self) -> usize {
        self.entries.read().len()
    }
}

/// Registry for state change callbacks.
///
/// Callbacks run synchronously, in the order they were registered. The
/// callback lists are copied before dispatch, so a callback may register or
/// remove callbacks without deadlocking. A callback that panics is logged
/// and skipped; the remaining callbacks still run.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// use lgtv_bridge::state::StateChange;
/// use lgtv_bridge::subscription::CallbackRegistry;
/// use lgtv_bridge::types::PowerState;
///
/// let registry = CallbackRegistry::new();
/// let calls = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&calls);
///
/// registry.on_power_changed(move |state| {
///     assert_eq!(state.as_str(), "ON");
///     counter.fetch_add(1, Ordering::SeqCst);
/// });
///
/// registry.dispatch(&StateChange::Power(PowerState::On));
/// assert_eq!(calls.load(Ordering::SeqCst), 1);
/// ```
pub struct CallbackRegistry {
    next_id: AtomicU64,
    power_callbacks: CallbackList<PowerCallback>,
    availability_callbacks: CallbackList<AvailabilityCallback>,
    state_changed_callbacks: CallbackList<StateChangedCallback>,
}

impl CallbackRegistry {
    /// Creates a new empty callback registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            power_callbacks: CallbackList::new(),
            availability_callbacks: CallbackList::new(),
            state_changed_callbacks: CallbackList::new(),
        }
    }

    fn next_id(&self) -> SubscriptionId {
        SubscriptionId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Registers a callback for power state changes.
    ///
    /// The callback receives the new state; `state.as_str()` is its textual
    /// name (`"ON"` or `"OFF"`).
    pub fn on_power_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(PowerState) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.power_callbacks.push(id, Arc::new(callback));
        id
    }

    /// Registers a callback for availability changes.
    pub fn on_availability_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(Availability) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.availability_callbacks.push(id, Arc::new(callback));
        id
    }

    /// Registers a callback for every state change.
    pub fn on_state_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&StateChange) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.state_changed_callbacks.push(id, Arc::new(callback));
        id
    }

    /// Unregisters a callback by its subscription ID.
    ///
    /// Returns `true` if a callback was found and removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.power_callbacks.remove(id)
            || self.availability_callbacks.remove(id)
            || self.state_changed_callbacks.remove(id)
    }

    /// Dispatches a change to the generic callbacks, then to the callbacks
    /// registered for its kind.
    pub fn dispatch(&self, change: &StateChange) {
        for callback in self.state_changed_callbacks.snapshot() {
            guarded(change, || callback(change));
        }

        match *change {
            StateChange::Power(state) => {
                for callback in self.power_callbacks.snapshot() {
                    guarded(change, || callback(state));
                }
            }
            StateChange::Availability(availability) => {
                for callback in self.availability_callbacks.snapshot() {
                    guarded(change, || callback(availability));
                }
            }
        }
    }

    /// Returns the total number of registered callbacks.
    #[must_use]
    pub fn callback_count(&self) -> usize {
        self.power_callbacks.len()
            + self.availability_callbacks.len()
            + self.state_changed_callbacks.len()
    }

    /// Returns `true` if there are no registered callbacks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callback_count() == 0
    }
}

/// Runs one callback, containing a panic to that callback.
fn guarded(change: &StateChange, call: impl FnOnce()) {
    if panic::catch_unwind(AssertUnwindSafe(call)).is_err() {
        tracing::error!(?change, "State change callback panicked");
    }
}

impl Default for CallbackRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("callback_count", &self.callback_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicU32;

    #[test]
    fn subscription_id_display() {
        let id = SubscriptionId::new(42);
        assert_eq!(id.to_string(), "Sub(42)");
    }

    #[test]
    fn registry_new_is_empty() {
        let registry = CallbackRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.callback_count(), 0);
    }

    #[test]
    fn registry_power_callback() {
        let registry = CallbackRegistry::new();
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let id = registry.on_power_changed(move |_state| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(registry.callback_count(), 1);

        registry.dispatch(&StateChange::Power(PowerState::On));
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        assert!(registry.unsubscribe(id));
        assert!(registry.is_empty());

        registry.dispatch(&StateChange::Power(PowerState::Off));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn callbacks_run_in_registration_order() {
        let registry = CallbackRegistry::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for n in 0..5 {
            let order = Arc::clone(&order);
            registry.on_power_changed(move |state| {
                order.lock().push(format!("{n}:{state}"));
            });
        }

        registry.dispatch(&StateChange::Power(PowerState::On));
        assert_eq!(*order.lock(), ["0:ON", "1:ON", "2:ON", "3:ON", "4:ON"]);
    }

    #[test]
    fn panicking_callback_does_not_stop_later_ones() {
        let registry = CallbackRegistry::new();
        let counter = Arc::new(AtomicU32::new(0));

        let c1 = Arc::clone(&counter);
        registry.on_power_changed(move |_| {
            c1.fetch_add(1, Ordering::SeqCst);
        });
        registry.on_power_changed(|_| panic!("observer failure"));
        let c3 = Arc::clone(&counter);
        registry.on_power_changed(move |_| {
            c3.fetch_add(1, Ordering::SeqCst);
        });

        registry.dispatch(&StateChange::Power(PowerState::On));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn callback_can_subscribe_during_dispatch() {
        let registry = Arc::new(CallbackRegistry::new());
        let inner = Arc::clone(&registry);

        registry.on_power_changed(move |_| {
            inner.on_power_changed(|_| {});
        });

        registry.dispatch(&StateChange::Power(PowerState::On));
        assert_eq!(registry.callback_count(), 2);
    }

    #[test]
    fn availability_and_generic_callbacks() {
        let registry = CallbackRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let s1 = Arc::clone(&seen);
        registry.on_availability_changed(move |availability| {
            s1.lock().push(availability.to_string());
        });
        let s2 = Arc::clone(&seen);
        registry.on_state_changed(move |change| {
            s2.lock().push(format!("any:{}", change.payload()));
        });

        registry.dispatch(&StateChange::Availability(Availability::Online));
        registry.dispatch(&StateChange::Power(PowerState::Off));

        assert_eq!(*seen.lock(), ["any:Online", "Online", "any:OFF"]);
    }

    #[test]
    fn registry_unsubscribe_nonexistent() {
        let registry = CallbackRegistry::new();
        assert!(!registry.unsubscribe(SubscriptionId::new(999)));
    }

    #[test]
    fn registry_unique_ids() {
        let registry = CallbackRegistry::new();

        let id1 = registry.on_power_changed(|_| {});
        let id2 = registry.on_availability_changed(|_| {});
        let id3 = registry.on_state_changed(|_| {});

        assert_ne!(id1, id2);
        assert_ne!(id2, id3);
        assert_ne!(id1, id3);
    }

    #[test]
    fn registry_debug() {
        let registry = CallbackRegistry::new();
        registry.on_power_changed(|_| {});

        let debug = format!("{registry:?}");
        assert!(debug.contains("CallbackRegistry"));
        assert!(debug.contains("callback_count"));
    }
}
