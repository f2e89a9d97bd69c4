// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Topic-keyed publish/subscribe with generational subscription handles.
//!
//! ## Overview
//!
//! An [`EventBus`] is an explicit observer list. It is owned by whoever needs it
//! (typically one [`Synchronizer`](crate::synchronizer::Synchronizer) per page)
//! rather than being a process-wide singleton, so tests can create as many
//! independent buses as they like.
//!
//! Publishing is synchronous: [`EventBus::publish`] returns only after every
//! subscriber of the topic has been called.
//!
//! ## Publishing from shared ownership
//!
//! `publish` needs `&mut self` for the whole fan-out. When the bus lives in a
//! `RefCell` and callbacks may reach the bus again (to unsubscribe themselves,
//! or to subscribe a newly mounted widget), drive the fan-out one callback at a
//! time instead:
//!
//! 1) [`EventBus::subscriptions`] snapshots the handles for a topic.
//! 2) [`EventBus::take_callback`] moves a callback out, so no borrow of the bus
//!    is held while it runs.
//! 3) [`EventBus::restore_callback`] puts it back, or hands it back to the caller
//!    if the subscription ended while it ran.
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use understory_selection::bus::EventBus;
//!
//! let mut bus: EventBus<u32> = EventBus::new();
//! let seen = Rc::new(Cell::new(0));
//! let s = seen.clone();
//! let id = bus.subscribe("lang", move |v: &u32| s.set(*v));
//! assert_eq!(bus.publish("lang", &7), 1);
//! assert_eq!(bus.publish("other", &9), 0);
//! assert_eq!(seen.get(), 7);
//! assert!(bus.unsubscribe(id));
//! assert!(!bus.unsubscribe(id));
//! ```

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

use crate::types::SubscriptionId;

/// Boxed subscriber callback.
pub type Callback<E> = Box<dyn FnMut(&E)>;

struct Slot<E> {
    topic: String,
    // `None` while taken out by `take_callback`.
    callback: Option<Callback<E>>,
}

/// Observer list keyed by topic.
pub struct EventBus<E> {
    slots: Vec<Option<Slot<E>>>,
    generations: Vec<u32>, // last generation per slot (persists across frees)
    free_list: Vec<usize>,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> core::fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.len())
            .field("free_list", &self.free_list.len())
            .finish_non_exhaustive()
    }
}

impl<E> EventBus<E> {
    /// Create a bus with no subscribers.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
        }
    }

    /// Number of live subscriptions.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Whether the bus has no live subscriptions.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of live subscriptions for `topic`.
    pub fn subscribers(&self, topic: &str) -> usize {
        self.slots
            .iter()
            .flatten()
            .filter(|s| s.topic == topic)
            .count()
    }

    /// Register `callback` for events published under `topic`.
    pub fn subscribe(
        &mut self,
        topic: impl Into<String>,
        callback: impl FnMut(&E) + 'static,
    ) -> SubscriptionId {
        let slot = Slot {
            topic: topic.into(),
            callback: Some(Box::new(callback)),
        };
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.slots[idx] = Some(slot);
            (idx, generation)
        } else {
            self.slots.push(Some(slot));
            self.generations.push(1);
            (self.slots.len() - 1, 1)
        };
        #[allow(
            clippy::cast_possible_truncation,
            reason = "SubscriptionId stores 32-bit slot indices."
        )]
        let idx = idx as u32;
        SubscriptionId::new(idx, generation)
    }

    /// Whether `id` still refers to a live subscription.
    pub fn is_alive(&self, id: SubscriptionId) -> bool {
        self.generations.get(id.idx()) == Some(&id.generation())
            && self.slots.get(id.idx()).is_some_and(Option::is_some)
    }

    /// Remove a subscription. Returns `false` for stale or unknown handles.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let alive = self.is_alive(id);
        self.remove(id);
        alive
    }

    /// Remove a subscription and return its callback.
    ///
    /// Dropping a callback may drop whatever it captured, so callers holding the
    /// bus in a `RefCell` should release their borrow before dropping the result.
    /// Returns `None` for stale handles and for callbacks currently taken out.
    pub fn remove(&mut self, id: SubscriptionId) -> Option<Callback<E>> {
        if !self.is_alive(id) {
            return None;
        }
        let slot = self.slots[id.idx()].take();
        self.free_list.push(id.idx());
        slot.and_then(|s| s.callback)
    }

    /// Handles of the live subscriptions for `topic`, in slot order.
    pub fn subscriptions(&self, topic: &str) -> Vec<SubscriptionId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.as_ref().is_some_and(|s| s.topic == topic))
            .map(|(idx, _)| {
                #[allow(
                    clippy::cast_possible_truncation,
                    reason = "SubscriptionId stores 32-bit slot indices."
                )]
                let slot = idx as u32;
                SubscriptionId::new(slot, self.generations[idx])
            })
            .collect()
    }

    /// Move the callback of `id` out of the bus.
    ///
    /// Returns `None` for stale handles and for callbacks already taken out, so
    /// a callback is never run re-entrantly.
    pub fn take_callback(&mut self, id: SubscriptionId) -> Option<Callback<E>> {
        if !self.is_alive(id) {
            return None;
        }
        self.slots[id.idx()].as_mut()?.callback.take()
    }

    /// Put back a callback moved out by [`EventBus::take_callback`].
    ///
    /// If the subscription ended in the meantime the callback is returned so the
    /// caller can drop it outside any borrow of the bus.
    pub fn restore_callback(
        &mut self,
        id: SubscriptionId,
        callback: Callback<E>,
    ) -> Option<Callback<E>> {
        if !self.is_alive(id) {
            return Some(callback);
        }
        match self.slots[id.idx()].as_mut() {
            Some(slot) if slot.callback.is_none() => {
                slot.callback = Some(callback);
                None
            }
            _ => Some(callback),
        }
    }

    /// Call every subscriber of `topic` with `event`.
    ///
    /// Subscribers run in slot order, which is subscription order until an
    /// unsubscribed slot is reused. Callbacks currently taken out are skipped.
    /// Returns the number of subscribers notified.
    pub fn publish(&mut self, topic: &str, event: &E) -> usize {
        let mut delivered = 0;
        for slot in self.slots.iter_mut().flatten() {
            if slot.topic != topic {
                continue;
            }
            if let Some(callback) = slot.callback.as_mut() {
                callback(event);
                delivered += 1;
            }
        }
        delivered
    }
}
