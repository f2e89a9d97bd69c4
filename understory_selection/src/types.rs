// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core types for selection groups: members, persistence modes, policies, and events.
//!
//! ## Overview
//!
//! These types describe the inputs and outputs of a [`Synchronizer`](crate::synchronizer::Synchronizer).
//! They are plain data and carry no behavior beyond construction helpers.

use alloc::string::String;

/// One selectable alternative within a group.
///
/// The `id` is the stable key (for example a language shorthand such as `"rs"`),
/// and the `label` is what a widget shows in its header (for example `"Rust"`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Member {
    /// Stable identifier, unique within its group.
    pub id: String,
    /// Human-readable label.
    pub label: String,
}

impl Member {
    /// Create a member from an identifier and a label.
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Whether a group's selection outlives the page.
///
/// Carried by [`Group`](crate::group::Group). The
/// [`Synchronizer`](crate::synchronizer::Synchronizer) only consults its
/// [`SelectionStore`](crate::store::SelectionStore) for `Persisted` groups.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Persistence {
    /// Selection is read from and written to the store, keyed by group name.
    #[default]
    Persisted,
    /// Selection lives only in memory.
    ///
    /// The group is still shared: registrations and selections are broadcast
    /// to every subscriber, but nothing is read from or written to the store.
    /// This is not the same as an isolated widget, which keeps its own
    /// [`Group`](crate::group::Group) outside any synchronizer and never broadcasts.
    Transient,
}

/// What happens to the selection when the selected member is deregistered.
///
/// Applied by [`Group::remove_member`](crate::group::Group::remove_member).
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum DeregisterPolicy {
    /// Keep the removed id as the selection.
    ///
    /// The choice stays sticky after its source widget unmounts, so a widget
    /// that registers the same id later comes back selected.
    #[default]
    KeepStale,
    /// Move the selection to the first remaining member, if any.
    ///
    /// With no members left the stale id is kept, so a selection is never
    /// cleared once set.
    FirstRemaining,
}

/// Broadcast payload: the selection of `group` is now `selected`.
///
/// Published by the [`Synchronizer`](crate::synchronizer::Synchronizer) on
/// its [`EventBus`](crate::bus::EventBus) under the group name as topic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectionChanged {
    /// Name of the group whose selection changed.
    pub group: String,
    /// The newly selected member identifier.
    pub selected: String,
}

/// Handle to a live subscription on an [`EventBus`](crate::bus::EventBus).
///
/// This is a small, copyable handle made of a slot index and a generation
/// counter. Unsubscribing frees the slot; a later subscription reusing that
/// slot gets a higher generation, so a stale handle never removes a newer
/// subscriber.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct SubscriptionId(pub(crate) u32, pub(crate) u32);

impl SubscriptionId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }

    pub(crate) const fn generation(self) -> u32 {
        self.1
    }
}
