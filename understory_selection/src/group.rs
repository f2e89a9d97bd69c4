// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A single selection group: ordered members and at most one selected id.
//!
//! ## Usage
//!
//! A [`Group`] can be used directly as the local state of an isolated widget,
//! or owned by a [`Synchronizer`](crate::synchronizer::Synchronizer) which adds
//! broadcast and persistence on top.
//!
//! ```
//! use understory_selection::group::Group;
//! use understory_selection::types::{Member, Persistence};
//!
//! let mut g = Group::new("lang-sample", Persistence::Transient);
//! g.insert_member(Member::new("js", "JavaScript"));
//! g.insert_member(Member::new("rs", "Rust"));
//! assert_eq!(g.selected(), Some("js"));
//! assert!(g.set_selected("rs"));
//! assert!(g.is_selected("rs"));
//! assert!(!g.is_selected("js"));
//! ```

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::types::{DeregisterPolicy, Member, Persistence};

/// Ordered members plus the current selection.
///
/// Invariants:
/// - Member ids are unique; insertion order is display order.
/// - Once a selection is set it is never cleared.
/// - The selection is always an id that is or was a member.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Group {
    name: String,
    members: Vec<Member>,
    selected: Option<String>,
    persistence: Persistence,
    // Set once a stored value was adopted or a member was explicitly selected.
    settled: bool,
}

impl Group {
    /// Create an empty group.
    pub fn new(name: impl Into<String>, persistence: Persistence) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
            selected: None,
            persistence,
            settled: false,
        }
    }

    /// Group name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Members in registration order.
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Look up a member by id.
    pub fn member(&self, id: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.id == id)
    }

    /// Whether `id` is currently a member.
    pub fn contains(&self, id: &str) -> bool {
        self.member(id).is_some()
    }

    /// Current selection, if any member ever registered.
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Whether `id` is the current selection.
    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.as_deref() == Some(id)
    }

    /// Persistence mode of this group.
    pub fn persistence(&self) -> Persistence {
        self.persistence
    }

    /// Whether the selection was fixed by the user or by an adopted stored value.
    ///
    /// While a persisted group is not settled, each registration re-checks the store.
    pub fn is_settled(&self) -> bool {
        self.settled
    }

    /// Add a member if its id is unknown.
    ///
    /// Returns `true` when the member was inserted. The first member of a
    /// group with no selection becomes selected. Re-inserting a known id
    /// keeps the original label and position.
    pub fn insert_member(&mut self, member: Member) -> bool {
        if self.contains(&member.id) {
            return false;
        }
        if self.selected.is_none() {
            self.selected = Some(member.id.clone());
        }
        self.members.push(member);
        true
    }

    /// Remove a member, applying `policy` if it was selected.
    ///
    /// Returns the new selection when the policy moved it, `None` otherwise.
    pub fn remove_member(&mut self, id: &str, policy: DeregisterPolicy) -> Option<&str> {
        let pos = self.members.iter().position(|m| m.id == id)?;
        self.members.remove(pos);
        if !self.is_selected(id) {
            return None;
        }
        match policy {
            DeregisterPolicy::KeepStale => None,
            DeregisterPolicy::FirstRemaining => {
                let first = self.members.first()?;
                self.selected = Some(first.id.clone());
                self.selected.as_deref()
            }
        }
    }

    /// Select a current member.
    ///
    /// Returns `false` (and changes nothing) when `id` is not a member.
    /// Selecting marks the group as settled.
    pub fn set_selected(&mut self, id: &str) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.settled = true;
        if !self.is_selected(id) {
            self.selected = Some(id.to_string());
        }
        true
    }

    /// Adopt a stored selection if it names a current member.
    ///
    /// Returns `true` when the stored id matched a member (the group is then
    /// settled), regardless of whether the selection actually moved.
    pub fn adopt(&mut self, stored: &str) -> bool {
        if self.settled || !self.contains(stored) {
            return false;
        }
        self.set_selected(stored)
    }
}
