// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Synchronizer implementation.
//!
//! ## Overview
//!
//! Owns the page's group table, a broadcast [`EventBus`], and a
//! [`SelectionStore`]. Widgets register their members on mount, deregister on
//! unmount, select on user interaction and read with
//! [`Synchronizer::is_selected`] when rendering.
//!
//! ## Registration
//!
//! - The first member of a group becomes its selection.
//! - For [`Persisted`](Persistence::Persisted) groups, every registration re-reads the
//!   store until a stored id matches a registered member; that id is then adopted
//!   once, even if it was registered after other members.
//! - Registering a known id is a no-op on the member list.
//!
//! ## Selection
//!
//! [`Synchronizer::select`] writes the store (persisted groups only) and then
//! calls every subscriber of the group before returning. Subscribers must not
//! call back into the synchronizer; they should only update widget-local state.
//!
//! Owners that share the synchronizer behind a `RefCell` use the `*_deferred`
//! variants instead. These apply the change and return the [`SelectionChanged`]
//! event, which the owner publishes on its own bus once its borrow is released,
//! so callbacks can read the synchronizer again.
//!
//! ## Example
//!
//! ```
//! use understory_selection::store::{MemoryStore, storage_key};
//! use understory_selection::synchronizer::{SyncConfig, Synchronizer};
//!
//! let config = SyncConfig::default();
//! let store = MemoryStore::new().with(storage_key(&config.namespace, "tool"), "REST");
//! let mut sync = Synchronizer::new(store, config);
//!
//! assert_eq!(sync.register("tool", "SDK", "SDK"), "SDK");
//! // The stored value wins as soon as it names a registered member.
//! assert_eq!(sync.register("tool", "REST", "REST"), "REST");
//! assert!(sync.is_selected("tool", "REST"));
//! ```

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};

use crate::bus::EventBus;
use crate::group::Group;
use crate::store::{MemoryStore, SelectionStore, storage_key};
use crate::types::{DeregisterPolicy, Member, Persistence, SelectionChanged, SubscriptionId};

/// Default storage namespace, shared with the original browser plugin so
/// existing saved choices keep working.
pub const DEFAULT_NAMESPACE: &str = "vuepress-plugin-code-switcher";

/// Errors from [`Synchronizer::select`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    /// No member was ever registered under this group name.
    #[error("unknown selection group `{0}`")]
    UnknownGroup(String),
    /// The group exists but `member` is not currently registered in it.
    #[error("`{member}` is not a member of group `{group}`")]
    UnknownMember {
        /// Group name.
        group: String,
        /// Requested member id.
        member: String,
    },
}

/// Synchronizer policies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncConfig {
    /// Prefix for storage keys; see [`storage_key`].
    pub namespace: String,
    /// Persistence mode for groups created implicitly by registration.
    pub persistence: Persistence,
    /// What to do when the selected member is deregistered.
    pub deregister_policy: DeregisterPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            persistence: Persistence::Persisted,
            deregister_policy: DeregisterPolicy::KeepStale,
        }
    }
}

/// Shared selection state for every widget on a page.
///
/// ## Usage
///
/// - Construct one per page render with [`Synchronizer::new`] and hand it to
///   widgets through your toolkit's context mechanism.
/// - Optionally call [`Synchronizer::declare`] to give a group a persistence
///   mode other than [`SyncConfig::persistence`].
/// - Widgets call [`Synchronizer::register`] / [`Synchronizer::deregister`]
///   on mount/unmount, [`Synchronizer::subscribe`] to be told about changes,
///   and [`Synchronizer::select`] on user interaction.
pub struct Synchronizer<S = MemoryStore> {
    groups: BTreeMap<String, Group>,
    bus: EventBus<SelectionChanged>,
    store: S,
    config: SyncConfig,
}

impl<S> core::fmt::Debug for Synchronizer<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Synchronizer")
            .field("groups", &self.groups.len())
            .field("bus", &self.bus)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for Synchronizer<MemoryStore> {
    fn default() -> Self {
        Self::new(MemoryStore::new(), SyncConfig::default())
    }
}

impl<S: SelectionStore> Synchronizer<S> {
    /// Create a synchronizer over `store`.
    pub fn new(store: S, config: SyncConfig) -> Self {
        Self {
            groups: BTreeMap::new(),
            bus: EventBus::new(),
            store,
            config,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// The backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Look up a group by name.
    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.get(name)
    }

    /// Iterate over all groups in name order.
    pub fn groups(&self) -> impl Iterator<Item = &Group> + '_ {
        self.groups.values()
    }

    /// Create `name` with an explicit persistence mode.
    ///
    /// Has no effect if the group already exists.
    pub fn declare(&mut self, name: &str, persistence: Persistence) {
        if !self.groups.contains_key(name) {
            self.groups
                .insert(name.to_string(), Group::new(name, persistence));
        }
    }

    /// Add `member_id` to `group` and return the group's resulting selection.
    ///
    /// A change of selection is published to the group's subscribers.
    pub fn register(&mut self, group: &str, member_id: &str, label: &str) -> String {
        let (selected, changed) = self.register_deferred(group, member_id, label);
        if let Some(event) = changed {
            self.publish(&event);
        }
        selected
    }

    /// Like [`Synchronizer::register`], but returns the change instead of publishing it.
    ///
    /// For owners that deliver events on their own bus after releasing their
    /// borrow of the synchronizer.
    pub fn register_deferred(
        &mut self,
        group: &str,
        member_id: &str,
        label: &str,
    ) -> (String, Option<SelectionChanged>) {
        let persistence = self.config.persistence;
        let g = self
            .groups
            .entry(group.to_string())
            .or_insert_with(|| Group::new(group, persistence));
        let before = g.selected().map(ToString::to_string);
        if g.insert_member(Member::new(member_id, label)) {
            log::debug!("registered `{member_id}` in group `{group}`");
        }

        if g.persistence() == Persistence::Persisted && !g.is_settled() {
            let key = storage_key(&self.config.namespace, group);
            match self.store.load(&key) {
                Ok(Some(stored)) => {
                    if g.adopt(&stored) {
                        log::debug!("group `{group}` adopted stored selection `{stored}`");
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    log::warn!("could not read stored selection for `{group}`: {err}");
                }
            }
        }

        let after = g.selected().unwrap_or(member_id).to_string();
        let changed = (before.as_deref() != Some(after.as_str())).then(|| SelectionChanged {
            group: group.to_string(),
            selected: after.clone(),
        });
        (after, changed)
    }

    /// Remove `member_id` from `group`.
    ///
    /// Returns `false` if the group or member was unknown. When the selected
    /// member is removed, [`SyncConfig::deregister_policy`] decides the new
    /// selection; a moved selection is broadcast but not persisted.
    pub fn deregister(&mut self, group: &str, member_id: &str) -> bool {
        let (known, changed) = self.deregister_deferred(group, member_id);
        if let Some(event) = changed {
            self.publish(&event);
        }
        known
    }

    /// Like [`Synchronizer::deregister`], but returns the change instead of publishing it.
    pub fn deregister_deferred(
        &mut self,
        group: &str,
        member_id: &str,
    ) -> (bool, Option<SelectionChanged>) {
        let policy = self.config.deregister_policy;
        let Some(g) = self.groups.get_mut(group) else {
            return (false, None);
        };
        if !g.contains(member_id) {
            return (false, None);
        }
        let moved = g.remove_member(member_id, policy).map(|next| SelectionChanged {
            group: group.to_string(),
            selected: next.to_string(),
        });
        log::debug!("deregistered `{member_id}` from group `{group}`");
        (true, moved)
    }

    /// Select `member_id` in `group`, persist it, and notify subscribers.
    ///
    /// Returns the number of subscribers notified. Transient groups are
    /// broadcast too; only the store write is skipped.
    pub fn select(&mut self, group: &str, member_id: &str) -> Result<usize, SelectionError> {
        let event = self.select_deferred(group, member_id)?;
        Ok(self.publish(&event))
    }

    /// Like [`Synchronizer::select`], but returns the change instead of publishing it.
    ///
    /// The store is written before this returns.
    pub fn select_deferred(
        &mut self,
        group: &str,
        member_id: &str,
    ) -> Result<SelectionChanged, SelectionError> {
        let g = self
            .groups
            .get_mut(group)
            .ok_or_else(|| SelectionError::UnknownGroup(group.to_string()))?;
        if !g.set_selected(member_id) {
            return Err(SelectionError::UnknownMember {
                group: group.to_string(),
                member: member_id.to_string(),
            });
        }
        log::debug!("group `{group}` selected `{member_id}`");
        if g.persistence() == Persistence::Persisted {
            let key = storage_key(&self.config.namespace, group);
            if let Err(err) = self.store.save(&key, member_id) {
                log::warn!("could not persist selection for `{group}`: {err}");
            }
        }
        Ok(SelectionChanged {
            group: group.to_string(),
            selected: member_id.to_string(),
        })
    }

    /// Current selection of `group`.
    pub fn selected(&self, group: &str) -> Option<&str> {
        self.groups.get(group).and_then(Group::selected)
    }

    /// Whether `member_id` is the current selection of `group`.
    pub fn is_selected(&self, group: &str, member_id: &str) -> bool {
        self.groups
            .get(group)
            .is_some_and(|g| g.is_selected(member_id))
    }

    /// Call `callback` whenever the selection of `group` changes.
    ///
    /// The group does not need to exist yet.
    pub fn subscribe(
        &mut self,
        group: &str,
        callback: impl FnMut(&SelectionChanged) + 'static,
    ) -> SubscriptionId {
        self.bus.subscribe(group, callback)
    }

    /// Stop a subscription. Returns `false` for stale handles.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    fn publish(&mut self, event: &SelectionChanged) -> usize {
        self.bus.publish(&event.group, event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::NoStore;
    use alloc::rc::Rc;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    fn memory() -> Synchronizer {
        Synchronizer::default()
    }

    fn listen<S: SelectionStore>(
        sync: &mut Synchronizer<S>,
        group: &str,
    ) -> Rc<RefCell<Vec<String>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = log.clone();
        sync.subscribe(group, move |e: &SelectionChanged| {
            l.borrow_mut().push(e.selected.clone());
        });
        log
    }

    fn stored(value: &str, group: &str) -> MemoryStore {
        MemoryStore::new().with(storage_key(DEFAULT_NAMESPACE, group), value)
    }

    #[test]
    fn nothing_selected_before_registration() {
        let sync = memory();
        assert!(!sync.is_selected("lang-sample", "js"));
        assert_eq!(sync.selected("lang-sample"), None);
    }

    #[test]
    fn first_registrant_wins_and_later_ones_do_not_change_it() {
        let mut sync = memory();
        assert_eq!(sync.register("lang-sample", "js", "JavaScript"), "js");
        assert_eq!(sync.register("lang-sample", "rs", "Rust"), "js");
        assert_eq!(sync.register("lang-sample", "py", "Python"), "js");
        assert!(sync.is_selected("lang-sample", "js"));
        assert!(!sync.is_selected("lang-sample", "rs"));
    }

    #[test]
    fn duplicate_registration_is_idempotent() {
        let mut sync = memory();
        sync.register("g", "a", "A");
        sync.register("g", "b", "B");
        sync.select("g", "b").unwrap();
        assert_eq!(sync.register("g", "a", "A"), "b");
        assert_eq!(sync.group("g").map(|g| g.members().len()), Some(2));
    }

    #[test]
    fn select_notifies_every_subscriber_and_persists() {
        let mut sync = memory();
        let w1 = listen(&mut sync, "lang-sample");
        let w2 = listen(&mut sync, "lang-sample");
        let other = listen(&mut sync, "tool");
        sync.register("lang-sample", "js", "JavaScript");
        sync.register("lang-sample", "rs", "Rust");

        assert_eq!(sync.select("lang-sample", "rs"), Ok(2));
        assert!(sync.is_selected("lang-sample", "rs"));
        assert!(!sync.is_selected("lang-sample", "js"));
        // The initial selection was broadcast too.
        assert_eq!(*w1.borrow(), vec!["js".to_string(), "rs".to_string()]);
        assert_eq!(*w2.borrow(), *w1.borrow());
        assert!(other.borrow().is_empty());
        assert_eq!(
            sync.store()
                .get(&storage_key(DEFAULT_NAMESPACE, "lang-sample")),
            Some("rs")
        );
    }

    #[test]
    fn select_rejects_unknown_group_and_member() {
        let mut sync = memory();
        assert_eq!(
            sync.select("nope", "x"),
            Err(SelectionError::UnknownGroup("nope".to_string()))
        );
        sync.register("g", "a", "A");
        assert_eq!(
            sync.select("g", "x"),
            Err(SelectionError::UnknownMember {
                group: "g".to_string(),
                member: "x".to_string()
            })
        );
        assert!(sync.is_selected("g", "a"));
    }

    #[test]
    fn stored_value_adopted_when_registered_first() {
        let mut sync = Synchronizer::new(stored("SDK", "tool"), SyncConfig::default());
        assert_eq!(sync.register("tool", "SDK", "SDK"), "SDK");
        assert_eq!(sync.register("tool", "REST", "REST"), "SDK");
        assert!(sync.group("tool").is_some_and(Group::is_settled));
    }

    #[test]
    fn stored_value_adopted_when_registered_second() {
        let mut sync = Synchronizer::new(stored("REST", "tool"), SyncConfig::default());
        let events = listen(&mut sync, "tool");
        assert_eq!(sync.register("tool", "SDK", "SDK"), "SDK");
        assert_eq!(sync.register("tool", "REST", "REST"), "REST");
        assert!(sync.is_selected("tool", "REST"));
        assert!(!sync.is_selected("tool", "SDK"));
        assert_eq!(*events.borrow(), vec!["SDK".to_string(), "REST".to_string()]);
    }

    #[test]
    fn stored_value_not_adopted_after_user_choice() {
        let mut sync = Synchronizer::new(stored("REST", "tool"), SyncConfig::default());
        sync.register("tool", "SDK", "SDK");
        sync.register("tool", "JS", "JS");
        sync.select("tool", "JS").unwrap();
        // The store now holds "JS", and a late "REST" registrant does not win.
        assert_eq!(sync.register("tool", "REST", "REST"), "JS");
    }

    #[test]
    fn unknown_stored_value_is_ignored() {
        let mut sync = Synchronizer::new(stored("cobol", "lang"), SyncConfig::default());
        assert_eq!(sync.register("lang", "js", "JavaScript"), "js");
        assert_eq!(sync.register("lang", "rs", "Rust"), "js");
    }

    #[test]
    fn unavailable_store_falls_back_to_first_registrant() {
        let mut sync = Synchronizer::new(NoStore, SyncConfig::default());
        assert_eq!(sync.register("tool", "SDK", "SDK"), "SDK");
        assert_eq!(sync.register("tool", "REST", "REST"), "SDK");
        assert_eq!(sync.select("tool", "REST"), Ok(0));
        assert!(sync.is_selected("tool", "REST"));
    }

    #[test]
    fn transient_groups_ignore_store() {
        let store = stored("rs", "lang");
        let mut sync = Synchronizer::new(store, SyncConfig::default());
        sync.declare("lang", Persistence::Transient);
        sync.register("lang", "js", "JavaScript");
        assert_eq!(sync.register("lang", "rs", "Rust"), "js");
        sync.select("lang", "js").unwrap();
        // Still the seeded value: transient selections are never written.
        assert_eq!(
            sync.store().get(&storage_key(DEFAULT_NAMESPACE, "lang")),
            Some("rs")
        );
    }

    #[test]
    fn transient_groups_still_broadcast() {
        let mut sync = memory();
        sync.declare("lang", Persistence::Transient);
        sync.register("lang", "js", "JavaScript");
        sync.register("lang", "rs", "Rust");
        let events = listen(&mut sync, "lang");
        assert_eq!(sync.select("lang", "rs"), Ok(1));
        assert_eq!(*events.borrow(), vec!["rs".to_string()]);
        assert!(sync.store().is_empty());
    }

    #[test]
    fn deferred_operations_do_not_publish() {
        let mut sync = Synchronizer::new(stored("REST", "tool"), SyncConfig::default());
        let events = listen(&mut sync, "tool");
        let (selected, changed) = sync.register_deferred("tool", "SDK", "SDK");
        assert_eq!(selected, "SDK");
        assert_eq!(
            changed,
            Some(SelectionChanged {
                group: "tool".to_string(),
                selected: "SDK".to_string()
            })
        );
        let (_, changed) = sync.register_deferred("tool", "SDK", "SDK");
        assert_eq!(changed, None);
        let event = sync.select_deferred("tool", "SDK").unwrap();
        assert_eq!(event.selected, "SDK");
        assert_eq!(sync.deregister_deferred("tool", "SDK"), (true, None));
        assert!(events.borrow().is_empty());
        // The store was still written.
        assert_eq!(
            sync.store().get(&storage_key(DEFAULT_NAMESPACE, "tool")),
            Some("SDK")
        );
    }

    #[test]
    fn deregister_keeps_stale_selection_by_default() {
        let mut sync = memory();
        sync.register("g", "a", "A");
        sync.register("g", "b", "B");
        assert!(sync.deregister("g", "a"));
        assert!(!sync.deregister("g", "a"));
        assert!(!sync.deregister("missing", "a"));
        assert_eq!(sync.selected("g"), Some("a"));
    }

    #[test]
    fn deregister_first_remaining_policy_broadcasts() {
        let config = SyncConfig {
            deregister_policy: DeregisterPolicy::FirstRemaining,
            ..SyncConfig::default()
        };
        let mut sync = Synchronizer::new(MemoryStore::new(), config);
        sync.register("g", "a", "A");
        sync.register("g", "b", "B");
        let events = listen(&mut sync, "g");
        sync.deregister("g", "a");
        assert_eq!(sync.selected("g"), Some("b"));
        assert_eq!(*events.borrow(), vec!["b".to_string()]);
        // Automatic fallback is not a user choice and is not persisted.
        assert!(sync.store().is_empty());
    }

    #[test]
    fn unsubscribed_widgets_are_not_notified() {
        let mut sync = memory();
        sync.register("g", "a", "A");
        sync.register("g", "b", "B");
        let log = Rc::new(RefCell::new(0_u32));
        let l = log.clone();
        let id = sync.subscribe("g", move |_: &SelectionChanged| *l.borrow_mut() += 1);
        assert!(sync.unsubscribe(id));
        assert_eq!(sync.select("g", "b"), Ok(0));
        assert_eq!(*log.borrow(), 0);
    }

    #[test]
    fn independent_synchronizers_do_not_share_state() {
        let mut a = memory();
        let mut b = memory();
        a.register("g", "x", "X");
        a.register("g", "y", "Y");
        b.register("g", "x", "X");
        b.register("g", "y", "Y");
        a.select("g", "y").unwrap();
        assert!(a.is_selected("g", "y"));
        assert!(b.is_selected("g", "x"));
    }
}
