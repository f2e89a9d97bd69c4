// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Page context: the per-page container widgets are mounted against.
//!
//! ## Overview
//!
//! A [`PageContext`] is created once per page render and passed to every
//! widget constructor. It carries the [`PluginOptions`], the
//! [`NavigationProps`], and (unless [`detached`](PageContext::detached)) a
//! [`SyncHandle`] to the page's shared [`Synchronizer`].
//!
//! Widgets that need shared selection fail fast with
//! [`SetupError::NotProvided`] when the context has no synchronizer; that is a
//! page composition mistake, not something to recover from at runtime.
//!
//! ## Storage layering
//!
//! The synchronizer's store is the caller's store (for example browser
//! storage) layered over the navigation defaults, so a site-wide
//! `"tool": "SDK"` behaves like a remembered choice until the user picks
//! something else.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use understory_selection::bus::EventBus;
use understory_selection::group::Group;
use understory_selection::store::{FallbackStore, MemoryStore, SelectionStore};
use understory_selection::synchronizer::{SelectionError, SyncConfig, Synchronizer};
use understory_selection::types::{Member, SelectionChanged, SubscriptionId};

use crate::config::{NavigationProps, PluginOptions};

/// Store used by page synchronizers: user storage over navigation defaults.
pub type PageStore = FallbackStore<Box<dyn SelectionStore>, MemoryStore>;

/// Synchronizer type shared by the widgets of one page.
pub type PageSynchronizer = Synchronizer<PageStore>;

/// Errors in how a page was put together.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SetupError {
    /// A widget was mounted without the provider it depends on.
    #[error("`{component}` was used outside of a `{provider}` provider")]
    NotProvided {
        /// The widget being mounted.
        component: &'static str,
        /// The missing provider.
        provider: &'static str,
    },
}

#[derive(Debug)]
struct Shared {
    sync: RefCell<PageSynchronizer>,
    // The page's subscribers live here rather than in the synchronizer, so a
    // broadcast holds no borrow of `sync` while callbacks run.
    bus: RefCell<EventBus<SelectionChanged>>,
    // Mount count per (group, member id); several widgets may show the same member.
    mounts: RefCell<BTreeMap<(String, String), usize>>,
}

/// Cloneable handle to a page's [`Synchronizer`].
///
/// Adds mount counting on top of the synchronizer: a member id shown by two
/// widgets stays registered until both have unmounted.
///
/// ## Callbacks
///
/// Subscribers are called with no borrow of the synchronizer or of the bus
/// held. A callback may read the selection through the handle, drop
/// [`Subscription`]s, and unmount members, and each of these takes effect
/// immediately. A subscription added during a broadcast first hears the next
/// event. A callback that selects again publishes a nested event, which skips
/// that callback itself.
#[derive(Clone, Debug)]
pub struct SyncHandle(Rc<Shared>);

impl SyncHandle {
    /// Wrap a synchronizer.
    pub fn new(sync: PageSynchronizer) -> Self {
        Self(Rc::new(Shared {
            sync: RefCell::new(sync),
            bus: RefCell::new(EventBus::new()),
            mounts: RefCell::new(BTreeMap::new()),
        }))
    }

    /// Register a member for a mounting widget and return the group's selection.
    pub fn mount_member(&self, group: &str, id: &str, label: &str) -> String {
        *self
            .0
            .mounts
            .borrow_mut()
            .entry((group.to_string(), id.to_string()))
            .or_insert(0) += 1;
        let (selected, changed) = self.0.sync.borrow_mut().register_deferred(group, id, label);
        if let Some(event) = changed {
            self.publish(&event);
        }
        selected
    }

    /// Release a member for an unmounting widget.
    ///
    /// The member is deregistered once no mounted widget shows it.
    pub fn unmount_member(&self, group: &str, id: &str) {
        let key = (group.to_string(), id.to_string());
        let last = {
            let mut mounts = self.0.mounts.borrow_mut();
            match mounts.get_mut(&key) {
                Some(n) if *n > 1 => {
                    *n -= 1;
                    false
                }
                Some(_) => {
                    mounts.remove(&key);
                    true
                }
                None => false,
            }
        };
        if !last {
            return;
        }
        let (_, changed) = self.0.sync.borrow_mut().deregister_deferred(group, id);
        if let Some(event) = changed {
            self.publish(&event);
        }
    }

    /// Select `id` in `group`; see [`Synchronizer::select`].
    pub fn select(&self, group: &str, id: &str) -> Result<usize, SelectionError> {
        let event = self.0.sync.borrow_mut().select_deferred(group, id)?;
        Ok(self.publish(&event))
    }

    /// Whether `id` is the selection of `group`.
    pub fn is_selected(&self, group: &str, id: &str) -> bool {
        self.0.sync.borrow().is_selected(group, id)
    }

    /// Current selection of `group`.
    pub fn selected(&self, group: &str) -> Option<String> {
        self.0.sync.borrow().selected(group).map(str::to_string)
    }

    /// Members currently registered in `group`.
    pub fn members(&self, group: &str) -> Vec<Member> {
        self.0
            .sync
            .borrow()
            .group(group)
            .map(|g| g.members().to_vec())
            .unwrap_or_default()
    }

    /// Snapshot of `group`.
    pub fn group(&self, name: &str) -> Option<Group> {
        self.0.sync.borrow().group(name).cloned()
    }

    /// Number of live subscriptions for `group`.
    pub fn subscribers(&self, group: &str) -> usize {
        self.0.bus.borrow().subscribers(group)
    }

    /// Subscribe to changes of `group`; the returned guard unsubscribes on drop.
    pub fn subscribe(
        &self,
        group: &str,
        callback: impl FnMut(&SelectionChanged) + 'static,
    ) -> Subscription {
        let id = self.0.bus.borrow_mut().subscribe(group, callback);
        Subscription {
            id,
            shared: Rc::downgrade(&self.0),
        }
    }

    fn publish(&self, event: &SelectionChanged) -> usize {
        let ids = self.0.bus.borrow().subscriptions(&event.group);
        let mut delivered = 0;
        for id in ids {
            // Skips subscriptions ended by an earlier callback, and a callback
            // already running further up the stack.
            let taken = self.0.bus.borrow_mut().take_callback(id);
            let Some(mut callback) = taken else {
                continue;
            };
            callback(event);
            delivered += 1;
            let ended = self.0.bus.borrow_mut().restore_callback(id, callback);
            drop(ended);
        }
        delivered
    }
}

/// Live subscription; unsubscribes when dropped.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    shared: Weak<Shared>,
}

impl Subscription {
    /// Underlying bus handle.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(shared) = self.shared.upgrade() else {
            return;
        };
        let removed = shared.bus.borrow_mut().remove(self.id);
        drop(removed);
    }
}

/// Everything a widget needs from its page.
#[derive(Clone, Debug)]
pub struct PageContext {
    sync: Option<SyncHandle>,
    options: Rc<PluginOptions>,
    navigation: Rc<NavigationProps>,
}

impl PageContext {
    /// Context with a fresh synchronizer over `store` and default policies.
    pub fn new(
        options: PluginOptions,
        navigation: NavigationProps,
        store: impl SelectionStore + 'static,
    ) -> Self {
        Self::with_config(options, navigation, store, SyncConfig::default())
    }

    /// Context with a fresh synchronizer over `store` and explicit policies.
    pub fn with_config(
        options: PluginOptions,
        navigation: NavigationProps,
        store: impl SelectionStore + 'static,
        config: SyncConfig,
    ) -> Self {
        let defaults = navigation.defaults_store(&config.namespace);
        let store: Box<dyn SelectionStore> = Box::new(store);
        let sync = Synchronizer::new(FallbackStore::new(store, defaults), config);
        log::debug!(
            "page context created for component `{}`",
            options.component_name()
        );
        Self {
            sync: Some(SyncHandle::new(sync)),
            options: Rc::new(options),
            navigation: Rc::new(navigation),
        }
    }

    /// Context without a synchronizer; only isolated widgets can mount on it.
    pub fn detached(options: PluginOptions, navigation: NavigationProps) -> Self {
        Self {
            sync: None,
            options: Rc::new(options),
            navigation: Rc::new(navigation),
        }
    }

    /// The page synchronizer, or [`SetupError::NotProvided`] naming `component`.
    pub fn synchronizer(&self, component: &'static str) -> Result<&SyncHandle, SetupError> {
        self.sync.as_ref().ok_or(SetupError::NotProvided {
            component,
            provider: "PageContext synchronizer",
        })
    }

    /// Plugin options.
    pub fn options(&self) -> &PluginOptions {
        &self.options
    }

    /// Navigation props.
    pub fn navigation(&self) -> &NavigationProps {
        &self.navigation
    }

    /// Shared navigation props, for widgets that outlive a borrow of the context.
    pub fn navigation_rc(&self) -> Rc<NavigationProps> {
        Rc::clone(&self.navigation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use understory_selection::store::NoStore;

    fn ctx() -> PageContext {
        PageContext::new(
            PluginOptions::default(),
            NavigationProps::default(),
            MemoryStore::new(),
        )
    }

    #[test]
    fn detached_context_fails_fast() {
        let ctx = PageContext::detached(PluginOptions::default(), NavigationProps::default());
        assert_eq!(
            ctx.synchronizer("CodeSwitcher").unwrap_err(),
            SetupError::NotProvided {
                component: "CodeSwitcher",
                provider: "PageContext synchronizer"
            }
        );
    }

    #[test]
    fn shared_members_stay_until_last_unmount() {
        let ctx = ctx();
        let sync = ctx.synchronizer("test").unwrap();
        sync.mount_member("lang", "js", "JavaScript");
        sync.mount_member("lang", "rs", "Rust");
        sync.mount_member("lang", "js", "JavaScript");
        sync.unmount_member("lang", "js");
        assert_eq!(sync.members("lang").len(), 2);
        assert!(sync.select("lang", "js").is_ok());
        sync.unmount_member("lang", "js");
        assert_eq!(sync.members("lang").len(), 1);
        // Unmounting an unknown member is harmless.
        sync.unmount_member("lang", "py");
    }

    #[test]
    fn subscription_guard_unsubscribes_on_drop() {
        let ctx = ctx();
        let sync = ctx.synchronizer("test").unwrap();
        sync.mount_member("g", "a", "A");
        sync.mount_member("g", "b", "B");
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let sub = sync.subscribe("g", move |_| h.set(h.get() + 1));
        assert_eq!(sync.select("g", "b"), Ok(1));
        drop(sub);
        assert_eq!(sync.select("g", "a"), Ok(0));
        assert_eq!(hits.get(), 1);
        assert_eq!(sync.group("g").map(|g| g.members().len()), Some(2));
        assert_eq!(sync.subscribers("g"), 0);
    }

    #[test]
    fn callbacks_can_read_the_new_selection() {
        let ctx = ctx();
        let sync = ctx.synchronizer("test").unwrap();
        sync.mount_member("g", "a", "A");
        sync.mount_member("g", "b", "B");
        let seen = Rc::new(Cell::new(false));
        let (s, h) = (seen.clone(), sync.clone());
        let _sub = sync.subscribe("g", move |_| s.set(h.is_selected("g", "b")));
        assert_eq!(sync.select("g", "b"), Ok(1));
        assert!(seen.get());
    }

    #[test]
    fn subscription_dropped_by_its_own_callback_is_removed() {
        let ctx = ctx();
        let sync = ctx.synchronizer("test").unwrap();
        sync.mount_member("g", "a", "A");
        sync.mount_member("g", "b", "B");
        let guard: Rc<RefCell<Option<Subscription>>> = Rc::default();
        let hits = Rc::new(Cell::new(0));
        let (g, h) = (guard.clone(), hits.clone());
        let sub = sync.subscribe("g", move |_| {
            h.set(h.get() + 1);
            g.borrow_mut().take();
        });
        *guard.borrow_mut() = Some(sub);

        assert_eq!(sync.select("g", "b"), Ok(1));
        assert_eq!(sync.subscribers("g"), 0);
        assert_eq!(sync.select("g", "a"), Ok(0));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn members_released_during_a_broadcast_are_deregistered() {
        let ctx = ctx();
        let sync = ctx.synchronizer("test").unwrap();
        sync.mount_member("g", "a", "A");
        sync.mount_member("g", "b", "B");
        let h = sync.clone();
        let sub = sync.subscribe("g", move |e| {
            if e.selected == "b" {
                h.unmount_member("g", "a");
            }
        });
        assert_eq!(sync.select("g", "b"), Ok(1));
        let ids: Vec<String> = sync.members("g").into_iter().map(|m| m.id).collect();
        assert_eq!(ids, ["b"]);
        drop(sub);
    }

    #[test]
    fn subscribers_added_during_a_broadcast_hear_the_next_event() {
        let ctx = ctx();
        let sync = ctx.synchronizer("test").unwrap();
        sync.mount_member("g", "a", "A");
        sync.mount_member("g", "b", "B");
        let late_hits = Rc::new(Cell::new(0));
        let late: Rc<RefCell<Option<Subscription>>> = Rc::default();
        let (h, l, lh) = (sync.clone(), late.clone(), late_hits.clone());
        let sub = sync.subscribe("g", move |_| {
            if l.borrow().is_none() {
                let lh = lh.clone();
                let s = h.subscribe("g", move |_| lh.set(lh.get() + 1));
                *l.borrow_mut() = Some(s);
            }
        });
        assert_eq!(sync.select("g", "b"), Ok(1));
        assert_eq!(late_hits.get(), 0);
        assert_eq!(sync.select("g", "a"), Ok(2));
        assert_eq!(late_hits.get(), 1);
        drop(sub);
        late.borrow_mut().take();
        assert_eq!(sync.subscribers("g"), 0);
    }

    #[test]
    fn navigation_defaults_seed_selection_without_user_storage() {
        let nav = NavigationProps::from_json(
            r#"{ "tool": "REST", "dictionary": { "SDK": "tool", "REST": "tool" } }"#,
        )
        .unwrap();
        let ctx = PageContext::new(PluginOptions::default(), nav, NoStore);
        let sync = ctx.synchronizer("test").unwrap();
        assert_eq!(sync.mount_member("tool", "SDK", "SDK"), "SDK");
        assert_eq!(sync.mount_member("tool", "REST", "REST"), "REST");
    }

    #[test]
    fn user_storage_beats_navigation_defaults() {
        let nav = NavigationProps::from_json(r#"{ "tool": "SDK" }"#).unwrap();
        let store =
            MemoryStore::new().with("vuepress-plugin-code-switcher@tool", "REST");
        let ctx = PageContext::new(PluginOptions::default(), nav, store);
        let sync = ctx.synchronizer("test").unwrap();
        sync.mount_member("tool", "SDK", "SDK");
        assert_eq!(sync.mount_member("tool", "REST", "REST"), "REST");
    }
}
