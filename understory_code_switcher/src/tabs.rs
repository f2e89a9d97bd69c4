// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tab groups whose items mount separately.
//!
//! ## Overview
//!
//! Unlike a [`CodeSwitcher`](crate::switcher::CodeSwitcher), which receives
//! all alternatives up front, a [`Tabs`] provider is mounted first and each
//! [`Tab`] registers itself with it. A tab mounted without a provider is a
//! page composition error and fails with [`SetupError::NotProvided`].
//!
//! A `Tabs` binds to one selection group: the explicit name given to
//! [`Tabs::mount`], else the navigation category of the first tab found in the
//! dictionary (so all "tool" tab groups on a page move together), else
//! `"tabs"`. A provider sitting on the `"tabs"` fallback moves to the category
//! group as soon as a tab from the dictionary mounts, taking its earlier tabs
//! along.
//!
//! ```
//! use understory_code_switcher::config::{NavigationProps, PluginOptions};
//! use understory_code_switcher::context::PageContext;
//! use understory_code_switcher::tabs::{Tab, TabData, Tabs};
//! use understory_selection::store::MemoryStore;
//!
//! let nav = NavigationProps::from_json(
//!     r#"{ "tool": "REST", "dictionary": { "SDK": "tool", "REST": "tool" } }"#,
//! ).unwrap();
//! let ctx = PageContext::new(PluginOptions::default(), nav, MemoryStore::new());
//!
//! let tabs = Tabs::mount(&ctx, None).unwrap();
//! let sdk = Tab::mount(Some(&tabs), TabData::new("SDK")).unwrap();
//! let rest = Tab::mount(Some(&tabs), TabData::new("REST")).unwrap();
//! assert_eq!(tabs.group().as_deref(), Some("tool"));
//! assert!(rest.is_active());
//! assert!(!sdk.is_active());
//!
//! assert!(Tab::mount(None, TabData::new("SDK")).is_err());
//! ```

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use understory_selection::synchronizer::SelectionError;

use crate::config::NavigationProps;
use crate::context::{PageContext, SetupError, Subscription, SyncHandle};
use crate::view::TabHeader;

/// Group name used when neither an explicit name nor a navigation category applies.
pub const DEFAULT_TABS_GROUP: &str = "tabs";

/// Data a [`Tab`] registers with its provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TabData {
    /// Tab name; also its member id and label.
    pub name: String,
}

impl TabData {
    /// Tab data for `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Identifier of a tab within its provider.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TabId(u32);

#[derive(Debug)]
struct TabsInner {
    sync: SyncHandle,
    navigation: Rc<NavigationProps>,
    explicit: Option<String>,
    group: RefCell<Option<String>>,
    // Whether `group` came from the explicit name or a navigation category.
    fixed: Cell<bool>,
    tabs: RefCell<Vec<(TabId, TabData)>>,
    next_id: Cell<u32>,
    dirty: Rc<Cell<bool>>,
    subscription: RefCell<Option<Subscription>>,
}

/// Tab provider. Cheap to clone; clones refer to the same provider.
#[derive(Clone, Debug)]
pub struct Tabs(Rc<TabsInner>);

impl Tabs {
    /// Mount a provider on `ctx`, optionally with an explicit group name.
    pub fn mount(ctx: &PageContext, name: Option<&str>) -> Result<Self, SetupError> {
        let sync = ctx.synchronizer("Tabs")?.clone();
        Ok(Self(Rc::new(TabsInner {
            sync,
            navigation: ctx.navigation_rc(),
            explicit: name.map(str::to_string),
            group: RefCell::new(None),
            fixed: Cell::new(false),
            tabs: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
            dirty: Rc::new(Cell::new(true)),
            subscription: RefCell::new(None),
        })))
    }

    /// Selection group, once the first tab has mounted.
    pub fn group(&self) -> Option<String> {
        self.0.group.borrow().clone()
    }

    /// Registered tabs in mount order.
    pub fn tabs(&self) -> Vec<TabData> {
        self.0.tabs.borrow().iter().map(|(_, d)| d.clone()).collect()
    }

    /// Name of the active tab.
    pub fn active(&self) -> Option<String> {
        let group = self.group()?;
        self.0.sync.selected(&group)
    }

    /// Activate the tab named `name`, on this provider and every provider sharing its group.
    pub fn set_active(&self, name: &str) -> Result<usize, SelectionError> {
        let group = self
            .group()
            .ok_or_else(|| SelectionError::UnknownGroup(self.pending_group_name()))?;
        self.0.sync.select(&group, name)
    }

    /// Whether the provider changed since the last call; clears the flag.
    pub fn take_dirty(&self) -> bool {
        self.0.dirty.replace(false)
    }

    /// Headers for the registered tabs.
    pub fn render(&self) -> Vec<TabHeader> {
        let group = self.group();
        self.0
            .tabs
            .borrow()
            .iter()
            .map(|(_, d)| TabHeader {
                id: d.name.clone(),
                label: d.name.clone(),
                active: group
                    .as_deref()
                    .is_some_and(|g| self.0.sync.is_selected(g, &d.name)),
            })
            .collect()
    }

    fn pending_group_name(&self) -> String {
        self.0
            .explicit
            .clone()
            .unwrap_or_else(|| DEFAULT_TABS_GROUP.to_string())
    }

    fn bind_group(&self, tab: &TabData) -> String {
        let current = self.group();
        if self.0.fixed.get()
            && let Some(group) = &current
        {
            return group.clone();
        }
        let (group, fixed) = match (&self.0.explicit, self.0.navigation.category_of(&tab.name)) {
            (Some(name), _) => (name.clone(), true),
            (None, Some(category)) => (category.group_name().to_string(), true),
            (None, None) => (DEFAULT_TABS_GROUP.to_string(), false),
        };
        match current {
            Some(current) if !fixed => return current,
            Some(current) => self.rebind(&current, &group),
            None => self.listen(&group),
        }
        self.0.fixed.set(fixed);
        *self.0.group.borrow_mut() = Some(group.clone());
        log::debug!("tabs bound to group `{group}`");
        group
    }

    fn listen(&self, group: &str) {
        let dirty = Rc::clone(&self.0.dirty);
        let subscription = self.0.sync.subscribe(group, move |_| dirty.set(true));
        let previous = self.0.subscription.borrow_mut().replace(subscription);
        drop(previous);
    }

    // Move the mounted tabs from the fallback group to `to`, keeping mount order.
    fn rebind(&self, from: &str, to: &str) {
        let names: Vec<String> = self.0.tabs.borrow().iter().map(|(_, d)| d.name.clone()).collect();
        for name in &names {
            self.0.sync.unmount_member(from, name);
        }
        self.listen(to);
        for name in &names {
            self.0.sync.mount_member(to, name, name);
        }
        log::debug!("tabs moved from `{from}` to `{to}`");
    }

    fn register(&self, data: TabData) -> TabId {
        let group = self.bind_group(&data);
        let id = TabId(self.0.next_id.get());
        self.0.next_id.set(id.0.wrapping_add(1));
        self.0.sync.mount_member(&group, &data.name, &data.name);
        self.0.tabs.borrow_mut().push((id, data));
        self.0.dirty.set(true);
        id
    }

    fn deregister(&self, id: TabId) {
        let removed = {
            let mut tabs = self.0.tabs.borrow_mut();
            tabs.iter()
                .position(|(t, _)| *t == id)
                .map(|pos| tabs.remove(pos).1)
        };
        if let (Some(data), Some(group)) = (removed, self.group()) {
            self.0.sync.unmount_member(&group, &data.name);
            self.0.dirty.set(true);
        }
    }
}

/// A mounted tab. Dropping it removes it from its provider.
#[derive(Debug)]
pub struct Tab {
    id: TabId,
    name: String,
    tabs: Tabs,
}

impl Tab {
    /// Mount a tab into `provider`.
    pub fn mount(provider: Option<&Tabs>, data: TabData) -> Result<Self, SetupError> {
        let tabs = provider.ok_or(SetupError::NotProvided {
            component: "Tab",
            provider: "Tabs",
        })?;
        let name = data.name.clone();
        let id = tabs.register(data);
        Ok(Self {
            id,
            name,
            tabs: tabs.clone(),
        })
    }

    /// Identifier within the provider.
    pub fn id(&self) -> TabId {
        self.id
    }

    /// Tab name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this tab's content should be shown.
    pub fn is_active(&self) -> bool {
        self.tabs
            .group()
            .is_some_and(|group| self.tabs.0.sync.is_selected(&group, &self.name))
    }
}

impl Drop for Tab {
    fn drop(&mut self) {
        self.tabs.deregister(self.id);
    }
}
