// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The code switcher widget: one block of alternatives with a tab header.
//!
//! ## Languages
//!
//! A switcher's alternatives are resolved in this order:
//! 1) the explicit `languages` prop;
//! 2) the configured group with the same name as the switcher
//!    (see [`PluginOptions::group`](crate::config::PluginOptions::group));
//! 3) the names of the supplied slots, capitalized for display.
//!
//! Ending up with no alternatives is an error.
//!
//! ## Sharing
//!
//! Switchers with the same `name` share their selection through the page's
//! [`SyncHandle`], including across reloads. An `isolated` switcher keeps its
//! own selection and never reads or writes storage.
//!
//! ```
//! use understory_code_switcher::config::{NavigationProps, PluginOptions};
//! use understory_code_switcher::context::PageContext;
//! use understory_code_switcher::switcher::{CodeSwitcher, CodeSwitcherProps, Slots};
//! use understory_selection::store::MemoryStore;
//!
//! let ctx = PageContext::new(PluginOptions::default(), NavigationProps::default(), MemoryStore::new());
//! let slots: Slots = [("js", "console.log(1)"), ("rs", "println!(\"1\")")].into_iter().collect();
//!
//! let mut a = CodeSwitcher::mount(&ctx, CodeSwitcherProps::named("lang-sample"), slots.clone()).unwrap();
//! let b = CodeSwitcher::mount(&ctx, CodeSwitcherProps::named("lang-sample"), slots).unwrap();
//! assert!(b.is_selected("js"));
//!
//! a.switch_to("rs").unwrap();
//! assert!(b.is_selected("rs"));
//! assert!(b.take_dirty());
//! ```

use std::cell::Cell;
use std::rc::Rc;

use understory_selection::group::Group;
use understory_selection::synchronizer::SelectionError;
use understory_selection::types::{Member, Persistence};

use crate::config::{LanguageMap, PluginOptions, capitalize};
use crate::context::{PageContext, SetupError, Subscription, SyncHandle};
use crate::view::{PanelContent, SwitcherView, TabHeader, TabPanel};

/// Errors when mounting or driving a [`CodeSwitcher`].
#[derive(Debug, thiserror::Error)]
pub enum SwitcherError {
    /// No `languages` prop, no configured group, and no slots.
    #[error(
        "code switcher `{name}` has no languages: specify the `languages` prop or configure the `groups` option"
    )]
    NoLanguages {
        /// Switcher name.
        name: String,
    },
    /// The page has no synchronizer.
    #[error(transparent)]
    Setup(#[from] SetupError),
    /// Selection of an id the switcher does not show.
    #[error(transparent)]
    Selection(#[from] SelectionError),
}

/// Ordered slot name → content.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Slots(Vec<(String, String)>);

impl Slots {
    /// Create an empty slot set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the content of slot `name`, keeping its original position if it exists.
    pub fn insert(&mut self, name: impl Into<String>, content: impl Into<String>) {
        let name = name.into();
        let content = content.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some((_, c)) => *c = content,
            None => self.0.push((name, content)),
        }
    }

    /// Content of slot `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c.as_str())
    }

    /// Slot names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.iter().map(|(n, _)| n.as_str())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Slots {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut slots = Self::new();
        for (name, content) in iter {
            slots.insert(name, content);
        }
        slots
    }
}

/// Props of a [`CodeSwitcher`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeSwitcherProps {
    /// Group name; switchers with equal names stay in sync.
    pub name: String,
    /// Keep the selection local to this switcher.
    pub isolated: bool,
    /// Explicit alternatives, overriding configured groups and slot names.
    pub languages: Option<LanguageMap>,
}

impl Default for CodeSwitcherProps {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            isolated: false,
            languages: None,
        }
    }
}

impl CodeSwitcherProps {
    /// Props for a shared switcher named `name`.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builder-style `isolated` flag.
    pub fn isolated(mut self, isolated: bool) -> Self {
        self.isolated = isolated;
        self
    }

    /// Builder-style explicit languages.
    pub fn languages(mut self, languages: LanguageMap) -> Self {
        self.languages = Some(languages);
        self
    }
}

fn resolve_languages(props: &CodeSwitcherProps, options: &PluginOptions, slots: &Slots) -> LanguageMap {
    if let Some(languages) = &props.languages {
        return languages.clone();
    }
    if let Some(group) = options.group(&props.name) {
        return group.clone();
    }
    slots.names().map(|n| (n, capitalize(n))).collect()
}

#[derive(Debug)]
enum State {
    Isolated(Group),
    Shared {
        sync: SyncHandle,
        _subscription: Subscription,
    },
}

/// A mounted code switcher.
///
/// Dropping it releases its members and its subscription.
#[derive(Debug)]
pub struct CodeSwitcher {
    name: String,
    languages: LanguageMap,
    slots: Slots,
    state: State,
    dirty: Rc<Cell<bool>>,
}

impl CodeSwitcher {
    /// Mount a switcher on `ctx`.
    pub fn mount(ctx: &PageContext, props: CodeSwitcherProps, slots: Slots) -> Result<Self, SwitcherError> {
        let languages = resolve_languages(&props, ctx.options(), &slots);
        if languages.is_empty() {
            return Err(SwitcherError::NoLanguages { name: props.name });
        }
        let dirty = Rc::new(Cell::new(true));

        let state = if props.isolated {
            let mut group = Group::new(props.name.as_str(), Persistence::Transient);
            for m in languages.members() {
                group.insert_member(Member::new(m.id.as_str(), m.label.as_str()));
            }
            State::Isolated(group)
        } else {
            let sync = ctx.synchronizer("CodeSwitcher")?.clone();
            let d = Rc::clone(&dirty);
            let subscription = sync.subscribe(&props.name, move |_| d.set(true));
            for m in languages.members() {
                sync.mount_member(&props.name, &m.id, &m.label);
            }
            State::Shared {
                sync,
                _subscription: subscription,
            }
        };
        log::debug!(
            "mounted code switcher `{}` with {} languages{}",
            props.name,
            languages.len(),
            if props.isolated { " (isolated)" } else { "" }
        );

        Ok(Self {
            name: props.name,
            languages,
            slots,
            state,
            dirty,
        })
    }

    /// Group name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Alternatives shown by this switcher.
    pub fn languages(&self) -> &LanguageMap {
        &self.languages
    }

    /// Whether the selection is local to this switcher.
    pub fn is_isolated(&self) -> bool {
        matches!(self.state, State::Isolated(_))
    }

    /// Current selection.
    pub fn selected(&self) -> Option<String> {
        match &self.state {
            State::Isolated(group) => group.selected().map(str::to_string),
            State::Shared { sync, .. } => sync.selected(&self.name),
        }
    }

    /// Whether `id` is the current selection.
    pub fn is_selected(&self, id: &str) -> bool {
        match &self.state {
            State::Isolated(group) => group.is_selected(id),
            State::Shared { sync, .. } => sync.is_selected(&self.name, id),
        }
    }

    /// Handle a header click.
    pub fn switch_to(&mut self, id: &str) -> Result<(), SwitcherError> {
        if self.languages.label(id).is_none() {
            return Err(SelectionError::UnknownMember {
                group: self.name.clone(),
                member: id.to_string(),
            }
            .into());
        }
        match &mut self.state {
            State::Isolated(group) => {
                group.set_selected(id);
                self.dirty.set(true);
            }
            State::Shared { sync, .. } => {
                sync.select(&self.name, id)?;
            }
        }
        Ok(())
    }

    /// Whether the switcher changed since the last call; clears the flag.
    pub fn take_dirty(&self) -> bool {
        self.dirty.replace(false)
    }

    /// Build the render model.
    pub fn render(&self) -> SwitcherView {
        let mut view = SwitcherView::default();
        for m in self.languages.members() {
            let active = self.is_selected(&m.id);
            view.headers.push(TabHeader {
                id: m.id.clone(),
                label: m.label.clone(),
                active,
            });
            let content = match self.slots.get(&m.id) {
                Some(c) => PanelContent::Slot(c.to_string()),
                None => PanelContent::missing(&m.id),
            };
            view.panels.push(TabPanel {
                id: m.id.clone(),
                visible: active,
                content,
            });
        }
        view
    }
}

impl Drop for CodeSwitcher {
    fn drop(&mut self) {
        if let State::Shared { sync, .. } = &self.state {
            for id in self.languages.ids() {
                sync.unmount_member(&self.name, id);
            }
        }
    }
}
