// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_selection --heading-base-level=0

//! Understory Selection: deterministic, `no_std` selection groups for UI.
//!
//! ## Overview
//!
//! A page often shows the same set of alternatives in many places: per-language code samples,
//! per-tool instructions, per-package-manager install commands.
//! This crate keeps every widget that shows a given set in agreement about which alternative is
//! selected, without the widgets knowing about each other, and optionally remembers the choice
//! across page loads.
//!
//! It does not render anything.
//! Widgets register their alternatives, subscribe to changes, and ask
//! [`Synchronizer::is_selected`](crate::synchronizer::Synchronizer::is_selected) when they draw.
//!
//! ## Concepts
//!
//! - [`Group`](crate::group::Group): a named set of mutually exclusive [`Member`](crate::types::Member)s
//!   with at most one selected. Usable on its own as the state of an isolated widget.
//! - [`Synchronizer`](crate::synchronizer::Synchronizer): the page-wide group table. Owns an
//!   [`EventBus`](crate::bus::EventBus) for change notifications and a
//!   [`SelectionStore`](crate::store::SelectionStore) for persisted choices.
//! - [`SelectionChanged`](crate::types::SelectionChanged): the broadcast payload.
//!
//! ## Workflow
//!
//! 1) Mount: each widget calls `register(group, id, label)` for its alternatives and
//!    `subscribe(group, callback)` to learn about changes made elsewhere.
//!    The first registered member is selected, unless the store remembers a choice that
//!    names a registered member, in which case that choice is adopted.
//! 2) Interact: on click, the widget calls `select(group, id)`. The choice is written to the
//!    store and every subscriber of the group is called before `select` returns.
//! 3) Render: `is_selected(group, id)` decides which panel is visible.
//! 4) Unmount: `deregister` and `unsubscribe`.
//!
//! ## Minimal example
//!
//! ```
//! use understory_selection::synchronizer::Synchronizer;
//!
//! let mut sync: Synchronizer = Synchronizer::default();
//! sync.register("lang-sample", "js", "JavaScript");
//! sync.register("lang-sample", "rs", "Rust");
//! assert!(sync.is_selected("lang-sample", "js"));
//!
//! sync.select("lang-sample", "rs").unwrap();
//! assert!(sync.is_selected("lang-sample", "rs"));
//! assert!(!sync.is_selected("lang-sample", "js"));
//! ```
//!
//! ## Threading
//!
//! Everything runs on the UI thread. There is no locking and no queuing: callbacks run
//! synchronously during `select`, and must only touch widget-local state.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod bus;
pub mod group;
pub mod store;
pub mod synchronizer;
pub mod types;
