// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_code_switcher --heading-base-level=0

//! Understory Code Switcher: synchronized tabbed code blocks and tab groups.
//!
//! ## Overview
//!
//! Documentation pages often show the same example in several languages or for several tools.
//! This crate provides the widget state behind such blocks, on top of
//! [`understory_selection`]:
//!
//! - [`CodeSwitcher`](crate::switcher::CodeSwitcher): a block with all alternatives known up front
//!   (from props, from configured groups, or from its slots).
//! - [`Tabs`](crate::tabs::Tabs) / [`Tab`](crate::tabs::Tab): a provider whose items mount one by one.
//!
//! Widgets that share a group name show the same alternative. Picking one in any of them switches
//! all of them and is remembered across page loads, unless the widget is isolated.
//!
//! It does not draw. Widgets produce render models ([`view`](crate::view)) that a toolkit maps
//! onto its own elements, and a `take_dirty` flag that tells the toolkit when to redraw.
//!
//! ## Setup
//!
//! 1) Parse [`PluginOptions`](crate::config::PluginOptions) and
//!    [`NavigationProps`](crate::config::NavigationProps) from the site configuration.
//!    Unknown keys are errors.
//! 2) Build one [`PageContext`](crate::context::PageContext) per page with a
//!    [`SelectionStore`](understory_selection::store::SelectionStore)
//!    (for example `adapters::web_storage::WebStorage` with the `web_storage_adapter` feature).
//! 3) Mount widgets against the context. Mounting a shared widget on a context without a
//!    synchronizer fails immediately with [`SetupError`](crate::context::SetupError).
//!
//! ## Example
//!
//! ```
//! use understory_code_switcher::config::{NavigationProps, PluginOptions};
//! use understory_code_switcher::context::PageContext;
//! use understory_code_switcher::switcher::{CodeSwitcher, CodeSwitcherProps, Slots};
//! use understory_selection::store::MemoryStore;
//!
//! let options = PluginOptions::from_json(
//!     r#"{ "groups": { "lang-sample": { "js": "JavaScript", "rs": "Rust" } } }"#,
//! ).unwrap();
//! let ctx = PageContext::new(options, NavigationProps::default(), MemoryStore::new());
//!
//! let slots: Slots = [("js", "<pre>let x = 1;</pre>"), ("rs", "<pre>let x = 1;</pre>")]
//!     .into_iter()
//!     .collect();
//! let mut block = CodeSwitcher::mount(&ctx, CodeSwitcherProps::named("lang-sample"), slots).unwrap();
//! block.switch_to("rs").unwrap();
//!
//! let view = block.render();
//! assert_eq!(view.active_header().map(|h| h.label.as_str()), Some("Rust"));
//! ```

pub mod adapters;
pub mod config;
pub mod context;
pub mod switcher;
pub mod tabs;
pub mod view;
