// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Persisted tab groups.
//!
//! Simulates two page loads sharing one store: the first load uses the
//! navigation default (`SDK`), the user picks `REST`, and the second load
//! comes back on `REST` even though it is mounted second.
//!
//! Run:
//! - `cargo run -p understory_demos --example persisted_tabs`

use std::cell::RefCell;
use std::rc::Rc;

use simplelog::{Config, LevelFilter, SimpleLogger};
use understory_code_switcher::config::{NavigationProps, PluginOptions};
use understory_code_switcher::context::PageContext;
use understory_code_switcher::tabs::{Tab, TabData, Tabs};
use understory_selection::store::{MemoryStore, SelectionStore, StoreError};

/// Store shared across simulated page loads.
#[derive(Clone, Default)]
struct SharedStore(Rc<RefCell<MemoryStore>>);

impl SelectionStore for SharedStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.0.borrow().load(key)
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.0.borrow_mut().save(key, value)
    }
}

const NAVIGATION: &str = r#"{
    "tool": "SDK",
    "packageManager": "NPM",
    "dictionary": { "SDK": "tool", "REST": "tool", "NPM": "packageManager", "YARN": "packageManager" }
}"#;

fn load_page(store: &SharedStore) -> Result<(PageContext, Tabs, Vec<Tab>), Box<dyn std::error::Error>> {
    let nav = NavigationProps::from_json(NAVIGATION)?;
    let ctx = PageContext::new(PluginOptions::default(), nav, store.clone());
    let tabs = Tabs::mount(&ctx, None)?;
    let mounted = ["SDK", "REST"]
        .into_iter()
        .map(|name| Tab::mount(Some(&tabs), TabData::new(name)))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((ctx, tabs, mounted))
}

fn print_tabs(title: &str, tabs: &Tabs) {
    println!("== {title} ==");
    for h in tabs.render() {
        println!("  [{}] {}", if h.active { "x" } else { " " }, h.label);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = SimpleLogger::init(LevelFilter::Debug, Config::default());
    let store = SharedStore::default();

    let (_ctx, tabs, _mounted) = load_page(&store)?;
    print_tabs("First load", &tabs);
    tabs.set_active("REST")?;
    print_tabs("After picking REST", &tabs);

    let (_ctx, tabs, _mounted) = load_page(&store)?;
    print_tabs("Second load", &tabs);
    Ok(())
}
