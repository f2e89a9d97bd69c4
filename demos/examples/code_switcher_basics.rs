// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Code switcher basics.
//!
//! Mounts two shared switchers and one isolated switcher with the same name,
//! switches one shared switcher, and prints what each would render.
//!
//! Run:
//! - `cargo run -p understory_demos --example code_switcher_basics`

use simplelog::{Config, LevelFilter, SimpleLogger};
use understory_code_switcher::config::{NavigationProps, PluginOptions};
use understory_code_switcher::context::PageContext;
use understory_code_switcher::switcher::{CodeSwitcher, CodeSwitcherProps, Slots};
use understory_selection::store::MemoryStore;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = SimpleLogger::init(LevelFilter::Debug, Config::default());

    let options = PluginOptions::from_json(
        r#"{ "groups": { "lang-sample": { "js": "JavaScript", "rs": "Rust", "py": "Python" } } }"#,
    )?;
    let ctx = PageContext::new(options, NavigationProps::default(), MemoryStore::new());

    // No Python sample: that panel renders a placeholder.
    let slots: Slots = [
        ("js", "<pre>console.log(\"hi\")</pre>"),
        ("rs", "<pre>println!(\"hi\");</pre>"),
    ]
    .into_iter()
    .collect();

    let mut top = CodeSwitcher::mount(&ctx, CodeSwitcherProps::named("lang-sample"), slots.clone())?;
    let bottom = CodeSwitcher::mount(&ctx, CodeSwitcherProps::named("lang-sample"), slots.clone())?;
    let isolated = CodeSwitcher::mount(
        &ctx,
        CodeSwitcherProps::named("lang-sample").isolated(true),
        slots,
    )?;

    println!("== Initial ==");
    for (label, w) in [("top", &top), ("bottom", &bottom), ("isolated", &isolated)] {
        println!("  {label:<9} selected={:?}", w.selected());
    }

    top.switch_to("py")?;

    println!("== After selecting Python in `top` ==");
    for (label, w) in [("top", &top), ("bottom", &bottom), ("isolated", &isolated)] {
        println!(
            "  {label:<9} selected={:?} redraw={}",
            w.selected(),
            w.take_dirty()
        );
    }
    println!("== bottom as HTML ==");
    println!("  {}", bottom.render().to_html());
    Ok(())
}
