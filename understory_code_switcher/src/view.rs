// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render models produced by the widgets.
//!
//! Toolkits map these onto their own elements. [`SwitcherView::to_html`] is a
//! small static renderer for server-side output and tests.

/// One clickable header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TabHeader {
    /// Member id.
    pub id: String,
    /// Display label.
    pub label: String,
    /// Whether this header is the current selection.
    pub active: bool,
}

/// Content of a panel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PanelContent {
    /// Content supplied for the member.
    Slot(String),
    /// No content was supplied; carries the placeholder text.
    Missing(String),
}

impl PanelContent {
    /// Placeholder for a member without content.
    pub fn missing(id: &str) -> Self {
        Self::Missing(format!("Did not find a slot with name {id}."))
    }
}

/// One content panel; only the selected one is visible.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TabPanel {
    /// Member id.
    pub id: String,
    /// Whether the panel is shown.
    pub visible: bool,
    /// Panel body.
    pub content: PanelContent,
}

/// Full render model of a code switcher.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SwitcherView {
    /// Headers in display order.
    pub headers: Vec<TabHeader>,
    /// Panels in display order.
    pub panels: Vec<TabPanel>,
}

impl SwitcherView {
    /// The visible panel, if any.
    pub fn visible_panel(&self) -> Option<&TabPanel> {
        self.panels.iter().find(|p| p.visible)
    }

    /// The active header, if any.
    pub fn active_header(&self) -> Option<&TabHeader> {
        self.headers.iter().find(|h| h.active)
    }

    /// Render as HTML.
    ///
    /// Labels and placeholders are escaped; slot content is trusted markup.
    pub fn to_html(&self) -> String {
        let mut out = String::from(r#"<div class="code-switcher"><div class="tab-header"><ul>"#);
        for h in &self.headers {
            let class = if h.active { "tab-header active" } else { "tab-header" };
            out.push_str(&format!(
                r#"<li class="{class}" data-id="{}">{}</li>"#,
                escape(&h.id),
                escape(&h.label)
            ));
        }
        out.push_str("</ul></div>");
        for p in &self.panels {
            let style = if p.visible { "" } else { r#" style="display: none;""# };
            out.push_str(&format!(r#"<div class="tab-content"{style}>"#));
            match &p.content {
                PanelContent::Slot(html) => out.push_str(html),
                PanelContent::Missing(text) => {
                    out.push_str(&format!("<div>{}</div>", escape(text)));
                }
            }
            out.push_str("</div>");
        }
        out.push_str("</div>");
        out
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
