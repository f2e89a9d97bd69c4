// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Typed site configuration: plugin options and navigation defaults.
//!
//! ## Overview
//!
//! Both structures are parsed from JSON and reject unknown keys, so a typo in
//! a site configuration is reported when the page context is built instead of
//! being silently ignored.
//!
//! ## Group formats
//!
//! [`PluginOptions`] accepts the two layouts found in existing sites:
//!
//! ```
//! use understory_code_switcher::config::PluginOptions;
//!
//! // Labelled: ids map to labels, in source order.
//! let labelled = PluginOptions::from_json(
//!     r#"{ "groups": { "lang": { "js": "JavaScript", "rs": "Rust" } } }"#,
//! ).unwrap();
//!
//! // Listed: ids only, labels come from `fullNames` or the capitalized id.
//! let listed = PluginOptions::from_json(
//!     r#"{ "groups": [["lang", ["js", "rs"]]], "fullNames": { "js": "JavaScript" } }"#,
//! ).unwrap();
//!
//! assert_eq!(labelled.group("lang").unwrap().label("js"), Some("JavaScript"));
//! assert_eq!(listed.group("lang").unwrap().label("js"), Some("JavaScript"));
//! assert_eq!(listed.group("lang").unwrap().label("rs"), Some("Rs"));
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::de::{Deserializer, MapAccess, Visitor};
use understory_selection::store::{MemoryStore, storage_key};
use understory_selection::types::Member;

/// Component name used when none is configured.
pub const DEFAULT_COMPONENT_NAME: &str = "CodeSwitcher";

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Malformed JSON, a wrong value type, or an unknown key.
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
    /// `componentName` was present but empty.
    #[error("`componentName` must not be empty")]
    EmptyComponentName,
    /// The listed group form named the same group twice.
    #[error("group `{0}` is defined more than once")]
    DuplicateGroup(String),
    /// A navigation default is not listed under its own category in the dictionary.
    #[error("navigation default `{value}` is not a `{category}` entry in the dictionary")]
    NavigationDefaultMismatch {
        /// Category key (`tool`, `packageManager`, `keyring`).
        category: &'static str,
        /// The configured default.
        value: String,
    },
}

/// Upper-case the first character: `"rust"` → `"Rust"`.
pub fn capitalize(id: &str) -> String {
    let mut chars = id.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Ordered id → label list for one group.
///
/// Order is significant: it is the tab order shown to the user.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LanguageMap(Vec<Member>);

impl LanguageMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `id` with `label`. A known id keeps its first label.
    pub fn push(&mut self, id: impl Into<String>, label: impl Into<String>) {
        let member = Member::new(id, label);
        if self.label(&member.id).is_none() {
            self.0.push(member);
        }
    }

    /// Build labels from bare ids, using `full_names` or the capitalized id.
    pub fn from_ids<'a>(
        ids: impl IntoIterator<Item = &'a str>,
        full_names: &BTreeMap<String, String>,
    ) -> Self {
        let mut map = Self::new();
        for id in ids {
            let label = full_names
                .get(id)
                .cloned()
                .unwrap_or_else(|| capitalize(id));
            map.push(id, label);
        }
        map
    }

    /// Label of `id`, if present.
    pub fn label(&self, id: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|m| m.id == id)
            .map(|m| m.label.as_str())
    }

    /// Ids in order.
    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.iter().map(|m| m.id.as_str())
    }

    /// Members in order.
    pub fn members(&self) -> &[Member] {
        &self.0
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LanguageMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (id, label) in iter {
            map.push(id, label);
        }
        map
    }
}

impl<'de> Deserialize<'de> for LanguageMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = LanguageMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of member ids to labels")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<LanguageMap, A::Error> {
                let mut map = LanguageMap::new();
                while let Some((id, label)) = access.next_entry::<String, String>()? {
                    if map.label(&id).is_some() {
                        return Err(serde::de::Error::custom(format!(
                            "duplicate member id `{id}`"
                        )));
                    }
                    map.push(id, label);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum GroupsRepr {
    Labelled(BTreeMap<String, LanguageMap>),
    Listed(Vec<(String, Vec<String>)>),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct RawOptions {
    component_name: Option<String>,
    groups: Option<GroupsRepr>,
    #[serde(default)]
    full_names: BTreeMap<String, String>,
}

/// Code-switcher plugin options.
///
/// Recognized keys: `componentName`, `groups`, `fullNames`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PluginOptions {
    component_name: String,
    groups: BTreeMap<String, LanguageMap>,
    full_names: BTreeMap<String, String>,
}

impl Default for PluginOptions {
    fn default() -> Self {
        Self {
            component_name: DEFAULT_COMPONENT_NAME.to_string(),
            groups: BTreeMap::new(),
            full_names: BTreeMap::new(),
        }
    }
}

impl PluginOptions {
    /// Parse options from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let raw: RawOptions = serde_json::from_str(json)?;
        Self::from_raw(raw)
    }

    /// Parse options from an already-decoded JSON value.
    ///
    /// `serde_json::Value` objects are sorted by key, so labelled groups come
    /// out in id order rather than source order. Prefer [`from_json`](Self::from_json)
    /// when tab order matters.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        let raw: RawOptions = serde_json::from_value(value)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawOptions) -> Result<Self, ConfigError> {
        let component_name = match raw.component_name {
            Some(name) if name.trim().is_empty() => return Err(ConfigError::EmptyComponentName),
            Some(name) => name,
            None => DEFAULT_COMPONENT_NAME.to_string(),
        };
        let groups = match raw.groups {
            None => BTreeMap::new(),
            Some(GroupsRepr::Labelled(groups)) => groups,
            Some(GroupsRepr::Listed(list)) => {
                let mut groups = BTreeMap::new();
                for (name, ids) in list {
                    if groups.contains_key(&name) {
                        return Err(ConfigError::DuplicateGroup(name));
                    }
                    let map = LanguageMap::from_ids(ids.iter().map(String::as_str), &raw.full_names);
                    groups.insert(name, map);
                }
                groups
            }
        };
        Ok(Self {
            component_name,
            groups,
            full_names: raw.full_names,
        })
    }

    /// Builder-style group definition.
    pub fn with_group(mut self, name: impl Into<String>, languages: LanguageMap) -> Self {
        self.groups.insert(name.into(), languages);
        self
    }

    /// Name under which the widget is registered with the host page.
    pub fn component_name(&self) -> &str {
        &self.component_name
    }

    /// Configured languages of group `name`.
    pub fn group(&self, name: &str) -> Option<&LanguageMap> {
        self.groups.get(name)
    }

    /// Display name overrides for bare ids.
    pub fn full_names(&self) -> &BTreeMap<String, String> {
        &self.full_names
    }
}

/// Navigation category a tab belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NavCategory {
    /// SDK, REST, client libraries.
    Tool,
    /// npm, yarn.
    PackageManager,
    /// Key management backends.
    Keyring,
}

impl NavCategory {
    /// All categories.
    pub const ALL: [Self; 3] = [Self::Tool, Self::PackageManager, Self::Keyring];

    /// Selection group name used for this category.
    pub const fn group_name(self) -> &'static str {
        match self {
            Self::Tool => "tool",
            Self::PackageManager => "packageManager",
            Self::Keyring => "keyring",
        }
    }
}

impl fmt::Display for NavCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.group_name())
    }
}

/// Site-wide navigation preferences.
///
/// Recognized keys: `tool`, `packageManager`, `keyring` (default selection per
/// category) and `dictionary` (tab name → category).
///
/// ```
/// use understory_code_switcher::config::{NavCategory, NavigationProps};
///
/// let nav = NavigationProps::from_json(
///     r#"{ "tool": "SDK", "dictionary": { "SDK": "tool", "REST": "tool", "NPM": "packageManager" } }"#,
/// ).unwrap();
/// assert_eq!(nav.category_of("REST"), Some(NavCategory::Tool));
/// assert_eq!(nav.default_for(NavCategory::Tool), Some("SDK"));
///
/// assert!(NavigationProps::from_json(r#"{ "tools": "SDK" }"#).is_err());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct NavigationProps {
    /// Preferred tool.
    pub tool: Option<String>,
    /// Preferred package manager.
    pub package_manager: Option<String>,
    /// Preferred keyring.
    pub keyring: Option<String>,
    /// Which category each known tab name belongs to.
    #[serde(default)]
    pub dictionary: BTreeMap<String, NavCategory>,
}

impl NavigationProps {
    /// Parse and validate navigation props from JSON.
    ///
    /// When a dictionary is given, every default must be listed in it under
    /// its own category.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let props: Self = serde_json::from_str(json)?;
        props.validate()?;
        Ok(props)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.dictionary.is_empty() {
            return Ok(());
        }
        for category in NavCategory::ALL {
            if let Some(value) = self.default_for(category)
                && self.category_of(value) != Some(category)
            {
                return Err(ConfigError::NavigationDefaultMismatch {
                    category: category.group_name(),
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Default selection for `category`.
    pub fn default_for(&self, category: NavCategory) -> Option<&str> {
        match category {
            NavCategory::Tool => self.tool.as_deref(),
            NavCategory::PackageManager => self.package_manager.as_deref(),
            NavCategory::Keyring => self.keyring.as_deref(),
        }
    }

    /// Category of a tab name, if the dictionary knows it.
    pub fn category_of(&self, tab: &str) -> Option<NavCategory> {
        self.dictionary.get(tab).copied()
    }

    /// Defaults as a read-only store keyed like persisted selections.
    ///
    /// Layered under the user's storage, these act as a remembered choice
    /// that the user has not made yet.
    pub fn defaults_store(&self, namespace: &str) -> MemoryStore {
        NavCategory::ALL
            .into_iter()
            .filter_map(|c| self.default_for(c).map(|v| (c, v)))
            .fold(MemoryStore::new(), |store, (c, v)| {
                store.with(storage_key(namespace, c.group_name()), v)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_empty() {
        let opts = PluginOptions::from_json("{}").unwrap();
        assert_eq!(opts, PluginOptions::default());
        assert_eq!(opts.component_name(), "CodeSwitcher");
        assert!(opts.group("anything").is_none());
    }

    #[test]
    fn labelled_groups_keep_source_order() {
        let opts = PluginOptions::from_json(
            r#"{ "groups": { "synchronized": { "julia": "Julia", "kotlin": "Kotlin", "perl": "Perl" } } }"#,
        )
        .unwrap();
        let ids: Vec<&str> = opts.group("synchronized").unwrap().ids().collect();
        assert_eq!(ids, ["julia", "kotlin", "perl"]);

        let opts = PluginOptions::from_json(r#"{ "groups": { "g": { "z": "Z", "a": "A" } } }"#)
            .unwrap();
        let ids: Vec<&str> = opts.group("g").unwrap().ids().collect();
        assert_eq!(ids, ["z", "a"]);
    }

    #[test]
    fn listed_groups_use_full_names_then_capitalize() {
        let opts = PluginOptions::from_json(
            r#"{
                "componentName": "CodeGroup",
                "groups": [["lang", ["javascript", "rust"]], ["pm", ["npm"]]],
                "fullNames": { "javascript": "JavaScript" }
            }"#,
        )
        .unwrap();
        assert_eq!(opts.component_name(), "CodeGroup");
        let lang = opts.group("lang").unwrap();
        assert_eq!(lang.label("javascript"), Some("JavaScript"));
        assert_eq!(lang.label("rust"), Some("Rust"));
        assert_eq!(opts.group("pm").unwrap().label("npm"), Some("Npm"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = PluginOptions::from_json(r#"{ "component": "X" }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
        assert!(err.to_string().contains("unknown field"));
    }

    #[test]
    fn structural_errors() {
        assert!(matches!(
            PluginOptions::from_json(r#"{ "componentName": "  " }"#),
            Err(ConfigError::EmptyComponentName)
        ));
        assert!(matches!(
            PluginOptions::from_json(r#"{ "groups": [["g", ["a"]], ["g", ["b"]]] }"#),
            Err(ConfigError::DuplicateGroup(name)) if name == "g"
        ));
        assert!(PluginOptions::from_json(r#"{ "groups": 3 }"#).is_err());
    }

    #[test]
    fn from_value_matches_from_json() {
        let value = serde_json::json!({ "groups": { "g": { "a": "A" } } });
        let a = PluginOptions::from_value(value).unwrap();
        let b = PluginOptions::from_json(r#"{ "groups": { "g": { "a": "A" } } }"#).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn capitalize_handles_edges() {
        assert_eq!(capitalize(""), "");
        assert_eq!(capitalize("js"), "Js");
        assert_eq!(capitalize("élan"), "Élan");
    }

    #[test]
    fn language_map_push_ignores_duplicates() {
        let map: LanguageMap = [("js", "JavaScript"), ("js", "JS"), ("rs", "Rust")]
            .into_iter()
            .collect();
        assert_eq!(map.len(), 2);
        assert_eq!(map.label("js"), Some("JavaScript"));
    }

    fn site_nav() -> &'static str {
        r#"{
            "tool": "SDK",
            "packageManager": "NPM",
            "keyring": "Keyring",
            "dictionary": {
                "SDK": "tool",
                "REST": "tool",
                "NPM": "packageManager",
                "YARN": "packageManager",
                "Keyring": "keyring",
                "Polkadot Extension": "keyring"
            }
        }"#
    }

    #[test]
    fn navigation_props_parse_and_lookup() {
        let nav = NavigationProps::from_json(site_nav()).unwrap();
        assert_eq!(nav.default_for(NavCategory::PackageManager), Some("NPM"));
        assert_eq!(
            nav.category_of("Polkadot Extension"),
            Some(NavCategory::Keyring)
        );
        assert_eq!(nav.category_of("Cargo"), None);
    }

    #[test]
    fn navigation_default_must_match_dictionary() {
        let err =
            NavigationProps::from_json(r#"{ "tool": "NPM", "dictionary": { "NPM": "packageManager" } }"#)
                .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::NavigationDefaultMismatch { category: "tool", .. }
        ));
        // Without a dictionary, defaults are taken as-is.
        assert!(NavigationProps::from_json(r#"{ "tool": "anything" }"#).is_ok());
        // Unknown category names are rejected by serde.
        assert!(NavigationProps::from_json(r#"{ "dictionary": { "X": "shell" } }"#).is_err());
    }

    #[test]
    fn defaults_store_uses_storage_keys() {
        let nav = NavigationProps::from_json(site_nav()).unwrap();
        let store = nav.defaults_store("ns");
        assert_eq!(store.get("ns@tool"), Some("SDK"));
        assert_eq!(store.get("ns@packageManager"), Some("NPM"));
        assert_eq!(store.get("ns@keyring"), Some("Keyring"));
        assert_eq!(store.len(), 3);
    }
}
