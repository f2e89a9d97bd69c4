// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Persistence adapter for group selections.
//!
//! ## Overview
//!
//! A [`SelectionStore`] is a plain string key/value store. The
//! [`Synchronizer`](crate::synchronizer::Synchronizer) reads a group's stored
//! selection while members register and writes it on every explicit
//! selection, under the key produced by [`storage_key`].
//!
//! Store failures never reach widgets: the synchronizer logs them and carries
//! on as if nothing was stored.
//!
//! ## Provided stores
//!
//! - [`MemoryStore`]: in-memory map, useful for tests and server-side rendering.
//! - [`NoStore`]: storage that is never available (for example disabled by browser policy).
//! - [`FallbackStore`]: reads a primary store, then a read-only fallback.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::{String, ToString};

/// Errors reported by a [`SelectionStore`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The backing storage cannot be used at all.
    #[error("selection storage is unavailable")]
    Unavailable,
    /// The backend refused an operation on a specific key.
    #[error("storage backend failed for key `{key}`: {reason}")]
    Backend {
        /// Key involved in the failed operation.
        key: String,
        /// Backend-specific description.
        reason: String,
    },
}

/// Durable key/value storage for selected member ids.
pub trait SelectionStore {
    /// Read the value stored under `key`, if any.
    fn load(&self, key: &str) -> Result<Option<String>, StoreError>;
    /// Store `value` under `key`, replacing any previous value.
    fn save(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

impl<S: SelectionStore + ?Sized> SelectionStore for Box<S> {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).load(key)
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).save(key, value)
    }
}

/// Build the storage key for `group` under `namespace`: `"{namespace}@{group}"`.
///
/// ```
/// use understory_selection::store::storage_key;
/// assert_eq!(storage_key("code-switcher", "lang"), "code-switcher@lang");
/// ```
pub fn storage_key(namespace: &str, group: &str) -> String {
    format!("{namespace}@{group}")
}

/// In-memory store backed by an ordered map.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Direct read without the `Result` wrapper.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SelectionStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// A store that is never available.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoStore;

impl SelectionStore for NoStore {
    fn load(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable)
    }

    fn save(&mut self, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable)
    }
}

/// Reads `primary`, falling back to `fallback` when the primary has no value
/// or fails. Writes go to `primary` only.
///
/// Typical use: the primary is the user's browser storage and the fallback
/// holds site-wide defaults.
#[derive(Clone, Debug, Default)]
pub struct FallbackStore<P, F> {
    primary: P,
    fallback: F,
}

impl<P, F> FallbackStore<P, F> {
    /// Layer `primary` over `fallback`.
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }

    /// The writable store.
    pub fn primary(&self) -> &P {
        &self.primary
    }

    /// The read-only defaults.
    pub fn fallback(&self) -> &F {
        &self.fallback
    }
}

impl<P: SelectionStore, F: SelectionStore> SelectionStore for FallbackStore<P, F> {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self.primary.load(key) {
            Ok(Some(v)) => Ok(Some(v)),
            Ok(None) => self.fallback.load(key),
            Err(err) => {
                log::warn!("primary selection store failed for `{key}`: {err}; using fallback");
                self.fallback.load(key)
            }
        }
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.primary.save(key, value)
    }
}
