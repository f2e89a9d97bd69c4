// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Browser `localStorage` as a [`SelectionStore`].
//!
//! ## Feature
//!
//! Enable with `web_storage_adapter`.
//!
//! ## Notes
//!
//! Storage can be missing (no `window`, for example in a worker) or refused by
//! browser policy. Both cases surface as [`StoreError::Unavailable`], which the
//! synchronizer treats as "nothing stored".

use understory_selection::store::{SelectionStore, StoreError};
use web_sys::Storage;

/// Selection store backed by `window.localStorage`.
#[derive(Clone, Debug, Default)]
pub struct WebStorage {
    storage: Option<Storage>,
}

impl WebStorage {
    /// Use the current window's `localStorage`, if it is accessible.
    pub fn local() -> Self {
        let storage = web_sys::window().and_then(|w| w.local_storage().ok().flatten());
        if storage.is_none() {
            log::warn!("localStorage is not available; selections will not persist");
        }
        Self { storage }
    }

    /// Wrap an existing storage object (for example `sessionStorage`).
    pub fn from_storage(storage: Storage) -> Self {
        Self {
            storage: Some(storage),
        }
    }

    /// Whether a storage object is attached.
    pub fn is_available(&self) -> bool {
        self.storage.is_some()
    }
}

impl SelectionStore for WebStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        let storage = self.storage.as_ref().ok_or(StoreError::Unavailable)?;
        storage.get_item(key).map_err(|err| StoreError::Backend {
            key: key.to_string(),
            reason: format!("{err:?}"),
        })
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let storage = self.storage.as_ref().ok_or(StoreError::Unavailable)?;
        storage.set_item(key, value).map_err(|err| StoreError::Backend {
            key: key.to_string(),
            reason: format!("{err:?}"),
        })
    }
}
