// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Adapters to host environments.
//!
//! Enabled via feature flags so the default build has no platform dependencies.

#[cfg(feature = "web_storage_adapter")]
pub mod web_storage;
