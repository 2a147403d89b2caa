// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Access to the host's string key/value storage.

use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// Key prefixes whose entries are considered disposable.
pub const DISPOSABLE_PREFIXES: [&str; 2] = ["temp_", "cache_"];

/// Default age after which a disposable entry is pruned.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(24 * 60 * 60);

/// Errors reported by a [`KeyValueStore`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached.
    #[error("key/value store unavailable: {0}")]
    Unavailable(String),
    /// The store refused the write.
    #[error("key/value store quota exceeded while writing '{key}'")]
    QuotaExceeded {
        /// The key being written.
        key: String,
    },
}

/// A best-effort string key/value store provided by the host.
pub trait KeyValueStore: Send {
    /// Lists every key.
    fn keys(&self) -> Result<Vec<String>, StoreError>;
    /// Reads a value.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    /// Writes a value.
    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;
    /// Removes a key, returning whether it existed.
    fn remove(&mut self, key: &str) -> Result<bool, StoreError>;
}

/// An in-process [`KeyValueStore`].
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.entries.keys().cloned().collect())
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_owned(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<bool, StoreError> {
        Ok(self.entries.remove(key).is_some())
    }
}

/// Removes disposable entries that are stale or unreadable.
///
/// An entry is disposable when its key starts with one of
/// [`DISPOSABLE_PREFIXES`]. It is removed when its value is not valid JSON, or
/// when it carries a numeric `timestamp` field (epoch milliseconds) older than
/// `stale_after`. Entries without a timestamp are kept.
///
/// Returns the number of removed keys.
pub fn prune_stale_entries(
    store: &mut dyn KeyValueStore,
    now_wall_ms: u64,
    stale_after: Duration,
) -> Result<usize, StoreError> {
    let max_age_ms = stale_after.as_millis() as u64;
    let mut removed = 0;

    for key in store.keys()? {
        if !DISPOSABLE_PREFIXES.iter().any(|p| key.starts_with(p)) {
            continue;
        }
        let Some(raw) = store.get(&key)? else {
            continue;
        };

        let stale = match serde_json::from_str::<serde_json::Value>(&raw) {
            Ok(value) => value
                .get("timestamp")
                .and_then(|t| t.as_f64())
                .map(|ts| now_wall_ms.saturating_sub(ts.max(0.0) as u64) > max_age_ms)
                .unwrap_or(false),
            Err(_) => true,
        };

        if stale && store.remove(&key)? {
            log::debug!("Store: pruned stale entry '{}'", key);
            removed += 1;
        }
    }

    Ok(removed)
}
