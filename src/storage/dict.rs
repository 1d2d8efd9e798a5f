//! Thread-Safe Dictionary
//!
//! A sharded hash map from byte-string keys to byte-string values.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                           Dict                              │
//! │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐            │
//! │  │ Shard 0 │ │ Shard 1 │ │ Shard 2 │ │ Shard N │            │
//! │  │ RwLock  │ │ RwLock  │ │ RwLock  │ │ RwLock  │            │
//! │  │ HashMap │ │ HashMap │ │ HashMap │ │ HashMap │            │
//! │  └─────────┘ └─────────┘ └─────────┘ └─────────┘            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Keys are distributed across shards by hash. Writers to one shard are
//! serialized by its lock; writers to different shards do not contend.

use super::KeyValueStore;
use bytes::Bytes;
use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::{PoisonError, RwLock};

/// Number of shards.
const NUM_SHARDS: usize = 16;

/// Sharded byte-string dictionary.
pub struct Dict {
    shards: Vec<RwLock<HashMap<Bytes, Bytes>>>,
}

impl std::fmt::Debug for Dict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dict")
            .field("shards", &self.shards.len())
            .field("len", &self.len())
            .finish()
    }
}

impl Default for Dict {
    fn default() -> Self {
        Self::new()
    }
}

impl Dict {
    pub fn new() -> Self {
        Self {
            shards: (0..NUM_SHARDS).map(|_| RwLock::new(HashMap::new())).collect(),
        }
    }

    #[inline]
    fn shard(&self, key: &[u8]) -> &RwLock<HashMap<Bytes, Bytes>> {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        &self.shards[(hasher.finish() as usize) % NUM_SHARDS]
    }

    /// Returns the value for `key`, if present.
    pub fn get(&self, key: &[u8]) -> Option<Bytes> {
        let data = self
            .shard(key)
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        data.get(key).cloned()
    }

    /// Sets `key` to `value`.
    ///
    /// Returns `true` if a new key was created, `false` if an existing key
    /// was overwritten.
    pub fn set(&self, key: Bytes, value: Bytes) -> bool {
        let mut data = self
            .shard(&key)
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        data.insert(key, value).is_none()
    }

    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.shard(key)
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|s| s.read().unwrap_or_else(PoisonError::into_inner).len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for Dict {
    fn get(&self, key: &[u8]) -> Option<Bytes> {
        Dict::get(self, key)
    }

    fn set(&self, key: Bytes, value: Bytes) {
        Dict::set(self, key, value);
    }

    fn len(&self) -> usize {
        Dict::len(self)
    }
}
