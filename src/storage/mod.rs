//! Storage Module
//!
//! The key-value store that stateful commands (such as a future `GET`/`SET`
//! pair) read and write. No built-in command uses it yet; the server does
//! not instantiate one.
//!
//! ## Contract
//!
//! - Keys and values are byte strings, owned by the store.
//! - Keys are unique; setting an existing key replaces its value.
//! - No ordering is guaranteed.
//! - Implementations shared between connections must serialize mutations.
//!
//! ## Example
//!
//! ```
//! use emberkv::storage::{Dict, KeyValueStore};
//! use bytes::Bytes;
//!
//! let dict = Dict::new();
//! dict.set(Bytes::from("name"), Bytes::from("ember"));
//! assert_eq!(dict.get(b"name"), Some(Bytes::from("ember")));
//! assert_eq!(dict.get(b"missing"), None);
//! ```

pub mod dict;

pub use dict::Dict;

use bytes::Bytes;

/// Mapping from byte-string keys to byte-string values.
pub trait KeyValueStore: Send + Sync {
    /// Returns a copy of the value stored under `key`.
    fn get(&self, key: &[u8]) -> Option<Bytes>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: Bytes, value: Bytes);

    /// Number of stored keys.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
