//!  Persistence is organized through a small key-value interface, [KeyValueStore].
//!  The basic idea is:
//!   - Every key holds one whole text value. Writing a key replaces the value entirely.
//!   - [file_store::FileStore] keeps one file per key inside the application directory.
//!   - [memory::MemoryStore] keeps values in memory, for embedding and tests.

pub mod file_store;
pub mod memory;

use std::ops::DerefMut;

use anyhow::Result;
#[cfg(test)]
use mockall::automock;

/// Interface for abstracting durable storage of values.
#[cfg_attr(test, automock)]
pub trait KeyValueStore {
    /// Returns the value stored under `key` or `None` if nothing was ever stored.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrites the value stored under `key`.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

impl<T: DerefMut> KeyValueStore for T
where
    T::Target: KeyValueStore,
{
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}
