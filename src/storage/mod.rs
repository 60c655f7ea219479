//! Key-value persistence backends.
//!
//! Everything the app persists is a string value under a fixed string key:
//! the document JSON, the PIN digest and the session flag. Durable values go
//! to SQLite; process-scoped values (the session) live in memory.

mod sqlite;

pub use sqlite::SqliteStorage;

use color_eyre::{eyre::eyre, Result};
use std::collections::HashMap;
use std::sync::Mutex;

/// Key under which the whole document is stored.
pub const DOCUMENT_KEY: &str = "tt_data_v1";
/// Key under which the PIN digest is stored.
pub const PIN_DIGEST_KEY: &str = "tt_pin_hash_v1";
/// Key under which the session flag is stored.
pub const SESSION_KEY: &str = "tt_auth_v1";

/// Trait for string key-value backends.
pub trait KeyValueStore: Send + Sync {
  /// Read the value stored under `key`.
  fn get(&self, key: &str) -> Result<Option<String>>;

  /// Overwrite the value stored under `key`.
  fn set(&self, key: &str, value: &str) -> Result<()>;

  /// Remove `key`. Removing a missing key is not an error.
  fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory storage, dropped with the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
  values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
  pub fn new() -> Self {
    Self::default()
  }
}

impl KeyValueStore for MemoryStorage {
  fn get(&self, key: &str) -> Result<Option<String>> {
    let values = self
      .values
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    Ok(values.get(key).cloned())
  }

  fn set(&self, key: &str, value: &str) -> Result<()> {
    let mut values = self
      .values
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    values.insert(key.to_string(), value.to_string());
    Ok(())
  }

  fn remove(&self, key: &str) -> Result<()> {
    let mut values = self
      .values
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    values.remove(key);
    Ok(())
  }
}
