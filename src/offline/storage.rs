//! Cache generation storage trait and implementations.

use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Mutex;

use super::types::Response;

/// A stored response.
#[derive(Debug, Clone)]
pub struct CachedResponse {
  pub response: Response,
  /// When the response was stored
  pub cached_at: DateTime<Utc>,
}

/// Trait for cache generation backends.
pub trait CacheStorage: Send + Sync {
  /// Create the generation if it does not exist.
  fn open(&self, generation: &str) -> Result<()>;

  /// Names of all existing generations.
  fn generations(&self) -> Result<Vec<String>>;

  /// Delete a generation and everything in it. Returns whether it existed.
  fn delete(&self, generation: &str) -> Result<bool>;

  /// Exact-match lookup within one generation.
  fn lookup(&self, generation: &str, key: &str) -> Result<Option<CachedResponse>>;

  /// Store one response, opening the generation if needed.
  fn put(&self, generation: &str, key: &str, response: &Response) -> Result<()>;

  /// Store several responses atomically.
  fn put_all(&self, generation: &str, entries: &[(String, Response)]) -> Result<()>;
}

/// In-memory cache storage.
#[derive(Debug, Default)]
pub struct MemoryCacheStorage {
  generations: Mutex<BTreeMap<String, HashMap<String, CachedResponse>>>,
}

impl MemoryCacheStorage {
  pub fn new() -> Self {
    Self::default()
  }
}

impl CacheStorage for MemoryCacheStorage {
  fn open(&self, generation: &str) -> Result<()> {
    let mut generations = self
      .generations
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    generations.entry(generation.to_string()).or_default();
    Ok(())
  }

  fn generations(&self) -> Result<Vec<String>> {
    let generations = self
      .generations
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    Ok(generations.keys().cloned().collect())
  }

  fn delete(&self, generation: &str) -> Result<bool> {
    let mut generations = self
      .generations
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    Ok(generations.remove(generation).is_some())
  }

  fn lookup(&self, generation: &str, key: &str) -> Result<Option<CachedResponse>> {
    let generations = self
      .generations
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    Ok(
      generations
        .get(generation)
        .and_then(|entries| entries.get(key))
        .cloned(),
    )
  }

  fn put(&self, generation: &str, key: &str, response: &Response) -> Result<()> {
    self.put_all(generation, &[(key.to_string(), response.clone())])
  }

  fn put_all(&self, generation: &str, entries: &[(String, Response)]) -> Result<()> {
    let mut generations = self
      .generations
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    let target = generations.entry(generation.to_string()).or_default();
    let cached_at = Utc::now();
    for (key, response) in entries {
      target.insert(
        key.clone(),
        CachedResponse {
          response: response.clone(),
          cached_at,
        },
      );
    }
    Ok(())
  }
}

/// SQLite-based cache storage.
pub struct SqliteCacheStorage {
  conn: Mutex<Connection>,
}

impl SqliteCacheStorage {
  /// Open (or create) the cache database at `path`.
  pub fn open_at(path: &Path) -> Result<Self> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
    }

    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;
    Self::from_connection(conn)
  }

  pub fn open_in_memory() -> Result<Self> {
    let conn = Connection::open_in_memory()
      .map_err(|e| eyre!("Failed to open in-memory cache database: {}", e))?;
    Self::from_connection(conn)
  }

  fn from_connection(conn: Connection) -> Result<Self> {
    conn
      .execute_batch(CACHE_SCHEMA)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;

    Ok(Self {
      conn: Mutex::new(conn),
    })
  }
}

const CACHE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS cache_generations (
    name TEXT PRIMARY KEY,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS cached_responses (
    generation TEXT NOT NULL,
    request_key TEXT NOT NULL,
    status INTEGER NOT NULL,
    content_type TEXT,
    body BLOB NOT NULL,
    cached_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (generation, request_key)
);
"#;

const INSERT_GENERATION: &str = "INSERT OR IGNORE INTO cache_generations (name) VALUES (?)";

const INSERT_RESPONSE: &str =
  "INSERT OR REPLACE INTO cached_responses (generation, request_key, status, content_type, body, cached_at)
   VALUES (?, ?, ?, ?, ?, datetime('now'))";

impl CacheStorage for SqliteCacheStorage {
  fn open(&self, generation: &str) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute(INSERT_GENERATION, params![generation])
      .map_err(|e| eyre!("Failed to open cache generation {}: {}", generation, e))?;
    Ok(())
  }

  fn generations(&self) -> Result<Vec<String>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let mut stmt = conn
      .prepare("SELECT name FROM cache_generations ORDER BY created_at, name")
      .map_err(|e| eyre!("Failed to prepare query: {}", e))?;

    let names = stmt
      .query_map([], |row| row.get(0))
      .map_err(|e| eyre!("Failed to list cache generations: {}", e))?
      .collect::<rusqlite::Result<Vec<String>>>()
      .map_err(|e| eyre!("Failed to read cache generation: {}", e))?;

    Ok(names)
  }

  fn delete(&self, generation: &str) -> Result<bool> {
    let mut conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let tx = conn
      .transaction()
      .map_err(|e| eyre!("Failed to begin transaction: {}", e))?;
    tx.execute(
      "DELETE FROM cached_responses WHERE generation = ?",
      params![generation],
    )
    .map_err(|e| eyre!("Failed to delete cached responses: {}", e))?;
    let removed = tx
      .execute(
        "DELETE FROM cache_generations WHERE name = ?",
        params![generation],
      )
      .map_err(|e| eyre!("Failed to delete cache generation: {}", e))?;
    tx.commit()
      .map_err(|e| eyre!("Failed to commit transaction: {}", e))?;

    Ok(removed > 0)
  }

  fn lookup(&self, generation: &str, key: &str) -> Result<Option<CachedResponse>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let row: Option<(u16, Option<String>, Vec<u8>, String)> = conn
      .query_row(
        "SELECT status, content_type, body, cached_at FROM cached_responses
         WHERE generation = ? AND request_key = ?",
        params![generation, key],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
      )
      .optional()
      .map_err(|e| eyre!("Failed to look up {}: {}", key, e))?;

    match row {
      Some((status, content_type, body, cached_at)) => Ok(Some(CachedResponse {
        response: Response {
          status,
          content_type,
          body,
        },
        cached_at: parse_datetime(&cached_at)?,
      })),
      None => Ok(None),
    }
  }

  fn put(&self, generation: &str, key: &str, response: &Response) -> Result<()> {
    self.put_all(generation, &[(key.to_string(), response.clone())])
  }

  fn put_all(&self, generation: &str, entries: &[(String, Response)]) -> Result<()> {
    let mut conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let tx = conn
      .transaction()
      .map_err(|e| eyre!("Failed to begin transaction: {}", e))?;
    tx.execute(INSERT_GENERATION, params![generation])
      .map_err(|e| eyre!("Failed to open cache generation {}: {}", generation, e))?;
    for (key, response) in entries {
      tx.execute(
        INSERT_RESPONSE,
        params![
          generation,
          key,
          response.status,
          response.content_type,
          response.body
        ],
      )
      .map_err(|e| eyre!("Failed to store {}: {}", key, e))?;
    }
    tx.commit()
      .map_err(|e| eyre!("Failed to commit transaction: {}", e))?;

    Ok(())
  }
}

/// Parse a datetime string from SQLite format.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
  // SQLite stores as "YYYY-MM-DD HH:MM:SS"
  chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
    .map(|dt| dt.and_utc())
    .map_err(|e| eyre!("Failed to parse datetime '{}': {}", s, e))
}
