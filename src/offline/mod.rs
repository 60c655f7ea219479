//! Offline asset cache for the web shell.
//!
//! This module keeps a named cache generation of the shell's static assets:
//! - `install` pre-populates a fixed asset list (all-or-nothing)
//! - `activate` deletes every other generation
//! - `fetch` serves GET requests cache-first with network fallback, and
//!   falls back to the cached shell document for failed navigations
//!
//! Cached responses are never revalidated; bumping [`CACHE_GENERATION`] in a
//! new release is the only way to refresh them.

mod fetcher;
mod manager;
mod storage;
mod types;

pub use fetcher::{Fetcher, HttpFetcher};
pub use manager::{InstallReport, OfflineCache, WorkerState, CACHE_GENERATION, PRECACHE_ASSETS};
pub use storage::{CacheStorage, MemoryCacheStorage, SqliteCacheStorage};
pub use types::{FetchOutcome, Request, RequestMode, Response};
