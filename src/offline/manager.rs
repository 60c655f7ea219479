//! Install / activate / fetch lifecycle for the offline cache.

use color_eyre::{eyre::eyre, Result};
use reqwest::Method;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};
use url::Url;

use super::fetcher::Fetcher;
use super::storage::CacheStorage;
use super::types::{FetchOutcome, Request, RequestMode, Response};

/// Name of the current cache generation. Bump on every release that
/// changes a cached asset.
pub const CACHE_GENERATION: &str = "tradetrackr-v1";

/// Shell document served for navigations when the network is down.
const SHELL_PATH: &str = "/index.html";

/// Assets stored at install time.
pub const PRECACHE_ASSETS: &[&str] = &[
  "/",
  "/index.html",
  "/manifest.json",
  "/src/css/styles.css",
  "/src/js/app.js",
  "/icons/icon-192.svg",
  "/icons/icon-512.svg",
];

/// Lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
  Parsed,
  Installing,
  /// Installed and ready; activation does not wait for older instances
  Installed,
  Activating,
  Activated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
  pub generation: String,
  pub assets: usize,
}

/// Offline cache over a storage backend and a network fetcher.
pub struct OfflineCache<S: CacheStorage, F: Fetcher> {
  origin: Url,
  generation: String,
  storage: Arc<S>,
  fetcher: F,
  state: Mutex<WorkerState>,
  claimed: AtomicBool,
}

impl<S: CacheStorage, F: Fetcher> OfflineCache<S, F> {
  /// Create a cache for assets served from `origin`.
  pub fn new(origin: Url, storage: S, fetcher: F) -> Self {
    Self {
      origin,
      generation: CACHE_GENERATION.to_string(),
      storage: Arc::new(storage),
      fetcher,
      state: Mutex::new(WorkerState::Parsed),
      claimed: AtomicBool::new(false),
    }
  }

  pub fn generation(&self) -> &str {
    &self.generation
  }

  pub fn origin(&self) -> &Url {
    &self.origin
  }

  pub fn fetcher(&self) -> &F {
    &self.fetcher
  }

  pub fn state(&self) -> WorkerState {
    self.state.lock().map(|s| *s).unwrap_or(WorkerState::Parsed)
  }

  /// Whether `activate` has taken control.
  pub fn is_controlling(&self) -> bool {
    self.claimed.load(Ordering::SeqCst)
  }

  /// Resolve an asset path against the origin.
  pub fn asset_url(&self, path: &str) -> Result<Url> {
    self
      .origin
      .join(path)
      .map_err(|e| eyre!("Invalid asset path {}: {}", path, e))
  }

  fn set_state(&self, next: WorkerState) -> Result<()> {
    let mut state = self
      .state
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;
    *state = next;
    Ok(())
  }

  /// Fetch every precache asset and store them in the current generation.
  ///
  /// All-or-nothing: a transport failure or a non-success status on any
  /// asset stores nothing and fails the install.
  pub async fn install(&self) -> Result<InstallReport> {
    self.set_state(WorkerState::Installing)?;

    match self.populate().await {
      Ok(assets) => {
        self.set_state(WorkerState::Installed)?;
        info!(generation = %self.generation, assets, "offline cache installed");
        Ok(InstallReport {
          generation: self.generation.clone(),
          assets,
        })
      }
      Err(e) => {
        self.set_state(WorkerState::Parsed)?;
        warn!(generation = %self.generation, error = %e, "offline cache install failed");
        Err(e)
      }
    }
  }

  async fn populate(&self) -> Result<usize> {
    self.storage.open(&self.generation)?;

    let requests = PRECACHE_ASSETS
      .iter()
      .map(|path| self.asset_url(path).map(Request::get))
      .collect::<Result<Vec<_>>>()?;

    let responses =
      futures::future::try_join_all(requests.iter().map(|request| self.fetch_asset(request)))
        .await?;

    let entries: Vec<(String, Response)> = requests
      .iter()
      .map(Request::cache_key)
      .zip(responses)
      .collect();
    self.storage.put_all(&self.generation, &entries)?;

    Ok(entries.len())
  }

  async fn fetch_asset(&self, request: &Request) -> Result<Response> {
    let response = self.fetcher.fetch(request).await?;
    if !response.is_success() {
      return Err(eyre!(
        "Asset {} returned status {}",
        request.url,
        response.status
      ));
    }
    Ok(response)
  }

  /// Delete every generation other than the current one and take control.
  /// Returns the names of the deleted generations.
  pub async fn activate(&self) -> Result<Vec<String>> {
    self.set_state(WorkerState::Activating)?;

    let mut deleted = Vec::new();
    for name in self.storage.generations()? {
      if name != self.generation {
        self.storage.delete(&name)?;
        deleted.push(name);
      }
    }

    self.claimed.store(true, Ordering::SeqCst);
    self.set_state(WorkerState::Activated)?;
    info!(generation = %self.generation, ?deleted, "offline cache activated");

    Ok(deleted)
  }

  /// Serve a request cache-first.
  pub async fn fetch(&self, request: &Request) -> Result<FetchOutcome> {
    if request.method != Method::GET {
      return Ok(FetchOutcome::Passthrough);
    }

    let key = request.cache_key();
    if let Some(cached) = self.storage.lookup(&self.generation, &key)? {
      debug!(url = %request.url, cached_at = %cached.cached_at, "cache hit");
      return Ok(FetchOutcome::Cached(cached.response));
    }

    match self.fetcher.fetch(request).await {
      Ok(response) => {
        // A failed write still hands back the response the network gave us
        match self.storage.put(&self.generation, &key, &response) {
          Ok(()) => {
            debug!(url = %request.url, status = response.status, "cached network response")
          }
          Err(e) => warn!(url = %request.url, error = %e, "failed to cache network response"),
        }
        Ok(FetchOutcome::Network(response))
      }
      Err(e) => {
        if request.mode == RequestMode::Navigate {
          let shell_key = self.asset_url(SHELL_PATH)?.to_string();
          if let Some(shell) = self.storage.lookup(&self.generation, &shell_key)? {
            warn!(url = %request.url, "network unavailable, serving offline shell");
            return Ok(FetchOutcome::OfflineShell(shell.response));
          }
        }
        Err(e)
      }
    }
  }
}
