//! Request and response types for the offline cache.

use reqwest::Method;
use url::Url;

/// How a request was initiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMode {
  /// A full-page navigation
  Navigate,
  /// Any sub-resource load
  #[default]
  Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
  pub method: Method,
  pub url: Url,
  pub mode: RequestMode,
}

impl Request {
  pub fn get(url: Url) -> Self {
    Self {
      method: Method::GET,
      url,
      mode: RequestMode::Other,
    }
  }

  pub fn navigate(url: Url) -> Self {
    Self {
      method: Method::GET,
      url,
      mode: RequestMode::Navigate,
    }
  }

  pub fn with_method(mut self, method: Method) -> Self {
    self.method = method;
    self
  }

  /// Exact-match key under which the response is cached.
  pub fn cache_key(&self) -> String {
    self.url.as_str().to_string()
  }
}

/// A network or cached response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
  pub status: u16,
  pub content_type: Option<String>,
  pub body: Vec<u8>,
}

impl Response {
  pub fn is_success(&self) -> bool {
    (200..300).contains(&self.status)
  }
}

/// Where a fetched response came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
  /// Served from the current cache generation
  Cached(Response),
  /// Fetched from the network and stored
  Network(Response),
  /// Network failed on a navigation; the cached shell document was served
  OfflineShell(Response),
  /// Not a GET request; left to the caller untouched
  Passthrough,
}

impl FetchOutcome {
  pub fn response(&self) -> Option<&Response> {
    match self {
      FetchOutcome::Cached(r) | FetchOutcome::Network(r) | FetchOutcome::OfflineShell(r) => Some(r),
      FetchOutcome::Passthrough => None,
    }
  }
}
