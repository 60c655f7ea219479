//! Network access for the offline cache.

use color_eyre::{eyre::eyre, Result};
use reqwest::header::CONTENT_TYPE;
use std::future::Future;

use super::types::{Request, Response};

/// Performs network requests.
///
/// Any HTTP response (including error statuses) is `Ok`; only transport
/// failures are `Err`.
pub trait Fetcher: Send + Sync {
  fn fetch(&self, request: &Request) -> impl Future<Output = Result<Response>> + Send;
}

/// Fetcher backed by a reqwest client.
#[derive(Clone)]
pub struct HttpFetcher {
  client: reqwest::Client,
}

impl HttpFetcher {
  pub fn new() -> Result<Self> {
    let client = reqwest::Client::builder()
      .user_agent(concat!("tradetrackr/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { client })
  }
}

impl Fetcher for HttpFetcher {
  async fn fetch(&self, request: &Request) -> Result<Response> {
    let response = self
      .client
      .request(request.method.clone(), request.url.clone())
      .send()
      .await
      .map_err(|e| eyre!("Request to {} failed: {}", request.url, e))?;

    let status = response.status().as_u16();
    let content_type = response
      .headers()
      .get(CONTENT_TYPE)
      .and_then(|v| v.to_str().ok())
      .map(String::from);
    let body = response
      .bytes()
      .await
      .map_err(|e| eyre!("Failed to read body of {}: {}", request.url, e))?
      .to_vec();

    Ok(Response {
      status,
      content_type,
      body,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use url::Url;
  use wiremock::matchers::{method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  #[tokio::test]
  async fn test_fetch_returns_status_type_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/manifest.json"))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_raw(r#"{"name":"TradeTrackr"}"#, "application/json"),
      )
      .mount(&server)
      .await;

    let fetcher = HttpFetcher::new().unwrap();
    let url = Url::parse(&format!("{}/manifest.json", server.uri())).unwrap();
    let response = fetcher.fetch(&Request::get(url)).await.unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.content_type.as_deref(), Some("application/json"));
    assert_eq!(response.body, br#"{"name":"TradeTrackr"}"#.to_vec());
  }

  #[tokio::test]
  async fn test_http_error_status_is_ok() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .respond_with(ResponseTemplate::new(404))
      .mount(&server)
      .await;

    let fetcher = HttpFetcher::new().unwrap();
    let url = Url::parse(&format!("{}/missing", server.uri())).unwrap();
    let response = fetcher.fetch(&Request::get(url)).await.unwrap();
    assert_eq!(response.status, 404);
    assert!(!response.is_success());
  }

  #[tokio::test]
  async fn test_connection_failure_is_err() {
    let fetcher = HttpFetcher::new().unwrap();
    // Port 9 (discard) on localhost is not expected to accept HTTP
    let url = Url::parse("http://127.0.0.1:9/").unwrap();
    assert!(fetcher.fetch(&Request::get(url)).await.is_err());
  }
}
