use futures::future::BoxFuture;
use std::time::Duration;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
  Get,
  Post,
}

/// A single outgoing request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
  pub method: Method,
  pub url: String,
  pub body: Option<Vec<u8>>,
  pub headers: Vec<(String, String)>,
}

impl HttpRequest {
  pub fn get(url: impl Into<String>) -> Self {
    Self {
      method: Method::Get,
      url: url.into(),
      body: None,
      headers: Vec::new(),
    }
  }

  /// POST `body` as JSON.
  pub fn post_json(url: impl Into<String>, body: Vec<u8>) -> Self {
    Self {
      method: Method::Post,
      url: url.into(),
      body: Some(body),
      headers: vec![("Content-Type".to_string(), "application/json".to_string())],
    }
  }

  pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
    self.headers.push((name.into(), value.into()));
    self
  }
}

/// A response as received, whatever its status.
#[derive(Debug, Clone)]
pub struct HttpResponse {
  pub status: u16,
  pub body: Vec<u8>,
}

impl HttpResponse {
  pub fn is_success(&self) -> bool {
    (200..300).contains(&self.status)
  }
}

/// Performs exactly one request, with no retries of its own.
pub trait Transport: Send + Sync {
  fn send<'a>(&'a self, request: &'a HttpRequest, timeout: Duration)
    -> BoxFuture<'a, Result<HttpResponse>>;
}

/// Transport backed by a shared `reqwest::Client`.
#[derive(Clone)]
pub struct ReqwestTransport {
  client: reqwest::Client,
}

impl ReqwestTransport {
  pub fn new(user_agent: &str) -> Result<Self> {
    let client = reqwest::Client::builder()
      .user_agent(user_agent)
      .build()
      .map_err(|e| Error::Transport {
        message: format!("failed to create HTTP client: {}", e),
      })?;

    Ok(Self { client })
  }
}

impl Transport for ReqwestTransport {
  fn send<'a>(
    &'a self,
    request: &'a HttpRequest,
    timeout: Duration,
  ) -> BoxFuture<'a, Result<HttpResponse>> {
    Box::pin(async move {
      let mut builder = match request.method {
        Method::Get => self.client.get(&request.url),
        Method::Post => self.client.post(&request.url),
      }
      .timeout(timeout);

      for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
      }
      if let Some(body) = &request.body {
        builder = builder.body(body.clone());
      }

      let response = builder.send().await.map_err(|e| Error::Transport {
        message: e.to_string(),
      })?;

      let status = response.status().as_u16();
      let body = response.bytes().await.map_err(|e| Error::Transport {
        message: format!("failed to read response body: {}", e),
      })?;

      Ok(HttpResponse {
        status,
        body: body.to_vec(),
      })
    })
  }
}
