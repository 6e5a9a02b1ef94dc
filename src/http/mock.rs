//! Scripted transport for tests.

use futures::future::BoxFuture;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use super::transport::{HttpRequest, HttpResponse, Transport};
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub enum MockReply {
  Status(u16, String),
  Fail(String),
  /// Never completes
  Hang,
}

impl MockReply {
  pub fn ok(body: &str) -> Self {
    MockReply::Status(200, body.to_string())
  }

  pub fn status(status: u16, body: &str) -> Self {
    MockReply::Status(status, body.to_string())
  }

  pub fn fail(message: &str) -> Self {
    MockReply::Fail(message.to_string())
  }
}

struct Route {
  prefix: String,
  /// Replies are consumed in order; the last one repeats forever
  replies: VecDeque<MockReply>,
}

/// Transport that answers by URL prefix and records every request.
#[derive(Default)]
pub struct MockTransport {
  routes: Mutex<Vec<Route>>,
  calls: Mutex<Vec<String>>,
  requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn route(self, prefix: &str, reply: MockReply) -> Self {
    self.route_sequence(prefix, vec![reply])
  }

  pub fn route_sequence(self, prefix: &str, replies: Vec<MockReply>) -> Self {
    self.routes.lock().unwrap().push(Route {
      prefix: prefix.to_string(),
      replies: replies.into(),
    });
    self
  }

  pub fn calls(&self) -> Vec<String> {
    self.calls.lock().unwrap().clone()
  }

  /// Every request as sent, including method, headers and body
  pub fn requests(&self) -> Vec<HttpRequest> {
    self.requests.lock().unwrap().clone()
  }

  pub fn call_count(&self, prefix: &str) -> usize {
    self
      .calls
      .lock()
      .unwrap()
      .iter()
      .filter(|url| url.starts_with(prefix))
      .count()
  }

  fn next_reply(&self, url: &str) -> MockReply {
    let mut routes = self.routes.lock().unwrap();
    let Some(route) = routes.iter_mut().find(|r| url.starts_with(&r.prefix)) else {
      return MockReply::status(404, "no mock route");
    };
    if route.replies.len() > 1 {
      route.replies.pop_front().unwrap_or(MockReply::Hang)
    } else {
      route.replies.front().cloned().unwrap_or(MockReply::Hang)
    }
  }
}

impl Transport for MockTransport {
  fn send<'a>(
    &'a self,
    request: &'a HttpRequest,
    _timeout: Duration,
  ) -> BoxFuture<'a, Result<HttpResponse>> {
    self.calls.lock().unwrap().push(request.url.clone());
    self.requests.lock().unwrap().push(request.clone());
    let reply = self.next_reply(&request.url);

    Box::pin(async move {
      match reply {
        MockReply::Status(status, body) => Ok(HttpResponse {
          status,
          body: body.into_bytes(),
        }),
        MockReply::Fail(message) => Err(Error::Transport { message }),
        MockReply::Hang => futures::future::pending().await,
      }
    })
  }
}
