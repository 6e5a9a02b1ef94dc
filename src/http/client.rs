//! Retrying HTTP client.

use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::deadline::Deadline;
use super::transport::{HttpRequest, ReqwestTransport, Transport};
use crate::error::{Error, Result};

/// Default timeout for a single attempt.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
  /// Upper bound for each individual attempt
  pub timeout: Duration,
  /// Retries after the first attempt, so `max_retries + 1` attempts in total
  pub max_retries: u32,
}

impl Default for RetryConfig {
  fn default() -> Self {
    Self {
      timeout: DEFAULT_TIMEOUT,
      max_retries: DEFAULT_MAX_RETRIES,
    }
  }
}

impl RetryConfig {
  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  pub fn with_max_retries(mut self, max_retries: u32) -> Self {
    self.max_retries = max_retries;
    self
  }
}

/// Delay before the `retry`-th retry (1-based): `retry² × 100ms`.
pub fn backoff_delay(retry: u32) -> Duration {
  Duration::from_millis(100u64.saturating_mul(u64::from(retry).saturating_pow(2)))
}

/// HTTP client that retries transient failures with quadratic backoff.
///
/// Non-2xx statuses and transport errors are retried; a fired deadline is
/// never retried past, whether it fires during an attempt or a backoff sleep.
#[derive(Clone)]
pub struct RetryingClient {
  transport: Arc<dyn Transport>,
  config: RetryConfig,
}

impl RetryingClient {
  /// Create a client over the default reqwest transport.
  pub fn new(config: RetryConfig, user_agent: &str) -> Result<Self> {
    let transport = ReqwestTransport::new(user_agent)?;
    Ok(Self::with_transport(Arc::new(transport), config))
  }

  pub fn with_transport(transport: Arc<dyn Transport>, config: RetryConfig) -> Self {
    Self { transport, config }
  }

  /// Same transport, different retry policy.
  pub fn with_config(&self, config: RetryConfig) -> Self {
    Self {
      transport: Arc::clone(&self.transport),
      config,
    }
  }

  /// GET `url`, returning the body of the first 2xx response.
  ///
  /// `endpoint` names the kind of request for error messages.
  pub async fn get(&self, endpoint: &str, url: &str, deadline: Deadline) -> Result<Vec<u8>> {
    let request = HttpRequest::get(url).header("Accept", "application/json");
    self.execute(endpoint, &request, deadline).await
  }

  pub async fn execute(
    &self,
    endpoint: &str,
    request: &HttpRequest,
    deadline: Deadline,
  ) -> Result<Vec<u8>> {
    let cancelled = || Error::Cancelled {
      endpoint: endpoint.to_string(),
    };
    let attempts = self.config.max_retries.saturating_add(1);
    let mut last_err = None;

    for attempt in 0..attempts {
      if attempt > 0 {
        let delay = backoff_delay(attempt);
        debug!(endpoint, retry = attempt, delay_ms = delay.as_millis() as u64, "retrying request");
        tokio::select! {
          _ = tokio::time::sleep(delay) => {}
          _ = deadline.expired() => return Err(cancelled()),
        }
      }

      if deadline.has_expired() {
        return Err(cancelled());
      }

      let timeout = deadline.clamp(self.config.timeout);
      let outcome = tokio::select! {
        outcome = tokio::time::timeout(timeout, self.transport.send(request, timeout)) => outcome,
        _ = deadline.expired() => return Err(cancelled()),
      };

      let err = match outcome {
        Ok(Ok(response)) if response.is_success() => return Ok(response.body),
        Ok(Ok(response)) => Error::Status {
          status: response.status,
          body: truncate(&String::from_utf8_lossy(&response.body), 200),
        },
        Ok(Err(e)) => e,
        Err(_) => Error::Transport {
          message: format!("timed out after {:?}", timeout),
        },
      };

      if deadline.has_expired() {
        return Err(cancelled());
      }
      if !err.is_transient() {
        return Err(err);
      }

      debug!(endpoint, attempt = attempt + 1, error = %err, "request attempt failed");
      last_err = Some(err);
    }

    Err(Error::RetriesExhausted {
      endpoint: endpoint.to_string(),
      attempts,
      source: Box::new(last_err.unwrap_or_else(|| Error::Transport {
        message: "no attempts were made".to_string(),
      })),
    })
  }
}

fn truncate(s: &str, max_chars: usize) -> String {
  if s.chars().count() <= max_chars {
    return s.to_string();
  }
  let mut out: String = s.chars().take(max_chars).collect();
  out.push_str("...");
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::http::mock::{MockReply, MockTransport};
  use crate::http::transport::Method;
  use tokio::time::Instant;

  const URL: &str = "https://api.example.test/v1/timings";

  fn client(transport: &Arc<MockTransport>, max_retries: u32) -> RetryingClient {
    RetryingClient::with_transport(
      transport.clone(),
      RetryConfig::default().with_max_retries(max_retries),
    )
  }

  #[test]
  fn test_backoff_is_quadratic() {
    assert_eq!(backoff_delay(1), Duration::from_millis(100));
    assert_eq!(backoff_delay(2), Duration::from_millis(400));
    assert_eq!(backoff_delay(3), Duration::from_millis(900));
  }

  #[test]
  fn test_default_config() {
    let config = RetryConfig::default();
    assert_eq!(config.timeout, Duration::from_secs(30));
    assert_eq!(config.max_retries, 3);
  }

  #[tokio::test(start_paused = true)]
  async fn test_success_returns_body() {
    let transport = Arc::new(MockTransport::new().route(URL, MockReply::ok(r#"{"code":200}"#)));
    let body = client(&transport, 3)
      .get("prayer times", URL, Deadline::none())
      .await
      .unwrap();

    assert_eq!(body, br#"{"code":200}"#.to_vec());
    assert_eq!(transport.call_count(URL), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_always_failing_makes_exactly_max_retries_plus_one_attempts() {
    let transport = Arc::new(MockTransport::new().route(URL, MockReply::fail("connection reset")));
    let started = Instant::now();

    let err = client(&transport, 3)
      .get("prayer times", URL, Deadline::none())
      .await
      .unwrap_err();

    assert_eq!(transport.call_count(URL), 4);
    match err {
      Error::RetriesExhausted {
        endpoint,
        attempts,
        source,
      } => {
        assert_eq!(endpoint, "prayer times");
        assert_eq!(attempts, 4);
        assert!(matches!(*source, Error::Transport { .. }));
      }
      other => panic!("unexpected error: {other:?}"),
    }
    // 100 + 400 + 900 ms of backoff
    assert!(started.elapsed() >= Duration::from_millis(1400));
  }

  #[tokio::test(start_paused = true)]
  async fn test_zero_retries_means_one_attempt() {
    let transport = Arc::new(MockTransport::new().route(URL, MockReply::status(503, "down")));
    let err = client(&transport, 0)
      .get("qibla", URL, Deadline::none())
      .await
      .unwrap_err();

    assert_eq!(transport.call_count(URL), 1);
    assert!(matches!(err, Error::RetriesExhausted { attempts: 1, .. }));
  }

  #[tokio::test(start_paused = true)]
  async fn test_recovers_after_transient_failures() {
    let transport = Arc::new(MockTransport::new().route_sequence(
      URL,
      vec![
        MockReply::status(500, "oops"),
        MockReply::fail("timeout"),
        MockReply::ok("{}"),
      ],
    ));

    let body = client(&transport, 3)
      .get("prayer times", URL, Deadline::none())
      .await
      .unwrap();
    assert_eq!(body, b"{}".to_vec());
    assert_eq!(transport.call_count(URL), 3);
  }

  #[tokio::test(start_paused = true)]
  async fn test_non_2xx_is_a_failure() {
    let transport = Arc::new(MockTransport::new().route(URL, MockReply::status(404, "not found")));
    let err = client(&transport, 1)
      .get("prayer times", URL, Deadline::none())
      .await
      .unwrap_err();

    match err {
      Error::RetriesExhausted { source, .. } => {
        assert!(matches!(*source, Error::Status { status: 404, .. }))
      }
      other => panic!("unexpected error: {other:?}"),
    }
  }

  #[tokio::test(start_paused = true)]
  async fn test_expired_deadline_is_never_attempted() {
    let transport = Arc::new(MockTransport::new().route(URL, MockReply::ok("{}")));
    let deadline = Deadline::after(Duration::ZERO);

    let err = client(&transport, 3)
      .get("prayer times", URL, deadline)
      .await
      .unwrap_err();

    assert!(matches!(err, Error::Cancelled { .. }));
    assert_eq!(transport.call_count(URL), 0);
  }

  #[tokio::test(start_paused = true)]
  async fn test_deadline_interrupts_backoff() {
    let transport = Arc::new(MockTransport::new().route(URL, MockReply::fail("refused")));
    let started = Instant::now();
    // Fires during the second backoff sleep (100ms, then 400ms)
    let deadline = Deadline::after(Duration::from_millis(150));

    let err = client(&transport, 10)
      .get("prayer times", URL, deadline)
      .await
      .unwrap_err();

    assert!(matches!(err, Error::Cancelled { .. }));
    assert_eq!(transport.call_count(URL), 2);
    assert!(started.elapsed() < Duration::from_millis(500));
  }

  #[tokio::test(start_paused = true)]
  async fn test_deadline_discards_in_flight_attempt() {
    let transport = Arc::new(MockTransport::new().route(URL, MockReply::Hang));
    let deadline = Deadline::after(Duration::from_secs(2));

    let err = client(&transport, 3)
      .get("prayer times", URL, deadline)
      .await
      .unwrap_err();

    assert!(matches!(err, Error::Cancelled { .. }));
    assert_eq!(transport.call_count(URL), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_attempt_timeout_is_retried() {
    let transport = Arc::new(
      MockTransport::new().route_sequence(URL, vec![MockReply::Hang, MockReply::ok("{}")]),
    );
    let client = RetryingClient::with_transport(
      transport.clone(),
      RetryConfig::default()
        .with_timeout(Duration::from_secs(1))
        .with_max_retries(1),
    );

    let body = client.get("prayer times", URL, Deadline::none()).await.unwrap();
    assert_eq!(body, b"{}".to_vec());
    assert_eq!(transport.call_count(URL), 2);
  }

  #[tokio::test(start_paused = true)]
  async fn test_post_body_is_resent_on_every_attempt() {
    let transport = Arc::new(MockTransport::new().route_sequence(
      URL,
      vec![MockReply::status(502, "bad gateway"), MockReply::ok("ok")],
    ));
    let request = HttpRequest::post_json(URL, br#"{"text":"Fajr"}"#.to_vec());

    let body = client(&transport, 2)
      .execute("webhook", &request, Deadline::none())
      .await
      .unwrap();
    assert_eq!(body, b"ok".to_vec());

    let sent = transport.requests();
    assert_eq!(sent.len(), 2);
    for attempt in &sent {
      assert_eq!(attempt.method, Method::Post);
      assert_eq!(attempt.body.as_deref(), Some(&br#"{"text":"Fajr"}"#[..]));
      assert!(attempt
        .headers
        .iter()
        .any(|(name, value)| name == "Content-Type" && value == "application/json"));
    }
  }

  #[test]
  fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("abcdef", 3), "abc...");
  }
}
