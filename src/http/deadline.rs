use std::time::Duration;
use tokio::time::Instant;

/// Point in time after which a caller no longer wants an answer.
///
/// Copyable so one deadline can be handed to several sequential operations;
/// they all observe the same expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
  at: Option<Instant>,
}

impl Deadline {
  /// A deadline that never fires.
  pub fn none() -> Self {
    Self { at: None }
  }

  pub fn after(timeout: Duration) -> Self {
    Self {
      at: Some(Instant::now() + timeout),
    }
  }

  pub fn has_expired(&self) -> bool {
    self.at.is_some_and(|at| Instant::now() >= at)
  }

  /// Time left, or `None` for an unbounded deadline.
  pub fn remaining(&self) -> Option<Duration> {
    self
      .at
      .map(|at| at.saturating_duration_since(Instant::now()))
  }

  /// `limit`, shortened to whatever is left of this deadline.
  pub fn clamp(&self, limit: Duration) -> Duration {
    match self.remaining() {
      Some(remaining) => remaining.min(limit),
      None => limit,
    }
  }

  /// A deadline no later than this one and no more than `limit` from now.
  pub fn child(&self, limit: Duration) -> Deadline {
    Deadline::after(self.clamp(limit))
  }

  /// Resolves when the deadline fires; never resolves for [`Deadline::none`].
  pub async fn expired(&self) {
    match self.at {
      Some(at) => tokio::time::sleep_until(at).await,
      None => std::future::pending().await,
    }
  }
}

impl Default for Deadline {
  fn default() -> Self {
    Self::none()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test(start_paused = true)]
  async fn test_expiry() {
    let deadline = Deadline::after(Duration::from_secs(1));
    assert!(!deadline.has_expired());

    tokio::time::advance(Duration::from_millis(1500)).await;
    assert!(deadline.has_expired());
    assert_eq!(deadline.remaining(), Some(Duration::ZERO));
  }

  #[tokio::test(start_paused = true)]
  async fn test_child_never_outlives_parent() {
    let parent = Deadline::after(Duration::from_secs(2));
    let child = parent.child(Duration::from_secs(10));
    assert_eq!(child.remaining(), Some(Duration::from_secs(2)));

    let short = parent.child(Duration::from_millis(500));
    assert_eq!(short.remaining(), Some(Duration::from_millis(500)));
  }

  #[test]
  fn test_unbounded() {
    let deadline = Deadline::none();
    assert!(!deadline.has_expired());
    assert_eq!(deadline.remaining(), None);
    assert_eq!(deadline.clamp(Duration::from_secs(3)), Duration::from_secs(3));
  }
}
