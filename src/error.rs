//! Error types for the data-acquisition core.
//!
//! Command handlers convert these into `color_eyre` reports with context;
//! everything below the CLI layer returns [`Result`].

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
  /// The request never produced a response (DNS, connect, TLS, read timeout).
  #[error("request failed: {message}")]
  Transport { message: String },

  /// The server answered with a non-2xx status.
  #[error("unexpected status code {status}: {body}")]
  Status { status: u16, body: String },

  /// Every allowed attempt failed; `source` is the last attempt's error.
  #[error("{endpoint} request failed after {attempts} attempts")]
  RetriesExhausted {
    endpoint: String,
    attempts: u32,
    #[source]
    source: Box<Error>,
  },

  /// The caller's deadline fired before a response was obtained.
  #[error("{endpoint} request cancelled: deadline exceeded")]
  Cancelled { endpoint: String },

  /// HTTP 2xx, but the JSON envelope carried a non-success code.
  #[error("API error: {status} (code: {code})")]
  Api { code: u16, status: String },

  #[error("failed to parse {what}: {source}")]
  Decode {
    what: String,
    #[source]
    source: serde_json::Error,
  },

  #[error("failed to detect location from IP: all services failed ({})", format_failures(.failures))]
  AllProvidersFailed { failures: Vec<(String, String)> },

  #[error("invalid parameters: {0}")]
  InvalidParams(String),

  #[error("cache error: {0}")]
  Cache(String),

  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),
}

impl Error {
  /// Whether a single failed attempt may be retried.
  ///
  /// Only transport failures and bad statuses are transient; application
  /// errors and cancellations are surfaced as-is.
  pub fn is_transient(&self) -> bool {
    matches!(self, Error::Transport { .. } | Error::Status { .. })
  }

  pub fn decode(what: impl Into<String>, source: serde_json::Error) -> Self {
    Error::Decode {
      what: what.into(),
      source,
    }
  }
}

fn format_failures(failures: &[(String, String)]) -> String {
  failures
    .iter()
    .map(|(provider, reason)| format!("{}: {}", provider, reason))
    .collect::<Vec<_>>()
    .join("; ")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_exhausted_message_carries_context() {
    let err = Error::RetriesExhausted {
      endpoint: "prayer times".to_string(),
      attempts: 4,
      source: Box::new(Error::Status {
        status: 503,
        body: "unavailable".to_string(),
      }),
    };
    assert_eq!(err.to_string(), "prayer times request failed after 4 attempts");
    let source = std::error::Error::source(&err).map(|s| s.to_string());
    assert_eq!(
      source.as_deref(),
      Some("unexpected status code 503: unavailable")
    );
  }

  #[test]
  fn test_all_providers_failed_lists_reasons() {
    let err = Error::AllProvidersFailed {
      failures: vec![
        ("ip-api.com".to_string(), "status 500".to_string()),
        ("ipinfo.io".to_string(), "invalid coordinates".to_string()),
      ],
    };
    let msg = err.to_string();
    assert!(msg.contains("ip-api.com: status 500"));
    assert!(msg.contains("ipinfo.io: invalid coordinates"));
  }

  #[test]
  fn test_transient_classification() {
    assert!(Error::Transport {
      message: "reset".into()
    }
    .is_transient());
    assert!(!Error::Api {
      code: 400,
      status: "Bad Request".into()
    }
    .is_transient());
    assert!(!Error::Cancelled {
      endpoint: "qibla".into()
    }
    .is_transient());
  }
}
