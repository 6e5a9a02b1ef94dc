//! HTTP plumbing shared by every remote service.
//!
//! - [`Transport`] performs exactly one request; [`ReqwestTransport`] is the
//!   production implementation
//! - [`RetryingClient`] masks transient failures with bounded backoff
//! - [`Deadline`] bounds a logical operation across all of its attempts

mod client;
mod deadline;
#[cfg(test)]
pub(crate) mod mock;
mod transport;

pub use client::{RetryConfig, RetryingClient};
pub use deadline::Deadline;
pub use transport::{HttpRequest, Transport};
