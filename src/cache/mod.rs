//! File-backed response cache.
//!
//! This module provides an API-agnostic caching mechanism that:
//! - Stores one JSON envelope per key, each with its own expiry
//! - Deletes expired or corrupt entries as they are read
//! - Degrades to pass-through when disabled
//! - Sits in front of any async fetcher via [`CacheLayer`]

mod layer;
mod storage;
mod traits;

pub use layer::CacheLayer;
pub use storage::ResponseCache;
pub use traits::{CacheResult, CacheSource, QueryKey};
