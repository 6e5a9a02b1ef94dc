//! Prayer times API: request parameters, response types, the HTTP client and
//! its cached wrapper.

mod cache;
mod cached_client;
mod client;
mod params;
mod types;

pub use cache::CacheTtls;
pub use cached_client::CachedPrayerClient;
pub use client::{PrayerClient, DEFAULT_BASE_URL};
pub use params::{CalendarParams, PrayerTimesParams, DEFAULT_METHOD, MAX_METHOD};
#[cfg(test)]
pub(crate) use types::fixtures;
pub use types::PrayerTimesResponse;
