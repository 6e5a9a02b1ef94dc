//! Location model and IP-based geolocation with ordered provider fallback.

mod providers;
mod resolver;
mod types;

#[cfg(test)]
pub use providers::{IpApi, IpApiCo, IpInfo};
pub use resolver::Resolver;
pub use types::{Location, LocationSource};
