// Library exports for webos-remote
// The binary and the integration tests both drive sessions through these modules

pub mod config;
pub mod credential;
pub mod driver;
pub mod error;
pub mod logging;
pub mod ssap;
pub mod transport;
