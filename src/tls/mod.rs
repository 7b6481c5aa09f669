//! TLS wrapping for `wss` connections.
//!
//! Two client backends are supported:
//!
//! - **rustls** (feature `tls-rustls`): pure Rust, Mozilla root store from `webpki-roots`
//! - **native-tls** (feature `tls-native`): platform TLS and platform trust store
//!
//! When both are enabled, rustls is used.

#[cfg(feature = "tls-rustls")]
pub(crate) mod rustls_impl;

#[cfg(feature = "tls-native")]
pub(crate) mod native;

#[cfg(feature = "tls-rustls")]
pub use rustls_impl::client_config_with_webpki_roots;
