//! # rsws-client - RFC 6455 WebSocket client
//!
//! A client connection with a background receiver that reports everything
//! it reads to a [`WebSocketListener`].
//!
//! ## Features
//!
//! - **Strict framing**: minimal length encoding, masked client frames,
//!   rejection of masked or malformed server frames
//! - **Streaming** in both directions, with incremental UTF-8 decoding of
//!   incoming text chunks
//! - **Sub-protocol negotiation** during the opening handshake
//! - **TLS** for `wss://` through rustls or native-tls
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use rsws_client::{Config, WebSocket};
//!
//! let ws = WebSocket::with_config(Config::default()).with_listener(Arc::new(MyListener));
//! ws.connect("ws://localhost:9001/").await?;
//! ws.send_text("hello").await?;
//! ws.close().await?;
//! ```

/// `tracing::debug!`, emitted only when the connection's debug flag is set.
macro_rules! ws_debug {
    ($enabled:expr, $($arg:tt)+) => {
        if $enabled {
            tracing::debug!($($arg)+);
        }
    };
}

macro_rules! ws_warn {
    ($enabled:expr, $($arg:tt)+) => {
        if $enabled {
            tracing::warn!($($arg)+);
        }
    };
}

pub mod config;
pub mod connection;
pub mod error;
pub mod listener;
pub mod message;
pub mod protocol;

#[cfg(feature = "async-tokio")]
pub mod codec;
#[cfg(feature = "async-tokio")]
pub mod transport;

#[cfg(any(feature = "tls-rustls", feature = "tls-native"))]
pub mod tls;

pub use config::{Config, Limits};
#[cfg(feature = "async-tokio")]
pub use connection::WebSocket;
pub use connection::{ConnectionState, Role};
pub use error::{Error, ErrorKind, Result};
pub use listener::WebSocketListener;
pub use message::{CloseCode, CloseFrame, Message};
pub use protocol::{OpCode, WS_GUID, compute_accept_key};
