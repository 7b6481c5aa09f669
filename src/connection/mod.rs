//! Client connection lifecycle.
//!
//! [`WebSocket`] owns the write half of the transport and the state
//! machine; a receiver task owns the read half and reports back when it
//! stops.
//!
//! ## States
//!
//! `Disconnected` → `Connecting` → `Open` → `ClosingLocal` | `ClosingRemote`
//! → `Closed`. A failed connect returns to `Disconnected`; `Closed` is
//! final.

mod role;
mod state;

pub use role::Role;
pub use state::ConnectionState;

#[cfg(feature = "async-tokio")]
mod receiver;
#[cfg(feature = "async-tokio")]
mod websocket;

#[cfg(feature = "async-tokio")]
pub use websocket::WebSocket;
