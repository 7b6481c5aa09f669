//! Callbacks through which a connection reports events.

use crate::message::Message;

/// Receives the events of one WebSocket connection.
///
/// All methods have empty default bodies, so an implementation only
/// overrides what it cares about. Callbacks run on the connection's
/// receiver task (or on the caller's task for `on_connect` and for a close
/// triggered by a local failure) and should return promptly.
pub trait WebSocketListener: Send + Sync {
    /// The opening handshake completed.
    fn on_connect(&self) {}

    /// The connection was torn down. Called exactly once per successful
    /// connect, whichever side ended it.
    fn on_close(&self) {}

    /// A complete, unfragmented message arrived.
    fn on_message(&self, _message: Message) {}

    /// One chunk of a fragmented message arrived. `is_final` marks the last
    /// chunk of the sequence. Text chunks always hold whole characters.
    fn on_message_chunk(&self, _chunk: Message, _is_final: bool) {}

    /// A ping arrived. `None` means the ping carried no payload.
    fn on_ping(&self, _data: Option<Vec<u8>>) {}

    /// A pong arrived. `None` means the pong carried no payload.
    fn on_pong(&self, _data: Option<Vec<u8>>) {}
}
