//! Lifecycle state of a client connection.

/// Connection state.
///
/// ```text
/// Disconnected -> Connecting -> Open -> ClosingLocal -> Closed
///                    |            |--> ClosingRemote -> Closed
///                    v            `--> Closed (failure)
///               Disconnected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    /// Not connected yet; `connect` is allowed.
    #[default]
    Disconnected,
    /// Transport open, opening handshake in progress.
    Connecting,
    /// Handshake done, data may flow both ways.
    Open,
    /// Local close frame sent, waiting for the peer's close frame.
    ClosingLocal,
    /// The peer sent a close frame; tearing down.
    ClosingRemote,
    /// Torn down. The connection cannot be reused.
    Closed,
}

impl ConnectionState {
    /// Whether send/stream/ping/pong/close are allowed.
    #[must_use]
    #[inline]
    pub const fn can_send(&self) -> bool {
        matches!(self, ConnectionState::Open)
    }

    /// Whether `connect` is allowed.
    #[must_use]
    #[inline]
    pub const fn can_connect(&self) -> bool {
        matches!(self, ConnectionState::Disconnected)
    }

    /// Whether the closing handshake has started.
    #[must_use]
    #[inline]
    pub const fn is_closing(&self) -> bool {
        matches!(
            self,
            ConnectionState::ClosingLocal | ConnectionState::ClosingRemote
        )
    }

    /// Whether teardown has happened.
    #[must_use]
    #[inline]
    pub const fn is_closed(&self) -> bool {
        matches!(self, ConnectionState::Closed)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ConnectionState::Disconnected => "Disconnected",
            ConnectionState::Connecting => "Connecting",
            ConnectionState::Open => "Open",
            ConnectionState::ClosingLocal => "ClosingLocal",
            ConnectionState::ClosingRemote => "ClosingRemote",
            ConnectionState::Closed => "Closed",
        })
    }
}
