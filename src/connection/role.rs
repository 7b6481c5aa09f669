//! Endpoint role, which decides the masking direction.

/// Which end of the connection the local side is.
///
/// The client is the only role a [`WebSocket`](crate::WebSocket) takes; the
/// server role exists so the frame codec can also speak the other side,
/// e.g. in test servers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Masks every outgoing frame, rejects masked incoming frames.
    Client,
    /// Never masks, rejects unmasked incoming frames.
    Server,
}

impl Role {
    /// Whether outgoing frames carry a masking key.
    #[inline]
    #[must_use]
    pub const fn must_mask(&self) -> bool {
        matches!(self, Role::Client)
    }

    /// Whether incoming frames must carry a masking key.
    #[inline]
    #[must_use]
    pub const fn expects_masked(&self) -> bool {
        matches!(self, Role::Server)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Role::Client => "client",
            Role::Server => "server",
        })
    }
}
