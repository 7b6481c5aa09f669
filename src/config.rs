//! Client configuration and resource limits.

use std::time::Duration;

/// Resource limits applied to data received from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Maximum payload length of a single incoming frame in bytes.
    ///
    /// Default: `i32::MAX`
    pub max_frame_size: u64,

    /// Maximum size of the server's opening handshake in bytes.
    ///
    /// Default: 8 KB (8192)
    pub max_handshake_size: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_frame_size: i32::MAX as u64,
            max_handshake_size: 8192,
        }
    }
}

impl Limits {
    /// Create new limits with custom values.
    #[must_use]
    pub const fn new(max_frame_size: u64, max_handshake_size: usize) -> Self {
        Self {
            max_frame_size,
            max_handshake_size,
        }
    }

    /// Validate that an announced frame length is within limits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FrameTooLarge`](crate::Error::FrameTooLarge) if `size` exceeds the configured maximum.
    pub const fn check_frame_size(&self, size: u64) -> Result<(), crate::Error> {
        if size > self.max_frame_size {
            Err(crate::Error::FrameTooLarge {
                size,
                max: self.max_frame_size,
            })
        } else {
            Ok(())
        }
    }

    /// Validate that the handshake read so far is within limits.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HandshakeTooLarge`](crate::Error::HandshakeTooLarge) if `size` exceeds the configured maximum.
    pub const fn check_handshake_size(&self, size: usize) -> Result<(), crate::Error> {
        if size > self.max_handshake_size {
            Err(crate::Error::HandshakeTooLarge {
                size,
                max: self.max_handshake_size,
            })
        } else {
            Ok(())
        }
    }
}

/// WebSocket client configuration.
///
/// The configuration is consumed as given; nothing is loaded from files or
/// the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Timeout for opening the transport (TCP connect and TLS setup).
    ///
    /// Default: 10 seconds
    pub socket_timeout: Duration,

    /// Capacity of the buffered writer in front of the transport.
    ///
    /// Default: 8 KB (8192)
    pub output_buffer_size: usize,

    /// Emit diagnostic `tracing` events.
    ///
    /// Default: true
    pub debug: bool,

    /// strftime-style timestamp format for log output.
    ///
    /// The library does not format timestamps itself; this is read by
    /// whoever installs the subscriber.
    ///
    /// Default: `"%Y-%m-%d %H:%M:%S%.3f"`
    pub date_time_format: String,

    /// Resource limits.
    pub limits: Limits,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            socket_timeout: Duration::from_millis(10_000),
            output_buffer_size: 8192,
            debug: true,
            date_time_format: "%Y-%m-%d %H:%M:%S%.3f".to_string(),
            limits: Limits::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the transport connect timeout.
    #[must_use]
    pub const fn with_socket_timeout(mut self, timeout: Duration) -> Self {
        self.socket_timeout = timeout;
        self
    }

    /// Set the output buffer size.
    #[must_use]
    pub const fn with_output_buffer_size(mut self, size: usize) -> Self {
        self.output_buffer_size = size;
        self
    }

    /// Enable or disable diagnostic logging.
    #[must_use]
    pub const fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Set the log timestamp format.
    #[must_use]
    pub fn with_date_time_format(mut self, format: impl Into<String>) -> Self {
        self.date_time_format = format.into();
        self
    }

    /// Set custom limits.
    #[must_use]
    pub const fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }
}
