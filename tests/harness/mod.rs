//! Test harness for driving the client against real TCP servers.

#![allow(dead_code)]

mod client;
mod server;

pub use client::{Event, EventListener, Events};
pub use server::{ServerOptions, TestServer};

/// Install a test-friendly tracing subscriber once per test binary.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
