//! Simple WebSocket client example.
//!
//! Run against any echo server: cargo run --example client -- ws://127.0.0.1:9001/

use std::error::Error;
use std::sync::Arc;

use rsws_client::{Config, Message, WebSocket, WebSocketListener};
use tokio::sync::Notify;
use tracing_subscriber::fmt::time::ChronoLocal;

const DEFAULT_URI: &str = "ws://127.0.0.1:9001/";

struct Printer {
    closed: Notify,
}

impl WebSocketListener for Printer {
    fn on_connect(&self) {
        println!("Handshake complete");
    }

    fn on_message(&self, message: Message) {
        match message {
            Message::Text(text) => println!("Received: {text}"),
            Message::Binary(data) => println!("Received binary: {} bytes", data.len()),
        }
    }

    fn on_message_chunk(&self, chunk: Message, is_final: bool) {
        println!("Received chunk of {} bytes (final: {is_final})", chunk.len());
    }

    fn on_pong(&self, data: Option<Vec<u8>>) {
        println!("Pong: {:?}", data.as_deref().map(String::from_utf8_lossy));
    }

    fn on_close(&self) {
        println!("Connection closed");
        self.closed.notify_one();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let uri = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_URI.to_string());
    let config = Config::default();

    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new(config.date_time_format.clone()))
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let printer = Arc::new(Printer {
        closed: Notify::new(),
    });
    let ws = WebSocket::with_config(config).with_listener(printer.clone());

    println!("Connecting to {uri}");
    ws.connect(&uri).await?;

    ws.send_text("Hello, WebSocket!").await?;
    ws.ping(b"ping").await?;

    ws.stream_text("Hello, ", false).await?;
    ws.stream_text("streamed ", false).await?;
    ws.stream_text("world!", true).await?;

    println!("Closing connection...");
    ws.close_with_reason("goodbye").await?;
    printer.closed.notified().await;

    Ok(())
}
