//! Listener that forwards events into a channel the test can await.

use std::time::Duration;

use rsws_client::{Message, WebSocketListener};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Connect,
    Close,
    Message(Message),
    Chunk(Message, bool),
    Ping(Option<Vec<u8>>),
    Pong(Option<Vec<u8>>),
}

pub struct EventListener {
    tx: UnboundedSender<Event>,
}

impl EventListener {
    pub fn new() -> (Self, Events) {
        let (tx, rx) = unbounded_channel();
        (Self { tx }, Events { rx })
    }
}

impl WebSocketListener for EventListener {
    fn on_connect(&self) {
        let _ = self.tx.send(Event::Connect);
    }

    fn on_close(&self) {
        let _ = self.tx.send(Event::Close);
    }

    fn on_message(&self, message: Message) {
        let _ = self.tx.send(Event::Message(message));
    }

    fn on_message_chunk(&self, chunk: Message, is_final: bool) {
        let _ = self.tx.send(Event::Chunk(chunk, is_final));
    }

    fn on_ping(&self, data: Option<Vec<u8>>) {
        let _ = self.tx.send(Event::Ping(data));
    }

    fn on_pong(&self, data: Option<Vec<u8>>) {
        let _ = self.tx.send(Event::Pong(data));
    }
}

pub struct Events {
    rx: UnboundedReceiver<Event>,
}

impl Events {
    /// Next event, failing the test after five seconds.
    pub async fn next(&mut self) -> Event {
        tokio::time::timeout(Duration::from_secs(5), self.rx.recv())
            .await
            .expect("timed out waiting for a listener event")
            .expect("listener dropped")
    }

    /// Whether another event arrives within `wait`.
    pub async fn quiet_for(&mut self, wait: Duration) -> bool {
        tokio::time::timeout(wait, self.rx.recv()).await.is_err()
    }
}
