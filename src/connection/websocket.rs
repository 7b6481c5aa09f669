use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::io::{ReadHalf, WriteHalf};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use super::receiver::{Outcome, Receiver, ReceiverControl};
use super::{ConnectionState, Role};
use crate::codec::{FrameReader, FrameWriter};
use crate::config::Config;
use crate::error::{Error, ErrorKind, Result};
use crate::listener::WebSocketListener;
use crate::message::{CloseCode, CloseFrame, Message};
use crate::protocol::key::{self, KeyPair};
use crate::protocol::{MAX_CONTROL_FRAME_PAYLOAD, OpCode, build_request, parse_response};
use crate::transport::{self, BoxedTransport, Endpoint, Transport};

type Reader = FrameReader<ReadHalf<BoxedTransport>>;
type Writer = FrameWriter<WriteHalf<BoxedTransport>>;

/// A client WebSocket connection.
///
/// Events are delivered to the registered [`WebSocketListener`] from a
/// background task started by [`connect`](Self::connect). All sending
/// operations, `close`, and the receiver's own close handling are
/// serialized through one lock, so frames are never interleaved on the
/// wire.
///
/// A `WebSocket` connects once. After it has closed it cannot be reused.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use rsws_client::{Message, WebSocket, WebSocketListener};
///
/// struct Printer;
///
/// impl WebSocketListener for Printer {
///     fn on_message(&self, message: Message) {
///         println!("{message:?}");
///     }
/// }
///
/// # async fn run() -> rsws_client::Result<()> {
/// let ws = WebSocket::new().with_listener(Arc::new(Printer));
/// ws.connect("ws://localhost:9001/").await?;
/// ws.send_text("hello").await?;
/// ws.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct WebSocket {
    config: Arc<Config>,
    listener: Option<Arc<dyn WebSocketListener>>,
    offered: Vec<String>,
    shared: Arc<Shared>,
}

/// State shared with the receiver task.
struct Shared {
    debug: bool,
    socket_timeout: Duration,
    connected: AtomicBool,
    negotiated: OnceLock<Vec<String>>,
    core: Mutex<Core>,
}

#[derive(Default)]
struct Core {
    state: ConnectionState,
    writer: Option<Writer>,
    /// Outgoing streaming sequence in progress.
    streaming: bool,
    control: Option<Arc<ReceiverControl>>,
    receiver: Option<JoinHandle<()>>,
    /// Taken on teardown so `on_close` fires once.
    listener: Option<Arc<dyn WebSocketListener>>,
}

/// What a write is allowed to do while a streaming sequence is open.
enum Outgoing<'a> {
    Message(OpCode, &'a [u8]),
    Chunk(OpCode, &'a [u8], bool),
    Control(OpCode, &'a [u8]),
}

impl WebSocket {
    /// Create an unconnected websocket with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    #[must_use]
    pub fn with_config(config: Config) -> Self {
        let shared = Shared {
            debug: config.debug,
            socket_timeout: config.socket_timeout,
            connected: AtomicBool::new(false),
            negotiated: OnceLock::new(),
            core: Mutex::new(Core::default()),
        };
        Self {
            config: Arc::new(config),
            listener: None,
            offered: Vec::new(),
            shared: Arc::new(shared),
        }
    }

    /// Register the listener that receives this connection's events.
    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn WebSocketListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Sub-protocols to offer in the opening handshake, in preference order.
    #[must_use]
    pub fn subprotocols<I, S>(mut self, protocols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.offered = protocols.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the listener.
    ///
    /// The receiver reads the listener once when it starts, so a listener
    /// set after [`connect`](Self::connect) only sees events of a later
    /// connection attempt.
    pub fn set_listener(&mut self, listener: Arc<dyn WebSocketListener>) {
        self.listener = Some(listener);
    }

    #[must_use]
    pub fn listener(&self) -> Option<&Arc<dyn WebSocketListener>> {
        self.listener.as_ref()
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Sub-protocols both sides agreed on, in the server's order.
    ///
    /// Empty before a successful handshake.
    #[must_use]
    pub fn negotiated_subprotocols(&self) -> &[String] {
        self.shared.negotiated.get().map(Vec::as_slice).unwrap_or_default()
    }

    /// Whether the connection is open. Does not wait for the lock.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::Acquire)
    }

    pub async fn state(&self) -> ConnectionState {
        self.shared.core.lock().await.state
    }

    /// Open a transport to `uri` and run the opening handshake over it.
    ///
    /// On success the listener's `on_connect` has been called and the
    /// receiver task is running.
    ///
    /// # Errors
    ///
    /// - `Error::Usage` for an invalid URI or when the websocket is not in
    ///   the disconnected state
    /// - `Error::Transport` if the host cannot be reached in time
    /// - `Error::Handshake` if the server's answer is not a valid upgrade
    ///
    /// On failure the websocket stays disconnected and may be connected
    /// again.
    pub async fn connect(&self, uri: &str) -> Result<()> {
        self.establish(uri, None).await
    }

    /// Like [`connect`](Self::connect), over a stream the caller already
    /// opened. `uri` still supplies the request target and `Host` header.
    ///
    /// # Errors
    ///
    /// Same as [`connect`](Self::connect), minus the transport failures.
    pub async fn connect_with_stream<S: Transport>(&self, uri: &str, stream: S) -> Result<()> {
        self.establish(uri, Some(Box::new(stream))).await
    }

    async fn establish(&self, uri: &str, stream: Option<BoxedTransport>) -> Result<()> {
        let mut core = self.shared.core.lock().await;
        match core.state {
            ConnectionState::Disconnected => {}
            ConnectionState::Closed => {
                return Err(Error::usage("websocket is closed and cannot be reused"));
            }
            _ => return Err(Error::usage("websocket is already connected")),
        }

        let endpoint = Endpoint::parse(uri)?;
        let keys = key::generate();
        let request = build_request(
            &endpoint.target,
            &endpoint.host_header,
            &keys.client_key,
            &self.offered,
        )?;

        core.state = ConnectionState::Connecting;
        ws_debug!(
            self.shared.debug,
            host = %endpoint.host,
            port = endpoint.port,
            secure = endpoint.secure,
            "connecting"
        );

        let (reader, writer, negotiated) =
            match self.handshake(&endpoint, &keys, &request, stream).await {
                Ok(parts) => parts,
                Err(e) => {
                    core.state = ConnectionState::Disconnected;
                    ws_debug!(self.shared.debug, error = %e, "connection attempt failed");
                    return Err(e);
                }
            };

        let _ = self.shared.negotiated.set(negotiated);
        core.state = ConnectionState::Open;
        core.writer = Some(writer);
        core.listener = self.listener.clone();
        self.shared.connected.store(true, Ordering::Release);
        ws_debug!(
            self.shared.debug,
            subprotocols = ?self.negotiated_subprotocols(),
            "connection established"
        );

        if let Some(listener) = &self.listener {
            listener.on_connect();
        }

        let control = Arc::new(ReceiverControl::default());
        let receiver = Receiver::new(
            reader,
            self.listener.clone(),
            Arc::clone(&control),
            self.shared.debug,
        );
        let shared = Arc::clone(&self.shared);
        core.control = Some(control);
        core.receiver = Some(tokio::spawn(async move {
            let outcome = receiver.run().await;
            shared.on_receiver_exit(outcome).await;
        }));
        Ok(())
    }

    async fn handshake(
        &self,
        endpoint: &Endpoint,
        keys: &KeyPair,
        request: &[u8],
        stream: Option<BoxedTransport>,
    ) -> Result<(Reader, Writer, Vec<String>)> {
        let stream = match stream {
            Some(stream) => stream,
            None => transport::open(endpoint, self.config.socket_timeout).await?,
        };
        let (read_half, write_half) = tokio::io::split(stream);
        let mut reader = FrameReader::new(read_half, Role::Client, self.config.limits.clone());
        let mut writer = FrameWriter::new(write_half, Role::Client, self.config.output_buffer_size);

        writer.write_raw(request).await?;
        let lines = reader.read_handshake().await?;
        let validated = parse_response(&lines, &keys.expected_accept, &self.offered)?;
        Ok((reader, writer, validated.subprotocols))
    }

    /// Send a complete message in one frame.
    ///
    /// # Errors
    ///
    /// `Error::Usage` when not connected or while a streaming sequence is
    /// open; `Error::Transport` if the write fails, which also closes the
    /// connection.
    pub async fn send(&self, message: Message) -> Result<()> {
        let (opcode, payload) = split_message(&message);
        self.write(Outgoing::Message(opcode, payload)).await
    }

    pub async fn send_text(&self, text: &str) -> Result<()> {
        self.write(Outgoing::Message(OpCode::Text, text.as_bytes()))
            .await
    }

    pub async fn send_binary(&self, data: &[u8]) -> Result<()> {
        self.write(Outgoing::Message(OpCode::Binary, data)).await
    }

    /// Send one chunk of a fragmented message.
    ///
    /// The first chunk carries the message type; later chunks go out as
    /// continuation frames whatever their type. The sequence ends with the
    /// chunk sent with `is_final = true`. Ping, pong and close may be sent
    /// in between, complete messages may not.
    ///
    /// # Errors
    ///
    /// Same as [`send`](Self::send), except that an open sequence is
    /// expected.
    pub async fn stream(&self, chunk: Message, is_final: bool) -> Result<()> {
        let (opcode, payload) = split_message(&chunk);
        self.write(Outgoing::Chunk(opcode, payload, is_final)).await
    }

    pub async fn stream_text(&self, text: &str, is_final: bool) -> Result<()> {
        self.write(Outgoing::Chunk(OpCode::Text, text.as_bytes(), is_final))
            .await
    }

    pub async fn stream_binary(&self, data: &[u8], is_final: bool) -> Result<()> {
        self.write(Outgoing::Chunk(OpCode::Binary, data, is_final))
            .await
    }

    /// Send a ping. An empty payload sends an empty ping.
    ///
    /// # Errors
    ///
    /// `Error::Usage` when not connected or if the payload is longer than
    /// 125 bytes; `Error::Transport` if the write fails.
    pub async fn ping(&self, data: impl AsRef<[u8]>) -> Result<()> {
        self.control(OpCode::Ping, data.as_ref()).await
    }

    /// Send an unsolicited pong.
    ///
    /// # Errors
    ///
    /// Same as [`ping`](Self::ping).
    pub async fn pong(&self, data: impl AsRef<[u8]>) -> Result<()> {
        self.control(OpCode::Pong, data.as_ref()).await
    }

    async fn control(&self, opcode: OpCode, payload: &[u8]) -> Result<()> {
        if payload.len() > MAX_CONTROL_FRAME_PAYLOAD {
            return Err(Error::usage(format!(
                "{opcode} payload of {} bytes exceeds {MAX_CONTROL_FRAME_PAYLOAD} bytes",
                payload.len()
            )));
        }
        self.write(Outgoing::Control(opcode, payload)).await
    }

    /// Start the closing handshake with status 1000 and no reason.
    ///
    /// # Errors
    ///
    /// See [`close_with`](Self::close_with).
    pub async fn close(&self) -> Result<()> {
        self.close_with(CloseCode::Normal, "").await
    }

    pub async fn close_with_reason(&self, reason: &str) -> Result<()> {
        self.close_with(CloseCode::Normal, reason).await
    }

    /// Send a close frame and wait for the server's.
    ///
    /// Returns once the frame is written. The connection is torn down and
    /// `on_close` fires when the server's close frame arrives or the stream
    /// ends.
    ///
    /// # Errors
    ///
    /// `Error::Usage` when not connected, for a reason longer than 123
    /// bytes or a code that may not be sent; `Error::Transport` if the
    /// write fails.
    pub async fn close_with(&self, code: CloseCode, reason: &str) -> Result<()> {
        let payload = CloseFrame::new(code, reason).to_payload()?;

        let mut core = self.shared.core.lock().await;
        if !core.state.can_send() {
            return Err(Error::not_connected());
        }
        if let Some(control) = &core.control {
            control.expect_close_reply();
        }
        core.state = ConnectionState::ClosingLocal;
        ws_debug!(self.shared.debug, %code, reason, "closing handshake started");

        self.shared
            .write_or_teardown(&mut core, true, OpCode::Close, &payload)
            .await
    }

    async fn write(&self, outgoing: Outgoing<'_>) -> Result<()> {
        let mut core = self.shared.core.lock().await;
        if !core.state.can_send() {
            return Err(Error::not_connected());
        }

        let (fin, opcode, payload, streaming_after) = match outgoing {
            Outgoing::Message(_, _) if core.streaming => {
                return Err(Error::usage(
                    "cannot send unfragmented payload data while in a streaming sequence",
                ));
            }
            Outgoing::Message(opcode, payload) => (true, opcode, payload, false),
            Outgoing::Chunk(opcode, payload, fin) => {
                let opcode = if core.streaming {
                    OpCode::Continuation
                } else {
                    opcode
                };
                (fin, opcode, payload, !fin)
            }
            Outgoing::Control(opcode, payload) => (true, opcode, payload, core.streaming),
        };

        self.shared
            .write_or_teardown(&mut core, fin, opcode, payload)
            .await?;
        core.streaming = streaming_after;
        Ok(())
    }
}

impl Shared {
    /// Write one frame; a failed write is terminal for the connection.
    async fn write_or_teardown(
        &self,
        core: &mut Core,
        fin: bool,
        opcode: OpCode,
        payload: &[u8],
    ) -> Result<()> {
        let Some(writer) = core.writer.as_mut() else {
            return Err(Error::not_connected());
        };
        let written = writer.write_frame(fin, opcode, payload).await;
        match written {
            Ok(()) => {
                ws_debug!(self.debug, %opcode, fin, len = payload.len(), "frame sent");
                Ok(())
            }
            Err(e) => {
                ws_warn!(self.debug, error = %e, "write failed, closing connection");
                let listener = self.teardown(core, true).await;
                if let Some(listener) = listener {
                    listener.on_close();
                }
                Err(e)
            }
        }
    }

    /// Called on the receiver task once its loop has ended.
    async fn on_receiver_exit(&self, outcome: Outcome) {
        let mut core = self.core.lock().await;
        if core.state.is_closed() {
            return;
        }

        match outcome {
            Outcome::Stopped => return,
            Outcome::CloseReceived { frame, reply: true } => {
                ws_debug!(self.debug, ?frame, "closing handshake completed");
            }
            Outcome::CloseReceived { frame, reply: false } => {
                ws_debug!(self.debug, ?frame, "server started the closing handshake");
                core.state = ConnectionState::ClosingRemote;
                let echo = frame
                    .and_then(|f| CloseFrame::new(f.code, "").to_payload().ok())
                    .unwrap_or_default();
                self.write_best_effort(&mut core, &echo).await;
            }
            Outcome::EndOfStream => {
                ws_debug!(self.debug, "stream ended");
            }
            Outcome::Failed(e) => {
                ws_warn!(self.debug, error = %e, "receiver failed");
                // A close frame already went out in ClosingLocal.
                if e.kind() != ErrorKind::Transport && core.state == ConnectionState::Open {
                    let payload = CloseFrame::new(e.close_code(), failure_reason(&e))
                        .to_payload()
                        .unwrap_or_default();
                    self.write_best_effort(&mut core, &payload).await;
                }
            }
        }

        let listener = self.teardown(&mut core, false).await;
        drop(core);
        if let Some(listener) = listener {
            listener.on_close();
        }
    }

    /// Send a close frame, ignoring failures and giving up after the
    /// socket timeout.
    async fn write_best_effort(&self, core: &mut Core, payload: &[u8]) {
        if let Some(writer) = core.writer.as_mut() {
            let write = writer.write_frame(true, OpCode::Close, payload);
            match tokio::time::timeout(self.socket_timeout, write).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => ws_debug!(self.debug, error = %e, "close frame not sent"),
                Err(_) => ws_debug!(self.debug, "close frame not sent: timed out"),
            }
        }
    }

    /// Close everything and return the listener still owed `on_close`.
    ///
    /// `abort_receiver` is false when running on the receiver task itself.
    async fn teardown(
        &self,
        core: &mut Core,
        abort_receiver: bool,
    ) -> Option<Arc<dyn WebSocketListener>> {
        core.state = ConnectionState::Closed;
        core.streaming = false;
        self.connected.store(false, Ordering::Release);

        if let Some(control) = core.control.take() {
            control.stop();
        }
        if let Some(handle) = core.receiver.take() {
            if abort_receiver {
                handle.abort();
            }
        }
        if let Some(mut writer) = core.writer.take() {
            let _ = tokio::time::timeout(self.socket_timeout, writer.shutdown()).await;
        }
        ws_debug!(self.debug, "connection closed");
        core.listener.take()
    }
}

/// `error` as a close reason, cut at a character boundary to fit the frame.
fn failure_reason(error: &Error) -> String {
    let mut reason = error.to_string();
    if reason.len() > CloseFrame::MAX_REASON_LEN {
        let mut end = CloseFrame::MAX_REASON_LEN;
        while !reason.is_char_boundary(end) {
            end -= 1;
        }
        reason.truncate(end);
    }
    reason
}

fn split_message(message: &Message) -> (OpCode, &[u8]) {
    match message {
        Message::Text(text) => (OpCode::Text, text.as_bytes()),
        Message::Binary(data) => (OpCode::Binary, data.as_slice()),
    }
}

impl Default for WebSocket {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for WebSocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSocket")
            .field("connected", &self.is_connected())
            .field("offered", &self.offered)
            .field("negotiated", &self.negotiated_subprotocols())
            .finish_non_exhaustive()
    }
}

impl Drop for WebSocket {
    fn drop(&mut self) {
        if let Ok(mut core) = self.shared.core.try_lock() {
            if let Some(control) = core.control.take() {
                control.stop();
            }
            if let Some(handle) = core.receiver.take() {
                handle.abort();
            }
        }
    }
}
