//! Background read loop of a client connection.
//!
//! The receiver owns the read half of the transport and its own
//! reassembly state. It never writes: when the loop ends it returns an
//! [`Outcome`] and the connection decides what to send and how to tear
//! down.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::io::AsyncRead;

use crate::codec::FrameReader;
use crate::error::{Error, Result};
use crate::listener::WebSocketListener;
use crate::message::{CloseFrame, Message};
use crate::protocol::OpCode;
use crate::protocol::frame::decode_first_byte;
use crate::protocol::utf8::{TextDecoder, decode_text};

/// Flags shared between the connection and its receiver.
#[derive(Debug, Default)]
pub(crate) struct ReceiverControl {
    stop: AtomicBool,
    awaiting_close: AtomicBool,
}

impl ReceiverControl {
    /// Ask the loop to exit before its next read.
    pub(crate) fn stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    /// A local close frame went out; the next close frame is the peer's reply.
    pub(crate) fn expect_close_reply(&self) {
        self.awaiting_close.store(true, Ordering::Release);
    }

    fn is_awaiting_close(&self) -> bool {
        self.awaiting_close.load(Ordering::Acquire)
    }
}

/// Why the read loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// A close frame arrived. `reply` is true when it answers our own close.
    CloseReceived {
        frame: Option<CloseFrame>,
        reply: bool,
    },
    /// The stream ended, possibly in the middle of a frame.
    EndOfStream,
    /// The stop flag was set.
    Stopped,
    /// I/O failure or protocol violation.
    Failed(Error),
}

pub(crate) struct Receiver<R> {
    reader: FrameReader<R>,
    listener: Option<Arc<dyn WebSocketListener>>,
    control: Arc<ReceiverControl>,
    in_stream: bool,
    stream_opcode: Option<OpCode>,
    text: TextDecoder,
    debug: bool,
}

impl<R: AsyncRead + Unpin> Receiver<R> {
    pub(crate) fn new(
        reader: FrameReader<R>,
        listener: Option<Arc<dyn WebSocketListener>>,
        control: Arc<ReceiverControl>,
        debug: bool,
    ) -> Self {
        Self {
            reader,
            listener,
            control,
            in_stream: false,
            stream_opcode: None,
            text: TextDecoder::new(),
            debug,
        }
    }

    /// Read and dispatch frames until the connection ends.
    pub(crate) async fn run(mut self) -> Outcome {
        loop {
            if self.control.is_stopped() {
                return Outcome::Stopped;
            }

            let first = match self.reader.read_first_byte().await {
                Ok(Some(byte)) => byte,
                Ok(None) => return Outcome::EndOfStream,
                Err(e) => return Outcome::Failed(e),
            };

            match self.dispatch(first).await {
                Ok(None) => {}
                Ok(Some(outcome)) => return outcome,
                Err(e) => return Outcome::Failed(e),
            }
        }
    }

    async fn dispatch(&mut self, first: u8) -> Result<Option<Outcome>> {
        let (fin, opcode) = decode_first_byte(first)?;

        match opcode {
            OpCode::Continuation if !self.in_stream => {
                return Err(Error::ProtocolViolation(
                    "received a continuation frame outside a streaming sequence".into(),
                ));
            }
            OpCode::Text | OpCode::Binary if self.in_stream => {
                return Err(Error::ProtocolViolation(format!(
                    "received a {} frame while a streaming sequence is in progress",
                    opcode
                )));
            }
            _ => {}
        }

        let Some(frame) = self.reader.read_frame_after(first).await? else {
            return Ok(Some(Outcome::EndOfStream));
        };
        ws_debug!(
            self.debug,
            opcode = %frame.opcode,
            fin = frame.fin,
            len = frame.payload.len(),
            "frame received"
        );

        match opcode {
            OpCode::Continuation => {
                let stream_opcode = self.stream_opcode.unwrap_or(OpCode::Binary);
                if fin {
                    self.in_stream = false;
                    self.stream_opcode = None;
                }
                let chunk = self.chunk(stream_opcode, frame.payload, fin)?;
                self.notify(|l| l.on_message_chunk(chunk, fin));
            }
            OpCode::Text | OpCode::Binary if fin => {
                let message = match opcode {
                    OpCode::Text => Message::Text(decode_text(frame.payload)?),
                    _ => Message::Binary(frame.payload),
                };
                self.notify(|l| l.on_message(message));
            }
            OpCode::Text | OpCode::Binary => {
                self.in_stream = true;
                self.stream_opcode = Some(opcode);
                self.text.reset();
                let chunk = self.chunk(opcode, frame.payload, false)?;
                self.notify(|l| l.on_message_chunk(chunk, false));
            }
            OpCode::Close => {
                let close = CloseFrame::from_payload(&frame.payload)?;
                ws_debug!(self.debug, ?close, "close frame received");
                return Ok(Some(Outcome::CloseReceived {
                    frame: close,
                    reply: self.control.is_awaiting_close(),
                }));
            }
            OpCode::Ping => {
                let data = frame.into_optional_payload();
                self.notify(|l| l.on_ping(data));
            }
            OpCode::Pong => {
                let data = frame.into_optional_payload();
                self.notify(|l| l.on_pong(data));
            }
        }
        Ok(None)
    }

    fn chunk(&mut self, opcode: OpCode, payload: Vec<u8>, fin: bool) -> Result<Message> {
        match opcode {
            OpCode::Text => Ok(Message::Text(self.text.decode(payload, fin)?)),
            _ => Ok(Message::Binary(payload)),
        }
    }

    fn notify(&self, event: impl FnOnce(&dyn WebSocketListener)) {
        if let Some(listener) = &self.listener {
            event(listener.as_ref());
        }
    }
}
