//! Scripted WebSocket server on a random local port.
//!
//! Each accepted connection answers the opening handshake and then echoes
//! data frames frame by frame, answers pings, and replies to close frames.

use std::net::SocketAddr;

use rsws_client::codec::{FrameReader, FrameWriter};
use rsws_client::{Limits, OpCode, Role, compute_accept_key};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Default)]
pub struct ServerOptions {
    /// Value of the `Sec-WebSocket-Protocol` response header.
    pub protocols: Option<String>,
    /// Send a close frame (1001) after echoing this many data frames.
    pub close_after: Option<usize>,
}

pub struct TestServer {
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn spawn() -> (Self, SocketAddr) {
        Self::spawn_with(ServerOptions::default()).await
    }

    pub async fn spawn_with(options: ServerOptions) -> (Self, SocketAddr) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let options = options.clone();
                tokio::spawn(async move {
                    let _ = serve(stream, options).await;
                });
            }
        });

        (Self { handle }, addr)
    }

    pub async fn shutdown(self) {
        self.handle.abort();
        let _ = self.handle.await;
    }
}

async fn serve(stream: TcpStream, options: ServerOptions) -> rsws_client::Result<()> {
    let (read_half, write_half) = stream.into_split();
    let mut reader = FrameReader::new(read_half, Role::Server, Limits::default());
    let mut writer = FrameWriter::new(write_half, Role::Server, 8192);

    let lines = reader.read_handshake().await?;
    let key = lines
        .iter()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.trim()
                .eq_ignore_ascii_case("sec-websocket-key")
                .then(|| value.trim().to_string())
        })
        .unwrap_or_default();

    let mut response = format!(
        "HTTP/1.1 101 Switching Protocols\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Accept: {}\r\n",
        compute_accept_key(&key)
    );
    if let Some(protocols) = &options.protocols {
        response.push_str(&format!("Sec-WebSocket-Protocol: {protocols}\r\n"));
    }
    response.push_str("\r\n");
    writer.write_raw(response.as_bytes()).await?;

    let mut echoed = 0usize;
    while let Some(frame) = reader.read_frame().await? {
        match frame.opcode {
            OpCode::Text | OpCode::Binary | OpCode::Continuation => {
                writer
                    .write_frame(frame.fin, frame.opcode, &frame.payload)
                    .await?;
                echoed += 1;
                if options.close_after == Some(echoed) {
                    writer.write_frame(true, OpCode::Close, &[0x03, 0xE9]).await?;
                }
            }
            OpCode::Ping => {
                writer.write_frame(true, OpCode::Pong, &frame.payload).await?;
            }
            OpCode::Pong => {}
            OpCode::Close => {
                let code = frame.payload.get(..2).unwrap_or_default();
                writer.write_frame(true, OpCode::Close, code).await?;
                break;
            }
        }
    }
    writer.shutdown().await
}
