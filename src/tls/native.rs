use tokio::net::TcpStream;
use tokio_native_tls::TlsStream;

use crate::error::{Error, Result};

/// Run the TLS client handshake for `domain` over `stream`, trusting the
/// platform certificate store.
pub(crate) async fn connect(domain: &str, stream: TcpStream) -> Result<TlsStream<TcpStream>> {
    let connector = native_tls::TlsConnector::new()
        .map_err(|e| Error::Transport(format!("TLS setup failed: {e}")))?;

    tokio_native_tls::TlsConnector::from(connector)
        .connect(domain, stream)
        .await
        .map_err(|e| Error::Transport(format!("TLS handshake with {domain} failed: {e}")))
}
