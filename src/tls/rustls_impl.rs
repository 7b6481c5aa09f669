use std::sync::{Arc, OnceLock};

use rustls::pki_types::ServerName;
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};

use crate::error::{Error, Result};

/// Client configuration trusting the `webpki-roots` certificate set.
#[must_use]
pub fn client_config_with_webpki_roots() -> Arc<ClientConfig> {
    let root_store = RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let config = ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    Arc::new(config)
}

fn shared_config() -> Arc<ClientConfig> {
    static CONFIG: OnceLock<Arc<ClientConfig>> = OnceLock::new();
    Arc::clone(CONFIG.get_or_init(client_config_with_webpki_roots))
}

/// Run the TLS client handshake for `domain` over `stream`.
pub(crate) async fn connect(domain: &str, stream: TcpStream) -> Result<TlsStream<TcpStream>> {
    let server_name = ServerName::try_from(domain.to_string())
        .map_err(|_| Error::Transport(format!("invalid DNS name: {domain}")))?;

    tokio_rustls::TlsConnector::from(shared_config())
        .connect(server_name, stream)
        .await
        .map_err(|e| Error::Transport(format!("TLS handshake with {domain} failed: {e}")))
}
