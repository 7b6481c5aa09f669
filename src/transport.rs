//! Opening the byte stream a connection runs over.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpStream, lookup_host};
use url::{Position, Url};

use crate::error::{Error, Result};

/// Any duplex byte stream a connection can run over.
pub trait Transport: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

impl<T> Transport for T where T: AsyncRead + AsyncWrite + Send + Unpin + 'static {}

/// Type-erased transport, plain TCP or TLS.
pub type BoxedTransport = Box<dyn Transport>;

/// Where to connect and what to put in the request line and `Host` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// `true` for `wss`.
    pub secure: bool,
    /// Host name or address, without brackets for IPv6.
    pub host: String,
    /// Port to connect to; 80 or 443 unless the URI names one.
    pub port: u16,
    /// Value of the `Host` header: the host, plus the port if it is not the
    /// scheme's default.
    pub host_header: String,
    /// Request target: path (at least `/`) and query.
    pub target: String,
}

impl Endpoint {
    /// Parse a `ws://` or `wss://` URI.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Usage`] for unparseable URIs, other schemes, or a
    /// missing host.
    pub fn parse(uri: &str) -> Result<Self> {
        let trimmed = uri.trim();
        if trimmed.is_empty() {
            return Err(Error::usage("uri is empty"));
        }
        let url = Url::parse(trimmed).map_err(|e| Error::usage(format!("invalid uri: {e}")))?;

        let secure = match url.scheme() {
            "ws" => false,
            "wss" => true,
            other => return Err(Error::usage(format!("unsupported protocol: {other}"))),
        };

        let host = match url.host_str() {
            Some(h) if !h.is_empty() => h,
            _ => return Err(Error::usage("invalid uri: host is missing")),
        };

        let port = url
            .port_or_known_default()
            .unwrap_or(if secure { 443 } else { 80 });
        let host_header = match url.port() {
            Some(explicit) => format!("{host}:{explicit}"),
            None => host.to_string(),
        };

        let mut target = url[Position::BeforePath..Position::AfterQuery].to_string();
        if !target.starts_with('/') {
            target.insert(0, '/');
        }

        Ok(Self {
            secure,
            host: host.trim_start_matches('[').trim_end_matches(']').to_string(),
            port,
            host_header,
            target,
        })
    }
}

/// Connect to `endpoint` within `timeout`.
///
/// The timeout covers resolution, the TCP connect and, for `wss`, the TLS
/// handshake. TCP_NODELAY is enabled.
///
/// # Errors
///
/// [`Error::Transport`] on timeout, unknown host or connect failure;
/// [`Error::Usage`] for `wss` when no TLS backend is compiled in.
pub async fn open(endpoint: &Endpoint, timeout: Duration) -> Result<BoxedTransport> {
    if endpoint.secure && !cfg!(any(feature = "tls-rustls", feature = "tls-native")) {
        return Err(Error::usage(
            "wss requires the tls-rustls or tls-native feature",
        ));
    }

    match tokio::time::timeout(timeout, connect(endpoint)).await {
        Ok(result) => result,
        Err(_) => Err(Error::Transport(format!(
            "socket timeout while connecting to {}:{}",
            endpoint.host, endpoint.port
        ))),
    }
}

async fn connect(endpoint: &Endpoint) -> Result<BoxedTransport> {
    let addrs: Vec<_> = lookup_host((endpoint.host.as_str(), endpoint.port))
        .await
        .map_err(|_| Error::Transport(format!("unknown host: {}", endpoint.host)))?
        .collect();
    if addrs.is_empty() {
        return Err(Error::Transport(format!("unknown host: {}", endpoint.host)));
    }

    let tcp = TcpStream::connect(&addrs[..]).await.map_err(|e| {
        Error::Transport(format!(
            "error while creating tcp connection to {}:{}: {e}",
            endpoint.host, endpoint.port
        ))
    })?;
    tcp.set_nodelay(true)?;

    if endpoint.secure {
        return wrap_tls(&endpoint.host, tcp).await;
    }
    Ok(Box::new(tcp))
}

#[cfg(feature = "tls-rustls")]
async fn wrap_tls(host: &str, tcp: TcpStream) -> Result<BoxedTransport> {
    Ok(Box::new(crate::tls::rustls_impl::connect(host, tcp).await?))
}

#[cfg(all(feature = "tls-native", not(feature = "tls-rustls")))]
async fn wrap_tls(host: &str, tcp: TcpStream) -> Result<BoxedTransport> {
    Ok(Box::new(crate::tls::native::connect(host, tcp).await?))
}

#[cfg(not(any(feature = "tls-rustls", feature = "tls-native")))]
async fn wrap_tls(_host: &str, _tcp: TcpStream) -> Result<BoxedTransport> {
    Err(Error::usage(
        "wss requires the tls-rustls or tls-native feature",
    ))
}
